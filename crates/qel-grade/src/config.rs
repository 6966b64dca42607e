//! YAML configuration for grading limits and logging.

use std::fs;
use std::io;
use std::path::Path;

use qel_core::{Limits, QelError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to read a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Offending path.
        path: String,
        /// Underlying error.
        source: io::Error,
    },
    /// The YAML does not match the schema.
    #[error("invalid configuration in {path}: {source}")]
    Yaml {
        /// Offending path.
        path: String,
        /// Underlying error.
        source: serde_yaml::Error,
    },
}

impl From<ConfigError> for QelError {
    fn from(err: ConfigError) -> Self {
        let code = match err {
            ConfigError::Io { .. } => "config-io",
            ConfigError::Yaml { .. } => "config-yaml",
        };
        QelError::internal(code, err.to_string())
    }
}

/// Top-level grading configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingConfig {
    /// Wall-clock budget of one grade call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Symbolic equivalence settings.
    #[serde(default)]
    pub symbolic: SymbolicConfig,
    /// Automaton grading settings.
    #[serde(default)]
    pub fsm: FsmConfig,
    /// Order-blocks grading settings.
    #[serde(default)]
    pub dag: DagConfig,
    /// Expression parser settings.
    #[serde(default)]
    pub expr: ExprConfig,
    /// Default log filter for the command line.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_timeout_ms() -> u64 {
    3_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            symbolic: SymbolicConfig::default(),
            fsm: FsmConfig::default(),
            dag: DagConfig::default(),
            expr: ExprConfig::default(),
            log_level: default_log_level(),
        }
    }
}

/// Numeric identity testing and expansion bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolicConfig {
    /// Samples drawn per numeric comparison.
    #[serde(default = "default_sample_points")]
    pub sample_points: usize,
    /// Largest number of terms an expansion may produce.
    #[serde(default = "default_max_terms")]
    pub max_terms: usize,
}

fn default_sample_points() -> usize {
    8
}

fn default_max_terms() -> usize {
    4_096
}

impl Default for SymbolicConfig {
    fn default() -> Self {
        Self {
            sample_points: default_sample_points(),
            max_terms: default_max_terms(),
        }
    }
}

/// Counter-example search bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsmConfig {
    /// Longest distinguishing string searched for.
    #[serde(default = "default_fsm_max_length")]
    pub max_length: usize,
}

fn default_fsm_max_length() -> usize {
    10
}

impl Default for FsmConfig {
    fn default() -> Self {
        Self {
            max_length: default_fsm_max_length(),
        }
    }
}

/// Edit-distance solver bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagConfig {
    /// Largest problematic subgraph solved exactly.
    #[serde(default = "default_mvc_exact_limit")]
    pub mvc_exact_limit: usize,
}

fn default_mvc_exact_limit() -> usize {
    16
}

impl Default for DagConfig {
    fn default() -> Self {
        Self {
            mvc_exact_limit: default_mvc_exact_limit(),
        }
    }
}

/// Expression input bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExprConfig {
    /// Longest accepted input, in characters.
    #[serde(default = "default_expr_max_length")]
    pub max_length: usize,
}

fn default_expr_max_length() -> usize {
    1_000
}

impl Default for ExprConfig {
    fn default() -> Self {
        Self {
            max_length: default_expr_max_length(),
        }
    }
}

impl GradingConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        Self::from_yaml(&text).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    /// Parses YAML text. Empty text yields the defaults.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Engine limits carried by this configuration.
    pub fn to_limits(&self) -> Limits {
        Limits {
            timeout_ms: self.timeout_ms,
            expr_max_length: self.expr.max_length,
            sample_points: self.symbolic.sample_points,
            max_terms: self.symbolic.max_terms,
            fsm_max_length: self.fsm.max_length,
            mvc_exact_limit: self.dag.mvc_exact_limit,
        }
    }
}

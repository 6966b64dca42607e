//! Engine limits shared by every element.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bounds applied to the grading engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    /// Wall-clock budget for one grade call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Longest accepted expression, in characters.
    #[serde(default = "default_expr_max_length")]
    pub expr_max_length: usize,
    /// Sample points used by the numeric equivalence fallback.
    #[serde(default = "default_sample_points")]
    pub sample_points: usize,
    /// Largest canonical polynomial (in terms) before giving up.
    #[serde(default = "default_max_terms")]
    pub max_terms: usize,
    /// Longest counter-example searched by the automaton grader.
    #[serde(default = "default_fsm_max_length")]
    pub fsm_max_length: usize,
    /// Largest problematic subgraph solved exactly by the DAG grader.
    #[serde(default = "default_mvc_exact_limit")]
    pub mvc_exact_limit: usize,
}

fn default_timeout_ms() -> u64 {
    3_000
}

fn default_expr_max_length() -> usize {
    1_000
}

fn default_sample_points() -> usize {
    8
}

fn default_max_terms() -> usize {
    4_096
}

fn default_fsm_max_length() -> usize {
    10
}

fn default_mvc_exact_limit() -> usize {
    16
}

impl Limits {
    /// Grade budget as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            expr_max_length: default_expr_max_length(),
            sample_points: default_sample_points(),
            max_terms: default_max_terms(),
            fsm_max_length: default_fsm_max_length(),
            mvc_exact_limit: default_mvc_exact_limit(),
        }
    }
}

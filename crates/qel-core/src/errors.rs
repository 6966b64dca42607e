//! Structured error types shared across QEL crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`QelError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (answer names, offsets, states, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Who an error is ultimately addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    /// Recovered locally and shown to the learner as a format error.
    Learner,
    /// Fault in the question itself; halts the question.
    Authoring,
    /// Engine or host failure; surfaced on the host's error channel.
    Internal,
}

/// Canonical error type for the QEL engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum QelError {
    /// Learner facing format errors. The message is safe to display.
    #[error("format error: {0}")]
    Format(ErrorInfo),
    /// Exact arithmetic or expansion exceeded its bounds.
    #[error("overflow: {0}")]
    Overflow(ErrorInfo),
    /// A cooperative deadline expired or an engine gave up.
    #[error("timeout: {0}")]
    Timeout(ErrorInfo),
    /// Errors in the authored question (attributes, reference answers).
    #[error("authoring error: {0}")]
    Authoring(ErrorInfo),
    /// Engine invariants were violated.
    #[error("internal error: {0}")]
    Internal(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl QelError {
    /// Builds a learner format error.
    pub fn format(code: impl Into<String>, message: impl Into<String>) -> Self {
        QelError::Format(ErrorInfo::new(code, message))
    }

    /// Builds an authoring error.
    pub fn authoring(code: impl Into<String>, message: impl Into<String>) -> Self {
        QelError::Authoring(ErrorInfo::new(code, message))
    }

    /// Builds an internal error.
    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        QelError::Internal(ErrorInfo::new(code, message))
    }

    /// Builds an overflow error.
    pub fn overflow(code: impl Into<String>, message: impl Into<String>) -> Self {
        QelError::Overflow(ErrorInfo::new(code, message))
    }

    /// Builds a timeout error.
    pub fn timeout(code: impl Into<String>, message: impl Into<String>) -> Self {
        QelError::Timeout(ErrorInfo::new(code, message))
    }

    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            QelError::Format(info)
            | QelError::Overflow(info)
            | QelError::Timeout(info)
            | QelError::Authoring(info)
            | QelError::Internal(info)
            | QelError::Serde(info) => info,
        }
    }

    /// Returns the category that decides how the error propagates.
    pub fn category(&self) -> ErrorCategory {
        match self {
            QelError::Format(_) | QelError::Overflow(_) | QelError::Timeout(_) => {
                ErrorCategory::Learner
            }
            QelError::Authoring(_) => ErrorCategory::Authoring,
            QelError::Internal(_) | QelError::Serde(_) => ErrorCategory::Internal,
        }
    }

    /// Adds a context entry regardless of the family.
    pub fn with_context(self, key: impl Into<String>, value: impl ToString) -> Self {
        let value = value.to_string();
        match self {
            QelError::Format(info) => QelError::Format(info.with_context(key, value)),
            QelError::Overflow(info) => QelError::Overflow(info.with_context(key, value)),
            QelError::Timeout(info) => QelError::Timeout(info.with_context(key, value)),
            QelError::Authoring(info) => QelError::Authoring(info.with_context(key, value)),
            QelError::Internal(info) => QelError::Internal(info.with_context(key, value)),
            QelError::Serde(info) => QelError::Serde(info.with_context(key, value)),
        }
    }

    /// Sets a hint regardless of the family.
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        match self {
            QelError::Format(info) => QelError::Format(info.with_hint(hint)),
            QelError::Overflow(info) => QelError::Overflow(info.with_hint(hint)),
            QelError::Timeout(info) => QelError::Timeout(info.with_hint(hint)),
            QelError::Authoring(info) => QelError::Authoring(info.with_hint(hint)),
            QelError::Internal(info) => QelError::Internal(info.with_hint(hint)),
            QelError::Serde(info) => QelError::Serde(info.with_hint(hint)),
        }
    }
}

impl From<serde_json::Error> for QelError {
    fn from(err: serde_json::Error) -> Self {
        QelError::Serde(ErrorInfo::new("json", err.to_string()))
    }
}

/// Attaches context to the error side of a result.
pub trait ContextExt<T> {
    /// Adds `key = value` to the error context when the result is an error.
    fn context(self, key: &str, value: impl ToString) -> Result<T, QelError>;
}

impl<T> ContextExt<T> for Result<T, QelError> {
    fn context(self, key: &str, value: impl ToString) -> Result<T, QelError> {
        self.map_err(|err| err.with_context(key, value))
    }
}

//! Failures of the symbolic engine.

use qel_core::QelError;
use thiserror::Error;

/// Learner message for a division by zero inside a submission.
pub const DIVISION_BY_ZERO_MESSAGE: &str = "Your expression resulted in a division by zero.";

/// Why a symbolic computation stopped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SymbolicError {
    /// The expression divides by an exact zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Exact rational arithmetic left the `i128` range.
    #[error("exact arithmetic overflow in {0}")]
    Overflow(&'static str),
    /// Expansion produced more terms than allowed.
    #[error("expansion exceeded {limit} terms")]
    TooManyTerms {
        /// Configured bound.
        limit: usize,
    },
    /// The limit engine cannot decide the expression.
    #[error("did not converge: {reason}")]
    DidNotConverge {
        /// What stopped the engine.
        reason: String,
    },
    /// The cooperative deadline expired.
    #[error(transparent)]
    Interrupted(#[from] QelError),
}

impl SymbolicError {
    pub(crate) fn diverged(reason: impl Into<String>) -> Self {
        SymbolicError::DidNotConverge {
            reason: reason.into(),
        }
    }
}

impl From<SymbolicError> for QelError {
    fn from(err: SymbolicError) -> Self {
        match err {
            SymbolicError::DivisionByZero => {
                QelError::format("division-by-zero", DIVISION_BY_ZERO_MESSAGE)
            }
            SymbolicError::Overflow(stage) => {
                QelError::overflow("rational-overflow", err.to_string()).with_context("stage", stage)
            }
            SymbolicError::TooManyTerms { limit } => {
                QelError::overflow("too-many-terms", err.to_string()).with_context("limit", limit)
            }
            SymbolicError::DidNotConverge { .. } => {
                QelError::timeout("did-not-converge", err.to_string())
            }
            SymbolicError::Interrupted(inner) => inner,
        }
    }
}

//! Unit and quantity parse errors. Messages are shown to learners.

use qel_core::QelError;
use thiserror::Error;

/// Why a unit or quantity could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    /// The answer is empty.
    #[error("Invalid format. The submitted answer was left blank.")]
    Blank,
    /// A token is not a known unit.
    #[error("Invalid unit.")]
    UndefinedUnit {
        /// Offending token.
        name: String,
    },
    /// The unit text is not a product of powers of units.
    #[error("Invalid format. The unit expression could not be read near position {offset}.")]
    InvalidExpression {
        /// Byte offset of the first unread character.
        offset: usize,
    },
    /// A magnitude without a unit.
    #[error("Invalid format. The submitted answer has no unit.")]
    NoUnit,
    /// A unit without a magnitude where one is required.
    #[error("Invalid format. The submitted answer should include a magnitude.")]
    MissingMagnitude,
    /// A magnitude where only a unit is expected.
    #[error("Invalid format. The submitted answer should not include a magnitude.")]
    UnexpectedMagnitude,
    /// The magnitude overflowed.
    #[error("Invalid format. The magnitude is not a finite number.")]
    NonFiniteMagnitude,
    /// The built-in unit table could not be compiled.
    #[error("unit registry could not be built: {reason}")]
    Registry {
        /// Underlying regex error.
        reason: String,
    },
}

impl From<UnitError> for QelError {
    fn from(err: UnitError) -> Self {
        match err {
            UnitError::UndefinedUnit { ref name } => {
                let name = name.clone();
                QelError::format("invalid-unit", err.to_string()).with_context("unit", name)
            }
            UnitError::Registry { .. } => QelError::internal("unit-registry", err.to_string()),
            other => QelError::format("invalid-quantity", other.to_string()),
        }
    }
}

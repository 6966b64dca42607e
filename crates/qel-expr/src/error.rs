//! Rejections raised while parsing and walking an expression.

use qel_core::{ErrorInfo, QelError};
use thiserror::Error;

/// Why an expression was rejected. Offsets are character columns into the
/// normalized text (see [`crate::normalize`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    /// A float literal while complex input is disabled.
    #[error("float literal {text} at offset {offset}")]
    HasFloat {
        /// Column of the literal.
        offset: usize,
        /// Literal as written.
        text: String,
    },
    /// A complex literal while complex input is disabled.
    #[error("complex literal {text} at offset {offset}")]
    HasComplex {
        /// Column of the literal.
        offset: usize,
        /// Literal as written.
        text: String,
    },
    /// A syntax node outside the whitelist.
    #[error("invalid expression at offset {offset}")]
    HasInvalidExpression {
        /// Column of the deepest offending node.
        offset: usize,
    },
    /// Call of a function outside the whitelist.
    #[error("invalid function {name} at offset {offset}")]
    HasInvalidFunction {
        /// Column of the call.
        offset: usize,
        /// Callee name.
        name: String,
    },
    /// Reference to an undeclared name.
    #[error("invalid variable {name} at offset {offset}")]
    HasInvalidVariable {
        /// Column of the name.
        offset: usize,
        /// The name.
        name: String,
    },
    /// A whitelisted function name used as a value.
    #[error("function {name} used without arguments at offset {offset}")]
    FunctionNameWithoutArguments {
        /// Column of the name.
        offset: usize,
        /// The function name.
        name: String,
    },
    /// A whitelisted function called with the wrong number of arguments.
    #[error("function {name} called with {given} arguments at offset {offset}")]
    WrongArgumentCount {
        /// Column of the call.
        offset: usize,
        /// The function name.
        name: String,
        /// Number of arguments supplied.
        given: usize,
    },
    /// The general parser could not read the text.
    #[error("syntax error at offset {offset}")]
    HasParseError {
        /// Column where reading stopped.
        offset: usize,
    },
    /// A backslash somewhere in the text.
    #[error("escape character in expression")]
    HasEscape {
        /// Column of the backslash.
        offset: usize,
    },
    /// A `#` somewhere in the text.
    #[error("comment character in expression")]
    HasComment {
        /// Column of the `#`.
        offset: usize,
    },
    /// A character with no meaning after normalization.
    #[error("invalid symbol {symbol} at offset {offset}")]
    HasInvalidSymbol {
        /// Column of the character.
        offset: usize,
        /// The character.
        symbol: char,
    },
    /// A declared variable shadows a constant or function.
    #[error("variable {name} conflicts with a built-in name")]
    HasConflictingVariable {
        /// The variable.
        name: String,
    },
    /// An integer literal outside the exact range.
    #[error("integer literal too large at offset {offset}")]
    IntegerTooLarge {
        /// Column of the literal.
        offset: usize,
    },
    /// The text exceeds the configured length.
    #[error("expression longer than {limit} characters")]
    TooLong {
        /// Maximum accepted length.
        limit: usize,
    },
}

impl ExprError {
    /// Stable code for the rejection.
    pub fn code(&self) -> &'static str {
        match self {
            ExprError::HasFloat { .. } => "has-float",
            ExprError::HasComplex { .. } => "has-complex",
            ExprError::HasInvalidExpression { .. } => "has-invalid-expression",
            ExprError::HasInvalidFunction { .. } => "has-invalid-function",
            ExprError::HasInvalidVariable { .. } => "has-invalid-variable",
            ExprError::FunctionNameWithoutArguments { .. } => "function-name-without-arguments",
            ExprError::WrongArgumentCount { .. } => "wrong-argument-count",
            ExprError::HasParseError { .. } => "has-parse-error",
            ExprError::HasEscape { .. } => "has-escape",
            ExprError::HasComment { .. } => "has-comment",
            ExprError::HasInvalidSymbol { .. } => "has-invalid-symbol",
            ExprError::HasConflictingVariable { .. } => "has-conflicting-variable",
            ExprError::IntegerTooLarge { .. } => "integer-too-large",
            ExprError::TooLong { .. } => "too-long",
        }
    }

    /// Column the rejection points at, when it has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ExprError::HasFloat { offset, .. }
            | ExprError::HasComplex { offset, .. }
            | ExprError::HasInvalidExpression { offset }
            | ExprError::HasInvalidFunction { offset, .. }
            | ExprError::HasInvalidVariable { offset, .. }
            | ExprError::FunctionNameWithoutArguments { offset, .. }
            | ExprError::WrongArgumentCount { offset, .. }
            | ExprError::HasParseError { offset }
            | ExprError::HasEscape { offset }
            | ExprError::HasComment { offset }
            | ExprError::HasInvalidSymbol { offset, .. }
            | ExprError::IntegerTooLarge { offset } => Some(*offset),
            ExprError::HasConflictingVariable { .. } | ExprError::TooLong { .. } => None,
        }
    }
}

impl From<ExprError> for QelError {
    fn from(err: ExprError) -> Self {
        let mut info = ErrorInfo::new(err.code(), err.to_string());
        if let Some(offset) = err.offset() {
            info = info.with_context("offset", offset.to_string());
        }
        match err {
            ExprError::HasConflictingVariable { .. } => QelError::Authoring(info),
            ExprError::IntegerTooLarge { .. } => QelError::Overflow(info),
            _ => QelError::Format(info),
        }
    }
}

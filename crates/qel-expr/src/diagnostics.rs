//! Learner-facing messages for parse rejections.

use crate::error::ExprError;
use crate::normalize::normalize;

const LOCATION_NOTE: &str = "Note that the location of the syntax error is approximate.";

/// Excerpt of `text` around column `offset` with a caret line underneath.
pub fn point_to_error(text: &str, offset: usize, width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let offset = offset.min(chars.len());
    let left = offset - offset.saturating_sub(width);
    let right = (offset + width).min(chars.len()) - offset;
    let excerpt: String = chars[offset - left..offset + right].iter().collect();
    format!(
        "{excerpt}\n{}^{}",
        " ".repeat(left),
        " ".repeat(right)
    )
}

/// Message shown to the learner for `err`, raised while parsing `text`.
pub fn describe(err: &ExprError, text: &str) -> String {
    let normalized = normalize(text);
    let located = |message: String, offset: usize| {
        format!(
            "{message}\n\n{}\n{LOCATION_NOTE}",
            point_to_error(&normalized, offset, 5)
        )
    };
    match err {
        ExprError::HasFloat { text, .. } => format!(
            "Your answer contains the floating-point number {text}. All numbers must be expressed as integers (or ratios of integers)."
        ),
        ExprError::HasComplex { text, .. } => format!(
            "Your answer contains the complex number {text}. All numbers must be expressed as integers (or ratios of integers)."
        ),
        ExprError::HasInvalidExpression { offset } => {
            located("Your answer has an invalid expression.".into(), *offset)
        }
        ExprError::HasInvalidFunction { offset, name } => located(
            format!("Your answer calls an invalid function \"{name}\"."),
            *offset,
        ),
        ExprError::HasInvalidVariable { offset, name } => located(
            format!("Your answer refers to an invalid variable \"{name}\"."),
            *offset,
        ),
        ExprError::FunctionNameWithoutArguments { offset, name } => located(
            format!("Your answer mentions the function \"{name}\" without applying it to anything."),
            *offset,
        ),
        ExprError::WrongArgumentCount {
            offset,
            name,
            given,
        } => located(
            format!("Your answer calls the function \"{name}\" with {given} arguments."),
            *offset,
        ),
        ExprError::HasParseError { offset } => {
            located("Your answer has a syntax error.".into(), *offset)
        }
        ExprError::HasEscape { offset } => located(
            "Your answer must not contain the character \"\\\".".into(),
            *offset,
        ),
        ExprError::HasComment { offset } => located(
            "Your answer must not contain the character \"#\".".into(),
            *offset,
        ),
        ExprError::HasInvalidSymbol { offset, symbol } => located(
            format!("Your answer refers to an invalid symbol \"{symbol}\"."),
            *offset,
        ),
        ExprError::IntegerTooLarge { .. } => {
            "Your expression expands too large, try a simpler one.".to_string()
        }
        ExprError::TooLong { limit } => {
            format!("Your answer is longer than the limit of {limit} characters.")
        }
        ExprError::HasConflictingVariable { name } => {
            format!("The variable \"{name}\" conflicts with a built-in name.")
        }
    }
}

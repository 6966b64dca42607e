//! One handler per element tag, plus the helpers they share.

mod big_o;
mod fsm;
mod integer;
mod matrix;
mod number;
mod order_blocks;
mod symbolic;
mod units;

pub use big_o::BigOInput;
pub use fsm::FsmBuilder;
pub use integer::IntegerInput;
pub use matrix::MatrixInput;
pub use number::NumberInput;
pub use order_blocks::OrderBlocks;
pub use symbolic::SymbolicInput;
pub use units::UnitsInput;

use qel_core::{Attributes, ErrorCategory, PartialScore, QelError, QuestionData};
use qel_expr::{describe, Expr, ParseOptions};
use serde_json::Value;

use crate::orchestrator::learner_message;

/// Format error for an empty submission.
pub const BLANK_SUBMISSION: &str = "Invalid format. The submitted answer was left blank.";

fn answers_name(attrs: &Attributes) -> Result<&str, QelError> {
    attrs.string("answers-name")
}

/// The learner's text after the blank policy, or `None` when nothing is
/// left to parse.
///
/// Blank input is a format error unless `allow-blank` is set; then the
/// `blank-value` (or `default_blank`) stands in for it. An empty stand-in
/// records a null submission without an error.
fn raw_submission(
    attrs: &Attributes,
    data: &mut QuestionData,
    name: &str,
    default_blank: &str,
) -> Result<Option<String>, QelError> {
    let raw = data
        .raw_answer(name)
        .or_else(|| data.submitted_str(name))
        .unwrap_or_default()
        .to_string();
    if !raw.trim().is_empty() {
        return Ok(Some(raw));
    }
    if !attrs.boolean("allow-blank", false)? {
        data.reject(name, BLANK_SUBMISSION);
        return Ok(None);
    }
    let blank = attrs.string_or("blank-value").unwrap_or(default_blank);
    if blank.trim().is_empty() {
        data.submitted_answers.insert(name.to_string(), Value::Null);
        return Ok(None);
    }
    Ok(Some(blank.to_string()))
}

/// Records the authored reference, refusing to overwrite one set elsewhere.
fn store_reference(data: &mut QuestionData, name: &str, value: Value) -> Result<(), QelError> {
    if data.correct_answers.contains_key(name) {
        return Err(QelError::authoring(
            "duplicate-correct-answer",
            format!("Duplicate correct_answers variable name: {name}"),
        )
        .with_context("answers-name", name));
    }
    data.correct_answers.insert(name.to_string(), value);
    Ok(())
}

/// Records a learner error as a format error; other errors propagate.
fn reject(data: &mut QuestionData, name: &str, err: QelError) -> Result<(), QelError> {
    let message = learner_message(err)?;
    data.reject(name, message);
    Ok(())
}

/// Rewrites a failure to read the reference answer as an authoring error.
fn invalid_reference(name: &str, err: impl Into<QelError>) -> QelError {
    let err = err.into();
    QelError::authoring(
        "invalid-correct-answer",
        format!("Correct answer for \"{name}\" is invalid: {}", err.info().message),
    )
    .with_context("answers-name", name)
}

/// The reference answer for `name`, when one is recorded.
fn reference_text(data: &QuestionData, name: &str) -> Option<String> {
    match data.correct_answers.get(name)? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Text of a parsed submission.
fn submitted_text(value: &Value) -> Result<&str, QelError> {
    value.as_str().ok_or_else(|| {
        QelError::internal("submission-not-text", "parsed submission is not a string")
            .with_context("value", value)
    })
}

fn missing_reference(name: &str) -> QelError {
    QelError::authoring(
        "missing-correct-answer",
        format!("No correct answer is recorded for \"{name}\"."),
    )
    .with_context("answers-name", name)
}

fn missing_test_type() -> QelError {
    QelError::internal("missing-test-type", "test requested without a test_type")
}

/// Parses learner text; learner mistakes come back as `Ok(Err(message))`.
fn read_expression(text: &str, options: &ParseOptions) -> Result<Result<Expr, String>, QelError> {
    match qel_expr::parse(text, options) {
        Ok(expr) => Ok(Ok(expr)),
        Err(err) => {
            let message = describe(&err, text);
            let err = QelError::from(err);
            if err.category() == ErrorCategory::Learner {
                Ok(Err(message))
            } else {
                Err(err)
            }
        }
    }
}

/// Re-reads a stored submission at grade time; learner mistakes carry the
/// same message `parse` would have shown.
fn reread_expression(text: &str, options: &ParseOptions) -> Result<Expr, QelError> {
    qel_expr::parse(text, options).map_err(|err| {
        let message = describe(&err, text);
        let err = QelError::from(err);
        if err.category() == ErrorCategory::Learner {
            QelError::format(err.info().code.clone(), message)
        } else {
            err
        }
    })
}

/// Comma separated names, trimmed, blanks dropped.
fn split_names(text: Option<&str>) -> Vec<String> {
    text.map(|text| {
        text.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Records a synthesized submission and the score it should earn.
fn expect_score(data: &mut QuestionData, name: &str, raw: impl Into<String>, score: PartialScore) {
    data.raw_submitted_answers
        .insert(name.to_string(), Value::String(raw.into()));
    data.set_score(name, score);
}

/// Records a synthesized submission and the format error it should raise.
fn expect_invalid(
    data: &mut QuestionData,
    name: &str,
    raw: impl Into<String>,
    message: impl Into<String>,
) {
    data.raw_submitted_answers
        .insert(name.to_string(), Value::String(raw.into()));
    data.format_errors.insert(name.to_string(), message.into());
}

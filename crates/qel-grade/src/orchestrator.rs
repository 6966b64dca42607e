//! Shared grading driver: score coercion and error mapping.

use std::time::Duration;

use qel_core::{
    ContextExt, Deadline, ErrorCategory, Feedback, PartialScore, QelError, QuestionData,
};
use serde_json::Value;
use tracing::{debug, warn};

/// Shown when an engine gives up or the grading budget runs out.
pub const DID_NOT_CONVERGE: &str = "Your answer did not converge, try a simpler expression.";

/// Shown when exact arithmetic or expansion exceeds its bounds.
pub const EXPANDS_TOO_LARGE: &str = "Your expression expands too large, try a simpler one.";

/// Raw result of a grade function before coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreValue {
    /// `true` is full credit, `false` none.
    Bool(bool),
    /// A fraction that must lie in `[0, 1]`.
    Number(f64),
}

impl From<bool> for ScoreValue {
    fn from(value: bool) -> Self {
        ScoreValue::Bool(value)
    }
}

impl From<f64> for ScoreValue {
    fn from(value: f64) -> Self {
        ScoreValue::Number(value)
    }
}

impl ScoreValue {
    /// The score as a fraction, rejecting NaN and values outside `[0, 1]`.
    pub fn coerce(self) -> Result<f64, QelError> {
        match self {
            ScoreValue::Bool(true) => Ok(1.0),
            ScoreValue::Bool(false) => Ok(0.0),
            ScoreValue::Number(score) if (0.0..=1.0).contains(&score) => Ok(score),
            ScoreValue::Number(score) => Err(QelError::internal(
                "invalid-score",
                format!("grade function returned {score}, expected a value in [0, 1]"),
            )
            .with_hint("return a boolean or a fraction between 0 and 1")),
        }
    }
}

/// What a grade function returns.
#[derive(Debug, Clone, PartialEq)]
pub struct Graded {
    /// Score before coercion.
    pub score: ScoreValue,
    /// Feedback stored next to the score.
    pub feedback: Option<Feedback>,
}

impl Graded {
    /// A result without feedback.
    pub fn new(score: impl Into<ScoreValue>) -> Self {
        Self {
            score: score.into(),
            feedback: None,
        }
    }

    /// Attaches feedback.
    pub fn with_feedback(mut self, feedback: impl Into<Feedback>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }
}

/// Learner message for a learner-category error, or the error itself.
///
/// Timeouts and `did-not-converge` read as [`DID_NOT_CONVERGE`], overflows
/// as [`EXPANDS_TOO_LARGE`], format errors keep their message.
pub fn learner_message(err: QelError) -> Result<String, QelError> {
    match err {
        QelError::Timeout(_) => Ok(DID_NOT_CONVERGE.to_string()),
        QelError::Format(info) if info.code == "did-not-converge" => {
            Ok(DID_NOT_CONVERGE.to_string())
        }
        QelError::Overflow(_) => Ok(EXPANDS_TOO_LARGE.to_string()),
        QelError::Format(info) => Ok(info.message),
        other => Err(other),
    }
}

/// Grades the parsed submission for `name` with `grade_fn`.
///
/// The score record starts at zero and stays there unless `grade_fn`
/// succeeds. A missing or null submission is not graded. Learner errors
/// become format errors; authoring and internal errors propagate.
#[tracing::instrument(level = "debug", skip(data, grade_fn))]
pub fn grade_answer_parameterized<F>(
    data: &mut QuestionData,
    name: &str,
    weight: u32,
    budget: Duration,
    grade_fn: F,
) -> Result<(), QelError>
where
    F: FnOnce(&Value, &Deadline) -> Result<Graded, QelError>,
{
    data.set_score(name, PartialScore::new(0.0, weight));
    let Some(submitted) = data.submitted_answers.get(name).filter(|value| !value.is_null()) else {
        debug!("no parsed submission");
        return Ok(());
    };
    let submitted = submitted.clone();
    let deadline = Deadline::after(budget);

    match grade_fn(&submitted, &deadline) {
        Ok(graded) => {
            let score = graded.score.coerce().context("answers-name", name)?;
            let mut record = PartialScore::new(score, weight);
            if let Some(feedback) = graded.feedback {
                record = record.with_feedback(feedback);
            }
            debug!(score, elapsed_ms = deadline.elapsed().as_millis() as u64, "graded");
            data.set_score(name, record);
            Ok(())
        }
        Err(err) if err.category() == ErrorCategory::Learner => {
            if matches!(err, QelError::Timeout(_)) {
                warn!(code = %err.info().code, "grading budget exhausted");
            } else {
                debug!(code = %err.info().code, "grading stopped on a learner error");
            }
            let message = learner_message(err)?;
            data.format_errors.insert(name.to_string(), message);
            Ok(())
        }
        Err(err) => Err(err.with_context("answers-name", name)),
    }
}

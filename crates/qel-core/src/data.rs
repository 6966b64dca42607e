//! The question-data record exchanged with the host.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Feedback attached to a partial score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Feedback {
    /// Plain text shown to the learner.
    Text(String),
    /// Element specific structured feedback.
    Structured(Value),
}

impl From<&str> for Feedback {
    fn from(text: &str) -> Self {
        Feedback::Text(text.to_string())
    }
}

impl From<String> for Feedback {
    fn from(text: String) -> Self {
        Feedback::Text(text)
    }
}

/// Score record stored per answer name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialScore {
    /// Score in `[0, 1]`.
    pub score: f64,
    /// Relative weight of the answer within the question.
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Optional feedback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}

fn default_weight() -> u32 {
    1
}

impl PartialScore {
    /// Creates a score record without feedback.
    pub fn new(score: f64, weight: u32) -> Self {
        Self {
            score,
            weight,
            feedback: None,
        }
    }

    /// Attaches feedback.
    pub fn with_feedback(mut self, feedback: impl Into<Feedback>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    /// A score of one.
    pub fn is_correct(&self) -> bool {
        self.score >= 1.0
    }

    /// A score strictly between zero and one.
    pub fn is_partial(&self) -> bool {
        self.score > 0.0 && self.score < 1.0
    }
}

/// Which panel the host is rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Panel {
    /// The question prompt.
    #[default]
    Question,
    /// The learner's submission.
    Submission,
    /// The reference answer.
    Answer,
}

/// Outcome a test-mode call should synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TestType {
    /// An answer that earns full marks.
    Correct,
    /// A well-formed answer that earns less than full marks.
    Incorrect,
    /// A malformed answer that produces a format error.
    Invalid,
}

/// Shared record passed to every element operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuestionData {
    /// Authoring-time parameters.
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
    /// Reference answers keyed by answer name.
    #[serde(default)]
    pub correct_answers: BTreeMap<String, Value>,
    /// Parsed submissions keyed by answer name.
    #[serde(default)]
    pub submitted_answers: BTreeMap<String, Value>,
    /// Original submitted strings keyed by answer name.
    #[serde(default)]
    pub raw_submitted_answers: BTreeMap<String, Value>,
    /// Learner facing diagnostics keyed by answer name.
    #[serde(default)]
    pub format_errors: BTreeMap<String, String>,
    /// Score records keyed by answer name.
    #[serde(default)]
    pub partial_scores: BTreeMap<String, PartialScore>,
    /// Panel being rendered.
    #[serde(default)]
    pub panel: Panel,
    /// Whether the learner may still edit the answer.
    #[serde(default)]
    pub editable: bool,
    /// Host supplied options.
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
    /// Requested test outcome, set only in test mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_type: Option<TestType>,
    /// Seed of the question variant.
    #[serde(default)]
    pub variant_seed: u64,
}

impl QuestionData {
    /// Raw submission for `name` as text, if it is a string.
    pub fn raw_answer(&self, name: &str) -> Option<&str> {
        self.raw_submitted_answers.get(name).and_then(Value::as_str)
    }

    /// Submitted value for `name` as text, if it is a string.
    pub fn submitted_str(&self, name: &str) -> Option<&str> {
        self.submitted_answers.get(name).and_then(Value::as_str)
    }

    /// Reference value for `name` as text, if it is a string.
    pub fn correct_str(&self, name: &str) -> Option<&str> {
        self.correct_answers.get(name).and_then(Value::as_str)
    }

    /// Records a learner format error and clears the parsed submission.
    pub fn reject(&mut self, name: &str, message: impl Into<String>) {
        self.format_errors.insert(name.to_string(), message.into());
        self.submitted_answers.insert(name.to_string(), Value::Null);
    }

    /// Whether a format error is stored for `name`.
    pub fn has_format_error(&self, name: &str) -> bool {
        self.format_errors.contains_key(name)
    }

    /// Stores a score record for `name`.
    pub fn set_score(&mut self, name: &str, score: PartialScore) {
        self.partial_scores.insert(name.to_string(), score);
    }
}

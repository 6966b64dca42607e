#![deny(missing_docs)]
#![doc = "Core records, errors and determinism helpers shared by the QEL question elements."]

pub mod attributes;
pub mod data;
pub mod deadline;
pub mod errors;
pub mod limits;
pub mod rng;

pub use attributes::{check_answers_names, Attributes};
pub use data::{Feedback, Panel, PartialScore, QuestionData, TestType};
pub use deadline::{Deadline, DEFAULT_BUDGET};
pub use errors::{ContextExt, ErrorCategory, ErrorInfo, QelError};
pub use limits::Limits;
pub use rng::{derive_substream_seed, label_substream, RngHandle};

/// Lifecycle contract implemented by every question element.
///
/// The host calls the entry points in a fixed order (prepare, parse, grade)
/// against one record it owns; `test` replaces parse and grade in self-test
/// runs. Learner mistakes are written into the record. Only authoring and
/// internal failures come back as `Err`.
pub trait Element: Send + Sync {
    /// Tag the element is authored under.
    fn tag(&self) -> &'static str;

    /// Validates attributes and records the reference answer.
    fn prepare(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        limits: &Limits,
    ) -> Result<(), QelError>;

    /// Parses the raw submission into `submitted_answers` or `format_errors`.
    fn parse(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        limits: &Limits,
    ) -> Result<(), QelError>;

    /// Scores the parsed submission into `partial_scores`.
    fn grade(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        limits: &Limits,
    ) -> Result<(), QelError>;

    /// Synthesizes a submission for `data.test_type` and its expected outcome.
    fn test(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        limits: &Limits,
        rng: &mut RngHandle,
    ) -> Result<(), QelError>;

    /// Reference answer as submittable text, when the element has one.
    fn format_answer(
        &self,
        attrs: &Attributes,
        data: &QuestionData,
        limits: &Limits,
    ) -> Result<Option<String>, QelError>;
}

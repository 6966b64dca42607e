//! Tag lookup and lifecycle dispatch.

use qel_core::{Attributes, Element, Limits, QelError, QuestionData, RngHandle};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::info_span;

use crate::elements::{
    BigOInput, FsmBuilder, IntegerInput, MatrixInput, NumberInput, OrderBlocks, SymbolicInput,
    UnitsInput,
};

/// Every tag [`element_for`] knows.
pub const ELEMENT_TAGS: &[&str] = &[
    "pl-symbolic-input",
    "pl-big-o-input",
    "pl-units-input",
    "pl-matrix-input",
    "pl-number-input",
    "pl-integer-input",
    "pl-order-blocks",
    "fsm-builder",
];

/// Handler registered for `tag`.
pub fn element_for(tag: &str) -> Option<Box<dyn Element>> {
    let element: Box<dyn Element> = match tag {
        "pl-symbolic-input" => Box::new(SymbolicInput),
        "pl-big-o-input" => Box::new(BigOInput),
        "pl-units-input" => Box::new(UnitsInput),
        "pl-matrix-input" => Box::new(MatrixInput),
        "pl-number-input" => Box::new(NumberInput),
        "pl-integer-input" => Box::new(IntegerInput),
        "pl-order-blocks" => Box::new(OrderBlocks),
        "fsm-builder" => Box::new(FsmBuilder),
        _ => return None,
    };
    Some(element)
}

/// Lifecycle entry point.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Phase {
    /// Validate attributes and record the reference.
    Prepare,
    /// Parse the raw submission.
    Parse,
    /// Score the parsed submission.
    Grade,
    /// Synthesize a submission and its expected outcome.
    Test,
    /// Render the reference as submittable text.
    FormatAnswer,
}

/// Runs `phase` of `element` against `data`.
///
/// Only [`Phase::FormatAnswer`] returns text. The test phase draws from the
/// answer's own random stream, so reruns of a variant agree.
pub fn run_phase(
    phase: Phase,
    element: &dyn Element,
    attrs: &Attributes,
    data: &mut QuestionData,
    limits: &Limits,
) -> Result<Option<String>, QelError> {
    let name = attrs.string_or("answers-name").unwrap_or_default();
    let span = info_span!("phase", %phase, tag = element.tag(), answers_name = name);
    let _guard = span.enter();
    match phase {
        Phase::Prepare => element.prepare(attrs, data, limits).map(|()| None),
        Phase::Parse => element.parse(attrs, data, limits).map(|()| None),
        Phase::Grade => element.grade(attrs, data, limits).map(|()| None),
        Phase::Test => {
            let mut rng = RngHandle::for_answer(data.variant_seed, name);
            element.test(attrs, data, limits, &mut rng).map(|()| None)
        }
        Phase::FormatAnswer => element.format_answer(attrs, data, limits),
    }
}

//! `pl-units-input`: physical quantities with units.

use qel_core::{
    check_answers_names, Attributes, Element, Limits, PartialScore, QelError, QuestionData,
    RngHandle, TestType,
};
use qel_units::{
    parse_quantity, parse_submission, GradingMode, Quantity, UnitGrader, UnitSystem,
};
use serde_json::Value;
use tracing::debug;

use super::{
    answers_name, expect_invalid, expect_score, invalid_reference, missing_reference,
    missing_test_type, raw_submission, reference_text, reject, store_reference, submitted_text,
};
use crate::orchestrator::{grade_answer_parameterized, Graded};

const TAG: &str = "pl-units-input";
const REQUIRED: &[&str] = &["answers-name"];
const OPTIONAL: &[&str] = &[
    "weight",
    "correct-answer",
    "label",
    "suffix",
    "display",
    "allow-blank",
    "blank-value",
    "grading-mode",
    "comparison",
    "rtol",
    "atol",
    "digits",
    "size",
    "show-help-text",
    "placeholder",
    "magnitude-partial-credit",
    "show-feedback",
];

/// Handler for `pl-units-input`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnitsInput;

/// Text stored for a quantity: the unit alone in only-units mode.
fn stored(quantity: &Quantity, mode: GradingMode) -> String {
    match mode {
        GradingMode::OnlyUnits => quantity.symbol().to_string(),
        GradingMode::ExactUnits | GradingMode::WithUnits => quantity.to_string(),
    }
}

fn mode(attrs: &Attributes) -> Result<GradingMode, QelError> {
    attrs.enumerated("grading-mode", GradingMode::default())
}

fn reference(
    data: &QuestionData,
    name: &str,
    system: &UnitSystem,
) -> Result<Option<Quantity>, QelError> {
    reference_text(data, name)
        .map(|text| parse_quantity(&text, system).map_err(|err| invalid_reference(name, err)))
        .transpose()
}

impl Element for UnitsInput {
    fn tag(&self) -> &'static str {
        TAG
    }

    fn prepare(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        _limits: &Limits,
    ) -> Result<(), QelError> {
        attrs.check(REQUIRED, OPTIONAL)?;
        let name = answers_name(attrs)?;
        check_answers_names(data, name)?;
        let system = UnitSystem::shared()?;
        let mode = mode(attrs)?;
        let reference = match attrs.string_or("correct-answer") {
            Some(correct) => {
                let quantity =
                    parse_quantity(correct, system).map_err(|err| invalid_reference(name, err))?;
                store_reference(data, name, Value::String(stored(&quantity, mode)))?;
                Some(quantity)
            }
            None => reference(data, name, system)?,
        };
        if let Some(reference) = reference {
            UnitGrader::from_attributes(attrs, &reference, system)?;
        } else if let Some(digits) = attrs.integer_opt("digits")? {
            if digits < 1 {
                return Err(QelError::authoring(
                    "invalid-digits",
                    format!("Number of digits specified must be at least 1, not {digits}."),
                )
                .with_context("element", TAG));
            }
        }
        Ok(())
    }

    fn parse(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        _limits: &Limits,
    ) -> Result<(), QelError> {
        let name = answers_name(attrs)?;
        let system = UnitSystem::shared()?;
        let mode = mode(attrs)?;
        let Some(text) = raw_submission(attrs, data, name, "")? else {
            return Ok(());
        };
        match parse_submission(&text, mode, system) {
            Ok(quantity) => {
                debug!(%quantity, %mode, "quantity parsed");
                data.format_errors.remove(name);
                data.submitted_answers
                    .insert(name.to_string(), Value::String(stored(&quantity, mode)));
                Ok(())
            }
            Err(err) => reject(data, name, err.into()),
        }
    }

    fn grade(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        limits: &Limits,
    ) -> Result<(), QelError> {
        let name = answers_name(attrs)?;
        let weight = attrs.weight()?;
        let system = UnitSystem::shared()?;
        let Some(reference) = reference(data, name, system)? else {
            return Ok(());
        };
        let grader = UnitGrader::from_attributes(attrs, &reference, system)?;
        grade_answer_parameterized(data, name, weight, limits.timeout(), |submitted, _| {
            let submitted = parse_quantity(submitted_text(submitted)?, system)?;
            let result = grader.grade(&reference, &submitted);
            let graded = Graded::new(result.score);
            Ok(match result.feedback {
                Some(feedback) => graded.with_feedback(feedback),
                None => graded,
            })
        })
    }

    fn test(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        _limits: &Limits,
        rng: &mut RngHandle,
    ) -> Result<(), QelError> {
        let name = answers_name(attrs)?;
        let weight = attrs.weight()?;
        let system = UnitSystem::shared()?;
        let reference = reference(data, name, system)?.ok_or_else(|| missing_reference(name))?;
        let grader = UnitGrader::from_attributes(attrs, &reference, system)?;
        match data.test_type.ok_or_else(missing_test_type)? {
            TestType::Correct => {
                let raw = stored(&reference, grader.mode());
                expect_score(data, name, raw, PartialScore::new(1.0, weight));
            }
            TestType::Incorrect => {
                let raw = match grader.mode() {
                    GradingMode::OnlyUnits => {
                        let extra = if reference.symbol().contains("mol") { "cd" } else { "mol" };
                        format!("({})*{extra}", reference.symbol())
                    }
                    GradingMode::ExactUnits | GradingMode::WithUnits => {
                        let factor = if rng.coin() { 2.0 } else { 3.0 };
                        let magnitude = reference.magnitude() * factor + 1.0;
                        Quantity::new(magnitude, *reference.unit(), reference.symbol()).to_string()
                    }
                };
                let submitted = parse_submission(&raw, grader.mode(), system)?;
                let expected = grader.grade(&reference, &submitted);
                let mut score = PartialScore::new(expected.score, weight);
                if let Some(feedback) = expected.feedback {
                    score = score.with_feedback(feedback);
                }
                expect_score(data, name, raw, score);
            }
            TestType::Invalid => {
                let input = "1 vfg";
                let message = match parse_submission(input, grader.mode(), system) {
                    Err(err) => err.to_string(),
                    Ok(_) => {
                        return Err(QelError::internal(
                            "test-input-accepted",
                            format!("synthesized invalid input \"{input}\" parsed"),
                        ))
                    }
                };
                expect_invalid(data, name, input, message);
            }
        }
        Ok(())
    }

    fn format_answer(
        &self,
        attrs: &Attributes,
        data: &QuestionData,
        _limits: &Limits,
    ) -> Result<Option<String>, QelError> {
        let name = answers_name(attrs)?;
        let system = UnitSystem::shared()?;
        let mode = mode(attrs)?;
        Ok(reference(data, name, system)?.map(|quantity| stored(&quantity, mode)))
    }
}

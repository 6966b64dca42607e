//! `pl-number-input`: a single real or complex scalar, optionally as `a/b`.

use qel_core::{
    check_answers_names, Attributes, Element, Limits, PartialScore, QelError, QuestionData,
    RngHandle, TestType,
};
use qel_numeric::{format_number, string_fraction_to_number, Comparison, Number};
use serde_json::Value;
use tracing::debug;

use super::{
    answers_name, expect_invalid, expect_score, invalid_reference, missing_reference,
    missing_test_type, raw_submission, reject, store_reference,
};
use crate::orchestrator::{grade_answer_parameterized, Graded};

const TAG: &str = "pl-number-input";
const REQUIRED: &[&str] = &["answers-name"];
const OPTIONAL: &[&str] = &[
    "weight",
    "correct-answer",
    "label",
    "suffix",
    "display",
    "comparison",
    "rtol",
    "atol",
    "digits",
    "allow-complex",
    "show-help-text",
    "size",
    "show-correct-answer",
    "show-placeholder",
    "allow-fractions",
    "allow-blank",
    "blank-value",
];

/// Handler for `pl-number-input`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumberInput;

fn reference(data: &QuestionData, name: &str) -> Result<Option<Number>, QelError> {
    match data.correct_answers.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Number::from_json(value).map(Some).ok_or_else(|| {
            QelError::authoring(
                "invalid-correct-answer",
                format!("Correct answer for \"{name}\" is not a number."),
            )
            .with_context("answers-name", name)
        }),
    }
}

/// Distance from the reference that the comparison can no longer absorb.
fn outside_tolerance(comparison: &Comparison, reference: Number) -> f64 {
    let magnitude = reference.to_complex().norm();
    match *comparison {
        Comparison::Exact => 0.0,
        Comparison::Relabs { rtol, atol } => magnitude * rtol + atol,
        Comparison::Sigfig { digits } => {
            let place = if magnitude == 0.0 {
                digits - 1
            } else {
                (digits - 1) - magnitude.log10().floor() as i64
            };
            0.51 * 10f64.powi(-place as i32)
        }
        Comparison::Decdig { digits } => 0.51 * 10f64.powi(-digits as i32),
    }
}

fn shifted(value: Number, by: f64) -> Number {
    match value {
        Number::Real(x) => Number::Real(x + by),
        Number::Complex(z) => Number::Complex(z + by),
    }
}

impl Element for NumberInput {
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
        Comparison::from_attributes(attrs)?;
        if let Some(correct) = attrs.string_or("correct-answer") {
            let allow_complex = attrs.boolean("allow-complex", false)?;
            let value = string_fraction_to_number(Some(correct), true, allow_complex)
                .map_err(|err| invalid_reference(name, err))?;
            store_reference(data, name, value.to_json())?;
        } else {
            reference(data, name)?;
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
        let allow_complex = attrs.boolean("allow-complex", false)?;
        let allow_fractions = attrs.boolean("allow-fractions", true)?;
        let Some(text) = raw_submission(attrs, data, name, "0")? else {
            return Ok(());
        };
        match string_fraction_to_number(Some(&text), allow_fractions, allow_complex) {
            Ok(value) => {
                debug!(%value, "number parsed");
                data.format_errors.remove(name);
                data.submitted_answers.insert(name.to_string(), value.to_json());
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
        let comparison = Comparison::from_attributes(attrs)?;
        let Some(reference) = reference(data, name)? else {
            return Ok(());
        };
        grade_answer_parameterized(data, name, weight, limits.timeout(), |submitted, _| {
            let submitted = Number::from_json(submitted).ok_or_else(|| {
                QelError::internal("submission-not-number", "parsed submission is not a number")
            })?;
            Ok(Graded::new(
                comparison.is_close(submitted.to_complex(), reference.to_complex()),
            ))
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
        let comparison = Comparison::from_attributes(attrs)?;
        let reference = reference(data, name)?.ok_or_else(|| missing_reference(name))?;
        match data.test_type.ok_or_else(missing_test_type)? {
            TestType::Correct => {
                let raw = format_number(reference, None);
                expect_score(data, name, raw, PartialScore::new(1.0, weight));
            }
            TestType::Incorrect => {
                let distance = outside_tolerance(&comparison, reference) + rng.uniform(1.0, 10.0);
                let sign = if rng.coin() { 1.0 } else { -1.0 };
                let wrong = shifted(reference, sign * distance);
                let score = if comparison.is_close(wrong.to_complex(), reference.to_complex()) {
                    1.0
                } else {
                    0.0
                };
                let raw = format_number(wrong, None);
                expect_score(data, name, raw, PartialScore::new(score, weight));
            }
            TestType::Invalid => {
                let input = "1 + 2";
                let allow_complex = attrs.boolean("allow-complex", false)?;
                let message = match string_fraction_to_number(Some(input), true, allow_complex) {
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
        let comparison = Comparison::from_attributes(attrs)?;
        Ok(reference(data, name)?.map(|value| match (comparison, value) {
            (Comparison::Decdig { digits }, Number::Real(x)) => {
                let places = usize::try_from(digits).unwrap_or(0);
                format!("{x:.places$}")
            }
            _ => format_number(value, comparison.display_digits()),
        }))
    }
}

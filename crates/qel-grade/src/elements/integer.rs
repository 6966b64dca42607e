//! `pl-integer-input`: integers written in a chosen base.

use qel_core::{
    check_answers_names, Attributes, Element, Limits, PartialScore, QelError, QuestionData,
    RngHandle, TestType,
};
use qel_numeric::{format_integer, parse_integer, IntegerError};
use serde_json::Value;

use super::{
    answers_name, expect_invalid, expect_score, invalid_reference, missing_reference,
    missing_test_type, raw_submission, reject, store_reference,
};
use crate::orchestrator::{grade_answer_parameterized, Graded};

const TAG: &str = "pl-integer-input";
const REQUIRED: &[&str] = &["answers-name"];
const OPTIONAL: &[&str] = &[
    "weight",
    "correct-answer",
    "base",
    "label",
    "suffix",
    "display",
    "size",
    "show-help-text",
    "allow-blank",
    "blank-value",
    "placeholder",
];

/// Handler for `pl-integer-input`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntegerInput;

fn base(attrs: &Attributes) -> Result<u32, QelError> {
    let base = attrs.integer("base", 10)?;
    u32::try_from(base)
        .ok()
        .filter(|base| *base == 0 || (2..=36).contains(base))
        .ok_or_else(|| {
            QelError::authoring(
                "invalid-base",
                format!("Base must be either 0, or between 2 and 36, not {base}."),
            )
            .with_context("element", TAG)
        })
}

/// JSON number when it fits, otherwise the digits in `base`.
fn to_value(value: i128, base: u32) -> Result<Value, QelError> {
    match i64::try_from(value) {
        Ok(small) => Ok(Value::from(small)),
        Err(_) => Ok(Value::String(format_integer(value, base)?)),
    }
}

fn from_value(value: &Value, base: u32) -> Result<Option<i128>, IntegerError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => match number.as_i64() {
            Some(small) => Ok(Some(i128::from(small))),
            None => parse_integer(&number.to_string(), 10).map(Some),
        },
        Value::String(text) => parse_integer(text, base).map(Some),
        other => parse_integer(&other.to_string(), base).map(Some),
    }
}

fn reference(data: &QuestionData, name: &str, base: u32) -> Result<Option<i128>, QelError> {
    match data.correct_answers.get(name) {
        None => Ok(None),
        Some(value) => from_value(value, base).map_err(|err| invalid_reference(name, err)),
    }
}

impl Element for IntegerInput {
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
        let base = base(attrs)?;
        if let Some(correct) = attrs.string_or("correct-answer") {
            let value = parse_integer(correct, base).map_err(|err| invalid_reference(name, err))?;
            store_reference(data, name, to_value(value, base)?)?;
        } else {
            reference(data, name, base)?;
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
        let base = base(attrs)?;
        let Some(text) = raw_submission(attrs, data, name, "0")? else {
            return Ok(());
        };
        match parse_integer(&text, base) {
            Ok(value) => {
                data.format_errors.remove(name);
                data.submitted_answers
                    .insert(name.to_string(), to_value(value, base)?);
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
        let base = base(attrs)?;
        let Some(reference) = reference(data, name, base)? else {
            return Ok(());
        };
        grade_answer_parameterized(data, name, weight, limits.timeout(), |submitted, _| {
            let submitted = from_value(submitted, base)?;
            Ok(Graded::new(submitted == Some(reference)))
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
        let base = base(attrs)?;
        let reference = reference(data, name, base)?.ok_or_else(|| missing_reference(name))?;
        match data.test_type.ok_or_else(missing_test_type)? {
            TestType::Correct => {
                let raw = format_integer(reference, base)?;
                expect_score(data, name, raw, PartialScore::new(1.0, weight));
            }
            TestType::Incorrect => {
                let offset = rng.index(100) as i128 + 1;
                let wrong = reference
                    .checked_add(offset)
                    .or_else(|| reference.checked_sub(offset))
                    .ok_or_else(|| {
                        QelError::internal("test-input-overflow", "no nearby wrong integer")
                    })?;
                let raw = format_integer(wrong, base)?;
                expect_score(data, name, raw, PartialScore::new(0.0, weight));
            }
            TestType::Invalid => {
                let input = "3.4";
                let message = match parse_integer(input, base) {
                    Err(err) => QelError::from(err).info().message.clone(),
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
        let base = base(attrs)?;
        reference(data, name, base)?
            .map(|value| format_integer(value, base).map_err(QelError::from))
            .transpose()
    }
}

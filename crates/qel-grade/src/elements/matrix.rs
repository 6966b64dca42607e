//! `pl-matrix-input`: real or complex matrices in either bracket dialect.

use qel_core::{
    check_answers_names, Attributes, Element, Limits, PartialScore, QelError, QuestionData,
    RngHandle, TestType,
};
use qel_numeric::{format_array, parse_array, Comparison, Dialect, NumericArray, Number};
use serde_json::{Map, Value};
use tracing::debug;

use super::{
    answers_name, expect_invalid, expect_score, invalid_reference, missing_reference,
    missing_test_type, raw_submission, reject, store_reference,
};
use crate::orchestrator::{grade_answer_parameterized, Graded};

const TAG: &str = "pl-matrix-input";
const REQUIRED: &[&str] = &["answers-name"];
const OPTIONAL: &[&str] = &[
    "weight",
    "correct-answer",
    "label",
    "comparison",
    "rtol",
    "atol",
    "digits",
    "allow-complex",
    "show-help-text",
    "size",
];

/// Submitted-answers key holding the dialect each matrix was written in.
const FORMAT_KEY: &str = "_matrix_input_format";

/// Handler for `pl-matrix-input`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MatrixInput;

fn reference(data: &QuestionData, name: &str) -> Result<Option<NumericArray>, QelError> {
    match data.correct_answers.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => NumericArray::from_json(value).map(Some).ok_or_else(|| {
            QelError::authoring(
                "invalid-correct-answer",
                format!("Correct answer for \"{name}\" is not a numeric matrix."),
            )
            .with_context("answers-name", name)
        }),
    }
}

fn record_dialect(data: &mut QuestionData, name: &str, dialect: Dialect) {
    let entry = data
        .submitted_answers
        .entry(FORMAT_KEY.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(formats) = entry {
        formats.insert(name.to_string(), Value::String(dialect.to_string()));
    }
}

fn recorded_dialect(data: &QuestionData, name: &str) -> Option<Dialect> {
    data.submitted_answers
        .get(FORMAT_KEY)?
        .get(name)?
        .as_str()?
        .parse()
        .ok()
}

/// Every entry moved away from its value: `x` to `2x + 1`, negatives to `2x - 1`.
fn perturbed(array: &NumericArray) -> Result<NumericArray, QelError> {
    let rows = (0..array.rows())
        .map(|row| {
            (0..array.cols())
                .filter_map(|col| array.get(row, col))
                .map(|entry| match entry {
                    Number::Real(x) if x >= 0.0 => Number::Real(2.0 * x + 1.0),
                    Number::Real(x) => Number::Real(2.0 * x - 1.0),
                    Number::Complex(z) => Number::Complex(z * 2.0 + 1.0),
                })
                .collect()
        })
        .collect();
    NumericArray::from_rows(rows).map_err(QelError::from)
}

impl Element for MatrixInput {
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
            let (array, _) = parse_array(correct, attrs.boolean("allow-complex", false)?)
                .map_err(|err| invalid_reference(name, err))?;
            store_reference(data, name, array.to_json())?;
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
        let Some(text) = raw_submission(attrs, data, name, "")? else {
            return Ok(());
        };
        match parse_array(&text, allow_complex) {
            Ok((array, dialect)) => {
                debug!(shape = ?array.shape(), %dialect, "matrix parsed");
                data.format_errors.remove(name);
                data.submitted_answers.insert(name.to_string(), array.to_json());
                record_dialect(data, name, dialect);
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
            let submitted = NumericArray::from_json(submitted).ok_or_else(|| {
                QelError::internal("submission-not-matrix", "parsed submission is not a matrix")
            })?;
            Ok(Graded::new(comparison.arrays_close(&submitted, &reference)))
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
        let dialect = if rng.coin() { Dialect::Python } else { Dialect::Matlab };
        match data.test_type.ok_or_else(missing_test_type)? {
            TestType::Correct => {
                let raw = format_array(&reference, dialect, None);
                expect_score(data, name, raw, PartialScore::new(1.0, weight));
            }
            TestType::Incorrect => {
                let wrong = perturbed(&reference)?;
                let score = if comparison.arrays_close(&wrong, &reference) { 1.0 } else { 0.0 };
                let raw = format_array(&wrong, dialect, None);
                expect_score(data, name, raw, PartialScore::new(score, weight));
            }
            TestType::Invalid => {
                let input = "[[1, 2], [3]]";
                let message = match parse_array(input, attrs.boolean("allow-complex", false)?) {
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
        let digits = Comparison::from_attributes(attrs)?.display_digits();
        let dialect = recorded_dialect(data, name).unwrap_or_default();
        Ok(reference(data, name)?.map(|array| format_array(&array, dialect, digits)))
    }
}

//! `pl-symbolic-input`: algebraic expressions graded by symbolic equivalence.

use qel_core::{
    check_answers_names, Attributes, Element, Limits, PartialScore, QelError, QuestionData,
    RngHandle, TestType,
};
use qel_expr::{parse, Expr, ParseOptions};
use qel_symbolic::{equivalent, EquivalenceOptions};
use serde_json::Value;
use tracing::debug;

use super::{
    answers_name, expect_invalid, expect_score, invalid_reference, missing_reference,
    missing_test_type, raw_submission, read_expression, reference_text, reread_expression,
    split_names, store_reference, submitted_text,
};
use crate::orchestrator::{grade_answer_parameterized, Graded};

const TAG: &str = "pl-symbolic-input";
const REQUIRED: &[&str] = &["answers-name"];
const OPTIONAL: &[&str] = &[
    "weight",
    "correct-answer",
    "variables",
    "custom-functions",
    "label",
    "display",
    "allow-complex",
    "imaginary-unit-for-display",
    "size",
    "show-help-text",
    "allow-blank",
    "blank-value",
    "placeholder",
];

/// Handler for `pl-symbolic-input`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymbolicInput;

fn parse_options(attrs: &Attributes, limits: &Limits) -> Result<ParseOptions, QelError> {
    let options = ParseOptions::with_variables(split_names(attrs.string_or("variables")))
        .functions(split_names(attrs.string_or("custom-functions")))
        .complex(attrs.boolean("allow-complex", false)?)
        .max_length(limits.expr_max_length);
    options.validate()?;
    Ok(options)
}

fn reference(data: &QuestionData, name: &str, options: &ParseOptions) -> Result<Option<Expr>, QelError> {
    reference_text(data, name)
        .map(|text| parse(&text, options).map_err(|err| invalid_reference(name, err)))
        .transpose()
}

/// Inputs that each trip a different parser check.
fn invalid_inputs(options: &ParseOptions) -> Vec<String> {
    let mut inputs: Vec<String> = [
        "aatan(1)",
        "1 and 0",
        "1 +* 1",
        "1 + 1\\n",
        "1 # some text",
    ]
    .iter()
    .map(|input| input.to_string())
    .collect();
    if !options.allow_complex {
        inputs.push("1 + 1.234".to_string());
        inputs.push("1 + 2j".to_string());
    }
    if let Some(stranger) = ["y", "z", "w", "v"]
        .into_iter()
        .find(|name| !options.is_variable(name) && !options.custom_functions.contains(*name))
    {
        inputs.push(format!("1 + {stranger}"));
    }
    inputs
}

impl Element for SymbolicInput {
    fn tag(&self) -> &'static str {
        TAG
    }

    fn prepare(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        limits: &Limits,
    ) -> Result<(), QelError> {
        attrs.check(REQUIRED, OPTIONAL)?;
        let name = answers_name(attrs)?;
        check_answers_names(data, name)?;
        let options = parse_options(attrs, limits)?;
        let unit = attrs.string_or("imaginary-unit-for-display").unwrap_or("i");
        if unit != "i" && unit != "j" {
            return Err(QelError::authoring(
                "invalid-attribute",
                "imaginary-unit-for-display must be either i or j",
            )
            .with_context("element", TAG));
        }
        if let Some(correct) = attrs.string_or("correct-answer") {
            parse(correct, &options).map_err(|err| invalid_reference(name, err))?;
            store_reference(data, name, Value::String(correct.to_string()))?;
        } else {
            reference(data, name, &options)?;
        }
        Ok(())
    }

    fn parse(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        limits: &Limits,
    ) -> Result<(), QelError> {
        let name = answers_name(attrs)?;
        let options = parse_options(attrs, limits)?;
        let Some(text) = raw_submission(attrs, data, name, "0")? else {
            return Ok(());
        };
        match read_expression(&text, &options)? {
            Ok(expr) => {
                debug!(size = expr.size(), "symbolic submission parsed");
                data.format_errors.remove(name);
                data.submitted_answers
                    .insert(name.to_string(), Value::String(text));
            }
            Err(message) => data.reject(name, message),
        }
        Ok(())
    }

    fn grade(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        limits: &Limits,
    ) -> Result<(), QelError> {
        let name = answers_name(attrs)?;
        let weight = attrs.weight()?;
        let options = parse_options(attrs, limits)?;
        let Some(reference) = reference(data, name, &options)? else {
            return Ok(());
        };
        let equivalence = EquivalenceOptions::from(limits);
        grade_answer_parameterized(data, name, weight, limits.timeout(), |submitted, deadline| {
            let submitted = reread_expression(submitted_text(submitted)?, &options)?;
            let same = equivalent(&reference, &submitted, deadline, &equivalence)?;
            Ok(Graded::new(same))
        })
    }

    fn test(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        limits: &Limits,
        rng: &mut RngHandle,
    ) -> Result<(), QelError> {
        let name = answers_name(attrs)?;
        let weight = attrs.weight()?;
        let options = parse_options(attrs, limits)?;
        let reference = reference(data, name, &options)?.ok_or_else(|| missing_reference(name))?;
        match data.test_type.ok_or_else(missing_test_type)? {
            TestType::Correct => {
                expect_score(data, name, reference.to_string(), PartialScore::new(1.0, weight));
            }
            TestType::Incorrect => {
                let offset = rng.index(100) + 1;
                let raw = format!("{reference} + {offset}");
                expect_score(data, name, raw, PartialScore::new(0.0, weight));
            }
            TestType::Invalid => {
                let inputs = invalid_inputs(&options);
                let input = inputs[rng.index(inputs.len())].clone();
                let message = match read_expression(&input, &options)? {
                    Err(message) => message,
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
        limits: &Limits,
    ) -> Result<Option<String>, QelError> {
        let name = answers_name(attrs)?;
        let options = parse_options(attrs, limits)?;
        Ok(reference(data, name, &options)?.map(|expr| expr.to_string()))
    }
}

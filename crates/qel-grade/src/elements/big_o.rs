//! `pl-big-o-input`: asymptotic bounds in one variable.

use qel_asymptotic::{grade, AsymptoticGrade, Flavor, CORRECT_ANSWER};
use qel_core::{
    check_answers_names, Attributes, Deadline, Element, Limits, PartialScore, QelError,
    QuestionData, RngHandle, TestType,
};
use qel_expr::{parse, Expr, ParseOptions};
use qel_symbolic::EquivalenceOptions;
use serde_json::Value;

use super::{
    answers_name, expect_invalid, expect_score, invalid_reference, missing_reference,
    missing_test_type, raw_submission, read_expression, reference_text, reread_expression,
    store_reference, submitted_text,
};
use crate::orchestrator::{grade_answer_parameterized, Graded};

const TAG: &str = "pl-big-o-input";
const REQUIRED: &[&str] = &["answers-name"];
const OPTIONAL: &[&str] = &[
    "weight",
    "correct-answer",
    "variable",
    "type",
    "label",
    "display",
    "size",
    "show-help-text",
    "allow-blank",
    "blank-value",
    "placeholder",
];

/// Handler for `pl-big-o-input`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BigOInput;

struct Settings {
    variable: String,
    flavor: Flavor,
    options: ParseOptions,
}

impl Settings {
    fn read(attrs: &Attributes, limits: &Limits) -> Result<Self, QelError> {
        let variable = attrs.string_or("variable").unwrap_or("n").trim().to_string();
        if variable.is_empty() || variable.contains(',') {
            return Err(QelError::authoring(
                "invalid-attribute",
                format!("Attribute \"variable\" must name one variable, not \"{variable}\""),
            )
            .with_context("element", TAG));
        }
        let options = ParseOptions::with_variables([variable.as_str()])
            .trig(false)
            .max_length(limits.expr_max_length);
        options.validate()?;
        Ok(Self {
            variable,
            flavor: attrs.enumerated("type", Flavor::BigO)?,
            options,
        })
    }

    fn reference(&self, data: &QuestionData, name: &str) -> Result<Option<Expr>, QelError> {
        reference_text(data, name)
            .map(|text| parse(&text, &self.options).map_err(|err| invalid_reference(name, err)))
            .transpose()
    }

    fn grade(
        &self,
        reference: &Expr,
        submitted: &Expr,
        deadline: &Deadline,
        limits: &Limits,
    ) -> Result<AsymptoticGrade, QelError> {
        grade(
            reference,
            submitted,
            &self.variable,
            self.flavor,
            deadline,
            &EquivalenceOptions::from(limits),
        )
    }
}

impl Element for BigOInput {
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
        let settings = Settings::read(attrs, limits)?;
        if let Some(correct) = attrs.string_or("correct-answer") {
            parse(correct, &settings.options).map_err(|err| invalid_reference(name, err))?;
            store_reference(data, name, Value::String(correct.to_string()))?;
        } else {
            settings.reference(data, name)?;
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
        let settings = Settings::read(attrs, limits)?;
        let Some(text) = raw_submission(attrs, data, name, "1")? else {
            return Ok(());
        };
        match read_expression(&text, &settings.options)? {
            Ok(_) => {
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
        let settings = Settings::read(attrs, limits)?;
        let Some(reference) = settings.reference(data, name)? else {
            return Ok(());
        };
        grade_answer_parameterized(data, name, weight, limits.timeout(), |submitted, deadline| {
            let submitted = reread_expression(submitted_text(submitted)?, &settings.options)?;
            let result = settings.grade(&reference, &submitted, deadline, limits)?;
            Ok(Graded::new(result.score).with_feedback(result.feedback))
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
        let settings = Settings::read(attrs, limits)?;
        let reference = settings
            .reference(data, name)?
            .ok_or_else(|| missing_reference(name))?;
        match data.test_type.ok_or_else(missing_test_type)? {
            TestType::Correct => {
                let score = PartialScore::new(1.0, weight).with_feedback(CORRECT_ANSWER);
                expect_score(data, name, reference.to_string(), score);
            }
            TestType::Incorrect => {
                // A strictly faster-growing bound never earns full credit.
                let power = rng.index(3) + 1;
                let raw = format!("{}**{power} * ({reference})", settings.variable);
                let submitted = parse(&raw, &settings.options)?;
                let deadline = Deadline::after(limits.timeout());
                let expected = settings.grade(&reference, &submitted, &deadline, limits)?;
                let score =
                    PartialScore::new(expected.score, weight).with_feedback(expected.feedback);
                expect_score(data, name, raw, score);
            }
            TestType::Invalid => {
                let input = format!("{} + 1.5", settings.variable);
                match read_expression(&input, &settings.options)? {
                    Err(message) => expect_invalid(data, name, input, message),
                    Ok(_) => {
                        return Err(QelError::internal(
                            "test-input-accepted",
                            format!("synthesized invalid input \"{input}\" parsed"),
                        ))
                    }
                }
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
        let settings = Settings::read(attrs, limits)?;
        Ok(settings.reference(data, name)?.map(|expr| expr.to_string()))
    }
}

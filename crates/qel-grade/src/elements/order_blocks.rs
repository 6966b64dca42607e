//! `pl-order-blocks`: arranging blocks into a correct order.

use qel_core::{
    check_answers_names, Attributes, Element, Limits, PartialScore, QelError, QuestionData,
    RngHandle, TestType,
};
use qel_dag::{
    grade_order_blocks, solve_order_blocks, FeedbackMode, GradingMethod, OrderBlocksOptions,
    PartialCredit, ReferenceBlock, SubmittedBlock,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{
    answers_name, expect_invalid, expect_score, missing_reference, missing_test_type,
    store_reference, BLANK_SUBMISSION,
};
use crate::orchestrator::{grade_answer_parameterized, Graded};

const TAG: &str = "pl-order-blocks";
const REQUIRED: &[&str] = &["answers-name"];
const OPTIONAL: &[&str] = &[
    "weight",
    "correct-answer",
    "grading-method",
    "partial-credit",
    "feedback",
    "indentation",
    "allow-blank",
];

/// Format error for a submission that is not a list of blocks.
const UNREADABLE: &str = "Invalid format. The submitted answer could not be read.";

/// Handler for `pl-order-blocks`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrderBlocks;

/// A submitted entry: a bare tag or a full block.
#[derive(Deserialize)]
#[serde(untagged)]
enum Entry {
    Tag(String),
    Block(SubmittedBlock),
}

impl From<Entry> for SubmittedBlock {
    fn from(entry: Entry) -> Self {
        match entry {
            Entry::Tag(tag) => SubmittedBlock::new(tag),
            Entry::Block(block) => block,
        }
    }
}

fn authoring(code: &str, message: impl Into<String>) -> QelError {
    QelError::authoring(code, message).with_context("element", TAG)
}

fn options(attrs: &Attributes, limits: &Limits) -> Result<OrderBlocksOptions, QelError> {
    let method = attrs.enumerated("grading-method", GradingMethod::default())?;
    if method == GradingMethod::Unordered && attrs.has("partial-credit") {
        return Err(authoring(
            "partial-credit-not-allowed",
            "You may not specify partial credit options in the unordered grading mode.",
        ));
    }
    Ok(OrderBlocksOptions {
        method,
        partial_credit: attrs.enumerated("partial-credit", PartialCredit::default_for(method))?,
        feedback: attrs.enumerated("feedback", FeedbackMode::default())?,
        indentation: attrs.boolean("indentation", false)?,
        mvc_exact_limit: limits.mvc_exact_limit,
    })
}

fn reference(data: &QuestionData, name: &str) -> Result<Option<Vec<ReferenceBlock>>, QelError> {
    match data.correct_answers.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|err| {
            authoring(
                "invalid-correct-answer",
                format!("Correct answer for \"{name}\" is not a list of blocks: {err}"),
            )
            .with_context("answers-name", name)
        }),
    }
}

/// Reads the learner's blocks from a JSON string or an already decoded list.
fn read_submission(raw: &Value) -> Option<Vec<SubmittedBlock>> {
    let entries: Vec<Entry> = match raw {
        Value::String(text) => serde_json::from_str(text).ok()?,
        Value::Array(_) => serde_json::from_value(raw.clone()).ok()?,
        _ => return None,
    };
    Some(entries.into_iter().map(SubmittedBlock::from).collect())
}

fn is_blank(raw: Option<&Value>) -> bool {
    match raw {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn fresh_tag(reference: &[ReferenceBlock]) -> String {
    (1..)
        .map(|n| format!("distractor-{n}"))
        .find(|tag| reference.iter().all(|block| &block.tag != tag))
        .unwrap_or_default()
}

fn blocks_json(blocks: &[SubmittedBlock]) -> Result<String, QelError> {
    Ok(serde_json::to_string(blocks)?)
}

impl Element for OrderBlocks {
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
        let options = options(attrs, limits)?;
        if let Some(correct) = attrs.string_or("correct-answer") {
            let value: Value = serde_json::from_str(correct).map_err(|err| {
                authoring(
                    "invalid-correct-answer",
                    format!("Correct answer for \"{name}\" is not valid JSON: {err}"),
                )
            })?;
            store_reference(data, name, value)?;
        }
        let reference = reference(data, name)?.ok_or_else(|| missing_reference(name))?;
        options.validate(&reference)?;
        let solution = solve_order_blocks(&reference, options.method)?;
        debug!(blocks = reference.len(), solution = solution.len(), "order blocks prepared");
        Ok(())
    }

    fn parse(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        _limits: &Limits,
    ) -> Result<(), QelError> {
        let name = answers_name(attrs)?;
        let raw = data
            .raw_submitted_answers
            .get(name)
            .or_else(|| data.submitted_answers.get(name))
            .cloned();
        if is_blank(raw.as_ref()) {
            if attrs.boolean("allow-blank", false)? {
                data.submitted_answers
                    .insert(name.to_string(), Value::Array(Vec::new()));
            } else {
                data.reject(name, BLANK_SUBMISSION);
            }
            return Ok(());
        }
        match raw.as_ref().and_then(read_submission) {
            Some(blocks) => {
                data.format_errors.remove(name);
                data.submitted_answers
                    .insert(name.to_string(), serde_json::to_value(blocks)?);
            }
            None => data.reject(name, UNREADABLE),
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
        let options = options(attrs, limits)?;
        let Some(reference) = reference(data, name)? else {
            return Ok(());
        };
        grade_answer_parameterized(data, name, weight, limits.timeout(), |submitted, _| {
            let blocks: Vec<SubmittedBlock> = serde_json::from_value(submitted.clone())?;
            let result = grade_order_blocks(&blocks, &reference, &options)?;
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
        limits: &Limits,
        rng: &mut RngHandle,
    ) -> Result<(), QelError> {
        let name = answers_name(attrs)?;
        let weight = attrs.weight()?;
        let options = options(attrs, limits)?;
        let reference = reference(data, name)?.ok_or_else(|| missing_reference(name))?;
        let solution: Vec<SubmittedBlock> = solve_order_blocks(&reference, options.method)?
            .into_iter()
            .map(|tag| {
                let indent = reference
                    .iter()
                    .find(|block| block.tag == tag)
                    .and_then(|block| block.indent)
                    .filter(|_| options.indentation);
                SubmittedBlock {
                    indent,
                    ..SubmittedBlock::new(tag)
                }
            })
            .collect();
        match data.test_type.ok_or_else(missing_test_type)? {
            TestType::Correct => {
                let raw = blocks_json(&solution)?;
                expect_score(data, name, raw, PartialScore::new(1.0, weight));
            }
            TestType::Incorrect => {
                let mut wrong = solution;
                let slot = rng.index(wrong.len());
                if let Some(block) = wrong.get_mut(slot) {
                    *block = SubmittedBlock {
                        distractor: true,
                        ..SubmittedBlock::new(fresh_tag(&reference))
                    };
                }
                let expected = grade_order_blocks(&wrong, &reference, &options)?;
                let mut score = PartialScore::new(expected.score, weight);
                if let Some(feedback) = expected.feedback {
                    score = score.with_feedback(feedback);
                }
                expect_score(data, name, blocks_json(&wrong)?, score);
            }
            TestType::Invalid => {
                expect_invalid(data, name, "not json", UNREADABLE);
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
        let options = options(attrs, limits)?;
        let Some(reference) = reference(data, name)? else {
            return Ok(None);
        };
        let solution = solve_order_blocks(&reference, options.method)?;
        Ok(Some(serde_json::to_string(&solution)?))
    }
}

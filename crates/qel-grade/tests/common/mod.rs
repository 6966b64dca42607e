#![allow(dead_code)]

use qel_core::{Attributes, Limits, PartialScore, QuestionData, TestType};
use qel_grade::{element_for, run_phase, Phase};
use serde_json::Value;

pub fn attrs(tag: &str, extra: &[(&str, &str)]) -> Attributes {
    extra
        .iter()
        .fold(Attributes::new(tag).with("answers-name", "q"), |attrs, (key, value)| {
            attrs.with(*key, *value)
        })
}

pub fn run(phase: Phase, attrs: &Attributes, data: &mut QuestionData) -> Option<String> {
    run_with(phase, attrs, data, &Limits::default())
}

pub fn run_with(
    phase: Phase,
    attrs: &Attributes,
    data: &mut QuestionData,
    limits: &Limits,
) -> Option<String> {
    let element = element_for(&attrs.tag).unwrap();
    run_phase(phase, element.as_ref(), attrs, data, limits).unwrap()
}

pub fn prepared(attrs: &Attributes) -> QuestionData {
    let mut data = QuestionData::default();
    run(Phase::Prepare, attrs, &mut data);
    data
}

/// Parses and grades `raw` against a freshly prepared record.
pub fn submit(attrs: &Attributes, raw: &str) -> QuestionData {
    let mut data = prepared(attrs);
    data.raw_submitted_answers
        .insert("q".to_string(), Value::String(raw.to_string()));
    run(Phase::Parse, attrs, &mut data);
    run(Phase::Grade, attrs, &mut data);
    data
}

/// [`submit`] under custom engine limits.
pub fn submit_with(attrs: &Attributes, raw: &str, limits: &Limits) -> QuestionData {
    let mut data = QuestionData::default();
    run_with(Phase::Prepare, attrs, &mut data, limits);
    data.raw_submitted_answers
        .insert("q".to_string(), Value::String(raw.to_string()));
    run_with(Phase::Parse, attrs, &mut data, limits);
    run_with(Phase::Grade, attrs, &mut data, limits);
    data
}

pub fn score(data: &QuestionData) -> &PartialScore {
    data.partial_scores.get("q").unwrap()
}

pub fn feedback_text(data: &QuestionData) -> String {
    match &score(data).feedback {
        Some(qel_core::Feedback::Text(text)) => text.clone(),
        other => panic!("expected text feedback, got {other:?}"),
    }
}

/// Runs test mode, then replays the synthesized submission through parse and grade.
pub fn self_test(attrs: &Attributes, test_type: TestType, seed: u64) -> (QuestionData, QuestionData) {
    let mut expected = prepared(attrs);
    expected.test_type = Some(test_type);
    expected.variant_seed = seed;
    run(Phase::Test, attrs, &mut expected);

    let mut replayed = prepared(attrs);
    replayed.raw_submitted_answers = expected.raw_submitted_answers.clone();
    run(Phase::Parse, attrs, &mut replayed);
    run(Phase::Grade, attrs, &mut replayed);
    (expected, replayed)
}

use std::time::Duration;

use qel_core::{Feedback, QelError, QuestionData};
use qel_grade::{
    grade_answer_parameterized, learner_message, Graded, ScoreValue, DID_NOT_CONVERGE,
    EXPANDS_TOO_LARGE,
};
use serde_json::{json, Value};

fn submitted(value: Value) -> QuestionData {
    let mut data = QuestionData::default();
    data.submitted_answers.insert("q".to_string(), value);
    data
}

const BUDGET: Duration = Duration::from_secs(1);

#[test]
fn booleans_and_fractions_are_coerced() {
    assert_eq!(ScoreValue::from(true).coerce().unwrap(), 1.0);
    assert_eq!(ScoreValue::from(false).coerce().unwrap(), 0.0);
    assert_eq!(ScoreValue::from(0.25).coerce().unwrap(), 0.25);

    for bad in [1.5, -0.1, f64::NAN] {
        let err = ScoreValue::from(bad).coerce().unwrap_err();
        assert!(matches!(&err, QelError::Internal(info) if info.code == "invalid-score"));
        assert!(err.info().hint.is_some());
    }
}

#[test]
fn successful_grades_store_score_and_feedback() {
    let mut data = submitted(json!("x"));
    grade_answer_parameterized(&mut data, "q", 3, BUDGET, |value, _| {
        assert_eq!(value, &json!("x"));
        Ok(Graded::new(0.5).with_feedback("halfway"))
    })
    .unwrap();
    let score = &data.partial_scores["q"];
    assert_eq!(score.score, 0.5);
    assert_eq!(score.weight, 3);
    assert_eq!(score.feedback, Some(Feedback::Text("halfway".to_string())));
}

#[test]
fn missing_or_null_submissions_score_zero_without_grading() {
    for mut data in [QuestionData::default(), submitted(Value::Null)] {
        grade_answer_parameterized(&mut data, "q", 1, BUDGET, |_, _| {
            panic!("grade function must not run")
        })
        .unwrap();
        assert_eq!(data.partial_scores["q"].score, 0.0);
        assert!(data.format_errors.is_empty());
    }
}

#[test]
fn learner_errors_become_format_errors() {
    let cases = [
        (QelError::timeout("symbolic", "budget spent"), DID_NOT_CONVERGE),
        (QelError::format("did-not-converge", "gave up"), DID_NOT_CONVERGE),
        (QelError::overflow("expand", "too many terms"), EXPANDS_TOO_LARGE),
        (QelError::format("invalid-unit", "Invalid unit."), "Invalid unit."),
    ];
    for (err, message) in cases {
        let mut data = submitted(json!("x"));
        grade_answer_parameterized(&mut data, "q", 1, BUDGET, |_, _| Err(err)).unwrap();
        assert_eq!(data.format_errors["q"], message);
        assert_eq!(data.partial_scores["q"].score, 0.0);
    }
}

#[test]
fn out_of_range_scores_are_internal_errors_with_context() {
    let mut data = submitted(json!("x"));
    let err = grade_answer_parameterized(&mut data, "q", 1, BUDGET, |_, _| Ok(Graded::new(2.0)))
        .unwrap_err();
    assert!(matches!(&err, QelError::Internal(info) if info.code == "invalid-score"));
    assert_eq!(err.info().context.get("answers-name").map(String::as_str), Some("q"));
    assert_eq!(data.partial_scores["q"].score, 0.0);
}

#[test]
fn authoring_errors_propagate() {
    let mut data = submitted(json!("x"));
    let err = grade_answer_parameterized(&mut data, "q", 1, BUDGET, |_, _| {
        Err(QelError::authoring("bad-reference", "reference does not parse"))
    })
    .unwrap_err();
    assert!(matches!(err, QelError::Authoring(info) if info.code == "bad-reference"));
    assert!(data.format_errors.is_empty());
}

#[test]
fn learner_message_passes_through_other_families() {
    let err = learner_message(QelError::internal("boom", "broken")).unwrap_err();
    assert!(matches!(err, QelError::Internal(info) if info.code == "boom"));
}

mod common;

use common::{attrs, feedback_text, prepared, run, run_with, score, submit, submit_with};
use qel_core::{Limits, QelError, QuestionData};
use qel_grade::{element_for, run_phase, Phase, BLANK_SUBMISSION};
use serde_json::{json, Value};

#[test]
fn big_o_lower_order_terms_earn_half_credit() {
    let element = attrs("pl-big-o-input", &[("correct-answer", "n^2")]);
    let data = submit(&element, "n^2 + n");
    assert_eq!(score(&data).score, 0.5);
    assert!(feedback_text(&data).contains("lower order terms"));
}

#[test]
fn big_o_smaller_growth_depends_on_the_bound() {
    let big_o = attrs("pl-big-o-input", &[("correct-answer", "n^2")]);
    let data = submit(&big_o, "n");
    assert_eq!(score(&data).score, 0.0);
    assert!(feedback_text(&data).contains("incorrect"));

    let omega = attrs("pl-big-o-input", &[("correct-answer", "n^2"), ("type", "omega")]);
    let data = submit(&omega, "n");
    assert!(feedback_text(&data).contains("too loose"));
}

#[test]
fn big_o_rejects_floats() {
    let element = attrs("pl-big-o-input", &[("correct-answer", "n")]);
    let data = submit(&element, "n + 1.5");
    assert!(data.format_errors.contains_key("q"));
    assert_eq!(data.submitted_answers.get("q"), Some(&Value::Null));
    assert_eq!(score(&data).score, 0.0);
}

#[test]
fn integer_in_base_sixteen() {
    let element = attrs("pl-integer-input", &[("correct-answer", "ff"), ("base", "16")]);
    assert_eq!(prepared(&element).correct_answers.get("q"), Some(&json!(255)));

    assert_eq!(score(&submit(&element, "0xFF")).score, 1.0);
    assert_eq!(score(&submit(&element, "256")).score, 0.0);

    let data = submit(&element, "3.4");
    assert!(data.format_errors["q"].starts_with("Invalid format"));
}

#[test]
fn integer_base_out_of_range_is_an_authoring_error() {
    let element = attrs("pl-integer-input", &[("correct-answer", "1"), ("base", "37")]);
    let handler = element_for("pl-integer-input").unwrap();
    let mut data = QuestionData::default();
    let err = run_phase(Phase::Prepare, handler.as_ref(), &element, &mut data, &Limits::default())
        .unwrap_err();
    assert!(matches!(err, QelError::Authoring(info) if info.code == "invalid-base"));
}

#[test]
fn units_with_tolerance_and_conversion() {
    let base = [("correct-answer", "5 m"), ("rtol", "0.01"), ("atol", "1e-8 m")];
    let element = attrs("pl-units-input", &base);
    assert_eq!(score(&submit(&element, "5.01 m")).score, 1.0);
    assert_eq!(score(&submit(&element, "500 cm")).score, 1.0);

    let data = submit(&element, "5 km");
    assert_eq!(score(&data).score, 0.0);
    assert_eq!(
        feedback_text(&data),
        "Your answer has correct units, but incorrect magnitude."
    );

    let partial = attrs(
        "pl-units-input",
        &[base[0], base[1], base[2], ("magnitude-partial-credit", "0.25")],
    );
    assert!((score(&submit(&partial, "5 km")).score - 0.75).abs() < 1e-12);

    let data = submit(&element, "5");
    assert_eq!(
        data.format_errors["q"],
        "Invalid format. The submitted answer has no unit."
    );
}

#[test]
fn units_only_mode_stores_the_unit() {
    let element = attrs(
        "pl-units-input",
        &[("correct-answer", "m/s"), ("grading-mode", "only-units")],
    );
    let data = submit(&element, "km/h");
    assert_eq!(data.submitted_answers["q"], json!("km/h"));
    assert_eq!(score(&data).score, 0.0);
    assert_eq!(score(&submit(&element, "m/s")).score, 1.0);

    let data = submit(&element, "3 m/s");
    assert_eq!(
        data.format_errors["q"],
        "Invalid format. The submitted answer should not include a magnitude."
    );
}

#[test]
fn matrix_dialects_and_shape_errors() {
    let element = attrs(
        "pl-matrix-input",
        &[
            ("correct-answer", "[[1,2],[3,4]]"),
            ("comparison", "sigfig"),
            ("digits", "2"),
        ],
    );
    let mut data = submit(&element, "[1 2; 3 4]");
    assert_eq!(score(&data).score, 1.0);
    assert_eq!(run(Phase::FormatAnswer, &element, &mut data).unwrap(), "[1.0 2.0; 3.0 4.0]");

    let data = submit(&element, "[[1,2,3],[4,5]]");
    assert_eq!(
        data.format_errors["q"],
        "Rows 1 and 2 of the matrix have a different number of columns."
    );
    assert_eq!(score(&submit(&element, "[[1,2],[3,5]]")).score, 0.0);
}

#[test]
fn symbolic_equivalence_and_parse_errors() {
    let element = attrs(
        "pl-symbolic-input",
        &[("correct-answer", "(x + 1)^2"), ("variables", "x")],
    );
    assert_eq!(score(&submit(&element, "x^2 + 2*x + 1")).score, 1.0);
    assert_eq!(score(&submit(&element, "x^2 + 1")).score, 0.0);

    let data = submit(&element, "x + y");
    assert!(data.format_errors.contains_key("q"));
    assert_eq!(score(&data).score, 0.0);
}

#[test]
fn symbolic_reference_must_parse() {
    let element = attrs(
        "pl-symbolic-input",
        &[("correct-answer", "x +* 1"), ("variables", "x")],
    );
    let handler = element_for("pl-symbolic-input").unwrap();
    let mut data = QuestionData::default();
    let err = run_phase(Phase::Prepare, handler.as_ref(), &element, &mut data, &Limits::default())
        .unwrap_err();
    assert!(matches!(err, QelError::Authoring(info) if info.code == "invalid-correct-answer"));
}

#[test]
fn blank_submissions_follow_the_blank_policy() {
    let strict = attrs("pl-symbolic-input", &[("correct-answer", "x"), ("variables", "x")]);
    let data = submit(&strict, "   ");
    assert_eq!(data.format_errors["q"], BLANK_SUBMISSION);

    let lenient = attrs(
        "pl-symbolic-input",
        &[("correct-answer", "0"), ("allow-blank", "true")],
    );
    let data = submit(&lenient, "");
    assert!(data.format_errors.is_empty());
    assert_eq!(score(&data).score, 1.0);

    let empty_value = attrs(
        "pl-integer-input",
        &[("correct-answer", "3"), ("allow-blank", "true"), ("blank-value", "")],
    );
    let data = submit(&empty_value, "");
    assert!(data.format_errors.is_empty());
    assert_eq!(data.submitted_answers["q"], Value::Null);
    assert_eq!(score(&data).score, 0.0);
}

#[test]
fn order_blocks_dag_accepts_any_topological_order() {
    let reference = json!([
        {"tag": "A"},
        {"tag": "B", "depends": ["A"]},
        {"tag": "C", "depends": ["A"]},
        {"tag": "D", "depends": ["B", "C"]}
    ]);
    let reference = reference.to_string();
    let element = attrs(
        "pl-order-blocks",
        &[("correct-answer", reference.as_str()), ("grading-method", "dag")],
    );
    assert_eq!(score(&submit(&element, r#"["A","B","C","D"]"#)).score, 1.0);
    assert_eq!(score(&submit(&element, r#"["A","C","B","D"]"#)).score, 1.0);

    let partial = score(&submit(&element, r#"["A","D","B","C"]"#)).score;
    assert!(partial > 0.0 && partial < 1.0);

    let data = submit(&element, "not json");
    assert_eq!(
        data.format_errors["q"],
        "Invalid format. The submitted answer could not be read."
    );
}

#[test]
fn order_blocks_unordered_refuses_partial_credit_options() {
    let element = attrs(
        "pl-order-blocks",
        &[
            ("correct-answer", r#"[{"tag": "A"}]"#),
            ("grading-method", "unordered"),
            ("partial-credit", "lcs"),
        ],
    );
    let handler = element_for("pl-order-blocks").unwrap();
    let mut data = QuestionData::default();
    let err = run_phase(Phase::Prepare, handler.as_ref(), &element, &mut data, &Limits::default())
        .unwrap_err();
    assert!(matches!(err, QelError::Authoring(info) if info.code == "partial-credit-not-allowed"));
}

fn ends_in_01() -> Value {
    json!({
        "states": ["a", "b", "c"],
        "input_symbols": ["0", "1"],
        "transitions": {
            "a": {"0": "b", "1": "a"},
            "b": {"0": "b", "1": "c"},
            "c": {"0": "b", "1": "a"}
        },
        "initial_state": "a",
        "final_states": ["c"]
    })
}

fn fsm_diagram(accepting: [bool; 3], links: Value) -> String {
    json!({
        "nodes": [
            {"text": "x", "isAcceptState": accepting[0]},
            {"text": "y", "isAcceptState": accepting[1]},
            {"text": "z", "isAcceptState": accepting[2]}
        ],
        "links": links
    })
    .to_string()
}

#[test]
fn fsm_builder_grades_languages_and_reports_counterexamples() {
    let reference = ends_in_01().to_string();
    let element = attrs(
        "fsm-builder",
        &[("fsm-type", "DFA"), ("correct-answer", reference.as_str())],
    );
    let renamed = fsm_diagram(
        [false, false, true],
        json!([
            {"type": "StartLink", "node": 0},
            {"type": "SelfLink", "node": 0, "text": "1"},
            {"type": "Link", "nodeA": 0, "nodeB": 1, "text": "0"},
            {"type": "SelfLink", "node": 1, "text": "0"},
            {"type": "Link", "nodeA": 1, "nodeB": 2, "text": "1"},
            {"type": "Link", "nodeA": 2, "nodeB": 1, "text": "0"},
            {"type": "Link", "nodeA": 2, "nodeB": 0, "text": "1"}
        ]),
    );
    assert_eq!(score(&submit(&element, &renamed)).score, 1.0);

    let contains_01 = fsm_diagram(
        [false, false, true],
        json!([
            {"type": "StartLink", "node": 0},
            {"type": "SelfLink", "node": 0, "text": "1"},
            {"type": "Link", "nodeA": 0, "nodeB": 1, "text": "0"},
            {"type": "SelfLink", "node": 1, "text": "0"},
            {"type": "Link", "nodeA": 1, "nodeB": 2, "text": "1"},
            {"type": "SelfLink", "node": 2, "text": "0,1"}
        ]),
    );
    let data = submit(&element, &contains_01);
    assert_eq!(score(&data).score, 0.0);
    assert!(feedback_text(&data).contains("010"));
}

#[test]
fn fsm_builder_highlights_diagram_errors() {
    let reference = ends_in_01().to_string();
    let element = attrs(
        "fsm-builder",
        &[("fsm-type", "DFA"), ("correct-answer", reference.as_str())],
    );
    let partial = fsm_diagram(
        [false, false, true],
        json!([
            {"type": "StartLink", "node": 0},
            {"type": "SelfLink", "node": 0, "text": "1"},
            {"type": "Link", "nodeA": 0, "nodeB": 1, "text": "0"},
            {"type": "Link", "nodeA": 1, "nodeB": 2, "text": "1"}
        ]),
    );
    let data = submit(&element, &partial);
    assert!(data.format_errors["q"].starts_with("States missing outgoing transitions"));
    let highlights = &data.params["q"]["highlights"];
    assert!(!highlights["transitions"].as_array().unwrap().is_empty());
    assert_eq!(data.params["q"]["fsm_type"], json!("DFA"));
}

#[test]
fn format_answer_renders_the_reference() {
    let element = attrs("pl-integer-input", &[("correct-answer", "255"), ("base", "16")]);
    let mut data = prepared(&element);
    assert_eq!(run(Phase::FormatAnswer, &element, &mut data).unwrap(), "ff");

    let element = attrs("pl-units-input", &[("correct-answer", "9.81 m/s^2")]);
    let mut data = prepared(&element);
    assert_eq!(run(Phase::FormatAnswer, &element, &mut data).unwrap(), "9.81 m/s^2");
}

#[test]
fn duplicate_answer_names_are_rejected() {
    let element = attrs("pl-integer-input", &[("correct-answer", "1")]);
    let mut data = prepared(&element);
    let handler = element_for("pl-integer-input").unwrap();
    let err = run_phase(Phase::Prepare, handler.as_ref(), &element, &mut data, &Limits::default())
        .unwrap_err();
    assert!(matches!(err, QelError::Authoring(info) if info.code == "duplicate-answers-name"));
}

#[test]
fn pathological_nesting_is_a_format_error() {
    let element = attrs("pl-symbolic-input", &[("correct-answer", "x"), ("variables", "x")]);
    for raw in [format!("{}x", "-".repeat(400)), format!("x{}", "^x".repeat(300))] {
        let data = submit(&element, &raw);
        assert!(data.format_errors["q"].contains("syntax error"), "{raw}");
        assert_eq!(score(&data).score, 0.0);
    }
    assert_eq!(score(&submit(&element, "--x")).score, 1.0);
}

#[test]
fn answers_near_the_length_limit_grade_like_they_parse() {
    let limits = Limits {
        expr_max_length: 100,
        ..Limits::default()
    };
    let raw = vec!["x"; 30].join("+");
    assert!(raw.len() <= 100);

    let element = attrs("pl-symbolic-input", &[("correct-answer", "30*x"), ("variables", "x")]);
    let data = submit_with(&element, &raw, &limits);
    assert!(data.format_errors.is_empty(), "{:?}", data.format_errors);
    assert_eq!(data.submitted_answers["q"], json!(raw));
    assert_eq!(score(&data).score, 1.0);

    let element = attrs("pl-big-o-input", &[("correct-answer", "n")]);
    let raw = vec!["n"; 30].join("+");
    let data = submit_with(&element, &raw, &limits);
    assert!(data.format_errors.is_empty(), "{:?}", data.format_errors);
    assert_eq!(score(&data).score, 0.5);
}

#[test]
fn format_answer_uses_the_configured_limits() {
    let limits = Limits {
        expr_max_length: 2_000,
        ..Limits::default()
    };
    let reference = vec!["x"; 300].join(" + ");
    assert!(reference.len() > Limits::default().expr_max_length);
    let element = attrs(
        "pl-symbolic-input",
        &[("correct-answer", reference.as_str()), ("variables", "x")],
    );
    let mut data = QuestionData::default();
    run_with(Phase::Prepare, &element, &mut data, &limits);
    let answer = run_with(Phase::FormatAnswer, &element, &mut data, &limits).unwrap();
    assert!(answer.starts_with("x + x"));
}

#[test]
fn symbolic_grading_does_not_assume_positive_variables() {
    let element = attrs("pl-symbolic-input", &[("correct-answer", "x"), ("variables", "x")]);
    assert_eq!(score(&submit(&element, "sqrt(x^2)")).score, 0.0);
    assert_eq!(score(&submit(&element, "abs(x)")).score, 0.0);
    assert_eq!(score(&submit(&element, "sqrt(x)^2")).score, 1.0);

    let log = attrs("pl-symbolic-input", &[("correct-answer", "2*log(x)"), ("variables", "x")]);
    assert_eq!(score(&submit(&log, "log(x^2)")).score, 0.0);
}

#[test]
fn number_input_accepts_fractions_and_applies_the_tolerance() {
    let element = attrs("pl-number-input", &[("correct-answer", "0.75")]);
    let data = submit(&element, "3/4");
    assert_eq!(data.submitted_answers["q"], json!(0.75));
    assert_eq!(score(&data).score, 1.0);
    assert_eq!(score(&submit(&element, "0.7")).score, 0.0);

    let strict = attrs(
        "pl-number-input",
        &[("correct-answer", "0.75"), ("allow-fractions", "false")],
    );
    let data = submit(&strict, "3/4");
    assert!(data.format_errors["q"].contains("Fractional answers are not allowed"));

    let data = submit(&element, "1/0");
    assert!(data.format_errors["q"].contains("division by zero"));
    let data = submit(&element, "three");
    assert!(data.format_errors["q"].contains("decimal number"));
}

#[test]
fn number_input_complex_values_and_formatting() {
    let element = attrs(
        "pl-number-input",
        &[("correct-answer", "1+2j"), ("allow-complex", "true")],
    );
    assert_eq!(score(&submit(&element, "1 + 2i")).score, 1.0);
    assert_eq!(score(&submit(&element, "(2+4j)/2")).score, 1.0);
    assert_eq!(score(&submit(&element, "1-2j")).score, 0.0);

    let decimals = attrs(
        "pl-number-input",
        &[("correct-answer", "3.14159"), ("comparison", "decdig"), ("digits", "2")],
    );
    let mut data = prepared(&decimals);
    assert_eq!(run(Phase::FormatAnswer, &decimals, &mut data).as_deref(), Some("3.14"));
    assert_eq!(score(&submit(&decimals, "3.14")).score, 1.0);
}

#[test]
fn number_input_blank_value_defaults_to_zero() {
    let element = attrs(
        "pl-number-input",
        &[("correct-answer", "0"), ("allow-blank", "true")],
    );
    let data = submit(&element, "  ");
    assert!(data.format_errors.is_empty());
    assert_eq!(score(&data).score, 1.0);
}

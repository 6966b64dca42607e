use qel_core::{check_answers_names, Attributes, QelError, QuestionData, TestType};

fn attrs() -> Attributes {
    Attributes::new("pl-integer-input")
        .with("answers-name", "x")
        .with("weight", "3")
        .with("allow-blank", "Yes")
        .with("rtol", "0.05")
}

#[test]
fn check_rejects_unknown_attributes() {
    let err = attrs()
        .check(&["answers-name"], &["weight", "allow-blank"])
        .unwrap_err();
    assert!(matches!(err, QelError::Authoring(ref info) if info.code == "unknown-attribute"));
    assert_eq!(err.info().context.get("attribute").map(String::as_str), Some("rtol"));
}

#[test]
fn check_rejects_missing_required() {
    let err = Attributes::new("pl-units-input")
        .check(&["answers-name"], &[])
        .unwrap_err();
    assert_eq!(err.info().code, "missing-attribute");
}

#[test]
fn typed_getters() {
    let a = attrs();
    assert_eq!(a.string("answers-name").unwrap(), "x");
    assert_eq!(a.weight().unwrap(), 3);
    assert!(a.boolean("allow-blank", false).unwrap());
    assert!(!a.boolean("missing", false).unwrap());
    assert!((a.float("rtol", 0.01).unwrap() - 0.05).abs() < 1e-12);
    assert_eq!(a.integer("digits", 2).unwrap(), 2);
    let parsed: TestType = Attributes::new("t")
        .with("kind", "incorrect")
        .enumerated("kind", TestType::Correct)
        .unwrap();
    assert_eq!(parsed, TestType::Incorrect);
}

#[test]
fn malformed_values_are_authoring_errors() {
    let a = Attributes::new("t").with("weight", "-1").with("digits", "two");
    assert!(matches!(a.weight(), Err(QelError::Authoring(_))));
    assert!(matches!(a.integer("digits", 2), Err(QelError::Authoring(_))));
}

#[test]
fn duplicate_answers_names_are_rejected() {
    let mut data = QuestionData::default();
    check_answers_names(&mut data, "ans").unwrap();
    check_answers_names(&mut data, "other").unwrap();
    let err = check_answers_names(&mut data, "ans").unwrap_err();
    assert_eq!(err.info().code, "duplicate-answers-name");
}

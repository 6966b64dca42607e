use qel_core::{Attributes, QelError};
use qel_units::{
    parse_quantity, parse_submission, GradingMode, UnitError, UnitGrader, UnitSystem,
    CORRECT_MAGNITUDE_INCORRECT_UNITS, CORRECT_UNITS_INCORRECT_MAGNITUDE, INCORRECT,
};

fn system() -> &'static UnitSystem {
    UnitSystem::shared().unwrap()
}

fn attrs() -> Attributes {
    Attributes::new("pl-units-input").with("answers-name", "q")
}

fn grade(grader: &UnitGrader, reference: &str, submitted: &str) -> (f64, Option<&'static str>) {
    let reference = parse_quantity(reference, system()).unwrap();
    let submitted = parse_submission(submitted, grader.mode(), system()).unwrap();
    let result = grader.grade(&reference, &submitted);
    (result.score, result.feedback)
}

#[test]
fn with_units_tolerates_small_errors_and_converts() {
    let reference = parse_quantity("5 m", system()).unwrap();
    let grader = UnitGrader::from_attributes(
        &attrs().with("rtol", "0.01").with("atol", "1e-8 m"),
        &reference,
        system(),
    )
    .unwrap();
    assert_eq!(grader.mode(), GradingMode::WithUnits);
    assert_eq!(grade(&grader, "5 m", "5.01 m"), (1.0, None));
    assert_eq!(grade(&grader, "5 m", "500 cm"), (1.0, None));
    assert_eq!(
        grade(&grader, "5 m", "5 km"),
        (0.0, Some(CORRECT_UNITS_INCORRECT_MAGNITUDE))
    );
    assert_eq!(grade(&grader, "5 m", "5 s"), (0.0, Some(INCORRECT)));

    let err = parse_submission("5", GradingMode::WithUnits, system()).unwrap_err();
    assert_eq!(err, UnitError::NoUnit);
    assert_eq!(err.to_string(), "Invalid format. The submitted answer has no unit.");
}

#[test]
fn with_units_partial_credit_for_wrong_magnitude() {
    let reference = parse_quantity("5 m", system()).unwrap();
    let grader = UnitGrader::from_attributes(
        &attrs().with("magnitude-partial-credit", "0.25"),
        &reference,
        system(),
    )
    .unwrap();
    let (score, feedback) = grade(&grader, "5 m", "5 km");
    assert!((score - 0.75).abs() < 1e-12);
    assert_eq!(feedback, Some(CORRECT_UNITS_INCORRECT_MAGNITUDE));
}

#[test]
fn exact_units_splits_credit() {
    let reference = parse_quantity("5 m", system()).unwrap();
    let grader = UnitGrader::from_attributes(
        &attrs()
            .with("grading-mode", "exact-units")
            .with("magnitude-partial-credit", "0.3"),
        &reference,
        system(),
    )
    .unwrap();
    assert_eq!(grade(&grader, "5 m", "5.001 m"), (1.0, None));
    let (score, feedback) = grade(&grader, "5 m", "6 m");
    assert!((score - 0.7).abs() < 1e-12);
    assert_eq!(feedback, Some(CORRECT_UNITS_INCORRECT_MAGNITUDE));
    let (score, feedback) = grade(&grader, "5 m", "5 km");
    assert!((score - 0.3).abs() < 1e-12);
    assert_eq!(feedback, Some(CORRECT_MAGNITUDE_INCORRECT_UNITS));
    assert_eq!(grade(&grader, "5 m", "6 km"), (0.0, Some(INCORRECT)));
}

#[test]
fn only_units_compares_unit_and_scale() {
    let reference = parse_quantity("N", system()).unwrap();
    let grader = UnitGrader::from_attributes(
        &attrs().with("grading-mode", "only-units"),
        &reference,
        system(),
    )
    .unwrap();
    assert_eq!(grade(&grader, "N", "kg m / s^2"), (1.0, None));
    assert_eq!(grade(&grader, "N", "kN"), (0.0, Some(INCORRECT)));
    assert_eq!(
        parse_submission("3 N", GradingMode::OnlyUnits, system()).unwrap_err(),
        UnitError::UnexpectedMagnitude
    );
}

#[test]
fn submission_errors() {
    let s = system();
    assert_eq!(
        parse_submission("  ", GradingMode::WithUnits, s).unwrap_err(),
        UnitError::Blank
    );
    assert_eq!(
        parse_submission("m", GradingMode::ExactUnits, s).unwrap_err(),
        UnitError::MissingMagnitude
    );
    let err = parse_submission("5 blorps", GradingMode::WithUnits, s).unwrap_err();
    assert_eq!(err.to_string(), "Invalid unit.");
    let err: QelError = err.into();
    assert!(matches!(err, QelError::Format(_)));
}

fn authoring_code(attrs: Attributes, reference: &str) -> String {
    let reference = parse_quantity(reference, system()).unwrap();
    match UnitGrader::from_attributes(&attrs, &reference, system()) {
        Err(QelError::Authoring(info)) => info.code,
        other => panic!("expected an authoring error, got {other:?}"),
    }
}

#[test]
fn authoring_checks() {
    assert_eq!(
        authoring_code(attrs().with("atol", "1e-8 s"), "5 m"),
        "atol-dimension-mismatch"
    );
    assert_eq!(
        authoring_code(attrs().with("atol", "1e-8"), "5 m"),
        "atol-needs-units"
    );
    assert_eq!(
        authoring_code(attrs().with("comparison", "sigfig"), "5 m"),
        "comparison-not-allowed"
    );
    assert_eq!(
        authoring_code(attrs().with("magnitude-partial-credit", "1.5"), "5 m"),
        "invalid-partial-credit"
    );
    assert_eq!(
        authoring_code(
            attrs().with("grading-mode", "exact-units").with("atol", "1 m"),
            "5 m"
        ),
        "atol-has-units"
    );
    assert_eq!(
        authoring_code(
            attrs()
                .with("grading-mode", "exact-units")
                .with("comparison", "sigfig")
                .with("digits", "0"),
            "5 m"
        ),
        "invalid-digits"
    );
    assert_eq!(authoring_code(attrs(), "5"), "reference-without-unit");
}

#[test]
fn legacy_mode_names_parse() {
    let mode: GradingMode = "units-agnostic".parse().unwrap();
    assert_eq!(mode, GradingMode::WithUnits);
    assert_eq!(mode.to_string(), "with-units");
    assert_eq!(
        "units-fixed".parse::<GradingMode>().unwrap(),
        GradingMode::ExactUnits
    );
}

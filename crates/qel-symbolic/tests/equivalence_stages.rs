use qel_core::{Deadline, ErrorCategory, QelError};
use qel_expr::{parse, Expr, ParseOptions};
use qel_symbolic::{
    compare, equivalent, Canonicalizer, Equivalence, EquivalenceOptions, SymbolicError,
    DIVISION_BY_ZERO_MESSAGE, MAX_DEPTH,
};

fn expr(text: &str) -> Expr {
    parse(text, &ParseOptions::with_variables(["x", "y", "a", "b"])).unwrap()
}

fn stage(reference: &str, submitted: &str) -> Equivalence {
    compare(
        &expr(reference),
        &expr(submitted),
        &Deadline::unbounded(),
        &EquivalenceOptions::default(),
    )
    .unwrap()
}

#[test]
fn reordered_terms_match_structurally() {
    assert_eq!(stage("x + y", "y + x"), Equivalence::Structural);
    assert_eq!(stage("2x", "x + x"), Equivalence::Structural);
    assert_eq!(stage("x*y*2", "2*(y*x)"), Equivalence::Structural);
    assert_eq!(stage("x - x + 1", "1"), Equivalence::Structural);
}

#[test]
fn powers_of_sums_expand() {
    assert_eq!(stage("(x+1)^2", "x^2 + 2x + 1"), Equivalence::Structural);
    assert_eq!(stage("(x+y)(x-y)", "x^2 - y^2"), Equivalence::Structural);
}

#[test]
fn exponentials_merge_and_radicals_fold() {
    assert_eq!(stage("exp(a)*exp(b)", "exp(a+b)"), Equivalence::Structural);
    assert_eq!(stage("sqrt(8)", "2*sqrt(2)"), Equivalence::Structural);
    assert_eq!(stage("sqrt(x)", "x^(1/2)"), Equivalence::Structural);
    assert_eq!(stage("log(exp(x))", "x"), Equivalence::Structural);
}

#[test]
fn cancelling_quotient_needs_the_difference_stage() {
    assert_eq!(stage("(x^2-1)/(x-1)", "x+1"), Equivalence::DifferenceZero);
}

#[test]
fn trig_identity_falls_back_to_sampling() {
    assert_eq!(stage("sin(x)^2 + cos(x)^2", "1"), Equivalence::Numeric);
    assert_eq!(stage("abs(x)^2", "x^2"), Equivalence::Numeric);
    assert_eq!(stage("abs(x)", "sqrt(x^2)"), Equivalence::Numeric);
}

#[test]
fn branch_dependent_rewrites_are_rejected() {
    assert_eq!(stage("x", "sqrt(x^2)"), Equivalence::NotEquivalent);
    assert_eq!(stage("-x", "sqrt(x^2)"), Equivalence::NotEquivalent);
    assert_eq!(stage("abs(x)", "x"), Equivalence::NotEquivalent);
    assert_eq!(stage("2*log(x)", "log(x^2)"), Equivalence::NotEquivalent);
    assert_eq!(stage("x*y", "sqrt(x^2*y^2)"), Equivalence::NotEquivalent);
    assert_eq!(stage("x^3", "(x^6)^(1/2)"), Equivalence::NotEquivalent);
}

#[test]
fn principal_branch_identities_still_hold() {
    assert_eq!(stage("sqrt(x)^2", "x"), Equivalence::Structural);
    assert_eq!(stage("log(x)", "log(x)"), Equivalence::Structural);
    assert!(stage("exp(log(x))", "x").is_equivalent());
}

#[test]
fn different_expressions_are_rejected() {
    assert_eq!(stage("x^2", "x^3"), Equivalence::NotEquivalent);
    assert_eq!(stage("sin(x)", "cos(x)"), Equivalence::NotEquivalent);
    assert!(!equivalent(
        &expr("x + 1"),
        &expr("x + 2"),
        &Deadline::unbounded(),
        &EquivalenceOptions::default()
    )
    .unwrap());
}

#[test]
fn reference_division_by_zero_is_an_authoring_fault() {
    let err = compare(
        &expr("1/0"),
        &expr("1"),
        &Deadline::unbounded(),
        &EquivalenceOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Authoring);
    assert_eq!(err.info().code, "division-by-zero");
}

#[test]
fn submitted_division_by_zero_is_a_format_error() {
    let err = compare(
        &expr("x"),
        &expr("1/(x - x)"),
        &Deadline::unbounded(),
        &EquivalenceOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(&err, QelError::Format(info) if info.message == DIVISION_BY_ZERO_MESSAGE));
}

#[test]
fn expansion_beyond_the_term_budget_overflows() {
    let deadline = Deadline::unbounded();
    let canon = Canonicalizer::new(100, &deadline);
    let err = canon.canonical(&expr("(x + y + a + b)^12")).unwrap_err();
    assert_eq!(err, SymbolicError::TooManyTerms { limit: 100 });
    let err = QelError::from(err);
    assert!(matches!(&err, QelError::Overflow(info) if info.code == "too-many-terms"));
    assert_eq!(err.category(), ErrorCategory::Learner);
}

#[test]
fn trees_built_past_the_depth_bound_are_refused() {
    let deadline = Deadline::unbounded();
    let canon = Canonicalizer::new(4_096, &deadline);
    let deep = (0..MAX_DEPTH + 10).fold(Expr::Symbol("x".to_string()), |inner, _| {
        Expr::Neg(Box::new(inner))
    });
    assert_eq!(canon.canonical(&deep).unwrap_err(), SymbolicError::Overflow("nesting"));

    let shallow = (0..100).fold(Expr::Symbol("x".to_string()), |inner, _| {
        Expr::Neg(Box::new(inner))
    });
    assert!(canon.canonical(&shallow).is_ok());
}

#[test]
fn expired_deadline_interrupts() {
    let deadline = Deadline::after(std::time::Duration::ZERO);
    let err = compare(
        &expr("x"),
        &expr("x"),
        &deadline,
        &EquivalenceOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, QelError::Timeout(_)));
}

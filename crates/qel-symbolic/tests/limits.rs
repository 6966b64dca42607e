use std::cmp::Ordering;

use qel_core::{Deadline, QelError};
use qel_expr::{parse, ParseOptions};
use qel_symbolic::{eventual_sign, limit_at_infinity, Limit};

fn limit(text: &str) -> Result<Limit, QelError> {
    let expr = parse(text, &ParseOptions::with_variables(["n"])).unwrap();
    limit_at_infinity(&expr, "n", &Deadline::unbounded())
}

fn finite(text: &str) -> f64 {
    match limit(text).unwrap() {
        Limit::Finite(value) => value,
        other => panic!("{text}: expected a finite limit, got {other:?}"),
    }
}

#[test]
fn lower_order_terms_vanish_in_ratios() {
    assert!((finite("n^2/(n^2 + n)") - 1.0).abs() < 1e-12);
    assert!((finite("(3n^2 + log(n))/n^2") - 3.0).abs() < 1e-12);
    assert!((finite("(n+1)^3/(2n^3)") - 0.5).abs() < 1e-12);
}

#[test]
fn polynomial_and_logarithmic_orders_compare() {
    assert_eq!(limit("log(n)/n").unwrap(), Limit::Zero);
    assert_eq!(limit("n/log(n)").unwrap(), Limit::PosInfinity);
    assert_eq!(limit("n*log(n)/n^2").unwrap(), Limit::Zero);
    assert_eq!(limit("sqrt(n)/log(n)^3").unwrap(), Limit::PosInfinity);
}

#[test]
fn exponentials_and_factorials_dominate() {
    assert_eq!(limit("factorial(n)/2^n").unwrap(), Limit::PosInfinity);
    assert_eq!(limit("n^100/2^n").unwrap(), Limit::Zero);
    assert_eq!(limit("3^n/2^n").unwrap(), Limit::PosInfinity);
    assert_eq!(limit("factorial(n)/n^n").unwrap(), Limit::Zero);
    assert!((finite("exp(n)/e^n") - 1.0).abs() < 1e-9);
}

#[test]
fn logarithm_rules_hold() {
    assert!((finite("log(n^2)/log(n)") - 2.0).abs() < 1e-12);
    assert!((finite("log(2^n)/n") - 2f64.ln()).abs() < 1e-12);
}

#[test]
fn negative_growth_is_reported() {
    assert_eq!(limit("1 - n").unwrap(), Limit::NegInfinity);
    let expr = parse("5 - n^2", &ParseOptions::with_variables(["n"])).unwrap();
    assert_eq!(
        eventual_sign(&expr, "n", &Deadline::unbounded()).unwrap(),
        Ordering::Less
    );
}

#[test]
fn oscillating_expressions_do_not_converge() {
    let err = limit("n sin(n)").unwrap_err();
    assert!(matches!(&err, QelError::Timeout(info) if info.code == "did-not-converge"));
}

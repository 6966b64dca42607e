use qel_asymptotic::{
    grade, rubric, AsymptoticGrade, Flavor, Ratio, CONSTANT_FACTORS, CORRECT_ANSWER,
    CORRECT_COMPLEX, DID_NOT_CONVERGE, INCORRECT, LOWER_ORDER, NEGATIVE, TOO_LOOSE,
};
use qel_core::{Deadline, QelError};
use qel_expr::{parse, ParseOptions};
use qel_symbolic::EquivalenceOptions;
use strum::IntoEnumIterator;

fn grade_text(flavor: Flavor, reference: &str, submitted: &str) -> Result<AsymptoticGrade, QelError> {
    let options = ParseOptions::with_variables(["n"]);
    grade(
        &parse(reference, &options).unwrap(),
        &parse(submitted, &options).unwrap(),
        "n",
        flavor,
        &Deadline::unbounded(),
        &EquivalenceOptions::default(),
    )
}

fn scored(flavor: Flavor, reference: &str, submitted: &str) -> (f64, &'static str) {
    let result = grade_text(flavor, reference, submitted).unwrap();
    (result.score, result.feedback)
}

#[test]
fn lower_order_terms_earn_half_credit_for_big_o() {
    let (score, feedback) = scored(Flavor::BigO, "n^2", "n^2 + n");
    assert_eq!(score, 0.5);
    assert!(feedback.contains("lower order terms"));
}

#[test]
fn smaller_growth_is_incorrect_for_big_o_and_loose_for_omega() {
    assert_eq!(scored(Flavor::BigO, "n^2", "n"), (0.0, INCORRECT));
    assert_eq!(scored(Flavor::Omega, "n^2", "n"), (0.25, TOO_LOOSE));
    assert!(TOO_LOOSE.contains("too loose"));
    assert!(INCORRECT.contains("incorrect"));
}

#[test]
fn larger_growth_is_loose_for_big_o() {
    assert_eq!(scored(Flavor::BigO, "n", "n^2"), (0.25, TOO_LOOSE));
    assert_eq!(scored(Flavor::Omega, "n", "n^2"), (0.0, INCORRECT));
    assert_eq!(scored(Flavor::Theta, "n", "n^2"), (0.0, INCORRECT));
    assert_eq!(scored(Flavor::Theta, "n^2", "n"), (0.0, INCORRECT));
}

#[test]
fn constant_factors_are_flagged() {
    assert_eq!(scored(Flavor::BigO, "n log(n)", "3 n log(n)"), (0.5, CONSTANT_FACTORS));
    assert_eq!(scored(Flavor::Theta, "n", "2n"), (0.25, CONSTANT_FACTORS));
    assert_eq!(scored(Flavor::LittleO, "n", "2n"), (0.5, CONSTANT_FACTORS));
}

#[test]
fn strict_bounds_reject_unit_ratios() {
    assert_eq!(scored(Flavor::LittleO, "n^2", "n^2 + n"), (0.0, INCORRECT));
    assert_eq!(scored(Flavor::LittleOmega, "n^2", "n^2 + 1"), (0.0, INCORRECT));
    assert_eq!(scored(Flavor::Theta, "n^2", "n^2 + n"), (0.25, LOWER_ORDER));
}

#[test]
fn identical_and_equivalent_answers_are_correct() {
    assert_eq!(scored(Flavor::BigO, "n^2", "n^2"), (1.0, CORRECT_ANSWER));
    assert_eq!(scored(Flavor::BigO, "n^2", "n*n"), (1.0, CORRECT_ANSWER));
    assert_eq!(
        scored(Flavor::BigO, "n + 1", "(n^2 - 1)/(n - 1)"),
        (1.0, CORRECT_COMPLEX)
    );
}

#[test]
fn zero_and_negative_answers_score_nothing() {
    assert_eq!(scored(Flavor::BigO, "n", "n - n"), (0.0, INCORRECT));
    assert_eq!(scored(Flavor::BigO, "n", "-n"), (0.0, NEGATIVE));
    assert_eq!(scored(Flavor::Omega, "n", "3 - n^2"), (0.0, NEGATIVE));
}

#[test]
fn factorial_and_exponential_orders() {
    assert_eq!(scored(Flavor::BigO, "2^n", "factorial(n)"), (0.25, TOO_LOOSE));
    assert_eq!(scored(Flavor::BigO, "factorial(n)", "2^n"), (0.0, INCORRECT));
}

#[test]
fn oscillating_answers_do_not_converge() {
    let err = grade_text(Flavor::BigO, "n", "n (2 + sin(n))").unwrap_err();
    assert!(matches!(&err, QelError::Format(info) if info.message == DID_NOT_CONVERGE));
}

#[test]
fn every_rubric_cell_scores_within_the_scale() {
    for flavor in Flavor::iter() {
        for ratio in [Ratio::Infinite, Ratio::Zero, Ratio::One, Ratio::Constant] {
            let cell = rubric(flavor, ratio);
            assert!([0.0, 0.25, 0.5].contains(&cell.score), "{flavor} {ratio:?}");
        }
    }
}

#[test]
fn flavors_parse_from_attribute_spellings() {
    assert_eq!("big-o".parse::<Flavor>().unwrap(), Flavor::BigO);
    assert_eq!("theta".parse::<Flavor>().unwrap(), Flavor::Theta);
    assert_eq!("little-omega".parse::<Flavor>().unwrap(), Flavor::LittleOmega);
}

mod monomials {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn big_o_orders_polynomial_degrees(reference in 1u32..6, submitted in 1u32..6) {
            let (score, feedback) = scored(
                Flavor::BigO,
                &format!("n^{reference}"),
                &format!("n^{submitted}"),
            );
            if reference == submitted {
                prop_assert_eq!((score, feedback), (1.0, CORRECT_ANSWER));
            } else if reference < submitted {
                prop_assert_eq!((score, feedback), (0.25, TOO_LOOSE));
            } else {
                prop_assert_eq!((score, feedback), (0.0, INCORRECT));
            }
        }

        #[test]
        fn scores_stay_on_the_rubric_scale(reference in 1u32..5, submitted in 0u32..5, factor in 1u32..4) {
            for flavor in Flavor::iter() {
                let (score, _) = scored(
                    flavor,
                    &format!("n^{reference} log(n)"),
                    &format!("{factor} n^{submitted} + n"),
                );
                prop_assert!([0.0, 0.25, 0.5, 1.0].contains(&score), "{} scored {}", flavor, score);
            }
        }
    }
}

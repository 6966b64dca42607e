//! Asymptotic grading pipeline and rubric table.

use std::cmp::Ordering;

use qel_core::{Deadline, QelError};
use qel_expr::Expr;
use qel_symbolic::{
    compare, eventual_sign, is_zero, limit_at_infinity, Equivalence, EquivalenceOptions, Limit,
};
use tracing::debug;

use crate::feedback::{
    CONSTANT_FACTORS, CORRECT_ANSWER, CORRECT_COMPLEX, DID_NOT_CONVERGE, INCORRECT, LOWER_ORDER,
    NEGATIVE, TOO_LOOSE,
};
use crate::flavor::Flavor;

const UNIT_RATIO_TOLERANCE: f64 = 1e-9;

/// Score and feedback for one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct AsymptoticGrade {
    /// One of 0, 0.25, 0.5 or 1.
    pub score: f64,
    /// Learner feedback, one of the constants in [`crate::feedback`].
    pub feedback: &'static str,
}

impl AsymptoticGrade {
    fn new(score: f64, feedback: &'static str) -> Self {
        Self { score, feedback }
    }
}

/// Classified value of `lim reference/submitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ratio {
    /// The ratio is unbounded.
    Infinite,
    /// The ratio tends to zero.
    Zero,
    /// The ratio tends to one.
    One,
    /// Any other positive constant.
    Constant,
}

impl From<Limit> for Ratio {
    fn from(limit: Limit) -> Self {
        match limit {
            Limit::PosInfinity | Limit::NegInfinity => Ratio::Infinite,
            Limit::Zero => Ratio::Zero,
            Limit::Finite(value) if (value - 1.0).abs() <= UNIT_RATIO_TOLERANCE => Ratio::One,
            Limit::Finite(_) => Ratio::Constant,
        }
    }
}

/// Score and feedback the rubric assigns to `ratio` under `flavor`.
pub fn rubric(flavor: Flavor, ratio: Ratio) -> AsymptoticGrade {
    use Flavor::*;
    use Ratio::*;
    match (flavor, ratio) {
        (BigO | LittleO, Infinite) => AsymptoticGrade::new(0.0, INCORRECT),
        (BigO | LittleO, Zero) => AsymptoticGrade::new(0.25, TOO_LOOSE),
        (Omega | LittleOmega, Infinite) => AsymptoticGrade::new(0.25, TOO_LOOSE),
        (Omega | LittleOmega, Zero) => AsymptoticGrade::new(0.0, INCORRECT),
        (Theta, Infinite | Zero) => AsymptoticGrade::new(0.0, INCORRECT),
        (BigO | Omega, One) => AsymptoticGrade::new(0.5, LOWER_ORDER),
        (LittleO | LittleOmega, One) => AsymptoticGrade::new(0.0, INCORRECT),
        (Theta, One) => AsymptoticGrade::new(0.25, LOWER_ORDER),
        (Theta, Constant) => AsymptoticGrade::new(0.25, CONSTANT_FACTORS),
        (_, Constant) => AsymptoticGrade::new(0.5, CONSTANT_FACTORS),
    }
}

/// Grades `submitted` against `reference` as a bound of `flavor` in `variable`.
///
/// Learner-facing outcomes, including a limit that does not converge, come
/// back as `Ok` grades or as [`QelError::Format`]; only authoring and
/// overflow faults use other families.
#[tracing::instrument(level = "debug", skip(reference, submitted, deadline, options))]
pub fn grade(
    reference: &Expr,
    submitted: &Expr,
    variable: &str,
    flavor: Flavor,
    deadline: &Deadline,
    options: &EquivalenceOptions,
) -> Result<AsymptoticGrade, QelError> {
    if reference.to_string() == submitted.to_string() {
        return Ok(AsymptoticGrade::new(1.0, CORRECT_ANSWER));
    }
    match compare(reference, submitted, deadline, options).map_err(did_not_converge)? {
        Equivalence::Structural => return Ok(AsymptoticGrade::new(1.0, CORRECT_ANSWER)),
        Equivalence::DifferenceZero | Equivalence::Numeric => {
            return Ok(AsymptoticGrade::new(1.0, CORRECT_COMPLEX))
        }
        Equivalence::NotEquivalent => {}
    }
    if is_zero(submitted, deadline, options).map_err(did_not_converge)? {
        return Ok(AsymptoticGrade::new(0.0, INCORRECT));
    }
    let sign = eventual_sign(submitted, variable, deadline).map_err(did_not_converge)?;
    if sign == Ordering::Less {
        return Ok(AsymptoticGrade::new(0.0, NEGATIVE));
    }
    let ratio = Expr::Div(Box::new(reference.clone()), Box::new(submitted.clone()));
    let limit = limit_at_infinity(&ratio, variable, deadline).map_err(did_not_converge)?;
    debug!(?limit, %flavor, "ratio limit");
    Ok(rubric(flavor, Ratio::from(limit)))
}

fn did_not_converge(err: QelError) -> QelError {
    match err {
        QelError::Timeout(info) => {
            debug!(code = %info.code, "limit engine gave up");
            QelError::format("did-not-converge", DID_NOT_CONVERGE)
        }
        other => other,
    }
}

//! Three-stage equivalence check between a reference and a submission.

use std::f64::consts::PI;

use num_complex::Complex64;
use qel_core::{Deadline, Limits, QelError, RngHandle};
use qel_expr::Expr;
use tracing::{debug, warn};

use crate::canonical::{Canonicalizer, Fraction};
use crate::error::SymbolicError;
use crate::eval::{evaluate, needs_real_samples, Env};

/// Seed of the numeric sampling stream; fixed so grades are reproducible.
pub const SAMPLE_SEED: u64 = 0x5eed_0f_e9a1;

/// Stage at which two expressions were found equal, or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Equivalence {
    /// Canonical forms are identical.
    Structural,
    /// The canonical difference is zero.
    DifferenceZero,
    /// Every usable numeric sample agreed.
    Numeric,
    /// A sample disagreed, or too few samples were usable.
    NotEquivalent,
}

impl Equivalence {
    /// Whether the stage found the expressions equal.
    pub fn is_equivalent(self) -> bool {
        !matches!(self, Equivalence::NotEquivalent)
    }
}

/// Tuning for [`compare`].
#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceOptions {
    /// Numeric samples drawn per comparison.
    pub sample_points: usize,
    /// Term budget of the canonicalizer.
    pub max_terms: usize,
    /// Seed of the sampling stream.
    pub seed: u64,
    /// Relative agreement tolerance.
    pub relative_tolerance: f64,
    /// Absolute floor under which values count as equal.
    pub absolute_tolerance: f64,
}

impl Default for EquivalenceOptions {
    fn default() -> Self {
        Self {
            sample_points: 8,
            max_terms: 4_096,
            seed: SAMPLE_SEED,
            relative_tolerance: 1e-8,
            absolute_tolerance: 1e-12,
        }
    }
}

impl From<&Limits> for EquivalenceOptions {
    fn from(limits: &Limits) -> Self {
        Self {
            sample_points: limits.sample_points,
            max_terms: limits.max_terms,
            ..Self::default()
        }
    }
}

/// Compares `reference` against `submitted`.
///
/// Division by zero in the reference is an authoring error; in the
/// submission it is a learner format error.
#[tracing::instrument(level = "debug", skip_all)]
pub fn compare(
    reference: &Expr,
    submitted: &Expr,
    deadline: &Deadline,
    options: &EquivalenceOptions,
) -> Result<Equivalence, QelError> {
    let canon = Canonicalizer::new(options.max_terms, deadline);
    let reference_form = canon.canonical(reference).map_err(|err| match err {
        SymbolicError::DivisionByZero => QelError::authoring(
            "division-by-zero",
            "the reference answer divides by zero",
        )
        .with_context("reference", reference),
        other => exceeded(other),
    })?;
    let submitted_form = canon.canonical(submitted).map_err(exceeded)?;
    if reference_form == submitted_form {
        return Ok(Equivalence::Structural);
    }
    if difference_is_zero(&canon, &reference_form, &submitted_form).map_err(exceeded)? {
        return Ok(Equivalence::DifferenceZero);
    }
    numeric(reference, submitted, deadline, options)
}

/// Whether `reference` and `submitted` are equivalent at any stage.
pub fn equivalent(
    reference: &Expr,
    submitted: &Expr,
    deadline: &Deadline,
    options: &EquivalenceOptions,
) -> Result<bool, QelError> {
    compare(reference, submitted, deadline, options).map(Equivalence::is_equivalent)
}

/// Whether `expr` is identically zero.
pub fn is_zero(expr: &Expr, deadline: &Deadline, options: &EquivalenceOptions) -> Result<bool, QelError> {
    equivalent(&Expr::Integer(0), expr, deadline, options)
}

fn difference_is_zero(canon: &Canonicalizer<'_>, a: &Fraction, b: &Fraction) -> Result<bool, SymbolicError> {
    canon.sub(a, b).map(|diff| diff.is_zero())
}

fn exceeded(err: SymbolicError) -> QelError {
    if matches!(
        err,
        SymbolicError::Overflow(_) | SymbolicError::TooManyTerms { .. }
    ) {
        warn!(error = %err, "exact stage exceeded its budget");
    }
    err.into()
}

fn agrees(a: Complex64, b: Complex64, options: &EquivalenceOptions) -> bool {
    let scale = a.norm().max(b.norm());
    (a - b).norm() <= (options.relative_tolerance * scale).max(options.absolute_tolerance)
}

fn numeric(
    reference: &Expr,
    submitted: &Expr,
    deadline: &Deadline,
    options: &EquivalenceOptions,
) -> Result<Equivalence, QelError> {
    let mut symbols = reference.symbols();
    symbols.extend(submitted.symbols());
    symbols.sort();
    symbols.dedup();
    let real_only = needs_real_samples(reference) || needs_real_samples(submitted);
    let required = if symbols.is_empty() {
        1
    } else {
        options.sample_points.min(3)
    };
    let mut rng = RngHandle::from_seed(options.seed);
    let mut usable = 0usize;
    for _ in 0..options.sample_points.max(1) {
        deadline.check("numeric-equivalence")?;
        let env: Env = symbols
            .iter()
            .map(|name| {
                let radius = rng.uniform(0.5, 2.0);
                // Whole annulus, or both real half-lines.
                let value = if real_only {
                    let sign = if rng.coin() { 1.0 } else { -1.0 };
                    Complex64::new(sign * radius, 0.0)
                } else {
                    Complex64::from_polar(radius, rng.uniform(-PI, PI))
                };
                (name.clone(), value)
            })
            .collect();
        let (Ok(a), Ok(b)) = (evaluate(reference, &env), evaluate(submitted, &env)) else {
            continue;
        };
        if !(a.is_finite() && b.is_finite()) {
            continue;
        }
        usable += 1;
        if !agrees(a, b, options) {
            debug!(usable, "numeric sample disagrees");
            return Ok(Equivalence::NotEquivalent);
        }
    }
    if usable < required {
        debug!(usable, required, "too few usable samples");
        return Ok(Equivalence::NotEquivalent);
    }
    Ok(Equivalence::Numeric)
}

//! Tolerance comparisons shared by numeric, matrix and unit answers.

use num_complex::Complex64;
use qel_core::{Attributes, QelError};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::array::NumericArray;

/// Default relative tolerance.
pub const DEFAULT_RTOL: f64 = 1e-2;
/// Default absolute tolerance.
pub const DEFAULT_ATOL: f64 = 1e-8;
/// Default digit count for `sigfig` and `decdig`.
pub const DEFAULT_DIGITS: i64 = 2;

/// `|a - b| <= atol + rtol * |b|`, by modulus for complex values.
pub fn is_close_relabs(a: Complex64, b: Complex64, rtol: f64, atol: f64) -> bool {
    if !(b.is_finite() && a.is_finite()) {
        return a == b;
    }
    (a - b).norm() <= atol + rtol * b.norm()
}

fn within(a: f64, b: f64, eps: f64) -> bool {
    if b.is_infinite() {
        return a == b;
    }
    if b.is_nan() {
        return a.is_nan();
    }
    a > b - eps && a < b + eps
}

fn sigfig_real(a: f64, b: f64, digits: i64) -> bool {
    let n = if b == 0.0 || !b.is_finite() {
        digits - 1
    } else {
        -(b.abs().log10().floor() as i64) + digits - 1
    };
    within(a, b, 0.51 * 10f64.powi(-n as i32))
}

/// Matches `b` to `digits` significant figures, real and imaginary parts
/// separately.
pub fn is_close_sigfig(a: Complex64, b: Complex64, digits: i64) -> bool {
    sigfig_real(a.re, b.re, digits) && sigfig_real(a.im, b.im, digits)
}

/// Matches `b` to `digits` digits after the decimal point.
pub fn is_close_decdig(a: Complex64, b: Complex64, digits: i64) -> bool {
    let eps = 0.51 * 10f64.powi(-digits as i32);
    within(a.re, b.re, eps) && within(a.im, b.im, eps)
}

/// Name of a comparison as authored in the `comparison` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ComparisonKind {
    /// Bitwise equality.
    Exact,
    /// Relative plus absolute tolerance.
    Relabs,
    /// Significant figures.
    Sigfig,
    /// Decimal digits.
    Decdig,
}

/// How a submitted value is matched against the reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Comparison {
    /// Values must be equal.
    Exact,
    /// `|a - b| <= atol + rtol * |b|`.
    Relabs {
        /// Relative tolerance.
        rtol: f64,
        /// Absolute tolerance.
        atol: f64,
    },
    /// Significant figures.
    Sigfig {
        /// Significant digits, at least one.
        digits: i64,
    },
    /// Digits after the decimal point.
    Decdig {
        /// Decimal digits, at least one.
        digits: i64,
    },
}

impl Default for Comparison {
    fn default() -> Self {
        Comparison::Relabs {
            rtol: DEFAULT_RTOL,
            atol: DEFAULT_ATOL,
        }
    }
}

impl Comparison {
    /// Reads `comparison`, `rtol`, `atol` and `digits` from element attributes.
    pub fn from_attributes(attrs: &Attributes) -> Result<Self, QelError> {
        let kind = attrs.enumerated("comparison", ComparisonKind::Relabs)?;
        let comparison = match kind {
            ComparisonKind::Exact => Comparison::Exact,
            ComparisonKind::Relabs => Comparison::Relabs {
                rtol: attrs.float("rtol", DEFAULT_RTOL)?,
                atol: attrs.float("atol", DEFAULT_ATOL)?,
            },
            ComparisonKind::Sigfig => Comparison::Sigfig {
                digits: attrs.integer("digits", DEFAULT_DIGITS)?,
            },
            ComparisonKind::Decdig => Comparison::Decdig {
                digits: attrs.integer("digits", DEFAULT_DIGITS)?,
            },
        };
        comparison.validate()?;
        Ok(comparison)
    }

    /// Rejects negative tolerances and digit counts below one.
    pub fn validate(&self) -> Result<(), QelError> {
        match *self {
            Comparison::Relabs { rtol, atol } if rtol < 0.0 || atol < 0.0 => Err(
                QelError::authoring("negative-tolerance", "rtol and atol must be non-negative")
                    .with_context("rtol", rtol)
                    .with_context("atol", atol),
            ),
            Comparison::Sigfig { digits } | Comparison::Decdig { digits } if digits < 1 => {
                Err(
                    QelError::authoring("invalid-digits", "digits must be at least 1")
                        .with_context("digits", digits),
                )
            }
            _ => Ok(()),
        }
    }

    /// Whether `submitted` matches `reference`.
    pub fn is_close(&self, submitted: Complex64, reference: Complex64) -> bool {
        match *self {
            Comparison::Exact => submitted == reference,
            Comparison::Relabs { rtol, atol } => is_close_relabs(submitted, reference, rtol, atol),
            Comparison::Sigfig { digits } => is_close_sigfig(submitted, reference, digits),
            Comparison::Decdig { digits } => is_close_decdig(submitted, reference, digits),
        }
    }

    /// Element-wise match of arrays of identical shape.
    pub fn arrays_close(&self, submitted: &NumericArray, reference: &NumericArray) -> bool {
        submitted.shape() == reference.shape()
            && submitted
                .iter()
                .zip(reference.iter())
                .all(|(a, b)| self.is_close(a, b))
    }

    /// Digits to print the reference with, when the comparison implies some.
    pub fn display_digits(&self) -> Option<usize> {
        match *self {
            Comparison::Sigfig { digits } => usize::try_from(digits).ok(),
            _ => None,
        }
    }
}

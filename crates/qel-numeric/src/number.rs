//! Real and complex scalars typed by learners.

use std::fmt::{self, Display};

use num_complex::Complex64;
use qel_core::QelError;
use serde_json::{json, Value};
use thiserror::Error;

/// Parsed scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Real value.
    Real(f64),
    /// Complex value.
    Complex(Complex64),
}

impl Number {
    /// Value as a complex number.
    pub fn to_complex(self) -> Complex64 {
        match self {
            Number::Real(value) => Complex64::new(value, 0.0),
            Number::Complex(value) => value,
        }
    }

    /// Whether every component is finite.
    pub fn is_finite(self) -> bool {
        match self {
            Number::Real(value) => value.is_finite(),
            Number::Complex(value) => value.is_finite(),
        }
    }

    /// JSON form stored in submitted answers.
    pub fn to_json(self) -> Value {
        match self {
            Number::Real(value) => json!(value),
            Number::Complex(value) => json!({
                "_type": "complex",
                "_value": { "real": value.re, "imag": value.im },
            }),
        }
    }

    /// Inverse of [`Number::to_json`].
    pub fn from_json(value: &Value) -> Option<Self> {
        if let Some(real) = value.as_f64() {
            return Some(Number::Real(real));
        }
        if value.get("_type")?.as_str()? != "complex" {
            return None;
        }
        let inner = value.get("_value")?;
        Some(Number::Complex(Complex64::new(
            inner.get("real")?.as_f64()?,
            inner.get("imag")?.as_f64()?,
        )))
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_number(*self, None))
    }
}

/// Why a scalar submission was rejected. Messages are shown to learners.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    /// Nothing was submitted.
    #[error("No submitted answer.")]
    Missing,
    /// The submission was blank.
    #[error("The submitted answer was blank.")]
    Blank,
    /// A fraction was typed into an input that forbids them.
    #[error("Fractional answers are not allowed in this input.")]
    FractionsNotAllowed,
    /// The denominator is zero.
    #[error("Your expression resulted in a division by zero.")]
    DivisionByZero,
    /// The numerator is not a number.
    #[error("Invalid format: The numerator could not be interpreted as a decimal{} number.", or_complex(*.complex))]
    InvalidNumerator {
        /// Whether complex input was allowed.
        complex: bool,
    },
    /// The denominator is not a number.
    #[error("Invalid format: The denominator could not be interpreted as a decimal{} number.", or_complex(*.complex))]
    InvalidDenominator {
        /// Whether complex input was allowed.
        complex: bool,
    },
    /// The value overflowed or is NaN.
    #[error("Invalid format: The submitted answer is not a finite number.")]
    NotFinite,
    /// The text is not a number at all.
    #[error("Invalid format: The submitted answer could not be interpreted as a decimal{} number.", or_complex(*.complex))]
    Invalid {
        /// Whether complex input was allowed.
        complex: bool,
    },
}

fn or_complex(complex: bool) -> &'static str {
    if complex {
        " (or complex)"
    } else {
        ""
    }
}

impl From<NumberError> for QelError {
    fn from(err: NumberError) -> Self {
        QelError::format("invalid-number", err.to_string())
    }
}

/// Parses a float as typed, allowing surrounding whitespace.
pub(crate) fn parse_real(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok()
}

/// Parses `a+bj`, `bj`, `a-j` and parenthesized forms.
pub(crate) fn parse_complex(text: &str) -> Option<Complex64> {
    let mut text = text.trim();
    if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        text = inner.trim();
    }
    let Some(body) = text.strip_suffix(['j', 'J']) else {
        return parse_real(text).map(|re| Complex64::new(re, 0.0));
    };
    let bytes = body.as_bytes();
    let split = (1..bytes.len())
        .rev()
        .find(|&i| matches!(bytes[i], b'+' | b'-') && !matches!(bytes[i - 1], b'e' | b'E'));
    let (re, im) = match split {
        Some(idx) => (&body[..idx], &body[idx..]),
        None => ("", body),
    };
    if im.contains(char::is_whitespace) || re.ends_with(char::is_whitespace) {
        return None;
    }
    let im = match im {
        "" | "+" => 1.0,
        "-" => -1.0,
        digits => parse_real(digits)?,
    };
    let re = if re.is_empty() { 0.0 } else { parse_real(re)? };
    Some(Complex64::new(re, im))
}

/// Removes spaces around `+` and `-`.
pub(crate) fn squeeze_signs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending = String::new();
    let mut after_sign = false;
    for ch in text.chars() {
        match ch {
            ' ' => {
                if !after_sign {
                    pending.push(ch);
                }
            }
            '+' | '-' => {
                pending.clear();
                out.push(ch);
                after_sign = true;
            }
            _ => {
                out.push_str(&pending);
                pending.clear();
                out.push(ch);
                after_sign = false;
            }
        }
    }
    out.push_str(&pending);
    out
}

/// Parses a real, or a complex value when `allow_complex` is set.
///
/// U+2212 is read as a minus sign. With complex input, `i` is an alias of
/// `j` and spaces around signs are ignored.
pub fn string_to_number(text: &str, allow_complex: bool) -> Option<Number> {
    let mut text = text.replace('\u{2212}', "-");
    if allow_complex {
        text = squeeze_signs(&text.replace('i', "j"));
    }
    if let Some(value) = parse_real(&text) {
        return Some(Number::Real(value));
    }
    if !allow_complex {
        return None;
    }
    parse_complex(&text).map(Number::Complex)
}

/// Parses a scalar that may be written as a single fraction `a/b`.
pub fn string_fraction_to_number(
    text: Option<&str>,
    allow_fractions: bool,
    allow_complex: bool,
) -> Result<Number, NumberError> {
    let text = text.ok_or(NumberError::Missing)?;
    if text.trim().is_empty() {
        return Err(NumberError::Blank);
    }
    let text = text.replace(['\u{2215}', '\u{00f7}'], "/");
    if text.matches('/').count() == 1 {
        if !allow_fractions {
            return Err(NumberError::FractionsNotAllowed);
        }
        let (numerator, denominator) = text.split_once('/').ok_or(NumberError::Invalid {
            complex: allow_complex,
        })?;
        let numerator = string_to_number(numerator, allow_complex)
            .filter(|n| n.is_finite())
            .ok_or(NumberError::InvalidNumerator {
                complex: allow_complex,
            })?;
        let denominator = string_to_number(denominator, allow_complex)
            .filter(|n| n.is_finite())
            .ok_or(NumberError::InvalidDenominator {
                complex: allow_complex,
            })?;
        let value = match (numerator, denominator) {
            (_, d) if d.to_complex().norm() == 0.0 => return Err(NumberError::DivisionByZero),
            (Number::Real(n), Number::Real(d)) => Number::Real(n / d),
            (n, d) => Number::Complex(n.to_complex() / d.to_complex()),
        };
        if !value.is_finite() {
            return Err(NumberError::NotFinite);
        }
        return Ok(value);
    }
    let value = string_to_number(&text, allow_complex).ok_or(NumberError::Invalid {
        complex: allow_complex,
    })?;
    if !value.is_finite() {
        return Err(NumberError::NotFinite);
    }
    Ok(value)
}

/// Formats a float with `digits` significant figures, or shortest round-trip
/// when `digits` is `None`.
pub(crate) fn format_real(value: f64, digits: Option<usize>) -> String {
    match digits {
        None if value != 0.0 && (value.abs() >= 1e16 || value.abs() < 1e-5) => {
            format!("{value:e}")
        }
        None => format!("{value}"),
        Some(_) if value == 0.0 || !value.is_finite() => format!("{value}"),
        Some(digits) => {
            let digits = digits.max(1) as i32;
            let exponent = value.abs().log10().floor() as i32;
            let decimals = (digits - 1 - exponent).max(0) as usize;
            let scale = 10f64.powi(digits - 1 - exponent);
            let rounded = (value * scale).round() / scale;
            format!("{rounded:.decimals$}")
        }
    }
}

/// Formats a scalar; complex values print as `a+bj`.
pub fn format_number(value: Number, digits: Option<usize>) -> String {
    match value {
        Number::Real(re) => format_real(re, digits),
        Number::Complex(z) => {
            let sign = if z.im.is_sign_negative() { '-' } else { '+' };
            format!(
                "{}{sign}{}j",
                format_real(z.re, digits),
                format_real(z.im.abs(), digits)
            )
        }
    }
}

//! Integers written in bases 2 through 36.

use qel_core::QelError;
use thiserror::Error;

/// Why an integer could not be read or written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegerError {
    /// The base is neither 0 nor in `2..=36`.
    #[error("Base {base} is not supported; use 0 or a base from 2 to 36.")]
    InvalidBase {
        /// Requested base.
        base: u32,
    },
    /// No digits were found.
    #[error("Invalid format: The submitted answer contains no digits.")]
    Empty,
    /// A character is not a digit of the base, or sits where no digit may.
    #[error("Invalid format: \"{ch}\" at position {offset} is not valid in a base {base} integer.")]
    InvalidDigit {
        /// Zero-based character offset in the trimmed text.
        offset: usize,
        /// Offending character.
        ch: char,
        /// Effective base.
        base: u32,
    },
    /// The value does not fit in 128 bits.
    #[error("The submitted integer is too large.")]
    Overflow,
}

impl From<IntegerError> for QelError {
    fn from(err: IntegerError) -> Self {
        match err {
            IntegerError::InvalidBase { base } => {
                QelError::authoring("invalid-base", err.to_string()).with_context("base", base)
            }
            other => QelError::format("invalid-integer", other.to_string()),
        }
    }
}

fn check_base(base: u32) -> Result<(), IntegerError> {
    if base == 0 || (2..=36).contains(&base) {
        Ok(())
    } else {
        Err(IntegerError::InvalidBase { base })
    }
}

/// Folds full-width forms to ASCII and U+2212 to `-`.
fn normalize(ch: char) -> char {
    match ch {
        '\u{2212}' | '\u{ff0d}' => '-',
        '\u{ff0b}' => '+',
        '\u{ff3f}' => '_',
        '\u{ff10}'..='\u{ff19}' | '\u{ff21}'..='\u{ff3a}' | '\u{ff41}'..='\u{ff5a}' => {
            char::from_u32(ch as u32 - 0xfee0).unwrap_or(ch)
        }
        other => other,
    }
}

fn prefix_radix(marker: char) -> Option<u32> {
    match marker.to_ascii_lowercase() {
        'x' => Some(16),
        'o' => Some(8),
        'b' => Some(2),
        _ => None,
    }
}

/// Parses `text` as an integer in `base`.
///
/// Base 0 reads `0x`, `0o` and `0b` prefixes and otherwise decimal without
/// leading zeros. Bases 16, 8 and 2 also accept their own prefix. Single
/// underscores may separate digits.
pub fn parse_integer(text: &str, base: u32) -> Result<i128, IntegerError> {
    check_base(base)?;
    let chars: Vec<char> = text.trim().chars().map(normalize).collect();
    let mut pos = 0;
    let negative = match chars.first() {
        Some('-') => {
            pos += 1;
            true
        }
        Some('+') => {
            pos += 1;
            false
        }
        _ => false,
    };
    let mut radix = if base == 0 { 10 } else { base };
    let mut after_prefix = false;
    if chars.get(pos) == Some(&'0') {
        if let Some(prefixed) = chars.get(pos + 1).copied().and_then(prefix_radix) {
            if base == 0 || base == prefixed {
                radix = prefixed;
                pos += 2;
                after_prefix = true;
            }
        }
    }
    let digits_start = pos;
    let mut value: i128 = 0;
    let mut seen_digit = false;
    let mut previous_underscore = false;
    let mut first_nonzero = None;
    while let Some(&ch) = chars.get(pos) {
        let invalid = IntegerError::InvalidDigit {
            offset: pos,
            ch,
            base: radix,
        };
        if ch == '_' {
            if previous_underscore || (!seen_digit && !after_prefix) {
                return Err(invalid);
            }
            previous_underscore = true;
            pos += 1;
            continue;
        }
        let digit = ch.to_digit(radix).ok_or(invalid)?;
        if digit != 0 && first_nonzero.is_none() {
            first_nonzero = Some(pos);
        }
        value = value
            .checked_mul(i128::from(radix))
            .and_then(|v| {
                if negative {
                    v.checked_sub(i128::from(digit))
                } else {
                    v.checked_add(i128::from(digit))
                }
            })
            .ok_or(IntegerError::Overflow)?;
        seen_digit = true;
        previous_underscore = false;
        pos += 1;
    }
    if !seen_digit {
        return Err(IntegerError::Empty);
    }
    if previous_underscore {
        return Err(IntegerError::InvalidDigit {
            offset: pos - 1,
            ch: '_',
            base: radix,
        });
    }
    // Base 0 follows integer literal rules: `0`, `00` and `0_0` but not `012`.
    if base == 0 && !after_prefix && chars.get(digits_start) == Some(&'0') && first_nonzero.is_some() {
        return Err(IntegerError::InvalidDigit {
            offset: digits_start,
            ch: '0',
            base: radix,
        });
    }
    Ok(value)
}

/// Writes `value` in `base` with lowercase digits; base 0 means decimal.
pub fn format_integer(value: i128, base: u32) -> Result<String, IntegerError> {
    check_base(base)?;
    let radix = if base == 0 { 10 } else { base };
    let mut magnitude = value.unsigned_abs();
    let mut digits = Vec::new();
    loop {
        let digit = (magnitude % u128::from(radix)) as u32;
        digits.push(char::from_digit(digit, radix).ok_or(IntegerError::InvalidBase { base })?);
        magnitude /= u128::from(radix);
        if magnitude == 0 {
            break;
        }
    }
    if value < 0 {
        digits.push('-');
    }
    Ok(digits.into_iter().rev().collect())
}

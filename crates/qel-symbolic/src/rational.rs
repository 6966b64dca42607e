//! Exact rationals over checked `i128` arithmetic.

use std::fmt::{self, Display};

use crate::error::SymbolicError;

/// Reduced fraction with a positive denominator.
///
/// Ordering is structural (numerator, then denominator) so rationals can key
/// ordered maps; use [`Rational::cmp_value`] for numeric comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rational {
    num: i128,
    den: i128,
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

fn overflow() -> SymbolicError {
    SymbolicError::Overflow("rational")
}

impl Rational {
    /// Zero.
    pub const ZERO: Rational = Rational { num: 0, den: 1 };
    /// One.
    pub const ONE: Rational = Rational { num: 1, den: 1 };

    /// Builds `num / den` in lowest terms.
    pub fn new(num: i128, den: i128) -> Result<Self, SymbolicError> {
        if den == 0 {
            return Err(SymbolicError::DivisionByZero);
        }
        if num == 0 {
            return Ok(Self::ZERO);
        }
        let g = gcd(num, den);
        let (mut num, mut den) = (num / g, den / g);
        if den < 0 {
            num = num.checked_neg().ok_or_else(overflow)?;
            den = den.checked_neg().ok_or_else(overflow)?;
        }
        Ok(Self { num, den })
    }

    /// Integer value.
    pub fn integer(value: i128) -> Self {
        Self { num: value, den: 1 }
    }

    /// Closest fraction to `value` with a denominator of at most `10^9`.
    pub fn approximate(value: f64) -> Result<Self, SymbolicError> {
        if !value.is_finite() || value.abs() > 1e30 {
            return Err(overflow());
        }
        const MAX_DEN: i128 = 1_000_000_000;
        let negative = value < 0.0;
        let mut x = value.abs();
        let (mut p0, mut q0, mut p1, mut q1) = (0i128, 1i128, 1i128, 0i128);
        for _ in 0..64 {
            let a = x.floor();
            let ai = a as i128;
            let p2 = ai.checked_mul(p1).and_then(|v| v.checked_add(p0));
            let q2 = ai.checked_mul(q1).and_then(|v| v.checked_add(q0));
            let (Some(p2), Some(q2)) = (p2, q2) else {
                break;
            };
            if q2 > MAX_DEN {
                break;
            }
            p0 = p1;
            q0 = q1;
            p1 = p2;
            q1 = q2;
            let frac = x - a;
            if frac < 1e-15 || ((p1 as f64) / (q1 as f64) - value.abs()).abs() <= 1e-15 * value.abs() {
                break;
            }
            x = 1.0 / frac;
        }
        if q1 == 0 {
            return Err(overflow());
        }
        Self::new(if negative { -p1 } else { p1 }, q1)
    }

    /// Numerator.
    pub fn numer(&self) -> i128 {
        self.num
    }

    /// Denominator, always positive.
    pub fn denom(&self) -> i128 {
        self.den
    }

    /// Whether the value is zero.
    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    /// Whether the value is one.
    pub fn is_one(&self) -> bool {
        self.num == 1 && self.den == 1
    }

    /// Whether the value is an integer.
    pub fn is_integer(&self) -> bool {
        self.den == 1
    }

    /// Whether the value is negative.
    pub fn is_negative(&self) -> bool {
        self.num < 0
    }

    /// Checked sum.
    pub fn add(self, other: Self) -> Result<Self, SymbolicError> {
        let g = gcd(self.den, other.den);
        let lhs = self
            .num
            .checked_mul(other.den / g)
            .ok_or_else(overflow)?;
        let rhs = other
            .num
            .checked_mul(self.den / g)
            .ok_or_else(overflow)?;
        let num = lhs.checked_add(rhs).ok_or_else(overflow)?;
        let den = (self.den / g).checked_mul(other.den).ok_or_else(overflow)?;
        Self::new(num, den)
    }

    /// Checked difference.
    pub fn sub(self, other: Self) -> Result<Self, SymbolicError> {
        self.add(other.neg()?)
    }

    /// Checked negation.
    pub fn neg(self) -> Result<Self, SymbolicError> {
        Ok(Self {
            num: self.num.checked_neg().ok_or_else(overflow)?,
            den: self.den,
        })
    }

    /// Checked product.
    pub fn mul(self, other: Self) -> Result<Self, SymbolicError> {
        let g1 = gcd(self.num, other.den).max(1);
        let g2 = gcd(other.num, self.den).max(1);
        let num = (self.num / g1)
            .checked_mul(other.num / g2)
            .ok_or_else(overflow)?;
        let den = (self.den / g2)
            .checked_mul(other.den / g1)
            .ok_or_else(overflow)?;
        Self::new(num, den)
    }

    /// Reciprocal, failing on zero.
    pub fn recip(self) -> Result<Self, SymbolicError> {
        Self::new(self.den, self.num)
    }

    /// Checked quotient.
    pub fn div(self, other: Self) -> Result<Self, SymbolicError> {
        self.mul(other.recip()?)
    }

    /// Integer power, negative exponents take the reciprocal.
    pub fn pow(self, exponent: i128) -> Result<Self, SymbolicError> {
        if exponent < 0 {
            return self.recip()?.pow(exponent.checked_neg().ok_or_else(overflow)?);
        }
        let mut base = self;
        let mut exp = exponent;
        let mut acc = Self::ONE;
        while exp > 0 {
            if exp & 1 == 1 {
                acc = acc.mul(base)?;
            }
            exp >>= 1;
            if exp > 0 {
                base = base.mul(base)?;
            }
        }
        Ok(acc)
    }

    /// Exact `q`-th root when one exists.
    pub fn root(self, q: i128) -> Option<Self> {
        if q <= 0 {
            return None;
        }
        if self.num < 0 && q % 2 == 0 {
            return None;
        }
        let num = integer_root(self.num.abs(), q)?;
        let den = integer_root(self.den, q)?;
        let num = if self.num < 0 { -num } else { num };
        Self::new(num, den).ok()
    }

    /// Numeric comparison.
    pub fn cmp_value(&self, other: &Self) -> std::cmp::Ordering {
        match (
            self.num.checked_mul(other.den),
            other.num.checked_mul(self.den),
        ) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self
                .to_f64()
                .partial_cmp(&other.to_f64())
                .unwrap_or(std::cmp::Ordering::Equal),
        }
    }

    /// Nearest float.
    pub fn to_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

/// Exact `q`-th root of a non-negative integer.
pub fn integer_root(value: i128, q: i128) -> Option<i128> {
    if value < 0 || q <= 0 {
        return None;
    }
    if value < 2 || q == 1 {
        return Some(value);
    }
    if q > 127 {
        return None;
    }
    let guess = (value as f64).powf(1.0 / q as f64).round() as i128;
    for candidate in guess.saturating_sub(1).max(0)..=guess + 1 {
        let mut acc: i128 = 1;
        let mut ok = true;
        for _ in 0..q {
            match acc.checked_mul(candidate) {
                Some(next) => acc = next,
                None => {
                    ok = false;
                    break;
                }
            }
        }
        if ok && acc == value {
            return Some(candidate);
        }
    }
    None
}

impl From<i128> for Rational {
    fn from(value: i128) -> Self {
        Rational::integer(value)
    }
}

impl Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

//! Exponents of the seven base dimensions.

use std::fmt::{self, Display};
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumIter, IntoEnumIterator};

/// Base dimensions in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum BaseDimension {
    /// Second.
    Time,
    /// Metre.
    Length,
    /// Gram.
    Mass,
    /// Ampere.
    Current,
    /// Kelvin.
    Temperature,
    /// Mole.
    Amount,
    /// Candela.
    Luminosity,
}

/// Integer exponent per [`BaseDimension`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimensions(pub [i32; 7]);

impl Dimensions {
    /// All exponents zero.
    pub const NONE: Dimensions = Dimensions([0; 7]);

    /// Exponent one on `base`, zero elsewhere.
    pub fn base(base: BaseDimension) -> Self {
        let mut exps = [0; 7];
        exps[base as usize] = 1;
        Dimensions(exps)
    }

    /// Exponent of `base`.
    pub fn exponent(&self, base: BaseDimension) -> i32 {
        self.0[base as usize]
    }

    /// Whether every exponent is zero.
    pub fn is_dimensionless(&self) -> bool {
        self.0.iter().all(|&e| e == 0)
    }

    fn zip(self, rhs: Self, f: impl Fn(i32, i32) -> i32) -> Self {
        let mut out = [0; 7];
        for (slot, (a, b)) in out.iter_mut().zip(self.0.into_iter().zip(rhs.0)) {
            *slot = f(a, b);
        }
        Dimensions(out)
    }
}

impl Add for Dimensions {
    type Output = Dimensions;

    fn add(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a + b)
    }
}

impl Sub for Dimensions {
    type Output = Dimensions;

    fn sub(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a - b)
    }
}

impl Neg for Dimensions {
    type Output = Dimensions;

    fn neg(self) -> Self {
        Dimensions::NONE - self
    }
}

impl Mul<i32> for Dimensions {
    type Output = Dimensions;

    fn mul(self, rhs: i32) -> Self {
        Dimensions(self.0.map(|e| e * rhs))
    }
}

impl Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "dimensionless");
        }
        let mut first = true;
        for base in BaseDimension::iter() {
            let exp = self.exponent(base);
            if exp == 0 {
                continue;
            }
            if !first {
                write!(f, " * ")?;
            }
            first = false;
            write!(f, "[{base}]")?;
            if exp != 1 {
                write!(f, "^{exp}")?;
            }
        }
        Ok(())
    }
}

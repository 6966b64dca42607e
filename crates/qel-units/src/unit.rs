//! Units as a multiplier over base units plus dimension exponents.

use std::ops::{Div, Mul};

use serde::{Deserialize, Serialize};

use crate::dimension::{BaseDimension, Dimensions};

const MULTIPLIER_TOLERANCE: f64 = 1e-12;

/// A unit expressed in base units: gram, metre, second, ampere, kelvin,
/// mole and candela.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    multiplier: f64,
    dimensions: Dimensions,
}

impl Unit {
    /// The unit of pure numbers.
    pub const DIMENSIONLESS: Unit = Unit {
        multiplier: 1.0,
        dimensions: Dimensions::NONE,
    };

    /// Builds a unit from its size in base units and its dimensions.
    pub fn new(multiplier: f64, dimensions: Dimensions) -> Self {
        Self {
            multiplier,
            dimensions,
        }
    }

    /// Base unit of `base`.
    pub fn base(base: BaseDimension) -> Self {
        Self::new(1.0, Dimensions::base(base))
    }

    /// Size in base units.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Dimension exponents.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Same unit with the multiplier scaled by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.multiplier * factor, self.dimensions)
    }

    /// Integer power.
    pub fn powi(self, exp: i32) -> Self {
        Self::new(self.multiplier.powi(exp), self.dimensions * exp)
    }

    /// Whether both units measure the same kind of thing.
    pub fn same_dimensions(&self, other: &Unit) -> bool {
        self.dimensions == other.dimensions
    }

    /// Same dimensions and, up to rounding, the same multiplier, so `N m`
    /// matches `J` but `km` does not match `m`.
    pub fn matches(&self, other: &Unit) -> bool {
        let scale = self.multiplier.abs().max(other.multiplier.abs());
        self.same_dimensions(other)
            && (self.multiplier - other.multiplier).abs() <= MULTIPLIER_TOLERANCE * scale
    }

    /// Whether the unit has no dimensions.
    pub fn is_dimensionless(&self) -> bool {
        self.dimensions.is_dimensionless()
    }
}

impl Mul for Unit {
    type Output = Unit;

    fn mul(self, rhs: Unit) -> Unit {
        Unit::new(self.multiplier * rhs.multiplier, self.dimensions + rhs.dimensions)
    }
}

impl Div for Unit {
    type Output = Unit;

    fn div(self, rhs: Unit) -> Unit {
        Unit::new(self.multiplier / rhs.multiplier, self.dimensions - rhs.dimensions)
    }
}

//! A magnitude attached to a unit.

use std::fmt::{self, Display};

use qel_numeric::{format_number, Number};
use serde::{Deserialize, Serialize};

use crate::unit::Unit;

/// Magnitude, unit and the unit text as written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    magnitude: f64,
    unit: Unit,
    symbol: String,
}

impl Quantity {
    /// Builds a quantity; `symbol` is kept for display.
    pub fn new(magnitude: f64, unit: Unit, symbol: impl Into<String>) -> Self {
        Self {
            magnitude,
            unit,
            symbol: symbol.into(),
        }
    }

    /// Magnitude in the written unit.
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Unit.
    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// Unit text as written, empty for a bare number.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Whether any unit text was given.
    pub fn has_unit(&self) -> bool {
        !self.symbol.is_empty()
    }

    /// Whether the unit carries no dimensions. `rad` is dimensionless.
    pub fn is_dimensionless(&self) -> bool {
        self.unit.is_dimensionless()
    }

    /// Magnitude converted to base units.
    pub fn to_base(&self) -> f64 {
        self.magnitude * self.unit.multiplier()
    }

    /// Same unit, magnitude multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.magnitude * factor, self.unit, self.symbol.clone())
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = format_number(Number::Real(self.magnitude), None);
        if self.symbol.is_empty() {
            write!(f, "{magnitude}")
        } else {
            write!(f, "{magnitude} {}", self.symbol)
        }
    }
}

//! Kinds of asymptotic bound.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Bound the learner is asked to give.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Flavor {
    /// Upper bound, `O`.
    #[strum(to_string = "big-o", serialize = "bigo")]
    BigO,
    /// Tight bound, `Θ`.
    #[strum(to_string = "theta", serialize = "big-theta")]
    Theta,
    /// Lower bound, `Ω`.
    #[strum(to_string = "omega", serialize = "big-omega")]
    Omega,
    /// Strict upper bound, `o`.
    LittleO,
    /// Strict lower bound, `ω`.
    LittleOmega,
}

impl Flavor {
    /// Notation shown around the answer box.
    pub fn symbol(self) -> &'static str {
        match self {
            Flavor::BigO => "O",
            Flavor::Theta => "Θ",
            Flavor::Omega => "Ω",
            Flavor::LittleO => "o",
            Flavor::LittleOmega => "ω",
        }
    }
}

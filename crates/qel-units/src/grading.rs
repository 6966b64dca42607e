//! The three unit grading modes.

use num_complex::Complex64;
use qel_core::{Attributes, QelError};
use qel_numeric::{is_close_relabs, Comparison, DEFAULT_ATOL, DEFAULT_RTOL};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use crate::error::UnitError;
use crate::parse::{parse_quantity, split_magnitude};
use crate::quantity::Quantity;
use crate::system::UnitSystem;

/// Feedback for a wrong answer.
pub const INCORRECT: &str = "Your answer is incorrect.";
/// Feedback when only the magnitude is wrong.
pub const CORRECT_UNITS_INCORRECT_MAGNITUDE: &str =
    "Your answer has correct units, but incorrect magnitude.";
/// Feedback when only the units are wrong.
pub const CORRECT_MAGNITUDE_INCORRECT_UNITS: &str =
    "Your answer has correct magnitude, but incorrect units.";

/// What part of a quantity is graded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GradingMode {
    /// Only the unit; no magnitude may be given.
    #[strum(to_string = "only-units", serialize = "units-only")]
    OnlyUnits,
    /// Magnitude and unit, each checked as written.
    #[strum(to_string = "exact-units", serialize = "units-fixed")]
    ExactUnits,
    /// Magnitudes compared after conversion to base units.
    #[default]
    #[strum(to_string = "with-units", serialize = "units-agnostic")]
    WithUnits,
}

/// Score and feedback for one quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitGrade {
    /// Score in `[0, 1]`.
    pub score: f64,
    /// Feedback, absent for a fully correct answer.
    pub feedback: Option<&'static str>,
}

impl UnitGrade {
    fn correct() -> Self {
        Self {
            score: 1.0,
            feedback: None,
        }
    }

    fn partial(score: f64, feedback: &'static str) -> Self {
        Self {
            score,
            feedback: Some(feedback),
        }
    }
}

/// Validated grading configuration for one `pl-units-input`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitGrader {
    mode: GradingMode,
    comparison: Comparison,
    magnitude_partial_credit: Option<f64>,
}

fn authoring(code: &str, message: impl Into<String>) -> QelError {
    QelError::authoring(code, message).with_context("element", "pl-units-input")
}

impl UnitGrader {
    /// Reads and validates `grading-mode`, `comparison`, `rtol`, `atol`,
    /// `digits` and `magnitude-partial-credit` against `reference`.
    pub fn from_attributes(
        attrs: &Attributes,
        reference: &Quantity,
        system: &UnitSystem,
    ) -> Result<Self, QelError> {
        let mode = attrs.enumerated("grading-mode", GradingMode::default())?;
        let magnitude_partial_credit = attrs.float_opt("magnitude-partial-credit")?;
        if let Some(credit) = magnitude_partial_credit {
            if !(0.0..=1.0).contains(&credit) {
                return Err(authoring(
                    "invalid-partial-credit",
                    format!("magnitude-partial-credit must be between 0 and 1, not {credit}."),
                ));
            }
        }
        if let Some(digits) = attrs.integer_opt("digits")? {
            if digits < 1 {
                return Err(authoring(
                    "invalid-digits",
                    format!("Number of digits specified must be at least 1, not {digits}."),
                ));
            }
        }
        if mode != GradingMode::OnlyUnits && !reference.has_unit() {
            return Err(authoring(
                "reference-without-unit",
                format!("Correct answer \"{reference}\" has no unit."),
            ));
        }
        let comparison = match mode {
            GradingMode::WithUnits => Self::base_tolerance(attrs, reference, system)?,
            GradingMode::OnlyUnits | GradingMode::ExactUnits => {
                if let Some(atol) = attrs.string_or("atol") {
                    let parsed = parse_quantity(atol, system).map_err(|err| {
                        authoring("invalid-atol", format!("atol \"{atol}\" is invalid: {err}"))
                    })?;
                    if parsed.has_unit() {
                        return Err(authoring(
                            "atol-has-units",
                            format!(
                                "atol parameter \"{atol}\" may only have units in with-units grading."
                            ),
                        ));
                    }
                }
                Comparison::from_attributes(attrs)?
            }
        };
        debug!(%mode, ?comparison, "unit grader ready");
        Ok(Self {
            mode,
            comparison,
            magnitude_partial_credit,
        })
    }

    /// Relative tolerance plus an absolute tolerance converted to base units.
    fn base_tolerance(
        attrs: &Attributes,
        reference: &Quantity,
        system: &UnitSystem,
    ) -> Result<Comparison, QelError> {
        if attrs.has("comparison") {
            return Err(authoring(
                "comparison-not-allowed",
                "Cannot set parameter \"comparison\" in with-units grading.",
            ));
        }
        let rtol = attrs.float("rtol", DEFAULT_RTOL)?;
        let atol_text = attrs
            .string_or("atol")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{DEFAULT_ATOL} {}", reference.symbol()));
        let atol = parse_quantity(&atol_text, system).map_err(|err| {
            authoring("invalid-atol", format!("atol \"{atol_text}\" is invalid: {err}"))
        })?;
        if !atol.has_unit() {
            return Err(authoring(
                "atol-needs-units",
                format!("atol parameter \"{atol_text}\" must have units in with-units grading."),
            ));
        }
        if !atol.unit().same_dimensions(reference.unit()) {
            return Err(authoring(
                "atol-dimension-mismatch",
                format!(
                    "Correct answer has dimensionality {}, which does not match atol dimensionality {}.",
                    reference.unit().dimensions(),
                    atol.unit().dimensions()
                ),
            ));
        }
        let comparison = Comparison::Relabs {
            rtol,
            atol: atol.to_base(),
        };
        comparison.validate()?;
        Ok(comparison)
    }

    /// Grader with explicit settings.
    pub fn new(
        mode: GradingMode,
        comparison: Comparison,
        magnitude_partial_credit: Option<f64>,
    ) -> Self {
        Self {
            mode,
            comparison,
            magnitude_partial_credit,
        }
    }

    /// Grading mode.
    pub fn mode(&self) -> GradingMode {
        self.mode
    }

    /// Magnitude comparison. In with-units mode `atol` is in base units.
    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    /// Credit for right units with a wrong magnitude.
    pub fn units_credit(&self) -> f64 {
        self.magnitude_partial_credit.map_or(0.0, |credit| 1.0 - credit)
    }

    /// Credit for a right magnitude with wrong units.
    pub fn magnitude_credit(&self) -> f64 {
        self.magnitude_partial_credit.unwrap_or(0.0)
    }

    /// Grades `submitted` against `reference`.
    pub fn grade(&self, reference: &Quantity, submitted: &Quantity) -> UnitGrade {
        match self.mode {
            GradingMode::OnlyUnits => {
                if submitted.unit().matches(reference.unit()) {
                    UnitGrade::correct()
                } else {
                    UnitGrade::partial(0.0, INCORRECT)
                }
            }
            GradingMode::ExactUnits => {
                let units_match = submitted.unit().matches(reference.unit());
                let magnitude_match = self.comparison.is_close(
                    Complex64::new(submitted.magnitude(), 0.0),
                    Complex64::new(reference.magnitude(), 0.0),
                );
                match (magnitude_match, units_match) {
                    (true, true) => UnitGrade::correct(),
                    (false, true) => {
                        UnitGrade::partial(self.units_credit(), CORRECT_UNITS_INCORRECT_MAGNITUDE)
                    }
                    (true, false) => UnitGrade::partial(
                        self.magnitude_credit(),
                        CORRECT_MAGNITUDE_INCORRECT_UNITS,
                    ),
                    (false, false) => UnitGrade::partial(0.0, INCORRECT),
                }
            }
            GradingMode::WithUnits => {
                if !submitted.unit().same_dimensions(reference.unit()) {
                    return UnitGrade::partial(0.0, INCORRECT);
                }
                let (rtol, atol) = match self.comparison {
                    Comparison::Relabs { rtol, atol } => (rtol, atol),
                    _ => (DEFAULT_RTOL, 0.0),
                };
                let close = is_close_relabs(
                    Complex64::new(submitted.to_base(), 0.0),
                    Complex64::new(reference.to_base(), 0.0),
                    rtol,
                    atol,
                );
                if close {
                    UnitGrade::correct()
                } else {
                    UnitGrade::partial(self.units_credit(), CORRECT_UNITS_INCORRECT_MAGNITUDE)
                }
            }
        }
    }
}

/// Parses a learner submission under `mode`, enforcing the presence or
/// absence of a magnitude and of a unit.
pub fn parse_submission(
    text: &str,
    mode: GradingMode,
    system: &UnitSystem,
) -> Result<Quantity, UnitError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(UnitError::Blank);
    }
    let quantity = parse_quantity(trimmed, system)?;
    if !quantity.has_unit() {
        return Err(UnitError::NoUnit);
    }
    let normalized = trimmed.replace('\u{2212}', "-");
    let has_magnitude = split_magnitude(&normalized, system).0.is_some();
    match (mode, has_magnitude) {
        (GradingMode::OnlyUnits, true) => Err(UnitError::UnexpectedMagnitude),
        (GradingMode::ExactUnits | GradingMode::WithUnits, false) => {
            Err(UnitError::MissingMagnitude)
        }
        _ => Ok(quantity),
    }
}

#![deny(missing_docs)]
#![doc = "Dimensionful quantities: unit algebra, the unit registry, parsing and tolerance grading."]

pub mod dimension;
pub mod error;
pub mod grading;
pub mod parse;
pub mod quantity;
pub mod system;
pub mod unit;

pub use dimension::{BaseDimension, Dimensions};
pub use error::UnitError;
pub use grading::{
    parse_submission, GradingMode, UnitGrade, UnitGrader, CORRECT_MAGNITUDE_INCORRECT_UNITS,
    CORRECT_UNITS_INCORRECT_MAGNITUDE, INCORRECT,
};
pub use parse::{parse_quantity, parse_unit, split_magnitude};
pub use quantity::Quantity;
pub use system::UnitSystem;
pub use unit::Unit;

#![deny(missing_docs)]
#![doc = "Rubric grading of asymptotic-complexity answers by limits at infinity."]

pub mod feedback;
pub mod flavor;
pub mod grader;

pub use feedback::{
    CONSTANT_FACTORS, CORRECT_ANSWER, CORRECT_COMPLEX, DID_NOT_CONVERGE, INCORRECT, LOWER_ORDER,
    NEGATIVE, TOO_LOOSE,
};
pub use flavor::Flavor;
pub use grader::{grade, rubric, AsymptoticGrade, Ratio};

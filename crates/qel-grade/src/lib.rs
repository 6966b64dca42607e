#![deny(missing_docs)]
#![doc = "Answer orchestration and the question element handlers built on the QEL engines."]

pub mod config;
pub mod elements;
pub mod orchestrator;
pub mod registry;

pub use config::{ConfigError, GradingConfig};
pub use elements::{
    BigOInput, FsmBuilder, IntegerInput, MatrixInput, NumberInput, OrderBlocks, SymbolicInput,
    UnitsInput, BLANK_SUBMISSION,
};
pub use orchestrator::{
    grade_answer_parameterized, learner_message, Graded, ScoreValue, DID_NOT_CONVERGE,
    EXPANDS_TOO_LARGE,
};
pub use registry::{element_for, run_phase, Phase, ELEMENT_TAGS};

#![deny(missing_docs)]
#![doc = "Finite automata drawn as diagrams: validation, subset construction, Hopcroft minimization, canonical forms and counter-example search."]

pub mod automaton;
pub mod canonical;
pub mod counterexample;
pub mod diagram;
pub mod errors;
pub mod grade;
pub mod minimize;

pub use automaton::{nfa_to_dfa, Automaton, Dfa, FsmKind, Nfa};
pub use canonical::{canonical_form, canonical_hash, CanonicalForm};
pub use counterexample::{shortest_counterexample, Counterexample};
pub use diagram::{
    parse_alphabet, DiagramOptions, RawDiagram, RawLink, RawNode, DEFAULT_ALPHABET,
    DEFAULT_EPSILON,
};
pub use errors::{FsmError, Transition};
pub use grade::{equivalent, grade_fsm, FsmGrade, MAX_LENGTH_TO_CHECK};
pub use minimize::minimize;

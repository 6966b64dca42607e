//! Validation failures for drawn and authored automata.

use std::fmt::{self, Display};

use qel_core::QelError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One transition named in a validation error.
///
/// `to` is `None` when the transition is missing rather than wrong.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Transition {
    /// Source state.
    pub from: String,
    /// Symbol as drawn on the arrow.
    pub symbol: String,
    /// Target state.
    pub to: Option<String>,
}

impl Transition {
    /// A drawn transition.
    pub fn new(from: impl Into<String>, symbol: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            symbol: symbol.into(),
            to: Some(to.into()),
        }
    }

    /// A transition the automaton should have but does not.
    pub fn missing(from: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            symbol: symbol.into(),
            to: None,
        }
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.to {
            Some(to) => write!(f, "{} --{}--> {}", self.from, self.symbol, to),
            None => write!(f, "{} on {}", self.from, self.symbol),
        }
    }
}

/// Reasons a diagram or an authored automaton is not a valid machine.
///
/// Every variant lists the states or transitions to highlight.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsmError {
    /// A node has an empty label.
    #[error("Some states are missing a name.")]
    MissingStateName,
    /// Two nodes share a label.
    #[error("Duplicate state names: {}", join(.0))]
    DuplicateStateNames(Vec<String>),
    /// A link points at a node index that does not exist.
    #[error("A transition refers to state #{0}, which does not exist.")]
    DanglingLink(usize),
    /// An authored automaton names a state it never declares.
    #[error("Transitions refer to undeclared states: {}", join(.0))]
    UnknownStates(Vec<String>),
    /// No start arrow.
    #[error("Your FSM is missing a start state.")]
    MissingStart,
    /// More than one state has a start arrow.
    #[error("Multiple states marked as start states: {}", join(.0))]
    MultipleStart(Vec<String>),
    /// No state is accepting.
    #[error("You must have at least one accepting state.")]
    NoAcceptState,
    /// Arrows labelled with symbols outside the alphabet.
    #[error("Transitions on invalid characters: {}", join(.0))]
    InvalidSymbols(Vec<Transition>),
    /// A DFA state lacks an arrow for some symbol.
    #[error("States missing outgoing transitions: {}", join(.0))]
    MissingTransitions(Vec<Transition>),
    /// A DFA state has two arrows for the same symbol.
    #[error("Multiple transitions on the same character coming out of some states: {}", join(.0))]
    DuplicateTransitions(Vec<Transition>),
    /// An NFA repeats the same arrow.
    #[error("Identical transitions present: {}", join(.0))]
    IdenticalTransitions(Vec<Transition>),
    /// States no path from the start state reaches.
    #[error("Unreachable states present: {}", join(.0))]
    UnreachableStates(Vec<String>),
}

impl FsmError {
    /// Stable machine readable code.
    pub fn code(&self) -> &'static str {
        match self {
            FsmError::MissingStateName => "missing-state-name",
            FsmError::DuplicateStateNames(_) => "duplicate-state-names",
            FsmError::DanglingLink(_) => "dangling-link",
            FsmError::UnknownStates(_) => "unknown-states",
            FsmError::MissingStart => "missing-start",
            FsmError::MultipleStart(_) => "multiple-start",
            FsmError::NoAcceptState => "no-accept-state",
            FsmError::InvalidSymbols(_) => "invalid-symbols",
            FsmError::MissingTransitions(_) => "missing-transitions",
            FsmError::DuplicateTransitions(_) => "duplicate-transitions",
            FsmError::IdenticalTransitions(_) => "identical-transitions",
            FsmError::UnreachableStates(_) => "unreachable-states",
        }
    }

    /// States to highlight in the diagram.
    pub fn states(&self) -> Vec<&str> {
        match self {
            FsmError::DuplicateStateNames(states)
            | FsmError::UnknownStates(states)
            | FsmError::MultipleStart(states)
            | FsmError::UnreachableStates(states) => states.iter().map(String::as_str).collect(),
            FsmError::MissingTransitions(transitions) => {
                let mut states: Vec<&str> = transitions.iter().map(|t| t.from.as_str()).collect();
                states.dedup();
                states
            }
            _ => Vec::new(),
        }
    }

    /// Transitions to highlight in the diagram.
    pub fn transitions(&self) -> &[Transition] {
        match self {
            FsmError::InvalidSymbols(transitions)
            | FsmError::MissingTransitions(transitions)
            | FsmError::DuplicateTransitions(transitions)
            | FsmError::IdenticalTransitions(transitions) => transitions,
            _ => &[],
        }
    }

    /// Converts into a learner format error carrying the highlights.
    pub fn into_format(self) -> QelError {
        self.into_error(QelError::format)
    }

    /// Converts into an authoring error, used for reference automata.
    pub fn into_authoring(self) -> QelError {
        self.into_error(QelError::authoring)
    }

    fn into_error(self, build: fn(String, String) -> QelError) -> QelError {
        let mut err = build(self.code().to_string(), self.to_string());
        let states = self.states();
        if !states.is_empty() {
            err = err.with_context("states", states.join(", "));
        }
        if !self.transitions().is_empty() {
            err = err.with_context("transitions", join(self.transitions()));
        }
        err
    }
}

impl From<FsmError> for QelError {
    fn from(err: FsmError) -> Self {
        err.into_format()
    }
}

fn join<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

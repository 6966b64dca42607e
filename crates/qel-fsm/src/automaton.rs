//! Deterministic and nondeterministic automata over a character alphabet.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use qel_core::{Deadline, QelError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::debug;

use crate::errors::{FsmError, Transition};

/// Which kind of machine a question asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum FsmKind {
    /// Deterministic automaton.
    Dfa,
    /// Nondeterministic automaton with optional ε-moves.
    Nfa,
}

/// Deterministic automaton whose transition function is total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dfa {
    /// State names.
    pub states: BTreeSet<String>,
    /// Input alphabet.
    #[serde(rename = "input_symbols")]
    pub alphabet: BTreeSet<char>,
    /// `state -> symbol -> state`.
    pub transitions: BTreeMap<String, BTreeMap<char, String>>,
    /// Start state.
    pub initial_state: String,
    /// Accepting states.
    pub final_states: BTreeSet<String>,
    /// State added to absorb undrawn transitions, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dump_state: Option<String>,
}

impl Dfa {
    /// Checks that the machine is closed over its states and total over its alphabet.
    pub fn check(&self) -> Result<(), FsmError> {
        let mut unknown: BTreeSet<String> = BTreeSet::new();
        if !self.states.contains(&self.initial_state) {
            unknown.insert(self.initial_state.clone());
        }
        for state in self.final_states.iter().chain(self.transitions.keys()) {
            if !self.states.contains(state) {
                unknown.insert(state.clone());
            }
        }
        let mut invalid = Vec::new();
        for (from, arrows) in &self.transitions {
            for (symbol, to) in arrows {
                if !self.states.contains(to) {
                    unknown.insert(to.clone());
                }
                if !self.alphabet.contains(symbol) {
                    invalid.push(Transition::new(from, symbol.to_string(), to));
                }
            }
        }
        if !unknown.is_empty() {
            return Err(FsmError::UnknownStates(unknown.into_iter().collect()));
        }
        if !invalid.is_empty() {
            return Err(FsmError::InvalidSymbols(invalid));
        }
        let missing: Vec<_> = self
            .states
            .iter()
            .flat_map(|state| {
                self.alphabet
                    .iter()
                    .filter(move |symbol| self.next(state, **symbol).is_none())
                    .map(move |symbol| Transition::missing(state, symbol.to_string()))
            })
            .collect();
        if !missing.is_empty() {
            return Err(FsmError::MissingTransitions(missing));
        }
        Ok(())
    }

    /// Target of `state` on `symbol`.
    pub fn next(&self, state: &str, symbol: char) -> Option<&str> {
        self.transitions
            .get(state)
            .and_then(|arrows| arrows.get(&symbol))
            .map(String::as_str)
    }

    /// Whether `state` is accepting.
    pub fn is_final(&self, state: &str) -> bool {
        self.final_states.contains(state)
    }

    /// Runs the machine on `input`; symbols outside the alphabet reject.
    pub fn accepts(&self, input: &str) -> bool {
        let mut state = self.initial_state.as_str();
        for symbol in input.chars() {
            match self.next(state, symbol) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.is_final(state)
    }

    /// States reachable from the start state, in breadth-first order.
    pub fn reachable(&self) -> Vec<&str> {
        let mut seen = BTreeSet::from([self.initial_state.as_str()]);
        let mut order = vec![self.initial_state.as_str()];
        let mut queue = VecDeque::from([self.initial_state.as_str()]);
        while let Some(state) = queue.pop_front() {
            for symbol in &self.alphabet {
                if let Some(next) = self.next(state, *symbol) {
                    if seen.insert(next) {
                        order.push(next);
                        queue.push_back(next);
                    }
                }
            }
        }
        order
    }
}

/// Nondeterministic automaton with a separate ε-relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nfa {
    /// State names.
    pub states: BTreeSet<String>,
    /// Input alphabet, excluding ε.
    #[serde(rename = "input_symbols")]
    pub alphabet: BTreeSet<char>,
    /// `state -> symbol -> states`. Missing entries go nowhere.
    pub transitions: BTreeMap<String, BTreeMap<char, BTreeSet<String>>>,
    /// `state -> states` reachable without consuming input.
    #[serde(default)]
    pub epsilon_transitions: BTreeMap<String, BTreeSet<String>>,
    /// Start state.
    pub initial_state: String,
    /// Accepting states.
    pub final_states: BTreeSet<String>,
    /// State added to absorb undrawn transitions, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dump_state: Option<String>,
}

impl Nfa {
    /// Checks that every named state is declared and every symbol is in the alphabet.
    pub fn check(&self) -> Result<(), FsmError> {
        let mut unknown: BTreeSet<String> = BTreeSet::new();
        let mentioned = std::iter::once(&self.initial_state)
            .chain(&self.final_states)
            .chain(self.transitions.keys())
            .chain(self.transitions.values().flat_map(|arrows| arrows.values().flatten()))
            .chain(self.epsilon_transitions.keys())
            .chain(self.epsilon_transitions.values().flatten());
        for state in mentioned {
            if !self.states.contains(state) {
                unknown.insert(state.clone());
            }
        }
        if !unknown.is_empty() {
            return Err(FsmError::UnknownStates(unknown.into_iter().collect()));
        }
        let invalid: Vec<_> = self
            .transitions
            .iter()
            .flat_map(|(from, arrows)| {
                arrows
                    .iter()
                    .filter(|(symbol, _)| !self.alphabet.contains(*symbol))
                    .flat_map(move |(symbol, targets)| {
                        targets
                            .iter()
                            .map(move |to| Transition::new(from, symbol.to_string(), to))
                    })
            })
            .collect();
        if !invalid.is_empty() {
            return Err(FsmError::InvalidSymbols(invalid));
        }
        Ok(())
    }

    /// Closes `states` under ε-moves.
    pub fn epsilon_closure<'a>(
        &'a self,
        states: impl IntoIterator<Item = &'a str>,
    ) -> BTreeSet<&'a str> {
        let mut closure: BTreeSet<&str> = BTreeSet::new();
        let mut stack: Vec<&str> = states.into_iter().collect();
        while let Some(state) = stack.pop() {
            if !closure.insert(state) {
                continue;
            }
            if let Some(targets) = self.epsilon_transitions.get(state) {
                stack.extend(targets.iter().map(String::as_str));
            }
        }
        closure
    }

    /// States reached from `current` on `symbol`, ε-closed.
    pub fn step<'a>(&'a self, current: &BTreeSet<&'a str>, symbol: char) -> BTreeSet<&'a str> {
        let moved = current.iter().flat_map(|state| {
            self.transitions
                .get(*state)
                .and_then(|arrows| arrows.get(&symbol))
                .into_iter()
                .flatten()
                .map(String::as_str)
        });
        self.epsilon_closure(moved)
    }

    /// Runs the machine on `input`.
    pub fn accepts(&self, input: &str) -> bool {
        let mut current = self.epsilon_closure([self.initial_state.as_str()]);
        for symbol in input.chars() {
            current = self.step(&current, symbol);
            if current.is_empty() {
                return false;
            }
        }
        current.iter().any(|state| self.final_states.contains(*state))
    }

    /// States reachable from the start state through any arrow.
    pub fn reachable(&self) -> BTreeSet<&str> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![self.initial_state.as_str()];
        while let Some(state) = stack.pop() {
            if !seen.insert(state) {
                continue;
            }
            let by_symbol = self
                .transitions
                .get(state)
                .into_iter()
                .flat_map(|arrows| arrows.values().flatten());
            let by_epsilon = self.epsilon_transitions.get(state).into_iter().flatten();
            stack.extend(by_symbol.chain(by_epsilon).map(String::as_str));
        }
        seen
    }
}

/// Subset construction. The empty subset becomes an explicit dead state.
///
/// Subsets are numbered in discovery order, so the result is deterministic.
pub fn nfa_to_dfa(nfa: &Nfa, deadline: &Deadline) -> Result<Dfa, QelError> {
    let start = nfa.epsilon_closure([nfa.initial_state.as_str()]);
    let mut ids: BTreeMap<BTreeSet<&str>, usize> = BTreeMap::from([(start.clone(), 0)]);
    let mut subsets = vec![start];
    let mut transitions: BTreeMap<String, BTreeMap<char, String>> = BTreeMap::new();
    let mut cursor = 0;
    while cursor < subsets.len() {
        deadline.check("subset-construction")?;
        let mut arrows = BTreeMap::new();
        for symbol in &nfa.alphabet {
            let next = nfa.step(&subsets[cursor], *symbol);
            let id = match ids.get(&next) {
                Some(id) => *id,
                None => {
                    let id = subsets.len();
                    ids.insert(next.clone(), id);
                    subsets.push(next);
                    id
                }
            };
            arrows.insert(*symbol, id.to_string());
        }
        transitions.insert(cursor.to_string(), arrows);
        cursor += 1;
    }
    let final_states = subsets
        .iter()
        .enumerate()
        .filter(|(_, subset)| subset.iter().any(|state| nfa.final_states.contains(*state)))
        .map(|(id, _)| id.to_string())
        .collect();
    debug!(nfa_states = nfa.states.len(), dfa_states = subsets.len(), "subset construction");
    Ok(Dfa {
        states: (0..subsets.len()).map(|id| id.to_string()).collect(),
        alphabet: nfa.alphabet.clone(),
        transitions,
        initial_state: "0".to_string(),
        final_states,
        dump_state: None,
    })
}

/// Either kind of machine, as submitted or authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "fsm_type", rename_all = "UPPERCASE")]
pub enum Automaton {
    /// Deterministic machine.
    Dfa(Dfa),
    /// Nondeterministic machine.
    Nfa(Nfa),
}

impl Automaton {
    /// Reads an authored machine of `kind` and checks it.
    pub fn from_json(kind: FsmKind, value: &Value) -> Result<Self, QelError> {
        let automaton = match kind {
            FsmKind::Dfa => Automaton::Dfa(serde_json::from_value(value.clone())?),
            FsmKind::Nfa => Automaton::Nfa(serde_json::from_value(value.clone())?),
        };
        automaton.check().map_err(FsmError::into_authoring)?;
        Ok(automaton)
    }

    /// Kind of machine.
    pub fn kind(&self) -> FsmKind {
        match self {
            Automaton::Dfa(_) => FsmKind::Dfa,
            Automaton::Nfa(_) => FsmKind::Nfa,
        }
    }

    /// Structural validity of the machine.
    pub fn check(&self) -> Result<(), FsmError> {
        match self {
            Automaton::Dfa(dfa) => dfa.check(),
            Automaton::Nfa(nfa) => nfa.check(),
        }
    }

    /// Input alphabet.
    pub fn alphabet(&self) -> &BTreeSet<char> {
        match self {
            Automaton::Dfa(dfa) => &dfa.alphabet,
            Automaton::Nfa(nfa) => &nfa.alphabet,
        }
    }

    /// Number of states as drawn, dump state included.
    pub fn state_count(&self) -> usize {
        match self {
            Automaton::Dfa(dfa) => dfa.states.len(),
            Automaton::Nfa(nfa) => nfa.states.len(),
        }
    }

    /// Name of the synthesized dump state, if one was added.
    pub fn dump_state(&self) -> Option<&str> {
        match self {
            Automaton::Dfa(dfa) => dfa.dump_state.as_deref(),
            Automaton::Nfa(nfa) => nfa.dump_state.as_deref(),
        }
    }

    /// Runs the machine on `input`.
    pub fn accepts(&self, input: &str) -> bool {
        match self {
            Automaton::Dfa(dfa) => dfa.accepts(input),
            Automaton::Nfa(nfa) => nfa.accepts(input),
        }
    }

    /// Equivalent deterministic machine.
    pub fn to_dfa(&self, deadline: &Deadline) -> Result<Dfa, QelError> {
        match self {
            Automaton::Dfa(dfa) => Ok(dfa.clone()),
            Automaton::Nfa(nfa) => nfa_to_dfa(nfa, deadline),
        }
    }
}

//! Diagrams drawn in the state editor and their conversion into automata.

use std::collections::{BTreeMap, BTreeSet};

use qel_core::QelError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::automaton::{Automaton, Dfa, FsmKind, Nfa};
use crate::errors::{FsmError, Transition};

/// Alphabet used when the question does not declare one.
pub const DEFAULT_ALPHABET: &str = "01";

/// Symbol that marks an ε-arrow in NFA diagrams.
pub const DEFAULT_EPSILON: char = 'e';

/// A state circle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNode {
    /// Label, used as the state name.
    pub text: String,
    /// Drawn with a double circle.
    #[serde(rename = "isAcceptState", default)]
    pub is_accept_state: bool,
}

/// An arrow. Labels are comma separated symbol lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RawLink {
    /// The start arrow pointing at `node`.
    StartLink {
        /// Index into the node list.
        node: usize,
    },
    /// A loop on `node`.
    SelfLink {
        /// Index into the node list.
        node: usize,
        /// Symbol list.
        #[serde(default)]
        text: String,
    },
    /// An arrow between two nodes.
    Link {
        /// Source node index.
        #[serde(rename = "nodeA")]
        node_a: usize,
        /// Target node index.
        #[serde(rename = "nodeB")]
        node_b: usize,
        /// Symbol list.
        #[serde(default)]
        text: String,
    },
}

/// The editor's wire form. Layout fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawDiagram {
    /// State circles in drawing order.
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    /// Arrows in drawing order.
    #[serde(default)]
    pub links: Vec<RawLink>,
}

/// How a diagram is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramOptions {
    /// Machine the question asks for.
    pub kind: FsmKind,
    /// Input alphabet.
    pub alphabet: Vec<char>,
    /// Label for ε-arrows. Only NFAs honour it, and only when it is not a letter of the alphabet.
    pub epsilon_symbol: Option<char>,
    /// Route undrawn transitions to a synthesized reject state.
    pub include_dump_state: bool,
}

impl DiagramOptions {
    /// Options for `kind` over the default alphabet.
    pub fn new(kind: FsmKind) -> Self {
        Self {
            kind,
            alphabet: DEFAULT_ALPHABET.chars().collect(),
            epsilon_symbol: Some(DEFAULT_EPSILON),
            include_dump_state: false,
        }
    }

    /// The ε label in effect, if any.
    pub fn epsilon(&self) -> Option<char> {
        match (self.kind, self.epsilon_symbol) {
            (FsmKind::Nfa, Some(symbol)) if !self.alphabet.contains(&symbol) => Some(symbol),
            _ => None,
        }
    }

    fn symbol(&self, label: &str) -> Option<Symbol> {
        let mut chars = label.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if self.alphabet.contains(&ch) => Some(Symbol::Letter(ch)),
            (Some(ch), None) if Some(ch) == self.epsilon() => Some(Symbol::Epsilon),
            _ => None,
        }
    }
}

/// Splits an authored alphabet string into distinct letters.
pub fn parse_alphabet(text: &str) -> Result<Vec<char>, QelError> {
    if text.chars().any(char::is_whitespace) {
        return Err(alphabet_error("Alphabet string contains whitespace.", text));
    }
    let letters: Vec<char> = text.chars().collect();
    if letters.is_empty() {
        return Err(alphabet_error("Alphabet must contain at least one symbol.", text));
    }
    let distinct: BTreeSet<char> = letters.iter().copied().collect();
    if distinct.len() != letters.len() {
        return Err(alphabet_error(&format!("Alphabet \"{text}\" has duplicates."), text));
    }
    Ok(letters)
}

fn alphabet_error(message: &str, text: &str) -> QelError {
    QelError::authoring("invalid-alphabet", message).with_context("alphabet", text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol {
    Letter(char),
    Epsilon,
}

#[derive(Debug, Clone, Copy)]
struct Arrow<'a> {
    from: &'a str,
    label: &'a str,
    to: &'a str,
}

impl Arrow<'_> {
    fn transition(&self) -> Transition {
        Transition::new(self.from, self.label, self.to)
    }
}

impl RawDiagram {
    /// Reads the editor's JSON.
    pub fn from_json(text: &str) -> Result<Self, QelError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Draws the reachable part of `automaton`, one arrow per state pair.
    ///
    /// ε-moves are labelled with `epsilon`. Building the result with matching
    /// options yields a machine with the same language.
    pub fn draw(automaton: &Automaton, epsilon: char) -> Self {
        let mut arrows: BTreeMap<(&str, &str), Vec<char>> = BTreeMap::new();
        let (initial, finals, reachable) = match automaton {
            Automaton::Dfa(dfa) => {
                for (from, row) in &dfa.transitions {
                    for (symbol, to) in row {
                        arrows.entry((from.as_str(), to.as_str())).or_default().push(*symbol);
                    }
                }
                (dfa.initial_state.as_str(), &dfa.final_states, dfa.reachable())
            }
            Automaton::Nfa(nfa) => {
                for (from, row) in &nfa.transitions {
                    for (symbol, targets) in row {
                        for to in targets {
                            arrows
                                .entry((from.as_str(), to.as_str()))
                                .or_default()
                                .push(*symbol);
                        }
                    }
                }
                for (from, targets) in &nfa.epsilon_transitions {
                    for to in targets {
                        arrows
                            .entry((from.as_str(), to.as_str()))
                            .or_default()
                            .push(epsilon);
                    }
                }
                let mut reachable: Vec<&str> = nfa.reachable().into_iter().collect();
                reachable.sort_by_key(|state| *state != nfa.initial_state);
                (nfa.initial_state.as_str(), &nfa.final_states, reachable)
            }
        };
        let index: BTreeMap<&str, usize> = reachable
            .iter()
            .enumerate()
            .map(|(position, state)| (*state, position))
            .collect();
        let nodes = reachable
            .iter()
            .map(|state| RawNode {
                text: state.to_string(),
                is_accept_state: finals.contains(*state),
            })
            .collect();
        let mut links = Vec::new();
        if let Some(&node) = index.get(initial) {
            links.push(RawLink::StartLink { node });
        }
        for ((from, to), symbols) in arrows {
            let (Some(&node_a), Some(&node_b)) = (index.get(from), index.get(to)) else {
                continue;
            };
            let text = symbols
                .iter()
                .map(char::to_string)
                .collect::<Vec<_>>()
                .join(",");
            links.push(if node_a == node_b {
                RawLink::SelfLink { node: node_a, text }
            } else {
                RawLink::Link {
                    node_a,
                    node_b,
                    text,
                }
            });
        }
        Self { nodes, links }
    }

    /// Validates the drawing and builds the machine `options` asks for.
    pub fn build(&self, options: &DiagramOptions) -> Result<Automaton, FsmError> {
        let names = self.state_names()?;
        let (starts, arrows) = self.arrows(&names)?;
        let initial_state = match starts.len() {
            0 => return Err(FsmError::MissingStart),
            1 => starts.iter().next().map(|s| s.to_string()).unwrap_or_default(),
            _ => {
                return Err(FsmError::MultipleStart(
                    starts.iter().map(|s| s.to_string()).collect(),
                ))
            }
        };

        let invalid: BTreeSet<Transition> = arrows
            .iter()
            .filter(|arrow| options.symbol(arrow.label).is_none())
            .map(Arrow::transition)
            .collect();
        if !invalid.is_empty() {
            return Err(FsmError::InvalidSymbols(invalid.into_iter().collect()));
        }

        let automaton = match options.kind {
            FsmKind::Dfa => {
                Automaton::Dfa(self.build_dfa(&names, initial_state, &arrows, options)?)
            }
            FsmKind::Nfa => {
                Automaton::Nfa(self.build_nfa(&names, initial_state, &arrows, options)?)
            }
        };
        debug!(
            kind = %options.kind,
            states = automaton.state_count(),
            dump_state = automaton.dump_state().is_some(),
            "diagram built"
        );
        Ok(automaton)
    }

    fn state_names(&self) -> Result<Vec<&str>, FsmError> {
        let mut seen = BTreeSet::new();
        let mut duplicated = BTreeSet::new();
        let mut names = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let name = node.text.trim();
            if name.is_empty() {
                return Err(FsmError::MissingStateName);
            }
            if !seen.insert(name) {
                duplicated.insert(name.to_string());
            }
            names.push(name);
        }
        if !duplicated.is_empty() {
            return Err(FsmError::DuplicateStateNames(duplicated.into_iter().collect()));
        }
        Ok(names)
    }

    fn arrows<'a>(
        &'a self,
        names: &[&'a str],
    ) -> Result<(BTreeSet<&'a str>, Vec<Arrow<'a>>), FsmError> {
        let node = |index: usize| names.get(index).copied().ok_or(FsmError::DanglingLink(index));
        let mut starts = BTreeSet::new();
        let mut arrows = Vec::new();
        for link in &self.links {
            let (from, to, text) = match link {
                RawLink::StartLink { node: index } => {
                    starts.insert(node(*index)?);
                    continue;
                }
                RawLink::SelfLink { node: index, text } => (node(*index)?, node(*index)?, text),
                RawLink::Link {
                    node_a,
                    node_b,
                    text,
                } => (node(*node_a)?, node(*node_b)?, text),
            };
            arrows.extend(text.split(',').map(|label| Arrow {
                from,
                label: label.trim(),
                to,
            }));
        }
        Ok((starts, arrows))
    }

    fn final_states(&self) -> Result<BTreeSet<String>, FsmError> {
        let finals: BTreeSet<String> = self
            .nodes
            .iter()
            .filter(|node| node.is_accept_state)
            .map(|node| node.text.trim().to_string())
            .collect();
        if finals.is_empty() {
            return Err(FsmError::NoAcceptState);
        }
        Ok(finals)
    }

    fn build_dfa<'a>(
        &self,
        names: &[&'a str],
        initial_state: String,
        arrows: &[Arrow<'a>],
        options: &DiagramOptions,
    ) -> Result<Dfa, FsmError> {
        let mut targets: BTreeMap<(&'a str, char), Vec<&Arrow<'a>>> = BTreeMap::new();
        for arrow in arrows {
            if let Some(Symbol::Letter(ch)) = options.symbol(arrow.label) {
                targets.entry((arrow.from, ch)).or_default().push(arrow);
            }
        }
        let duplicated: BTreeSet<Transition> = targets
            .values()
            .filter(|arrows| arrows.len() > 1)
            .flatten()
            .map(|arrow| arrow.transition())
            .collect();
        if !duplicated.is_empty() {
            return Err(FsmError::DuplicateTransitions(duplicated.into_iter().collect()));
        }

        let mut states: BTreeSet<String> = names.iter().map(|name| name.to_string()).collect();
        let mut transitions: BTreeMap<String, BTreeMap<char, String>> = names
            .iter()
            .map(|name| (name.to_string(), BTreeMap::new()))
            .collect();
        for ((from, ch), arrows) in &targets {
            if let (Some(row), Some(arrow)) = (transitions.get_mut(*from), arrows.first()) {
                row.insert(*ch, arrow.to.to_string());
            }
        }

        let missing = missing_transitions(names, &options.alphabet, |state, ch| {
            targets.contains_key(&(state, ch))
        });
        let mut dump_state = None;
        if !missing.is_empty() {
            if !options.include_dump_state {
                return Err(FsmError::MissingTransitions(missing));
            }
            let dump = dump_state_name(&states);
            for transition in &missing {
                if let (Some(row), Some(ch)) = (
                    transitions.get_mut(&transition.from),
                    transition.symbol.chars().next(),
                ) {
                    row.insert(ch, dump.clone());
                }
            }
            transitions.insert(
                dump.clone(),
                options.alphabet.iter().map(|ch| (*ch, dump.clone())).collect(),
            );
            states.insert(dump.clone());
            dump_state = Some(dump);
        }

        let dfa = Dfa {
            states,
            alphabet: options.alphabet.iter().copied().collect(),
            transitions,
            initial_state,
            final_states: self.final_states()?,
            dump_state,
        };
        let reachable: BTreeSet<&str> = dfa.reachable().into_iter().collect();
        check_reachable(&dfa.states, &reachable, dfa.dump_state.as_deref())?;
        Ok(dfa)
    }

    fn build_nfa<'a>(
        &self,
        names: &[&'a str],
        initial_state: String,
        arrows: &[Arrow<'a>],
        options: &DiagramOptions,
    ) -> Result<Nfa, FsmError> {
        let mut seen = BTreeSet::new();
        let identical: BTreeSet<Transition> = arrows
            .iter()
            .filter(|arrow| !seen.insert((arrow.from, arrow.label, arrow.to)))
            .map(Arrow::transition)
            .collect();
        if !identical.is_empty() {
            return Err(FsmError::IdenticalTransitions(identical.into_iter().collect()));
        }

        let mut states: BTreeSet<String> = names.iter().map(|name| name.to_string()).collect();
        let mut transitions: BTreeMap<String, BTreeMap<char, BTreeSet<String>>> = BTreeMap::new();
        let mut epsilon_transitions: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for arrow in arrows {
            match options.symbol(arrow.label) {
                Some(Symbol::Letter(ch)) => {
                    transitions
                        .entry(arrow.from.to_string())
                        .or_default()
                        .entry(ch)
                        .or_default()
                        .insert(arrow.to.to_string());
                }
                Some(Symbol::Epsilon) => {
                    epsilon_transitions
                        .entry(arrow.from.to_string())
                        .or_default()
                        .insert(arrow.to.to_string());
                }
                None => {}
            }
        }

        let mut dump_state = None;
        if options.include_dump_state {
            let missing = missing_transitions(names, &options.alphabet, |state, ch| {
                transitions
                    .get(state)
                    .is_some_and(|row| row.contains_key(&ch))
            });
            if !missing.is_empty() {
                let dump = dump_state_name(&states);
                for transition in &missing {
                    if let Some(ch) = transition.symbol.chars().next() {
                        transitions
                            .entry(transition.from.clone())
                            .or_default()
                            .insert(ch, BTreeSet::from([dump.clone()]));
                    }
                }
                transitions.insert(
                    dump.clone(),
                    options
                        .alphabet
                        .iter()
                        .map(|ch| (*ch, BTreeSet::from([dump.clone()])))
                        .collect(),
                );
                states.insert(dump.clone());
                dump_state = Some(dump);
            }
        }

        let nfa = Nfa {
            states,
            alphabet: options.alphabet.iter().copied().collect(),
            transitions,
            epsilon_transitions,
            initial_state,
            final_states: self.final_states()?,
            dump_state,
        };
        check_reachable(&nfa.states, &nfa.reachable(), nfa.dump_state.as_deref())?;
        Ok(nfa)
    }
}

fn missing_transitions<'a>(
    names: &[&'a str],
    alphabet: &[char],
    has: impl Fn(&'a str, char) -> bool,
) -> Vec<Transition> {
    let mut missing: Vec<Transition> = names
        .iter()
        .flat_map(|state| {
            alphabet
                .iter()
                .filter(|ch| !has(state, **ch))
                .map(move |ch| Transition::missing(*state, ch.to_string()))
        })
        .collect();
    missing.sort();
    missing
}

fn check_reachable(
    states: &BTreeSet<String>,
    reachable: &BTreeSet<&str>,
    dump_state: Option<&str>,
) -> Result<(), FsmError> {
    let unreachable: Vec<String> = states
        .iter()
        .filter(|state| !reachable.contains(state.as_str()) && Some(state.as_str()) != dump_state)
        .cloned()
        .collect();
    if unreachable.is_empty() {
        Ok(())
    } else {
        Err(FsmError::UnreachableStates(unreachable))
    }
}

/// First positive integer that is not already a state name.
fn dump_state_name(states: &BTreeSet<String>) -> String {
    let mut candidate = 1usize;
    while states.contains(&candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

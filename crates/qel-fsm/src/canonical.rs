//! State-name independent forms of automata.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::automaton::Dfa;
use crate::minimize::minimize;

/// A DFA with states renumbered breadth-first over the sorted alphabet.
///
/// Two DFAs with no unreachable states have equal forms exactly when they
/// are isomorphic. For minimal DFAs that means they accept the same language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalForm {
    /// Sorted alphabet.
    pub alphabet: Vec<char>,
    /// Whether state `i` accepts.
    pub accepting: Vec<bool>,
    /// `transitions[i][a]` is the successor of state `i` on `alphabet[a]`.
    pub transitions: Vec<Vec<Option<usize>>>,
}

impl CanonicalForm {
    /// Number of reachable states.
    pub fn len(&self) -> usize {
        self.accepting.len()
    }

    /// Always false: the start state is always present.
    pub fn is_empty(&self) -> bool {
        self.accepting.is_empty()
    }
}

/// Renumbers the reachable part of `dfa`.
pub fn canonical_form(dfa: &Dfa) -> CanonicalForm {
    let alphabet: Vec<char> = dfa.alphabet.iter().copied().collect();
    let mut ids: BTreeMap<&str, usize> = BTreeMap::from([(dfa.initial_state.as_str(), 0)]);
    let mut queue = VecDeque::from([dfa.initial_state.as_str()]);
    let mut accepting = Vec::new();
    let mut transitions = Vec::new();
    while let Some(state) = queue.pop_front() {
        accepting.push(dfa.is_final(state));
        let row: Vec<Option<usize>> = alphabet
            .iter()
            .map(|symbol| {
                dfa.next(state, *symbol).map(|next| {
                    let fresh = ids.len();
                    *ids.entry(next).or_insert_with(|| {
                        queue.push_back(next);
                        fresh
                    })
                })
            })
            .collect();
        transitions.push(row);
    }
    CanonicalForm {
        alphabet,
        accepting,
        transitions,
    }
}

/// Hex SHA-256 of the canonical form of the minimized machine.
///
/// Equal languages over the same alphabet always hash equal.
pub fn canonical_hash(dfa: &Dfa) -> String {
    let form = canonical_form(&minimize(dfa));
    let mut hasher = Sha256::new();
    hasher.update((form.alphabet.len() as u64).to_le_bytes());
    for symbol in &form.alphabet {
        hasher.update((*symbol as u32).to_le_bytes());
    }
    hasher.update((form.len() as u64).to_le_bytes());
    for (accepting, row) in form.accepting.iter().zip(&form.transitions) {
        hasher.update([u8::from(*accepting)]);
        for target in row {
            match target {
                Some(next) => {
                    hasher.update(b":some");
                    hasher.update((*next as u64).to_le_bytes());
                }
                None => hasher.update(b":none"),
            }
        }
    }
    format!("{:x}", hasher.finalize())
}

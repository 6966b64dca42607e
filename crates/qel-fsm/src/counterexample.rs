//! Shortest strings on which two machines disagree.

use std::collections::{BTreeSet, VecDeque};

use qel_core::{Deadline, QelError};
use serde::{Deserialize, Serialize};

use crate::automaton::{Dfa, FsmKind};

/// A string one machine accepts and the other rejects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterexample {
    /// The distinguishing input.
    pub input: String,
    /// Verdict of the submitted machine.
    pub student_accepts: bool,
    /// Verdict of the reference machine.
    pub reference_accepts: bool,
}

impl Counterexample {
    /// Feedback sentence naming both verdicts.
    pub fn describe(&self, kind: FsmKind) -> String {
        let input = if self.input.is_empty() {
            "the empty string".to_string()
        } else {
            format!("\"{}\"", self.input)
        };
        let verdict = |accepts: bool| if accepts { "accepts" } else { "rejects" };
        format!(
            "Your {kind} {} {input}, but the desired language {} it.",
            verdict(self.student_accepts),
            verdict(self.reference_accepts)
        )
    }
}

type Pair<'a> = (Option<&'a str>, Option<&'a str>);

/// Breadth-first search of the product machine.
///
/// Returns the shortest distinguishing string of at most `max_length`
/// symbols, trying symbols in sorted order at each step. `None` when the
/// machines agree on every such string. Undefined transitions reject.
pub fn shortest_counterexample(
    student: &Dfa,
    reference: &Dfa,
    max_length: usize,
    deadline: &Deadline,
) -> Result<Option<Counterexample>, QelError> {
    let alphabet: BTreeSet<char> = student.alphabet.union(&reference.alphabet).copied().collect();
    let accepts = |dfa: &Dfa, state: Option<&str>| state.is_some_and(|state| dfa.is_final(state));

    let start: Pair<'_> = (
        Some(student.initial_state.as_str()),
        Some(reference.initial_state.as_str()),
    );
    let mut visited: BTreeSet<Pair<'_>> = BTreeSet::from([start]);
    let mut queue: VecDeque<(Pair<'_>, String)> = VecDeque::from([(start, String::new())]);
    while let Some(((left, right), input)) = queue.pop_front() {
        deadline.check("counterexample")?;
        let student_accepts = accepts(student, left);
        let reference_accepts = accepts(reference, right);
        if student_accepts != reference_accepts {
            return Ok(Some(Counterexample {
                input,
                student_accepts,
                reference_accepts,
            }));
        }
        if input.chars().count() >= max_length {
            continue;
        }
        for symbol in &alphabet {
            let next: Pair<'_> = (
                left.and_then(|state| student.next(state, *symbol)),
                right.and_then(|state| reference.next(state, *symbol)),
            );
            if visited.insert(next) {
                let mut extended = input.clone();
                extended.push(*symbol);
                queue.push_back((next, extended));
            }
        }
    }
    Ok(None)
}

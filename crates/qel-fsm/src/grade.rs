//! Language-equivalence grading with a state budget.

use qel_core::{Deadline, QelError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::automaton::{Automaton, Dfa};
use crate::canonical::canonical_form;
use crate::counterexample::{shortest_counterexample, Counterexample};
use crate::minimize::minimize;

/// Longest counter-example searched by default.
pub const MAX_LENGTH_TO_CHECK: usize = 10;

/// Outcome of comparing a submission with the reference machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsmGrade {
    /// Score in `[0, 1]`.
    pub score: f64,
    /// Learner facing feedback.
    pub feedback: String,
    /// Distinguishing string, when the languages differ and one was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterexample: Option<Counterexample>,
}

/// Whether two DFAs accept the same language.
pub fn equivalent(left: &Dfa, right: &Dfa) -> bool {
    canonical_form(&minimize(left)) == canonical_form(&minimize(right))
}

/// Grades `student` against `reference`.
///
/// Equal languages score 1, or 0.5 when the drawn machine has more than
/// `max_states` states. Different languages score 0 and report the shortest
/// distinguishing string of at most `max_length` symbols.
#[tracing::instrument(level = "debug", skip_all, fields(kind = %student.kind()))]
pub fn grade_fsm(
    student: &Automaton,
    reference: &Automaton,
    max_states: Option<usize>,
    max_length: usize,
    deadline: &Deadline,
) -> Result<FsmGrade, QelError> {
    if student.alphabet() != reference.alphabet() {
        return Err(QelError::authoring(
            "alphabet-mismatch",
            "The reference automaton is defined over a different alphabet.",
        )
        .with_context("student", student.alphabet().iter().collect::<String>())
        .with_context("reference", reference.alphabet().iter().collect::<String>()));
    }
    let student_dfa = minimize(&student.to_dfa(deadline)?);
    let reference_dfa = minimize(&reference.to_dfa(deadline)?);
    deadline.check("minimize")?;

    let kind = student.kind();
    let states = student.state_count();
    let over_budget = max_states.filter(|max| states > *max);

    if canonical_form(&student_dfa) == canonical_form(&reference_dfa) {
        debug!(states, ?max_states, "languages match");
        let grade = match over_budget {
            Some(max) => FsmGrade {
                score: 0.5,
                feedback: format!(
                    "Your {kind} matches the desired language, but has {states} {}. \
                     It can have at most {max} {} to receive full credit.",
                    plural(states),
                    plural(max)
                ),
                counterexample: None,
            },
            None => FsmGrade {
                score: 1.0,
                feedback: format!("Your {kind} matches the desired language!"),
                counterexample: None,
            },
        };
        return Ok(grade);
    }

    let counterexample =
        shortest_counterexample(&student_dfa, &reference_dfa, max_length, deadline)?;
    debug!(states, found = counterexample.is_some(), "languages differ");
    let mut feedback = match over_budget {
        Some(max) => format!(
            "Your {kind} does not match the desired language and has {states} {}{}. \
             It must match the desired language and can have at most {max} {} to receive full credit.",
            plural(states),
            dump_note(student),
            plural(max)
        ),
        None => format!("Your {kind} does not match the desired language."),
    };
    feedback.push('\n');
    match &counterexample {
        Some(witness) => feedback.push_str(&witness.describe(kind)),
        None => feedback.push_str(&format!(
            "It agrees with the desired language on every string of length at most {max_length}, \
             but not on some longer string."
        )),
    }
    Ok(FsmGrade {
        score: 0.0,
        feedback,
        counterexample,
    })
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "state"
    } else {
        "states"
    }
}

fn dump_note(student: &Automaton) -> String {
    match student.dump_state() {
        Some(_) => {
            let drawn = student.state_count().saturating_sub(1);
            format!(" ({drawn} {}, plus one dump state)", plural(drawn))
        }
        None => String::new(),
    }
}

//! `fsm-builder`: finite automata drawn in the diagram editor.

use std::collections::BTreeSet;

use qel_core::{
    check_answers_names, Attributes, Deadline, Element, Limits, PartialScore, QelError,
    QuestionData, RngHandle, TestType,
};
use qel_fsm::{
    equivalent, grade_fsm, minimize, parse_alphabet, Automaton, Dfa, DiagramOptions, FsmKind,
    RawDiagram, RawLink, DEFAULT_ALPHABET, DEFAULT_EPSILON,
};
use serde_json::{json, Map, Value};
use tracing::debug;

use super::{
    answers_name, expect_invalid, expect_score, missing_reference, missing_test_type, reject,
    store_reference, BLANK_SUBMISSION,
};
use crate::orchestrator::{grade_answer_parameterized, Graded};

const TAG: &str = "fsm-builder";
const REQUIRED: &[&str] = &["answers-name", "fsm-type"];
const OPTIONAL: &[&str] = &["weight", "alphabet", "correct-answer", "max-states"];

/// Handler for `fsm-builder`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsmBuilder;

struct Settings {
    kind: FsmKind,
    alphabet: Vec<char>,
    max_states: Option<usize>,
}

fn authoring(code: &str, message: impl Into<String>) -> QelError {
    QelError::authoring(code, message).with_context("element", TAG)
}

impl Settings {
    fn read(attrs: &Attributes) -> Result<Self, QelError> {
        let kind: FsmKind = attrs.enumerated("fsm-type", FsmKind::Dfa)?;
        let alphabet = parse_alphabet(attrs.string_or("alphabet").unwrap_or(DEFAULT_ALPHABET))?;
        if kind == FsmKind::Nfa && alphabet.contains(&DEFAULT_EPSILON) {
            return Err(authoring(
                "epsilon-in-alphabet",
                format!("\"{DEFAULT_EPSILON}\" is reserved for epsilon transitions in NFAs."),
            ));
        }
        let max_states = attrs
            .integer_opt("max-states")?
            .map(|max| {
                usize::try_from(max)
                    .ok()
                    .filter(|max| *max > 0)
                    .ok_or_else(|| {
                        authoring(
                            "invalid-max-states",
                            format!("max-states must be a positive integer, not {max}."),
                        )
                    })
            })
            .transpose()?;
        Ok(Self {
            kind,
            alphabet,
            max_states,
        })
    }

    fn diagram_options(&self, include_dump_state: bool) -> DiagramOptions {
        DiagramOptions {
            kind: self.kind,
            alphabet: self.alphabet.clone(),
            epsilon_symbol: Some(DEFAULT_EPSILON),
            include_dump_state,
        }
    }

    fn reference(&self, data: &QuestionData, name: &str) -> Result<Option<Automaton>, QelError> {
        let Some(value) = data.correct_answers.get(name).filter(|value| !value.is_null()) else {
            return Ok(None);
        };
        let reference = Automaton::from_json(self.kind, value).map_err(|err| {
            authoring(
                "invalid-correct-answer",
                format!(
                    "Correct answer for \"{name}\" is not a valid {}: {}",
                    self.kind,
                    err.info().message
                ),
            )
        })?;
        let alphabet: BTreeSet<char> = self.alphabet.iter().copied().collect();
        if reference.alphabet() != &alphabet {
            return Err(authoring(
                "alphabet-mismatch",
                format!(
                    "Correct answer for \"{name}\" uses alphabet \"{}\", but the element declares \"{}\".",
                    reference.alphabet().iter().collect::<String>(),
                    self.alphabet.iter().collect::<String>()
                ),
            ));
        }
        Ok(Some(reference))
    }

    fn expected(
        &self,
        student: &Automaton,
        reference: &Automaton,
        weight: u32,
        limits: &Limits,
    ) -> Result<PartialScore, QelError> {
        let deadline = Deadline::after(limits.timeout());
        let result = grade_fsm(
            student,
            reference,
            self.max_states,
            limits.fsm_max_length,
            &deadline,
        )?;
        Ok(PartialScore::new(result.score, weight).with_feedback(result.feedback))
    }
}

/// Diagram text and dump-state flag submitted for `name`.
fn submitted_diagram(data: &QuestionData, name: &str) -> (Option<String>, bool) {
    let raw = data
        .raw_submitted_answers
        .get(&format!("{name}-raw"))
        .and_then(Value::as_str)
        .or_else(|| data.raw_answer(name))
        .map(str::to_string);
    let dump = match data.raw_submitted_answers.get(&format!("{name}-include-dump-state")) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => text == "on" || text == "true",
        _ => false,
    };
    (raw, dump)
}

fn set_highlights(data: &mut QuestionData, name: &str, highlights: Value) {
    let entry = data
        .params
        .entry(name.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(params) = entry {
        params.insert("highlights".to_string(), highlights);
    }
}

/// Two-state DFA: `accept_empty` decides ε, `accept_rest` every
/// other string.
fn two_state_dfa(alphabet: &BTreeSet<char>, accept_empty: bool, accept_rest: bool) -> Dfa {
    let states: BTreeSet<String> = ["q0", "q1"].into_iter().map(str::to_string).collect();
    let transitions = states
        .iter()
        .map(|state| {
            let row = alphabet.iter().map(|symbol| (*symbol, "q1".to_string())).collect();
            (state.clone(), row)
        })
        .collect();
    let final_states = [("q0", accept_empty), ("q1", accept_rest)]
        .into_iter()
        .filter(|(_, accepting)| *accepting)
        .map(|(state, _)| state.to_string())
        .collect();
    Dfa {
        states,
        alphabet: alphabet.clone(),
        transitions,
        initial_state: "q0".to_string(),
        final_states,
        dump_state: None,
    }
}

/// A machine whose language differs from `reference`, usually on the empty
/// string.
fn wrong_machine(reference: &Automaton, limits: &Limits) -> Result<Automaton, QelError> {
    let reference = minimize(&reference.to_dfa(&Deadline::after(limits.timeout()))?);
    let mut dfa = reference.clone();
    let initial = dfa.initial_state.clone();
    if !dfa.final_states.remove(&initial) {
        dfa.final_states.insert(initial);
    }
    if dfa.final_states.is_empty() {
        let only_empty = two_state_dfa(&reference.alphabet, true, false);
        dfa = if equivalent(&only_empty, &reference) {
            two_state_dfa(&reference.alphabet, true, true)
        } else {
            only_empty
        };
    }
    Ok(Automaton::Dfa(dfa))
}

impl Element for FsmBuilder {
    fn tag(&self) -> &'static str {
        TAG
    }

    fn prepare(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        _limits: &Limits,
    ) -> Result<(), QelError> {
        attrs.check(REQUIRED, OPTIONAL)?;
        let name = answers_name(attrs)?;
        check_answers_names(data, name)?;
        let settings = Settings::read(attrs)?;
        if let Some(correct) = attrs.string_or("correct-answer") {
            let value: Value = serde_json::from_str(correct).map_err(|err| {
                authoring(
                    "invalid-correct-answer",
                    format!("Correct answer for \"{name}\" is not valid JSON: {err}"),
                )
            })?;
            store_reference(data, name, value)?;
        }
        settings.reference(data, name)?;
        data.params.insert(
            name.to_string(),
            json!({
                "fsm_type": settings.kind.to_string(),
                "alphabet": settings.alphabet.iter().collect::<String>(),
                "max_states": settings.max_states,
            }),
        );
        Ok(())
    }

    fn parse(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        _limits: &Limits,
    ) -> Result<(), QelError> {
        let name = answers_name(attrs)?;
        let settings = Settings::read(attrs)?;
        let (raw, include_dump_state) = submitted_diagram(data, name);
        let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
            data.reject(name, BLANK_SUBMISSION);
            return Ok(());
        };
        let diagram = match RawDiagram::from_json(&raw) {
            Ok(diagram) => diagram,
            Err(err) => {
                debug!(code = %err.info().code, "diagram json rejected");
                let err = QelError::format(
                    "invalid-diagram",
                    "Invalid format. The diagram could not be read.",
                );
                return reject(data, name, err);
            }
        };
        match diagram.build(&settings.diagram_options(include_dump_state)) {
            Ok(automaton) => {
                data.format_errors.remove(name);
                data.submitted_answers
                    .insert(name.to_string(), serde_json::to_value(&automaton)?);
            }
            Err(err) => {
                debug!(code = err.code(), "diagram rejected");
                set_highlights(
                    data,
                    name,
                    json!({
                        "states": err.states(),
                        "transitions": err.transitions(),
                    }),
                );
                data.reject(name, err.to_string());
            }
        }
        Ok(())
    }

    fn grade(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        limits: &Limits,
    ) -> Result<(), QelError> {
        let name = answers_name(attrs)?;
        let weight = attrs.weight()?;
        let settings = Settings::read(attrs)?;
        let Some(reference) = settings.reference(data, name)? else {
            return Ok(());
        };
        grade_answer_parameterized(data, name, weight, limits.timeout(), |submitted, deadline| {
            let student: Automaton = serde_json::from_value(submitted.clone())?;
            let result = grade_fsm(
                &student,
                &reference,
                settings.max_states,
                limits.fsm_max_length,
                deadline,
            )?;
            Ok(Graded::new(result.score).with_feedback(result.feedback))
        })
    }

    fn test(
        &self,
        attrs: &Attributes,
        data: &mut QuestionData,
        limits: &Limits,
        _rng: &mut RngHandle,
    ) -> Result<(), QelError> {
        let name = answers_name(attrs)?;
        let weight = attrs.weight()?;
        let settings = Settings::read(attrs)?;
        let reference = settings
            .reference(data, name)?
            .ok_or_else(|| missing_reference(name))?;
        let options = settings.diagram_options(false);
        match data.test_type.ok_or_else(missing_test_type)? {
            test_type @ (TestType::Correct | TestType::Incorrect) => {
                let drawn = match test_type {
                    TestType::Correct => RawDiagram::draw(&reference, DEFAULT_EPSILON),
                    _ => RawDiagram::draw(&wrong_machine(&reference, limits)?, DEFAULT_EPSILON),
                };
                let student = drawn.build(&options).map_err(|err| err.into_format())?;
                let score = settings.expected(&student, &reference, weight, limits)?;
                expect_score(data, name, serde_json::to_string(&drawn)?, score);
            }
            TestType::Invalid => {
                let mut drawn = RawDiagram::draw(&reference, DEFAULT_EPSILON);
                drawn
                    .links
                    .retain(|link| !matches!(link, RawLink::StartLink { .. }));
                let message = match drawn.build(&options) {
                    Err(err) => err.to_string(),
                    Ok(_) => {
                        return Err(QelError::internal(
                            "test-input-accepted",
                            "diagram without a start arrow was accepted",
                        ))
                    }
                };
                expect_invalid(data, name, serde_json::to_string(&drawn)?, message);
            }
        }
        Ok(())
    }

    fn format_answer(
        &self,
        attrs: &Attributes,
        data: &QuestionData,
        _limits: &Limits,
    ) -> Result<Option<String>, QelError> {
        let name = answers_name(attrs)?;
        let settings = Settings::read(attrs)?;
        let Some(reference) = settings.reference(data, name)? else {
            return Ok(None);
        };
        let drawn = RawDiagram::draw(&reference, DEFAULT_EPSILON);
        Ok(Some(serde_json::to_string(&drawn)?))
    }
}

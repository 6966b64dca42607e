use qel_core::{Deadline, QelError};
use qel_fsm::{
    canonical_hash, equivalent, grade_fsm, minimize, nfa_to_dfa, shortest_counterexample,
    Automaton, DiagramOptions, FsmKind, RawDiagram, RawLink, RawNode, MAX_LENGTH_TO_CHECK,
};

fn diagram(nodes: &[(&str, bool)], links: &[(usize, usize, &str)]) -> RawDiagram {
    let mut raw = RawDiagram {
        nodes: nodes
            .iter()
            .map(|(text, accept)| RawNode {
                text: text.to_string(),
                is_accept_state: *accept,
            })
            .collect(),
        links: vec![RawLink::StartLink { node: 0 }],
    };
    for (from, to, text) in links {
        raw.links.push(if from == to {
            RawLink::SelfLink {
                node: *from,
                text: text.to_string(),
            }
        } else {
            RawLink::Link {
                node_a: *from,
                node_b: *to,
                text: text.to_string(),
            }
        });
    }
    raw
}

fn ends_in_01_reference() -> Automaton {
    let json = serde_json::json!({
        "states": ["a", "b", "c"],
        "input_symbols": ["0", "1"],
        "transitions": {
            "a": {"0": "b", "1": "a"},
            "b": {"0": "b", "1": "c"},
            "c": {"0": "b", "1": "a"}
        },
        "initial_state": "a",
        "final_states": ["c"]
    });
    Automaton::from_json(FsmKind::Dfa, &json).unwrap()
}

fn student(nodes: &[(&str, bool)], links: &[(usize, usize, &str)], kind: FsmKind) -> Automaton {
    diagram(nodes, links).build(&DiagramOptions::new(kind)).unwrap()
}

fn grade(student: &Automaton, max_states: Option<usize>) -> qel_fsm::FsmGrade {
    grade_fsm(
        student,
        &ends_in_01_reference(),
        max_states,
        MAX_LENGTH_TO_CHECK,
        &Deadline::unbounded(),
    )
    .unwrap()
}

#[test]
fn renamed_states_match_the_language() {
    let renamed = student(
        &[("x", false), ("y", false), ("z", true)],
        &[(0, 1, "0"), (0, 0, "1"), (1, 1, "0"), (1, 2, "1"), (2, 1, "0"), (2, 0, "1")],
        FsmKind::Dfa,
    );
    let result = grade(&renamed, None);
    assert_eq!(result.score, 1.0);
    assert_eq!(result.feedback, "Your DFA matches the desired language!");
    assert_eq!(result.counterexample, None);
}

#[test]
fn contains_01_is_caught_by_010() {
    let contains = student(
        &[("p", false), ("q", false), ("r", true)],
        &[(0, 1, "0"), (0, 0, "1"), (1, 1, "0"), (1, 2, "1"), (2, 2, "0,1")],
        FsmKind::Dfa,
    );
    let result = grade(&contains, None);
    assert_eq!(result.score, 0.0);
    let witness = result.counterexample.unwrap();
    assert_eq!(witness.input, "010");
    assert!(witness.student_accepts);
    assert!(!witness.reference_accepts);
    assert_eq!(
        result.feedback,
        "Your DFA does not match the desired language.\n\
         Your DFA accepts \"010\", but the desired language rejects it."
    );
}

#[test]
fn extra_states_halve_the_score() {
    let padded = student(
        &[("a", false), ("a2", false), ("b", false), ("c", true)],
        &[
            (0, 2, "0"),
            (0, 1, "1"),
            (1, 2, "0"),
            (1, 0, "1"),
            (2, 2, "0"),
            (2, 3, "1"),
            (3, 2, "0"),
            (3, 0, "1"),
        ],
        FsmKind::Dfa,
    );
    let result = grade(&padded, Some(3));
    assert_eq!(result.score, 0.5);
    assert_eq!(
        result.feedback,
        "Your DFA matches the desired language, but has 4 states. \
         It can have at most 3 states to receive full credit."
    );
    assert_eq!(grade(&padded, Some(4)).score, 1.0);
}

#[test]
fn wrong_and_too_large_mentions_the_dump_state() {
    let options = DiagramOptions {
        include_dump_state: true,
        ..DiagramOptions::new(FsmKind::Nfa)
    };
    let accepts_one = diagram(&[("s", false), ("t", true)], &[(0, 1, "1")])
        .build(&options)
        .unwrap();
    assert_eq!(accepts_one.state_count(), 3);
    let result = grade(&accepts_one, Some(2));
    assert_eq!(result.score, 0.0);
    assert!(result.feedback.starts_with(
        "Your NFA does not match the desired language and has 3 states (2 states, plus one dump state)."
    ));
    assert!(result.feedback.ends_with("Your NFA accepts \"1\", but the desired language rejects it."));
}

#[test]
fn nfa_with_guessing_matches_the_dfa() {
    let guess = student(
        &[("s", false), ("t", false), ("u", true)],
        &[(0, 0, "0,1"), (0, 1, "0"), (1, 2, "1")],
        FsmKind::Nfa,
    );
    let result = grade(&guess, Some(3));
    assert_eq!(result.score, 1.0);
    assert_eq!(result.feedback, "Your NFA matches the desired language!");

    let Automaton::Nfa(nfa) = &guess else {
        panic!("expected an NFA");
    };
    let dfa = nfa_to_dfa(nfa, &Deadline::unbounded()).unwrap();
    assert_eq!(minimize(&dfa).states.len(), 3);
    let Automaton::Dfa(reference) = ends_in_01_reference() else {
        panic!("expected a DFA");
    };
    assert!(equivalent(&dfa, &reference));
    assert_eq!(canonical_hash(&dfa), canonical_hash(&reference));
}

#[test]
fn empty_string_counterexamples_read_naturally() {
    let everything = student(&[("a", true)], &[(0, 0, "0,1")], FsmKind::Dfa);
    let result = grade(&everything, None);
    let witness = result.counterexample.unwrap();
    assert_eq!(witness.input, "");
    assert!(result
        .feedback
        .ends_with("Your DFA accepts the empty string, but the desired language rejects it."));
}

#[test]
fn search_bound_limits_the_witness_length() {
    let Automaton::Dfa(reference) = ends_in_01_reference() else {
        panic!("expected a DFA");
    };
    let Automaton::Dfa(has_one) = student(
        &[("a", false), ("b", true)],
        &[(0, 0, "0"), (0, 1, "1"), (1, 1, "0,1")],
        FsmKind::Dfa,
    ) else {
        panic!("expected a DFA");
    };
    let deadline = Deadline::unbounded();
    let witness = shortest_counterexample(&has_one, &reference, 1, &deadline).unwrap();
    assert_eq!(witness.map(|w| w.input), Some("1".to_string()));
    assert_eq!(shortest_counterexample(&has_one, &reference, 0, &deadline).unwrap(), None);
    assert_eq!(shortest_counterexample(&reference, &reference, 8, &deadline).unwrap(), None);
}

#[test]
fn mismatched_alphabets_are_an_authoring_fault() {
    let options = DiagramOptions {
        alphabet: vec!['a', 'b'],
        ..DiagramOptions::new(FsmKind::Dfa)
    };
    let other = diagram(&[("s", true)], &[(0, 0, "a,b")]).build(&options).unwrap();
    let err = grade_fsm(
        &other,
        &ends_in_01_reference(),
        None,
        MAX_LENGTH_TO_CHECK,
        &Deadline::unbounded(),
    )
    .unwrap_err();
    assert!(matches!(&err, QelError::Authoring(info) if info.code == "alphabet-mismatch"));
}

#[test]
fn drawn_reference_rebuilds_to_the_same_language() {
    let reference = ends_in_01_reference();
    let drawn = RawDiagram::draw(&reference, 'e');
    assert_eq!(drawn.nodes.len(), 3);
    assert!(matches!(drawn.links[0], RawLink::StartLink { node: 0 }));
    let rebuilt = drawn.build(&DiagramOptions::new(FsmKind::Dfa)).unwrap();
    assert_eq!(grade(&rebuilt, Some(3)).score, 1.0);

    let nfa = serde_json::json!({
        "states": ["p", "q"],
        "input_symbols": ["0", "1"],
        "transitions": {"p": {"0": ["p"], "1": ["p"]}, "q": {"1": ["q"]}},
        "epsilon_transitions": {"p": ["q"]},
        "initial_state": "p",
        "final_states": ["q"]
    });
    let nfa = Automaton::from_json(FsmKind::Nfa, &nfa).unwrap();
    let drawn = RawDiagram::draw(&nfa, 'e');
    let rebuilt = drawn.build(&DiagramOptions::new(FsmKind::Nfa)).unwrap();
    for input in ["", "0", "10", "0111"] {
        assert_eq!(rebuilt.accepts(input), nfa.accepts(input), "{input:?}");
    }
}

use qel_core::QelError;
use qel_fsm::{
    parse_alphabet, Automaton, DiagramOptions, FsmError, FsmKind, RawDiagram, RawLink, RawNode,
    Transition,
};

fn diagram(nodes: &[(&str, bool)], starts: &[usize], links: &[(usize, usize, &str)]) -> RawDiagram {
    let mut raw = RawDiagram {
        nodes: nodes
            .iter()
            .map(|(text, accept)| RawNode {
                text: text.to_string(),
                is_accept_state: *accept,
            })
            .collect(),
        links: starts.iter().map(|node| RawLink::StartLink { node: *node }).collect(),
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

fn dfa_options() -> DiagramOptions {
    DiagramOptions::new(FsmKind::Dfa)
}

#[test]
fn editor_json_ignores_layout_fields() {
    let raw = RawDiagram::from_json(
        r#"{
            "nodes": [{"x": 10, "y": 20, "text": "a", "isAcceptState": true}],
            "links": [
                {"type": "StartLink", "node": 0, "deltaX": -40, "deltaY": 0},
                {"type": "SelfLink", "node": 0, "text": "0,1", "anchorAngle": 1.5}
            ]
        }"#,
    )
    .unwrap();
    let automaton = raw.build(&dfa_options()).unwrap();
    assert!(automaton.accepts(""));
    assert!(automaton.accepts("0110"));
    assert_eq!(automaton.state_count(), 1);
}

#[test]
fn start_state_must_be_unique() {
    let none = diagram(&[("a", true)], &[], &[(0, 0, "0,1")]);
    let err = none.build(&dfa_options()).unwrap_err();
    assert_eq!(err, FsmError::MissingStart);
    assert_eq!(err.to_string(), "Your FSM is missing a start state.");

    let two = diagram(&[("a", true), ("b", false)], &[0, 1], &[(0, 0, "0,1"), (1, 1, "0,1")]);
    let err = two.build(&dfa_options()).unwrap_err();
    assert_eq!(err.to_string(), "Multiple states marked as start states: a, b");
    assert_eq!(err.states(), vec!["a", "b"]);

    let repeated = diagram(&[("a", true)], &[0, 0], &[(0, 0, "0,1")]);
    assert!(repeated.build(&dfa_options()).is_ok());
}

#[test]
fn state_names_must_be_present_and_distinct() {
    let blank = diagram(&[("  ", true)], &[0], &[(0, 0, "0,1")]);
    assert_eq!(blank.build(&dfa_options()).unwrap_err(), FsmError::MissingStateName);

    let twins = diagram(&[("a", true), ("a", false)], &[0], &[]);
    assert_eq!(
        twins.build(&dfa_options()).unwrap_err(),
        FsmError::DuplicateStateNames(vec!["a".into()])
    );

    let dangling = diagram(&[("a", true)], &[0], &[(0, 3, "0")]);
    assert_eq!(dangling.build(&dfa_options()).unwrap_err(), FsmError::DanglingLink(3));
}

#[test]
fn symbols_outside_the_alphabet_are_rejected() {
    let raw = diagram(&[("a", true), ("b", false)], &[0], &[(0, 1, "0,2"), (1, 1, "01")]);
    let err = raw.build(&dfa_options()).unwrap_err();
    assert_eq!(
        err.transitions(),
        &[Transition::new("a", "2", "b"), Transition::new("b", "01", "b")]
    );
    assert_eq!(
        err.to_string(),
        "Transitions on invalid characters: a --2--> b, b --01--> b"
    );
}

#[test]
fn dfa_needs_every_transition_without_a_dump_state() {
    let raw = diagram(&[("a", true)], &[0], &[(0, 0, "0")]);
    let err = raw.build(&dfa_options()).unwrap_err();
    assert_eq!(err, FsmError::MissingTransitions(vec![Transition::missing("a", "1")]));
    assert_eq!(err.to_string(), "States missing outgoing transitions: a on 1");
    assert_eq!(err.states(), vec!["a"]);
}

#[test]
fn dump_state_takes_the_first_free_number() {
    let options = DiagramOptions {
        include_dump_state: true,
        ..dfa_options()
    };
    let raw = diagram(&[("a", true)], &[0], &[(0, 0, "0")]);
    let automaton = raw.build(&options).unwrap();
    assert_eq!(automaton.dump_state(), Some("1"));
    assert_eq!(automaton.state_count(), 2);
    assert!(automaton.accepts("000"));
    assert!(!automaton.accepts("01"));

    let clash = diagram(&[("1", true), ("2", false)], &[0], &[(0, 0, "0"), (0, 1, "1"), (1, 1, "0,1")]);
    let complete = clash.build(&options).unwrap();
    assert_eq!(complete.dump_state(), None);

    let partial = diagram(&[("1", true), ("2", false)], &[0], &[(0, 0, "0"), (0, 1, "1")]);
    assert_eq!(partial.build(&options).unwrap().dump_state(), Some("3"));
}

#[test]
fn dfa_rejects_two_arrows_on_one_symbol() {
    let raw = diagram(&[("a", true), ("b", false)], &[0], &[(0, 0, "0,1"), (0, 1, "0"), (1, 1, "0,1")]);
    let err = raw.build(&dfa_options()).unwrap_err();
    assert_eq!(
        err,
        FsmError::DuplicateTransitions(vec![
            Transition::new("a", "0", "a"),
            Transition::new("a", "0", "b"),
        ])
    );
}

#[test]
fn nfa_rejects_repeated_arrows_only() {
    let options = DiagramOptions::new(FsmKind::Nfa);
    let raw = diagram(&[("a", true), ("b", false)], &[0], &[(0, 1, "0"), (0, 1, "0")]);
    assert_eq!(
        raw.build(&options).unwrap_err(),
        FsmError::IdenticalTransitions(vec![Transition::new("a", "0", "b")])
    );

    let branching = diagram(&[("a", true), ("b", false)], &[0], &[(0, 1, "0"), (0, 0, "0")]);
    assert!(matches!(branching.build(&options).unwrap(), Automaton::Nfa(_)));
}

#[test]
fn accepting_and_reachable_states_are_required() {
    let rejecting = diagram(&[("a", false)], &[0], &[(0, 0, "0,1")]);
    assert_eq!(rejecting.build(&dfa_options()).unwrap_err(), FsmError::NoAcceptState);

    let island = diagram(&[("a", true), ("c", false)], &[0], &[(0, 0, "0,1"), (1, 1, "0,1")]);
    let err = island.build(&dfa_options()).unwrap_err();
    assert_eq!(err, FsmError::UnreachableStates(vec!["c".into()]));
    assert_eq!(err.to_string(), "Unreachable states present: c");
}

#[test]
fn epsilon_arrows_only_move_in_nfas() {
    let raw = diagram(&[("s", false), ("t", true)], &[0], &[(0, 1, "e"), (1, 1, "1")]);
    let nfa = raw.build(&DiagramOptions::new(FsmKind::Nfa)).unwrap();
    assert!(nfa.accepts(""));
    assert!(nfa.accepts("11"));
    assert!(!nfa.accepts("0"));

    let err = raw.build(&dfa_options()).unwrap_err();
    assert!(matches!(err, FsmError::InvalidSymbols(_)));

    let letter = DiagramOptions {
        alphabet: vec!['0', '1', 'e'],
        ..DiagramOptions::new(FsmKind::Nfa)
    };
    assert_eq!(letter.epsilon(), None);
    let literal = raw.build(&letter).unwrap();
    assert!(!literal.accepts(""));
    assert!(literal.accepts("e1"));
}

#[test]
fn validation_errors_become_format_errors() {
    let raw = diagram(&[("a", true)], &[0], &[(0, 0, "0")]);
    let err: QelError = raw.build(&dfa_options()).unwrap_err().into();
    assert!(matches!(
        &err,
        QelError::Format(info)
            if info.code == "missing-transitions"
                && info.context.get("transitions").map(String::as_str) == Some("a on 1")
                && info.context.get("states").map(String::as_str) == Some("a")
    ));
}

#[test]
fn authored_alphabets_are_checked() {
    assert_eq!(parse_alphabet("abc").unwrap(), vec!['a', 'b', 'c']);
    let spaced = parse_alphabet("a b").unwrap_err();
    assert!(matches!(
        &spaced,
        QelError::Authoring(info) if info.message == "Alphabet string contains whitespace."
    ));
    let twice = parse_alphabet("aba").unwrap_err();
    assert!(matches!(&twice, QelError::Authoring(info) if info.code == "invalid-alphabet"));
}

#[test]
fn authored_references_must_be_total() {
    let reference = serde_json::json!({
        "states": ["a", "b"],
        "input_symbols": ["0", "1"],
        "transitions": {"a": {"0": "b", "1": "a"}, "b": {"0": "b"}},
        "initial_state": "a",
        "final_states": ["b"]
    });
    let err = Automaton::from_json(FsmKind::Dfa, &reference).unwrap_err();
    assert!(matches!(&err, QelError::Authoring(info) if info.code == "missing-transitions"));

    let typo = serde_json::json!({
        "states": ["a"],
        "input_symbols": ["0"],
        "transitions": {"a": {"0": ["z"]}},
        "initial_state": "a",
        "final_states": ["a"]
    });
    let err = Automaton::from_json(FsmKind::Nfa, &typo).unwrap_err();
    assert!(matches!(&err, QelError::Authoring(info) if info.code == "unknown-states"));
}

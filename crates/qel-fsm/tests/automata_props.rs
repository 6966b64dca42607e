use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use qel_core::Deadline;
use qel_fsm::{
    canonical_hash, grade_fsm, minimize, nfa_to_dfa, shortest_counterexample, Automaton, Dfa, Nfa,
};

fn all_strings(max_len: usize) -> Vec<String> {
    let mut strings = vec![String::new()];
    let mut frontier = vec![String::new()];
    for _ in 0..max_len {
        frontier = frontier
            .iter()
            .flat_map(|prefix| ['0', '1'].map(|symbol| format!("{prefix}{symbol}")))
            .collect();
        strings.extend(frontier.iter().cloned());
    }
    strings
}

fn build_dfa(prefix: &str, targets: &[usize], accepting: &[bool]) -> Dfa {
    let name = |i: usize| format!("{prefix}{i}");
    let n = accepting.len();
    Dfa {
        states: (0..n).map(name).collect(),
        alphabet: BTreeSet::from(['0', '1']),
        transitions: (0..n)
            .map(|i| {
                let row = BTreeMap::from([('0', name(targets[2 * i])), ('1', name(targets[2 * i + 1]))]);
                (name(i), row)
            })
            .collect(),
        initial_state: name(0),
        final_states: (0..n).filter(|i| accepting[*i]).map(name).collect(),
        dump_state: None,
    }
}

fn random_dfa() -> impl Strategy<Value = (Vec<usize>, Vec<bool>)> {
    (1usize..6).prop_flat_map(|n| {
        (
            prop::collection::vec(0..n, 2 * n),
            prop::collection::vec(any::<bool>(), n),
        )
    })
}

fn random_nfa() -> impl Strategy<Value = Nfa> {
    (1usize..5).prop_flat_map(|n| {
        (
            prop::collection::vec((0..n, 0..2usize, 0..n), 0..3 * n),
            prop::collection::vec((0..n, 0..n), 0..n),
            prop::collection::vec(any::<bool>(), n),
        )
            .prop_map(move |(arrows, epsilons, accepting)| {
                let name = |i: usize| format!("n{i}");
                let mut transitions: BTreeMap<String, BTreeMap<char, BTreeSet<String>>> =
                    BTreeMap::new();
                for (from, symbol, to) in arrows {
                    let symbol = if symbol == 0 { '0' } else { '1' };
                    transitions
                        .entry(name(from))
                        .or_default()
                        .entry(symbol)
                        .or_default()
                        .insert(name(to));
                }
                let mut epsilon_transitions: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
                for (from, to) in epsilons {
                    epsilon_transitions.entry(name(from)).or_default().insert(name(to));
                }
                Nfa {
                    states: (0..n).map(name).collect(),
                    alphabet: BTreeSet::from(['0', '1']),
                    transitions,
                    epsilon_transitions,
                    initial_state: name(0),
                    final_states: (0..n).filter(|i| accepting[*i]).map(name).collect(),
                    dump_state: None,
                }
            })
    })
}

proptest! {
    #[test]
    fn minimization_preserves_the_language((targets, accepting) in random_dfa()) {
        let dfa = build_dfa("s", &targets, &accepting);
        let minimal = minimize(&dfa);
        prop_assert!(minimal.states.len() <= dfa.states.len());
        for input in all_strings(6) {
            prop_assert_eq!(minimal.accepts(&input), dfa.accepts(&input), "input {:?}", input);
        }
        prop_assert_eq!(minimize(&minimal).states.len(), minimal.states.len());
    }

    #[test]
    fn hashes_ignore_state_names((targets, accepting) in random_dfa()) {
        let original = build_dfa("s", &targets, &accepting);
        let renamed = build_dfa("renamed_", &targets, &accepting);
        prop_assert_eq!(canonical_hash(&original), canonical_hash(&renamed));
    }

    #[test]
    fn a_machine_matches_itself((targets, accepting) in random_dfa()) {
        let dfa = Automaton::Dfa(build_dfa("s", &targets, &accepting));
        let grade = grade_fsm(&dfa, &dfa, None, 10, &Deadline::unbounded()).unwrap();
        prop_assert_eq!(grade.score, 1.0);
    }

    #[test]
    fn witnesses_really_distinguish(
        (left_targets, left_accepting) in random_dfa(),
        (right_targets, right_accepting) in random_dfa(),
    ) {
        let left = build_dfa("l", &left_targets, &left_accepting);
        let right = build_dfa("r", &right_targets, &right_accepting);
        let witness = shortest_counterexample(&left, &right, 8, &Deadline::unbounded()).unwrap();
        let first_disagreement = all_strings(8)
            .into_iter()
            .find(|input| left.accepts(input) != right.accepts(input));
        match witness {
            Some(witness) => {
                prop_assert_eq!(witness.student_accepts, left.accepts(&witness.input));
                prop_assert_eq!(witness.reference_accepts, right.accepts(&witness.input));
                prop_assert_ne!(witness.student_accepts, witness.reference_accepts);
                let shortest = first_disagreement.map(|input| input.len());
                prop_assert_eq!(Some(witness.input.len()), shortest);
            }
            None => prop_assert!(first_disagreement.is_none()),
        }
    }

    #[test]
    fn subset_construction_preserves_the_language(nfa in random_nfa()) {
        let dfa = nfa_to_dfa(&nfa, &Deadline::unbounded()).unwrap();
        for input in all_strings(5) {
            prop_assert_eq!(dfa.accepts(&input), nfa.accepts(&input), "input {:?}", input);
        }
    }
}

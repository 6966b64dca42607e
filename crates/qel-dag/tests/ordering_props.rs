use proptest::prelude::*;
use qel_dag::{grade_dag, lcs_partial_credit, solve_dag, Depends, Groups};

/// Random DAGs whose edges only point from lower to higher indices.
fn random_dag() -> impl Strategy<Value = Depends> {
    (2usize..8).prop_flat_map(|n| {
        prop::collection::vec(any::<bool>(), n * n).prop_map(move |bits| {
            (0..n)
                .map(|child| {
                    let parents = (0..child)
                        .filter(|&parent| bits[parent * n + child])
                        .map(|parent| format!("n{parent}"))
                        .collect();
                    (format!("n{child}"), parents)
                })
                .collect()
        })
    })
}

fn dag_and_permutation() -> impl Strategy<Value = (Depends, Vec<String>)> {
    random_dag().prop_flat_map(|dag| {
        let tags: Vec<String> = dag.keys().cloned().collect();
        (Just(dag), Just(tags).prop_shuffle())
    })
}

proptest! {
    #[test]
    fn solutions_earn_full_credit(dag in random_dag()) {
        let none = Groups::new();
        let solution = solve_dag(&dag, &none).unwrap();
        let slots: Vec<Option<&str>> = solution.iter().map(|tag| Some(tag.as_str())).collect();
        prop_assert_eq!(grade_dag(&slots, &dag, &none).unwrap(), (dag.len(), dag.len()));
        prop_assert_eq!(lcs_partial_credit(&slots, &dag, &none).unwrap().distance(), 0);
    }

    #[test]
    fn permutations_score_within_bounds((dag, permutation) in dag_and_permutation()) {
        let none = Groups::new();
        let slots: Vec<Option<&str>> = permutation.iter().map(|tag| Some(tag.as_str())).collect();
        let (prefix, total) = grade_dag(&slots, &dag, &none).unwrap();
        prop_assert!(prefix <= slots.len());
        let distance = lcs_partial_credit(&slots, &dag, &none).unwrap();
        let score = distance.score(total);
        prop_assert!((0.0..=1.0).contains(&score));
        prop_assert_eq!(distance.distance() == 0, prefix == total);
        prop_assert_eq!(distance.deletions, distance.insertions);
    }
}

//! Hopcroft partition refinement.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::trace;

use crate::automaton::Dfa;

/// Minimal DFA accepting the same language.
///
/// Unreachable states are dropped first. Undefined transitions go to an
/// implicit dead state, so the result is always total. States are named
/// `q0, q1, …` in breadth-first order from the start state.
pub fn minimize(dfa: &Dfa) -> Dfa {
    let alphabet: Vec<char> = dfa.alphabet.iter().copied().collect();
    let order: Vec<&str> = dfa.reachable();
    let index: BTreeMap<&str, usize> = order.iter().enumerate().map(|(i, s)| (*s, i)).collect();

    let dead = order.len();
    let mut needs_dead = false;
    let mut delta: Vec<Vec<usize>> = order
        .iter()
        .map(|state| {
            alphabet
                .iter()
                .map(|symbol| {
                    match dfa.next(state, *symbol).and_then(|next| index.get(next)) {
                        Some(next) => *next,
                        None => {
                            needs_dead = true;
                            dead
                        }
                    }
                })
                .collect()
        })
        .collect();
    let mut accepting: Vec<bool> = order.iter().map(|state| dfa.is_final(state)).collect();
    if needs_dead {
        delta.push(vec![dead; alphabet.len()]);
        accepting.push(false);
    }

    let blocks = refine(&delta, &accepting, alphabet.len());
    let mut block_of = vec![0; delta.len()];
    for (id, block) in blocks.iter().enumerate() {
        for state in block {
            block_of[*state] = id;
        }
    }

    // Renumber blocks breadth-first so equal languages give equal names.
    let mut names: BTreeMap<usize, String> = BTreeMap::new();
    let mut queue = VecDeque::from([block_of[0]]);
    names.insert(block_of[0], "q0".to_string());
    let mut transitions: BTreeMap<String, BTreeMap<char, String>> = BTreeMap::new();
    let mut final_states = BTreeSet::new();
    while let Some(block) = queue.pop_front() {
        let Some(representative) = blocks[block].iter().next().copied() else {
            continue;
        };
        let name = names.get(&block).cloned().unwrap_or_default();
        if accepting[representative] {
            final_states.insert(name.clone());
        }
        let mut row = BTreeMap::new();
        for (a, symbol) in alphabet.iter().enumerate() {
            let target = block_of[delta[representative][a]];
            let next_id = names.len();
            let target_name = names
                .entry(target)
                .or_insert_with(|| {
                    queue.push_back(target);
                    format!("q{next_id}")
                })
                .clone();
            row.insert(*symbol, target_name);
        }
        transitions.insert(name, row);
    }
    trace!(before = dfa.states.len(), after = names.len(), "minimized");

    Dfa {
        states: names.into_values().collect(),
        alphabet: dfa.alphabet.clone(),
        transitions,
        initial_state: "q0".to_string(),
        final_states,
        dump_state: None,
    }
}

/// Coarsest partition of `0..delta.len()` compatible with `accepting` and `delta`.
fn refine(delta: &[Vec<usize>], accepting: &[bool], symbols: usize) -> Vec<BTreeSet<usize>> {
    let mut inverse: Vec<Vec<Vec<usize>>> = vec![vec![Vec::new(); delta.len()]; symbols];
    for (state, row) in delta.iter().enumerate() {
        for (a, target) in row.iter().enumerate() {
            inverse[a][*target].push(state);
        }
    }

    let (finals, others): (BTreeSet<usize>, BTreeSet<usize>) =
        (0..delta.len()).partition(|state| accepting[*state]);
    let mut work = Vec::new();
    if !finals.is_empty() && !others.is_empty() {
        work.push(if finals.len() <= others.len() {
            finals.clone()
        } else {
            others.clone()
        });
    }
    let mut partition: Vec<BTreeSet<usize>> =
        [finals, others].into_iter().filter(|block| !block.is_empty()).collect();

    while let Some(splitter) = work.pop() {
        for a in 0..symbols {
            let preimage: BTreeSet<usize> = splitter
                .iter()
                .flat_map(|state| inverse[a][*state].iter().copied())
                .collect();
            if preimage.is_empty() {
                continue;
            }
            let mut next = Vec::with_capacity(partition.len() + 1);
            for block in partition.drain(..) {
                let (inside, outside): (BTreeSet<usize>, BTreeSet<usize>) =
                    block.iter().copied().partition(|state| preimage.contains(state));
                if inside.is_empty() || outside.is_empty() {
                    next.push(block);
                    continue;
                }
                if let Some(pos) = work.iter().position(|pending| *pending == block) {
                    work.swap_remove(pos);
                    work.push(inside.clone());
                    work.push(outside.clone());
                } else if inside.len() <= outside.len() {
                    work.push(inside.clone());
                } else {
                    work.push(outside.clone());
                }
                next.push(inside);
                next.push(outside);
            }
            partition = next;
        }
    }
    partition
}

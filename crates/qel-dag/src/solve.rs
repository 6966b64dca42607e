//! Correct orderings and the DAGs behind ranked and ordered grading.

use std::collections::{BTreeMap, BTreeSet};

use qel_core::QelError;

use crate::graph::{Depends, DependencyGraph, Groups};

/// A correct ordering: a topological sort with every group contiguous.
pub fn solve_dag(depends: &Depends, groups: &Groups) -> Result<Vec<String>, QelError> {
    let graph = DependencyGraph::from_depends(depends, groups)?;
    Ok(solve_graph(&graph))
}

/// Slides each group's members left next to its first member. Edges never
/// cross group boundaries, so the sort stays valid.
pub fn solve_graph(graph: &DependencyGraph) -> Vec<String> {
    let mut sort = graph.topological_sort();
    let group_tags: BTreeSet<&str> = graph.groups().values().map(String::as_str).collect();
    for group in group_tags {
        let (members, rest): (Vec<String>, Vec<String>) = sort
            .iter()
            .cloned()
            .partition(|tag| graph.group_of(tag) == Some(group));
        let Some(start) = members
            .first()
            .and_then(|first| sort.iter().position(|tag| tag == first))
        else {
            continue;
        };
        sort = rest[..start]
            .iter()
            .chain(&members)
            .chain(&rest[start..])
            .cloned()
            .collect();
    }
    sort
}

/// Every block depends on all blocks of the previous distinct rank.
///
/// Blocks of equal rank may appear in any order among themselves.
pub fn build_ranking_dag(ranked: &[(String, i64)]) -> Depends {
    let mut sorted: Vec<&(String, i64)> = ranked.iter().collect();
    sorted.sort_by_key(|(_, rank)| *rank);
    let mut by_rank: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    for (tag, rank) in &sorted {
        by_rank.entry(*rank).or_default().push(tag.clone());
    }
    let mut depends = Depends::new();
    let mut current: Vec<String> = Vec::new();
    let mut previous: Option<i64> = None;
    for (tag, rank) in sorted {
        if let Some(prev) = previous.filter(|prev| prev != rank) {
            current = by_rank.get(&prev).cloned().unwrap_or_default();
        }
        depends.insert(tag.clone(), current.clone());
        previous = Some(*rank);
    }
    depends
}

/// A chain: each block ranks one after the block before it.
pub fn build_ordered_dag(tags: &[String]) -> Depends {
    let ranked: Vec<(String, i64)> = tags
        .iter()
        .zip(0_i64..)
        .map(|(tag, rank)| (tag.clone(), rank))
        .collect();
    build_ranking_dag(&ranked)
}

//! Edit-distance partial credit.
//!
//! Only deletions and insertions count. Distractors and repeated blocks are
//! deleted outright; the remaining deletions are a minimum vertex cover of
//! the problematic subgraph, i.e. the blocks that are out of order or that
//! split a block group. Once those are gone, insertions fill in the rest.

use std::collections::{BTreeMap, BTreeSet};

use qel_core::QelError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::graph::{Depends, DependencyGraph, Groups};
use crate::prefix::{group_sizes, grouping_break};

/// Largest problematic subgraph whose vertex cover is searched exhaustively.
pub const MVC_EXACT_LIMIT: usize = 16;

/// Score ceiling when the cover was approximated.
pub const APPROXIMATE_SCORE_CAP: f64 = 0.5;

/// Edits that turn a submission into some correct ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditDistance {
    /// Blocks to remove.
    pub deletions: usize,
    /// Blocks to add.
    pub insertions: usize,
    /// Whether the cover came from the 2-approximation.
    pub approximate: bool,
}

impl EditDistance {
    /// Total number of edits.
    pub fn distance(&self) -> usize {
        self.deletions + self.insertions
    }

    /// `1 - distance / total` clamped to `[0, 1]`, capped at
    /// [`APPROXIMATE_SCORE_CAP`] for approximate distances.
    pub fn score(&self, total: usize) -> f64 {
        if total == 0 {
            return if self.distance() == 0 { 1.0 } else { 0.0 };
        }
        let raw = (1.0 - self.distance() as f64 / total as f64).clamp(0.0, 1.0);
        if self.approximate {
            raw.min(APPROXIMATE_SCORE_CAP)
        } else {
            raw
        }
    }
}

/// Edit distance from `order` to the nearest correct ordering.
pub fn lcs_partial_credit(
    order: &[Option<&str>],
    depends: &Depends,
    groups: &Groups,
) -> Result<EditDistance, QelError> {
    let graph = DependencyGraph::from_depends(depends, groups)?;
    Ok(edit_distance(order, &graph, MVC_EXACT_LIMIT))
}

/// Edit distance against a built graph; covers over more than `exact_limit`
/// blocks are approximated.
pub fn edit_distance(
    order: &[Option<&str>],
    graph: &DependencyGraph,
    exact_limit: usize,
) -> EditDistance {
    let mut used = BTreeSet::new();
    let kept: Vec<&str> = order
        .iter()
        .flatten()
        .copied()
        .filter(|tag| graph.contains(tag) && used.insert(*tag))
        .collect();
    let closure = graph.transitive_closure();
    let problem = Problematic::build(&kept, &closure, graph.groups());
    let (cover, approximate) = if problem.nodes.is_empty() {
        (0, false)
    } else if problem.nodes.len() <= exact_limit {
        (problem.exact_cover(&kept, graph.groups()), false)
    } else {
        warn!(
            problematic = problem.nodes.len(),
            exact_limit, "vertex cover approximated"
        );
        (problem.approximate_cover(&kept, graph.groups()), true)
    };
    let deletions = order.len() - kept.len() + cover;
    let insertions = graph.len().saturating_sub(kept.len() - cover);
    debug!(
        problematic = problem.nodes.len(),
        deletions, insertions, approximate, "edit distance"
    );
    EditDistance {
        deletions,
        insertions,
        approximate,
    }
}

#[derive(Default)]
struct Problematic<'a> {
    nodes: Vec<&'a str>,
    edges: Vec<(&'a str, &'a str)>,
}

impl<'a> Problematic<'a> {
    fn build(kept: &[&'a str], closure: &BTreeMap<&str, BTreeSet<&str>>, groups: &Groups) -> Self {
        let mut problem = Self::default();
        for (position, later) in kept.iter().enumerate() {
            for earlier in &kept[..position] {
                if closure.get(later).is_some_and(|reach| reach.contains(earlier)) {
                    problem.insert(*later);
                    problem.insert(*earlier);
                    problem.edges.push((*later, *earlier));
                }
            }
        }
        for first in 0..kept.len() {
            let Some(group) = groups.get(kept[first]) else {
                continue;
            };
            for last in first + 2..kept.len() {
                if groups.get(kept[last]) != Some(group) {
                    continue;
                }
                let span = &kept[first..=last];
                if !span.iter().all(|tag| groups.get(*tag) == Some(group)) {
                    for tag in span {
                        problem.insert(*tag);
                    }
                }
            }
        }
        problem
    }

    fn insert(&mut self, tag: &'a str) {
        if !self.nodes.contains(&tag) {
            self.nodes.push(tag);
        }
    }

    /// Whether deleting `removed` orders every edge and reunites every group.
    fn resolves(&self, removed: &BTreeSet<&str>, kept: &[&str], groups: &Groups) -> bool {
        if !self
            .edges
            .iter()
            .all(|(a, b)| removed.contains(a) || removed.contains(b))
        {
            return false;
        }
        grouping_holds(&without(kept, removed), groups)
    }

    /// Smallest cover, trying sizes in increasing order.
    fn exact_cover(&self, kept: &[&str], groups: &Groups) -> usize {
        let n = self.nodes.len();
        let fallback = n.saturating_sub(1);
        for size in 1..fallback {
            let mut combo: Vec<usize> = (0..size).collect();
            loop {
                let removed: BTreeSet<&str> = combo.iter().map(|&i| self.nodes[i]).collect();
                if self.resolves(&removed, kept, groups) {
                    return size;
                }
                if !next_combination(&mut combo, n) {
                    break;
                }
            }
        }
        fallback
    }

    /// Endpoints of a maximal matching, then any block still splitting a
    /// group.
    fn approximate_cover(&self, kept: &[&str], groups: &Groups) -> usize {
        let mut removed: BTreeSet<&str> = BTreeSet::new();
        for &(a, b) in &self.edges {
            if !removed.contains(a) && !removed.contains(b) {
                removed.insert(a);
                removed.insert(b);
            }
        }
        loop {
            let edited = without(kept, &removed);
            let index = grouping_break(&edited, groups, &edited_sizes(&edited, groups));
            match edited.get(index).copied().flatten() {
                Some(tag) => {
                    removed.insert(tag);
                }
                None => break,
            }
        }
        removed.len().min(self.nodes.len().saturating_sub(1))
    }
}

fn without<'k>(kept: &[&'k str], removed: &BTreeSet<&str>) -> Vec<Option<&'k str>> {
    kept.iter()
        .filter(|tag| !removed.contains(**tag))
        .map(|tag| Some(*tag))
        .collect()
}

/// Group sizes counted over the blocks that remain.
fn edited_sizes<'g>(edited: &[Option<&str>], groups: &'g Groups) -> BTreeMap<&'g str, usize> {
    group_sizes(
        edited
            .iter()
            .flatten()
            .filter_map(|tag| groups.get(*tag))
            .map(String::as_str),
    )
}

fn grouping_holds(edited: &[Option<&str>], groups: &Groups) -> bool {
    grouping_break(edited, groups, &edited_sizes(edited, groups)) == edited.len()
}

/// Advances `combo` to the next k-subset of `0..n` in lexicographic order.
fn next_combination(combo: &mut [usize], n: usize) -> bool {
    let k = combo.len();
    for i in (0..k).rev() {
        if combo[i] < n - k + i {
            combo[i] += 1;
            for j in i + 1..k {
                combo[j] = combo[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

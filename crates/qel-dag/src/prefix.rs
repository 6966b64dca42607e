//! Longest valid prefix of a submitted ordering.

use std::collections::{BTreeMap, BTreeSet};

use qel_core::QelError;

use crate::graph::{Depends, DependencyGraph, Groups};

/// Index of the first block whose parents do not all occur earlier, or the
/// length of `order` when every block is placed validly.
///
/// Blank slots and tags outside the graph are never valid.
pub fn check_topological_sorting(order: &[Option<&str>], graph: &DependencyGraph) -> usize {
    let mut seen = BTreeSet::new();
    for (index, slot) in order.iter().enumerate() {
        match slot {
            Some(tag) if graph.contains(tag) && graph.parents(tag).all(|p| seen.contains(p)) => {
                seen.insert(*tag);
            }
            _ => return index,
        }
    }
    order.len()
}

/// Index of the first block that breaks a group run, or the length of
/// `order` when every group appears as one contiguous run of its full size.
pub fn check_grouping(order: &[Option<&str>], groups: &Groups) -> usize {
    grouping_break(order, groups, &group_sizes(groups.values().map(String::as_str)))
}

pub(crate) fn group_sizes<'a>(groups: impl Iterator<Item = &'a str>) -> BTreeMap<&'a str, usize> {
    let mut sizes = BTreeMap::new();
    for group in groups {
        *sizes.entry(group).or_insert(0) += 1;
    }
    sizes
}

pub(crate) fn grouping_break(
    order: &[Option<&str>],
    groups: &Groups,
    sizes: &BTreeMap<&str, usize>,
) -> usize {
    let mut current: Option<&str> = None;
    let mut run = 0;
    for (index, slot) in order.iter().enumerate() {
        let group = slot.and_then(|tag| groups.get(tag)).map(String::as_str);
        match group {
            None if current.is_some() => return index,
            None => {}
            Some(group) => {
                if *current.get_or_insert(group) != group {
                    return index;
                }
                run += 1;
                if sizes.get(group) == Some(&run) {
                    current = None;
                    run = 0;
                }
            }
        }
    }
    order.len()
}

/// Shorter of the topological and grouping prefixes.
pub fn valid_prefix(order: &[Option<&str>], graph: &DependencyGraph) -> usize {
    check_topological_sorting(order, graph).min(check_grouping(order, graph.groups()))
}

/// `(prefix_len, total)`: the longest correct prefix and the number of
/// blocks in any correct ordering.
#[tracing::instrument(level = "debug", skip_all, fields(blocks = order.len()))]
pub fn grade_dag(
    order: &[Option<&str>],
    depends: &Depends,
    groups: &Groups,
) -> Result<(usize, usize), QelError> {
    let graph = DependencyGraph::from_depends(depends, groups)?;
    Ok((valid_prefix(order, &graph), graph.len()))
}

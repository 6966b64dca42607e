//! Optional blocks: dependency multigraphs with alternative parent sets.
//!
//! A block whose dependencies are written `A,B|C` may follow either both of
//! `A` and `B`, or `C`. Each choice of alternatives yields an ordinary DAG,
//! reached backwards from a block marked `final`.

use std::collections::{BTreeMap, VecDeque};

use qel_core::QelError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::{dag_error, Depends, DependencyGraph, Groups};
use crate::partial::{edit_distance, EditDistance};
use crate::prefix::check_topological_sorting;

/// Parents of one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dependencies {
    /// Every listed block must come first.
    Plain(Vec<String>),
    /// Exactly one of the parent sets must come first.
    Alternatives(Vec<Vec<String>>),
}

impl Default for Dependencies {
    fn default() -> Self {
        Dependencies::Plain(Vec::new())
    }
}

impl Dependencies {
    /// Reads `A, B` or `A, B | C`. Blank text has no parents.
    pub fn parse(text: &str) -> Self {
        let split = |part: &str| -> Vec<String> {
            part.split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect()
        };
        if text.contains('|') {
            Dependencies::Alternatives(text.split('|').map(split).collect())
        } else {
            Dependencies::Plain(split(text))
        }
    }

    /// Whether the block has alternative parent sets.
    pub fn has_alternatives(&self) -> bool {
        matches!(self, Dependencies::Alternatives(_))
    }
}

/// Dependency multigraph plus the blocks a correct ordering may end on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multigraph {
    /// Parents per block.
    pub depends: BTreeMap<String, Dependencies>,
    /// Sinks to search from.
    pub finals: Vec<String>,
}

/// Best match of a submission over every collapsed DAG.
#[derive(Debug, Clone, PartialEq)]
pub struct MultigraphGrade {
    /// Longest valid prefix.
    pub prefix: usize,
    /// Blocks in the chosen DAG.
    pub total: usize,
    /// Edit distance to the chosen DAG.
    pub distance: EditDistance,
    /// The chosen DAG.
    pub depends: Depends,
}

enum Halt {
    Reached(Depends),
    Split {
        node: String,
        choices: Vec<Vec<String>>,
    },
}

/// Depth-first walk from `start` along parent edges, stopping at the first
/// block with alternatives.
fn dfs_until(graph: &BTreeMap<String, Dependencies>, start: &str) -> Result<Halt, QelError> {
    let mut stack: Vec<(String, Vec<String>)> = vec![(start.to_string(), Vec::new())];
    let mut traversed = Depends::new();
    while let Some((current, mut path)) = stack.pop() {
        let parents = match graph.get(&current) {
            Some(Dependencies::Plain(parents)) => parents,
            Some(Dependencies::Alternatives(choices)) => {
                return Ok(Halt::Split {
                    node: current,
                    choices: choices.clone(),
                })
            }
            None => {
                return Err(dag_error(
                    "unknown-block",
                    format!("Block \"{current}\" is a dependency but is not defined."),
                )
                .with_context("block", current))
            }
        };
        path.push(current.clone());
        traversed.insert(current, parents.clone());
        for parent in parents {
            if path.contains(parent) {
                return Err(dag_error(
                    "multigraph-cycle",
                    "Cycle encountered during collapse of multigraph.",
                )
                .with_context("block", parent));
            }
            stack.push((parent.clone(), path.clone()));
        }
    }
    Ok(Halt::Reached(traversed))
}

/// Every DAG the multigraph encodes, one per choice of alternatives reachable
/// from each final block.
pub fn collapse_multigraph(multigraph: &Multigraph) -> Result<Vec<Depends>, QelError> {
    let mut dags = Vec::new();
    for last in &multigraph.finals {
        let mut queue = VecDeque::from([multigraph.depends.clone()]);
        while let Some(graph) = queue.pop_front() {
            match dfs_until(&graph, last)? {
                Halt::Reached(dag) => dags.push(dag),
                Halt::Split { node, choices } => {
                    for choice in choices {
                        let mut partial = graph.clone();
                        partial.insert(node.clone(), Dependencies::Plain(choice));
                        queue.push_back(partial);
                    }
                }
            }
        }
    }
    debug!(finals = multigraph.finals.len(), dags = dags.len(), "multigraph collapsed");
    Ok(dags)
}

/// A correct ordering for each collapsed DAG.
pub fn solve_multigraph(multigraph: &Multigraph) -> Result<Vec<Vec<String>>, QelError> {
    collapse_multigraph(multigraph)?
        .iter()
        .map(|dag| Ok(DependencyGraph::from_depends(dag, &Groups::new())?.topological_sort()))
        .collect()
}

/// Grades `order` against the collapsed DAG it matches longest.
///
/// Blocks outside a DAG count as misplaced for that DAG.
pub fn grade_multigraph(
    order: &[Option<&str>],
    multigraph: &Multigraph,
    exact_limit: usize,
) -> Result<MultigraphGrade, QelError> {
    let mut best: Option<(usize, DependencyGraph, Depends)> = None;
    for dag in collapse_multigraph(multigraph)? {
        let graph = DependencyGraph::from_depends(&dag, &Groups::new())?;
        let masked: Vec<Option<&str>> = order
            .iter()
            .map(|slot| slot.filter(|tag| graph.contains(tag)))
            .collect();
        let prefix = check_topological_sorting(&masked, &graph);
        if best.as_ref().map_or(true, |(top, ..)| prefix > *top) {
            best = Some((prefix, graph, dag));
        }
    }
    let (prefix, graph, depends) = best.ok_or_else(|| {
        dag_error(
            "missing-final",
            "Use of optional lines requires 'final' attributes on all true blocks that appear at the end of a valid ordering.",
        )
    })?;
    Ok(MultigraphGrade {
        prefix,
        total: graph.len(),
        distance: edit_distance(order, &graph, exact_limit),
        depends,
    })
}

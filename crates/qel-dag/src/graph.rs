//! Dependency graph over block tags with block-group injection.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use qel_core::QelError;
use tracing::debug;

/// `tag -> parents`, as authored. Group tags may appear as keys and parents.
pub type Depends = BTreeMap<String, Vec<String>>;

/// `tag -> group tag` for blocks inside a block group.
pub type Groups = BTreeMap<String, String>;

/// Message shown when a grouped block depends on something outside its group.
pub const GROUP_BOUNDARY_MESSAGE: &str =
    "Blocks within in a group are not allowed to depend on blocks outside their group.";

/// Message shown when the dependencies contain a cycle.
pub const NOT_A_DAG_MESSAGE: &str =
    "Dependency between blocks does not form a Directed Acyclic Graph; Problem unsolvable.";

/// Directed acyclic graph with edges pointing parent to child.
///
/// Group tags are resolved away on construction: members inherit the
/// group's parents and dependents of the group depend on every member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    nodes: Vec<String>,
    parents: BTreeMap<String, BTreeSet<String>>,
    children: BTreeMap<String, BTreeSet<String>>,
    groups: Groups,
}

impl DependencyGraph {
    /// Builds the graph, resolving groups and rejecting cycles.
    pub fn from_depends(depends: &Depends, groups: &Groups) -> Result<Self, QelError> {
        let mut graph = Self::default();
        for (node, parents) in depends {
            graph.add_node(node);
            for parent in parents {
                graph.add_edge(parent, node);
            }
        }
        graph.inject_groups(groups)?;
        graph.ensure_acyclic()?;
        debug!(nodes = graph.len(), groups = graph.group_count(), "dependency graph built");
        Ok(graph)
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no blocks.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Blocks in first-seen order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.iter().map(String::as_str)
    }

    /// Whether `tag` is a block of the graph.
    pub fn contains(&self, tag: &str) -> bool {
        self.parents.contains_key(tag)
    }

    /// Direct parents of `tag`.
    pub fn parents(&self, tag: &str) -> impl Iterator<Item = &str> + '_ {
        self.parents
            .get(tag)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Group of `tag`, if it belongs to one.
    pub fn group_of(&self, tag: &str) -> Option<&str> {
        self.groups.get(tag).map(String::as_str)
    }

    /// Group membership the graph was built with.
    pub fn groups(&self) -> &Groups {
        &self.groups
    }

    fn group_count(&self) -> usize {
        self.groups.values().collect::<BTreeSet<_>>().len()
    }

    /// Every block reachable from each block, excluding itself.
    pub fn transitive_closure(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut closure = BTreeMap::new();
        for node in self.nodes() {
            let mut reached = BTreeSet::new();
            let mut stack = vec![node];
            while let Some(current) = stack.pop() {
                for child in self.children.get(current).into_iter().flatten() {
                    if reached.insert(child.as_str()) {
                        stack.push(child.as_str());
                    }
                }
            }
            closure.insert(node, reached);
        }
        closure
    }

    /// Kahn ordering; ties resolve in first-seen order.
    pub fn topological_sort(&self) -> Vec<String> {
        let mut pending: BTreeMap<&str, usize> = self
            .nodes()
            .map(|node| (node, self.parents.get(node).map_or(0, BTreeSet::len)))
            .collect();
        let mut ready: VecDeque<&str> = self
            .nodes()
            .filter(|node| pending.get(node) == Some(&0))
            .collect();
        let mut sorted = Vec::with_capacity(self.len());
        while let Some(node) = ready.pop_front() {
            sorted.push(node.to_string());
            for child in self.children.get(node).into_iter().flatten() {
                if let Some(count) = pending.get_mut(child.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push_back(child.as_str());
                    }
                }
            }
        }
        sorted
    }

    fn add_node(&mut self, tag: &str) {
        if !self.parents.contains_key(tag) {
            self.nodes.push(tag.to_string());
            self.parents.insert(tag.to_string(), BTreeSet::new());
            self.children.insert(tag.to_string(), BTreeSet::new());
        }
    }

    fn add_edge(&mut self, parent: &str, child: &str) {
        self.add_node(parent);
        self.add_node(child);
        if let Some(set) = self.parents.get_mut(child) {
            set.insert(parent.to_string());
        }
        if let Some(set) = self.children.get_mut(parent) {
            set.insert(child.to_string());
        }
    }

    fn remove_node(&mut self, tag: &str) {
        self.nodes.retain(|node| node != tag);
        for parent in self.parents.remove(tag).into_iter().flatten() {
            if let Some(set) = self.children.get_mut(&parent) {
                set.remove(tag);
            }
        }
        for child in self.children.remove(tag).into_iter().flatten() {
            if let Some(set) = self.parents.get_mut(&child) {
                set.remove(tag);
            }
        }
    }

    fn validate_grouping(&self, groups: &Groups) -> Result<(), QelError> {
        for node in self.nodes() {
            let group = groups.get(node);
            if let Some(parent) = self.parents(node).find(|parent| groups.get(*parent) != group) {
                return Err(dag_error("group-boundary", GROUP_BOUNDARY_MESSAGE)
                    .with_context("block", node)
                    .with_context("depends-on", parent));
            }
        }
        Ok(())
    }

    fn inject_groups(&mut self, groups: &Groups) -> Result<(), QelError> {
        self.validate_grouping(groups)?;
        let mut members: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (block, group) in groups {
            members.entry(group.as_str()).or_default().push(block.as_str());
        }
        for (group, blocks) in &members {
            let inherited: Vec<String> = self.parents(group).map(str::to_string).collect();
            for parent in &inherited {
                for block in blocks {
                    self.add_edge(parent, block);
                }
            }
        }
        let snapshot: Vec<String> = self.nodes.clone();
        for node in &snapshot {
            let on_groups: Vec<&str> = self
                .parents(node)
                .filter_map(|parent| members.get_key_value(parent).map(|(key, _)| *key))
                .collect();
            for group in on_groups {
                for block in &members[group] {
                    self.add_edge(block, node);
                }
            }
        }
        for group in members.keys() {
            self.remove_node(group);
        }
        self.groups = groups.clone();
        Ok(())
    }

    fn ensure_acyclic(&self) -> Result<(), QelError> {
        let mut states: BTreeMap<&str, VisitState> = self
            .nodes()
            .map(|node| (node, VisitState::NotVisited))
            .collect();
        for node in self.nodes() {
            if dfs(node, &self.children, &mut states) {
                return Err(dag_error("not-a-dag", NOT_A_DAG_MESSAGE).with_context("block", node));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    NotVisited,
    Visiting,
    Visited,
}

fn dfs<'a>(
    node: &'a str,
    adjacency: &'a BTreeMap<String, BTreeSet<String>>,
    states: &mut BTreeMap<&'a str, VisitState>,
) -> bool {
    match states.get(node).copied().unwrap_or(VisitState::NotVisited) {
        VisitState::Visiting => true,
        VisitState::Visited => false,
        VisitState::NotVisited => {
            states.insert(node, VisitState::Visiting);
            if let Some(neighbours) = adjacency.get(node) {
                for neighbour in neighbours {
                    if dfs(neighbour, adjacency, states) {
                        return true;
                    }
                }
            }
            states.insert(node, VisitState::Visited);
            false
        }
    }
}

pub(crate) fn dag_error(code: impl Into<String>, message: impl Into<String>) -> QelError {
    QelError::authoring(code, message)
}

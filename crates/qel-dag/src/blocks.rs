//! Order-blocks grading: the scoring rules and feedback behind
//! `pl-order-blocks`.

use std::collections::BTreeMap;

use qel_core::QelError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use crate::graph::{dag_error, Depends, DependencyGraph, Groups};
use crate::multigraph::{grade_multigraph, solve_multigraph, Dependencies, Multigraph};
use crate::partial::{edit_distance, MVC_EXACT_LIMIT};
use crate::prefix::valid_prefix;
use crate::solve::{build_ordered_dag, build_ranking_dag, solve_graph};

/// Feedback when every placed block is right but some are missing.
pub const INCOMPLETE: &str = "Your answer is correct so far, but it is incomplete.";

/// How a submitted ordering is judged.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GradingMethod {
    /// Any order; only the selection matters.
    Unordered,
    /// Exactly the authored order.
    #[default]
    Ordered,
    /// Blocks sorted by non-decreasing rank.
    Ranking,
    /// Any topological sort of the dependency graph.
    Dag,
}

/// Credit for orderings that are not fully correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PartialCredit {
    /// All or nothing.
    None,
    /// Edit-distance credit.
    Lcs,
}

impl PartialCredit {
    /// `None` for ordered grading, `Lcs` otherwise.
    pub fn default_for(method: GradingMethod) -> Self {
        match method {
            GradingMethod::Ordered => PartialCredit::None,
            _ => PartialCredit::Lcs,
        }
    }
}

/// How much the learner is told about a wrong ordering.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackMode {
    /// Score only.
    #[default]
    None,
    /// Point at the first misplaced block.
    FirstWrong,
    /// Also say when that block is a distractor.
    FirstWrongVerbose,
}

/// One block as placed by the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedBlock {
    /// Block tag.
    pub tag: String,
    /// Indentation depth, when indentation is tracked.
    #[serde(default)]
    pub indent: Option<u32>,
    /// Whether the block belongs to no correct answer.
    #[serde(default)]
    pub distractor: bool,
}

impl SubmittedBlock {
    /// Unindented block that is not a distractor.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            indent: None,
            distractor: false,
        }
    }
}

/// One block of the reference answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceBlock {
    /// Block tag.
    pub tag: String,
    /// Blocks that must come first.
    #[serde(default)]
    pub depends: Dependencies,
    /// Block group the block belongs to.
    #[serde(default)]
    pub group: Option<String>,
    /// Dependencies of the block's group, if authored on this block.
    #[serde(default)]
    pub group_depends: Option<Vec<String>>,
    /// Rank for ranking grading.
    #[serde(default)]
    pub ranking: Option<i64>,
    /// Required indentation; `None` accepts any.
    #[serde(default)]
    pub indent: Option<u32>,
    /// Whether a correct ordering may end on this block.
    #[serde(default, rename = "final")]
    pub is_final: bool,
}

impl ReferenceBlock {
    /// Block with no dependencies.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }
}

/// Grading settings of one order-blocks element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBlocksOptions {
    /// Grading method.
    pub method: GradingMethod,
    /// Partial-credit rule.
    pub partial_credit: PartialCredit,
    /// Feedback detail.
    pub feedback: FeedbackMode,
    /// Whether indentation is graded.
    pub indentation: bool,
    /// Largest problematic subgraph solved exactly.
    pub mvc_exact_limit: usize,
}

impl OrderBlocksOptions {
    /// Defaults for `method`.
    pub fn new(method: GradingMethod) -> Self {
        Self {
            method,
            partial_credit: PartialCredit::default_for(method),
            feedback: FeedbackMode::None,
            indentation: false,
            mvc_exact_limit: MVC_EXACT_LIMIT,
        }
    }

    /// Rejects settings and reference blocks that cannot be graded together.
    pub fn validate(&self, reference: &[ReferenceBlock]) -> Result<(), QelError> {
        if reference.is_empty() {
            return Err(dag_error(
                "no-correct-blocks",
                "There are no correct answers specified for this question.",
            ));
        }
        if !matches!(self.method, GradingMethod::Dag | GradingMethod::Ranking)
            && self.feedback != FeedbackMode::None
        {
            return Err(dag_error(
                "feedback-not-allowed",
                format!(
                    "feedback type {} is not available with the {} grading-method.",
                    self.feedback, self.method
                ),
            ));
        }
        let optional = has_optional_blocks(reference);
        for block in reference {
            if block.group.is_some() && self.method != GradingMethod::Dag {
                return Err(dag_error(
                    "group-not-allowed",
                    "Block groups only supported in the \"dag\" grading mode.",
                )
                .with_context("block", &block.tag));
            }
            if block.group.is_some() && optional {
                return Err(dag_error(
                    "group-not-allowed",
                    "Block groups not supported with the optional-lines feature.",
                )
                .with_context("block", &block.tag));
            }
            if block.indent.is_some() && !self.indentation {
                return Err(dag_error(
                    "indent-not-allowed",
                    "Blocks should not specify indentation if indentation is disabled.",
                )
                .with_context("block", &block.tag));
            }
            if self.method == GradingMethod::Ranking && block.ranking.is_none() {
                return Err(dag_error(
                    "missing-ranking",
                    "Every correct block needs a ranking in the ranking grading mode.",
                )
                .with_context("block", &block.tag));
            }
        }
        if optional && self.method == GradingMethod::Dag && !reference.iter().any(|b| b.is_final) {
            return Err(dag_error(
                "missing-final",
                "Use of optional lines requires 'final' attributes on all true blocks that appear at the end of a valid ordering.",
            ));
        }
        Ok(())
    }
}

/// Score and feedback for one ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct BlocksGrade {
    /// Score rounded to two decimals.
    pub score: f64,
    /// Feedback text, when the feedback mode produced any.
    pub feedback: Option<String>,
    /// Zero-based index of the first misplaced block.
    pub first_wrong: Option<usize>,
}

/// Whether any block has alternative dependencies.
pub fn has_optional_blocks(reference: &[ReferenceBlock]) -> bool {
    reference.iter().any(|block| block.depends.has_alternatives())
}

/// Dependencies and groups `method` grades against.
pub fn build_grading_dag(
    reference: &[ReferenceBlock],
    method: GradingMethod,
) -> Result<(Depends, Groups), QelError> {
    match method {
        GradingMethod::Dag => {
            let mut depends = Depends::new();
            let mut groups = Groups::new();
            for block in reference {
                if let Dependencies::Plain(parents) = &block.depends {
                    depends.insert(block.tag.clone(), parents.clone());
                }
                if let Some(group) = &block.group {
                    groups.insert(block.tag.clone(), group.clone());
                    if let Some(parents) = &block.group_depends {
                        depends.insert(group.clone(), parents.clone());
                    }
                }
            }
            Ok((depends, groups))
        }
        GradingMethod::Ranking => {
            let ranked = reference
                .iter()
                .map(|block| {
                    block.ranking.map(|rank| (block.tag.clone(), rank)).ok_or_else(|| {
                        dag_error("missing-ranking", "Block has no ranking.")
                            .with_context("block", &block.tag)
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((build_ranking_dag(&ranked), Groups::new()))
        }
        GradingMethod::Ordered => {
            let tags: Vec<String> = reference.iter().map(|block| block.tag.clone()).collect();
            Ok((build_ordered_dag(&tags), Groups::new()))
        }
        GradingMethod::Unordered => Err(QelError::internal(
            "no-grading-dag",
            "unordered grading has no dependency graph",
        )),
    }
}

fn multigraph_of(reference: &[ReferenceBlock]) -> Multigraph {
    Multigraph {
        depends: reference
            .iter()
            .map(|block| (block.tag.clone(), block.depends.clone()))
            .collect(),
        finals: reference
            .iter()
            .filter(|block| block.is_final)
            .map(|block| block.tag.clone())
            .collect(),
    }
}

/// Reference tags in an order that earns full marks.
pub fn solve_order_blocks(
    reference: &[ReferenceBlock],
    method: GradingMethod,
) -> Result<Vec<String>, QelError> {
    match method {
        GradingMethod::Unordered | GradingMethod::Ordered => {
            Ok(reference.iter().map(|block| block.tag.clone()).collect())
        }
        GradingMethod::Dag if has_optional_blocks(reference) => {
            let solutions = solve_multigraph(&multigraph_of(reference))?;
            solutions.into_iter().next().ok_or_else(|| {
                dag_error("missing-final", "No correct ordering ends on a final block.")
            })
        }
        GradingMethod::Ranking | GradingMethod::Dag => {
            let (depends, groups) = build_grading_dag(reference, method)?;
            Ok(solve_graph(&DependencyGraph::from_depends(&depends, &groups)?))
        }
    }
}

/// Grades `submission` against `reference`.
#[tracing::instrument(level = "debug", skip_all, fields(method = %options.method, blocks = submission.len()))]
pub fn grade_order_blocks(
    submission: &[SubmittedBlock],
    reference: &[ReferenceBlock],
    options: &OrderBlocksOptions,
) -> Result<BlocksGrade, QelError> {
    options.validate(reference)?;
    let expected: BTreeMap<&str, &ReferenceBlock> = reference
        .iter()
        .map(|block| (block.tag.as_str(), block))
        .collect();
    let slots: Vec<Option<&str>> = submission
        .iter()
        .map(|block| {
            let misindented = options.indentation
                && expected
                    .get(block.tag.as_str())
                    .and_then(|reference| reference.indent)
                    .is_some_and(|indent| block.indent != Some(indent));
            (!misindented).then_some(block.tag.as_str())
        })
        .collect();

    if options.method == GradingMethod::Unordered {
        let score = unordered_score(&slots, reference);
        return Ok(BlocksGrade {
            score: round2(score),
            feedback: None,
            first_wrong: None,
        });
    }

    let (prefix, total, distance, has_groups) =
        if options.method == GradingMethod::Dag && has_optional_blocks(reference) {
            let grade = grade_multigraph(&slots, &multigraph_of(reference), options.mvc_exact_limit)?;
            (grade.prefix, grade.total, grade.distance, false)
        } else {
            let (depends, groups) = build_grading_dag(reference, options.method)?;
            let graph = DependencyGraph::from_depends(&depends, &groups)?;
            let distance = edit_distance(&slots, &graph, options.mvc_exact_limit);
            (valid_prefix(&slots, &graph), graph.len(), distance, !groups.is_empty())
        };

    let score = match options.partial_credit {
        PartialCredit::None if prefix == total && slots.len() == total => 1.0,
        PartialCredit::None => 0.0,
        PartialCredit::Lcs => distance.score(total),
    };
    let score = round2(score);
    let first_wrong = (prefix != slots.len()).then_some(prefix);
    debug!(prefix, total, score, ?first_wrong, "order blocks graded");

    let feedback = if score < 1.0 {
        let is_distractor = first_wrong
            .and_then(|index| submission.get(index))
            .is_some_and(|block| block.distractor || !expected.contains_key(block.tag.as_str()));
        construct_feedback(
            options.feedback,
            first_wrong,
            has_groups,
            options.indentation,
            is_distractor,
        )
    } else {
        None
    };
    Ok(BlocksGrade {
        score,
        feedback,
        first_wrong,
    })
}

/// `(correct - incorrect) / |reference|`, floored at zero. Each reference
/// block is matched at most once.
fn unordered_score(slots: &[Option<&str>], reference: &[ReferenceBlock]) -> f64 {
    let mut remaining: BTreeMap<&str, usize> = BTreeMap::new();
    for block in reference {
        *remaining.entry(block.tag.as_str()).or_insert(0) += 1;
    }
    let correct = slots
        .iter()
        .flatten()
        .filter(|tag| match remaining.get_mut(**tag) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        })
        .count();
    let incorrect = slots.len() - correct;
    ((correct as f64 - incorrect as f64) / reference.len() as f64).max(0.0)
}

fn round2(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

/// Learner feedback for an ordering that did not earn full marks.
pub fn construct_feedback(
    mode: FeedbackMode,
    first_wrong: Option<usize>,
    has_groups: bool,
    indentation: bool,
    first_wrong_is_distractor: bool,
) -> Option<String> {
    if mode == FeedbackMode::None {
        return None;
    }
    let Some(index) = first_wrong else {
        return Some(INCOMPLETE.to_string());
    };
    let number = index + 1;
    if mode == FeedbackMode::FirstWrongVerbose && first_wrong_is_distractor {
        return Some(format!(
            "Your answer is incorrect starting at block number {number} as the block at that location is not a part of any correct solution."
        ));
    }
    let mut feedback = format!(
        "Your answer is incorrect starting at block number {number}. The problem is most likely one of the following:\n\
         - This block is not a part of the correct solution\n\
         - This block needs to come after a block that did not appear before it"
    );
    if indentation {
        feedback.push_str("\n- This line is indented incorrectly");
    }
    if has_groups {
        feedback.push_str(
            "\n- You have attempted to start a new section of the answer without finishing the previous section",
        );
    }
    Some(feedback)
}

#![deny(missing_docs)]
#![doc = "Partial-order grading for block orderings: dependency DAGs, block groups, optional blocks and edit-distance partial credit."]

pub mod blocks;
pub mod graph;
pub mod multigraph;
pub mod partial;
pub mod prefix;
pub mod solve;

pub use blocks::{
    build_grading_dag, construct_feedback, grade_order_blocks, has_optional_blocks,
    solve_order_blocks, BlocksGrade, FeedbackMode, GradingMethod, OrderBlocksOptions,
    PartialCredit, ReferenceBlock, SubmittedBlock, INCOMPLETE,
};
pub use graph::{Depends, DependencyGraph, Groups, GROUP_BOUNDARY_MESSAGE, NOT_A_DAG_MESSAGE};
pub use multigraph::{
    collapse_multigraph, grade_multigraph, solve_multigraph, Dependencies, Multigraph,
    MultigraphGrade,
};
pub use partial::{
    edit_distance, lcs_partial_credit, EditDistance, APPROXIMATE_SCORE_CAP, MVC_EXACT_LIMIT,
};
pub use prefix::{check_grouping, check_topological_sorting, grade_dag, valid_prefix};
pub use solve::{build_ordered_dag, build_ranking_dag, solve_dag, solve_graph};

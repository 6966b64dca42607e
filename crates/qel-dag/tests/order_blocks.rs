use qel_core::QelError;
use qel_dag::{
    collapse_multigraph, grade_order_blocks, solve_order_blocks, Dependencies, FeedbackMode,
    GradingMethod, Multigraph, OrderBlocksOptions, PartialCredit, ReferenceBlock, SubmittedBlock,
    INCOMPLETE,
};

fn reference(entries: &[(&str, &str)]) -> Vec<ReferenceBlock> {
    entries
        .iter()
        .map(|(tag, depends)| ReferenceBlock {
            depends: Dependencies::parse(depends),
            ..ReferenceBlock::new(*tag)
        })
        .collect()
}

fn submit(tags: &[&str]) -> Vec<SubmittedBlock> {
    tags.iter().map(|tag| SubmittedBlock::new(*tag)).collect()
}

fn diamond() -> Vec<ReferenceBlock> {
    reference(&[("A", ""), ("B", "A"), ("C", "A"), ("D", "B, C")])
}

fn dag_options(feedback: FeedbackMode) -> OrderBlocksOptions {
    OrderBlocksOptions {
        feedback,
        ..OrderBlocksOptions::new(GradingMethod::Dag)
    }
}

#[test]
fn ordered_grading_is_all_or_nothing_by_default() {
    let blocks = reference(&[("a", ""), ("b", ""), ("c", "")]);
    let options = OrderBlocksOptions::new(GradingMethod::Ordered);
    assert_eq!(options.partial_credit, PartialCredit::None);

    let right = grade_order_blocks(&submit(&["a", "b", "c"]), &blocks, &options).unwrap();
    assert_eq!(right.score, 1.0);
    assert_eq!(right.feedback, None);

    let wrong = grade_order_blocks(&submit(&["a", "c", "b"]), &blocks, &options).unwrap();
    assert_eq!(wrong.score, 0.0);
    assert_eq!(wrong.first_wrong, Some(1));
    assert_eq!(wrong.feedback, None);
}

#[test]
fn first_wrong_feedback_names_the_block_number() {
    let grade = grade_order_blocks(
        &submit(&["A", "D", "B", "C"]),
        &diamond(),
        &dag_options(FeedbackMode::FirstWrong),
    )
    .unwrap();
    assert_eq!(grade.score, 0.5);
    assert_eq!(grade.first_wrong, Some(1));
    let feedback = grade.feedback.unwrap();
    assert!(feedback.starts_with("Your answer is incorrect starting at block number 2."));
    assert!(feedback.contains("needs to come after a block"));
    assert!(!feedback.contains("new section"));
}

#[test]
fn correct_prefix_reports_incomplete() {
    let grade = grade_order_blocks(
        &submit(&["A", "B"]),
        &diamond(),
        &dag_options(FeedbackMode::FirstWrong),
    )
    .unwrap();
    assert_eq!(grade.score, 0.5);
    assert_eq!(grade.first_wrong, None);
    assert_eq!(grade.feedback.as_deref(), Some(INCOMPLETE));
}

#[test]
fn verbose_feedback_calls_out_distractors() {
    let mut submission = submit(&["A", "X", "B", "C", "D"]);
    submission[1].distractor = true;
    let grade = grade_order_blocks(
        &submission,
        &diamond(),
        &dag_options(FeedbackMode::FirstWrongVerbose),
    )
    .unwrap();
    assert_eq!(grade.score, 0.75);
    assert_eq!(
        grade.feedback.as_deref(),
        Some("Your answer is incorrect starting at block number 2 as the block at that location is not a part of any correct solution.")
    );
}

#[test]
fn unordered_grading_counts_selections() {
    let blocks = reference(&[("a", ""), ("b", ""), ("c", "")]);
    let options = OrderBlocksOptions::new(GradingMethod::Unordered);
    let score = |tags: &[&str]| grade_order_blocks(&submit(tags), &blocks, &options).unwrap().score;
    assert_eq!(score(&["c", "a", "b"]), 1.0);
    assert_eq!(score(&["a", "b", "x"]), 0.33);
    assert_eq!(score(&["x", "y"]), 0.0);
    assert_eq!(score(&["a", "a", "b"]), 0.33);
}

#[test]
fn wrong_indentation_blanks_the_block() {
    let mut blocks = reference(&[("a", ""), ("b", "")]);
    blocks[0].indent = Some(0);
    blocks[1].indent = Some(1);
    let options = OrderBlocksOptions {
        indentation: true,
        ..OrderBlocksOptions::new(GradingMethod::Ordered)
    };
    let mut submission = submit(&["a", "b"]);
    submission[0].indent = Some(0);
    submission[1].indent = Some(0);
    let flat = grade_order_blocks(&submission, &blocks, &options).unwrap();
    assert_eq!(flat.score, 0.0);
    assert_eq!(flat.first_wrong, Some(1));

    submission[1].indent = Some(1);
    assert_eq!(grade_order_blocks(&submission, &blocks, &options).unwrap().score, 1.0);
}

#[test]
fn feedback_requires_dag_or_ranking() {
    let blocks = reference(&[("a", ""), ("b", "")]);
    let options = OrderBlocksOptions {
        feedback: FeedbackMode::FirstWrong,
        ..OrderBlocksOptions::new(GradingMethod::Ordered)
    };
    let err = grade_order_blocks(&submit(&["a", "b"]), &blocks, &options).unwrap_err();
    assert!(matches!(
        &err,
        QelError::Authoring(info)
            if info.code == "feedback-not-allowed"
                && info.message == "feedback type first-wrong is not available with the ordered grading-method."
    ));
}

#[test]
fn ranking_accepts_ties_in_any_order() {
    let mut blocks = reference(&[("a", ""), ("b", ""), ("c", ""), ("d", "")]);
    for (block, rank) in blocks.iter_mut().zip([1, 2, 2, 3]) {
        block.ranking = Some(rank);
    }
    let options = OrderBlocksOptions::new(GradingMethod::Ranking);
    for tags in [["a", "b", "c", "d"], ["a", "c", "b", "d"]] {
        assert_eq!(grade_order_blocks(&submit(&tags), &blocks, &options).unwrap().score, 1.0);
    }
    assert_eq!(
        solve_order_blocks(&blocks, GradingMethod::Ranking).unwrap(),
        vec!["a", "b", "c", "d"]
    );

    blocks[2].ranking = None;
    let err = grade_order_blocks(&submit(&["a"]), &blocks, &options).unwrap_err();
    assert!(matches!(&err, QelError::Authoring(info) if info.code == "missing-ranking"));
}

#[test]
fn split_block_groups_add_the_section_hint() {
    let mut blocks = reference(&[("A", ""), ("B", ""), ("C", "B"), ("E", "A"), ("F", "G")]);
    blocks[1].group = Some("G".into());
    blocks[1].group_depends = Some(vec!["A".into()]);
    blocks[2].group = Some("G".into());
    let grade = grade_order_blocks(
        &submit(&["A", "B", "E", "C", "F"]),
        &blocks,
        &dag_options(FeedbackMode::FirstWrong),
    )
    .unwrap();
    assert_eq!(grade.first_wrong, Some(2));
    assert_eq!(grade.score, 0.6);
    let feedback = grade.feedback.unwrap();
    assert!(feedback.contains("block number 3"));
    assert!(feedback.contains("start a new section of the answer"));
}

fn optional_blocks() -> Vec<ReferenceBlock> {
    let mut blocks = reference(&[("A", ""), ("B", ""), ("C", "A | B")]);
    blocks[2].is_final = true;
    blocks
}

#[test]
fn optional_blocks_accept_either_branch() {
    let blocks = optional_blocks();
    let options = dag_options(FeedbackMode::FirstWrong);
    for tags in [["A", "C"], ["B", "C"]] {
        let grade = grade_order_blocks(&submit(&tags), &blocks, &options).unwrap();
        assert_eq!(grade.score, 1.0);
    }

    let both = grade_order_blocks(&submit(&["A", "B", "C"]), &blocks, &options).unwrap();
    assert_eq!(both.score, 0.5);
    assert_eq!(both.first_wrong, Some(1));

    assert_eq!(
        solve_order_blocks(&blocks, GradingMethod::Dag).unwrap(),
        vec!["A", "C"]
    );
}

#[test]
fn optional_blocks_need_a_final_block() {
    let mut blocks = optional_blocks();
    blocks[2].is_final = false;
    let err =
        grade_order_blocks(&submit(&["A", "C"]), &blocks, &dag_options(FeedbackMode::None))
            .unwrap_err();
    assert!(matches!(&err, QelError::Authoring(info) if info.code == "missing-final"));
}

#[test]
fn multigraph_cycles_are_rejected() {
    let multigraph = Multigraph {
        depends: [
            ("A".to_string(), Dependencies::parse("B")),
            ("B".to_string(), Dependencies::parse("A")),
        ]
        .into_iter()
        .collect(),
        finals: vec!["A".to_string()],
    };
    let err = collapse_multigraph(&multigraph).unwrap_err();
    assert!(matches!(&err, QelError::Authoring(info) if info.code == "multigraph-cycle"));
}

#[test]
fn dependency_text_and_json_forms() {
    assert_eq!(Dependencies::parse(""), Dependencies::Plain(vec![]));
    assert_eq!(
        Dependencies::parse("A, B"),
        Dependencies::Plain(vec!["A".into(), "B".into()])
    );
    assert_eq!(
        Dependencies::parse("A,B|C"),
        Dependencies::Alternatives(vec![vec!["A".into(), "B".into()], vec!["C".into()]])
    );

    let block: ReferenceBlock =
        serde_json::from_str(r#"{"tag": "C", "depends": [["A"], ["B"]], "final": true}"#).unwrap();
    assert!(block.is_final);
    assert!(block.depends.has_alternatives());
    let plain: ReferenceBlock = serde_json::from_str(r#"{"tag": "B", "depends": ["A"]}"#).unwrap();
    assert_eq!(plain.depends, Dependencies::Plain(vec!["A".into()]));
}

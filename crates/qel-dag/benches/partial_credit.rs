use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qel_dag::{build_ordered_dag, edit_distance, grade_dag, DependencyGraph, Groups};

fn partial_credit_bench(c: &mut Criterion) {
    let tags: Vec<String> = (0..24).map(|i| format!("line{i}")).collect();
    let depends = build_ordered_dag(&tags);
    let graph = DependencyGraph::from_depends(&depends, &Groups::new()).unwrap();

    let mut shuffled = tags.clone();
    for pair in 0..6 {
        shuffled.swap(2 * pair, 2 * pair + 1);
    }
    let exact: Vec<Option<&str>> = shuffled.iter().map(|tag| Some(tag.as_str())).collect();

    let mut reversed = tags.clone();
    reversed.reverse();
    let approximate: Vec<Option<&str>> = reversed.iter().map(|tag| Some(tag.as_str())).collect();

    c.bench_function("grade_dag_prefix", |b| {
        b.iter(|| black_box(grade_dag(&exact, &depends, &Groups::new()).unwrap()));
    });
    c.bench_function("edit_distance_exact_cover", |b| {
        b.iter(|| black_box(edit_distance(&exact, &graph, 16)));
    });
    c.bench_function("edit_distance_approximate_cover", |b| {
        b.iter(|| black_box(edit_distance(&approximate, &graph, 16)));
    });
}

criterion_group!(benches, partial_credit_bench);
criterion_main!(benches);

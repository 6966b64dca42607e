use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qel_core::{Attributes, Limits, QuestionData};
use qel_grade::{element_for, run_phase, Phase};
use serde_json::Value;

fn prepared(attrs: &Attributes, raw: &str) -> QuestionData {
    let element = element_for(&attrs.tag).unwrap();
    let mut data = QuestionData::default();
    run_phase(Phase::Prepare, element.as_ref(), attrs, &mut data, &Limits::default()).unwrap();
    data.raw_submitted_answers
        .insert("q".to_string(), Value::String(raw.to_string()));
    data
}

fn lifecycle(c: &mut Criterion, name: &str, attrs: Attributes, raw: &str) {
    let element = element_for(&attrs.tag).unwrap();
    let limits = Limits::default();
    let template = prepared(&attrs, raw);
    c.bench_function(name, |b| {
        b.iter(|| {
            let mut data = template.clone();
            run_phase(Phase::Parse, element.as_ref(), &attrs, &mut data, &limits).unwrap();
            run_phase(Phase::Grade, element.as_ref(), &attrs, &mut data, &limits).unwrap();
            black_box(data.partial_scores)
        });
    });
}

fn element_bench(c: &mut Criterion) {
    lifecycle(
        c,
        "symbolic_parse_and_grade",
        Attributes::new("pl-symbolic-input")
            .with("answers-name", "q")
            .with("variables", "x, y")
            .with("correct-answer", "(x + y)^3"),
        "x^3 + 3*x^2*y + 3*x*y^2 + y^3",
    );
    lifecycle(
        c,
        "big_o_parse_and_grade",
        Attributes::new("pl-big-o-input")
            .with("answers-name", "q")
            .with("correct-answer", "n^2 log(n)"),
        "n^2 log(n) + n",
    );
    lifecycle(
        c,
        "units_parse_and_grade",
        Attributes::new("pl-units-input")
            .with("answers-name", "q")
            .with("correct-answer", "9.81 m/s^2"),
        "981 cm/s^2",
    );
}

criterion_group!(benches, element_bench);
criterion_main!(benches);

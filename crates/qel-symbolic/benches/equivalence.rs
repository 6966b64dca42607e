use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qel_core::Deadline;
use qel_expr::{parse, ParseOptions};
use qel_symbolic::{compare, limit_at_infinity, EquivalenceOptions};

fn equivalence_bench(c: &mut Criterion) {
    let options = ParseOptions::with_variables(["x", "n"]);
    let reference = parse("(x + 1)^6 - (x - 1)^6", &options).unwrap();
    let submitted = parse("12x^5 + 40x^3 + 12x", &options).unwrap();
    let trig = parse("sin(x)^2 + cos(x)^2", &options).unwrap();
    let one = parse("1", &options).unwrap();
    c.bench_function("equivalence_expanded", |b| {
        b.iter(|| {
            let stage = compare(
                &reference,
                &submitted,
                &Deadline::unbounded(),
                &EquivalenceOptions::default(),
            )
            .unwrap();
            black_box(stage);
        });
    });
    c.bench_function("equivalence_numeric", |b| {
        b.iter(|| {
            let stage =
                compare(&trig, &one, &Deadline::unbounded(), &EquivalenceOptions::default())
                    .unwrap();
            black_box(stage);
        });
    });
    let ratio = parse("factorial(n) / (n^3 2^n)", &options).unwrap();
    c.bench_function("limit_factorial_ratio", |b| {
        b.iter(|| {
            black_box(limit_at_infinity(&ratio, "n", &Deadline::unbounded()).unwrap());
        });
    });
}

criterion_group!(benches, equivalence_bench);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qel_expr::{parse, ParseOptions};

fn parse_bench(c: &mut Criterion) {
    let options = ParseOptions::with_variables(["n", "x", "y"]);
    let text = "3 n^2 log(n) + sin(x)**2 + cos(x)**2 - (x + y)(x - y) / (2 + n)";
    c.bench_function("parse_expr_mixed", |b| {
        b.iter(|| {
            let expr = parse(black_box(text), &options).unwrap();
            black_box(expr);
        });
    });
}

criterion_group!(benches, parse_bench);
criterion_main!(benches);

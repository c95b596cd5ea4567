use std::time::Duration;

use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use diceprob::Expr;
use diceprob::Limits;
use diceprob::Strategy;
use num::BigRational;

const COMPLICATED: &str = "(d20 - d12) * 3 + (2d6 > d10) * d8";

fn bench_dist(c: &mut Criterion) {
    let mut group = c.benchmark_group("Distribution");
    group.sample_size(10).measurement_time(Duration::from_secs(5)).warm_up_time(Duration::from_secs(1));
    for s in ["d20+d20+d20+d20+d20+d20+d20+d20+d20+d20+d20", "d20*d20*d20*d20", "d2*10000", COMPLICATED] {
        let expr: Expr = s.parse().unwrap();
        group.bench_function(format!("f64 {s}"), |b| b.iter(|| black_box(expr.dist::<f64>().unwrap())));
    }
    let expr: Expr = COMPLICATED.parse().unwrap();
    group.bench_function("rational", |b| b.iter(|| black_box(expr.dist::<BigRational>().unwrap())));
    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let s = "d30 + (d20*d30*(d20 + d4*d32 + 43) > 17) - 4d6";
    let mut group = c.benchmark_group("Parsing");
    for strategy in [Strategy::Descent, Strategy::Priority] {
        group.bench_function(format!("{strategy:?}"), |b| {
            b.iter(|| black_box(Expr::parse_with(s, strategy, &Limits::default()).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dist, bench_parse);
criterion_main!(benches);

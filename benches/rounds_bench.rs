//! Measure single-trial cost at a reduced configuration.
//!
//! Run with: `cargo bench --bench rounds`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use echelon::sweep::{run_trial, TrialConfig};

fn bench_trial(c: &mut Criterion) {
    let config = TrialConfig {
        capacities: vec![4, 8, 16, 32, 64],
        bias: 1.2,
        attrition_probability: 0.2,
        rounds: 100,
    };

    c.bench_function("trial_100_rounds_5_levels", |b| {
        b.iter(|| black_box(run_trial(black_box(&config), 42)));
    });
}

criterion_group!(benches, bench_trial);
criterion_main!(benches);

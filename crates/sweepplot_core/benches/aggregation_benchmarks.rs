//! Criterion benchmarks for sweepplot_core aggregation
//!
//! Run with: cargo bench -p sweepplot_core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use sweepplot_core::{
    Conditions, DomainSpec, Labels, Metric, Record, SeriesBuilder, SplitSpec, XAxis, aggregate,
    loader::parse_line,
};

const METHODS: [&str; 5] = ["fixed", "tree", "mpdm", "eudm", "mcts"];
const SAMPLES: [u32; 6] = [4, 8, 16, 32, 64, 128];

fn generate_lines(count: usize) -> Vec<String> {
    let mut rng = SmallRng::seed_from_u64(42);
    (0..count)
        .map(|seed| {
            let method = METHODS[rng.random_range(0..METHODS.len())];
            let samples_n = SAMPLES[rng.random_range(0..SAMPLES.len())];
            let use_cfb = rng.random_bool(0.5);
            let mut line = format!(
                ",method={method},use_cfb={use_cfb},{method}.samples_n={samples_n},rng_seed={seed},"
            );
            for _ in 0..13 {
                line.push_str(&format!(" {:.4}", rng.random_range(0.0..50.0)));
            }
            line
        })
        .collect()
}

fn generate_records(count: usize) -> Vec<Record> {
    generate_lines(count)
        .iter()
        .filter_map(|line| parse_line(line).ok())
        .collect()
}

fn bench_parse_lines(c: &mut Criterion) {
    let lines = generate_lines(10_000);
    c.bench_function("parse_10k_lines", |b| {
        b.iter(|| {
            lines
                .iter()
                .filter_map(|line| parse_line(black_box(line)).ok())
                .count()
        })
    });
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    let labels = Labels::new();
    let domain = DomainSpec::new("samples_n", SAMPLES, &labels).unwrap();
    let split = SplitSpec::new("use_cfb", ["false", "true"], &labels).unwrap();
    let conditions =
        Conditions::from_pairs([("method", "mcts"), ("max.rng_seed", "2047")]).unwrap();

    for count in [1_000, 10_000, 50_000].iter() {
        let records = generate_records(*count);
        group.bench_with_input(BenchmarkId::new("records", count), count, |b, _| {
            b.iter(|| {
                aggregate(
                    black_box(&records),
                    Metric::Cost,
                    &domain,
                    Some(&split),
                    &conditions,
                )
            })
        });
    }

    group.finish();
}

fn bench_series_builder(c: &mut Criterion) {
    let records = generate_records(20_000);
    let labels = Labels::new();
    let domain = DomainSpec::new("samples_n", SAMPLES, &labels).unwrap();
    let split = SplitSpec::new("use_cfb", ["false", "true"], &labels).unwrap();
    let mcts = Conditions::from_pairs([("method", "mcts")]).unwrap();
    let mpdm = Conditions::from_pairs([("method", "mpdm")]).unwrap();

    c.bench_function("series_builder_metric_axis", |b| {
        b.iter(|| {
            let mut builder = SeriesBuilder::new(
                black_box(&records),
                &labels,
                XAxis::Metric(Metric::P95Time),
                Metric::Cost,
            );
            builder.plot(&domain, &mcts, Some(&split), Some("PTDM"));
            builder.plot(&domain, &mpdm, Some(&split), Some("MPDM"));
            builder.finish()
        })
    });
}

criterion_group!(
    benches,
    bench_parse_lines,
    bench_aggregate,
    bench_series_builder,
);
criterion_main!(benches);

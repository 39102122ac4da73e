//! Heuristic benchmark: enriched events → heuristic scores.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hospital_risk::features::enrich_batch;
use hospital_risk::risk::heuristic_scores;
use hospital_risk::synth::DatasetGenerator;
use hospital_risk::RawEvent;

fn make_events(n: usize) -> Vec<RawEvent> {
    let rows = DatasetGenerator::new(Some(1)).generate(n);
    let json = serde_json::to_string(&rows).unwrap();
    hospital_risk::events::parse_events(&json).unwrap()
}

fn bench_heuristic(c: &mut Criterion) {
    let rows = enrich_batch(&make_events(1_000));

    c.bench_function("heuristic_1000_rows", |b| {
        b.iter(|| black_box(heuristic_scores(black_box(&rows))))
    });
}

fn bench_heuristic_by_batch(c: &mut Criterion) {
    let events = make_events(10_000);

    let mut g = c.benchmark_group("heuristic_by_batch");
    for n in [10, 100, 1_000, 10_000] {
        let rows = enrich_batch(&events[..n]);
        g.bench_function(format!("rows_{}", n).as_str(), |b| {
            b.iter(|| black_box(heuristic_scores(black_box(&rows))))
        });
    }
    g.finish();
}

criterion_group!(benches, bench_heuristic, bench_heuristic_by_batch);
criterion_main!(benches);

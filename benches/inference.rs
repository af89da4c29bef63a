//! Inference benchmark: feature table → forest scores and risk levels.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use logsentry::config::{ClassifierConfig, RiskConfig};
use logsentry::features::{FeatureTable, FeatureVector};
use logsentry::model::{self, RandomForest};
use logsentry::risk::RiskEngine;

fn make_table(n: usize) -> FeatureTable {
    let rows = (0..n)
        .map(|i| FeatureVector {
            total_size: (i * 37 % 5000) as f64,
            avg_status: if i % 7 == 0 { 404.0 } else { 200.0 },
            avg_hour: (i % 24) as f64,
            unique_ports: (i % 9) as f64,
            deny_count: if i % 3 == 0 { (i % 5) as f64 } else { 0.0 },
            event_count: (i % 11) as f64,
            avg_severity: (i % 4) as f64,
            ..FeatureVector::zeroed(format!("10.0.{}.{}", i / 256, i % 256))
        })
        .collect();
    FeatureTable::from_rows(rows, false)
}

fn trained(n: usize) -> RandomForest {
    let mut table = make_table(n);
    model::train(&mut table, &ClassifierConfig::default())
        .map(|o| o.model)
        .unwrap()
}

fn bench_predict(c: &mut Criterion) {
    let forest = trained(500);
    let risk = RiskEngine::new(RiskConfig::default());
    let table = make_table(1000);

    c.bench_function("predict_1000_entities", |b| {
        b.iter(|| {
            let mut t = table.clone();
            black_box(model::predict(&forest, &mut t, &risk))
        })
    });
}

fn bench_predict_by_trees(c: &mut Criterion) {
    let mut table = make_table(500);
    let rows: Vec<&FeatureVector> = table.rows().iter().collect();
    let x = model::feature_matrix(&rows);
    model::ensure_training_labels(&mut table);
    let y: Vec<u8> = table.rows().iter().map(|r| r.label.unwrap_or(0)).collect();

    let mut g = c.benchmark_group("predict_by_trees");
    for trees in [10, 50, 100] {
        let cfg = ClassifierConfig {
            n_estimators: trees,
            ..ClassifierConfig::default()
        };
        let forest = RandomForest::fit(&x, &y, &cfg);
        g.bench_function(format!("trees_{}", trees).as_str(), |b| {
            b.iter(|| forest.predict(black_box(&x)))
        });
    }
    g.finish();
}

criterion_group!(benches, bench_predict, bench_predict_by_trees);
criterion_main!(benches);

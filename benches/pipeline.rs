//! Pipeline benchmark: normalized tables → merged feature table, and training on it.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use logsentry::config::ClassifierConfig;
use logsentry::features::FeatureExtractor;
use logsentry::model;
use logsentry::normalize::{normalize_text, NormalizedTable};
use logsentry::parsers::LogSource;
use std::fmt::Write;
use std::path::Path;

fn make_tables(entities: usize, lines_per: usize) -> (NormalizedTable, NormalizedTable, NormalizedTable) {
    let mut access = String::new();
    let mut firewall = String::new();
    let mut system = String::new();
    for i in 0..entities {
        let ip = format!("10.0.{}.{}", i / 256, i % 256);
        for j in 0..lines_per {
            let _ = writeln!(
                access,
                "{ip} - - [15/Jan/2024:{:02}:00:00 +0000] \"GET /p/{j} HTTP/1.1\" 200 {} \"-\" \"bench\"",
                j % 24,
                100 + j
            );
            let action = if (i + j) % 4 == 0 { "Deny" } else { "Allow" };
            let _ = writeln!(firewall, "source_ip={ip} port={} action={action}", 1000 + j % 16);
            let _ = writeln!(system, "user={ip} event_id={j} severity={}", j % 5);
        }
    }
    let mem = Path::new("bench");
    (
        normalize_text(&access, mem, LogSource::Access).table,
        normalize_text(&firewall, mem, LogSource::Firewall).table,
        normalize_text(&system, mem, LogSource::System).table,
    )
}

fn bench_feature_extraction(c: &mut Criterion) {
    let (access, firewall, system) = make_tables(200, 10);
    let extractor = FeatureExtractor::new();

    c.bench_function("feature_extract_200x10", |b| {
        b.iter(|| black_box(extractor.extract(&access, &firewall, &system)))
    });
}

fn bench_train(c: &mut Criterion) {
    let (access, firewall, system) = make_tables(300, 4);
    let table = FeatureExtractor::new().extract(&access, &firewall, &system);
    let cfg = ClassifierConfig {
        n_estimators: 25,
        ..ClassifierConfig::default()
    };

    c.bench_function("train_300_entities_25_trees", |b| {
        b.iter(|| {
            let mut t = table.clone();
            black_box(model::train(&mut t, &cfg).map(|o| o.report.accuracy))
        })
    });
}

criterion_group!(benches, bench_feature_extraction, bench_train);
criterion_main!(benches);

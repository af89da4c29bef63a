//! Stage runners. Each stage reads its inputs from disk, writes its artifacts, and recovers from
//! per-source problems at its own boundary.

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::features::{FeatureExtractor, FeatureTable};
use crate::model::{self, ClassificationReport, LabelSource, Prediction, TrainOutcome};
use crate::normalize::{self, FileIssue, FileReport, Normalized, NormalizedTable};
use crate::parsers::LogSource;
use crate::report::{self, Report};
use crate::risk::RiskEngine;
use crate::storage;
use tracing::{error, info, warn};

fn persist(config: &PipelineConfig, n: &Normalized) {
    let path = config.table_path(n.source);
    match storage::write_table(&path, &n.table) {
        Ok(()) => info!(source = n.source.as_str(), path = %path.display(), rows = n.table.len(), "table saved"),
        Err(e) => error!(source = n.source.as_str(), path = %path.display(), error = %e, "failed to save table"),
    }
}

/// Normalize the three raw logs concurrently and rewrite every source artifact. A task that
/// fails leaves its source empty; the others are unaffected. Results are in [`LogSource::ALL`]
/// order.
pub async fn preprocess(config: &PipelineConfig) -> Vec<Normalized> {
    let handles: Vec<_> = LogSource::ALL
        .iter()
        .map(|&source| {
            let path = config.input_path(source).to_path_buf();
            (source, path.clone(), tokio::task::spawn_blocking(move || normalize::normalize(&path, source)))
        })
        .collect();

    let mut out = Vec::with_capacity(handles.len());
    for (source, path, handle) in handles {
        let n = match handle.await {
            Ok(n) => n,
            Err(e) => {
                let mut report = FileReport::new(source, &path);
                report.record(FileIssue::Unreadable {
                    reason: format!("normalization task failed: {e}"),
                });
                Normalized {
                    source,
                    table: NormalizedTable::default(),
                    report,
                }
            }
        };
        persist(config, &n);
        out.push(n);
    }
    info!("preprocessing complete");
    out
}

fn reload_all(config: &PipelineConfig) -> [NormalizedTable; 3] {
    LogSource::ALL.map(|source| normalize::reload(&config.table_path(source), source).table)
}

/// Reload the normalized tables, aggregate and merge them, and write `features.csv`.
pub fn build_features(config: &PipelineConfig) -> Result<FeatureTable> {
    let [access, firewall, system] = reload_all(config);
    let table = FeatureExtractor::new().extract(&access, &firewall, &system);
    if table.is_empty() {
        warn!("feature table is empty");
    }
    let path = config.features_path();
    storage::write_feature_table(&path, &table)?;
    info!(path = %path.display(), entities = table.len(), "features saved");
    Ok(table)
}

fn load_features(config: &PipelineConfig) -> Result<FeatureTable> {
    let table = storage::read_feature_table(&config.features_path())?;
    if table.is_empty() {
        return Err(Error::EmptyFeatureTable);
    }
    Ok(table)
}

/// Train on the feature table and save the model. Synthetic labels are written back to the
/// feature artifact.
pub fn train(config: &PipelineConfig) -> Result<TrainOutcome> {
    let mut table = load_features(config)?;
    let outcome = model::train(&mut table, &config.classifier)?;
    if outcome.labels == LabelSource::Synthetic {
        storage::write_feature_table(&config.features_path(), &table)?;
    }
    model::save_model(&config.model_path, &outcome.model)?;
    info!(
        path = %config.model_path.display(),
        accuracy = outcome.report.accuracy,
        "model saved"
    );
    info!("classification report:\n{}", outcome.report);
    Ok(outcome)
}

pub fn predict(config: &PipelineConfig) -> Result<Vec<Prediction>> {
    let mut table = load_features(config)?;
    let forest = model::load_model(&config.model_path)?;
    let risk = RiskEngine::new(config.risk.clone());
    let predictions = model::predict(&forest, &mut table, &risk);
    for p in predictions.iter().filter(|p| p.predicted_label == 1) {
        warn!(entity = %p.ip, score = p.score, level = p.level.as_str(), "anomaly");
    }
    Ok(predictions)
}

/// Export suspicious logs and write `report.json`. When `predictions` is `None` the model is
/// consulted if one exists.
pub fn report(
    config: &PipelineConfig,
    predictions: Option<Vec<Prediction>>,
    evaluation: Option<ClassificationReport>,
) -> Result<Report> {
    let features = match storage::read_feature_table(&config.features_path()) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "feature table unavailable; reporting without it");
            FeatureTable::default()
        }
    };
    let predictions = match predictions {
        Some(p) => p,
        None => predict(config).unwrap_or_else(|e| {
            warn!(error = %e, "no model predictions for report");
            Vec::new()
        }),
    };
    let anomalies: Vec<Prediction> = predictions
        .into_iter()
        .filter(|p| p.predicted_label == 1)
        .collect();

    let suspicious = report::suspicious_entities(&features);
    info!(count = suspicious.len(), "suspicious entities detected");

    let mut entities = suspicious.clone();
    entities.extend(anomalies.iter().map(|p| p.ip.clone()));
    entities.sort();
    entities.dedup();

    let [access, firewall, system] = reload_all(config);
    report::export_suspicious_logs(
        &[
            (LogSource::Access, &access),
            (LogSource::Firewall, &firewall),
            (LogSource::System, &system),
        ],
        &entities,
        &config.reports_dir,
    )?;
    let suspicious_access = access.filter_by_key(LogSource::Access.key_column(), &entities);

    let out = Report {
        generated_at: chrono::Utc::now(),
        suspicious_entities: suspicious,
        anomalies,
        hourly_requests: report::hourly_request_trend(&suspicious_access).to_vec(),
        top_deny: report::top_deny_entities(&firewall, report::TOP_DENY_LIMIT),
        evaluation,
    };
    let path = config.reports_dir.join("report.json");
    out.write(&path)?;
    info!(path = %path.display(), "report saved");
    Ok(out)
}

/// What a full run produced; a stage that failed leaves its slot empty.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub files: Vec<FileReport>,
    pub features: Option<FeatureTable>,
    pub training: Option<TrainOutcome>,
    pub predictions: Option<Vec<Prediction>>,
    pub report: Option<Report>,
}

fn logged<T>(stage: &str, result: Result<T>) -> Option<T> {
    result
        .map_err(|e| error!(stage, error = %e, "stage failed"))
        .ok()
}

/// Every stage in order. Failures are logged and never stop later stages.
pub async fn run(config: &PipelineConfig) -> RunSummary {
    let files = preprocess(config).await.into_iter().map(|n| n.report).collect();
    let features = logged("features", build_features(config));
    let training = logged("train", train(config));
    let predictions = logged("predict", predict(config));
    let report = logged(
        "report",
        report(
            config,
            Some(predictions.clone().unwrap_or_default()),
            training.as_ref().map(|t| t.report.clone()),
        ),
    );
    info!("pipeline complete");
    RunSummary {
        files,
        features,
        training,
        predictions,
        report,
    }
}

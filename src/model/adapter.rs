//! Label handling and the train/predict boundary between the feature table and the forest.

use super::eval::{train_test_split, ClassificationReport};
use super::RandomForest;
use crate::config::ClassifierConfig;
use crate::error::{Error, Result};
use crate::features::{FeatureTable, FeatureVector, FEATURE_COLUMNS};
use crate::risk::{RiskEngine, RiskLevel};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    Provided,
    Synthetic,
}

/// Rule-based stand-in label: any firewall deny marks the entity anomalous.
pub fn synthetic_label(row: &FeatureVector) -> u8 {
    u8::from(row.deny_count > 0.0)
}

/// Add synthetic labels when the table has no label column.
pub fn ensure_training_labels(table: &mut FeatureTable) -> LabelSource {
    if table.has_label() {
        return LabelSource::Provided;
    }
    warn!("'label' column missing; adding synthetic labels (deny_count > 0)");
    for row in table.rows_mut() {
        row.label = Some(synthetic_label(row));
    }
    table.set_has_label(true);
    LabelSource::Synthetic
}

/// Add an all-zero placeholder label column so the table matches the training shape.
/// Returns whether a placeholder was added.
pub fn ensure_inference_labels(table: &mut FeatureTable) -> bool {
    if table.has_label() {
        return false;
    }
    warn!("'label' column not found; adding placeholder labels for prediction");
    for row in table.rows_mut() {
        row.label = Some(0);
    }
    table.set_has_label(true);
    true
}

/// Rows × [`FEATURE_COLUMNS`]; the key and label are never features.
pub fn feature_matrix(rows: &[&FeatureVector]) -> Array2<f64> {
    Array2::from_shape_fn((rows.len(), FEATURE_COLUMNS.len()), |(i, j)| {
        rows[i].values()[j]
    })
}

#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub model: RandomForest,
    pub report: ClassificationReport,
    pub labels: LabelSource,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Fit on a seeded split and evaluate on the held-out rows. Labels are added to `table` when
/// it has none; rows with an empty label cell are left out.
pub fn train(table: &mut FeatureTable, config: &ClassifierConfig) -> Result<TrainOutcome> {
    if table.is_empty() {
        return Err(Error::EmptyFeatureTable);
    }
    let labels = ensure_training_labels(table);

    let labelled: Vec<(&FeatureVector, u8)> = table
        .rows()
        .iter()
        .filter_map(|r| r.label.map(|l| (r, u8::from(l != 0))))
        .collect();
    let excluded = table.len() - labelled.len();
    if excluded > 0 {
        warn!(excluded, "rows without a label left out of training");
    }

    let (train_idx, test_idx) =
        train_test_split(labelled.len(), config.test_fraction, config.seed)?;
    let pick = |idx: &[usize]| -> (Array2<f64>, Vec<u8>) {
        let rows: Vec<&FeatureVector> = idx.iter().map(|&i| labelled[i].0).collect();
        (feature_matrix(&rows), idx.iter().map(|&i| labelled[i].1).collect())
    };
    let (x_train, y_train) = pick(&train_idx);
    let (x_test, y_test) = pick(&test_idx);

    info!(
        train_rows = train_idx.len(),
        test_rows = test_idx.len(),
        trees = config.n_estimators,
        "training random forest"
    );
    let model = RandomForest::fit(&x_train, &y_train, config);
    let report = ClassificationReport::new(&y_test, &model.predict(&x_test));

    Ok(TrainOutcome {
        model,
        report,
        labels,
        train_rows: train_idx.len(),
        test_rows: test_idx.len(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub ip: String,
    pub predicted_label: u8,
    /// Share of trees voting anomalous
    pub score: f32,
    pub level: RiskLevel,
}

pub fn predict(model: &RandomForest, table: &mut FeatureTable, risk: &RiskEngine) -> Vec<Prediction> {
    ensure_inference_labels(table);
    let rows: Vec<&FeatureVector> = table.rows().iter().collect();
    let x = feature_matrix(&rows);
    let predictions: Vec<Prediction> = rows
        .iter()
        .zip(x.rows())
        .map(|(r, features)| {
            let scored = risk.score(r.ip.as_str(), model.score(features) as f32);
            Prediction {
                ip: scored.entity,
                predicted_label: model.predict_row(features),
                score: scored.score,
                level: scored.level,
            }
        })
        .collect();
    let anomalies = predictions.iter().filter(|p| p.predicted_label == 1).count();
    info!(entities = predictions.len(), anomalies, "anomalies detected");
    predictions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiskConfig;

    fn row(ip: &str, deny: f64, ports: f64) -> FeatureVector {
        FeatureVector {
            deny_count: deny,
            unique_ports: ports,
            ..FeatureVector::zeroed(ip)
        }
    }

    fn table() -> FeatureTable {
        let rows = (0..20)
            .map(|i| {
                let deny = if i % 2 == 0 { 0.0 } else { 1.0 + i as f64 };
                row(&format!("10.0.0.{i}"), deny, (i % 5) as f64)
            })
            .collect();
        FeatureTable::from_rows(rows, false)
    }

    #[test]
    fn synthetic_labels_follow_deny_count() {
        let mut t = table();
        assert_eq!(ensure_training_labels(&mut t), LabelSource::Synthetic);
        assert!(t.has_label());
        for r in t.rows() {
            assert_eq!(r.label, Some(u8::from(r.deny_count > 0.0)));
        }
        assert_eq!(ensure_training_labels(&mut t), LabelSource::Provided);
    }

    #[test]
    fn placeholder_labels_are_zero() {
        let mut t = table();
        assert!(ensure_inference_labels(&mut t));
        assert!(t.rows().iter().all(|r| r.label == Some(0)));
        assert!(!ensure_inference_labels(&mut t));
    }

    #[test]
    fn train_uses_thirty_percent_holdout() {
        let mut t = table();
        let out = train(&mut t, &ClassifierConfig::default()).unwrap();
        assert_eq!((out.train_rows, out.test_rows), (14, 6));
        assert_eq!(out.labels, LabelSource::Synthetic);
        assert_eq!(out.report.macro_avg.support, 6);
    }

    #[test]
    fn unlabelled_rows_are_left_out() {
        let mut rows: Vec<FeatureVector> = table().rows().to_vec();
        for (i, r) in rows.iter_mut().enumerate() {
            r.label = (i < 10).then(|| synthetic_label(r));
        }
        let mut t = FeatureTable::from_rows(rows, true);
        let out = train(&mut t, &ClassifierConfig::default()).unwrap();
        assert_eq!(out.labels, LabelSource::Provided);
        assert_eq!(out.train_rows + out.test_rows, 10);
    }

    #[test]
    fn empty_and_tiny_tables_fail_cleanly() {
        let mut empty = FeatureTable::default();
        assert!(matches!(
            train(&mut empty, &ClassifierConfig::default()),
            Err(Error::EmptyFeatureTable)
        ));
        let mut one = FeatureTable::from_rows(vec![row("a", 1.0, 1.0)], false);
        assert!(matches!(
            train(&mut one, &ClassifierConfig::default()),
            Err(Error::InsufficientData { rows: 1, .. })
        ));
    }

    #[test]
    fn predictions_flag_deny_heavy_entities() {
        let mut t = table();
        let model = train(&mut t, &ClassifierConfig::default()).unwrap().model;
        let mut fresh = table();
        let preds = predict(&model, &mut fresh, &RiskEngine::new(RiskConfig::default()));
        assert_eq!(preds.len(), 20);
        assert!(fresh.has_label());
        let flagged = preds.iter().filter(|p| p.predicted_label == 1).count();
        assert!(flagged >= 8, "flagged {flagged}");
        for p in &preds {
            assert_eq!(p.predicted_label == 1, p.score > 0.5);
        }
    }
}

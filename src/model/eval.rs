//! Held-out split and the precision/recall/F1 classification report.

use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::fmt;

/// Shuffle `0..n` with `seed` and hold out `ceil(test_fraction * n)` rows (at least one, and
/// never all of them). Returns `(train, test)`.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if n < 2 {
        return Err(Error::InsufficientData { rows: n, needed: 2 });
    }
    let mut idx: Vec<usize> = (0..n).collect();
    idx.shuffle(&mut StdRng::seed_from_u64(seed));
    let n_test = ((test_fraction * n as f64).ceil() as usize).clamp(1, n - 1);
    let train = idx.split_off(n_test);
    Ok((train, idx))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassificationReport {
    /// Per-class metrics for every label seen in either slice. Zero denominators score 0.
    pub fn new(y_true: &[u8], y_pred: &[u8]) -> Self {
        let mut labels: Vec<u8> = y_true.iter().chain(y_pred).copied().collect();
        labels.sort_unstable();
        labels.dedup();

        let pairs = || y_true.iter().zip(y_pred);
        let classes: Vec<ClassMetrics> = labels
            .iter()
            .map(|&c| {
                let tp = pairs().filter(|(t, p)| **t == c && **p == c).count();
                let predicted = y_pred.iter().filter(|p| **p == c).count();
                let support = y_true.iter().filter(|t| **t == c).count();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    label: c.to_string(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let total = y_true.len();
        let correct = pairs().filter(|(t, p)| t == p).count();
        let k = classes.len().max(1) as f64;
        let macro_avg = ClassMetrics {
            label: "macro avg".to_string(),
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / k,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / k,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / k,
            support: total,
        };
        let weight = |m: fn(&ClassMetrics) -> f64| {
            classes.iter().map(|c| m(c) * c.support as f64).sum::<f64>() / total.max(1) as f64
        };
        let weighted_avg = ClassMetrics {
            label: "weighted avg".to_string(),
            precision: weight(|c: &ClassMetrics| c.precision),
            recall: weight(|c: &ClassMetrics| c.recall),
            f1: weight(|c: &ClassMetrics| c.f1),
            support: total,
        };

        Self {
            accuracy: ratio(correct, total),
            classes,
            macro_avg,
            weighted_avg,
        }
    }

    pub fn class(&self, label: u8) -> Option<&ClassMetrics> {
        let label = label.to_string();
        self.classes.iter().find(|c| c.label == label)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn row(f: &mut fmt::Formatter<'_>, m: &ClassMetrics) -> fmt::Result {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.label, m.precision, m.recall, m.f1, m.support
            )
        }
        writeln!(f, "{:>12} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for c in &self.classes {
            row(f, c)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        row(f, &self.macro_avg)?;
        row(f, &self.weighted_avg)
    }
}

//! Bagged ensemble of decision trees with a fit/predict contract.

use super::tree::{DecisionTree, TreeParams};
use crate::config::ClassifierConfig;
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Fit `config.n_estimators` trees, each on a bootstrap draw of the rows. Deterministic for
    /// a given seed.
    pub fn fit(x: &Array2<f64>, y: &[u8], config: &ClassifierConfig) -> Self {
        let n = x.nrows();
        let n_features = x.ncols();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            max_features: ((n_features as f64).sqrt() as usize).max(1),
        };

        let trees = (0..config.n_estimators)
            .map(|_| {
                let samples: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(x, y, samples, params, &mut rng)
            })
            .collect();
        Self { trees, n_features }
    }

    /// Fraction of trees voting for class 1.
    pub fn score(&self, row: ArrayView1<f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let votes = self
            .trees
            .iter()
            .filter(|t| t.predict_proba(row) > 0.5)
            .count();
        votes as f64 / self.trees.len() as f64
    }

    /// Majority vote; an exact tie goes to class 0.
    pub fn predict_row(&self, row: ArrayView1<f64>) -> u8 {
        u8::from(self.score(row) > 0.5)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Vec<u8> {
        x.rows().into_iter().map(|r| self.predict_row(r)).collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

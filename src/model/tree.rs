//! CART decision tree for binary labels, gini impurity, midpoint thresholds.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Share of class-1 training samples that reached this leaf
    Leaf { positive: f64 },
    /// `x[feature] <= threshold` goes left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Candidate features drawn per split
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct Builder<'a> {
    x: &'a Array2<f64>,
    y: &'a [u8],
    params: TreeParams,
    rng: &'a mut StdRng,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(pos: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = pos as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

impl DecisionTree {
    /// Fit on the rows listed in `samples` (may contain repeats, as with bootstrap draws).
    pub fn fit(
        x: &Array2<f64>,
        y: &[u8],
        samples: Vec<usize>,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut b = Builder {
            x,
            y,
            params,
            rng,
            nodes: Vec::new(),
        };
        if samples.is_empty() {
            b.nodes.push(Node::Leaf { positive: 0.0 });
        } else {
            b.build(samples, 0);
        }
        Self { nodes: b.nodes }
    }

    /// Class-1 probability for one feature row.
    pub fn predict_proba(&self, row: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { positive }) => return *positive,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = row.get(*feature).copied().unwrap_or(0.0);
                    idx = if v <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], i: usize) -> usize {
            match nodes.get(i) {
                Some(Node::Split { left, right, .. }) => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Builder<'_> {
    fn build(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let n = samples.len();
        let pos = samples.iter().filter(|&&i| self.y[i] == 1).count();
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            positive: pos as f64 / n as f64,
        });

        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        if pos == 0 || pos == n || n < self.params.min_samples_split.max(2) || depth_reached {
            return id;
        }

        let Some(best) = self.best_split(&samples, pos) else {
            return id;
        };
        let (l, r): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.x[[i, best.feature]] <= best.threshold);
        let left = self.build(l, depth + 1);
        let right = self.build(r, depth + 1);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    /// Search a random subset of features first; fall back to all of them when none of the
    /// candidates separates the samples.
    fn best_split(&mut self, samples: &[usize], pos: usize) -> Option<BestSplit> {
        let n_features = self.x.ncols();
        let k = self.params.max_features.clamp(1, n_features);
        let candidates = index::sample(&mut *self.rng, n_features, k).into_vec();
        self.search(samples, pos, &candidates).or_else(|| {
            let rest: Vec<usize> = (0..n_features).filter(|f| !candidates.contains(f)).collect();
            self.search(samples, pos, &rest)
        })
    }

    fn search(&self, samples: &[usize], pos: usize, features: &[usize]) -> Option<BestSplit> {
        let n = samples.len();
        let mut best: Option<BestSplit> = None;
        for &f in features {
            let mut sorted: Vec<(f64, u8)> = samples.iter().map(|&i| (self.x[[i, f]], self.y[i])).collect();
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_pos = 0;
            for split in 1..n {
                left_pos += usize::from(sorted[split - 1].1 == 1);
                let (lo, hi) = (sorted[split - 1].0, sorted[split].0);
                if lo == hi {
                    continue;
                }
                let right_n = n - split;
                let impurity = (split as f64 * gini(left_pos, split)
                    + right_n as f64 * gini(pos - left_pos, right_n))
                    / n as f64;
                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    best = Some(BestSplit {
                        feature: f,
                        threshold: lo + (hi - lo) / 2.0,
                        impurity,
                    });
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            max_features: 2,
        }
    }

    #[test]
    fn separates_on_single_threshold() {
        let x = array![[0.0, 5.0], [1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
        let y = [0, 0, 1, 1];
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, (0..4).collect(), params(), &mut rng);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict_proba(x.row(0)), 0.0);
        assert_eq!(tree.predict_proba(x.row(3)), 1.0);
        assert_eq!(tree.predict_proba(array![1.4, 0.0].view()), 0.0);
        assert_eq!(tree.predict_proba(array![1.6, 0.0].view()), 1.0);
    }

    #[test]
    fn identical_rows_become_a_mixed_leaf() {
        let x = array![[1.0], [1.0], [1.0]];
        let y = [0, 1, 1];
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, (0..3).collect(), params(), &mut rng);
        assert_eq!(tree.node_count(), 1);
        assert!((tree.predict_proba(x.row(0)) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn max_depth_is_respected() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = [0, 1, 0, 1, 0, 1];
        let mut rng = StdRng::seed_from_u64(1);
        let p = TreeParams {
            max_depth: Some(1),
            ..params()
        };
        let tree = DecisionTree::fit(&x, &y, (0..6).collect(), p, &mut rng);
        assert!(tree.depth() <= 1);
    }
}

//! Isolation forest over a dense `f64` feature matrix.
//!
//! Points that are isolated by few random splits are outliers. Scores follow
//! the usual convention: `score_samples` is the negated anomaly score (higher
//! means more normal), `decision_function` shifts it by the contamination
//! percentile of the training scores so that negative values are outliers.

use crate::config::ModelConfig;
use crate::error::{Result, ScoringError};
use ndarray::{ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Expected path length of an unsuccessful BST search over `n` points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n1 = (n - 1) as f64;
            2.0 * (n1.ln() + EULER_GAMMA) - 2.0 * n1 / n as f64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// One isolation tree, nodes stored in an arena (root at 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn build(x: &ArrayView2<f64>, rows: Vec<usize>, max_depth: usize, rng: &mut StdRng) -> Self {
        let mut tree = IsolationTree { nodes: Vec::new() };
        tree.grow(x, rows, 0, max_depth, rng);
        tree
    }

    fn grow(
        &mut self,
        x: &ArrayView2<f64>,
        rows: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });
        if depth >= max_depth || rows.len() <= 1 {
            return id;
        }

        // Only features that still vary inside this node can split it.
        let candidates: Vec<(usize, f64, f64)> = (0..x.ncols())
            .filter_map(|j| {
                let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                    let v = x[[r, j]];
                    (lo.min(v), hi.max(v))
                });
                (hi > lo).then_some((j, lo, hi))
            })
            .collect();
        if candidates.is_empty() {
            return id;
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(lo..hi);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| x[[r, feature]] < threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            return id;
        }

        let left = self.grow(x, left_rows, depth + 1, max_depth, rng);
        let right = self.grow(x, right_rows, depth + 1, max_depth, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    fn path_length(&self, sample: &ArrayView1<f64>) -> f64 {
        let mut id = 0;
        let mut depth = 0usize;
        loop {
            match &self.nodes[id] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if sample[*feature] < *threshold { *left } else { *right };
                    depth += 1;
                }
                Node::Leaf { size } => return depth as f64 + average_path_length(*size),
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    max_samples: usize,
    n_features: usize,
    contamination: f64,
    offset: f64,
}

impl IsolationForest {
    pub fn fit(x: ArrayView2<f64>, params: &ModelConfig) -> Result<Self> {
        let n = x.nrows();
        if n == 0 {
            return Err(ScoringError::EmptyTrainingSet);
        }
        if !(0.0..=0.5).contains(&params.contamination) {
            return Err(ScoringError::InvalidInput(format!(
                "contamination must be in [0, 0.5], got {}",
                params.contamination
            )));
        }
        let max_samples = params.max_samples.max(1).min(n);
        let max_depth = (max_samples.max(2) as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(params.random_state);

        let trees = (0..params.n_estimators.max(1))
            .map(|_| {
                let rows = sample(&mut rng, n, max_samples).into_vec();
                IsolationTree::build(&x, rows, max_depth, &mut rng)
            })
            .collect();

        let mut forest = IsolationForest {
            trees,
            max_samples,
            n_features: x.ncols(),
            contamination: params.contamination,
            offset: -0.5,
        };
        let train_scores = forest.score_samples(x);
        forest.offset = percentile(&train_scores, 100.0 * params.contamination);
        Ok(forest)
    }

    /// Negated anomaly score per row; in [-1, 0], lower is more anomalous.
    pub fn score_samples(&self, x: ArrayView2<f64>) -> Vec<f64> {
        let c = average_path_length(self.max_samples);
        x.axis_iter(Axis(0))
            .map(|row| {
                let mean_depth = self
                    .trees
                    .iter()
                    .map(|t| t.path_length(&row))
                    .sum::<f64>()
                    / self.trees.len() as f64;
                let anomaly = if c > 0.0 {
                    2f64.powf(-mean_depth / c)
                } else {
                    0.5
                };
                -anomaly
            })
            .collect()
    }

    /// Shifted score; negative values are outliers.
    pub fn decision_function(&self, x: ArrayView2<f64>) -> Vec<f64> {
        self.score_samples(x)
            .into_iter()
            .map(|s| s - self.offset)
            .collect()
    }

    /// `true` for rows the model flags as outliers.
    pub fn predict(&self, x: ArrayView2<f64>) -> Vec<bool> {
        self.decision_function(x).into_iter().map(|d| d < 0.0).collect()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn contamination(&self) -> f64 {
        self.contamination
    }
}

/// Linear-interpolated percentile, `q` in [0, 100].
fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

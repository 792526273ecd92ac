//! Regression tree used as the gradient boosting base learner

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// A node in the fitted tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
        n_samples: usize,
    },
}

/// Variance-reduction regression tree.
///
/// Splits minimize the weighted MSE of the children; leaf values are the
/// mean of the targets reaching the leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    root: Option<Node>,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl RegressionTree {
    pub fn new(max_depth: usize, min_samples_leaf: usize) -> Self {
        Self {
            root: None,
            max_depth,
            min_samples_leaf,
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    /// Fit the tree to the given samples.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(ForecastError::ShapeError {
                expected: format!("{} targets", n_samples),
                actual: format!("{} targets", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ForecastError::TrainingError(
                "Cannot fit a tree on an empty dataset".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build(x, y, &indices, 0, &mut importances));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = importances;
        Ok(())
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
    ) -> Node {
        let n = indices.len();
        let sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let mean = sum / n as f64;

        if depth >= self.max_depth || n < 2 * self.min_samples_leaf {
            return Node::Leaf {
                value: mean,
                n_samples: n,
            };
        }

        match self.find_best_split(x, y, indices) {
            Some(split) => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, split.feature_idx]] <= split.threshold);

                if left_idx.len() < self.min_samples_leaf
                    || right_idx.len() < self.min_samples_leaf
                {
                    return Node::Leaf {
                        value: mean,
                        n_samples: n,
                    };
                }

                importances[split.feature_idx] += n as f64 * split.gain;

                let left = Box::new(self.build(x, y, &left_idx, depth + 1, importances));
                let right = Box::new(self.build(x, y, &right_idx, depth + 1, importances));
                Node::Split {
                    feature_idx: split.feature_idx,
                    threshold: split.threshold,
                    left,
                    right,
                    n_samples: n,
                }
            }
            None => Node::Leaf {
                value: mean,
                n_samples: n,
            },
        }
    }

    /// Scan every feature in parallel; within a feature, sweep the sorted
    /// values once, maintaining prefix sums for incremental variance.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
    ) -> Option<SplitCandidate> {
        let n = indices.len() as f64;
        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
        let parent_impurity = total_sq / n - (total_sum / n).powi(2);

        (0..x.ncols())
            .into_par_iter()
            .filter_map(|feature_idx| {
                let mut pairs: Vec<(f64, f64)> = indices
                    .iter()
                    .map(|&i| (x[[i, feature_idx]], y[i]))
                    .collect();
                pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

                let mut best: Option<SplitCandidate> = None;
                let mut left_sum = 0.0;
                let mut left_sq = 0.0;

                for (k, window) in pairs.windows(2).enumerate() {
                    let (v, target) = window[0];
                    left_sum += target;
                    left_sq += target * target;

                    // Can't split between equal feature values
                    if window[1].0 <= v {
                        continue;
                    }

                    let left_n = (k + 1) as f64;
                    let right_n = n - left_n;
                    if (left_n as usize) < self.min_samples_leaf
                        || (right_n as usize) < self.min_samples_leaf
                    {
                        continue;
                    }

                    let right_sum = total_sum - left_sum;
                    let right_sq = total_sq - left_sq;
                    let left_var = left_sq / left_n - (left_sum / left_n).powi(2);
                    let right_var = right_sq / right_n - (right_sum / right_n).powi(2);
                    let weighted = (left_n * left_var + right_n * right_var) / n;
                    let gain = parent_impurity - weighted;

                    if gain > best.as_ref().map_or(0.0, |b| b.gain) {
                        best = Some(SplitCandidate {
                            feature_idx,
                            threshold: (v + window[1].0) / 2.0,
                            gain,
                        });
                    }
                }
                best
            })
            .max_by(|a, b| a.gain.partial_cmp(&b.gain).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Predict a batch of rows.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(ForecastError::ModelNotFitted)?;
        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| Self::descend(root, &x.row(i).to_vec()))
            .collect();
        Ok(Array1::from_vec(predictions))
    }

    /// Predict a single row.
    pub fn predict_row(&self, sample: &[f64]) -> Result<f64> {
        let root = self.root.as_ref().ok_or(ForecastError::ModelNotFitted)?;
        if sample.len() != self.n_features {
            return Err(ForecastError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", sample.len()),
            });
        }
        Ok(Self::descend(root, sample))
    }

    fn descend(node: &Node, sample: &[f64]) -> f64 {
        match node {
            Node::Leaf { value, .. } => *value,
            Node::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                if sample[*feature_idx] <= *threshold {
                    Self::descend(left, sample)
                } else {
                    Self::descend(right, sample)
                }
            }
        }
    }

    /// Gain-weighted importance per feature, normalized to sum to 1.
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn depth(&self) -> usize {
        fn node_depth(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

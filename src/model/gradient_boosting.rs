//! Gradient boosted regression trees
//!
//! Squared-error boosting with row and column subsampling, in the spirit of
//! XGBoost but without second-order terms.

use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::decision_tree::RegressionTree;
use crate::error::{ForecastError, Result};

/// Boosting hyperparameters.
///
/// Immutable once training starts; recorded verbatim into the results
/// metadata that accompanies a persisted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Row subsample ratio per tree
    pub subsample: f64,
    /// Column subsample ratio per tree
    pub colsample_bytree: f64,
    /// Worker threads; non-positive means use all cores
    pub n_jobs: i64,
    /// Random seed
    pub random_state: Option<u64>,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 500,
            max_depth: 6,
            learning_rate: 0.1,
            subsample: 0.8,
            colsample_bytree: 0.8,
            n_jobs: -1,
            random_state: Some(42),
        }
    }
}

/// Interval, in boosting rounds, between monitoring log lines during fit.
const EVAL_LOG_INTERVAL: usize = 50;

/// Gradient boosted regressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedRegressor {
    config: GradientBoostingConfig,
    trees: Vec<RegressionTree>,
    col_indices_per_tree: Vec<Vec<usize>>,
    initial_prediction: f64,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl GradientBoostedRegressor {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            col_indices_per_tree: Vec::new(),
            initial_prediction: 0.0,
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }

    /// Fit the model on `(x, y)`.
    ///
    /// When an eval set is given, its RMSE is logged alongside the training
    /// RMSE every [`EVAL_LOG_INTERVAL`] rounds. The eval set is used for
    /// monitoring only; it never influences parameter updates.
    pub fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        eval_set: Option<(&Array2<f64>, &Array1<f64>)>,
    ) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples != y.len() {
            return Err(ForecastError::ShapeError {
                expected: format!("{} targets", n_samples),
                actual: format!("{} targets", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ForecastError::TrainingError(
                "Cannot fit on an empty training set".to_string(),
            ));
        }

        self.trees.clear();
        self.col_indices_per_tree.clear();
        self.n_features = n_features;
        self.initial_prediction = y.mean().unwrap_or(0.0);
        self.feature_importances = vec![0.0; n_features];

        let mut predictions = Array1::from_elem(n_samples, self.initial_prediction);
        let mut eval_predictions =
            eval_set.map(|(xe, _)| Array1::from_elem(xe.nrows(), self.initial_prediction));

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        for round in 0..self.config.n_estimators {
            let residuals: Array1<f64> = if n_samples > 10_000 {
                let preds = &predictions;
                let res: Vec<f64> = (0..n_samples)
                    .into_par_iter()
                    .map(|i| y[i] - preds[i])
                    .collect();
                Array1::from_vec(res)
            } else {
                y.iter()
                    .zip(predictions.iter())
                    .map(|(yi, pi)| yi - pi)
                    .collect()
            };

            let row_indices = sample_indices(n_samples, self.config.subsample, &mut rng);
            let col_indices = sample_indices(n_features, self.config.colsample_bytree, &mut rng);

            let x_sub = x
                .select(ndarray::Axis(0), &row_indices)
                .select(ndarray::Axis(1), &col_indices);
            let r_sub: Array1<f64> =
                Array1::from_vec(row_indices.iter().map(|&i| residuals[i]).collect());

            let mut tree = RegressionTree::new(self.config.max_depth, 1);
            tree.fit(&x_sub, &r_sub)?;

            // Update running predictions over the full training set
            let x_cols = x.select(ndarray::Axis(1), &col_indices);
            let tree_pred = tree.predict(&x_cols)?;
            for i in 0..n_samples {
                predictions[i] += self.config.learning_rate * tree_pred[i];
            }

            if let (Some(ep), Some((xe, _))) = (eval_predictions.as_mut(), eval_set) {
                let xe_cols = xe.select(ndarray::Axis(1), &col_indices);
                let ep_tree = tree.predict(&xe_cols)?;
                for i in 0..ep.len() {
                    ep[i] += self.config.learning_rate * ep_tree[i];
                }
            }

            for (j, &col) in col_indices.iter().enumerate() {
                self.feature_importances[col] += tree.feature_importances()[j];
            }

            self.trees.push(tree);
            self.col_indices_per_tree.push(col_indices);

            if (round + 1) % EVAL_LOG_INTERVAL == 0 || round + 1 == self.config.n_estimators {
                let train_rmse = rmse_of(y, &predictions);
                match (&eval_predictions, eval_set) {
                    (Some(ep), Some((_, ye))) => {
                        info!(
                            round = round + 1,
                            train_rmse = format!("{:.4}", train_rmse).as_str(),
                            val_rmse = format!("{:.4}", rmse_of(ye, ep)).as_str(),
                            "Boosting progress"
                        );
                    }
                    _ => {
                        info!(
                            round = round + 1,
                            train_rmse = format!("{:.4}", train_rmse).as_str(),
                            "Boosting progress"
                        );
                    }
                }
            }
        }

        let total: f64 = self.feature_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= total;
            }
        }

        Ok(())
    }

    /// Predict a batch of rows.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ForecastError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ForecastError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        let n = x.nrows();
        let mut predictions = Array1::from_elem(n, self.initial_prediction);

        for (tree, col_indices) in self.trees.iter().zip(self.col_indices_per_tree.iter()) {
            let x_sub = x.select(ndarray::Axis(1), col_indices);
            let tree_pred = tree.predict(&x_sub)?;
            for i in 0..n {
                predictions[i] += self.config.learning_rate * tree_pred[i];
            }
        }

        Ok(predictions)
    }

    /// Predict a single feature row.
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(ForecastError::ModelNotFitted);
        }
        if row.len() != self.n_features {
            return Err(ForecastError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", row.len()),
            });
        }
        let mut prediction = self.initial_prediction;
        for (tree, col_indices) in self.trees.iter().zip(self.col_indices_per_tree.iter()) {
            let sub: Vec<f64> = col_indices.iter().map(|&c| row[c]).collect();
            prediction += self.config.learning_rate * tree.predict_row(&sub)?;
        }
        Ok(prediction)
    }

    /// Normalized per-feature importance over all trees.
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

fn sample_indices(n: usize, ratio: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
    let size = ((n as f64) * ratio).ceil().max(1.0) as usize;
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(size.min(n));
    indices.sort_unstable();
    indices
}

fn rmse_of(y: &Array1<f64>, pred: &Array1<f64>) -> f64 {
    let mse = y
        .iter()
        .zip(pred.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        / y.len() as f64;
    mse.sqrt()
}

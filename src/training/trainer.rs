//! End-to-end model training and evaluation

use serde::{Deserialize, Serialize};
use tracing::info;

use super::metrics::{EvalReport, SplitMetrics};
use crate::data::{feature_matrix, DatasetSplits};
use crate::error::Result;
use crate::model::{GradientBoostedRegressor, GradientBoostingConfig};
use crate::schema::{FEATURE_COLUMNS, N_FEATURES};

/// Test MAE of the naive 24h-lag predictor, used as a reference point in the
/// evaluation log.
const BASELINE_24H_LAG_MAE: f64 = 11.21;

/// Everything a consumer needs to know about a trained model: what it is,
/// which features it expects (and in which order), how it was configured,
/// and how it performed on each split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsMetadata {
    pub model_type: String,
    pub n_features: usize,
    pub features: Vec<String>,
    pub hyperparameters: GradientBoostingConfig,
    pub metrics: EvalReport,
}

/// Train on the train split, monitor on the validation split, then evaluate
/// all three splits with the identical metric set.
///
/// Returns the fitted model and its results metadata; persisting them is the
/// caller's responsibility. Any failure propagates before anything is
/// written, so a failed run never produces a partial artifact.
pub fn train_and_evaluate(
    splits: &DatasetSplits,
    params: GradientBoostingConfig,
) -> Result<(GradientBoostedRegressor, ResultsMetadata)> {
    let (x_train, y_train) = feature_matrix(&splits.train)?;
    let (x_val, y_val) = feature_matrix(&splits.val)?;
    let (x_test, y_test) = feature_matrix(&splits.test)?;

    info!(
        train_rows = x_train.nrows(),
        val_rows = x_val.nrows(),
        test_rows = x_test.nrows(),
        n_features = N_FEATURES,
        "Starting gradient boosting training"
    );

    let mut model = GradientBoostedRegressor::new(params.clone());
    model.fit(&x_train, &y_train, Some((&x_val, &y_val)))?;
    info!(n_trees = model.n_trees(), "Training complete");

    let metrics = EvalReport {
        train: SplitMetrics::compute(&y_train, &model.predict(&x_train)?),
        val: SplitMetrics::compute(&y_val, &model.predict(&x_val)?),
        test: SplitMetrics::compute(&y_test, &model.predict(&x_test)?),
    };

    log_evaluation(&metrics);
    log_feature_importances(&model);

    let results = ResultsMetadata {
        model_type: "GradientBoosting".to_string(),
        n_features: N_FEATURES,
        features: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
        hyperparameters: params,
        metrics,
    };

    Ok((model, results))
}

fn log_evaluation(metrics: &EvalReport) {
    for (name, m) in [
        ("train", &metrics.train),
        ("val", &metrics.val),
        ("test", &metrics.test),
    ] {
        info!(
            split = name,
            mae = format!("{:.4}", m.mae).as_str(),
            rmse = format!("{:.4}", m.rmse).as_str(),
            r2 = format!("{:.4}", m.r2).as_str(),
            "Evaluation"
        );
    }

    let improvement = (BASELINE_24H_LAG_MAE - metrics.test.mae) / BASELINE_24H_LAG_MAE * 100.0;
    info!(
        baseline_mae = BASELINE_24H_LAG_MAE,
        test_mae = format!("{:.4}", metrics.test.mae).as_str(),
        improvement_pct = format!("{:+.2}", improvement).as_str(),
        "Comparison against 24h-lag baseline"
    );
}

/// Log the top features by importance, descending. Operator visibility
/// only; the ranking is not persisted with the artifact.
fn log_feature_importances(model: &GradientBoostedRegressor) {
    let mut ranked: Vec<(&str, f64)> = FEATURE_COLUMNS
        .iter()
        .copied()
        .zip(model.feature_importances().iter().copied())
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    for (rank, (feature, importance)) in ranked.iter().take(10).enumerate() {
        info!(
            rank = rank + 1,
            feature,
            importance = format!("{:.6}", importance).as_str(),
            "Feature importance"
        );
    }
}

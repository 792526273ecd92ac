//! Regression evaluation metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// MAE, RMSE and R² for one dataset split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

/// Metrics for all three splits, in a fixed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    pub train: SplitMetrics,
    pub val: SplitMetrics,
    pub test: SplitMetrics,
}

pub fn mean_absolute_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(a, b)| (a - b).abs())
        .sum::<f64>()
        / y_true.len() as f64
}

pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        / y_true.len() as f64
}

pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let mean = y_true.mean().unwrap_or(0.0);
    let ss_tot: f64 = y_true.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

impl SplitMetrics {
    /// Compute the full metric set for one split.
    ///
    /// RMSE is defined as sqrt(MSE) so the two can never disagree.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        Self {
            mae: mean_absolute_error(y_true, y_pred),
            rmse: mean_squared_error(y_true, y_pred).sqrt(),
            r2: r2_score(y_true, y_pred),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_prediction() {
        let y = array![1.0, 2.0, 3.0];
        let m = SplitMetrics::compute(&y, &y);
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.r2, 1.0);
    }

    #[test]
    fn test_rmse_is_sqrt_of_mse() {
        let y_true = array![3.0, 5.0, 7.0, 11.0];
        let y_pred = array![2.5, 6.0, 6.0, 12.5];
        let m = SplitMetrics::compute(&y_true, &y_pred);
        let mse = mean_squared_error(&y_true, &y_pred);
        assert!((m.rmse * m.rmse - mse).abs() < 1e-12);
    }

    #[test]
    fn test_mae_known_value() {
        let y_true = array![1.0, 2.0, 3.0];
        let y_pred = array![2.0, 2.0, 5.0];
        assert!((mean_absolute_error(&y_true, &y_pred) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_r2_of_mean_prediction_is_zero() {
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        let y_pred = array![2.5, 2.5, 2.5, 2.5];
        assert!(r2_score(&y_true, &y_pred).abs() < 1e-12);
    }
}

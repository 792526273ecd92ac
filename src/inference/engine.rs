//! Prediction engine
//!
//! Maps a validated [`FeatureVector`] to a bounded, confidence-annotated
//! prediction. The engine holds the loaded model for the process lifetime;
//! it is immutable after construction and safe to share across handlers.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::error::Result;
use crate::model::GradientBoostedRegressor;
use crate::schema::FeatureVector;

/// Human-readable label identifying the training run. Fixed per release,
/// not derived from artifact content.
pub const MODEL_VERSION: &str = "gbdt-v1.0";

/// Coarse confidence label derived from prediction magnitude.
///
/// Busier zone-hours are predicted more reliably, so magnitude stands in
/// for confidence. This is a deterministic step function, not a
/// statistical uncertainty estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Bucket the raw (unclamped) prediction.
    pub fn from_raw(raw: f64) -> Self {
        if raw < 5.0 {
            Confidence::Low
        } else if raw < 20.0 {
            Confidence::Medium
        } else {
            Confidence::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// A single prediction result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted pickup count, clamped to zero from below.
    pub predicted_pickups: f64,
    pub confidence: Confidence,
    pub model_version: String,
}

/// Stateless-per-request prediction service over a loaded model.
pub struct PredictionEngine {
    model: GradientBoostedRegressor,
    version: &'static str,
    inference_calls: AtomicU64,
}

impl PredictionEngine {
    pub fn new(model: GradientBoostedRegressor) -> Self {
        Self {
            model,
            version: MODEL_VERSION,
            inference_calls: AtomicU64::new(0),
        }
    }

    /// Predict pickups for one feature vector.
    ///
    /// The input row is built in schema order, the model is invoked once,
    /// and negative raw outputs are clamped to zero. The confidence bucket
    /// is computed from the raw value before clamping.
    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        let row = features.to_row();

        self.inference_calls.fetch_add(1, Ordering::Relaxed);
        let raw = self.model.predict_row(&row)?;

        let confidence = Confidence::from_raw(raw);
        let predicted = raw.max(0.0);
        debug!(
            raw = format!("{:.4}", raw).as_str(),
            confidence = confidence.as_str(),
            "Prediction made"
        );

        Ok(Prediction {
            predicted_pickups: predicted,
            confidence,
            model_version: self.version.to_string(),
        })
    }

    /// Number of model invocations since startup. Rejected requests never
    /// reach the model, so they leave this untouched.
    pub fn inference_calls(&self) -> u64 {
        self.inference_calls.load(Ordering::Relaxed)
    }
}

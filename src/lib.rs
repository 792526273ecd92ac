//! Demand forecast - NYC taxi demand prediction
//!
//! Trains a gradient-boosted regression model on pre-engineered demand
//! features, persists the model with its performance metadata, and serves
//! predictions over a synchronous HTTP API.
//!
//! # Modules
//!
//! - [`schema`] - The ordered feature schema shared by trainer and server
//! - [`data`] - Dataset split loading and matrix preparation
//! - [`model`] - Gradient boosted regression trees
//! - [`training`] - Training pipeline and evaluation metrics
//! - [`artifact`] - Model/metadata persistence
//! - [`inference`] - Prediction engine with clamping and confidence buckets
//! - [`server`] - HTTP API (`/health`, `/info`, `/predict`)
//! - [`cli`] - Command-line interface

pub mod error;

pub mod artifact;
pub mod cli;
pub mod data;
pub mod inference;
pub mod model;
pub mod schema;
pub mod server;
pub mod training;

pub use error::{ForecastError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::artifact::ArtifactStore;
    pub use crate::data::{feature_matrix, load_splits, DatasetSplits};
    pub use crate::error::{ForecastError, Result};
    pub use crate::inference::{Confidence, Prediction, PredictionEngine};
    pub use crate::model::{GradientBoostedRegressor, GradientBoostingConfig};
    pub use crate::schema::{FeatureVector, FEATURE_COLUMNS, N_FEATURES, TARGET_COLUMN};
    pub use crate::server::{create_router, AppState, ServerConfig};
    pub use crate::training::{train_and_evaluate, EvalReport, ResultsMetadata, SplitMetrics};
}

//! Model training pipeline
//!
//! [`train_and_evaluate`] is the whole contract: three splits and a
//! hyperparameter set in, fitted model and [`ResultsMetadata`] out.

pub mod metrics;
mod trainer;

pub use metrics::{EvalReport, SplitMetrics};
pub use trainer::{train_and_evaluate, ResultsMetadata};

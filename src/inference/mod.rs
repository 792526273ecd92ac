//! Model inference

mod engine;

pub use engine::{Confidence, Prediction, PredictionEngine, MODEL_VERSION};

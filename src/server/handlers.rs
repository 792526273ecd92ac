//! HTTP request handlers

use std::sync::Arc;
use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::inference::Prediction;
use crate::schema::{FeatureVector, N_FEATURES};
use crate::training::ResultsMetadata;

use super::error::{Result, ServerError};
use super::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub n_features: usize,
    pub test_mae: Option<f64>,
}

/// Health check. Populates the model cache if this is the first access;
/// metadata absence degrades to a null `test_mae`, never to a failure.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>> {
    let loaded = state
        .cache
        .get()
        .await
        .map_err(|e| ServerError::ModelUnavailable(e.to_string()))?;

    let test_mae = loaded.results.as_ref().map(|r| r.metrics.test.mae);

    Ok(Json(HealthResponse {
        status: "healthy",
        model_loaded: true,
        n_features: N_FEATURES,
        test_mae,
    }))
}

/// Model information: the full results metadata. Unlike health, this fails
/// outright when the metadata is absent, since exposing it is the whole
/// point of the endpoint.
pub async fn model_info(State(state): State<Arc<AppState>>) -> Result<Json<ResultsMetadata>> {
    let loaded = state
        .cache
        .get()
        .await
        .map_err(|e| ServerError::ModelUnavailable(e.to_string()))?;

    let results = loaded
        .results
        .as_ref()
        .ok_or(ServerError::MetadataUnavailable)?;

    Ok(Json(results.clone()))
}

/// Predict pickups for one zone-hour.
///
/// Missing or mistyped fields are rejected by the `Json` extractor before
/// this handler runs, so the model is never touched for malformed input.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FeatureVector>,
) -> Result<Json<Prediction>> {
    let loaded = state
        .cache
        .get()
        .await
        .map_err(|e| ServerError::ModelUnavailable(e.to_string()))?;

    let prediction = loaded
        .engine
        .predict(&request)
        .map_err(|e| ServerError::Prediction(e.to_string()))?;

    info!(
        predicted_pickups = format!("{:.2}", prediction.predicted_pickups).as_str(),
        confidence = prediction.confidence.as_str(),
        "Prediction served"
    );

    Ok(Json(prediction))
}

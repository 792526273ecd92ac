//! Error types for the serving API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Model not available: {0}")]
    ModelUnavailable(String),

    #[error("Results metadata not available")]
    MetadataUnavailable,

    #[error("Prediction error: {0}")]
    Prediction(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::ModelUnavailable(detail) => {
                tracing::error!(detail = %detail, "Model unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Model not available".to_string(),
                )
            }
            ServerError::MetadataUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Results metadata not available".to_string(),
            ),
            ServerError::Prediction(cause) => {
                tracing::error!(detail = %cause, "Prediction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Prediction error: {cause}"),
                )
            }
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

//! API error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Machine not found")]
    MachineNotFound(String),

    #[error("No current data available for machine")]
    NoData(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MachineNotFound(_) | ApiError::NoData(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::MachineNotFound(id) | ApiError::NoData(id) => {
                tracing::debug!(machine_id = %id, error = %self, "request rejected");
            }
        }
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

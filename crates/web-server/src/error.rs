use api_client::error::ApiError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Upstream error: {0}")]
    Upstream(#[from] ApiError),
    #[error("{0} is not configured")]
    NotConfigured(String),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Upstream(ApiError::NotConfigured(what)) | AppError::NotConfigured(what) => {
                tracing::warn!(what = %what, "Feature not configured.");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("{} is not configured", what),
                )
            }
            AppError::Upstream(api_err) => {
                tracing::error!(error = ?api_err, "Upstream error.");
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to generate summary".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

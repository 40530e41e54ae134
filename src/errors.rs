use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::external::forecast_service::ForecastServiceError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Fetch failed: {0}")]
    Transport(#[from] ForecastServiceError),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Length mismatch: {dates} dates but {values} values")]
    LengthMismatch { dates: usize, values: usize },
    #[error("Malformed date: {0}")]
    MalformedDate(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short machine-readable tag sent to the UI alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Transport(_) => "transport",
            AppError::Parse(_) => "parse",
            AppError::Validation(_) => "validation",
            AppError::LengthMismatch { .. } => "length_mismatch",
            AppError::MalformedDate(_) => "malformed_date",
            AppError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::LengthMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            // Only service payloads carry dates that can fail hard; uploads drop bad rows.
            AppError::MalformedDate(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

impl From<csv::Error> for AppError {
    fn from(value: csv::Error) -> Self {
        AppError::Parse(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::Parse(value.to_string())
    }
}

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{ArimaResponse, ForecastRequest, HistoricalResponse};

#[derive(Debug, Error)]
pub enum ForecastServiceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// The external statistics service that owns ARIMA fitting and diagnostics.
#[async_trait]
pub trait ForecastService: Send + Sync {
    async fn fetch_historical(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HistoricalResponse, ForecastServiceError>;

    async fn fetch_forecast(
        &self,
        request: &ForecastRequest,
    ) -> Result<ArimaResponse, ForecastServiceError>;
}

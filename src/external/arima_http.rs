use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::external::forecast_service::{ForecastService, ForecastServiceError};
use crate::models::{ArimaResponse, ForecastRequest, HistoricalResponse};

const ERROR_BODY_LIMIT: usize = 200;

/// reqwest-backed client for the statistics service (`/data`, `/arima`).
pub struct HttpForecastService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpForecastService {
    /// Build a client. With `timeout: None` requests wait as long as the
    /// service takes.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ForecastServiceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ForecastServiceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn historical_request(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> RequestBuilder {
        let start = start.to_string();
        let end = end.to_string();
        // `query` percent-encodes, so tickers like "BRK.B" or "^GSPC" survive.
        self.client
            .get(format!("{}/data", self.base_url))
            .query(&[
                ("ticker", ticker),
                ("start", start.as_str()),
                ("end", end.as_str()),
            ])
    }

    fn forecast_request(&self, request: &ForecastRequest) -> RequestBuilder {
        self.client
            .post(format!("{}/arima", self.base_url))
            .json(request)
    }
}

async fn send_and_decode<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ForecastServiceError> {
    let resp: Response = req
        .send()
        .await
        .map_err(|e| ForecastServiceError::Network(e.to_string()))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| ForecastServiceError::Network(e.to_string()))?;

    if !status.is_success() {
        return Err(ForecastServiceError::Status {
            status: status.as_u16(),
            body: truncate(&body, ERROR_BODY_LIMIT),
        });
    }

    serde_json::from_str(&body).map_err(|e| ForecastServiceError::Decode(e.to_string()))
}

fn truncate(body: &str, limit: usize) -> String {
    match body.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[async_trait]
impl ForecastService for HttpForecastService {
    async fn fetch_historical(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HistoricalResponse, ForecastServiceError> {
        debug!("GET {}/data ticker={} start={} end={}", self.base_url, ticker, start, end);
        send_and_decode(self.historical_request(ticker, start, end))
            .await
            .map_err(|e| {
                error!("Historical fetch for {} failed: {}", ticker, e);
                e
            })
    }

    async fn fetch_forecast(
        &self,
        request: &ForecastRequest,
    ) -> Result<ArimaResponse, ForecastServiceError> {
        debug!("POST {}/arima ticker={} auto={}", self.base_url, request.ticker, request.auto);
        send_and_decode(self.forecast_request(request))
            .await
            .map_err(|e| {
                error!("Forecast run for {} failed: {}", request.ticker, e);
                e
            })
    }
}

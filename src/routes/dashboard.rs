use std::future::Future;

use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{
    AcfPacfCharts, ArimaOrder, ChartSeries, DashboardParams, DashboardSnapshot, LoadOutcome,
    UploadReport,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TickerRequest {
    pub ticker: String,
}

#[derive(Debug, Deserialize)]
pub struct RangeRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct ForecastOptionsRequest {
    pub steps: i64,
    pub test_size: f64,
    pub auto: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_snapshot))
        .route("/ticker", put(set_ticker))
        .route("/range", put(set_range))
        .route("/order", put(set_order))
        .route("/forecast-options", put(set_forecast_options))
        .route("/historical", post(load_historical))
        .route("/forecast", post(run_forecast))
        .route("/uploads/csv", post(upload_csv))
        .route("/uploads/forecast", post(upload_forecast))
        .route("/charts/historical", get(historical_chart))
        .route("/charts/forecast", get(forecast_chart))
        .route("/charts/upload", get(upload_chart))
        .route("/charts/acf-pacf", get(acf_pacf_chart))
}

pub async fn get_snapshot(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.controller.snapshot())
}

pub async fn set_ticker(
    State(state): State<AppState>,
    Json(req): Json<TickerRequest>,
) -> Json<DashboardParams> {
    let ticker = req.ticker.trim().to_uppercase();
    info!("PUT /dashboard/ticker - Selecting {}", ticker);
    state.controller.set_ticker(ticker);
    Json(state.controller.params())
}

pub async fn set_range(
    State(state): State<AppState>,
    Json(req): Json<RangeRequest>,
) -> Json<DashboardParams> {
    info!("PUT /dashboard/range - {} to {}", req.start_date, req.end_date);
    state.controller.set_range(req.start_date, req.end_date);
    Json(state.controller.params())
}

pub async fn set_order(
    State(state): State<AppState>,
    Json(order): Json<ArimaOrder>,
) -> Json<DashboardParams> {
    info!("PUT /dashboard/order - ({}, {}, {})", order.p, order.d, order.q);
    state.controller.set_order(order);
    Json(state.controller.params())
}

pub async fn set_forecast_options(
    State(state): State<AppState>,
    Json(req): Json<ForecastOptionsRequest>,
) -> Json<DashboardParams> {
    info!(
        "PUT /dashboard/forecast-options - steps={} test_size={} auto={}",
        req.steps, req.test_size, req.auto
    );
    state.controller.set_forecast_options(req.steps, req.test_size, req.auto);
    Json(state.controller.params())
}

pub async fn load_historical(State(state): State<AppState>) -> Result<Json<LoadOutcome>, AppError> {
    info!("POST /dashboard/historical - Loading historical data");
    let controller = state.controller.clone();
    let outcome = run_detached(async move { controller.load_historical().await })
        .await
        .map_err(|e| {
            log_load_error("historical load", &e);
            e
        })?;
    Ok(Json(outcome))
}

pub async fn run_forecast(State(state): State<AppState>) -> Result<Json<LoadOutcome>, AppError> {
    info!("POST /dashboard/forecast - Running forecast");
    let controller = state.controller.clone();
    let outcome = run_detached(async move { controller.run_forecast().await })
        .await
        .map_err(|e| {
            log_load_error("forecast run", &e);
            e
        })?;
    Ok(Json(outcome))
}

pub async fn upload_csv(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<UploadReport>, AppError> {
    info!("POST /dashboard/uploads/csv - {} bytes", body.len());
    let report = state.controller.upload_csv(&body).map_err(|e| {
        warn!("CSV upload rejected: {}", e);
        e
    })?;
    Ok(Json(report))
}

pub async fn upload_forecast(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<UploadReport>, AppError> {
    info!("POST /dashboard/uploads/forecast - {} bytes", body.len());
    let report = state.controller.upload_forecast(&body).map_err(|e| {
        warn!("Forecast overlay upload rejected: {}", e);
        e
    })?;
    Ok(Json(report))
}

pub async fn historical_chart(State(state): State<AppState>) -> Json<ChartSeries> {
    Json(state.controller.historical_chart())
}

pub async fn forecast_chart(State(state): State<AppState>) -> Json<ChartSeries> {
    Json(state.controller.forecast_chart())
}

pub async fn upload_chart(State(state): State<AppState>) -> Json<ChartSeries> {
    Json(state.controller.upload_chart())
}

pub async fn acf_pacf_chart(State(state): State<AppState>) -> Result<Json<AcfPacfCharts>, AppError> {
    let charts = state.controller.acf_pacf_chart().map_err(|e| {
        error!("Failed to build ACF/PACF chart: {}", e);
        e
    })?;
    Ok(Json(charts))
}

/// Run a load on its own task so that a dropped request does not abandon it.
async fn run_detached<F>(load: F) -> Result<LoadOutcome, AppError>
where
    F: Future<Output = Result<LoadOutcome, AppError>> + Send + 'static,
{
    tokio::spawn(load)
        .await
        .map_err(|e| AppError::Internal(format!("load task failed: {}", e)))?
}

fn log_load_error(what: &str, e: &AppError) {
    match e {
        AppError::Validation(_) => warn!("Rejected {}: {}", what, e),
        _ => error!("Failed {}: {}", what, e),
    }
}

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::debug;

use crate::models::LoadStatus;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub historical: LoadStatus,
    pub forecast: LoadStatus,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health))
}

async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    debug!("GET /health - Health check");
    Json(HealthReport {
        status: "ok",
        historical: state.controller.historical_status(),
        forecast: state.controller.forecast_status(),
    })
}

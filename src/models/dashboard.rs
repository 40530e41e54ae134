use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    AcfPacfPair, ArimaOrder, ConfidenceBand, ForecastRequest, ResidualsSummary, RowIssue,
    StationarityCheck, TestStatistic, TimePoint,
};

/// The user's current selection. Replaced field-by-field by the setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardParams {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub order: ArimaOrder,
    pub steps: i64,
    pub test_size: f64,
    pub auto: bool,
}

impl DashboardParams {
    pub fn forecast_request(&self) -> ForecastRequest {
        ForecastRequest {
            ticker: self.ticker.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            order: self.order,
            steps: self.steps,
            test_size: self.test_size,
            auto: self.auto,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// What a load trigger did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded { cycle_id: Uuid },
    /// Another load of the same kind was already in flight.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSummary {
    pub skewness: f64,
    pub kurtosis: f64,
    pub adf_p_value: Option<f64>,
    pub adf_statistic: Option<f64>,
    pub kpss: Option<TestStatistic>,
    pub jarque_bera: Option<TestStatistic>,
    pub n_obs: Option<u64>,
    pub acf: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalResult {
    pub cycle_id: Uuid,
    pub requested: DashboardParams,
    pub series: Vec<TimePoint>,
    pub summary: HistoricalSummary,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub order: ArimaOrder,
    pub aic: f64,
    pub bic: f64,
    pub explanation: String,
    pub residuals_summary: Option<ResidualsSummary>,
    pub ljungbox_pvalues: HashMap<String, f64>,
    /// One entry per forecast date; empty when the service sent no interval.
    pub confidence_band: Vec<ConfidenceBand>,
    pub adf: Option<StationarityCheck>,
    pub kpss: Option<StationarityCheck>,
    pub acf_pacf: AcfPacfPair,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub cycle_id: Uuid,
    pub requested: DashboardParams,
    /// Historical prices followed by forecast points.
    pub merged: Vec<TimePoint>,
    pub summary: ForecastSummary,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub series: Vec<TimePoint>,
    pub overlay: Vec<TimePoint>,
    pub issues: Vec<RowIssue>,
}

/// Returned to the uploader: how many points were kept and which rows were not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReport {
    pub accepted: usize,
    pub issues: Vec<RowIssue>,
}

/// Status of one async slot as shown to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotView<S> {
    pub status: LoadStatus,
    pub last_error: Option<String>,
    pub cycle_id: Option<Uuid>,
    /// The held result was requested with parameters that have since changed.
    /// A historical result only tracks ticker and range. A forecast result
    /// tracks every parameter except the order when both runs are `auto`,
    /// since the service then picks the order itself.
    pub stale: bool,
    pub summary: Option<S>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub params: DashboardParams,
    pub historical: SlotView<HistoricalSummary>,
    pub forecast: SlotView<ForecastSummary>,
    pub upload_points: usize,
    pub overlay_points: usize,
    pub upload_issues: Vec<RowIssue>,
}

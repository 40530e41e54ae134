use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// ARIMA order (p, d, q).
///
/// Kept signed so that out-of-range input coming from the UI can be rejected
/// with a validation message instead of a deserialization failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: i64, // autoregressive terms
    pub d: i64, // differencing passes
    pub q: i64, // moving-average terms
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self { p: 1, d: 0, q: 1 }
    }
}

/// Body of `POST {BASE}/arima`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub order: ArimaOrder,
    pub steps: i64,
    pub test_size: f64,
    /// When set the service grid-searches p/q and ignores `order`.
    pub auto: bool,
}

// ---------------------------------------------------------------------------
// GET {BASE}/data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceDataRow {
    pub date: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnDataRow {
    pub date: String,
    #[serde(rename = "return")]
    pub return_: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestStatistic {
    #[serde(default)]
    pub statistic: Option<f64>,
    #[serde(default)]
    pub p_value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalResponse {
    #[serde(default)]
    pub ticker: Option<String>,
    pub price_data: Vec<PriceDataRow>,
    #[serde(default)]
    pub returns_data: Vec<ReturnDataRow>,
    pub skewness: f64,
    pub kurtosis: f64,
    pub adf: TestStatistic,
    #[serde(default)]
    pub kpss: Option<TestStatistic>,
    #[serde(default)]
    pub jarque_bera: Option<TestStatistic>,
    #[serde(default)]
    pub n_obs: Option<u64>,
    #[serde(default)]
    pub acf: Vec<f64>,
}

// ---------------------------------------------------------------------------
// POST {BASE}/arima
// ---------------------------------------------------------------------------

/// Autocorrelation diagnostics over lag indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcfPacf {
    pub lags: Vec<i64>,
    pub acf: Vec<f64>,
    pub pacf: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcfPacfPair {
    pub prices: AcfPacf,
    pub returns: AcfPacf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResidualsSummary {
    pub mean: f64,
    pub std: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

/// A stationarity test as `/arima` reports it: the raw statsmodels tuple
/// (`[statistic, p_value, ...]`) and a human-readable verdict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationarityReport {
    #[serde(default)]
    pub result: Vec<serde_json::Value>,
    #[serde(default)]
    pub response: String,
}

impl StationarityReport {
    pub fn to_check(&self) -> StationarityCheck {
        StationarityCheck {
            statistic: self.result.first().and_then(|v| v.as_f64()),
            p_value: self.result.get(1).and_then(|v| v.as_f64()),
            verdict: self.response.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationarityCheck {
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub verdict: String,
}

/// 95% interval reported for one forecast date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub date: NaiveDate,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArimaResponse {
    #[serde(default)]
    pub ticker: Option<String>,
    /// Keyed by date string; iteration order carries no meaning.
    pub prices: HashMap<String, f64>,
    #[serde(default)]
    pub returns: HashMap<String, f64>,
    pub forecast_dates: Vec<String>,
    pub forecast: Vec<f64>,
    pub order: ArimaOrder,
    pub aic: f64,
    pub bic: f64,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub lower_ci: Vec<f64>,
    #[serde(default)]
    pub upper_ci: Vec<f64>,
    #[serde(default)]
    pub residuals_summary: Option<ResidualsSummary>,
    #[serde(default)]
    pub ljungbox_pvalues: HashMap<String, f64>,
    #[serde(default)]
    pub adf: Option<StationarityReport>,
    #[serde(default)]
    pub kpss: Option<StationarityReport>,
    #[serde(default)]
    pub acf_pacf: AcfPacfPair,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stationarity_report_from_statsmodels_tuple() {
        let report: StationarityReport = serde_json::from_value(json!({
            "result": [-5.12, 0.0001, 3, 245, {"1%": -3.45, "5%": -2.87}, 812.4],
            "response": "Null Hypothesis (H0): The series is non-stationary.\n--> Returns is stationary (reject H0)"
        }))
        .unwrap();

        let check = report.to_check();
        assert_eq!(check.statistic, Some(-5.12));
        assert_eq!(check.p_value, Some(0.0001));
        assert!(check.verdict.ends_with("(reject H0)"));
    }

    #[test]
    fn test_stationarity_report_tolerates_missing_result() {
        let report: StationarityReport = serde_json::from_value(json!({"response": "n/a"})).unwrap();
        let check = report.to_check();
        assert_eq!(check.statistic, None);
        assert_eq!(check.p_value, None);
    }
}

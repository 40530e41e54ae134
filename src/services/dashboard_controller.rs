//! Dashboard view state: the user's selection plus the derived series.
//!
//! Each async load (historical, forecast) runs `Idle -> Loading -> Loaded|Failed`.
//! While a slot is `Loading` further triggers of the same kind are ignored.
//! The lock is only held to flip status and to swap results, never across
//! an `.await`, so a settled fetch is applied in one step.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::external::forecast_service::ForecastService;
use crate::models::{
    AcfPacfCharts, ArimaOrder, ChartSeries, DashboardParams, DashboardSnapshot, ForecastResult,
    ForecastSummary, HistoricalResult, HistoricalSummary, LoadOutcome, LoadStatus, SlotView,
    UploadReport, UploadResult,
};
use crate::services::{chart_adapter, series_normalizer, upload_service};

struct Slot<T> {
    status: LoadStatus,
    last_error: Option<String>,
    result: Option<Arc<T>>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            status: LoadStatus::Idle,
            last_error: None,
            result: None,
        }
    }
}

impl<T> Slot<T> {
    fn settle(&mut self, outcome: Result<T, AppError>) -> Result<Arc<T>, AppError> {
        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                self.status = LoadStatus::Loaded;
                self.last_error = None;
                self.result = Some(result.clone());
                Ok(result)
            }
            Err(e) => {
                // The previous result stays on screen.
                self.status = LoadStatus::Failed;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SlotKind {
    Historical,
    Forecast,
}

struct DashboardState {
    params: DashboardParams,
    historical: Slot<HistoricalResult>,
    forecast: Slot<ForecastResult>,
    upload: Arc<UploadResult>,
}

impl DashboardState {
    fn status_mut(&mut self, kind: SlotKind) -> (&mut LoadStatus, &mut Option<String>) {
        match kind {
            SlotKind::Historical => (&mut self.historical.status, &mut self.historical.last_error),
            SlotKind::Forecast => (&mut self.forecast.status, &mut self.forecast.last_error),
        }
    }
}

/// Marks a slot `Failed` if the load future is dropped before it settles.
struct InFlight<'a> {
    state: &'a Mutex<DashboardState>,
    kind: SlotKind,
    armed: bool,
}

impl InFlight<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock();
        let (status, last_error) = state.status_mut(self.kind);
        if *status == LoadStatus::Loading {
            warn!("{:?} load abandoned before it settled", self.kind);
            *status = LoadStatus::Failed;
            *last_error = Some("load abandoned before completion".to_string());
        }
    }
}

pub struct DashboardController {
    service: Arc<dyn ForecastService>,
    state: Mutex<DashboardState>,
}

impl DashboardController {
    pub fn new(service: Arc<dyn ForecastService>, params: DashboardParams) -> Self {
        Self {
            service,
            state: Mutex::new(DashboardState {
                params,
                historical: Slot::default(),
                forecast: Slot::default(),
                upload: Arc::new(UploadResult::default()),
            }),
        }
    }

    pub fn params(&self) -> DashboardParams {
        self.state.lock().params.clone()
    }

    pub fn set_ticker(&self, ticker: impl Into<String>) {
        self.state.lock().params.ticker = ticker.into();
    }

    pub fn set_range(&self, start_date: NaiveDate, end_date: NaiveDate) {
        let mut state = self.state.lock();
        state.params.start_date = start_date;
        state.params.end_date = end_date;
    }

    pub fn set_order(&self, order: ArimaOrder) {
        self.state.lock().params.order = order;
    }

    pub fn set_forecast_options(&self, steps: i64, test_size: f64, auto: bool) {
        let mut state = self.state.lock();
        state.params.steps = steps;
        state.params.test_size = test_size;
        state.params.auto = auto;
    }

    pub fn historical_status(&self) -> LoadStatus {
        self.state.lock().historical.status
    }

    pub fn forecast_status(&self) -> LoadStatus {
        self.state.lock().forecast.status
    }

    pub fn historical_result(&self) -> Option<Arc<HistoricalResult>> {
        self.state.lock().historical.result.clone()
    }

    pub fn forecast_result(&self) -> Option<Arc<ForecastResult>> {
        self.state.lock().forecast.result.clone()
    }

    pub fn upload_result(&self) -> Arc<UploadResult> {
        self.state.lock().upload.clone()
    }

    /// Fetch the ticker's price history and summary statistics.
    pub async fn load_historical(&self) -> Result<LoadOutcome, AppError> {
        let params = {
            let mut state = self.state.lock();
            if state.historical.status == LoadStatus::Loading {
                warn!("Historical load already in flight, ignoring trigger");
                return Ok(LoadOutcome::Ignored);
            }
            validate_selection(&state.params)?;
            state.historical.status = LoadStatus::Loading;
            state.params.clone()
        };

        let guard = InFlight {
            state: &self.state,
            kind: SlotKind::Historical,
            armed: true,
        };
        let cycle_id = Uuid::new_v4();
        info!(
            "Loading historical data for {} ({} to {}), cycle {}",
            params.ticker, params.start_date, params.end_date, cycle_id
        );

        let outcome = self.fetch_historical(cycle_id, params).await;

        let mut state = self.state.lock();
        guard.disarm();
        let result = state.historical.settle(outcome).map_err(|e| {
            error!("Historical load {} failed: {}", cycle_id, e);
            e
        })?;
        info!("Historical load {} settled with {} points", cycle_id, result.series.len());
        Ok(LoadOutcome::Loaded { cycle_id })
    }

    /// Ask the service for an ARIMA forecast and merge it with the price history.
    pub async fn run_forecast(&self) -> Result<LoadOutcome, AppError> {
        let params = {
            let mut state = self.state.lock();
            if state.forecast.status == LoadStatus::Loading {
                warn!("Forecast run already in flight, ignoring trigger");
                return Ok(LoadOutcome::Ignored);
            }
            validate_forecast_params(&state.params)?;
            state.forecast.status = LoadStatus::Loading;
            state.params.clone()
        };

        let guard = InFlight {
            state: &self.state,
            kind: SlotKind::Forecast,
            armed: true,
        };
        let cycle_id = Uuid::new_v4();
        info!(
            "Running forecast for {} order={:?} auto={} steps={} test_size={}, cycle {}",
            params.ticker, params.order, params.auto, params.steps, params.test_size, cycle_id
        );

        let outcome = self.fetch_forecast(cycle_id, params).await;

        let mut state = self.state.lock();
        guard.disarm();
        let result = state.forecast.settle(outcome).map_err(|e| {
            error!("Forecast run {} failed: {}", cycle_id, e);
            e
        })?;
        info!("Forecast run {} settled with {} merged points", cycle_id, result.merged.len());
        Ok(LoadOutcome::Loaded { cycle_id })
    }

    async fn fetch_historical(
        &self,
        cycle_id: Uuid,
        params: DashboardParams,
    ) -> Result<HistoricalResult, AppError> {
        let resp = self
            .service
            .fetch_historical(&params.ticker, params.start_date, params.end_date)
            .await?;

        let series = series_normalizer::normalize_price_data(&resp.price_data, &resp.returns_data)?;

        Ok(HistoricalResult {
            cycle_id,
            requested: params,
            series,
            summary: HistoricalSummary {
                skewness: resp.skewness,
                kurtosis: resp.kurtosis,
                adf_p_value: resp.adf.p_value,
                adf_statistic: resp.adf.statistic,
                kpss: resp.kpss,
                jarque_bera: resp.jarque_bera,
                n_obs: resp.n_obs,
                acf: resp.acf,
            },
            loaded_at: Utc::now(),
        })
    }

    async fn fetch_forecast(
        &self,
        cycle_id: Uuid,
        params: DashboardParams,
    ) -> Result<ForecastResult, AppError> {
        let resp = self.service.fetch_forecast(&params.forecast_request()).await?;

        let mut historical = series_normalizer::normalize_historical(&resp.prices)?;
        series_normalizer::attach_returns(&mut historical, &resp.returns)?;
        let forecast = series_normalizer::normalize_forecast(&resp.forecast_dates, &resp.forecast)?;
        let merged = series_normalizer::merge(&historical, &forecast);
        let confidence_band = series_normalizer::normalize_confidence_band(
            &resp.forecast_dates,
            &resp.lower_ci,
            &resp.upper_ci,
        )?;

        Ok(ForecastResult {
            cycle_id,
            requested: params,
            merged,
            summary: ForecastSummary {
                order: resp.order,
                aic: resp.aic,
                bic: resp.bic,
                explanation: resp.explanation,
                residuals_summary: resp.residuals_summary,
                ljungbox_pvalues: resp.ljungbox_pvalues,
                confidence_band,
                adf: resp.adf.as_ref().map(|r| r.to_check()),
                kpss: resp.kpss.as_ref().map(|r| r.to_check()),
                acf_pacf: resp.acf_pacf,
            },
            loaded_at: Utc::now(),
        })
    }

    /// Replace the uploaded series with the rows of a `date,price,returns` CSV.
    pub fn upload_csv(&self, text: &str) -> Result<UploadReport, AppError> {
        let csv = upload_service::parse_csv_upload(text)?;
        let normalized = series_normalizer::normalize_upload(&csv.rows);

        let mut issues = csv.issues;
        issues.extend(normalized.issues.into_iter().map(|mut issue| {
            // Point back at the CSV record rather than the kept-row index.
            issue.row = csv.row_numbers.get(issue.row - 1).copied().unwrap_or(issue.row);
            issue
        }));
        issues.sort_by_key(|i| i.row);

        if normalized.points.is_empty() {
            return Err(AppError::Parse("no usable rows in upload".to_string()));
        }

        let accepted = normalized.points.len();
        let mut state = self.state.lock();
        let overlay = state.upload.overlay.clone();
        state.upload = Arc::new(UploadResult {
            series: normalized.points,
            overlay,
            issues: issues.clone(),
        });
        info!("CSV upload accepted {} points, {} rows skipped", accepted, issues.len());

        Ok(UploadReport { accepted, issues })
    }

    /// Replace the forecast overlay drawn on top of the uploaded series.
    pub fn upload_forecast(&self, text: &str) -> Result<UploadReport, AppError> {
        let upload = upload_service::parse_forecast_upload(text)?;
        let overlay = series_normalizer::normalize_forecast(&upload.dates, &upload.prices)
            .map_err(|e| match e {
                // A bad date in the user's document is a malformed upload.
                AppError::MalformedDate(msg) => AppError::Parse(msg),
                other => other,
            })?;

        let accepted = overlay.len();
        let mut state = self.state.lock();
        let previous = state.upload.clone();
        state.upload = Arc::new(UploadResult {
            series: previous.series.clone(),
            overlay,
            issues: previous.issues.clone(),
        });
        info!("Forecast overlay upload accepted {} points", accepted);

        Ok(UploadReport {
            accepted,
            issues: Vec::new(),
        })
    }

    pub fn historical_chart(&self) -> ChartSeries {
        self.historical_result()
            .map(|r| chart_adapter::to_chart_series(&r.series))
            .unwrap_or_default()
    }

    pub fn forecast_chart(&self) -> ChartSeries {
        self.forecast_result()
            .map(|r| chart_adapter::to_forecast_chart(&r.merged, &r.summary.confidence_band))
            .unwrap_or_default()
    }

    pub fn upload_chart(&self) -> ChartSeries {
        let upload = self.upload_result();
        chart_adapter::to_chart_series(&series_normalizer::merge(&upload.series, &upload.overlay))
    }

    pub fn acf_pacf_chart(&self) -> Result<AcfPacfCharts, AppError> {
        match self.forecast_result() {
            Some(r) => chart_adapter::acf_pacf_charts(&r.summary.acf_pacf),
            None => Ok(AcfPacfCharts::default()),
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let state = self.state.lock();
        let params = state.params.clone();

        let historical = SlotView {
            status: state.historical.status,
            last_error: state.historical.last_error.clone(),
            cycle_id: state.historical.result.as_ref().map(|r| r.cycle_id),
            stale: state
                .historical
                .result
                .as_ref()
                .is_some_and(|r| !same_selection(&r.requested, &params)),
            summary: state.historical.result.as_ref().map(|r| r.summary.clone()),
        };

        let forecast = SlotView {
            status: state.forecast.status,
            last_error: state.forecast.last_error.clone(),
            cycle_id: state.forecast.result.as_ref().map(|r| r.cycle_id),
            stale: state
                .forecast
                .result
                .as_ref()
                .is_some_and(|r| !same_forecast_inputs(&r.requested, &params)),
            summary: state.forecast.result.as_ref().map(|r| r.summary.clone()),
        };

        DashboardSnapshot {
            params,
            historical,
            forecast,
            upload_points: state.upload.series.len(),
            overlay_points: state.upload.overlay.len(),
            upload_issues: state.upload.issues.clone(),
        }
    }
}

/// Historical data depends only on ticker and range.
fn same_selection(a: &DashboardParams, b: &DashboardParams) -> bool {
    a.ticker == b.ticker && a.start_date == b.start_date && a.end_date == b.end_date
}

/// In auto mode the service searches the order itself, so it is not an input.
fn same_forecast_inputs(a: &DashboardParams, b: &DashboardParams) -> bool {
    same_selection(a, b)
        && a.steps == b.steps
        && a.test_size == b.test_size
        && a.auto == b.auto
        && (a.auto || a.order == b.order)
}

fn validate_selection(params: &DashboardParams) -> Result<(), AppError> {
    if params.ticker.trim().is_empty() {
        return Err(AppError::Validation("ticker must not be empty".to_string()));
    }
    if params.start_date > params.end_date {
        return Err(AppError::Validation(format!(
            "start date {} is after end date {}",
            params.start_date, params.end_date
        )));
    }
    Ok(())
}

fn validate_forecast_params(params: &DashboardParams) -> Result<(), AppError> {
    validate_selection(params)?;

    let order = params.order;
    for (name, value) in [("p", order.p), ("d", order.d), ("q", order.q)] {
        if value < 0 {
            return Err(AppError::Validation(format!(
                "ARIMA parameter {} must be a non-negative integer, got {}",
                name.to_uppercase(),
                value
            )));
        }
    }
    if !(params.test_size > 0.0 && params.test_size < 1.0) {
        return Err(AppError::Validation(format!(
            "test size must be between 0 and 1 (exclusive), got {}",
            params.test_size
        )));
    }
    if params.steps <= 0 {
        return Err(AppError::Validation(format!(
            "steps must be positive, got {}",
            params.steps
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::external::forecast_service::ForecastServiceError;
    use crate::models::{
        AcfPacf, AcfPacfPair, ArimaResponse, ForecastRequest, HistoricalResponse, PriceDataRow,
        StationarityReport, TestStatistic,
    };
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn params() -> DashboardParams {
        DashboardParams {
            ticker: "AAPL".into(),
            start_date: d(2023, 1, 1),
            end_date: d(2023, 3, 1),
            order: ArimaOrder::default(),
            steps: 20,
            test_size: 0.2,
            auto: true,
        }
    }

    fn historical_response() -> HistoricalResponse {
        HistoricalResponse {
            ticker: Some("AAPL".into()),
            price_data: vec![
                PriceDataRow { date: "2023-01-02".into(), price: 155.0 },
                PriceDataRow { date: "2023-01-01".into(), price: 150.0 },
            ],
            returns_data: Vec::new(),
            skewness: 0.1,
            kurtosis: 3.2,
            adf: TestStatistic { statistic: Some(-4.1), p_value: Some(0.001) },
            kpss: None,
            jarque_bera: None,
            n_obs: Some(2),
            acf: Vec::new(),
        }
    }

    fn arima_response() -> ArimaResponse {
        ArimaResponse {
            ticker: Some("AAPL".into()),
            prices: HashMap::from([
                ("2023-01-03T00:00:00".to_string(), 160.0),
                ("2023-01-01T00:00:00".to_string(), 150.0),
            ]),
            returns: HashMap::new(),
            forecast_dates: vec!["2023-01-04".into(), "2023-01-05".into()],
            forecast: vec![161.0, 162.5],
            order: ArimaOrder { p: 1, d: 0, q: 1 },
            aic: 10.5,
            bic: 12.0,
            explanation: "ok".into(),
            lower_ci: vec![-0.031, -0.044],
            upper_ci: vec![0.033, 0.047],
            residuals_summary: None,
            ljungbox_pvalues: HashMap::new(),
            adf: Some(StationarityReport {
                result: vec![json!(-12.4), json!(0.0), json!(1), json!(250)],
                response: "--> Returns is stationary (reject H0)".into(),
            }),
            kpss: None,
            acf_pacf: AcfPacfPair {
                prices: AcfPacf { lags: vec![0, 1], acf: vec![1.0, 0.9], pacf: vec![1.0, 0.8] },
                returns: AcfPacf::default(),
            },
        }
    }

    /// Scripted service: counts calls and can hold a call until released.
    #[derive(Default)]
    struct ScriptedService {
        historical_calls: AtomicUsize,
        forecast_calls: AtomicUsize,
        fail_historical: bool,
        fail_forecast: bool,
        gate: Option<(Arc<Notify>, Arc<Notify>)>,
    }

    impl ScriptedService {
        async fn hold(&self) {
            if let Some((started, release)) = &self.gate {
                started.notify_one();
                release.notified().await;
            }
        }
    }

    #[async_trait]
    impl ForecastService for ScriptedService {
        async fn fetch_historical(
            &self,
            _ticker: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<HistoricalResponse, ForecastServiceError> {
            self.historical_calls.fetch_add(1, Ordering::SeqCst);
            self.hold().await;
            if self.fail_historical {
                return Err(ForecastServiceError::Status { status: 500, body: "boom".into() });
            }
            Ok(historical_response())
        }

        async fn fetch_forecast(
            &self,
            _request: &ForecastRequest,
        ) -> Result<ArimaResponse, ForecastServiceError> {
            self.forecast_calls.fetch_add(1, Ordering::SeqCst);
            self.hold().await;
            if self.fail_forecast {
                return Err(ForecastServiceError::Network("connection refused".into()));
            }
            Ok(arima_response())
        }
    }

    #[tokio::test]
    async fn test_load_historical_success() {
        let controller = DashboardController::new(Arc::new(ScriptedService::default()), params());

        let outcome = controller.load_historical().await.unwrap();
        assert!(matches!(outcome, LoadOutcome::Loaded { .. }));
        assert_eq!(controller.historical_status(), LoadStatus::Loaded);

        let result = controller.historical_result().unwrap();
        assert_eq!(result.series[0].date, d(2023, 1, 1));
        assert_eq!(result.summary.adf_p_value, Some(0.001));
    }

    #[tokio::test]
    async fn test_historical_failure_keeps_previous_series() {
        let ok = DashboardController::new(Arc::new(ScriptedService::default()), params());
        ok.load_historical().await.unwrap();
        let previous = ok.historical_result().unwrap();

        // Swap in a failing service while keeping the loaded state.
        let failing = DashboardController {
            service: Arc::new(ScriptedService { fail_historical: true, ..Default::default() }),
            state: Mutex::new(ok.state.into_inner()),
        };

        let err = failing.load_historical().await.unwrap_err();
        assert!(matches!(err, AppError::Transport(ForecastServiceError::Status { status: 500, .. })));
        assert_eq!(failing.historical_status(), LoadStatus::Failed);
        assert_eq!(failing.historical_result().unwrap().series, previous.series);
        assert!(failing.snapshot().historical.last_error.is_some());
    }

    #[tokio::test]
    async fn test_run_forecast_merges_sorted_history_and_forecast() {
        let controller = DashboardController::new(Arc::new(ScriptedService::default()), params());

        controller.run_forecast().await.unwrap();
        let result = controller.forecast_result().unwrap();

        let dates: Vec<_> = result.merged.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(2023, 1, 1), d(2023, 1, 3), d(2023, 1, 4), d(2023, 1, 5)]);
        assert_eq!(result.merged[1].price, Some(160.0));
        assert_eq!(result.merged[3].forecast, Some(162.5));
        assert_eq!(controller.acf_pacf_chart().unwrap().prices.len(), 2);
    }

    #[tokio::test]
    async fn test_forecast_keeps_interval_and_stationarity() {
        let controller = DashboardController::new(Arc::new(ScriptedService::default()), params());
        controller.run_forecast().await.unwrap();

        let summary = controller.forecast_result().unwrap().summary.clone();
        assert_eq!(summary.confidence_band.len(), 2);
        assert_eq!(summary.confidence_band[1].date, d(2023, 1, 5));
        assert_eq!(summary.confidence_band[1].upper, 0.047);

        let adf = summary.adf.unwrap();
        assert_eq!(adf.statistic, Some(-12.4));
        assert!(adf.verdict.contains("stationary"));
        assert!(summary.kpss.is_none());

        let chart = controller.forecast_chart();
        assert_eq!(chart.lower_band[0].value, None);
        assert_eq!(chart.lower_band[2].value, Some(-0.031));
        assert_eq!(chart.upper_band[3].value, Some(0.047));
    }

    #[tokio::test]
    async fn test_second_historical_load_while_loading_is_ignored() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let service = Arc::new(ScriptedService {
            gate: Some((started.clone(), release.clone())),
            ..Default::default()
        });
        let controller = Arc::new(DashboardController::new(service.clone(), params()));

        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.load_historical().await })
        };
        started.notified().await;
        assert_eq!(controller.historical_status(), LoadStatus::Loading);

        let second = controller.load_historical().await.unwrap();
        assert_eq!(second, LoadOutcome::Ignored);
        assert_eq!(service.historical_calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.historical_status(), LoadStatus::Loading);

        release.notify_one();
        assert!(matches!(first.await.unwrap().unwrap(), LoadOutcome::Loaded { .. }));
        assert_eq!(controller.historical_status(), LoadStatus::Loaded);
        assert_eq!(service.historical_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_forecast_validation_skips_network() {
        let service = Arc::new(ScriptedService::default());
        let controller = DashboardController::new(service.clone(), params());

        controller.set_order(ArimaOrder { p: -1, d: 0, q: 1 });
        assert!(matches!(controller.run_forecast().await, Err(AppError::Validation(_))));

        controller.set_order(ArimaOrder::default());
        controller.set_forecast_options(20, 1.0, true);
        assert!(matches!(controller.run_forecast().await, Err(AppError::Validation(_))));

        controller.set_forecast_options(0, 0.2, true);
        assert!(matches!(controller.run_forecast().await, Err(AppError::Validation(_))));

        assert_eq!(service.forecast_calls.load(Ordering::SeqCst), 0);
        assert_eq!(controller.forecast_status(), LoadStatus::Idle);
    }

    #[tokio::test]
    async fn test_second_forecast_while_loading_is_ignored() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let service = Arc::new(ScriptedService {
            gate: Some((started.clone(), release.clone())),
            ..Default::default()
        });
        let controller = Arc::new(DashboardController::new(service.clone(), params()));

        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.run_forecast().await })
        };
        started.notified().await;
        assert_eq!(controller.forecast_status(), LoadStatus::Loading);

        let second = controller.run_forecast().await.unwrap();
        assert_eq!(second, LoadOutcome::Ignored);
        assert_eq!(service.forecast_calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.forecast_status(), LoadStatus::Loading);

        release.notify_one();
        let first = first.await.unwrap().unwrap();
        assert!(matches!(first, LoadOutcome::Loaded { .. }));
        assert_eq!(controller.forecast_status(), LoadStatus::Loaded);
    }

    #[tokio::test]
    async fn test_abandoned_load_does_not_stay_loading() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let service = Arc::new(ScriptedService {
            gate: Some((started.clone(), release)),
            ..Default::default()
        });
        let controller = Arc::new(DashboardController::new(service, params()));

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.run_forecast().await })
        };
        started.notified().await;
        task.abort();
        let _ = task.await;

        assert_eq!(controller.forecast_status(), LoadStatus::Failed);
    }

    #[tokio::test]
    async fn test_result_marked_stale_after_param_change() {
        let controller = DashboardController::new(Arc::new(ScriptedService::default()), params());
        controller.load_historical().await.unwrap();
        controller.run_forecast().await.unwrap();
        assert!(!controller.snapshot().historical.stale);

        controller.set_forecast_options(30, 0.2, true);
        let snapshot = controller.snapshot();
        assert!(!snapshot.historical.stale);
        assert!(snapshot.forecast.stale);

        controller.set_ticker("MSFT");
        assert!(controller.snapshot().historical.stale);
    }

    #[tokio::test]
    async fn test_order_change_in_auto_mode_is_not_stale() {
        let controller = DashboardController::new(Arc::new(ScriptedService::default()), params());
        controller.run_forecast().await.unwrap();

        controller.set_order(ArimaOrder { p: 3, d: 1, q: 3 });
        assert!(!controller.snapshot().forecast.stale);

        controller.set_forecast_options(20, 0.2, false);
        assert!(controller.snapshot().forecast.stale);
    }

    #[test]
    fn test_upload_csv_and_overlay() {
        let controller = DashboardController::new(Arc::new(ScriptedService::default()), params());

        let report = controller
            .upload_csv("date,price,returns\n2023-01-01,150,0\n,1,0\n2023-01-02,155,0.033\n")
            .unwrap();
        assert_eq!(report.accepted, 2);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].row, 2);

        controller
            .upload_forecast(r#"{"dates":["2023-01-03"],"prices":[158.0]}"#)
            .unwrap();
        let chart = controller.upload_chart();
        assert_eq!(chart.price_line.len(), 3);
        assert_eq!(chart.forecast_line[2].value, Some(158.0));
        assert_eq!(chart.price_line[2].value, None);
    }

    #[test]
    fn test_bad_overlay_keeps_previous_overlay() {
        let controller = DashboardController::new(Arc::new(ScriptedService::default()), params());
        controller
            .upload_forecast(r#"{"dates":["2023-01-03"],"prices":[158.0]}"#)
            .unwrap();

        let err = controller
            .upload_forecast(r#"{"dates":["2023-01-03","2023-01-04","2023-01-05"],"prices":[1.0,2.0]}"#)
            .unwrap_err();
        assert!(matches!(err, AppError::LengthMismatch { dates: 3, values: 2 }));
        assert_eq!(controller.upload_result().overlay.len(), 1);
    }

    #[test]
    fn test_bad_overlay_date_is_parse_error() {
        let controller = DashboardController::new(Arc::new(ScriptedService::default()), params());
        controller
            .upload_forecast(r#"{"dates":["2023-01-03"],"prices":[158.0]}"#)
            .unwrap();

        let err = controller
            .upload_forecast(r#"{"dates":["02/01/2023"],"prices":[1.0]}"#)
            .unwrap_err();
        assert!(matches!(err, AppError::Parse(ref msg) if msg.contains("02/01/2023")));
        assert_eq!(err.kind(), "parse");
        assert_eq!(controller.upload_result().overlay.len(), 1);
    }

    #[test]
    fn test_empty_upload_is_rejected() {
        let controller = DashboardController::new(Arc::new(ScriptedService::default()), params());
        assert!(matches!(
            controller.upload_csv("date,price,returns\n,1,0\n"),
            Err(AppError::Parse(_))
        ));
    }
}

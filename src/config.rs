use std::net::SocketAddr;
use std::time::Duration;

use chrono::NaiveDate;

use crate::errors::AppError;
use crate::models::{ArimaOrder, DashboardParams};

pub const DEFAULT_FORECAST_API_BASE: &str = "http://localhost:5173/api";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub forecast_api_base: String,
    pub service_timeout: Option<Duration>,
    pub bind_addr: SocketAddr,
    pub default_params: DashboardParams,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Unset or blank keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let forecast_api_base =
            var("FORECAST_API_BASE").unwrap_or_else(|| DEFAULT_FORECAST_API_BASE.to_string());
        url::Url::parse(&forecast_api_base).map_err(|e| {
            AppError::Validation(format!("FORECAST_API_BASE '{}' is not a URL: {}", forecast_api_base, e))
        })?;

        let service_timeout = match var("FORECAST_SERVICE_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    AppError::Validation(format!(
                        "FORECAST_SERVICE_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                        raw
                    ))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let raw_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| AppError::Validation(format!("BIND_ADDR '{}' is not a socket address", raw_addr)))?;

        let ticker = var("DEFAULT_TICKER").unwrap_or_else(|| "AAPL".to_string());
        let start_date = date_var(&var, "DEFAULT_START_DATE", "2020-01-01")?;
        let end_date = date_var(&var, "DEFAULT_END_DATE", "2024-01-01")?;
        if start_date > end_date {
            return Err(AppError::Validation(format!(
                "DEFAULT_START_DATE {} is after DEFAULT_END_DATE {}",
                start_date, end_date
            )));
        }

        Ok(Self {
            forecast_api_base,
            service_timeout,
            bind_addr,
            default_params: DashboardParams {
                ticker: ticker.trim().to_uppercase(),
                start_date,
                end_date,
                order: ArimaOrder::default(),
                steps: 20,
                test_size: 0.2,
                auto: true,
            },
        })
    }
}

fn date_var<F>(var: &F, key: &str, default: &str) -> Result<NaiveDate, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = var(key).unwrap_or_else(|| default.to_string());
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{} '{}' is not a YYYY-MM-DD date", key, raw)))
}

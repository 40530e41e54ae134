use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical per-date unit that every chart input is built from.
///
/// A point always carries at least one of `price`, `return_` or `forecast`;
/// the normalizer drops rows that would produce an empty point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(rename = "return", default, skip_serializing_if = "Option::is_none")]
    pub return_: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<f64>,
}

impl TimePoint {
    pub fn price(date: NaiveDate, price: f64) -> Self {
        Self {
            date,
            price: Some(price),
            return_: None,
            forecast: None,
        }
    }

    pub fn forecast(date: NaiveDate, forecast: f64) -> Self {
        Self {
            date,
            price: None,
            return_: None,
            forecast: Some(forecast),
        }
    }

    pub fn has_values(&self) -> bool {
        self.price.is_some() || self.return_.is_some() || self.forecast.is_some()
    }
}

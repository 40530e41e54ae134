//! Reconciles the external time-series shapes into `TimePoint` sequences.
//!
//! Three shapes come in:
//! - upload rows (`date,price,returns`), kept in input order
//! - the statistics service's date-keyed maps, sorted by date here
//! - positional forecast arrays (`dates[i]` pairs with `values[i]`)

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::errors::AppError;
use crate::models::{ConfidenceBand, PriceDataRow, RawUploadRow, ReturnDataRow, RowIssue, TimePoint};

const DATE_FORMATS: [&str; 1] = ["%Y-%m-%d"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Output of `normalize_upload`: kept points plus the rows that were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedUpload {
    pub points: Vec<TimePoint>,
    pub issues: Vec<RowIssue>,
}

/// Parse a date string into canonical day-precision form.
///
/// Pandas indexes serialize as full timestamps (`2023-01-03T00:00:00`), so any
/// time-of-day part is accepted and discarded.
pub fn parse_canonical_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

fn require_date(raw: &str) -> Result<NaiveDate, AppError> {
    parse_canonical_date(raw).ok_or_else(|| AppError::MalformedDate(format!("'{}' is not a date", raw)))
}

/// Convert upload rows 1:1, dropping rows that cannot become a point.
///
/// Dropped rows are logged and reported; the rest of the batch still loads.
pub fn normalize_upload(rows: &[RawUploadRow]) -> NormalizedUpload {
    let mut out = NormalizedUpload::default();

    for (idx, row) in rows.iter().enumerate() {
        let row_no = idx + 1;

        if row.date.trim().is_empty() {
            warn!("Dropping upload row {}: empty date", row_no);
            out.issues.push(RowIssue {
                row: row_no,
                message: "empty date".to_string(),
            });
            continue;
        }

        let Some(date) = parse_canonical_date(&row.date) else {
            warn!("Dropping upload row {}: unparsable date '{}'", row_no, row.date);
            out.issues.push(RowIssue {
                row: row_no,
                message: format!("unparsable date '{}'", row.date),
            });
            continue;
        };

        let point = TimePoint {
            date,
            price: row.price.to_f64(),
            return_: row.returns.to_f64(),
            forecast: None,
        };

        if !point.has_values() {
            warn!("Dropping upload row {}: neither price nor returns is numeric", row_no);
            out.issues.push(RowIssue {
                row: row_no,
                message: "neither price nor returns is numeric".to_string(),
            });
            continue;
        }

        out.points.push(point);
    }

    out
}

/// Convert a date-keyed price map into points sorted ascending by date.
pub fn normalize_historical(prices: &HashMap<String, f64>) -> Result<Vec<TimePoint>, AppError> {
    let mut points = prices
        .iter()
        .map(|(raw, price)| require_date(raw).map(|date| TimePoint::price(date, *price)))
        .collect::<Result<Vec<_>, _>>()?;

    // Map iteration order is arbitrary; the date is the only ordering key.
    points.sort_by_key(|p| p.date);

    if let Some(pair) = points.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(AppError::MalformedDate(format!(
            "duplicate date {} in price map",
            pair[0].date
        )));
    }

    Ok(points)
}

/// Fill `return_` on already-normalized points from a date-keyed map.
///
/// Returns for dates that have no point are ignored.
pub fn attach_returns(points: &mut [TimePoint], returns: &HashMap<String, f64>) -> Result<(), AppError> {
    let mut by_date = HashMap::with_capacity(returns.len());
    for (raw, value) in returns {
        by_date.insert(require_date(raw)?, *value);
    }
    for point in points.iter_mut() {
        if let Some(value) = by_date.get(&point.date) {
            point.return_ = Some(*value);
        }
    }
    Ok(())
}

/// Join the `/data` price and return lists by date, ascending.
pub fn normalize_price_data(
    price_data: &[PriceDataRow],
    returns_data: &[ReturnDataRow],
) -> Result<Vec<TimePoint>, AppError> {
    let mut by_date: BTreeMap<NaiveDate, TimePoint> = BTreeMap::new();

    for row in price_data {
        let date = require_date(&row.date)?;
        if by_date.insert(date, TimePoint::price(date, row.price)).is_some() {
            return Err(AppError::MalformedDate(format!("duplicate date {} in price data", date)));
        }
    }

    let mut seen_returns = std::collections::HashSet::new();
    for row in returns_data {
        let date = require_date(&row.date)?;
        if !seen_returns.insert(date) {
            return Err(AppError::MalformedDate(format!("duplicate date {} in returns data", date)));
        }
        // The first return of a pct-change series is undefined.
        let Some(value) = row.return_ else { continue };
        by_date
            .entry(date)
            .or_insert_with(|| TimePoint {
                date,
                price: None,
                return_: None,
                forecast: None,
            })
            .return_ = Some(value);
    }

    Ok(by_date.into_values().collect())
}

/// Pair `dates[i]` with `values[i]`. Position is authoritative; nothing is sorted.
pub fn normalize_forecast(dates: &[String], values: &[f64]) -> Result<Vec<TimePoint>, AppError> {
    if dates.len() != values.len() {
        return Err(AppError::LengthMismatch {
            dates: dates.len(),
            values: values.len(),
        });
    }

    dates
        .iter()
        .zip(values)
        .map(|(raw, value)| require_date(raw).map(|date| TimePoint::forecast(date, *value)))
        .collect()
}

/// Pair interval bounds with forecast dates by position.
///
/// A service that sends no bounds yields an empty band. Otherwise both bound
/// lists must match the dates one for one.
pub fn normalize_confidence_band(
    dates: &[String],
    lower: &[f64],
    upper: &[f64],
) -> Result<Vec<ConfidenceBand>, AppError> {
    if lower.is_empty() && upper.is_empty() {
        return Ok(Vec::new());
    }
    for bound in [lower, upper] {
        if bound.len() != dates.len() {
            return Err(AppError::LengthMismatch {
                dates: dates.len(),
                values: bound.len(),
            });
        }
    }

    dates
        .iter()
        .zip(lower.iter().zip(upper))
        .map(|(raw, (lo, hi))| {
            require_date(raw).map(|date| ConfidenceBand {
                date,
                lower: *lo,
                upper: *hi,
            })
        })
        .collect()
}

/// Historical points followed by forecast points.
///
/// Overlapping dates are not collapsed: a shared date shows up as a
/// price-only point followed by a forecast-only point.
pub fn merge(historical: &[TimePoint], forecast: &[TimePoint]) -> Vec<TimePoint> {
    let mut merged = Vec::with_capacity(historical.len() + forecast.len());
    merged.extend_from_slice(historical);
    merged.extend_from_slice(forecast);
    merged
}

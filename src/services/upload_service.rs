use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::warn;

use crate::errors::AppError;
use crate::models::{ForecastUpload, NumberOrText, RawUploadRow, RowIssue};

/// Rows read from a `date,price,returns` CSV plus records the reader rejected.
#[derive(Debug, Clone, Default)]
pub struct CsvUpload {
    pub rows: Vec<RawUploadRow>,
    /// 1-based record number of each entry in `rows`.
    pub row_numbers: Vec<usize>,
    pub issues: Vec<RowIssue>,
}

/// Read a delimited-text upload into raw rows.
///
/// Only the header is fatal: without a `date` column nothing can be placed on
/// the time axis. A record the CSV reader cannot decode is skipped and reported.
pub fn parse_csv_upload(text: &str) -> Result<CsvUpload, AppError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let header_map = build_header_map(&headers);

    let date_idx = *header_map
        .get("date")
        .ok_or_else(|| AppError::Parse("upload is missing a `date` column".to_string()))?;
    let price_idx = header_map.get("price").copied();
    let returns_idx = header_map.get("returns").copied();

    if price_idx.is_none() && returns_idx.is_none() {
        return Err(AppError::Parse(
            "upload needs a `price` or `returns` column".to_string(),
        ));
    }

    let mut upload = CsvUpload::default();
    for (idx, result) in reader.records().enumerate() {
        let row_no = idx + 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping unreadable CSV record {}: {}", row_no, e);
                upload.issues.push(RowIssue {
                    row: row_no,
                    message: format!("CSV parse error: {}", e),
                });
                continue;
            }
        };

        upload.row_numbers.push(row_no);
        upload.rows.push(RawUploadRow {
            date: record.get(date_idx).unwrap_or_default().to_string(),
            price: cell(&record, price_idx),
            returns: cell(&record, returns_idx),
        });
    }

    Ok(upload)
}

/// Parse the `{dates, prices}` forecast overlay document.
pub fn parse_forecast_upload(text: &str) -> Result<ForecastUpload, AppError> {
    Ok(serde_json::from_str(text)?)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn cell(record: &StringRecord, idx: Option<usize>) -> NumberOrText {
    idx.and_then(|i| record.get(i))
        .map(NumberOrText::from)
        .unwrap_or_default()
}

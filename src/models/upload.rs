use serde::{Deserialize, Serialize};

/// A numeric cell as it arrives from an upload: CSV gives text, JSON may give a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    /// Parse as a finite float. Anything else is "missing", never zero.
    pub fn to_f64(&self) -> Option<f64> {
        let value = match self {
            NumberOrText::Number(v) => *v,
            NumberOrText::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok()?
            }
        };
        if value.is_finite() {
            Some(value)
        } else {
            None
        }
    }
}

impl Default for NumberOrText {
    fn default() -> Self {
        NumberOrText::Text(String::new())
    }
}

impl From<&str> for NumberOrText {
    fn from(value: &str) -> Self {
        NumberOrText::Text(value.to_string())
    }
}

impl From<f64> for NumberOrText {
    fn from(value: f64) -> Self {
        NumberOrText::Number(value)
    }
}

/// One row of the `date,price,returns` upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawUploadRow {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub price: NumberOrText,
    #[serde(default)]
    pub returns: NumberOrText,
}

/// JSON forecast overlay upload: `{dates: [...], prices: [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastUpload {
    pub dates: Vec<String>,
    pub prices: Vec<f64>,
}

/// A row that was skipped during normalization, reported back to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowIssue {
    pub row: usize,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_or_text_parsing() {
        assert_eq!(NumberOrText::from("150").to_f64(), Some(150.0));
        assert_eq!(NumberOrText::from(" -0.0125 ").to_f64(), Some(-0.0125));
        assert_eq!(NumberOrText::from(0.5).to_f64(), Some(0.5));
        assert_eq!(NumberOrText::from("").to_f64(), None);
        assert_eq!(NumberOrText::from("n/a").to_f64(), None);
        assert_eq!(NumberOrText::from("NaN").to_f64(), None);
    }

    #[test]
    fn test_raw_row_accepts_numbers_and_text() {
        let row: RawUploadRow =
            serde_json::from_str(r#"{"date":"2023-01-01","price":150,"returns":"0.01"}"#).unwrap();
        assert_eq!(row.price.to_f64(), Some(150.0));
        assert_eq!(row.returns.to_f64(), Some(0.01));
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One x/y sample. `value: None` is a gap in the plotted line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub price_line: Vec<PlotPoint>,
    pub forecast_line: Vec<PlotPoint>,
    pub return_bars: Vec<PlotPoint>,
    #[serde(default)]
    pub lower_band: Vec<PlotPoint>,
    #[serde(default)]
    pub upper_band: Vec<PlotPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagPoint {
    pub lag: i64,
    pub acf: f64,
    pub pacf: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcfPacfCharts {
    pub prices: Vec<LagPoint>,
    pub returns: Vec<LagPoint>,
}

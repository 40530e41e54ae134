mod time_point;
mod upload;
pub mod chart;
pub mod dashboard;
pub mod forecast;

pub use time_point::TimePoint;
pub use upload::{ForecastUpload, NumberOrText, RawUploadRow, RowIssue};
pub use chart::{AcfPacfCharts, ChartSeries, LagPoint, PlotPoint};
pub use dashboard::{
    DashboardParams, DashboardSnapshot, ForecastResult, ForecastSummary, HistoricalResult,
    HistoricalSummary, LoadOutcome, LoadStatus, SlotView, UploadReport, UploadResult,
};
pub use forecast::{
    AcfPacf, AcfPacfPair, ArimaOrder, ArimaResponse, ConfidenceBand, ForecastRequest,
    HistoricalResponse, PriceDataRow, ResidualsSummary, ReturnDataRow, StationarityCheck,
    StationarityReport, TestStatistic,
};

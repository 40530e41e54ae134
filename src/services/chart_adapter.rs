use std::collections::HashMap;

use crate::errors::AppError;
use crate::models::{
    AcfPacf, AcfPacfCharts, AcfPacfPair, ChartSeries, ConfidenceBand, LagPoint, PlotPoint, TimePoint,
};

/// Split points into the price line, forecast line and return bars.
///
/// Every series has one entry per input point so the x-axes line up; a
/// missing field is a `None` gap, never zero.
pub fn to_chart_series(points: &[TimePoint]) -> ChartSeries {
    let mut chart = ChartSeries {
        price_line: Vec::with_capacity(points.len()),
        forecast_line: Vec::with_capacity(points.len()),
        return_bars: Vec::with_capacity(points.len()),
        lower_band: Vec::with_capacity(points.len()),
        upper_band: Vec::with_capacity(points.len()),
    };

    for p in points {
        chart.price_line.push(PlotPoint { date: p.date, value: p.price });
        chart.forecast_line.push(PlotPoint { date: p.date, value: p.forecast });
        chart.return_bars.push(PlotPoint { date: p.date, value: p.return_ });
        chart.lower_band.push(PlotPoint { date: p.date, value: None });
        chart.upper_band.push(PlotPoint { date: p.date, value: None });
    }

    chart
}

/// Like `to_chart_series`, with the interval bounds filled in on forecast points.
pub fn to_forecast_chart(points: &[TimePoint], band: &[ConfidenceBand]) -> ChartSeries {
    let mut chart = to_chart_series(points);
    let by_date: HashMap<_, _> = band.iter().map(|b| (b.date, b)).collect();

    for (idx, p) in points.iter().enumerate() {
        if p.forecast.is_none() {
            continue;
        }
        if let Some(b) = by_date.get(&p.date) {
            chart.lower_band[idx].value = Some(b.lower);
            chart.upper_band[idx].value = Some(b.upper);
        }
    }

    chart
}

pub fn acf_pacf_series(data: &AcfPacf) -> Result<Vec<LagPoint>, AppError> {
    if data.lags.len() != data.acf.len() || data.lags.len() != data.pacf.len() {
        return Err(AppError::Validation(format!(
            "acf/pacf arrays disagree: {} lags, {} acf, {} pacf",
            data.lags.len(),
            data.acf.len(),
            data.pacf.len()
        )));
    }

    Ok(data
        .lags
        .iter()
        .zip(&data.acf)
        .zip(&data.pacf)
        .map(|((lag, acf), pacf)| LagPoint {
            lag: *lag,
            acf: *acf,
            pacf: *pacf,
        })
        .collect())
}

pub fn acf_pacf_charts(pair: &AcfPacfPair) -> Result<AcfPacfCharts, AppError> {
    Ok(AcfPacfCharts {
        prices: acf_pacf_series(&pair.prices)?,
        returns: acf_pacf_series(&pair.returns)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_missing_fields_render_as_gaps() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let points = vec![
            TimePoint::price(date, 150.0),
            TimePoint::forecast(date, 151.0),
        ];
        let chart = to_chart_series(&points);

        assert_eq!(chart.price_line.len(), 2);
        assert_eq!(chart.price_line[0].value, Some(150.0));
        assert_eq!(chart.price_line[1].value, None);
        assert_eq!(chart.forecast_line[0].value, None);
        assert_eq!(chart.forecast_line[1].value, Some(151.0));
        assert!(chart.return_bars.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn test_forecast_chart_bands_only_on_forecast_points() {
        let d1 = NaiveDate::from_ymd_opt(2023, 1, 3).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2023, 1, 4).unwrap();
        let points = vec![
            TimePoint::price(d1, 125.0),
            TimePoint::price(d2, 126.0),
            TimePoint::forecast(d2, 126.4),
        ];
        let band = vec![ConfidenceBand { date: d2, lower: -0.03, upper: 0.035 }];

        let chart = to_forecast_chart(&points, &band);

        assert_eq!(chart.lower_band.len(), 3);
        assert_eq!(chart.lower_band[1].value, None);
        assert_eq!(chart.lower_band[2].value, Some(-0.03));
        assert_eq!(chart.upper_band[2].value, Some(0.035));
        assert_eq!(chart.forecast_line[2].value, Some(126.4));
    }

    #[test]
    fn test_empty_input_gives_empty_chart() {
        assert_eq!(to_chart_series(&[]), ChartSeries::default());
    }

    #[test]
    fn test_acf_pacf_rows() {
        let data = AcfPacf {
            lags: vec![0, 1, 2],
            acf: vec![1.0, 0.4, 0.1],
            pacf: vec![1.0, 0.35, -0.05],
        };
        let rows = acf_pacf_series(&data).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], LagPoint { lag: 1, acf: 0.4, pacf: 0.35 });
    }

    #[test]
    fn test_acf_pacf_length_disagreement() {
        let data = AcfPacf {
            lags: vec![0, 1],
            acf: vec![1.0],
            pacf: vec![1.0, 0.2],
        };
        assert!(matches!(acf_pacf_series(&data), Err(AppError::Validation(_))));
    }
}

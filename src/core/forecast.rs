//! Short-horizon forecasting of a single vital-sign series.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::error::ForecastError;
use crate::models::VitalParameter;

/// Predicts the next `horizon` values of an evenly spaced series (oldest first).
#[cfg_attr(test, mockall::automock)]
pub trait Forecaster {
    fn forecast(&self, series: &[f64], horizon: usize) -> Result<Vec<f64>, ForecastError>;
}

/// AR(1) with drift fitted on the first differences of the series, then integrated back.
#[derive(Debug, Clone, Copy)]
pub struct DifferencedAr1 {
    min_history: usize,
}

const MAX_PHI: f64 = 0.99;

impl DifferencedAr1 {
    pub fn new(min_history: usize) -> Self {
        // three points give the two differences a lag-one fit needs
        Self { min_history: min_history.max(3) }
    }
}

impl Default for DifferencedAr1 {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Forecaster for DifferencedAr1 {
    fn forecast(&self, series: &[f64], horizon: usize) -> Result<Vec<f64>, ForecastError> {
        if series.len() < self.min_history {
            return Err(ForecastError::TooShort {
                required: self.min_history,
                actual: series.len(),
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::NonFinite);
        }

        let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
        let drift = diffs.iter().sum::<f64>() / diffs.len() as f64;
        let centered: Vec<f64> = diffs.iter().map(|d| d - drift).collect();

        let denom: f64 = centered[..centered.len() - 1].iter().map(|x| x * x).sum();
        if denom < 1e-12 {
            return Err(ForecastError::Degenerate);
        }
        let numer: f64 = centered.windows(2).map(|w| w[0] * w[1]).sum();
        let phi = (numer / denom).clamp(-MAX_PHI, MAX_PHI);

        let mut level = series[series.len() - 1];
        let mut last_diff = diffs[diffs.len() - 1];
        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let next = drift + phi * (last_diff - drift);
            level += next;
            out.push(level);
            last_diff = next;
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterForecast {
    pub parameter: VitalParameter,
    pub points: Vec<ForecastPoint>,
}

/// Forecast a series and lay the predictions out at `step` intervals after `last_timestamp`.
pub fn project<F>(
    forecaster: &F,
    parameter: VitalParameter,
    series: &[f64],
    last_timestamp: NaiveDateTime,
    horizon: usize,
    step: Duration,
) -> Result<ParameterForecast, ForecastError>
where
    F: Forecaster + ?Sized,
{
    let values = forecaster.forecast(series, horizon)?;
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::NonFinite);
    }
    let points = values
        .into_iter()
        .enumerate()
        .map(|(i, value)| ForecastPoint {
            timestamp: last_timestamp + step * (i as i32 + 1),
            value,
        })
        .collect();
    Ok(ParameterForecast { parameter, points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn too_short_series_is_rejected() {
        let model = DifferencedAr1::new(10);
        assert_eq!(
            model.forecast(&[1.0, 2.0, 3.0], 5),
            Err(ForecastError::TooShort { required: 10, actual: 3 })
        );
    }

    #[test]
    fn constant_series_is_degenerate() {
        let model = DifferencedAr1::new(5);
        assert_eq!(model.forecast(&[75.0; 20], 5), Err(ForecastError::Degenerate));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let model = DifferencedAr1::new(3);
        assert_eq!(model.forecast(&[1.0, f64::NAN, 2.0, 3.0], 2), Err(ForecastError::NonFinite));
    }

    #[test]
    fn forecast_has_requested_length_and_follows_drift() {
        // upward trend with alternating noise
        let series: Vec<f64> = (0..40).map(|i| 60.0 + i as f64 + if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        let model = DifferencedAr1::new(10);
        let out = model.forecast(&series, 60).unwrap();
        assert_eq!(out.len(), 60);
        assert!(out.iter().all(|v| v.is_finite()));
        assert!(out[59] > series[39]);
    }

    #[test]
    fn projection_spaces_points_by_step() {
        let series: Vec<f64> = (0..20).map(|i| 37.0 + ((i * 7) % 5) as f64 * 0.1).collect();
        let last = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let projection = project(
            &DifferencedAr1::default(),
            VitalParameter::Temperature,
            &series,
            last,
            3,
            Duration::seconds(60),
        )
        .unwrap();
        let stamps: Vec<_> = projection.points.iter().map(|p| p.timestamp).collect();
        assert_eq!(
            stamps,
            vec![
                last + Duration::seconds(60),
                last + Duration::seconds(120),
                last + Duration::seconds(180)
            ]
        );
    }

    #[test]
    fn projection_surfaces_model_failure() {
        let mut mock = MockForecaster::new();
        mock.expect_forecast().returning(|_, _| Err(ForecastError::Degenerate));
        let last = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let result = project(&mock, VitalParameter::HeartRate, &[1.0, 2.0], last, 5, Duration::seconds(60));
        assert_eq!(result, Err(ForecastError::Degenerate));
    }
}

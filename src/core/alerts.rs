//! Critical-condition detection over a short window of readings.
//!
//! A parameter is only flagged when it is past its critical threshold *and*
//! the mean of the five readings before it sits on the safe side of the
//! latest value, i.e. the patient is still getting worse.

use serde::{Serialize, Deserialize};
use std::fmt;

use crate::error::EvaluationError;
use crate::models::{VitalParameter, VitalReading, Worsening};

/// Readings compared against the latest one.
pub const TREND_LENGTH: usize = 5;

/// Latest reading plus its trend.
pub const MIN_WINDOW: usize = TREND_LENGTH + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => f.write_str("CRITICAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub parameter: VitalParameter,
    pub value: f64,
    pub severity: Severity,
}

impl Alert {
    pub fn message(&self) -> String {
        let direction = match self.parameter.worsening() {
            Worsening::Falling => "dropped",
            Worsening::Rising => "rose",
        };
        format!(
            "{}: {} {} to a critical level ({:.1} {})",
            self.severity,
            self.parameter.label(),
            direction,
            self.value,
            self.parameter.unit()
        )
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Evaluate a newest-first window of readings.
///
/// Only the first [`MIN_WINDOW`] readings are used. Fewer than that is an
/// error so callers can tell "not enough data" apart from "all clear".
pub fn evaluate(window: &[VitalReading]) -> Result<Vec<Alert>, EvaluationError> {
    if window.len() < MIN_WINDOW {
        return Err(EvaluationError::InsufficientData {
            required: MIN_WINDOW,
            actual: window.len(),
        });
    }

    let latest = &window[0];
    let prior = &window[1..MIN_WINDOW];

    let alerts = VitalParameter::ALL
        .into_iter()
        .filter_map(|parameter| {
            let value = latest.value(parameter);
            if !parameter.is_critical(value) {
                return None;
            }
            let mean = prior.iter().map(|r| r.value(parameter)).sum::<f64>() / TREND_LENGTH as f64;
            let worsening = match parameter.worsening() {
                Worsening::Falling => mean > value,
                Worsening::Rising => mean < value,
            };
            worsening.then_some(Alert {
                parameter,
                value: (value * 10.0).round() / 10.0,
                severity: Severity::Critical,
            })
        })
        .collect();

    Ok(alerts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use test_case::test_case;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    fn normal(index: usize) -> VitalReading {
        VitalReading {
            timestamp: base() - Duration::seconds(5 * index as i64),
            heart_rate: 75.0,
            systolic: 120.0,
            diastolic: 80.0,
            oxygen_saturation: 98.0,
            temperature: 37.0,
        }
    }

    /// Newest-first window where one parameter follows `values`.
    fn window_with(parameter: VitalParameter, values: &[f64]) -> Vec<VitalReading> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let mut reading = normal(i);
                match parameter {
                    VitalParameter::HeartRate => reading.heart_rate = v,
                    VitalParameter::Systolic => reading.systolic = v,
                    VitalParameter::Diastolic => reading.diastolic = v,
                    VitalParameter::OxygenSaturation => reading.oxygen_saturation = v,
                    VitalParameter::Temperature => reading.temperature = v,
                }
                reading
            })
            .collect()
    }

    #[test_case(VitalParameter::HeartRate, &[55.0, 70.0, 72.0, 71.0, 69.0, 70.0] ; "heart rate falling")]
    #[test_case(VitalParameter::Systolic, &[85.0, 110.0, 112.0, 115.0, 118.0, 120.0] ; "systolic falling")]
    #[test_case(VitalParameter::Diastolic, &[45.0, 70.0, 72.0, 75.0, 78.0, 80.0] ; "diastolic falling")]
    #[test_case(VitalParameter::OxygenSaturation, &[88.0, 97.0, 98.0, 98.0, 97.0, 98.0] ; "spo2 falling")]
    #[test_case(VitalParameter::Temperature, &[39.5, 37.0, 37.1, 36.9, 37.0, 37.2] ; "temperature rising")]
    fn worsening_breach_raises_one_alert(parameter: VitalParameter, values: &[f64]) {
        let alerts = evaluate(&window_with(parameter, values)).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].parameter, parameter);
        assert_eq!(alerts[0].value, values[0]);
        assert_eq!(alerts[0].severity, Severity::Critical);
    }

    #[test_case(VitalParameter::HeartRate, &[55.0, 50.0, 52.0, 51.0, 50.0, 49.0] ; "heart rate recovering")]
    #[test_case(VitalParameter::OxygenSaturation, &[93.0, 90.0, 91.0, 89.0, 90.0, 92.0] ; "spo2 recovering")]
    #[test_case(VitalParameter::Temperature, &[38.5, 39.5, 39.4, 39.6, 39.5, 39.3] ; "temperature recovering")]
    fn breach_that_is_already_recovering_is_ignored(parameter: VitalParameter, values: &[f64]) {
        assert!(evaluate(&window_with(parameter, values)).unwrap().is_empty());
    }

    #[test]
    fn heart_rate_at_threshold_is_not_critical_even_when_declining() {
        let window = window_with(VitalParameter::HeartRate, &[62.0, 61.0, 60.0, 59.0, 58.0, 57.0]);
        assert!(evaluate(&window).unwrap().is_empty());

        let window = window_with(VitalParameter::HeartRate, &[60.0, 70.0, 70.0, 70.0, 70.0, 70.0]);
        assert!(evaluate(&window).unwrap().is_empty());
    }

    #[test]
    fn short_window_is_reported_not_silently_empty() {
        let window: Vec<_> = (0..5).map(normal).collect();
        assert_eq!(
            evaluate(&window),
            Err(EvaluationError::InsufficientData { required: 6, actual: 5 })
        );
        assert!(evaluate(&[]).is_err());
    }

    #[test]
    fn alerts_follow_parameter_order() {
        let mut window: Vec<_> = (0..6).map(normal).collect();
        window[0].temperature = 39.6;
        window[0].heart_rate = 52.0;
        window[0].oxygen_saturation = 87.0;

        let parameters: Vec<_> = evaluate(&window).unwrap().into_iter().map(|a| a.parameter).collect();
        assert_eq!(
            parameters,
            vec![VitalParameter::HeartRate, VitalParameter::OxygenSaturation, VitalParameter::Temperature]
        );
    }

    #[test]
    fn readings_beyond_the_window_are_ignored() {
        let mut window = window_with(VitalParameter::HeartRate, &[55.0, 50.0, 50.0, 50.0, 50.0, 50.0]);
        window.extend((6..20).map(|i| {
            let mut r = normal(i);
            r.heart_rate = 100.0;
            r
        }));
        assert!(evaluate(&window).unwrap().is_empty());
    }

    #[test]
    fn message_shows_one_decimal() {
        let alert = Alert {
            parameter: VitalParameter::Temperature,
            value: 39.456,
            severity: Severity::Critical,
        };
        assert_eq!(alert.to_string(), "CRITICAL: Temperature rose to a critical level (39.5 °C)");
    }
}

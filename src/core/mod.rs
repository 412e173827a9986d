//! Clinical logic: alerting, stay accounting, forecasting and reports.

pub mod alerts;
pub mod forecast;
pub mod history;
pub mod stay;
pub mod therapy;

pub use alerts::{evaluate, Alert, Severity, MIN_WINDOW};
pub use forecast::{DifferencedAr1, Forecaster, ParameterForecast};
pub use history::VitalHistory;
pub use stay::{aggregate, StayDurations};
pub use therapy::TherapyReport;

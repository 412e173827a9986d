//! Time spent per care unit, computed from the location transition log.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::StayError;
use crate::models::location::parse_log;
use crate::models::{CareUnit, LocationEvent, LocationRecord, LocationStatus};

pub type StayDurations = BTreeMap<CareUnit, Duration>;

/// Sum the stay intervals in a chronological log, counting a still-open stay up to `now`.
///
/// A second Enter without an Exit in between replaces the open stay, and the
/// time accrued by the earlier one is dropped. An Exit that does not match the
/// open stay is skipped.
pub fn aggregate(log: &[LocationEvent], now: NaiveDateTime) -> Result<StayDurations, StayError> {
    let mut durations = StayDurations::new();
    let mut open: Option<(CareUnit, NaiveDateTime)> = None;
    let mut previous: Option<NaiveDateTime> = None;

    for (index, event) in log.iter().enumerate() {
        if previous.map_or(false, |p| event.timestamp < p) {
            return Err(StayError::OutOfOrder { index });
        }
        previous = Some(event.timestamp);

        match event.status {
            LocationStatus::Enter => {
                if let Some((unit, since)) = open {
                    warn!(%unit, %since, next = %event.unit, "enter without exit, discarding open stay");
                }
                open = Some((event.unit, event.timestamp));
            }
            LocationStatus::Exit => match open {
                Some((unit, since)) if unit == event.unit => {
                    add(&mut durations, unit, event.timestamp - since);
                    open = None;
                }
                _ => {
                    warn!(index, unit = %event.unit, "exit does not match the open stay, ignoring");
                }
            },
        }
    }

    if let Some((unit, since)) = open {
        if now < since {
            return Err(StayError::NowBeforeOpenInterval { unit });
        }
        add(&mut durations, unit, now - since);
    }

    debug!(units = durations.len(), "stay durations aggregated");
    Ok(durations)
}

fn add(durations: &mut StayDurations, unit: CareUnit, elapsed: Duration) {
    let total = durations.entry(unit).or_insert_with(Duration::zero);
    *total = *total + elapsed;
}

/// Parse raw records and aggregate them; any malformed record fails the whole call.
pub fn aggregate_records(records: &[LocationRecord], now: NaiveDateTime) -> Result<StayDurations, StayError> {
    let log = parse_log(records)?;
    aggregate(&log, now)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StayReportRow {
    pub unit: CareUnit,
    pub hours: f64,
    pub formatted: String,
    pub attending_doctor: String,
}

pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    format!("{} h {} min", total / 3600, (total % 3600) / 60)
}

pub fn stay_report(durations: &StayDurations, attending_doctor: &str) -> Vec<StayReportRow> {
    durations
        .iter()
        .map(|(&unit, &duration)| {
            let hours = duration.num_seconds() as f64 / 3600.0;
            StayReportRow {
                unit,
                hours: (hours * 100.0).round() / 100.0,
                formatted: format_duration(duration),
                attending_doctor: attending_doctor.to_string(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PathwayStage {
    Passed,
    Current,
    Upcoming,
}

/// Where each unit of the fixed care pathway stands relative to the current unit.
pub fn pathway(current: Option<CareUnit>) -> Vec<(CareUnit, PathwayStage)> {
    CareUnit::PATHWAY
        .into_iter()
        .map(|unit| {
            let stage = match current {
                Some(c) if unit < c => PathwayStage::Passed,
                Some(c) if unit == c => PathwayStage::Current,
                _ => PathwayStage::Upcoming,
            };
            (unit, stage)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn sum(a: &StayDurations, b: &StayDurations) -> StayDurations {
        let mut out = a.clone();
        for (&unit, &d) in b {
            add(&mut out, unit, d);
        }
        out
    }

    #[test]
    fn closed_and_open_stays() {
        let log = vec![
            LocationEvent::enter(CareUnit::Emergency, at(10, 0)),
            LocationEvent::exit(CareUnit::Emergency, at(10, 30)),
            LocationEvent::enter(CareUnit::IntensiveCare, at(10, 30)),
        ];
        let durations = aggregate(&log, at(11, 0)).unwrap();
        assert_eq!(durations.len(), 2);
        assert_eq!(durations[&CareUnit::Emergency], Duration::minutes(30));
        assert_eq!(durations[&CareUnit::IntensiveCare], Duration::minutes(30));
    }

    #[test]
    fn single_open_stay_counts_up_to_now() {
        let log = vec![LocationEvent::enter(CareUnit::Ward, at(8, 0))];
        let durations = aggregate(&log, at(9, 30)).unwrap();
        assert_eq!(durations, StayDurations::from([(CareUnit::Ward, Duration::minutes(90))]));
    }

    #[test]
    fn empty_log_yields_empty_mapping() {
        assert!(aggregate(&[], at(9, 0)).unwrap().is_empty());
    }

    #[test]
    fn repeated_visits_accumulate() {
        let log = vec![
            LocationEvent::enter(CareUnit::Emergency, at(8, 0)),
            LocationEvent::exit(CareUnit::Emergency, at(8, 20)),
            LocationEvent::enter(CareUnit::Surgery, at(8, 20)),
            LocationEvent::exit(CareUnit::Surgery, at(10, 0)),
            LocationEvent::enter(CareUnit::Emergency, at(10, 0)),
            LocationEvent::exit(CareUnit::Emergency, at(10, 10)),
        ];
        let durations = aggregate(&log, at(12, 0)).unwrap();
        assert_eq!(durations[&CareUnit::Emergency], Duration::minutes(30));
        assert_eq!(durations[&CareUnit::Surgery], Duration::minutes(100));
    }

    #[test]
    fn aggregation_is_additive_over_disjoint_logs() {
        let first = vec![
            LocationEvent::enter(CareUnit::Emergency, at(8, 0)),
            LocationEvent::exit(CareUnit::Emergency, at(8, 45)),
            LocationEvent::enter(CareUnit::IntensiveCare, at(8, 45)),
            LocationEvent::exit(CareUnit::IntensiveCare, at(9, 15)),
        ];
        let second = vec![
            LocationEvent::enter(CareUnit::IntensiveCare, at(9, 30)),
            LocationEvent::exit(CareUnit::IntensiveCare, at(10, 0)),
            LocationEvent::enter(CareUnit::Ward, at(10, 0)),
        ];
        let now = at(11, 0);
        let whole: Vec<_> = first.iter().chain(second.iter()).cloned().collect();

        let separately = sum(&aggregate(&first, now).unwrap(), &aggregate(&second, now).unwrap());
        assert_eq!(separately, aggregate(&whole, now).unwrap());
    }

    #[test]
    fn mismatched_exit_is_ignored() {
        let log = vec![
            LocationEvent::enter(CareUnit::Emergency, at(8, 0)),
            LocationEvent::exit(CareUnit::Ward, at(8, 30)),
            LocationEvent::exit(CareUnit::Emergency, at(9, 0)),
        ];
        let durations = aggregate(&log, at(10, 0)).unwrap();
        assert_eq!(durations, StayDurations::from([(CareUnit::Emergency, Duration::minutes(60))]));
    }

    #[test]
    fn second_enter_discards_the_open_stay() {
        let log = vec![
            LocationEvent::enter(CareUnit::Emergency, at(8, 0)),
            LocationEvent::enter(CareUnit::IntensiveCare, at(9, 0)),
        ];
        let durations = aggregate(&log, at(10, 0)).unwrap();
        assert!(!durations.contains_key(&CareUnit::Emergency));
        assert_eq!(durations[&CareUnit::IntensiveCare], Duration::minutes(60));
    }

    #[test]
    fn out_of_order_log_fails() {
        let log = vec![
            LocationEvent::enter(CareUnit::Emergency, at(9, 0)),
            LocationEvent::exit(CareUnit::Emergency, at(8, 0)),
        ];
        assert!(matches!(aggregate(&log, at(10, 0)), Err(StayError::OutOfOrder { index: 1 })));
    }

    #[test]
    fn now_before_open_stay_fails() {
        let log = vec![LocationEvent::enter(CareUnit::Ward, at(9, 0))];
        assert!(matches!(
            aggregate(&log, at(8, 0)),
            Err(StayError::NowBeforeOpenInterval { unit: CareUnit::Ward })
        ));
    }

    #[test]
    fn malformed_timestamp_fails_the_whole_aggregation() {
        let records = vec![
            LocationRecord {
                timestamp: "2024-05-01 08:00:00".into(),
                unit: "ED".into(),
                status: "Enter".into(),
            },
            LocationRecord {
                timestamp: "2024-05-01 8h".into(),
                unit: "ED".into(),
                status: "Exit".into(),
            },
        ];
        assert!(matches!(
            aggregate_records(&records, at(10, 0)),
            Err(StayError::MalformedTimestamp { index: 1, .. })
        ));
    }

    #[test]
    fn report_rounds_hours_and_formats_text() {
        let durations = StayDurations::from([(CareUnit::IntensiveCare, Duration::minutes(155))]);
        let rows = stay_report(&durations, "dr. Agatha");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].hours, 2.58);
        assert_eq!(rows[0].formatted, "2 h 35 min");
        assert_eq!(rows[0].attending_doctor, "dr. Agatha");
    }

    #[test]
    fn pathway_marks_progress() {
        let stages: Vec<_> = pathway(Some(CareUnit::Surgery)).into_iter().map(|(_, s)| s).collect();
        assert_eq!(
            stages,
            vec![PathwayStage::Passed, PathwayStage::Passed, PathwayStage::Current, PathwayStage::Upcoming]
        );
        assert!(pathway(None).iter().all(|(_, s)| *s == PathwayStage::Upcoming));
    }
}

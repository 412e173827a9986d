//! End-to-end: the feed writes snapshots, the dashboard reads and evaluates them.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

use noah_monitor::config::{DataConfig, FeedConfig, MonitorConfig};
use noah_monitor::dashboard::{Dashboard, FeedStatus, PollKind};
use noah_monitor::ehr::{OperatorCommand, PatientSession};
use noah_monitor::error::EvaluationError;
use noah_monitor::feed::FeedSimulator;
use noah_monitor::models::{CareUnit, VitalParameter};
use noah_monitor::snapshot::{self, SnapshotKind};
use noah_monitor::ui;

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(8, 0, 0).unwrap()
}

fn config(root: &Path) -> MonitorConfig {
    MonitorConfig {
        data: DataConfig {
            vitals_dir: root.join("data"),
            bed_dir: root.join("data").join("bed_availability"),
            retention: 5,
        },
        ..MonitorConfig::default()
    }
}

#[test]
fn critical_excursion_raises_alerts() {
    let root = tempfile::tempdir().unwrap();
    let config = config(root.path());
    let mut feed = FeedSimulator::new(StdRng::seed_from_u64(42), config.data.clone(), FeedConfig::default(), t0());
    let mut dashboard = Dashboard::new(config.clone());
    let mut session = PatientSession::new(t0());

    // five normal minutes, then the start of the next critical period
    let mut times: Vec<_> = (1..=5).map(|m| t0() + Duration::minutes(m)).collect();
    times.push(t0() + Duration::seconds(1200));
    for (i, &now) in times.iter().enumerate() {
        let cycle = feed.cycle(now).unwrap();
        assert_eq!(cycle.critical, i == 5);
        dashboard.poll(PollKind::FeedRefresh, &mut session, now);
    }

    assert_eq!(dashboard.history().len(), 6);
    assert_eq!(snapshot::list_snapshots(&config.data.vitals_dir, SnapshotKind::Vitals).unwrap().len(), 5);

    let view = dashboard.view(None, &session, t0() + Duration::seconds(1200));
    let flagged: Vec<_> = view.active_alerts().iter().map(|a| a.parameter).collect();
    assert!(flagged.contains(&VitalParameter::OxygenSaturation));
    assert!(flagged.contains(&VitalParameter::Temperature));
    assert!(view.current.iter().any(|c| c.parameter == VitalParameter::Temperature && c.critical));

    let text = ui::render(&view);
    assert!(text.contains("!!! ALERT"));
    assert!(text.contains("Temperature rose to a critical level"));
}

#[test]
fn full_reload_reads_every_retained_snapshot() {
    let root = tempfile::tempdir().unwrap();
    let config = config(root.path());
    let mut feed = FeedSimulator::new(StdRng::seed_from_u64(1), config.data.clone(), FeedConfig::default(), t0());
    for m in 1..=8 {
        feed.cycle(t0() + Duration::minutes(m)).unwrap();
    }

    let mut dashboard = Dashboard::new(config);
    let mut session = PatientSession::new(t0());
    let view = dashboard.tick(&mut session, t0() + Duration::minutes(8)).unwrap();

    assert_eq!(view.poll, Some(PollKind::FullReload));
    assert_eq!(dashboard.history().len(), 5);
    assert_eq!(dashboard.history().latest().unwrap().timestamp, t0() + Duration::minutes(8));
    assert!(matches!(view.alerts, Err(EvaluationError::InsufficientData { required: 6, actual: 5 })));
    assert!(matches!(view.vitals_status, FeedStatus::Live { .. }));

    let board = view.beds.unwrap();
    assert_eq!(board.timestamp, t0() + Duration::minutes(8));
    assert_eq!(board.units.len(), 4);
}

#[test]
fn operator_updates_flow_into_the_reports() {
    let root = tempfile::tempdir().unwrap();
    let dashboard = Dashboard::new(config(root.path()));
    let session = PatientSession::new(t0());

    let line = r#"{"patient":{"patient_id":"P-2024-001","name":"Tn. Soleh","age":"45 tahun","sex":"Male","blood_type":"O+","diagnosis":"Stroke Hemoragik","attending_doctor":"dr. Agatha"},"location":"OR","therapy":{"medicine":"Tranexamic acid","dosage":"1 g","frequency":"once","route":"IV","notes":"pre-op"}}"#;
    let session = session
        .apply(OperatorCommand::parse(line).unwrap(), t0() + Duration::minutes(90))
        .unwrap();

    let now = t0() + Duration::minutes(120);
    let view = dashboard.view(None, &session, now);
    assert_eq!(view.location.current_unit, Some(CareUnit::Surgery));

    let stay = view.stay.as_ref().unwrap();
    let hours: Vec<_> = stay.iter().map(|row| (row.unit, row.hours)).collect();
    assert_eq!(hours, vec![(CareUnit::Emergency, 1.5), (CareUnit::Surgery, 0.5)]);
    assert_eq!(view.therapy.active().count(), 1);
    assert_eq!(view.therapy.medicines(), vec!["Tranexamic acid"]);

    let text = ui::render(&view);
    assert!(text.contains("[OR]"));
    assert!(text.contains("1 h 30 min"));

    let cleared = session.apply(OperatorCommand::Reset, now).unwrap();
    let view = dashboard.view(None, &cleared, now);
    assert!(view.stay.unwrap().is_empty());
    assert!(view.therapy.is_empty());
    assert_eq!(view.location.current_unit, None);
}

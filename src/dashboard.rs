//! Dashboard poll cycle.
//!
//! Each tick asks the [`PollSchedule`] whether a poll is due. A feed refresh
//! picks up the newest snapshots; a full reload re-reads every retained file.
//! Either way the in-memory history is evaluated and forecast and a fresh
//! [`DashboardView`] is produced. Read failures never clear what was already
//! loaded; they only change the reported feed status.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

use crate::config::{MonitorConfig, PollingConfig};
use crate::core::alerts::{self, Alert};
use crate::core::forecast::{self, DifferencedAr1, Forecaster, ParameterForecast};
use crate::core::stay::{self, PathwayStage, StayReportRow};
use crate::core::{TherapyReport, VitalHistory};
use crate::ehr::PatientSession;
use crate::error::{EvaluationError, ForecastError, SnapshotError, StayError};
use crate::models::{CareUnit, LocationEvent, PatientRecord, VitalParameter};
use crate::snapshot::{self, BedBoard, Latest, SnapshotKind, WaitReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PollKind {
    FeedRefresh,
    FullReload,
}

/// When each kind of poll last ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollClock {
    pub last_feed_refresh: Option<NaiveDateTime>,
    pub last_full_reload: Option<NaiveDateTime>,
}

impl PollClock {
    /// A full reload also counts as a feed refresh.
    pub fn record(&mut self, kind: PollKind, now: NaiveDateTime) {
        self.last_feed_refresh = Some(now);
        if kind == PollKind::FullReload {
            self.last_full_reload = Some(now);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    feed_refresh: Duration,
    full_reload: Duration,
}

impl PollSchedule {
    pub fn new(feed_refresh: Duration, full_reload: Duration) -> Self {
        Self { feed_refresh, full_reload }
    }

    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(
            Duration::seconds(config.feed_refresh_secs as i64),
            Duration::seconds(config.full_reload_secs as i64),
        )
    }

    /// The poll to run at `now`, if any. A full reload takes precedence.
    pub fn due(&self, clock: &PollClock, now: NaiveDateTime) -> Option<PollKind> {
        let elapsed = |last: Option<NaiveDateTime>, period: Duration| match last {
            None => true,
            Some(t) => now - t >= period,
        };
        if elapsed(clock.last_full_reload, self.full_reload) {
            Some(PollKind::FullReload)
        } else if elapsed(clock.last_feed_refresh, self.feed_refresh) {
            Some(PollKind::FeedRefresh)
        } else {
            None
        }
    }
}

/// State of one snapshot source as of the last poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FeedStatus {
    /// Nothing polled yet.
    Idle,
    Live { path: PathBuf },
    Waiting { reason: String },
    /// The last read failed; previously loaded data is still shown.
    ReadError { message: String },
}

impl From<WaitReason> for FeedStatus {
    fn from(reason: WaitReason) -> Self {
        let reason = match reason {
            WaitReason::MissingDirectory(dir) => format!("directory {} does not exist yet", dir.display()),
            WaitReason::NoSnapshots(dir) => format!("no snapshot files in {} yet", dir.display()),
        };
        FeedStatus::Waiting { reason }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentValue {
    pub parameter: VitalParameter,
    pub value: f64,
    /// Past the threshold, regardless of trend.
    pub critical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub parameter: VitalParameter,
    pub timestamps: Vec<NaiveDateTime>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationReport {
    pub current_unit: Option<CareUnit>,
    pub timeline: Vec<LocationEvent>,
    pub pathway: Vec<(CareUnit, PathwayStage)>,
}

/// Everything one poll produced, ready to render.
#[derive(Debug)]
pub struct DashboardView {
    pub generated_at: NaiveDateTime,
    /// `None` when re-rendered after operator input rather than a poll.
    pub poll: Option<PollKind>,
    pub vitals_status: FeedStatus,
    pub beds_status: FeedStatus,
    pub patient: PatientRecord,
    pub current: Vec<CurrentValue>,
    pub alerts: Result<Vec<Alert>, EvaluationError>,
    pub trends: Vec<Trend>,
    pub forecasts: Vec<(VitalParameter, Result<ParameterForecast, ForecastError>)>,
    pub beds: Option<BedBoard>,
    pub location: LocationReport,
    pub stay: Result<Vec<StayReportRow>, StayError>,
    pub therapy: TherapyReport,
}

impl DashboardView {
    /// Alerts raised by this poll, empty when there were none or too little data.
    pub fn active_alerts(&self) -> &[Alert] {
        match &self.alerts {
            Ok(alerts) => alerts,
            Err(_) => &[],
        }
    }
}

pub struct Dashboard<F = DifferencedAr1> {
    config: MonitorConfig,
    schedule: PollSchedule,
    history: VitalHistory,
    beds: Option<BedBoard>,
    vitals_status: FeedStatus,
    beds_status: FeedStatus,
    forecaster: F,
}

impl Dashboard<DifferencedAr1> {
    pub fn new(config: MonitorConfig) -> Self {
        let forecaster = DifferencedAr1::new(config.forecast.min_history);
        Self::with_forecaster(config, forecaster)
    }
}

impl<F: Forecaster> Dashboard<F> {
    pub fn with_forecaster(config: MonitorConfig, forecaster: F) -> Self {
        Self {
            schedule: PollSchedule::from_config(&config.polling),
            history: VitalHistory::new(config.history.capacity),
            beds: None,
            vitals_status: FeedStatus::Idle,
            beds_status: FeedStatus::Idle,
            forecaster,
            config,
        }
    }

    pub fn history(&self) -> &VitalHistory {
        &self.history
    }

    pub fn beds(&self) -> Option<&BedBoard> {
        self.beds.as_ref()
    }

    /// Run whichever poll is due and record it on the session.
    pub fn tick(&mut self, session: &mut PatientSession, now: NaiveDateTime) -> Option<DashboardView> {
        let kind = self.schedule.due(&session.polls, now)?;
        Some(self.poll(kind, session, now))
    }

    /// Run a poll of the given kind now, whether or not it is due.
    pub fn poll(&mut self, kind: PollKind, session: &mut PatientSession, now: NaiveDateTime) -> DashboardView {
        match kind {
            PollKind::FeedRefresh => self.refresh(),
            PollKind::FullReload => self.full_reload(),
        }
        session.polls.record(kind, now);
        self.view(Some(kind), session, now)
    }

    /// Merge the newest vitals snapshot and replace the bed board.
    #[instrument(skip(self))]
    pub fn refresh(&mut self) {
        match snapshot::read_latest_vitals(&self.config.data.vitals_dir) {
            Ok(Latest::Found { path, data }) => {
                let added = self.history.extend(data);
                debug!(path = %path.display(), added, "vitals refreshed");
                self.vitals_status = FeedStatus::Live { path };
            }
            Ok(Latest::Waiting(reason)) => self.vitals_status = reason.into(),
            Err(e) => self.vitals_status = read_failed("vitals", e),
        }
        self.refresh_beds();
    }

    /// Re-read every retained vitals snapshot, then the newest bed snapshot.
    #[instrument(skip(self))]
    pub fn full_reload(&mut self) {
        let dir = &self.config.data.vitals_dir;
        match snapshot::list_snapshots(dir, SnapshotKind::Vitals) {
            Ok(files) if files.is_empty() => {
                self.vitals_status = WaitReason::NoSnapshots(dir.clone()).into();
            }
            Ok(files) => {
                let newest = files.len() - 1;
                let mut added = 0;
                let mut newest_error = None;
                for (i, path) in files.iter().enumerate() {
                    match snapshot::read_vitals(path) {
                        Ok(readings) => added += self.history.extend(readings),
                        Err(e) if i == newest => newest_error = Some(e),
                        Err(e) => warn!(path = %path.display(), error = %e, "older vitals snapshot unreadable"),
                    }
                }
                // the newest file decides what the operator sees
                self.vitals_status = match newest_error {
                    Some(e) => read_failed("vitals", e),
                    None => FeedStatus::Live {
                        path: files[newest].clone(),
                    },
                };
                info!(files = files.len(), added, held = self.history.len(), "vitals reloaded");
            }
            Err(SnapshotError::MissingDirectory(dir)) => {
                self.vitals_status = WaitReason::MissingDirectory(dir).into();
            }
            Err(e) => self.vitals_status = read_failed("vitals", e),
        }
        self.refresh_beds();
    }

    fn refresh_beds(&mut self) {
        match snapshot::read_latest_beds(&self.config.data.bed_dir) {
            Ok(Latest::Found { path, data }) => {
                self.beds = Some(data);
                self.beds_status = FeedStatus::Live { path };
            }
            Ok(Latest::Waiting(reason)) => self.beds_status = reason.into(),
            Err(e) => self.beds_status = read_failed("beds", e),
        }
    }

    /// Evaluate and forecast the current history and assemble the reports.
    pub fn view(&self, poll: Option<PollKind>, session: &PatientSession, now: NaiveDateTime) -> DashboardView {
        let alerts = alerts::evaluate(&self.history.window(alerts::MIN_WINDOW));
        match &alerts {
            Ok(found) => {
                for alert in found {
                    warn!(parameter = %alert.parameter, value = alert.value, "{}", alert.message());
                }
            }
            Err(e) => debug!(error = %e, "trend evaluation skipped"),
        }

        let stay = session
            .stay_durations(now)
            .map(|durations| stay::stay_report(&durations, &session.patient.attending_doctor));
        if let Err(e) = &stay {
            warn!(error = %e, "stay durations unavailable");
        }

        DashboardView {
            generated_at: now,
            poll,
            vitals_status: self.vitals_status.clone(),
            beds_status: self.beds_status.clone(),
            patient: session.patient.clone(),
            current: self.current_values(),
            alerts,
            trends: self.trends(),
            forecasts: self.forecasts(now),
            beds: self.beds.clone(),
            location: LocationReport {
                current_unit: session.current_unit,
                timeline: session.location_log.clone(),
                pathway: session.pathway(),
            },
            stay,
            therapy: session.therapy_report(now, Duration::minutes(self.config.therapy.active_minutes)),
        }
    }

    fn current_values(&self) -> Vec<CurrentValue> {
        let Some(latest) = self.history.latest() else {
            return Vec::new();
        };
        VitalParameter::ALL
            .into_iter()
            .map(|parameter| {
                let value = latest.value(parameter);
                CurrentValue {
                    parameter,
                    value: (value * 10.0).round() / 10.0,
                    critical: parameter.is_critical(value),
                }
            })
            .collect()
    }

    fn trends(&self) -> Vec<Trend> {
        let mut window = self.history.window(self.config.history.trend_points);
        window.reverse();
        let timestamps: Vec<_> = window.iter().map(|r| r.timestamp).collect();
        VitalParameter::ALL
            .into_iter()
            .map(|parameter| Trend {
                parameter,
                timestamps: timestamps.clone(),
                values: window.iter().map(|r| r.value(parameter)).collect(),
            })
            .collect()
    }

    fn forecasts(&self, now: NaiveDateTime) -> Vec<(VitalParameter, Result<ParameterForecast, ForecastError>)> {
        let last = self.history.latest().map(|r| r.timestamp).unwrap_or(now);
        let step = Duration::seconds(self.config.forecast.step_secs);
        VitalParameter::ALL
            .into_iter()
            .map(|parameter| {
                let series = self.history.series(parameter, self.history.len());
                let result = forecast::project(
                    &self.forecaster,
                    parameter,
                    &series,
                    last,
                    self.config.forecast.horizon,
                    step,
                );
                match &result {
                    Err(ForecastError::TooShort { .. }) | Ok(_) => {}
                    Err(e) => warn!(%parameter, error = %e, "forecast failed"),
                }
                (parameter, result)
            })
            .collect()
    }
}

fn read_failed(source: &str, error: SnapshotError) -> FeedStatus {
    warn!(source, error = %error, "snapshot read failed, keeping last good data");
    FeedStatus::ReadError {
        message: error.to_string(),
    }
}

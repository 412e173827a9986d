//! In-memory patient session.
//!
//! Everything the operator can change lives here: the patient record, the
//! location log, the therapy orders and the timestamps of the last polls.
//! Nothing is persisted. Mutations go through [`PatientSession::submit`] and
//! [`PatientSession::reset`], which return the updated session.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use crate::core::stay::{self, PathwayStage, StayDurations};
use crate::core::TherapyReport;
use crate::dashboard::PollClock;
use crate::error::{SessionError, StayError};
use crate::models::{CareUnit, LocationEvent, PatientRecord, TherapyOrder, TherapyRequest};
use crate::snapshot;

// ===== Operator input =====

/// One submission of the patient update form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientUpdate {
    pub patient: PatientRecord,
    pub location: CareUnit,
    #[serde(default)]
    pub therapy: Option<TherapyRequest>,
}

/// A line of operator input: `reset`, or a JSON-encoded [`PatientUpdate`].
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorCommand {
    Update(PatientUpdate),
    Reset,
}

impl OperatorCommand {
    pub fn parse(line: &str) -> Result<Self, SessionError> {
        if line.trim().eq_ignore_ascii_case("reset") {
            return Ok(OperatorCommand::Reset);
        }
        Ok(OperatorCommand::Update(serde_json::from_str(line)?))
    }
}

// ===== Session state =====

#[derive(Debug, Clone, PartialEq)]
pub struct PatientSession {
    pub patient: PatientRecord,
    pub current_unit: Option<CareUnit>,
    pub location_log: Vec<LocationEvent>,
    pub therapy_orders: Vec<TherapyOrder>,
    pub polls: PollClock,
}

impl PatientSession {
    /// A freshly admitted patient who entered the emergency department at `admitted_at`.
    pub fn new(admitted_at: NaiveDateTime) -> Self {
        Self {
            patient: PatientRecord::admitted(),
            current_unit: Some(CareUnit::Emergency),
            location_log: vec![LocationEvent::enter(CareUnit::Emergency, admitted_at)],
            therapy_orders: Vec::new(),
            polls: PollClock::default(),
        }
    }

    /// Start a session, dating admission from the oldest vitals snapshot on disk.
    #[instrument(skip(vitals_dir), fields(dir = %vitals_dir.display()))]
    pub fn start(vitals_dir: &Path, now: NaiveDateTime) -> Self {
        let admitted_at = snapshot::earliest_vitals_timestamp(vitals_dir).unwrap_or(now);
        info!(%admitted_at, "session started");
        Self::new(admitted_at)
    }

    /// Apply one form submission.
    ///
    /// The record is replaced outright. Moving to another unit closes the
    /// current stay and opens the next one at `now`. A therapy order with every
    /// required field blank is ignored; one with only some of them filled in is
    /// rejected and the session is left unchanged.
    #[instrument(skip(self, update), fields(unit = %update.location))]
    pub fn submit(&self, update: PatientUpdate, now: NaiveDateTime) -> Result<Self, SessionError> {
        let order = match update.therapy {
            Some(request) if !request.is_blank() => {
                Some(TherapyOrder::issue(request, &update.patient.attending_doctor, now)?)
            }
            _ => None,
        };

        let mut next = self.clone();
        next.patient = update.patient;
        next.move_to(update.location, now);
        if let Some(order) = order {
            info!(medicine = %order.medicine, route = %order.route, "therapy order added");
            next.therapy_orders.push(order);
        }
        Ok(next)
    }

    pub fn apply(&self, command: OperatorCommand, now: NaiveDateTime) -> Result<Self, SessionError> {
        match command {
            OperatorCommand::Update(update) => self.submit(update, now),
            OperatorCommand::Reset => Ok(self.reset()),
        }
    }

    /// Record a transfer to `unit`. Staying put records nothing.
    ///
    /// A clock that stepped back since the last logged event is clamped to that
    /// event, so the log stays ordered.
    pub fn move_to(&mut self, unit: CareUnit, now: NaiveDateTime) {
        if self.current_unit == Some(unit) {
            return;
        }
        let now = match self.last_logged() {
            Some(last) if now < last => {
                warn!(%now, %last, "clock went backwards, transfer recorded at the last logged time");
                last
            }
            _ => now,
        };
        if let Some(current) = self.current_unit {
            self.location_log.push(LocationEvent::exit(current, now));
        }
        self.location_log.push(LocationEvent::enter(unit, now));
        info!(from = ?self.current_unit, to = %unit, "patient moved");
        self.current_unit = Some(unit);
    }

    /// Clear the patient, location and therapy data. Poll timestamps survive.
    pub fn reset(&self) -> Self {
        debug!("session reset");
        Self {
            patient: PatientRecord::blank(),
            current_unit: None,
            location_log: Vec::new(),
            therapy_orders: Vec::new(),
            polls: self.polls.clone(),
        }
    }

    fn last_logged(&self) -> Option<NaiveDateTime> {
        self.location_log.last().map(|event| event.timestamp)
    }

    pub fn stay_durations(&self, now: NaiveDateTime) -> Result<StayDurations, StayError> {
        let now = self.last_logged().map_or(now, |last| now.max(last));
        stay::aggregate(&self.location_log, now)
    }

    pub fn pathway(&self) -> Vec<(CareUnit, PathwayStage)> {
        stay::pathway(self.current_unit)
    }

    pub fn therapy_report(&self, now: NaiveDateTime, active_for: Duration) -> TherapyReport {
        TherapyReport::build(&self.therapy_orders, now, active_for)
    }
}

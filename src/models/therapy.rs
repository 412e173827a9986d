use chrono::{Duration, NaiveDateTime};
use serde::{Serialize, Deserialize};
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::vitals::timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Route {
    Oral,
    #[serde(rename = "IV")]
    Intravenous,
    #[serde(rename = "IM")]
    Intramuscular,
    #[serde(rename = "SubQ")]
    Subcutaneous,
    Inhalation,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Route::Oral => "Oral",
            Route::Intravenous => "IV",
            Route::Intramuscular => "IM",
            Route::Subcutaneous => "SubQ",
            Route::Inhalation => "Inhalation",
        };
        f.write_str(name)
    }
}

/// Therapy advice as entered on the update form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TherapyRequest {
    #[validate(length(min = 1, message = "medicine is required"))]
    pub medicine: String,
    #[validate(length(min = 1, message = "dosage is required"))]
    pub dosage: String,
    #[validate(length(min = 1, message = "frequency is required"))]
    pub frequency: String,
    pub route: Route,
    #[serde(default)]
    pub notes: String,
}

impl TherapyRequest {
    /// True when the operator left every required field blank.
    pub fn is_blank(&self) -> bool {
        self.medicine.trim().is_empty() && self.dosage.trim().is_empty() && self.frequency.trim().is_empty()
    }

    fn trimmed(self) -> Self {
        Self {
            medicine: self.medicine.trim().to_string(),
            dosage: self.dosage.trim().to_string(),
            frequency: self.frequency.trim().to_string(),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TherapyOrder {
    pub order_id: Uuid,
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    pub medicine: String,
    pub dosage: String,
    pub frequency: String,
    pub route: Route,
    pub notes: String,
    pub prescribing_doctor: String,
}

impl TherapyOrder {
    /// Validate a request and stamp it as issued at `now`.
    pub fn issue(request: TherapyRequest, prescribing_doctor: &str, now: NaiveDateTime) -> Result<Self, ValidationErrors> {
        let request = request.trimmed();
        request.validate()?;
        Ok(Self {
            order_id: Uuid::new_v4(),
            timestamp: now,
            medicine: request.medicine,
            dosage: request.dosage,
            frequency: request.frequency,
            route: request.route,
            notes: request.notes,
            prescribing_doctor: prescribing_doctor.to_string(),
        })
    }

    pub fn active_until(&self, active_for: Duration) -> NaiveDateTime {
        self.timestamp + active_for
    }

    /// Orders count as active for a fixed period after issuance.
    pub fn is_active(&self, now: NaiveDateTime, active_for: Duration) -> bool {
        now >= self.timestamp && now < self.active_until(active_for)
    }
}

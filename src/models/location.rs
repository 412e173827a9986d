use chrono::NaiveDateTime;
use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use super::vitals::{timestamp, TIMESTAMP_FORMAT};
use crate::error::{ParseUnitError, StayError};

/// Care units a patient moves through, in care-pathway order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CareUnit {
    #[serde(rename = "ED")]
    Emergency,
    #[serde(rename = "ICU")]
    IntensiveCare,
    #[serde(rename = "OR")]
    Surgery,
    #[serde(rename = "Ward")]
    Ward,
}

impl CareUnit {
    pub const PATHWAY: [CareUnit; 4] = [
        CareUnit::Emergency,
        CareUnit::IntensiveCare,
        CareUnit::Surgery,
        CareUnit::Ward,
    ];

    pub fn code(self) -> &'static str {
        match self {
            CareUnit::Emergency => "ED",
            CareUnit::IntensiveCare => "ICU",
            CareUnit::Surgery => "OR",
            CareUnit::Ward => "Ward",
        }
    }

    /// Name the hospital uses on its bed boards.
    pub fn label(self) -> &'static str {
        match self {
            CareUnit::Emergency => "Instalasi Gawat Darurat",
            CareUnit::IntensiveCare => "Ruang ICU",
            CareUnit::Surgery => "Instalasi Bedah Sentral",
            CareUnit::Ward => "Ruang Rawat Inap",
        }
    }

    /// Total beds in the unit.
    pub fn bed_capacity(self) -> u32 {
        match self {
            CareUnit::Emergency => 10,
            CareUnit::IntensiveCare => 8,
            CareUnit::Surgery => 5,
            CareUnit::Ward => 20,
        }
    }
}

impl fmt::Display for CareUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CareUnit {
    type Err = ParseUnitError;

    /// Accepts either the short code or the bed-board label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        CareUnit::PATHWAY
            .into_iter()
            .find(|unit| unit.code().eq_ignore_ascii_case(s) || unit.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseUnitError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationStatus {
    Enter,
    Exit,
}

impl FromStr for LocationStatus {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enter" | "masuk" => Ok(LocationStatus::Enter),
            "exit" | "keluar" => Ok(LocationStatus::Exit),
            other => Err(ParseUnitError(other.to_string())),
        }
    }
}

impl fmt::Display for LocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationStatus::Enter => f.write_str("Enter"),
            LocationStatus::Exit => f.write_str("Exit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEvent {
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    pub unit: CareUnit,
    pub status: LocationStatus,
}

impl LocationEvent {
    pub fn enter(unit: CareUnit, timestamp: NaiveDateTime) -> Self {
        Self { timestamp, unit, status: LocationStatus::Enter }
    }

    pub fn exit(unit: CareUnit, timestamp: NaiveDateTime) -> Self {
        Self { timestamp, unit, status: LocationStatus::Exit }
    }
}

/// A transition as an operator or import supplies it, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRecord {
    pub timestamp: String,
    pub unit: String,
    pub status: String,
}

/// Parse a whole raw log. The first bad record fails the entire log.
pub fn parse_log(records: &[LocationRecord]) -> Result<Vec<LocationEvent>, StayError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let timestamp = NaiveDateTime::parse_from_str(record.timestamp.trim(), TIMESTAMP_FORMAT)
                .map_err(|source| StayError::MalformedTimestamp {
                    index,
                    value: record.timestamp.clone(),
                    source,
                })?;
            let unit = record
                .unit
                .parse()
                .map_err(|source| StayError::UnknownField { index, source })?;
            let status = record
                .status
                .parse()
                .map_err(|source| StayError::UnknownField { index, source })?;
            Ok(LocationEvent { timestamp, unit, status })
        })
        .collect()
}

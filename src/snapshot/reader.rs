use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

use super::{latest_snapshot, list_snapshots, SnapshotKind};
use crate::error::SnapshotError;
use crate::models::{BedRow, BedStatus, VitalParameter, VitalReading};

const VITAL_COLUMNS: [&str; 6] = [
    "timestamp",
    "heart_rate",
    "blood_pressure_systolic",
    "blood_pressure_diastolic",
    "oxygen_saturation",
    "temperature",
];

const BED_COLUMNS: [&str; 5] = ["timestamp", "unit", "kapasitas_total", "bed_terpakai", "bed_tersedia"];

/// Why there is nothing to read yet. Not an error: the feed may simply not have started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitReason {
    MissingDirectory(PathBuf),
    NoSnapshots(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Latest<T> {
    Found { path: PathBuf, data: T },
    Waiting(WaitReason),
}

/// One bed snapshot: every unit's status at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct BedBoard {
    pub timestamp: NaiveDateTime,
    pub units: Vec<BedStatus>,
}

fn open_csv(path: &Path, required: &[&'static str]) -> Result<csv::Reader<std::fs::File>, SnapshotError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| SnapshotError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    let headers = reader
        .headers()
        .map_err(|source| SnapshotError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(SnapshotError::MissingColumn {
                path: path.to_path_buf(),
                column: *column,
            });
        }
    }
    Ok(reader)
}

/// Parse a vitals snapshot. Rows come back newest first.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_vitals(path: &Path) -> Result<Vec<VitalReading>, SnapshotError> {
    let mut reader = open_csv(path, &VITAL_COLUMNS)?;
    let mut readings = reader
        .deserialize::<VitalReading>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| SnapshotError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    if readings.is_empty() {
        return Err(SnapshotError::Empty(path.to_path_buf()));
    }
    // csv accepts "NaN" and "inf" as floats
    for reading in &readings {
        if let Some(parameter) = VitalParameter::ALL.into_iter().find(|&p| !reading.value(p).is_finite()) {
            return Err(SnapshotError::NonFinite {
                path: path.to_path_buf(),
                column: parameter.column(),
                timestamp: reading.timestamp,
            });
        }
    }
    readings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    debug!(rows = readings.len(), "vitals snapshot parsed");
    Ok(readings)
}

/// Parse a bed snapshot. Any row that breaks the capacity invariant rejects the file.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_beds(path: &Path) -> Result<BedBoard, SnapshotError> {
    let mut reader = open_csv(path, &BED_COLUMNS)?;
    let rows = reader
        .deserialize::<BedRow>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| SnapshotError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    let first = rows.first().ok_or_else(|| SnapshotError::Empty(path.to_path_buf()))?;
    let timestamp = first.timestamp;

    let units = rows
        .iter()
        .map(BedStatus::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            warn!(path = %path.display(), error = %e, "bed snapshot rejected");
            e
        })?;

    Ok(BedBoard { timestamp, units })
}

fn read_latest<T>(
    dir: &Path,
    kind: SnapshotKind,
    parse: impl FnOnce(&Path) -> Result<T, SnapshotError>,
) -> Result<Latest<T>, SnapshotError> {
    let path = match latest_snapshot(dir, kind) {
        Ok(Some(path)) => path,
        Ok(None) => return Ok(Latest::Waiting(WaitReason::NoSnapshots(dir.to_path_buf()))),
        Err(SnapshotError::MissingDirectory(dir)) => return Ok(Latest::Waiting(WaitReason::MissingDirectory(dir))),
        Err(e) => return Err(e),
    };
    let data = parse(&path)?;
    Ok(Latest::Found { path, data })
}

pub fn read_latest_vitals(dir: &Path) -> Result<Latest<Vec<VitalReading>>, SnapshotError> {
    read_latest(dir, SnapshotKind::Vitals, read_vitals)
}

pub fn read_latest_beds(dir: &Path) -> Result<Latest<BedBoard>, SnapshotError> {
    read_latest(dir, SnapshotKind::Beds, read_beds)
}

/// Timestamp of the oldest vitals snapshot still on disk, if any can be read.
pub fn earliest_vitals_timestamp(dir: &Path) -> Option<NaiveDateTime> {
    let files = list_snapshots(dir, SnapshotKind::Vitals).ok()?;
    let first = files.first()?;
    match read_vitals(first) {
        Ok(readings) => readings.last().map(|r| r.timestamp),
        Err(e) => {
            warn!(path = %first.display(), error = %e, "could not read earliest snapshot");
            None
        }
    }
}

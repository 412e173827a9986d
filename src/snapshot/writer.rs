use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use super::SnapshotKind;
use crate::error::SnapshotError;
use crate::models::{BedStatus, VitalParameter, VitalReading, TIMESTAMP_FORMAT};

fn ensure_dir(dir: &Path) -> Result<(), SnapshotError> {
    fs::create_dir_all(dir).map_err(|source| SnapshotError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> SnapshotError + '_ {
    move |source| SnapshotError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Whole numbers for everything but temperature, like the bedside monitor prints them.
fn format_value(parameter: VitalParameter, value: f64) -> String {
    match parameter {
        VitalParameter::Temperature => format!("{value:.1}"),
        _ => format!("{value:.0}"),
    }
}

/// Write one vitals snapshot named after the reading's timestamp.
#[instrument(level = "debug", skip_all, fields(dir = %dir.display(), timestamp = %reading.timestamp))]
pub fn write_vitals(dir: &Path, reading: &VitalReading) -> Result<PathBuf, SnapshotError> {
    ensure_dir(dir)?;
    let path = dir.join(SnapshotKind::Vitals.file_name(reading.timestamp));
    let mut writer = csv::Writer::from_path(&path).map_err(csv_error(&path))?;

    let mut header = vec!["timestamp"];
    header.extend(VitalParameter::ALL.iter().map(|p| p.column()));
    writer.write_record(&header).map_err(csv_error(&path))?;

    let mut row = vec![reading.timestamp.format(TIMESTAMP_FORMAT).to_string()];
    row.extend(VitalParameter::ALL.iter().map(|&p| format_value(p, reading.value(p))));
    writer.write_record(&row).map_err(csv_error(&path))?;

    writer.flush().map_err(|source| SnapshotError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "vitals snapshot written");
    Ok(path)
}

/// Write one bed snapshot with a row per unit.
#[instrument(level = "debug", skip_all, fields(dir = %dir.display(), %timestamp))]
pub fn write_beds(dir: &Path, timestamp: NaiveDateTime, units: &[BedStatus]) -> Result<PathBuf, SnapshotError> {
    ensure_dir(dir)?;
    let path = dir.join(SnapshotKind::Beds.file_name(timestamp));
    let mut writer = csv::Writer::from_path(&path).map_err(csv_error(&path))?;
    for status in units {
        writer.serialize(status.to_row(timestamp)).map_err(csv_error(&path))?;
    }
    writer.flush().map_err(|source| SnapshotError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), units = units.len(), "bed snapshot written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CareUnit;
    use crate::snapshot::{read_beds, read_vitals};
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(10, 0, 5).unwrap()
    }

    #[test]
    fn vitals_file_has_expected_layout() {
        let dir = tempfile::tempdir().unwrap();
        let reading = VitalReading {
            timestamp: at(),
            heart_rate: 74.0,
            systolic: 121.0,
            diastolic: 82.0,
            oxygen_saturation: 97.0,
            temperature: 37.24,
        };
        let path = write_vitals(dir.path(), &reading).unwrap();
        assert_eq!(path.file_name().unwrap(), "vital_signs_20240501_100005.csv");

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "timestamp,heart_rate,blood_pressure_systolic,blood_pressure_diastolic,oxygen_saturation,temperature\n\
             2024-05-01 10:00:05,74,121,82,97,37.2\n"
        );
        assert_eq!(read_vitals(&path).unwrap()[0].temperature, 37.2);
    }

    #[test]
    fn bed_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let units: Vec<_> = CareUnit::PATHWAY
            .iter()
            .map(|&u| BedStatus::new(u, u.bed_capacity(), u.bed_capacity() / 2))
            .collect();
        let path = write_beds(dir.path(), at(), &units).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("timestamp,unit,kapasitas_total,bed_terpakai,bed_tersedia\n"));
        assert!(text.contains("2024-05-01 10:00:05,Ruang ICU,8,4,4"));

        let board = read_beds(&path).unwrap();
        assert_eq!(board.timestamp, at());
        assert_eq!(board.units, units);
    }
}

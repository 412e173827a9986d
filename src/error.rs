//! Error types for Noah Monitor.

use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::CareUnit;

/// A unit or status name that is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised value: {0:?}")]
pub struct ParseUnitError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("insufficient history for trend evaluation: need {required} readings, have {actual}")]
    InsufficientData { required: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum StayError {
    #[error("location record {index}: malformed timestamp {value:?}")]
    MalformedTimestamp {
        index: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("location record {index}: {source}")]
    UnknownField {
        index: usize,
        #[source]
        source: ParseUnitError,
    },

    #[error("location event {index} is earlier than the event before it")]
    OutOfOrder { index: usize },

    #[error("evaluation time precedes the open stay in {unit}")]
    NowBeforeOpenInterval { unit: CareUnit },
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} is missing required column {column:?}")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{0} contains no data rows")]
    Empty(PathBuf),

    #[error("bed status for {unit} is inconsistent: {in_use} in use + {available} available != {total} total")]
    BedInvariant {
        unit: String,
        total: u32,
        in_use: u32,
        available: u32,
    },

    #[error("{path} has a non-finite {column} value at {timestamp}")]
    NonFinite {
        path: PathBuf,
        column: &'static str,
        timestamp: NaiveDateTime,
    },

    #[error("unknown care unit in bed status: {0}")]
    UnknownUnit(#[from] ParseUnitError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("series too short to fit: need {required} points, have {actual}")]
    TooShort { required: usize, actual: usize },

    #[error("series has no variation to fit")]
    Degenerate,

    #[error("series contains non-finite values")]
    NonFinite,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("therapy order is incomplete: {0}")]
    IncompleteTherapyOrder(#[from] validator::ValidationErrors),

    #[error("unreadable operator command: {0}")]
    MalformedCommand(#[from] serde_json::Error),
}

/// Top-level error for library callers that do not care which stage failed.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Stay(#[from] StayError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T, E = MonitorError> = std::result::Result<T, E>;

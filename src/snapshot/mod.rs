//! Snapshot files exchanged between the feed and the dashboard.
//!
//! The feed writes one new file per cycle with a sortable timestamp in its
//! name. Readers take the lexicographically last name as the current state,
//! so nothing needs locking; the feed alone prunes old files.

mod reader;
mod writer;

pub use reader::{earliest_vitals_timestamp, read_beds, read_latest_beds, read_latest_vitals, read_vitals, BedBoard, Latest, WaitReason};
pub use writer::{write_beds, write_vitals};

use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::SnapshotError;

const FILE_STAMP: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Vitals,
    Beds,
}

impl SnapshotKind {
    pub fn prefix(self) -> &'static str {
        match self {
            SnapshotKind::Vitals => "vital_signs_",
            SnapshotKind::Beds => "bed_status_",
        }
    }

    pub fn file_name(self, timestamp: NaiveDateTime) -> String {
        format!("{}{}.csv", self.prefix(), timestamp.format(FILE_STAMP))
    }

    fn matches(self, name: &str) -> bool {
        name.starts_with(self.prefix()) && name.ends_with(".csv")
    }
}

/// Snapshot files of one kind in `dir`, oldest first by name.
pub fn list_snapshots(dir: &Path, kind: SnapshotKind) -> Result<Vec<PathBuf>, SnapshotError> {
    if !dir.is_dir() {
        return Err(SnapshotError::MissingDirectory(dir.to_path_buf()));
    }
    let entries = fs::read_dir(dir).map_err(|source| SnapshotError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| SnapshotError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        if let Some(name) = entry.file_name().to_str() {
            if kind.matches(name) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names.into_iter().map(|name| dir.join(name)).collect())
}

pub fn latest_snapshot(dir: &Path, kind: SnapshotKind) -> Result<Option<PathBuf>, SnapshotError> {
    Ok(list_snapshots(dir, kind)?.pop())
}

/// Delete all but the newest `keep` files of one kind. Returns the removed paths.
pub fn prune(dir: &Path, kind: SnapshotKind, keep: usize) -> Result<Vec<PathBuf>, SnapshotError> {
    let files = list_snapshots(dir, kind)?;
    if files.len() <= keep {
        return Ok(Vec::new());
    }
    let excess = files.len() - keep;
    let mut removed = Vec::with_capacity(excess);
    for path in files.into_iter().take(excess) {
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "pruned snapshot");
                removed.push(path);
            }
            // a concurrent cleanup got there first
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(SnapshotError::Io { path, source }),
        }
    }
    if !removed.is_empty() {
        info!(dir = %dir.display(), removed = removed.len(), "retention applied");
    }
    Ok(removed)
}

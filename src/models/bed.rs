use chrono::NaiveDateTime;
use serde::{Serialize, Deserialize};

use super::location::CareUnit;
use super::vitals::timestamp;
use crate::error::SnapshotError;

/// One row of a bed snapshot file, exactly as written by the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedRow {
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    pub unit: String,
    pub kapasitas_total: u32,
    pub bed_terpakai: u32,
    pub bed_tersedia: u32,
}

/// Bed occupancy for one unit. `beds_in_use + beds_available == total_capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedStatus {
    pub unit: CareUnit,
    pub total_capacity: u32,
    pub beds_in_use: u32,
    pub beds_available: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccupancyBand {
    Low,
    Moderate,
    High,
}

/// Occupancy at or above this percentage is flagged as near capacity.
pub const NEAR_CAPACITY_PCT: f64 = 90.0;

impl BedStatus {
    pub fn new(unit: CareUnit, total_capacity: u32, beds_in_use: u32) -> Self {
        let beds_in_use = beds_in_use.min(total_capacity);
        Self {
            unit,
            total_capacity,
            beds_in_use,
            beds_available: total_capacity - beds_in_use,
        }
    }

    /// Occupancy percentage rounded to one decimal.
    pub fn occupancy_pct(&self) -> f64 {
        if self.total_capacity == 0 {
            return 0.0;
        }
        let pct = f64::from(self.beds_in_use) / f64::from(self.total_capacity) * 100.0;
        (pct * 10.0).round() / 10.0
    }

    pub fn band(&self) -> OccupancyBand {
        let pct = self.occupancy_pct();
        if pct < 50.0 {
            OccupancyBand::Low
        } else if pct < 75.0 {
            OccupancyBand::Moderate
        } else {
            OccupancyBand::High
        }
    }

    pub fn near_capacity(&self) -> bool {
        self.occupancy_pct() >= NEAR_CAPACITY_PCT
    }
}

impl TryFrom<&BedRow> for BedStatus {
    type Error = SnapshotError;

    /// Rows that break the capacity invariant are rejected, never repaired.
    fn try_from(row: &BedRow) -> Result<Self, Self::Error> {
        let unit: CareUnit = row.unit.parse()?;
        if u64::from(row.bed_terpakai) + u64::from(row.bed_tersedia) != u64::from(row.kapasitas_total) {
            return Err(SnapshotError::BedInvariant {
                unit: row.unit.clone(),
                total: row.kapasitas_total,
                in_use: row.bed_terpakai,
                available: row.bed_tersedia,
            });
        }
        Ok(Self {
            unit,
            total_capacity: row.kapasitas_total,
            beds_in_use: row.bed_terpakai,
            beds_available: row.bed_tersedia,
        })
    }
}

impl BedStatus {
    pub fn to_row(&self, timestamp: NaiveDateTime) -> BedRow {
        BedRow {
            timestamp,
            unit: self.unit.label().to_string(),
            kapasitas_total: self.total_capacity,
            bed_terpakai: self.beds_in_use,
            bed_tersedia: self.beds_available,
        }
    }
}

//! Sensor feed simulator.
//!
//! Writes a vitals snapshot and a bed snapshot every cycle, switching to
//! critical-range readings for a short hold at the start of every critical
//! period, and keeps only the newest few files of each kind.

use chrono::{Local, NaiveDateTime};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::path::PathBuf;
use std::time::Duration as StdDuration;
use tracing::{error, info, instrument, warn};

use crate::config::{DataConfig, FeedConfig};
use crate::error::SnapshotError;
use crate::models::{BedStatus, CareUnit, VitalReading};
use crate::snapshot::{self, SnapshotKind};

/// Mean and standard deviation for one parameter.
#[derive(Debug, Clone, Copy)]
struct Spread {
    mean: f64,
    sd: f64,
}

const fn spread(mean: f64, sd: f64) -> Spread {
    Spread { mean, sd }
}

/// heart rate, systolic, diastolic, SpO2, temperature
const NORMAL: [Spread; 5] = [spread(75.0, 5.0), spread(120.0, 10.0), spread(80.0, 8.0), spread(98.0, 1.0), spread(37.0, 0.3)];
const CRITICAL: [Spread; 5] = [spread(55.0, 2.0), spread(85.0, 2.0), spread(45.0, 2.0), spread(88.0, 1.0), spread(39.5, 0.2)];

/// Typical bed occupancy as a fraction of capacity.
const BED_LOAD: f64 = 0.7;

fn sample<R: Rng + ?Sized>(rng: &mut R, s: Spread) -> f64 {
    match Normal::new(s.mean, s.sd) {
        Ok(normal) => normal.sample(rng),
        Err(_) => s.mean,
    }
}

/// Whether the simulator should be emitting critical readings `elapsed_secs` after start.
pub fn is_critical_time(elapsed_secs: u64, cycle_secs: u64, hold_secs: u64) -> bool {
    cycle_secs > 0 && elapsed_secs % cycle_secs < hold_secs
}

pub fn generate_vitals<R: Rng + ?Sized>(rng: &mut R, critical: bool, timestamp: NaiveDateTime) -> VitalReading {
    let table = if critical { &CRITICAL } else { &NORMAL };
    let whole = |v: f64| v.round().max(0.0);
    VitalReading {
        timestamp,
        heart_rate: whole(sample(rng, table[0])),
        systolic: whole(sample(rng, table[1])),
        diastolic: whole(sample(rng, table[2])),
        oxygen_saturation: whole(sample(rng, table[3])).min(100.0),
        temperature: (sample(rng, table[4]) * 10.0).round() / 10.0,
    }
}

pub fn generate_beds<R: Rng + ?Sized>(rng: &mut R) -> Vec<BedStatus> {
    CareUnit::PATHWAY
        .into_iter()
        .map(|unit| {
            let capacity = unit.bed_capacity();
            let used = sample(rng, spread(f64::from(capacity) * BED_LOAD, 1.0))
                .round()
                .clamp(0.0, f64::from(capacity)) as u32;
            BedStatus::new(unit, capacity, used)
        })
        .collect()
}

/// Files produced by one feed cycle.
#[derive(Debug, Clone)]
pub struct FeedCycle {
    pub critical: bool,
    pub vitals_path: PathBuf,
    pub beds_path: PathBuf,
    pub pruned: usize,
}

pub struct FeedSimulator<R> {
    rng: R,
    data: DataConfig,
    feed: FeedConfig,
    started: NaiveDateTime,
}

impl<R: Rng> FeedSimulator<R> {
    pub fn new(rng: R, data: DataConfig, feed: FeedConfig, started: NaiveDateTime) -> Self {
        Self { rng, data, feed, started }
    }

    /// Emit one vitals and one bed snapshot stamped `now`, then apply retention.
    #[instrument(skip(self))]
    pub fn cycle(&mut self, now: NaiveDateTime) -> Result<FeedCycle, SnapshotError> {
        let elapsed = (now - self.started).num_seconds().max(0) as u64;
        let critical = is_critical_time(elapsed, self.feed.critical_cycle_secs, self.feed.critical_hold_secs);
        if critical {
            warn!(elapsed, "emitting critical readings");
        }

        let reading = generate_vitals(&mut self.rng, critical, now);
        let vitals_path = snapshot::write_vitals(&self.data.vitals_dir, &reading)?;
        let beds = generate_beds(&mut self.rng);
        let beds_path = snapshot::write_beds(&self.data.bed_dir, now, &beds)?;

        let pruned = snapshot::prune(&self.data.vitals_dir, SnapshotKind::Vitals, self.data.retention)?.len()
            + snapshot::prune(&self.data.bed_dir, SnapshotKind::Beds, self.data.retention)?.len();

        Ok(FeedCycle {
            critical,
            vitals_path,
            beds_path,
            pruned,
        })
    }
}

/// Run the simulator until Ctrl-C.
pub async fn run(data: DataConfig, feed: FeedConfig) -> anyhow::Result<()> {
    let interval_secs = feed.interval_secs.max(1);
    let mut simulator = FeedSimulator::new(rand::thread_rng(), data, feed, Local::now().naive_local());
    let mut ticker = tokio::time::interval(StdDuration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    info!(interval_secs, "sensor feed started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match simulator.cycle(Local::now().naive_local()) {
                    Ok(cycle) => info!(
                        critical = cycle.critical,
                        vitals = %cycle.vitals_path.display(),
                        pruned = cycle.pruned,
                        "feed cycle written"
                    ),
                    Err(e) => error!(error = %e, "feed cycle failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("sensor feed stopped");
                return Ok(());
            }
        }
    }
}

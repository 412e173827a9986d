use std::collections::VecDeque;

use crate::models::{VitalParameter, VitalReading};

/// Readings seen so far, newest first, bounded by `capacity`.
#[derive(Debug, Clone)]
pub struct VitalHistory {
    readings: VecDeque<VitalReading>,
    capacity: usize,
}

impl VitalHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            readings: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn latest(&self) -> Option<&VitalReading> {
        self.readings.front()
    }

    /// Insert a reading in timestamp order. Returns false if a reading with the
    /// same timestamp is already held or it is older than everything retained
    /// in a full history.
    pub fn insert(&mut self, reading: VitalReading) -> bool {
        let position = self.readings.iter().position(|r| r.timestamp <= reading.timestamp);
        if let Some(i) = position {
            if self.readings[i].timestamp == reading.timestamp {
                return false;
            }
        }
        let index = position.unwrap_or(self.readings.len());
        if index >= self.capacity {
            return false;
        }
        self.readings.insert(index, reading);
        self.readings.truncate(self.capacity);
        true
    }

    /// Insert many readings, returning how many were new.
    pub fn extend<I>(&mut self, readings: I) -> usize
    where
        I: IntoIterator<Item = VitalReading>,
    {
        readings.into_iter().filter(|r| self.insert(r.clone())).count()
    }

    /// The newest `n` readings, newest first.
    pub fn window(&self, n: usize) -> Vec<VitalReading> {
        self.readings.iter().take(n).cloned().collect()
    }

    /// The newest `n` values of one parameter, oldest first, for charting and fitting.
    pub fn series(&self, parameter: VitalParameter, n: usize) -> Vec<f64> {
        let mut values: Vec<f64> = self.readings.iter().take(n).map(|r| r.value(parameter)).collect();
        values.reverse();
        values
    }

    pub fn clear(&mut self) {
        self.readings.clear();
    }
}

//! Therapy monitoring views over the order log.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Route, TherapyOrder};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TherapyEntry {
    pub order: TherapyOrder,
    pub active_until: NaiveDateTime,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TherapyReport {
    pub entries: Vec<TherapyEntry>,
    pub route_counts: BTreeMap<Route, usize>,
}

impl TherapyReport {
    pub fn build(orders: &[TherapyOrder], now: NaiveDateTime, active_for: Duration) -> Self {
        let entries = orders
            .iter()
            .map(|order| TherapyEntry {
                active_until: order.active_until(active_for),
                active: order.is_active(now, active_for),
                order: order.clone(),
            })
            .collect();

        let mut route_counts = BTreeMap::new();
        for order in orders {
            *route_counts.entry(order.route).or_insert(0) += 1;
        }

        Self { entries, route_counts }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn active(&self) -> impl Iterator<Item = &TherapyEntry> {
        self.entries.iter().filter(|e| e.active)
    }

    /// Distinct medicine names in first-ordered order.
    pub fn medicines(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !names.contains(&entry.order.medicine.as_str()) {
                names.push(&entry.order.medicine);
            }
        }
        names
    }

    pub fn for_medicine<'a>(&'a self, medicine: &'a str) -> impl Iterator<Item = &'a TherapyEntry> + 'a {
        self.entries.iter().filter(move |e| e.order.medicine == medicine)
    }
}

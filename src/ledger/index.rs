use std::collections::{BTreeSet, HashMap};

use super::{Entry, Ledger};

/// Vehicles currently credited with an incentive, with the number of
/// entries that credit them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncentiveIndex {
    counts: HashMap<String, usize>,
}

impl IncentiveIndex {
    /// Derive the index by scanning every entry.
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let mut index = Self::default();
        for entry in ledger.entries() {
            index.insert(entry);
        }
        index
    }

    pub fn contains(&self, vehicle: &str) -> bool {
        self.counts.contains_key(vehicle)
    }

    /// Whether some entry other than `excluding` credits `vehicle`.
    pub fn held_elsewhere(&self, vehicle: &str, excluding: &Entry) -> bool {
        let count = self.counts.get(vehicle).copied().unwrap_or(0);
        let own = usize::from(excluding.is_incentivized() && excluding.vehicle_number == vehicle);
        count > own
    }

    pub fn insert(&mut self, entry: &Entry) {
        if entry.is_incentivized() {
            *self.counts.entry(entry.vehicle_number.clone()).or_insert(0) += 1;
        }
    }

    pub fn remove(&mut self, entry: &Entry) {
        if !entry.is_incentivized() {
            return;
        }
        if let Some(count) = self.counts.get_mut(&entry.vehicle_number) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&entry.vehicle_number);
            }
        }
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn vehicles(&self) -> BTreeSet<&str> {
        self.counts.keys().map(String::as_str).collect()
    }
}

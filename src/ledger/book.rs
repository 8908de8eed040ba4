use rust_decimal::Decimal;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::Entry;
use crate::error::{FleetError, Result};

/// Per-partner commission and remarks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerMeta {
    #[serde(default)]
    pub commission: Decimal,
    #[serde(default)]
    pub remarks: String,
}

pub type PartnerMetaMap = BTreeMap<String, PartnerMeta>;

/// Partner name to trip entries, in insertion order.
///
/// Serialized as a JSON object; key order is kept on both write and read,
/// so partners come back in the order they were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    partners: Vec<(String, Vec<Entry>)>,
}

impl Ledger {
    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    pub fn partner_count(&self) -> usize {
        self.partners.len()
    }

    pub fn entry_count(&self) -> usize {
        self.partners.iter().map(|(_, entries)| entries.len()).sum()
    }

    pub fn partners(&self) -> impl Iterator<Item = (&str, &[Entry])> {
        self.partners
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    pub fn get(&self, partner: &str) -> Option<&[Entry]> {
        self.partners
            .iter()
            .find(|(name, _)| name == partner)
            .map(|(_, entries)| entries.as_slice())
    }

    pub fn contains(&self, partner: &str) -> bool {
        self.get(partner).is_some()
    }

    /// Every entry across all partners.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.partners.iter().flat_map(|(_, entries)| entries.iter())
    }

    fn position(&self, partner: &str) -> Option<usize> {
        self.partners.iter().position(|(name, _)| name == partner)
    }

    /// Append an entry, creating the partner if needed. Returns true when
    /// the partner was created.
    pub fn push(&mut self, partner: &str, entry: Entry) -> bool {
        match self.position(partner) {
            Some(idx) => {
                self.partners[idx].1.push(entry);
                false
            }
            None => {
                self.partners.push((partner.to_string(), vec![entry]));
                true
            }
        }
    }

    /// Swap the entry whose id matches `entry.id`, keeping its position.
    /// Returns the displaced entry.
    pub fn replace(&mut self, partner: &str, entry: Entry) -> Result<Entry> {
        let idx = self
            .position(partner)
            .ok_or_else(|| FleetError::PartnerNotFound(partner.to_string()))?;
        let slot = self.partners[idx]
            .1
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| FleetError::EntryNotFound(partner.to_string()))?;
        Ok(std::mem::replace(slot, entry))
    }

    /// Remove an entry by id. The partner is dropped when its list empties;
    /// the flag in the result reports that.
    pub fn remove(&mut self, partner: &str, id: Uuid) -> Result<(Entry, bool)> {
        let idx = self
            .position(partner)
            .ok_or_else(|| FleetError::PartnerNotFound(partner.to_string()))?;
        let entries = &mut self.partners[idx].1;
        let pos = entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| FleetError::EntryNotFound(partner.to_string()))?;
        let removed = entries.remove(pos);
        let emptied = entries.is_empty();
        if emptied {
            self.partners.remove(idx);
        }
        Ok((removed, emptied))
    }

    pub fn clear(&mut self) {
        self.partners.clear();
    }

    /// Ledger restricted to a single partner, if present.
    pub fn only(&self, partner: &str) -> Option<Ledger> {
        self.get(partner).map(|entries| Ledger {
            partners: vec![(partner.to_string(), entries.to_vec())],
        })
    }
}

impl Serialize for Ledger {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.partners.len()))?;
        for (name, entries) in &self.partners {
            map.serialize_entry(name, entries)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Ledger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct LedgerVisitor;

        impl<'de> Visitor<'de> for LedgerVisitor {
            type Value = Ledger;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of partner name to entry list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Ledger, A::Error> {
                let mut ledger = Ledger::default();
                while let Some((name, entries)) = access.next_entry::<String, Vec<Entry>>()? {
                    // Empty lists are not valid partners.
                    for entry in entries {
                        ledger.push(&name, entry);
                    }
                }
                Ok(ledger)
            }
        }

        deserializer.deserialize_map(LedgerVisitor)
    }
}

/// Everything that gets persisted: the ledger and partner metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    #[serde(rename = "form_data", default)]
    pub ledger: Ledger,
    #[serde(rename = "partner_meta", default)]
    pub meta: PartnerMetaMap,
}

impl LedgerState {
    /// Append an entry; the partner's metadata is created on its first entry
    /// and left alone afterwards.
    pub fn add_entry(&mut self, partner: &str, entry: Entry) {
        self.ledger.push(partner, entry);
        self.meta.entry(partner.to_string()).or_default();
    }

    pub fn replace_entry(&mut self, partner: &str, entry: Entry) -> Result<Entry> {
        self.ledger.replace(partner, entry)
    }

    /// Remove an entry; a partner that runs out of entries loses its
    /// metadata too.
    pub fn remove_entry(&mut self, partner: &str, id: Uuid) -> Result<Entry> {
        let (removed, emptied) = self.ledger.remove(partner, id)?;
        if emptied {
            self.meta.remove(partner);
        }
        Ok(removed)
    }

    pub fn set_meta(&mut self, partner: &str, meta: PartnerMeta) -> Result<()> {
        if !self.ledger.contains(partner) {
            return Err(FleetError::PartnerNotFound(partner.to_string()));
        }
        self.meta.insert(partner.to_string(), meta);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.ledger.clear();
        self.meta.clear();
    }

    pub fn meta_for(&self, partner: &str) -> PartnerMeta {
        self.meta.get(partner).cloned().unwrap_or_default()
    }
}

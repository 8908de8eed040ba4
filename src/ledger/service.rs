use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tracing::info;

use super::entry::{normalize_partner, parse_decimal, required};
use super::{Entry, EntryForm, IncentiveIndex, LedgerState, Mutation, PartnerMeta};
use crate::error::{FleetError, Result};
use crate::store::LedgerStore;

struct Inner {
    state: LedgerState,
    index: IncentiveIndex,
}

/// Owner of the in-memory ledger. Validates changes, writes them through
/// the store and publishes every committed state to subscribers.
pub struct LedgerService {
    store: Arc<LedgerStore>,
    inner: Mutex<Inner>,
    tx: watch::Sender<LedgerState>,
}

impl LedgerService {
    /// Build the service from whatever the store currently holds.
    pub fn load(store: Arc<LedgerStore>) -> Self {
        let state = store.current();
        let index = IncentiveIndex::from_ledger(&state.ledger);
        let (tx, _) = watch::channel(state.clone());
        Self {
            store,
            inner: Mutex::new(Inner { state, index }),
            tx,
        }
    }

    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    /// Push-style view of the ledger: the current state, then one item per
    /// committed mutation.
    pub fn subscribe(&self) -> WatchStream<LedgerState> {
        WatchStream::new(self.tx.subscribe())
    }

    pub async fn snapshot(&self) -> LedgerState {
        self.inner.lock().await.state.clone()
    }

    pub async fn entry_count(&self) -> usize {
        self.inner.lock().await.state.ledger.entry_count()
    }

    pub async fn is_incentivized(&self, vehicle: &str) -> bool {
        self.inner.lock().await.index.contains(vehicle.trim())
    }

    /// Vehicles currently holding an incentive, sorted.
    pub async fn incentivized_vehicles(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner.index.vehicles().into_iter().map(str::to_string).collect()
    }

    /// Entries of one partner, looked up by its normalized name.
    pub async fn partner(&self, partner: &str) -> Option<Vec<Entry>> {
        let key = normalize_partner(partner);
        let inner = self.inner.lock().await;
        inner.state.ledger.get(&key).map(<[Entry]>::to_vec)
    }

    pub async fn add_entry(
        &self,
        partner: &str,
        vehicle: &str,
        driver: &str,
        amount: &str,
        incentive: &str,
    ) -> Result<Entry> {
        let key = required("Partner name", partner).map(|p| normalize_partner(&p))?;
        let entry = Entry::parse(vehicle, driver, amount, incentive)?;

        let mut inner = self.inner.lock().await;
        if entry.is_incentivized() && inner.index.contains(&entry.vehicle_number) {
            return Err(FleetError::DuplicateIncentive(entry.vehicle_number));
        }

        let mutation = Mutation::Add {
            partner: key,
            entry: entry.clone(),
        };
        self.commit(&mut inner, mutation).await?;
        inner.index.insert(&entry);
        Ok(entry)
    }

    /// Add the entry described by `form`; on success the trip fields are
    /// cleared and the partner name is kept for the next entry.
    pub async fn submit(&self, form: &mut EntryForm) -> Result<Entry> {
        let entry = self
            .add_entry(
                &form.partner_name,
                &form.vehicle_number,
                &form.driver_name,
                &form.amount,
                &form.incentive,
            )
            .await?;
        form.clear(false);
        Ok(entry)
    }

    /// Replace `old` with `new` (matched by id, position kept).
    pub async fn edit_entry(&self, partner: &str, old: &Entry, new: Entry) -> Result<Entry> {
        let key = normalize_partner(partner);
        let mut inner = self.inner.lock().await;

        let current = inner
            .state
            .ledger
            .get(&key)
            .ok_or_else(|| FleetError::PartnerNotFound(key.clone()))?
            .iter()
            .find(|e| e.id == old.id)
            .cloned()
            .ok_or_else(|| FleetError::EntryNotFound(key.clone()))?;

        if !new.incentive.is_zero() && inner.index.held_elsewhere(&new.vehicle_number, &current) {
            return Err(FleetError::DuplicateIncentive(new.vehicle_number));
        }

        let new = Entry { id: current.id, ..new };
        let mutation = Mutation::Replace {
            partner: key,
            entry: new.clone(),
        };
        self.commit(&mut inner, mutation).await?;

        if current.vehicle_number != new.vehicle_number
            || current.is_incentivized() != new.is_incentivized()
        {
            inner.index.remove(&current);
            inner.index.insert(&new);
        }
        Ok(new)
    }

    pub async fn remove_entry(&self, partner: &str, entry: &Entry) -> Result<Entry> {
        let key = normalize_partner(partner);
        let mut inner = self.inner.lock().await;

        let known = inner
            .state
            .ledger
            .get(&key)
            .ok_or_else(|| FleetError::PartnerNotFound(key.clone()))?
            .iter()
            .any(|e| e.id == entry.id);
        if !known {
            return Err(FleetError::EntryNotFound(key));
        }

        let mutation = Mutation::Remove {
            partner: key.clone(),
            id: entry.id,
        };
        let removed = self
            .commit(&mut inner, mutation)
            .await?
            .ok_or(FleetError::EntryNotFound(key))?;
        inner.index.remove(&removed);
        Ok(removed)
    }

    pub async fn set_commission_and_remarks(
        &self,
        partner: &str,
        commission: &str,
        remarks: &str,
    ) -> Result<PartnerMeta> {
        let key = normalize_partner(partner);
        let meta = PartnerMeta {
            commission: parse_decimal("commission", commission)?,
            remarks: remarks.trim().to_string(),
        };

        let mut inner = self.inner.lock().await;
        if !inner.state.ledger.contains(&key) {
            return Err(FleetError::PartnerNotFound(key));
        }
        let mutation = Mutation::SetMeta {
            partner: key,
            meta: meta.clone(),
        };
        self.commit(&mut inner, mutation).await?;
        Ok(meta)
    }

    pub async fn clear_all_data(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        self.commit(&mut inner, Mutation::Clear).await?;
        inner.index.clear();
        Ok(())
    }

    /// Write through the store, then apply to memory and publish. Memory is
    /// untouched when the store fails.
    async fn commit(&self, inner: &mut Inner, mutation: Mutation) -> Result<Option<Entry>> {
        let persisted = mutation.clone();
        self.store
            .atomic_update(move |state| persisted.apply(state))
            .await?;

        let displaced = mutation.apply(&mut inner.state)?;
        self.tx.send_replace(inner.state.clone());
        info!(
            kind = mutation.kind(),
            entries = inner.state.ledger.entry_count(),
            "ledger updated"
        );
        Ok(displaced)
    }
}

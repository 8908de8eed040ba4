//! Durable storage for the ledger: one JSON blob on disk, updated with
//! read-modify-write cycles that are serialized against each other.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::error::{FleetError, Result};
use crate::ledger::{Ledger, LedgerState, PartnerMetaMap};

pub struct LedgerStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    tx: watch::Sender<LedgerState>,
}

impl LedgerStore {
    /// Open the blob at `path`. A missing or corrupt blob yields an empty
    /// ledger; only real I/O failures are errors.
    ///
    /// Entries stored before ids existed get one assigned on read. Those ids
    /// are written back right away so later read-modify-write cycles see the
    /// same ids as the loaded state.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let (state, missing_ids) = load_blob(&path).await?;
        if missing_ids {
            write_blob(&path, &state).await?;
            info!(
                path = %path.display(),
                entries = state.ledger.entry_count(),
                "assigned ids to stored entries"
            );
        }
        let (tx, _) = watch::channel(state);
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
            tx,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last state written (or loaded) by this store.
    pub fn current(&self) -> LedgerState {
        self.tx.borrow().clone()
    }

    /// Stream of the ledger: the current value first, then one item per
    /// committed update.
    pub fn read_ledger(&self) -> impl Stream<Item = Ledger> + Send + Unpin + 'static {
        WatchStream::new(self.tx.subscribe()).map(|state| state.ledger)
    }

    pub fn read_partner_meta(&self) -> impl Stream<Item = PartnerMetaMap> + Send + Unpin + 'static {
        WatchStream::new(self.tx.subscribe()).map(|state| state.meta)
    }

    /// Re-read the persisted blob, apply `mutator` and write the result back
    /// as one unit. Concurrent callers queue behind each other. Nothing is
    /// written when the mutator fails.
    pub async fn atomic_update<T, F>(&self, mutator: F) -> Result<T>
    where
        F: FnOnce(&mut LedgerState) -> Result<T>,
    {
        let _guard = self.write_lock.lock().await;
        let mut state = read_blob(&self.path).await?;
        let out = mutator(&mut state)?;
        write_blob(&self.path, &state).await?;
        self.tx.send_replace(state);
        Ok(out)
    }

    pub async fn clear(&self) -> Result<()> {
        self.atomic_update(|state| {
            state.clear();
            Ok(())
        })
        .await
    }
}

fn storage_error(action: &str, path: &Path, err: impl std::fmt::Display) -> FleetError {
    FleetError::StorageFailure(format!("failed to {action} {}: {err}", path.display()))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("fleet_data.json"));
    name.push(".tmp");
    path.with_file_name(name)
}

async fn read_blob(path: &Path) -> Result<LedgerState> {
    load_blob(path).await.map(|(state, _)| state)
}

/// Read the blob, also reporting whether any entry was stored without an id.
async fn load_blob(path: &Path) -> Result<(LedgerState, bool)> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok((LedgerState::default(), false)),
        Err(e) => return Err(storage_error("read", path, e)),
    };

    match serde_json::from_slice(&bytes) {
        Ok(state) => Ok((state, has_entries_without_id(&bytes))),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ledger blob is unreadable, starting empty");
            Ok((LedgerState::default(), false))
        }
    }
}

fn has_entries_without_id(bytes: &[u8]) -> bool {
    let Ok(blob) = serde_json::from_slice::<serde_json::Value>(bytes) else {
        return false;
    };
    blob.get("form_data")
        .and_then(|partners| partners.as_object())
        .map_or(false, |partners| {
            partners
                .values()
                .filter_map(|entries| entries.as_array())
                .flatten()
                .any(|entry| entry.get("id").is_none())
        })
}

async fn write_blob(path: &Path, state: &LedgerState) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| storage_error("create", parent, e))?;
    }

    let body = serde_json::to_vec_pretty(state).map_err(|e| storage_error("serialize", path, e))?;
    let tmp = tmp_path(path);
    fs::write(&tmp, body)
        .await
        .map_err(|e| storage_error("write", &tmp, e))?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(storage_error("replace", path, e));
    }

    debug!(
        path = %path.display(),
        partners = state.ledger.partner_count(),
        entries = state.ledger.entry_count(),
        "ledger persisted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Entry;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn tmp_path_sits_next_to_blob() {
        let tmp = tmp_path(Path::new("/data/fleet_data.json"));
        assert_eq!(tmp, PathBuf::from("/data/fleet_data.json.tmp"));
    }

    #[tokio::test]
    async fn missing_blob_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::open(dir.path().join("none.json")).await.unwrap();
        assert_eq!(store.current(), LedgerState::default());
    }

    #[tokio::test]
    async fn corrupt_blob_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet_data.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = LedgerStore::open(&path).await.unwrap();
        assert!(store.current().ledger.is_empty());
    }

    #[tokio::test]
    async fn entries_without_id_keep_the_id_assigned_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet_data.json");
        std::fs::write(
            &path,
            r#"{"form_data":{"Acme":[{"vehicleNumber":"V1","driverName":"D1","amount":100,"incentive":50}]},"partner_meta":{}}"#,
        )
        .unwrap();

        let store = LedgerStore::open(&path).await.unwrap();
        let id = store.current().ledger.entries().next().unwrap().id;

        let on_disk = std::fs::read(&path).unwrap();
        assert!(!has_entries_without_id(&on_disk));
        let removed = store
            .atomic_update(|state| state.remove_entry("Acme", id))
            .await
            .unwrap();
        assert_eq!(removed.id, id);
        assert!(store.current().ledger.is_empty());
    }

    #[test]
    fn detects_entries_without_id() {
        assert!(has_entries_without_id(
            br#"{"form_data":{"Acme":[{"vehicle_number":"V1","driver_name":"D","amount":"1"}]}}"#
        ));
        assert!(!has_entries_without_id(br#"{"form_data":{},"partner_meta":{}}"#));
        assert!(!has_entries_without_id(b"{ not json"));
    }

    #[tokio::test]
    async fn failed_mutator_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet_data.json");
        let store = LedgerStore::open(&path).await.unwrap();

        let result: Result<()> = store
            .atomic_update(|_| Err(FleetError::PartnerNotFound("Acme".into())))
            .await;
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn update_reaches_disk_and_subscribers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("fleet_data.json");
        let store = LedgerStore::open(&path).await.unwrap();
        let mut ledgers = store.read_ledger();
        let mut metas = store.read_partner_meta();

        assert!(ledgers.next().await.unwrap().is_empty());
        assert!(metas.next().await.unwrap().is_empty());

        store
            .atomic_update(|state| {
                state.add_entry("Acme", Entry::new("V1", "D1", dec!(100), Decimal::ZERO));
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(ledgers.next().await.unwrap().entry_count(), 1);
        assert!(metas.next().await.unwrap().contains_key("Acme"));
        let reopened = LedgerStore::open(&path).await.unwrap();
        assert_eq!(reopened.current(), store.current());
        assert!(!tmp_path(&path).exists());
    }
}

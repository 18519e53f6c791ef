//! Local inventory: the persisted map of document path to content hash,
//! modification time, and per-path last-sync time.
//!
//! `update()` is incremental: a document whose mtime matches the record is
//! never re-read, so refreshing a large unchanged vault costs one enumeration.
//! The map is persisted as a JSON side-file after every add/update/delete
//! batch, keyed by [`INVENTORY_FILE`] inside the host's private storage.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use memovault_core::{
    now_ms, DocumentRecord, DocumentStore, Error, PathRules, Result, Settings, SettingsStore,
};

/// File name of the persisted inventory inside the host's private storage.
pub const INVENTORY_FILE: &str = "file_info.json";

/// Hex-encode the md5 digest of document content.
pub fn content_md5(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

// =============================================================================
// SIDE STORE
// =============================================================================

/// Durable side-channel for the inventory map.
///
/// The host maps this onto its private extension storage at a fixed path
/// ([`INVENTORY_FILE`]); the inventory never writes into the document
/// collection itself.
#[async_trait]
pub trait SideStore: Send + Sync {
    /// Read the persisted bytes. `None` when nothing was ever saved.
    async fn read(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the persisted bytes.
    async fn write(&self, bytes: &[u8]) -> Result<()>;
}

/// In-memory [`SideStore`] for tests and standalone harnesses.
#[derive(Default)]
pub struct MemorySideStore {
    data: std::sync::Mutex<Option<Vec<u8>>>,
}

impl MemorySideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current persisted bytes, if any.
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.data.lock().expect("side store lock").clone()
    }
}

#[async_trait]
impl SideStore for MemorySideStore {
    async fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.data.lock().expect("side store lock").clone())
    }

    async fn write(&self, bytes: &[u8]) -> Result<()> {
        *self.data.lock().expect("side store lock") = Some(bytes.to_vec());
        Ok(())
    }
}

// =============================================================================
// INVENTORY
// =============================================================================

/// Change-detection state for the local document collection.
pub struct LocalInventory {
    store: Arc<dyn DocumentStore>,
    side: Arc<dyn SideStore>,
    settings: Arc<RwLock<Settings>>,
    settings_store: Arc<dyn SettingsStore>,
    records: BTreeMap<String, DocumentRecord>,
}

impl LocalInventory {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        side: Arc<dyn SideStore>,
        settings: Arc<RwLock<Settings>>,
        settings_store: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            store,
            side,
            settings,
            settings_store,
            records: BTreeMap::new(),
        }
    }

    /// Record for one path, if tracked.
    pub fn get(&self, path: &str) -> Option<&DocumentRecord> {
        self.records.get(path)
    }

    /// Number of tracked documents.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records admitted by the given rules, in path order. This is the
    /// snapshot the sync engine sends to the compare endpoint.
    pub fn snapshot(&self, rules: &PathRules) -> Vec<DocumentRecord> {
        self.records
            .values()
            .filter(|r| rules.admits(&r.path))
            .cloned()
            .collect()
    }

    /// Read the persisted map back, tolerating absence, then refresh it
    /// against the store. Returns whether the refresh changed anything.
    #[instrument(skip(self), fields(subsystem = "inventory", op = "load"))]
    pub async fn load(&mut self) -> Result<bool> {
        match self.side.read().await? {
            Some(bytes) => match serde_json::from_slice::<BTreeMap<String, DocumentRecord>>(&bytes)
            {
                Ok(records) => {
                    debug!(record_count = records.len(), "Inventory loaded");
                    self.records = records;
                }
                Err(e) => {
                    // A corrupt side-file is recoverable: rebuild from scratch.
                    warn!(error = %e, "Discarding unreadable inventory file");
                    self.records.clear();
                }
            },
            None => {
                debug!("No persisted inventory, starting empty");
                self.records.clear();
            }
        }
        self.update().await
    }

    /// Refresh the map against the current document enumeration.
    ///
    /// Hash and mtime move together: a record is rewritten only when the
    /// stored mtime differs from the store's, and the content digest is
    /// recomputed at the same moment. Paths missing from the enumeration are
    /// pruned. Persists when anything changed and reports it.
    #[instrument(skip(self), fields(subsystem = "inventory", op = "update"))]
    pub async fn update(&mut self) -> Result<bool> {
        let handles = self.store.enumerate().await?;
        let default_sync_time = self.settings.read().await.sync.last_sync_time;
        let mut changed = false;

        let mut seen = std::collections::HashSet::with_capacity(handles.len());
        for handle in &handles {
            seen.insert(handle.path.clone());
            let stale = match self.records.get(&handle.path) {
                Some(record) => record.mtime != handle.mtime_ms,
                None => true,
            };
            if !stale {
                continue;
            }
            let bytes = match self.store.read(&handle.path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    // One unreadable document keeps its old record (if any)
                    // and does not sink the refresh.
                    warn!(doc_path = %handle.path, error = %e, "Skipping unreadable document");
                    continue;
                }
            };
            let md5 = content_md5(&bytes);
            let last_sync_time = self
                .records
                .get(&handle.path)
                .map(|r| r.last_sync_time)
                .unwrap_or(default_sync_time);
            self.records.insert(
                handle.path.clone(),
                DocumentRecord::new(handle.path.clone(), md5, handle.mtime_ms)
                    .with_last_sync_time(last_sync_time),
            );
            changed = true;
        }

        let before = self.records.len();
        self.records.retain(|path, _| seen.contains(path));
        if self.records.len() != before {
            changed = true;
        }

        if changed {
            self.save().await?;
        }
        debug!(
            record_count = self.records.len(),
            changed, "Inventory refreshed"
        );
        Ok(changed)
    }

    /// Persist the full map and bump the last-index watermark.
    pub async fn save(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&self.records)?;
        self.side
            .write(&bytes)
            .await
            .map_err(|e| Error::Persist(format!("inventory write failed: {e}")))?;

        {
            let mut settings = self.settings.write().await;
            settings.sync.last_index_time = now_ms();
        }
        let snapshot = self.settings.read().await.clone();
        if let Err(e) = self.settings_store.persist(&snapshot).await {
            // The side-file is the source of truth; a stale index watermark
            // only costs one skipped short-circuit.
            warn!(error = %e, "Failed to persist settings after inventory save");
        }
        Ok(())
    }

    /// Stamp a set of paths with a new per-path last-sync time and persist.
    ///
    /// Called after confirmed sync actions so "has this path settled"
    /// checks stay path-granular. Unknown paths are ignored.
    #[instrument(skip(self, paths), fields(subsystem = "inventory", op = "stamp_sync_time", path_count = paths.len()))]
    pub async fn update_files_sync_time(&mut self, paths: &[String], timestamp: i64) -> Result<()> {
        let mut changed = false;
        for path in paths {
            if let Some(record) = self.records.get_mut(path) {
                record.last_sync_time = timestamp;
                changed = true;
            }
        }
        if changed {
            self.save().await?;
        }
        Ok(())
    }
}

use super::short_hex;
use crate::error::Result;
use crate::model::{TrashEntry, TrashRecord, now_timestamp};
use crate::size::size_str;
use crate::store::{JsonFileBackend, RecordBackend, RecordStore};
use chrono::Utc;
use std::path::PathBuf;

/// Ledger of soft-deleted items.
///
/// Ids have the shape `<unix-seconds>_<6 hex>_<original name>`. The pair of
/// timestamp and random suffix makes collisions negligible, so no lookup is
/// done at generation time.
pub struct TrashLedger<B = JsonFileBackend> {
    store: RecordStore<TrashRecord, B>,
    storage_root: PathBuf,
}

impl<B: RecordBackend<TrashRecord>> TrashLedger<B> {
    pub fn open(backend: B, storage_root: impl Into<PathBuf>) -> Self {
        Self {
            store: RecordStore::open(backend),
            storage_root: storage_root.into(),
        }
    }

    pub fn store(&self) -> &RecordStore<TrashRecord, B> {
        &self.store
    }

    /// Record a soft delete of `original_rel_path` and return its trash id.
    ///
    /// The size is sampled now, while the item is still in place. The
    /// physical move is the caller's job.
    pub fn add(&self, name: &str, original_rel_path: &str, is_dir: bool) -> Result<String> {
        let id = format!("{}_{}_{}", Utc::now().timestamp(), short_hex(), name);
        let size = if is_dir {
            "-".to_string()
        } else {
            size_str(&self.storage_root.join(original_rel_path))
        };

        let record = TrashRecord {
            original_name: name.to_string(),
            original_path: original_rel_path.to_string(),
            is_dir,
            deleted_at: now_timestamp(),
            size_str: size,
        };

        self.store.update(|records| {
            records.insert(id.clone(), record);
        })?;
        tracing::info!(trash_id = %id, path = %original_rel_path, "Recorded soft delete");
        Ok(id)
    }

    /// Drop a record. Unknown ids are a no-op.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let removed = self.store.update(|records| records.remove(id).is_some())?;
        if removed {
            tracing::debug!(trash_id = %id, "Removed trash record");
        }
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> Option<TrashRecord> {
        self.store.get(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.store.read(|records| records.keys().cloned().collect())
    }

    /// All records, most recently deleted first.
    pub fn list(&self) -> Vec<TrashEntry> {
        let mut entries: Vec<TrashEntry> = self.store.read(|records| {
            records
                .iter()
                .map(|(id, record)| TrashEntry::from_record(id, record))
                .collect()
        });
        entries.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at).then_with(|| a.id.cmp(&b.id)));
        entries
    }
}

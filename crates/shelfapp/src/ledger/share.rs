use super::short_hex;
use crate::error::{Result, ShelfError};
use crate::fsops;
use crate::model::{ShareEntry, ShareRecord, ShareStatus, now_timestamp};
use crate::paths::base_name;
use crate::store::{JsonFileBackend, RecordBackend, RecordStore};
use std::path::PathBuf;

/// Attempts at drawing a free token before giving up with `IdExhausted`.
pub const MAX_TOKEN_ATTEMPTS: usize = 64;

type TokenSource = Box<dyn Fn() -> String + Send + Sync>;

/// Ledger of public share grants.
///
/// Tokens are only six hex characters, so generation checks the current key
/// set and redraws on collision.
pub struct ShareLedger<B = JsonFileBackend> {
    store: RecordStore<ShareRecord, B>,
    storage_root: PathBuf,
    tokens: TokenSource,
}

impl<B: RecordBackend<ShareRecord>> ShareLedger<B> {
    pub fn open(backend: B, storage_root: impl Into<PathBuf>) -> Self {
        Self {
            store: RecordStore::open(backend),
            storage_root: storage_root.into(),
            tokens: Box::new(short_hex),
        }
    }

    /// Replace the random token generator.
    pub fn with_token_source(mut self, source: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.tokens = Box::new(source);
        self
    }

    pub fn store(&self) -> &RecordStore<ShareRecord, B> {
        &self.store
    }

    /// Create a share for `rel_path` and return its token.
    ///
    /// Whether the target is a directory is captured now and never re-checked.
    pub fn create(&self, rel_path: &str) -> Result<String> {
        let is_dir = self.storage_root.join(rel_path).is_dir();
        let record = ShareRecord {
            file_path: rel_path.to_string(),
            file_name: base_name(rel_path),
            is_dir,
            created_at: now_timestamp(),
            downloads: 0,
        };

        // Draw under the store lock so the free-token check and the insert
        // cannot interleave with another create.
        let id = self.store.update(|records| {
            let id = (0..MAX_TOKEN_ATTEMPTS)
                .map(|_| (self.tokens)())
                .find(|token| !records.contains_key(token))?;
            records.insert(id.clone(), record);
            Some(id)
        })?;

        let id = id.ok_or(ShelfError::IdExhausted(MAX_TOKEN_ATTEMPTS))?;
        tracing::info!(share_id = %id, path = %rel_path, "Created share");
        Ok(id)
    }

    /// Remove a share. `false` means there was nothing to cancel.
    pub fn cancel(&self, id: &str) -> Result<bool> {
        let removed = self.store.update(|records| records.remove(id).is_some())?;
        if removed {
            tracing::info!(share_id = %id, "Cancelled share");
        }
        Ok(removed)
    }

    /// Pure lookup. Does not count as a download.
    pub fn resolve(&self, id: &str) -> Option<ShareRecord> {
        self.store.get(id)
    }

    /// Count one completed transfer and return the new total.
    pub fn register_download(&self, id: &str) -> Result<u64> {
        let count = self.store.update(|records| {
            records.get_mut(id).map(|record| {
                record.downloads = record.downloads.saturating_add(1);
                record.downloads
            })
        })?;
        count.ok_or_else(|| ShelfError::ShareNotFound(id.to_string()))
    }

    /// `normal` while the target is still reachable under the storage root.
    pub fn status_of(&self, record: &ShareRecord) -> ShareStatus {
        if fsops::reachable(&self.storage_root.join(&record.file_path)) {
            ShareStatus::Normal
        } else {
            ShareStatus::Lost
        }
    }

    /// All shares with live status, newest first.
    pub fn list(&self) -> Vec<ShareEntry> {
        let snapshot = self.store.snapshot();
        let mut entries: Vec<ShareEntry> = snapshot
            .into_iter()
            .map(|(id, record)| ShareEntry {
                status: self.status_of(&record),
                id,
                name: record.file_name,
                path: record.file_path,
                created_at: record.created_at,
                downloads: record.downloads,
                is_dir: record.is_dir,
            })
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemBackend;
    use std::collections::HashSet;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn ledger(root: &TempDir) -> ShareLedger<MemBackend<ShareRecord>> {
        ShareLedger::open(MemBackend::new(), root.path())
    }

    #[test]
    fn create_snapshots_target_kind() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("photos")).unwrap();
        fs::write(root.path().join("photos/cat.jpg"), b"meow").unwrap();
        let ledger = ledger(&root);

        let dir_id = ledger.create("photos").unwrap();
        let file_id = ledger.create("photos/cat.jpg").unwrap();

        let dir = ledger.resolve(&dir_id).unwrap();
        assert!(dir.is_dir);
        let file = ledger.resolve(&file_id).unwrap();
        assert!(!file.is_dir);
        assert_eq!(file.file_name, "cat.jpg");
        assert_eq!(file.downloads, 0);
    }

    #[test]
    fn rapid_creates_never_share_an_id() {
        let root = TempDir::new().unwrap();
        let ledger = ledger(&root);

        let ids: Vec<String> = (0..500).map(|_| ledger.create("a.txt").unwrap()).collect();
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert_eq!(ledger.store().len(), 500);
    }

    #[test]
    fn colliding_tokens_are_redrawn() {
        let root = TempDir::new().unwrap();
        let draws = Mutex::new(vec!["bbbbbb", "aaaaaa", "aaaaaa", "aaaaaa"]);
        let ledger = ledger(&root).with_token_source(move || {
            draws.lock().unwrap().pop().unwrap_or("cccccc").to_string()
        });

        let first = ledger.create("a.txt").unwrap();
        let second = ledger.create("b.txt").unwrap();

        assert_eq!(first, "aaaaaa");
        assert_eq!(second, "bbbbbb");
    }

    #[test]
    fn exhausted_token_space_signals_retry() {
        let root = TempDir::new().unwrap();
        let ledger = ledger(&root).with_token_source(|| "ffffff".to_string());

        ledger.create("a.txt").unwrap();
        let err = ledger.create("b.txt").unwrap_err();

        assert!(matches!(err, ShelfError::IdExhausted(MAX_TOKEN_ATTEMPTS)));
        assert_eq!(ledger.store().len(), 1);
    }

    #[test]
    fn cancel_reports_whether_anything_was_removed() {
        let root = TempDir::new().unwrap();
        let ledger = ledger(&root);
        let id = ledger.create("a.txt").unwrap();

        assert!(ledger.cancel(&id).unwrap());
        assert!(!ledger.cancel(&id).unwrap());
        assert!(ledger.resolve(&id).is_none());
    }

    #[test]
    fn downloads_only_move_on_register() {
        let root = TempDir::new().unwrap();
        let ledger = ledger(&root);
        let id = ledger.create("a.txt").unwrap();

        for _ in 0..3 {
            ledger.resolve(&id);
        }
        assert_eq!(ledger.resolve(&id).unwrap().downloads, 0);

        assert_eq!(ledger.register_download(&id).unwrap(), 1);
        ledger.resolve(&id);
        assert_eq!(ledger.register_download(&id).unwrap(), 2);
        assert_eq!(ledger.resolve(&id).unwrap().downloads, 2);
    }

    #[test]
    fn register_download_on_unknown_share() {
        let root = TempDir::new().unwrap();
        let ledger = ledger(&root);
        assert!(matches!(
            ledger.register_download("nope"),
            Err(ShelfError::ShareNotFound(_))
        ));
    }

    #[test]
    fn list_derives_liveness() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("here.txt"), b"x").unwrap();
        let ledger = ledger(&root);

        let here = ledger.create("here.txt").unwrap();
        let gone = ledger.create("gone.txt").unwrap();

        let entries = ledger.list();
        let status = |id: &str| entries.iter().find(|e| e.id == id).unwrap().status;
        assert_eq!(status(&here), ShareStatus::Normal);
        assert_eq!(status(&gone), ShareStatus::Lost);

        fs::remove_file(root.path().join("here.txt")).unwrap();
        let entries = ledger.list();
        assert!(entries.iter().all(|e| e.status == ShareStatus::Lost));
        assert_eq!(entries.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_lost() {
        let root = TempDir::new().unwrap();
        std::os::unix::fs::symlink(root.path().join("target.txt"), root.path().join("link.txt")).unwrap();
        let ledger = ledger(&root);

        let id = ledger.create("link.txt").unwrap();
        let record = ledger.resolve(&id).unwrap();
        assert_eq!(ledger.status_of(&record), ShareStatus::Lost);

        fs::write(root.path().join("target.txt"), b"x").unwrap();
        assert_eq!(ledger.status_of(&record), ShareStatus::Normal);
    }
}

//! # API Facade
//!
//! [`ShelfApi`] is the single entry point for callers (the CLI, or a web
//! layer). It owns the storage layout, both ledgers and the archive engine,
//! and dispatches to the [`commands`] for the actual work.
//!
//! ## Role and Responsibilities
//!
//! - Build every component once, in [`ShelfApi::open`]. There are no global
//!   singletons; the caller holds the handle (behind an `Arc` if shared).
//! - Confine caller paths to the storage root before anything else sees them.
//! - Return structured data, never formatted text.
//!
//! ## Generic Over Backends
//!
//! `ShelfApi<T, S>` is generic over the trash and share record backends:
//! production uses [`JsonFileBackend`] for both, tests can plug in
//! [`MemBackend`](crate::store::MemBackend) through [`ShelfApi::from_parts`].

use crate::archive::{ArchiveEngine, JobId, JobStatus};
use crate::commands::{self, BatchOutcome};
use crate::commands::files::{Category, FileEntry, Transfer};
use crate::commands::share::{Download, ShareTarget};
use crate::config::ShelfConfig;
use crate::error::{Result, ShelfError};
use crate::ledger::{ShareLedger, TrashLedger};
use crate::model::{ShareEntry, ShareRecord, TrashEntry, TrashRecord};
use crate::paths::StorageLayout;
use crate::size::{self, DiskUsage};
use crate::store::{JsonFileBackend, RecordBackend};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

pub struct ShelfApi<T = JsonFileBackend, S = JsonFileBackend> {
    layout: StorageLayout,
    trash: TrashLedger<T>,
    shares: ShareLedger<S>,
    engine: ArchiveEngine,
}

impl ShelfApi {
    /// Create missing directories, load both ledgers and start the archive
    /// workers.
    pub fn open(config: &ShelfConfig) -> Result<Self> {
        let layout = config.layout();
        layout.ensure()?;

        let trash = TrashLedger::open(
            JsonFileBackend::new(layout.trash_metadata()),
            layout.root.clone(),
        );
        let shares = ShareLedger::open(
            JsonFileBackend::new(layout.share_metadata()),
            layout.root.clone(),
        );
        let engine = ArchiveEngine::start(config.archive.clone(), layout.root.clone())?;

        tracing::debug!(
            root = %layout.root.display(),
            trash = trash.store().len(),
            shares = shares.store().len(),
            "Opened shelf"
        );
        Ok(Self::from_parts(layout, trash, shares, engine))
    }
}

impl<T, S> ShelfApi<T, S>
where
    T: RecordBackend<TrashRecord>,
    S: RecordBackend<ShareRecord>,
{
    pub fn from_parts(
        layout: StorageLayout,
        trash: TrashLedger<T>,
        shares: ShareLedger<S>,
        engine: ArchiveEngine,
    ) -> Self {
        Self {
            layout,
            trash,
            shares,
            engine,
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    // --- files ---

    pub fn list_dir(&self, rel: &str) -> Result<Vec<FileEntry>> {
        commands::files::list_dir(&self.layout, rel)
    }

    pub fn list_category(&self, category: Category) -> Vec<FileEntry> {
        commands::files::list_category(&self.layout, category)
    }

    pub fn mkdir(&self, parent: &str, name: &str) -> Result<String> {
        commands::files::mkdir(&self.layout, parent, name)
    }

    pub fn rename(&self, rel: &str, new_name: &str) -> Result<String> {
        commands::files::rename(&self.layout, rel, new_name)
    }

    pub fn transfer<P: AsRef<str>>(&self, mode: Transfer, paths: &[P], dest: &str) -> Result<BatchOutcome> {
        commands::files::transfer(&self.layout, mode, paths, dest)
    }

    /// Import `content` as `dest_dir/name`.
    pub fn put_file<R: Read + ?Sized>(&self, dest_dir: &str, name: &str, content: &mut R) -> Result<String> {
        commands::files::put(&self.layout, dest_dir, name, content)
    }

    pub fn read_file<W: Write + ?Sized>(&self, rel: &str, out: &mut W) -> Result<u64> {
        commands::files::read(&self.layout, rel, out)
    }

    // --- trash ---

    pub fn soft_delete<P: AsRef<str>>(&self, paths: &[P]) -> BatchOutcome {
        commands::trash::soft_delete(&self.layout, &self.trash, paths)
    }

    pub fn trash_list(&self) -> Vec<TrashEntry> {
        self.trash.list()
    }

    pub fn restore<I: AsRef<str>>(&self, ids: &[I]) -> BatchOutcome {
        commands::trash::restore(&self.layout, &self.trash, ids)
    }

    pub fn purge<I: AsRef<str>>(&self, ids: &[I]) -> BatchOutcome {
        commands::trash::purge(&self.layout, &self.trash, ids)
    }

    pub fn empty_trash(&self) -> BatchOutcome {
        commands::trash::empty(&self.layout, &self.trash)
    }

    pub fn trash(&self) -> &TrashLedger<T> {
        &self.trash
    }

    // --- shares ---

    pub fn create_shares<P: AsRef<str>>(&self, paths: &[P]) -> BatchOutcome {
        commands::share::create_links(&self.layout, &self.shares, paths)
    }

    pub fn share_list(&self) -> Vec<ShareEntry> {
        self.shares.list()
    }

    pub fn cancel_share(&self, id: &str) -> Result<bool> {
        self.shares.cancel(id)
    }

    pub fn resolve_share(&self, id: &str) -> Option<ShareRecord> {
        self.shares.resolve(id)
    }

    pub fn open_share(&self, id: &str) -> ShareTarget {
        commands::share::open(&self.layout, &self.shares, id)
    }

    pub fn download_share<W: Write + ?Sized>(&self, id: &str, out: &mut W) -> Result<Download> {
        commands::share::download(&self.layout, &self.shares, id, out)
    }

    pub fn shares(&self) -> &ShareLedger<S> {
        &self.shares
    }

    // --- archives ---

    /// Queue an archive of the given root-relative paths.
    ///
    /// Every path is confined before submission, so one bad path (or the
    /// root itself) rejects the whole request. Paths that merely do not
    /// exist are left to the worker, which skips them.
    pub fn submit_archive<P: AsRef<str>>(&self, paths: &[P]) -> Result<JobId> {
        let resolved = paths
            .iter()
            .map(|p| {
                let (abs, clean) = self.layout.locate(p.as_ref())?;
                if clean.is_empty() {
                    return Err(ShelfError::InvalidPath(
                        "cannot archive the storage root itself".to_string(),
                    ));
                }
                Ok(abs)
            })
            .collect::<Result<Vec<PathBuf>>>()?;
        self.engine.submit(resolved)
    }

    pub fn job_status(&self, id: &JobId) -> Result<JobStatus> {
        self.engine.status(id)
    }

    pub fn wait_job(&self, id: &JobId, timeout: Duration) -> Result<JobStatus> {
        self.engine.wait(id, timeout)
    }

    // --- misc ---

    pub fn usage(&self) -> DiskUsage {
        size::usage(&self.layout.root)
    }

    /// Stop the archive engine after queued jobs finish.
    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

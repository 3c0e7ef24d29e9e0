use super::BatchOutcome;
use crate::error::{Result, ShelfError};
use crate::fsops;
use crate::ledger::ShareLedger;
use crate::model::ShareRecord;
use crate::paths::StorageLayout;
use crate::store::RecordBackend;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

/// What a share id currently points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareTarget {
    /// A downloadable file.
    File { record: ShareRecord, path: PathBuf },
    /// A shared directory. It has a landing page but no download.
    Directory { record: ShareRecord },
    /// The record exists but its target was removed or moved away.
    Missing { record: ShareRecord },
    Unknown,
}

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    pub file_name: String,
    pub bytes: u64,
    /// Download count after this transfer.
    pub downloads: u64,
}

/// Share each existing path. `items` holds the new share ids, in order.
pub fn create_links<B, S>(layout: &StorageLayout, ledger: &ShareLedger<B>, paths: &[S]) -> BatchOutcome
where
    B: RecordBackend<ShareRecord>,
    S: AsRef<str>,
{
    let mut outcome = BatchOutcome::new();
    for rel in paths {
        let rel = rel.as_ref();
        let created = layout.locate(rel).and_then(|(abs, clean)| {
            if fsops::exists(&abs) {
                ledger.create(&clean)
            } else {
                Err(ShelfError::NotFound(clean))
            }
        });
        match created {
            Ok(id) => outcome.ok(id),
            Err(e) => outcome.fail(rel, e),
        }
    }
    outcome
}

/// Classify a share without counting anything.
pub fn open<B: RecordBackend<ShareRecord>>(
    layout: &StorageLayout,
    ledger: &ShareLedger<B>,
    id: &str,
) -> ShareTarget {
    let Some(record) = ledger.resolve(id) else {
        return ShareTarget::Unknown;
    };

    let path = match layout.resolve(&record.file_path) {
        Ok(path) if fsops::reachable(&path) => path,
        Ok(_) => return ShareTarget::Missing { record },
        Err(e) => {
            tracing::warn!(share_id = %id, error = %e, "Share record points outside the storage root");
            return ShareTarget::Missing { record };
        }
    };

    if record.is_dir || path.is_dir() {
        ShareTarget::Directory { record }
    } else {
        ShareTarget::File { record, path }
    }
}

/// Stream a shared file into `out`, then count one download.
///
/// Nothing is counted when the transfer fails part way.
pub fn download<B, W>(
    layout: &StorageLayout,
    ledger: &ShareLedger<B>,
    id: &str,
    out: &mut W,
) -> Result<Download>
where
    B: RecordBackend<ShareRecord>,
    W: Write + ?Sized,
{
    let (record, path) = match open(layout, ledger, id) {
        ShareTarget::File { record, path } => (record, path),
        ShareTarget::Directory { record } => {
            return Err(ShelfError::ShareIsDirectory(record.file_name));
        }
        ShareTarget::Missing { record } => {
            return Err(ShelfError::ShareTargetMissing(record.file_path));
        }
        ShareTarget::Unknown => return Err(ShelfError::ShareNotFound(id.to_string())),
    };

    let mut file = File::open(&path).map_err(ShelfError::Io)?;
    let bytes = io::copy(&mut file, out).map_err(ShelfError::Io)?;
    out.flush().map_err(ShelfError::Io)?;

    let downloads = ledger.register_download(id)?;
    tracing::info!(share_id = %id, bytes, downloads, "Served share download");
    Ok(Download {
        file_name: record.file_name,
        bytes,
        downloads,
    })
}

//! Trash workflows: the ledger plus the physical moves.
//!
//! A soft delete records first and moves second. When the move fails the
//! record is removed again, so a record never points at an item that is
//! still in place.

use super::BatchOutcome;
use crate::error::{Result, ShelfError};
use crate::fsops;
use crate::ledger::TrashLedger;
use crate::model::TrashRecord;
use crate::paths::{StorageLayout, base_name};
use crate::store::RecordBackend;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Move each path into the trash. `items` holds the new trash ids.
pub fn soft_delete<B, S>(layout: &StorageLayout, ledger: &TrashLedger<B>, paths: &[S]) -> BatchOutcome
where
    B: RecordBackend<TrashRecord>,
    S: AsRef<str>,
{
    let mut outcome = BatchOutcome::new();
    for rel in paths {
        let rel = rel.as_ref();
        match trash_one(layout, ledger, rel) {
            Ok(id) => outcome.ok(id),
            Err(e) => outcome.fail(rel, e),
        }
    }
    outcome
}

fn trash_one<B: RecordBackend<TrashRecord>>(
    layout: &StorageLayout,
    ledger: &TrashLedger<B>,
    rel: &str,
) -> Result<String> {
    let (source, clean) = layout.locate(rel)?;
    if clean.is_empty() {
        return Err(ShelfError::InvalidPath("cannot trash the storage root".to_string()));
    }
    if !fsops::exists(&source) {
        return Err(ShelfError::NotFound(clean));
    }

    let id = ledger.add(&base_name(&clean), &clean, source.is_dir())?;
    let moved = layout
        .trash_item(&id)
        .and_then(|target| fsops::move_path(&source, &target));

    if let Err(move_err) = moved {
        if let Err(rollback_err) = ledger.remove(&id) {
            tracing::error!(
                trash_id = %id,
                error = %rollback_err,
                "Could not roll back trash record after failed move"
            );
            return Err(ShelfError::Store(format!(
                "{} (and the trash record {} could not be rolled back: {})",
                move_err, id, rollback_err
            )));
        }
        return Err(move_err);
    }
    Ok(id)
}

/// Put trashed items back. `items` holds the restored relative paths.
///
/// Items go back to their original path, or to the storage root under their
/// original name when the original parent is gone. An existing item at the
/// destination is never overwritten.
pub fn restore<B, S>(layout: &StorageLayout, ledger: &TrashLedger<B>, ids: &[S]) -> BatchOutcome
where
    B: RecordBackend<TrashRecord>,
    S: AsRef<str>,
{
    let mut outcome = BatchOutcome::new();
    for id in ids {
        let id = id.as_ref();
        match restore_one(layout, ledger, id) {
            Ok(rel) => outcome.ok(rel),
            Err(e) => outcome.fail(id, e),
        }
    }
    outcome
}

fn restore_one<B: RecordBackend<TrashRecord>>(
    layout: &StorageLayout,
    ledger: &TrashLedger<B>,
    id: &str,
) -> Result<String> {
    let record = ledger
        .get(id)
        .ok_or_else(|| ShelfError::TrashItemNotFound(id.to_string()))?;

    let (target, rel) = restore_target(layout, &record)?;
    if fsops::exists(&target) {
        return Err(ShelfError::AlreadyExists(rel));
    }

    let source = layout.trash_item(id)?;
    fsops::move_path(&source, &target)?;
    ledger.remove(id)?;
    tracing::info!(trash_id = %id, path = %rel, "Restored item");
    Ok(rel)
}

fn restore_target(layout: &StorageLayout, record: &TrashRecord) -> Result<(PathBuf, String)> {
    let (target, rel) = layout.locate(&record.original_path)?;
    let parent_exists = target.parent().is_some_and(|p| p.is_dir());
    if parent_exists && !rel.is_empty() {
        return Ok((target, rel));
    }
    tracing::debug!(
        original = %record.original_path,
        "Original parent is gone, restoring to storage root"
    );
    layout.locate(&record.original_name)
}

/// Permanently delete trashed items. `items` holds the purged ids.
///
/// An item already missing from the trash area counts as purged.
pub fn purge<B, S>(layout: &StorageLayout, ledger: &TrashLedger<B>, ids: &[S]) -> BatchOutcome
where
    B: RecordBackend<TrashRecord>,
    S: AsRef<str>,
{
    let mut outcome = BatchOutcome::new();
    for id in ids {
        let id = id.as_ref();
        let result = if ledger.get(id).is_none() {
            Err(ShelfError::TrashItemNotFound(id.to_string()))
        } else {
            remove_physical(layout, id).and_then(|()| ledger.remove(id).map(|_| ()))
        };
        match result {
            Ok(()) => outcome.ok(id),
            Err(e) => outcome.fail(id, e),
        }
    }
    outcome
}

/// Drop every record, removing the physical items as well as possible.
///
/// Records are always dropped; items that could not be removed are
/// reported in `errors` and left behind in the trash directory.
pub fn empty<B: RecordBackend<TrashRecord>>(layout: &StorageLayout, ledger: &TrashLedger<B>) -> BatchOutcome {
    let mut outcome = BatchOutcome::new();
    for id in ledger.ids() {
        if let Err(e) = remove_physical(layout, &id) {
            outcome.fail(&id, e);
        }
        match ledger.remove(&id) {
            Ok(_) => outcome.ok(id),
            Err(e) => outcome.fail(&id, e),
        }
    }
    tracing::info!(removed = outcome.success, "Emptied trash");
    outcome
}

fn remove_physical(layout: &StorageLayout, id: &str) -> Result<()> {
    let path = layout.trash_item(id)?;
    match fsops::remove_path(&path) {
        Ok(()) => Ok(()),
        Err(ShelfError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(trash_id = %id, "Trashed item already gone");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

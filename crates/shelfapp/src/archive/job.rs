//! The work done for a single archive job, independent of the queue.

use super::ArchiveSettings;
use super::plan::{self, PlannedEntry};
use super::progress::{ProgressThrottle, percent};
use super::status::{JobId, JobStatus};
use super::writer::ArchiveSink;
use crate::error::{Result, ShelfError};
use chrono::Utc;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Directory and file name the archive for this request will be written to.
///
/// A configured `output_dir` wins. Otherwise the archive lands next to the
/// first requested path, falling back to `fallback_dir` when there is no
/// usable first path. A parent outside `fallback_dir` is never used.
pub fn output_location(
    id: &JobId,
    paths: &[PathBuf],
    settings: &ArchiveSettings,
    fallback_dir: &Path,
) -> (PathBuf, String) {
    let dir = settings
        .output_dir
        .clone()
        .or_else(|| {
            paths
                .first()
                .and_then(|p| p.parent())
                .filter(|p| p.starts_with(fallback_dir) && p.is_dir())
                .map(Path::to_path_buf)
        })
        .unwrap_or_else(|| fallback_dir.to_path_buf());

    let filename = format!(
        "archive_{}_{}.{}",
        Utc::now().timestamp(),
        id.short(),
        settings.format.extension()
    );
    (dir, filename)
}

/// Run one job to completion and return its terminal status.
///
/// Intermediate `PROGRESS` snapshots go to `report` in increasing order.
/// Errors never escape: they become a `FAILURE` and the partial archive is
/// removed.
pub fn run(
    id: &JobId,
    paths: &[PathBuf],
    settings: &ArchiveSettings,
    fallback_dir: &Path,
    report: &mut dyn FnMut(JobStatus),
) -> JobStatus {
    let (dir, filename) = output_location(id, paths, settings, fallback_dir);
    let target = dir.join(&filename);

    match build(&target, paths, settings, report) {
        Ok((total, written)) => {
            tracing::info!(
                job_id = %id,
                archive = %target.display(),
                total_files = total,
                written,
                "Archive finished"
            );
            JobStatus::Success {
                current: total,
                total,
                percent: percent(total, total),
                result: target,
                filename,
                total_files: total,
            }
        }
        Err(e) => {
            tracing::error!(job_id = %id, error = %e, "Archive failed");
            discard_partial(&target);
            JobStatus::Failure {
                error: e.to_string(),
            }
        }
    }
}

/// Returns `(total, written)`; entries that vanished are counted in
/// `total` but not in `written`.
fn build(
    target: &Path,
    paths: &[PathBuf],
    settings: &ArchiveSettings,
    report: &mut dyn FnMut(JobStatus),
) -> Result<(u64, u64)> {
    let entries = plan::expand(paths);
    let total = entries.len() as u64;
    let throttle = ProgressThrottle::new(settings.progress_every, total);

    report(JobStatus::Progress {
        current: 0,
        total,
        percent: 0,
        status: "Starting".to_string(),
    });

    let mut sink = ArchiveSink::create(target, settings.format)?;
    let mut written = 0;

    for (index, entry) in entries.iter().enumerate() {
        if append_entry(&mut sink, entry)? {
            written += 1;
        }

        let current = index as u64 + 1;
        if throttle.should_emit(current) {
            report(JobStatus::Progress {
                current,
                total,
                percent: percent(current, total),
                status: format!("Compressing {}", entry.entry_name),
            });
        }
    }

    sink.finish()?;
    Ok((total, written))
}

/// `Ok(false)` when the source disappeared after planning.
fn append_entry(sink: &mut ArchiveSink, entry: &PlannedEntry) -> Result<bool> {
    let mut file = match File::open(&entry.source) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(source = %entry.source.display(), "Source vanished, skipping");
            return Ok(false);
        }
        Err(e) => return Err(ShelfError::Io(e)),
    };
    sink.append_file(&entry.entry_name, &mut file)?;
    Ok(true)
}

fn discard_partial(target: &Path) {
    match fs::remove_file(target) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(archive = %target.display(), error = %e, "Could not remove partial archive");
        }
    }
}

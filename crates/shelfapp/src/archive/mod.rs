//! # Archive Job Engine
//!
//! Turns a list of source paths into one compressed archive in the
//! background, reporting progress that callers poll by job id.
//!
//! ## Job Lifecycle
//!
//! ```text
//! submit ──► PENDING ──► PROGRESS* ──► SUCCESS
//!                                  └─► FAILURE
//! ```
//!
//! - Submission only enqueues and returns the id; it never waits on the work.
//! - Only the worker running a job writes its status, in increasing
//!   processed-count order. The [`board::JobBoard`] also rejects any update
//!   that would move progress backwards or touch a finished job.
//! - Jobs cannot be cancelled. Finished jobs stay queryable until the board's
//!   retention evicts them.
//!
//! ## Worker Algorithm
//!
//! 1. [`plan::expand`] the request into `(source, entry name)` pairs. A file
//!    is stored under its base name. A directory contributes every file below
//!    it, named relative to the directory's parent (`d/x.txt`).
//! 2. Write each entry into the container ([`writer::ArchiveSink`]). Sources
//!    that vanished since planning are skipped, but still counted as
//!    processed so progress reaches 100%.
//! 3. Publish progress every `progress_every` files and on the last one.
//!
//! ## Modules
//!
//! - [`engine`]: queue, worker threads, submit/status/shutdown
//! - [`job`]: the worker algorithm for one job
//! - [`board`]: job status backend
//! - [`status`]: `JobId` and the `JobStatus` state machine
//! - [`plan`], [`writer`], [`progress`]: expansion, container codecs, throttling

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod board;
pub mod engine;
pub mod job;
pub mod plan;
pub mod progress;
pub mod status;
pub mod writer;

pub use board::{JobBoard, MemoryJobBoard};
pub use engine::ArchiveEngine;
pub use status::{JobId, JobStatus};
pub use writer::ArchiveFormat;

const DEFAULT_WORKERS: usize = 2;
const DEFAULT_PROGRESS_EVERY: u64 = 5;
const DEFAULT_RETAIN_FINISHED: usize = 256;

/// Tuning for the archive engine, stored under `archive` in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSettings {
    /// Number of worker threads draining the queue.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Publish progress every N processed files (and always on the last).
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,

    #[serde(default)]
    pub format: ArchiveFormat,

    /// Fixed directory for produced archives. When unset, archives go next to
    /// the first requested path.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Finished jobs kept queryable before the oldest are evicted.
    #[serde(default = "default_retain_finished")]
    pub retain_finished: usize,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_progress_every() -> u64 {
    DEFAULT_PROGRESS_EVERY
}

fn default_retain_finished() -> usize {
    DEFAULT_RETAIN_FINISHED
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            progress_every: DEFAULT_PROGRESS_EVERY,
            format: ArchiveFormat::default(),
            output_dir: None,
            retain_finished: DEFAULT_RETAIN_FINISHED,
        }
    }
}

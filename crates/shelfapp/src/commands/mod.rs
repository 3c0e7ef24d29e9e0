//! # Command Layer
//!
//! The workflows a caller triggers: browsing and moving files, trashing and
//! restoring them, handing out share links. Each one combines the
//! [`StorageLayout`](crate::paths::StorageLayout), the ledgers and the
//! filesystem primitives in [`crate::fsops`].
//!
//! Commands never print. They return data and let the caller render it.
//!
//! ## Batches
//!
//! Operations over several items return a [`BatchOutcome`]. A failure on one
//! item is recorded and the batch carries on; only problems with the request
//! as a whole (a missing destination, an invalid path) are returned as `Err`.
//!
//! ## Command Modules
//!
//! - [`files`]: listing, categories, mkdir, rename, move/copy
//! - [`trash`]: soft delete, restore, purge, empty
//! - [`share`]: link creation, open and download

use serde::Serialize;
use std::fmt::Display;

pub mod files;
pub mod share;
pub mod trash;

/// Per-item result of a batch operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Number of items that went through.
    pub success: usize,
    /// What each successful item produced: a trash id, a share id, a new path.
    pub items: Vec<String>,
    /// One message per failed item (or failed cleanup).
    pub errors: Vec<String>,
}

impl BatchOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(&mut self, item: impl Into<String>) {
        self.success += 1;
        self.items.push(item.into());
    }

    pub fn fail(&mut self, item: &str, error: impl Display) {
        tracing::warn!(item = %item, error = %error, "Batch item failed");
        self.errors.push(format!("{}: {}", item, error));
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

//! Durable ledgers built on the [record store](crate::store).
//!
//! - [`trash::TrashLedger`]: soft-deleted items and where they came from.
//! - [`share::ShareLedger`]: public share grants and their download counters.
//!
//! Ledgers only track records. Moving, copying or removing the physical
//! items is done by the callers in [`commands`](crate::commands).

use uuid::Uuid;

pub mod share;
pub mod trash;

pub use share::ShareLedger;
pub use trash::TrashLedger;

/// Six lowercase hex characters of fresh randomness.
pub(crate) fn short_hex() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}

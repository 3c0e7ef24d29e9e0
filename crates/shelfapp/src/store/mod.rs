//! # Record Store
//!
//! Generic durable `id -> record` mapping, the persistence unit under both
//! ledgers. Each store is one JSON object file keyed by opaque string ids.
//!
//! ## Layers
//!
//! - [`backend::RecordBackend`]: the raw I/O contract, `load` and `save` of a
//!   whole mapping.
//!   - [`fs_backend::JsonFileBackend`]: production, one pretty-printed JSON file.
//!   - [`mem_backend::MemBackend`]: for tests, with write error simulation.
//! - [`record_store::RecordStore`]: caches the mapping and serializes every
//!   mutation behind a mutex, so one writer at a time touches the file.
//!
//! ## Guarantees
//!
//! - **Load never fails.** A missing file is an empty store. A corrupt or
//!   unreadable file is logged and treated as empty, never partially loaded.
//! - **Save is durable and atomic.** Content goes to a temporary sibling,
//!   is flushed and fsynced, then renamed over the target.
//! - **Memory follows disk.** A mutation is committed in memory only after
//!   its save returned `Ok`.
//!
//! ## Storage Layout
//!
//! ```text
//! trash/
//! ├── metadata.json                  # TrashRecord store
//! └── 1718000000_a1b2c3_report.pdf   # trashed items, named by id
//! shares/
//! └── metadata.json                  # ShareRecord store
//! ```

use std::collections::BTreeMap;

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod record_store;

/// In-memory form of a store file. Ordered so saved files diff cleanly.
pub type Mapping<R> = BTreeMap<String, R>;

pub use backend::RecordBackend;
pub use fs_backend::JsonFileBackend;
pub use mem_backend::MemBackend;
pub use record_store::RecordStore;

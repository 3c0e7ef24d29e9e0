//! # Shelf Architecture
//!
//! Shelf is the core of a self-hosted file manager: everything that happens
//! to files under one storage root, minus the web layer. Callers (the `shelf`
//! CLI, an HTTP server) own routing, authentication and rendering; this crate
//! owns the file lifecycle.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Caller (the shelf CLI, a web layer)                        │
//! │  - Parses requests, renders output, maps errors to exits    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API (api.rs)                                               │
//! │  - Owns layout, ledgers and the archive engine              │
//! │  - Confines caller paths to the storage root                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Commands (commands/*.rs)           Archive engine (archive/)│
//! │  - Trash, share and file workflows  - Job queue and workers  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Ledgers (ledger/) on the record store (store/)             │
//! │  - One JSON file per ledger, rewritten atomically           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Durability
//!
//! Each ledger is one JSON object file keyed by id. Every mutation rewrites
//! the whole file through a synced temp file and a rename, so readers see
//! either the old or the new mapping. A file that cannot be parsed is treated
//! as empty and logged.
//!
//! ## Concurrency
//!
//! Ledger calls run on the caller's thread; each store serializes its own
//! writers. Archive jobs run on the engine's worker threads and publish
//! progress to a job board that callers poll by id.
//!
//! ## Module Overview
//!
//! - [`api`]: the caller-facing facade
//! - [`commands`]: file, trash and share workflows
//! - [`ledger`]: trash and share ledgers
//! - [`store`]: generic durable record store
//! - [`archive`]: background archive jobs
//! - [`config`]: `config.json` and environment overrides
//! - [`paths`], [`fsops`], [`size`], [`model`], [`error`]: shared plumbing

pub mod api;
pub mod archive;
pub mod commands;
pub mod config;
pub mod error;
pub mod fsops;
pub mod ledger;
pub mod model;
pub mod paths;
pub mod size;
pub mod store;

#[cfg(test)]
pub(crate) mod test_utils;

pub use api::ShelfApi;
pub use config::ShelfConfig;
pub use error::{Result, ShelfError};

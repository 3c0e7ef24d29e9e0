//! # CLI Layer
//!
//! One possible caller of `shelfapp`, standing in for a web front end. This
//! is the only place that knows about stdout, stderr and exit codes.
//!
//! ## Structure
//!
//! - [`setup`]: clap definitions
//! - [`commands`]: `run()`, config resolution and per-command handlers
//! - [`render`]: turning results into terminal text
//! - [`logging`]: `tracing` subscriber setup

mod commands;
mod logging;
mod render;
mod setup;

pub use commands::{Outcome, run};

//! # Shelf CLI
//!
//! The binary is intentionally thin: the CLI lives in `src/cli/`, this file
//! only invokes `cli::run()` and maps the outcome to an exit code.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/shelf/src/cli/)                          │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Config loading + dispatch (commands.rs)                  │
//! │  - Terminal rendering (render.rs), log setup (logging.rs)   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  shelfapp::ShelfApi and everything below it                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exit codes: `0` on success, `1` on an error, `2` when a batch command
//! finished but some of its items failed.

mod cli;

fn main() {
    match cli::run() {
        Ok(cli::Outcome::Done) => {}
        Ok(cli::Outcome::Partial) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

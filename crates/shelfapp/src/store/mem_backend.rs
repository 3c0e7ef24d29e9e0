use super::Mapping;
use super::backend::RecordBackend;
use crate::error::{Result, ShelfError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory record backend for testing.
///
/// Clones share the same underlying "file", so a test can keep a handle
/// while a ledger owns another and inspect what was persisted.
pub struct MemBackend<R> {
    records: Arc<Mutex<Mapping<R>>>,
    simulate_write_error: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl<R> Clone for MemBackend<R> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            simulate_write_error: Arc::clone(&self.simulate_write_error),
            saves: Arc::clone(&self.saves),
        }
    }
}

impl<R> Default for MemBackend<R> {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(Mapping::new())),
            simulate_write_error: Arc::new(AtomicBool::new(false)),
            saves: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl<R> MemBackend<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl<R> RecordBackend<R> for MemBackend<R>
where
    R: Clone + Send,
{
    fn load(&self) -> Mapping<R> {
        self.records.lock().clone()
    }

    fn save(&self, records: &Mapping<R>) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(ShelfError::Store("Simulated write error".to_string()));
        }
        *self.records.lock() = records.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

use super::Mapping;
use super::backend::RecordBackend;
use crate::error::Result;
use parking_lot::Mutex;

/// Cached, write-serialized view over a [`RecordBackend`].
///
/// All reads and writes go through one mutex. Mutations run on a copy of
/// the mapping; the copy is saved and only then swapped in, so a failed
/// save leaves both memory and disk at the previous state.
pub struct RecordStore<R, B> {
    backend: B,
    records: Mutex<Mapping<R>>,
}

impl<R, B> RecordStore<R, B>
where
    R: Clone + PartialEq,
    B: RecordBackend<R>,
{
    pub fn open(backend: B) -> Self {
        let records = backend.load();
        Self {
            backend,
            records: Mutex::new(records),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run `f` against the current mapping.
    pub fn read<T>(&self, f: impl FnOnce(&Mapping<R>) -> T) -> T {
        let records = self.records.lock();
        f(&records)
    }

    pub fn get(&self, id: &str) -> Option<R> {
        self.read(|records| records.get(id).cloned())
    }

    pub fn snapshot(&self) -> Mapping<R> {
        self.read(|records| records.clone())
    }

    pub fn len(&self) -> usize {
        self.read(|records| records.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mutate the mapping and persist it if anything changed.
    ///
    /// The store stays locked for the whole load-modify-save cycle.
    pub fn update<T>(&self, f: impl FnOnce(&mut Mapping<R>) -> T) -> Result<T> {
        let mut records = self.records.lock();
        let mut next = records.clone();
        let out = f(&mut next);

        if next != *records {
            self.backend.save(&next)?;
            *records = next;
        }
        Ok(out)
    }

    /// Drop the cache and re-read the backend.
    pub fn reload(&self) {
        let fresh = self.backend.load();
        *self.records.lock() = fresh;
    }
}

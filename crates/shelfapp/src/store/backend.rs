use super::Mapping;
use crate::error::Result;

/// Abstract interface for raw record persistence.
/// This trait handles the "how" of storage (file vs memory),
/// while `RecordStore` handles caching and write serialization.
pub trait RecordBackend<R>: Send + Sync {
    /// Load the whole mapping.
    ///
    /// Never fails: a missing store is empty, and an unreadable or corrupt
    /// store is logged and treated as empty.
    fn load(&self) -> Mapping<R>;

    /// Replace the persisted mapping.
    /// MUST be durable once it returns `Ok` (flushed and synced).
    fn save(&self, records: &Mapping<R>) -> Result<()>;
}

//! Object Catalog
//!
//! The namespace of object records. Iteration is always in ascending
//! byte-wise key order, which both listing protocols depend on.

mod memory;
mod record;
mod snapshot;

pub use memory::MemoryCatalog;
pub use record::{ObjectMeta, ObjectRecord};
pub use snapshot::CatalogSnapshot;

use crate::error::Result;

/// Key-ordered store of object records.
///
/// Implementations must allow concurrent readers, serialize writers, and
/// hand out snapshots that later writes cannot change.
pub trait Catalog: Send + Sync {
    /// Insert or replace the record at `record.key()`, returning the previous one
    fn put(&self, record: ObjectRecord) -> Result<Option<ObjectRecord>>;

    /// Remove a record. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Option<ObjectRecord>;

    /// Take an immutable point-in-time view for one listing pass
    fn snapshot(&self) -> CatalogSnapshot;

    /// Point lookup
    fn get(&self, key: &str) -> Option<ObjectRecord>;

    /// Check whether a key exists
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of records
    fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Check if empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist pending state, if the implementation has a backing store
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// The demo namespace served when `storage.seed_demo_objects` is enabled
pub fn demo_records() -> Result<Vec<ObjectRecord>> {
    [
        ("logs/app.log", 1024),
        ("logs/error.log", 512),
        ("data/config.json", 256),
        ("images/logo.png", 4096),
    ]
    .into_iter()
    .map(|(key, size)| ObjectRecord::sized(key, size))
    .collect()
}

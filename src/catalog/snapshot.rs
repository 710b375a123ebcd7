//! Point-in-time catalog views

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use super::ObjectRecord;
use crate::error::Result;

/// Immutable, key-ordered view of the catalog.
///
/// Cloning is cheap: the map is shared, and writers to the owning catalog
/// copy it before mutating, so a snapshot never changes once taken.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    entries: Arc<BTreeMap<String, ObjectRecord>>,
}

impl CatalogSnapshot {
    pub(crate) fn new(entries: Arc<BTreeMap<String, ObjectRecord>>) -> Self {
        Self { entries }
    }

    /// Build a standalone snapshot from records. Later duplicates win.
    pub fn from_records(records: impl IntoIterator<Item = ObjectRecord>) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for record in records {
            record.validate()?;
            entries.insert(record.key().to_string(), record);
        }
        Ok(Self::new(Arc::new(entries)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ObjectRecord> {
        self.entries.get(key)
    }

    /// Iterate all records in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = &ObjectRecord> {
        self.entries.values()
    }

    /// Iterate records whose key starts with `prefix` and sorts strictly
    /// after `after`, in ascending key order.
    pub fn scan<'a>(
        &'a self,
        prefix: &str,
        after: Option<&str>,
    ) -> impl Iterator<Item = &'a ObjectRecord> + 'a {
        let lower = match after {
            Some(after) if after >= prefix => Bound::Excluded(after),
            _ => Bound::Included(prefix),
        };
        let range = self.entries.range::<str, _>((lower, Bound::Unbounded));

        // The iterator outlives the caller's borrow of `prefix`
        let prefix = prefix.to_owned();
        range
            .take_while(move |(key, _)| key.starts_with(prefix.as_str()))
            .map(|(_, record)| record)
    }
}

//! In-memory catalog with optional on-disk index

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Catalog, CatalogSnapshot, ObjectRecord};
use crate::error::{Error, Result};

const INDEX_VERSION: u32 = 1;
const INDEX_FILENAME: &str = "catalog.json";

type Entries = Arc<BTreeMap<String, ObjectRecord>>;

/// On-disk index layout
#[derive(Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    records: Vec<ObjectRecord>,
}

/// Sorted-map catalog guarded by a read-write lock.
///
/// Writers copy the map when a snapshot still references it, so snapshots
/// are isolated from later `put`/`remove` calls.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    entries: RwLock<Entries>,
    index_dir: Option<PathBuf>,
}

impl MemoryCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the given records
    pub fn with_records(records: impl IntoIterator<Item = ObjectRecord>) -> Result<Self> {
        let catalog = Self::new();
        for record in records {
            catalog.put(record)?;
        }
        Ok(catalog)
    }

    /// Load the catalog index from `index_dir`, or start empty.
    ///
    /// The returned catalog is bound to `index_dir`: [`Catalog::flush`]
    /// writes back there.
    pub fn load_or_create(index_dir: &Path) -> Result<Self> {
        let index_path = index_dir.join(INDEX_FILENAME);
        let mut entries = BTreeMap::new();

        if index_path.exists() {
            info!("Loading catalog index from {:?}", index_path);
            let file = File::open(&index_path)?;
            let index: IndexFile = serde_json::from_reader(BufReader::new(file))?;

            if index.version != INDEX_VERSION {
                warn!(
                    "Catalog index version {} does not match {}, starting empty",
                    index.version, INDEX_VERSION
                );
            } else {
                for record in index.records {
                    match record.validate() {
                        Ok(()) => {
                            entries.insert(record.key().to_string(), record);
                        }
                        Err(e) => warn!("Skipping invalid catalog record: {}", e),
                    }
                }
                info!("Loaded {} catalog records", entries.len());
            }
        } else {
            info!("No existing catalog index, creating new");
        }

        Ok(Self {
            entries: RwLock::new(Arc::new(entries)),
            index_dir: Some(index_dir.to_path_buf()),
        })
    }

    /// Save the catalog index to `index_dir`
    pub fn save(&self, index_dir: &Path) -> Result<()> {
        fs::create_dir_all(index_dir)?;

        let snapshot = self.snapshot();
        let index = IndexFile {
            version: INDEX_VERSION,
            records: snapshot.iter().cloned().collect(),
        };

        // Write beside the target and rename so readers never see a torn file
        let index_path = index_dir.join(INDEX_FILENAME);
        let tmp_path = index_dir.join(format!("{}.tmp", INDEX_FILENAME));
        {
            let file = File::create(&tmp_path)?;
            serde_json::to_writer_pretty(BufWriter::new(file), &index)?;
        }
        fs::rename(&tmp_path, &index_path)?;

        debug!("Saved catalog index with {} records", index.records.len());
        Ok(())
    }

    /// Directory this catalog flushes to, if any
    pub fn index_dir(&self) -> Option<&Path> {
        self.index_dir.as_deref()
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Catalog for MemoryCatalog {
    fn put(&self, record: ObjectRecord) -> Result<Option<ObjectRecord>> {
        if record.key().is_empty() {
            return Err(Error::InvalidRecord("object key must not be empty".into()));
        }
        record.validate()?;

        let mut entries = self.write();
        Ok(Arc::make_mut(&mut entries).insert(record.key().to_string(), record))
    }

    fn remove(&self, key: &str) -> Option<ObjectRecord> {
        let mut entries = self.write();
        if !entries.contains_key(key) {
            return None;
        }
        Arc::make_mut(&mut entries).remove(key)
    }

    fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot::new(Arc::clone(&self.read()))
    }

    fn get(&self, key: &str) -> Option<ObjectRecord> {
        self.read().get(key).cloned()
    }

    fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    fn len(&self) -> usize {
        self.read().len()
    }

    fn flush(&self) -> Result<()> {
        match &self.index_dir {
            Some(dir) => self.save(dir),
            None => Ok(()),
        }
    }
}

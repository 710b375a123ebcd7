//! Filesystem blob storage
//!
//! Object bytes live under the blob directory at a path derived from the
//! SHA-256 of the object key, so keys containing `/` or `..` never map
//! outside of it. Metadata lives in the catalog, not here.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::debug;

use crate::error::{Error, Result};

/// Whole-object blob store on the local filesystem
#[derive(Debug)]
pub struct BlobStore {
    /// Base directory for blobs
    base_dir: PathBuf,

    /// Suffix counter for temporary upload files
    next_tmp: AtomicU64,
}

impl BlobStore {
    /// Create a blob store rooted at `base_dir`
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&base_dir)?;

        Ok(Self {
            base_dir,
            next_tmp: AtomicU64::new(0),
        })
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path for a blob by its key
    fn blob_path(&self, key: &str) -> PathBuf {
        let hex = hex::encode(Sha256::digest(key.as_bytes()));
        // First 2 characters as subdirectory to keep directories small
        self.base_dir.join(&hex[0..2]).join(&hex[2..])
    }

    /// Store the full content of `key`, replacing any previous content.
    ///
    /// Readers see either the old or the new content, never a partial file.
    pub async fn write(&self, key: &str, data: &[u8]) -> Result<u64> {
        if key.is_empty() {
            return Err(Error::InvalidRecord("object key must not be empty".into()));
        }

        let path = self.blob_path(key);
        let parent = path
            .parent()
            .ok_or_else(|| Error::Internal(format!("blob path {:?} has no parent", path)))?;
        fs::create_dir_all(parent).await?;

        let tmp_path = path.with_extension(format!(
            "tmp-{}",
            self.next_tmp.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(e) = fs::write(&tmp_path, data).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        fs::rename(&tmp_path, &path).await?;

        debug!("Stored blob {:?} ({} bytes)", key, data.len());
        Ok(data.len() as u64)
    }

    /// Read the full content of `key`; `None` if nothing is stored
    pub async fn read(&self, key: &str) -> Result<Option<Bytes>> {
        match fs::read(self.blob_path(key)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether content is stored for `key`
    pub async fn exists(&self, key: &str) -> bool {
        fs::metadata(self.blob_path(key)).await.is_ok()
    }

    /// Delete the content of `key`. Returns `true` if it existed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        match fs::remove_file(self.blob_path(key)).await {
            Ok(()) => {
                debug!("Deleted blob {:?}", key);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

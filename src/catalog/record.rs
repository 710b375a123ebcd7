//! Object records stored in the catalog

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Optional metadata attached to an object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Size in bytes, absent until content is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Content digest (base64 MD5 on the OCI wire)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,

    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last modification time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,

    /// Opaque version tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// One entry in the object namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    key: String,

    #[serde(flatten)]
    meta: ObjectMeta,
}

impl ObjectRecord {
    /// Create a validated record.
    ///
    /// Fails with [`Error::InvalidRecord`] when the key is empty or when
    /// `modified_at` precedes `created_at`.
    pub fn new(key: impl Into<String>, meta: ObjectMeta) -> Result<Self> {
        let record = Self {
            key: key.into(),
            meta,
        };
        record.validate()?;
        Ok(record)
    }

    /// Create a record that only knows its size
    pub fn sized(key: impl Into<String>, size: u64) -> Result<Self> {
        Self::new(
            key,
            ObjectMeta {
                size: Some(size),
                ..Default::default()
            },
        )
    }

    /// Check the record invariants
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::InvalidRecord("object key must not be empty".into()));
        }

        if let (Some(created), Some(modified)) = (self.meta.created_at, self.meta.modified_at) {
            if modified < created {
                return Err(Error::InvalidRecord(format!(
                    "object {:?} modified at {} before it was created at {}",
                    self.key, modified, created
                )));
            }
        }

        Ok(())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    pub fn size(&self) -> Option<u64> {
        self.meta.size
    }

    pub fn content_hash(&self) -> Option<&str> {
        self.meta.content_hash.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.meta.created_at
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.meta.modified_at
    }

    pub fn etag(&self) -> Option<&str> {
        self.meta.etag.as_deref()
    }
}

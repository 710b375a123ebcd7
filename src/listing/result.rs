//! Listing results

use crate::catalog::ObjectRecord;

/// Result of a simple (OCI-style) listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleListing {
    objects: Vec<ObjectRecord>,
    prefixes: Option<Vec<String>>,
    next_start_with: Option<String>,
}

impl SimpleListing {
    pub(crate) fn new(
        objects: Vec<ObjectRecord>,
        prefixes: Option<Vec<String>>,
        next_start_with: Option<String>,
    ) -> Self {
        Self {
            objects,
            prefixes,
            next_start_with,
        }
    }

    pub fn objects(&self) -> &[ObjectRecord] {
        &self.objects
    }

    /// Common prefixes, present only when a delimiter was requested
    pub fn prefixes(&self) -> Option<&[String]> {
        self.prefixes.as_deref()
    }

    /// Cursor to pass as `startAfter` for the next page
    pub fn next_start_with(&self) -> Option<&str> {
        self.next_start_with.as_deref()
    }

    pub fn is_truncated(&self) -> bool {
        self.next_start_with.is_some()
    }
}

/// Result of a grouped (S3 ListObjectsV2) listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketListing {
    pub(crate) name: String,
    pub(crate) prefix: String,
    pub(crate) delimiter: Option<String>,
    pub(crate) max_keys: usize,
    pub(crate) is_truncated: bool,
    pub(crate) continuation_token: Option<String>,
    pub(crate) next_continuation_token: Option<String>,
    pub(crate) start_after: Option<String>,
    pub(crate) contents: Vec<ObjectRecord>,
    pub(crate) common_prefixes: Vec<String>,
}

impl BucketListing {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn delimiter(&self) -> Option<&str> {
        self.delimiter.as_deref()
    }

    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    pub fn is_truncated(&self) -> bool {
        self.is_truncated
    }

    /// Direct contents plus distinct common prefixes on this page
    pub fn key_count(&self) -> usize {
        self.contents.len() + self.common_prefixes.len()
    }

    pub fn continuation_token(&self) -> Option<&str> {
        self.continuation_token.as_deref()
    }

    pub fn next_continuation_token(&self) -> Option<&str> {
        self.next_continuation_token.as_deref()
    }

    pub fn start_after(&self) -> Option<&str> {
        self.start_after.as_deref()
    }

    pub fn contents(&self) -> &[ObjectRecord] {
        &self.contents
    }

    pub fn common_prefixes(&self) -> &[String] {
        &self.common_prefixes
    }
}

//! Blobstore - Object Storage Listing Service
//!
//! A small object store whose core is a listing engine over a key-ordered
//! catalog. The same catalog is exposed through two listing protocols:
//!
//! - a simple JSON list (`GET /o`) with prefix, delimiter and
//!   `limit`/`startAfter` paging
//! - S3 ListObjectsV2 (`GET /{bucket}?list-type=2`) with delimiter grouping
//!   and continuation tokens
//!
//! # Architecture
//!
//! Listings are computed from an immutable [`catalog::CatalogSnapshot`], so
//! a page never observes a concurrent write half way through. Object bytes
//! live in a filesystem [`store::BlobStore`]; the catalog holds metadata and
//! is persisted as a JSON index.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod listing;
pub mod store;

pub use config::BlobStoreConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{Catalog, CatalogSnapshot, MemoryCatalog, ObjectMeta, ObjectRecord};
    pub use crate::config::BlobStoreConfig;
    pub use crate::error::{Error, Result};
    pub use crate::listing::{BucketListing, ListingEngine, ListingQuery, SimpleListing};
    pub use crate::store::BlobStore;
}

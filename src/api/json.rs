//! JSON wire types for the simple listing API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ObjectRecord;
use crate::error::Error;
use crate::listing::SimpleListing;

/// One object in a simple listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl From<&ObjectRecord> for ObjectSummary {
    fn from(record: &ObjectRecord) -> Self {
        Self {
            name: record.key().to_string(),
            size: record.size(),
            md5: record.content_hash().map(str::to_string),
            time_created: record.created_at(),
            time_modified: record.modified_at(),
            etag: record.etag().map(str::to_string),
        }
    }
}

/// Body of `GET /o`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListObjectsResponse {
    pub objects: Vec<ObjectSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefixes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_start_with: Option<String>,
}

impl From<&SimpleListing> for ListObjectsResponse {
    fn from(listing: &SimpleListing) -> Self {
        Self {
            objects: listing.objects().iter().map(ObjectSummary::from).collect(),
            prefixes: listing.prefixes().map(<[String]>::to_vec),
            next_start_with: listing.next_start_with().map(str::to_string),
        }
    }
}

/// Error body of the JSON endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&Error> for ErrorResponse {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.message(),
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub objects: usize,
}

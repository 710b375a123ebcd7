//! HTTP API Module
//!
//! Serves the simple JSON listing, the S3 ListObjectsV2 XML listing and
//! whole-object content endpoints.

mod http;
pub mod json;
pub mod xml;

pub use http::{AppState, HttpServer};
pub use json::{ErrorResponse, HealthResponse, ListObjectsResponse, ObjectSummary};

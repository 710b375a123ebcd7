//! HTTP API Server
//!
//! Listing endpoints over the catalog plus whole-object upload and download.

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use super::json::{ErrorResponse, HealthResponse, ListObjectsResponse};
use super::xml;
use crate::catalog::{Catalog, ObjectMeta, ObjectRecord};
use crate::config::{BlobStoreConfig, ServerConfig};
use crate::error::{Error, Result};
use crate::listing::{GroupedListParams, ListingEngine, SimpleListParams};
use crate::store::BlobStore;

const XML_CONTENT_TYPE: &str = "application/xml";
const OCTET_STREAM: &str = "application/octet-stream";

/// Shared application state
pub struct AppState {
    /// Listing engine, which also owns the catalog handle
    pub engine: ListingEngine,
    /// Object content
    pub blobs: Arc<BlobStore>,
    /// Held across the blob write, catalog update and flush of one
    /// mutation so the catalog always describes the stored bytes
    mutation_lock: Mutex<()>,
}

impl AppState {
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        self.engine.catalog()
    }

    /// Persist the catalog after a mutation. Callers hold `mutation_lock`.
    async fn flush_catalog(&self) {
        let catalog = Arc::clone(self.catalog());
        match tokio::task::spawn_blocking(move || catalog.flush()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Failed to persist catalog: {}", e),
            Err(e) => error!("Catalog flush task failed: {}", e),
        }
    }
}

/// HTTP API server
pub struct HttpServer {
    config: ServerConfig,
    body_limit: usize,
    state: Arc<AppState>,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: &BlobStoreConfig, engine: ListingEngine, blobs: Arc<BlobStore>) -> Self {
        let state = Arc::new(AppState {
            engine,
            blobs,
            mutation_lock: Mutex::new(()),
        });

        Self {
            config: config.server.clone(),
            body_limit: config.max_body_bytes(),
            state,
        }
    }

    /// Get the state for sharing with other components
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Build the router with all layers applied
    pub fn router(&self) -> Router {
        let mut router = Self::create_router(Arc::clone(&self.state))
            .layer(DefaultBodyLimit::max(self.body_limit))
            .layer(TraceLayer::new_for_http());

        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        router
    }

    /// Create the router
    fn create_router(state: Arc<AppState>) -> Router {
        Router::new()
            // Status
            .route("/", get(handle_root))
            .route("/health", get(handle_health))
            // Simple list
            .route("/o", get(handle_simple_list))
            // Object content
            .route(
                "/objects/*key",
                get(handle_get_object)
                    .head(handle_head_object)
                    .put(handle_put_object)
                    .delete(handle_delete_object),
            )
            // ListObjectsV2
            .route("/:bucket", get(handle_list_bucket))
            .with_state(state)
    }

    /// Start the HTTP server and run until `shutdown` resolves
    pub async fn start<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(&self.config.bind_address).await?;
        info!("HTTP API listening on {}", self.config.bind_address);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::Network(format!("HTTP server error: {}", e)))?;

        Ok(())
    }
}

// ============ Error Responses ============

fn log_rejection(err: &Error) {
    if err.is_client_error() {
        debug!("Rejected request: {}", err);
    } else {
        error!("Request failed: {}", err);
    }
}

fn json_error(err: &Error) -> Response {
    log_rejection(err);
    (err.status_code(), Json(ErrorResponse::from(err))).into_response()
}

fn xml_error(err: &Error) -> Response {
    log_rejection(err);
    (
        err.status_code(),
        [(header::CONTENT_TYPE, XML_CONTENT_TYPE)],
        xml::error_document(err.code(), &err.message()),
    )
        .into_response()
}

// ============ Handlers ============

async fn handle_root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Hello from blobstore" }))
}

async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        objects: state.catalog().len(),
    })
}

async fn handle_simple_list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SimpleListParams>,
) -> Response {
    match state.engine.list_simple(&params) {
        Ok(listing) => Json(ListObjectsResponse::from(&listing)).into_response(),
        Err(e) => json_error(&e),
    }
}

async fn handle_list_bucket(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
    Query(params): Query<GroupedListParams>,
) -> Response {
    match state.engine.list_grouped(&bucket, &params) {
        Ok(listing) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, XML_CONTENT_TYPE)],
            xml::list_bucket_result(&listing),
        )
            .into_response(),
        Err(e) => xml_error(&e),
    }
}

async fn handle_put_object(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    body: Bytes,
) -> Response {
    let _guard = state.mutation_lock.lock().await;
    let previous = state.catalog().get(&key);

    let size = match state.blobs.write(&key, &body).await {
        Ok(size) => size,
        Err(e) => return json_error(&e),
    };

    let now = Utc::now();
    let created_at = previous
        .and_then(|p| p.created_at())
        .filter(|created| *created <= now)
        .unwrap_or(now);
    let etag = version_tag(size, &now);

    let meta = ObjectMeta {
        size: Some(size),
        content_hash: None,
        created_at: Some(created_at),
        modified_at: Some(now),
        etag: Some(etag.clone()),
    };
    let stored = ObjectRecord::new(key.clone(), meta).and_then(|r| state.catalog().put(r));
    if let Err(e) = stored {
        return json_error(&e);
    }
    state.flush_catalog().await;

    info!("Stored object {:?} ({} bytes)", key, size);
    let mut headers = HeaderMap::new();
    insert_header(&mut headers, header::ETAG, &format!("\"{}\"", etag));
    (StatusCode::OK, headers).into_response()
}

async fn handle_get_object(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> Response {
    let Some(record) = state.catalog().get(&key) else {
        return json_error(&Error::NoSuchKey(key));
    };

    match state.blobs.read(&key).await {
        Ok(Some(data)) => {
            let headers = object_headers(&record, data.len() as u64);
            (StatusCode::OK, headers, data).into_response()
        }
        Ok(None) => json_error(&Error::NoSuchKey(key)),
        Err(e) => json_error(&e),
    }
}

async fn handle_head_object(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Response {
    let Some(record) = state.catalog().get(&key) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !state.blobs.exists(&key).await {
        return StatusCode::NOT_FOUND.into_response();
    }

    let headers = object_headers(&record, record.size().unwrap_or(0));
    (StatusCode::OK, headers).into_response()
}

async fn handle_delete_object(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Response {
    let _guard = state.mutation_lock.lock().await;
    if let Err(e) = state.blobs.delete(&key).await {
        return json_error(&e);
    }

    if state.catalog().remove(&key).is_some() {
        state.flush_catalog().await;
        info!("Deleted object {:?}", key);
    }

    StatusCode::NO_CONTENT.into_response()
}

// ============ Helpers ============

/// Opaque version tag that changes whenever the object is rewritten
fn version_tag(size: u64, modified: &DateTime<Utc>) -> String {
    format!(
        "{:x}-{:x}",
        size,
        modified.timestamp_nanos_opt().unwrap_or_else(|| modified.timestamp_millis())
    )
}

/// RFC 7231 date, as used by `Last-Modified`
fn http_date(time: &DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn insert_header(headers: &mut HeaderMap, name: header::HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(e) => debug!("Skipping header {}: {}", name, e),
    }
}

fn object_headers(record: &ObjectRecord, content_length: u64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(content_length));
    if let Some(etag) = record.etag() {
        insert_header(&mut headers, header::ETAG, &format!("\"{}\"", etag));
    }
    if let Some(modified) = record.modified_at() {
        insert_header(&mut headers, header::LAST_MODIFIED, &http_date(&modified));
    }
    headers
}

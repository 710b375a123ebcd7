//! Blobstore Configuration
//!
//! Configuration structures for the blobstore server, loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main blobstore configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlobStoreConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Blob and catalog storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Listing limits
    #[serde(default)]
    pub listing: ListingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Enable CORS
    #[serde(default)]
    pub cors_enabled: bool,

    /// Maximum accepted request body in megabytes
    #[serde(default = "default_max_body_mb")]
    pub max_body_mb: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory for blobs and the catalog index
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Insert the demo records into an empty catalog at startup
    #[serde(default)]
    pub seed_demo_objects: bool,

    /// Write the catalog index to disk after every mutation
    #[serde(default = "default_true")]
    pub persist_catalog: bool,
}

/// Listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// max-keys used when the request does not carry one
    #[serde(default = "default_max_keys")]
    pub default_max_keys: usize,

    /// Upper bound applied to requested max-keys
    #[serde(default = "default_max_keys")]
    pub max_keys_limit: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_body_mb() -> usize {
    512
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/var/lib/blobstore")
}

fn default_true() -> bool {
    true
}

fn default_max_keys() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: false,
            max_body_mb: default_max_body_mb(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            seed_demo_objects: false,
            persist_catalog: true,
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_max_keys: default_max_keys(),
            max_keys_limit: default_max_keys(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl BlobStoreConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: BlobStoreConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.server.bind_address.is_empty() {
            return Err(crate::Error::Config("server.bind_address cannot be empty".into()));
        }

        if self.listing.max_keys_limit == 0 {
            return Err(crate::Error::Config("listing.max_keys_limit must be positive".into()));
        }

        if self.listing.default_max_keys > self.listing.max_keys_limit {
            return Err(crate::Error::Config(
                "listing.default_max_keys cannot exceed listing.max_keys_limit".into(),
            ));
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            other => {
                return Err(crate::Error::Config(format!(
                    "logging.format must be \"pretty\" or \"compact\", got {:?}",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &PathBuf {
        &self.storage.data_dir
    }

    /// Get the blob directory path
    pub fn blob_dir(&self) -> PathBuf {
        self.storage.data_dir.join("blobs")
    }

    /// Get the catalog index directory path
    pub fn index_dir(&self) -> PathBuf {
        self.storage.data_dir.join("index")
    }

    /// Maximum request body in bytes
    pub fn max_body_bytes(&self) -> usize {
        self.server.max_body_mb.saturating_mul(1024 * 1024)
    }
}

//! Blobstore - Object Storage Listing Service
//!
//! Serves a key-ordered object catalog over a simple JSON listing API and
//! S3 ListObjectsV2.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blobstore::api::HttpServer;
use blobstore::catalog::{demo_records, Catalog, MemoryCatalog};
use blobstore::config::{BlobStoreConfig, LoggingConfig};
use blobstore::error::Result;
use blobstore::listing::{ListingEngine, ListingLimits};
use blobstore::store::BlobStore;

/// Blobstore - Object Storage Listing Service
#[derive(Parser)]
#[command(name = "blobstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "blobstore.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Start,

    /// Initialize a new configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "blobstore.toml")]
        output: PathBuf,

        /// Data directory to write into the configuration
        #[arg(long, default_value = "/var/lib/blobstore")]
        data_dir: PathBuf,
    },

    /// Validate configuration file
    Validate,

    /// Show configuration summary
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The logging section is read before the command runs; a missing or
    // broken file falls back to defaults and is reported by the command.
    let logging = BlobStoreConfig::from_file(&cli.config)
        .map(|c| c.logging)
        .unwrap_or_default();
    init_logging(cli.log_level.as_deref().unwrap_or(&logging.level), &logging);

    match cli.command {
        Commands::Start => run_start(cli.config).await,
        Commands::Init { output, data_dir } => run_init(output, data_dir),
        Commands::Validate => run_validate(cli.config),
        Commands::Info => run_info(cli.config),
    }
}

/// Initialize logging
fn init_logging(level: &str, logging: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.format == "compact" {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Start the server
async fn run_start(config_path: PathBuf) -> Result<()> {
    tracing::info!("Starting blobstore...");

    // Load configuration
    let config = match BlobStoreConfig::from_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load configuration from {:?}: {}", config_path, e);
            tracing::error!("Please check that the config file exists and is valid TOML");
            return Err(e);
        }
    };

    // Ensure directories exist
    if let Err(e) = std::fs::create_dir_all(config.data_dir()) {
        tracing::error!("Failed to create data directory {:?}: {}", config.data_dir(), e);
        return Err(e.into());
    }

    let catalog = if config.storage.persist_catalog {
        MemoryCatalog::load_or_create(&config.index_dir())?
    } else {
        tracing::info!("Catalog persistence disabled, starting with an in-memory catalog");
        MemoryCatalog::new()
    };

    if config.storage.seed_demo_objects && catalog.is_empty() {
        for record in demo_records()? {
            catalog.put(record)?;
        }
        tracing::info!("Seeded catalog with {} demo objects", catalog.len());
    }

    let catalog: Arc<dyn Catalog> = Arc::new(catalog);
    let engine = ListingEngine::new(Arc::clone(&catalog), ListingLimits::from(&config.listing));
    let blobs = Arc::new(BlobStore::new(config.blob_dir())?);

    tracing::info!(
        "Catalog holds {} objects, blobs in {:?}",
        catalog.len(),
        blobs.base_dir()
    );

    let http_server = HttpServer::new(&config, engine, blobs);
    let result = http_server.start(shutdown_signal()).await;
    if let Err(e) = &result {
        tracing::error!("HTTP server error: {}", e);
    }

    tracing::info!("Flushing catalog...");
    if let Err(e) = catalog.flush() {
        tracing::error!("Failed to persist catalog: {}", e);
        return Err(e);
    }

    tracing::info!("Shutdown complete");
    result
}

/// Resolves on Ctrl+C
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received shutdown signal"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}

/// Generate a new configuration file
fn run_init(output: PathBuf, data_dir: PathBuf) -> Result<()> {
    let data_dir = data_dir.display();
    let config_content = format!(r#"# Blobstore Configuration
# Generated configuration file

[server]
bind_address = "0.0.0.0:8080"
cors_enabled = false
# Largest accepted upload
max_body_mb = 512

[storage]
data_dir = "{data_dir}"
# Insert a few demo objects into an empty catalog on startup
seed_demo_objects = false
persist_catalog = true

[listing]
default_max_keys = 1000
max_keys_limit = 1000

[logging]
level = "info"
format = "pretty"
"#);

    std::fs::write(&output, config_content)?;
    println!("Configuration file created: {}", output.display());
    println!("Then start with: blobstore --config {} start", output.display());

    Ok(())
}

/// Validate configuration
fn run_validate(config_path: PathBuf) -> Result<()> {
    match BlobStoreConfig::from_file(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!("  Bind Address: {}", config.server.bind_address);
            println!("  Data Directory: {}", config.data_dir().display());
            println!(
                "  Max Keys: {} (limit {})",
                config.listing.default_max_keys, config.listing.max_keys_limit
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            Err(e)
        }
    }
}

/// Show configuration summary
fn run_info(config_path: PathBuf) -> Result<()> {
    let config = BlobStoreConfig::from_file(&config_path)?;

    println!("Blobstore Information");
    println!("=====================");
    println!();
    println!("Bind Address:     {}", config.server.bind_address);
    println!("CORS:             {}", config.server.cors_enabled);
    println!("Max Body:         {} MB", config.server.max_body_mb);
    println!();
    println!("Storage:");
    println!("  Data Directory: {}", config.data_dir().display());
    println!("  Blobs:          {}", config.blob_dir().display());
    println!("  Catalog Index:  {}", config.index_dir().display());
    println!("  Persist:        {}", config.storage.persist_catalog);
    println!("  Demo Seed:      {}", config.storage.seed_demo_objects);
    println!();
    println!("Listing:");
    println!("  Default Keys:   {}", config.listing.default_max_keys);
    println!("  Key Limit:      {}", config.listing.max_keys_limit);

    Ok(())
}

//! blobctl - Command line client for a blobstore server
//!
//! Usage:
//!   blobctl health                   - Show server health
//!   blobctl ls --prefix logs/        - Simple list
//!   blobctl list-bucket my-bucket    - ListObjectsV2 (prints XML)
//!   blobctl put <key> <file>         - Upload a file
//!   blobctl get <key> [file]         - Download an object
//!   blobctl rm <key>                 - Delete an object

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{Client, Response, Url};

use blobstore::api::{ErrorResponse, HealthResponse, ListObjectsResponse};
use blobstore::config::BlobStoreConfig;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";

/// Blobstore Control Tool
#[derive(Parser)]
#[command(name = "blobctl")]
#[command(about = "List, upload and download blobstore objects", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "blobstore.toml")]
    config: PathBuf,

    /// API endpoint to connect to (overrides config)
    #[arg(short, long)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show server health
    Health,
    /// List objects with the simple JSON API
    Ls {
        #[arg(short, long)]
        prefix: Option<String>,
        #[arg(short, long)]
        delimiter: Option<String>,
        #[arg(short, long)]
        limit: Option<u64>,
        #[arg(long)]
        start_after: Option<String>,
        /// Follow nextStartWith until the listing is complete
        #[arg(long)]
        all: bool,
    },
    /// List a bucket with ListObjectsV2 and print the XML response
    ListBucket {
        bucket: String,
        #[arg(short, long)]
        prefix: Option<String>,
        #[arg(short, long)]
        delimiter: Option<String>,
        #[arg(short, long)]
        max_keys: Option<u64>,
        #[arg(long)]
        continuation_token: Option<String>,
        #[arg(long)]
        start_after: Option<String>,
    },
    /// Upload a file as an object
    Put { key: String, file: PathBuf },
    /// Download an object to a file, or stdout when no file is given
    Get { key: String, file: Option<PathBuf> },
    /// Delete an object
    Rm { key: String },
}

// ============ Main ============

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let endpoint = cli.endpoint.clone().unwrap_or_else(|| endpoint_from_config(&cli.config));
    let client = Client::new();

    let result = match cli.command {
        Commands::Health => health(&client, &endpoint).await,
        Commands::Ls { prefix, delimiter, limit, start_after, all } => {
            let mut query = Vec::new();
            push_param(&mut query, "prefix", prefix);
            push_param(&mut query, "delimiter", delimiter);
            push_param(&mut query, "limit", limit.map(|l| l.to_string()));
            list_simple(&client, &endpoint, query, start_after, all).await
        }
        Commands::ListBucket { bucket, prefix, delimiter, max_keys, continuation_token, start_after } => {
            let mut query = vec![("list-type", "2".to_string())];
            push_param(&mut query, "prefix", prefix);
            push_param(&mut query, "delimiter", delimiter);
            push_param(&mut query, "max-keys", max_keys.map(|m| m.to_string()));
            push_param(&mut query, "continuation-token", continuation_token);
            push_param(&mut query, "start-after", start_after);
            list_bucket(&client, &endpoint, &bucket, &query).await
        }
        Commands::Put { key, file } => put_object(&client, &endpoint, &key, &file).await,
        Commands::Get { key, file } => get_object(&client, &endpoint, &key, file.as_deref()).await,
        Commands::Rm { key } => delete_object(&client, &endpoint, &key).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Derive a client endpoint from the server's bind address
fn endpoint_from_config(path: &std::path::Path) -> String {
    if !path.exists() {
        return DEFAULT_ENDPOINT.to_string();
    }
    match BlobStoreConfig::from_file(path) {
        Ok(config) => {
            let addr = config.server.bind_address;
            if addr.starts_with("0.0.0.0") {
                format!("http://127.0.0.1:{}", addr.split(':').nth(1).unwrap_or("8080"))
            } else {
                format!("http://{}", addr)
            }
        }
        Err(_) => DEFAULT_ENDPOINT.to_string(),
    }
}

fn push_param(query: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<String>) {
    if let Some(value) = value {
        query.push((name, value));
    }
}

/// URL of `/objects/{key}` with every key segment percent-encoded
fn object_url(endpoint: &str, key: &str) -> Result<Url> {
    let mut url = Url::parse(endpoint).with_context(|| format!("invalid endpoint {}", endpoint))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("endpoint {} cannot carry a path", endpoint))?
        .pop_if_empty()
        .push("objects")
        .extend(key.split('/'));
    Ok(url)
}

/// Turn a non-success response into an error carrying the server's message
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(err) => bail!("{} ({}): {}", status, err.code, err.message),
        Err(_) if body.is_empty() => bail!("API error: {}", status),
        Err(_) => bail!("API error: {}\n{}", status, body),
    }
}

// ============ Commands ============

async fn health(client: &Client, endpoint: &str) -> Result<()> {
    let response = check(client.get(format!("{}/health", endpoint)).send().await?).await?;
    let health: HealthResponse = response.json().await?;

    println!("Status:  {}", health.status);
    println!("Objects: {}", health.objects);
    Ok(())
}

async fn list_simple(
    client: &Client,
    endpoint: &str,
    query: Vec<(&'static str, String)>,
    mut start_after: Option<String>,
    all: bool,
) -> Result<()> {
    loop {
        let mut params = query.clone();
        push_param(&mut params, "startAfter", start_after.take());

        let response = client.get(format!("{}/o", endpoint)).query(&params).send().await?;
        let listing: ListObjectsResponse = check(response).await?.json().await?;

        for prefix in listing.prefixes.iter().flatten() {
            println!("{:>12}  {}", "PRE", prefix);
        }
        for object in &listing.objects {
            let size = object.size.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
            println!("{:>12}  {}", size, object.name);
        }

        match listing.next_start_with {
            Some(next) if all => start_after = Some(next),
            Some(next) => {
                println!();
                println!("More results available, continue with --start-after {:?}", next);
                return Ok(());
            }
            None => return Ok(()),
        }
    }
}

async fn list_bucket(
    client: &Client,
    endpoint: &str,
    bucket: &str,
    query: &[(&'static str, String)],
) -> Result<()> {
    let mut url = Url::parse(endpoint).with_context(|| format!("invalid endpoint {}", endpoint))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("endpoint {} cannot carry a path", endpoint))?
        .pop_if_empty()
        .push(bucket);

    let response = client.get(url).query(query).send().await?;
    let status = response.status();
    let body = response.text().await?;
    println!("{}", body);

    if !status.is_success() {
        bail!("API error: {}", status);
    }
    Ok(())
}

async fn put_object(client: &Client, endpoint: &str, key: &str, file: &std::path::Path) -> Result<()> {
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let size = data.len();

    let response = check(client.put(object_url(endpoint, key)?).body(data).send().await?).await?;
    let etag = response
        .headers()
        .get(reqwest::header::ETAG)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    println!("Uploaded {} ({} bytes, etag {})", key, size, etag);
    Ok(())
}

async fn get_object(
    client: &Client,
    endpoint: &str,
    key: &str,
    file: Option<&std::path::Path>,
) -> Result<()> {
    let response = check(client.get(object_url(endpoint, key)?).send().await?).await?;
    let data = response.bytes().await?;

    match file {
        Some(path) => {
            tokio::fs::write(path, &data)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Downloaded {} ({} bytes) to {}", key, data.len(), path.display());
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&data)?;
        }
    }
    Ok(())
}

async fn delete_object(client: &Client, endpoint: &str, key: &str) -> Result<()> {
    check(client.delete(object_url(endpoint, key)?).send().await?).await?;
    println!("Deleted {}", key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_encodes_segments() {
        let url = object_url("http://127.0.0.1:8080", "logs/a b?.txt").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/objects/logs/a%20b%3F.txt");

        let url = object_url("http://127.0.0.1:8080/", "x").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/objects/x");
    }

    #[test]
    fn test_endpoint_from_missing_config() {
        let endpoint = endpoint_from_config(std::path::Path::new("/nonexistent/blobstore.toml"));
        assert_eq!(endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_endpoint_from_bind_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blobstore.toml");
        std::fs::write(&path, "[server]\nbind_address = \"0.0.0.0:9100\"\n").unwrap();
        assert_eq!(endpoint_from_config(&path), "http://127.0.0.1:9100");

        std::fs::write(&path, "[server]\nbind_address = \"10.0.0.5:8080\"\n").unwrap();
        assert_eq!(endpoint_from_config(&path), "http://10.0.0.5:8080");
    }
}

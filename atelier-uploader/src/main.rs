//! # atelier-upload
//!
//! Uploads a large file to Cloudinary in chunks, using a signature bundle
//! issued by the Atelier API.
//!
//! ## Usage
//!
//! ```bash
//! atelier-upload --api-url https://api.example.com --token $ADMIN_TOKEN \
//!     --folder reels --profile video reel.mp4
//! ```

use anyhow::{Context, Result};
use atelier_shared::{chunking::ChunkProfile, cloudinary::SignatureBundle};
use atelier_uploader::{ChunkedUploader, CloudinarySink, UploadEvent};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "atelier-upload")]
#[command(about = "Chunked media upload through a signed Cloudinary bundle")]
#[command(version)]
struct Args {
    /// File to upload
    file: PathBuf,

    /// Base URL of the Atelier API
    #[arg(long, env = "ATELIER_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// Admin access token
    #[arg(long, env = "ATELIER_TOKEN", hide_env_values = true)]
    token: String,

    /// Cloudinary folder
    #[arg(long, env = "ATELIER_UPLOAD_FOLDER")]
    folder: Option<String>,

    /// Named chunk size: video (100 MiB) or media (10 MiB)
    #[arg(long, default_value = "media")]
    profile: ChunkProfile,

    /// Explicit chunk size in bytes, overrides --profile
    #[arg(long)]
    chunk_size: Option<u64>,

    /// Cloudinary resource type
    #[arg(long, default_value = "auto")]
    resource_type: String,

    /// Per-chunk request timeout in seconds
    #[arg(long, default_value = "600")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier_uploader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let client = reqwest::Client::new();

    let bundle = fetch_bundle(&client, &args.api_url, &args.token, args.folder.as_deref())
        .await
        .context("Failed to obtain an upload signature")?;

    let sink = CloudinarySink::new(client, bundle, &args.resource_type)
        .with_timeout(Duration::from_secs(args.timeout_secs));
    let chunk_size = args.chunk_size.unwrap_or_else(|| args.profile.chunk_size());
    let uploader = ChunkedUploader::new(sink, chunk_size);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let reporter = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match &event {
                UploadEvent::Failed { .. } => tracing::error!("{}", event),
                _ => tracing::info!("{}", event),
            }
        }
    });

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Cancelling after the current chunk");
            on_signal.cancel();
        }
    });

    let result = uploader.upload(&args.file, tx, cancel).await;
    reporter.await.ok();

    let asset = result.with_context(|| format!("Upload of {} failed", args.file.display()))?;
    println!("{}", serde_json::to_string_pretty(&asset)?);

    Ok(())
}

/// Requests a signature bundle from `POST /v1/media/sign`
async fn fetch_bundle(
    client: &reqwest::Client,
    api_url: &str,
    token: &str,
    folder: Option<&str>,
) -> Result<SignatureBundle> {
    let url = format!("{}/v1/media/sign", api_url.trim_end_matches('/'));

    let bundle = client
        .post(&url)
        .bearer_auth(token)
        .json(&serde_json::json!({ "folder": folder }))
        .send()
        .await?
        .error_for_status()?
        .json::<SignatureBundle>()
        .await?;

    tracing::debug!(cloud_name = %bundle.cloud_name, timestamp = bundle.timestamp, "Signature bundle received");
    Ok(bundle)
}

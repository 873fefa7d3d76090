// Entrypoint: sync images to SM.MS, then rewrite markdown image links.
// Any error aborts the run with a non-zero exit code.

use anyhow::Context;
use clap::Parser;
use imgsync::api::SmmsClient;
use imgsync::cache::PathCache;
use imgsync::ui::{self, SpinnerUploader};
use imgsync::{rewrite, scan};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Sync images and replace markdown image links.
#[derive(Parser)]
#[command(name = "imgsync", version)]
struct Cli {
    /// Markdown directory
    #[arg(long)]
    dir: PathBuf,

    /// Images directory
    #[arg(long)]
    pic: PathBuf,

    /// Cache file mapping local image paths to hosted URLs
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// SM.MS API endpoint
    #[arg(long, default_value = "https://sm.ms/api/v2/")]
    endpoint: String,

    /// SM.MS username
    #[arg(long, env = "SMMS_USERNAME")]
    username: Option<String>,

    /// SM.MS password
    #[arg(long, env = "SMMS_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // Credentials may live in a local .env file.
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut cache = PathCache::load(&cli.config)
        .with_context(|| format!("Loading cache {}", cli.config.display()))?;

    let (username, password) = ui::resolve_credentials(cli.username, cli.password)?;
    let spinner = ui::spinner("Authenticating...");
    let client = SmmsClient::connect(&cli.endpoint, &username, &password);
    spinner.finish_and_clear();
    let client = client.context("Connecting to SM.MS")?;
    tracing::info!("Authenticated against {}", cli.endpoint);
    let client = SpinnerUploader::new(client);

    let synced = scan::sync(&cli.pic, &mut cache, &client)
        .with_context(|| format!("Syncing images in {}", cli.pic.display()))?;
    let rewritten = rewrite::rewrite_all(&cli.dir, &cache)
        .with_context(|| format!("Rewriting documents in {}", cli.dir.display()))?;

    tracing::info!(
        uploaded = synced.uploaded,
        cached = synced.skipped,
        documents = rewritten.scanned,
        updated = rewritten.updated,
        "done"
    );
    Ok(())
}

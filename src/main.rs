use anyhow::Context;
use chrono::Local;
use clap::Parser;
use log::{debug, error, info, warn, LevelFilter};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use pulsescraper::platforms::{ClientCredentialsProvider, SpotifyWebApi, YoutubeDataApi};
use pulsescraper::scrapers::HttpScraper;
use pulsescraper::{
    ArtistMetricsCollector, Credentials, DiskSnapshotStore, RunRecord, Settings, SnapshotStore,
};

const API_TIMEOUT: Duration = Duration::from_secs(10);

/// Collect daily popularity metrics for an artist roster.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Settings file with the artist roster.
    #[arg(short, long, default_value = "artists.json")]
    config: PathBuf,

    /// Overrides `output_dir` from the settings file.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::builder()
        .filter_level(cli.log_level)
        .filter_module("selectors", LevelFilter::Warn)
        .filter_module("html5ever", LevelFilter::Error)
        .parse_default_env()
        .init();

    let settings = Settings::load(&cli.config)
        .with_context(|| format!("failed to load settings from {}", cli.config.display()))?;
    let output_dir = cli.output_dir.unwrap_or_else(|| settings.output_dir.clone());
    let credentials = Credentials::from_env();
    debug!("Loaded {:?}", credentials);

    let config = settings.collector.clone();
    let scraper = HttpScraper::with_policy(config.retry_policy(), config.max_in_flight)
        .context("failed to build page client")?;
    let api_client = reqwest::Client::builder()
        .timeout(API_TIMEOUT)
        .build()
        .context("failed to build API client")?;

    let cancel = CancellationToken::new();
    let mut collector =
        ArtistMetricsCollector::new(Box::new(scraper), config).with_cancellation(cancel.clone());

    if let Some((client_id, client_secret)) = credentials.spotify() {
        collector = collector.with_spotify(
            Box::new(SpotifyWebApi::new(api_client.clone())?),
            Box::new(ClientCredentialsProvider::new(
                api_client.clone(),
                client_id.to_string(),
                client_secret.to_string(),
            )?),
        );
    }
    match &credentials.youtube_api_key {
        Some(key) => {
            collector =
                collector.with_youtube(Box::new(YoutubeDataApi::new(api_client, key.clone())?));
        }
        None => warn!("YOUTUBE_API_KEY not set, YouTube statistics disabled"),
    }

    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, saving partial results");
            trigger.cancel();
        }
    });

    let mut record = RunRecord::new(Local::now().date_naive());
    let outcome = collector.run(&settings.artists, &mut record).await;

    let store = DiskSnapshotStore::new(&output_dir);
    let summary = store
        .persist(&record)
        .await
        .with_context(|| format!("failed to save results to {}", output_dir.display()))?;
    info!(
        "Snapshot saved to {} and {}",
        summary.historical.display(),
        summary.latest.display()
    );

    let missing = record.missing_listeners();
    if missing.is_empty() {
        info!("Monthly listeners found for every artist");
    } else {
        warn!(
            "Monthly listeners unavailable for {} artists: {}",
            missing.len(),
            missing.join(", ")
        );
    }

    if let Err(e) = &outcome {
        error!(
            "Run stopped after {}/{} artists: {}",
            record.artists.len(),
            settings.artists.len(),
            e
        );
    }
    outcome.context("collection run did not complete")?;
    Ok(())
}

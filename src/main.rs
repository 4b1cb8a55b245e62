//! Pricewatch Ingest — Entry Point
//!
//! Runs exactly one ingestion batch and exits.
//!
//! Wiring sequence:
//! 1. Load config.toml (path from PRICEWATCH_CONFIG) + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Load vendor credentials from env vars (AWS_ACCESS_KEY_ID,
//!    AWS_SECRET_ACCESS_KEY, AMAZON_ASSOCIATE_TAG)
//! 4. Create RequestSigner + MarketplaceClient (implements Marketplace port)
//! 5. Open the file-backed catalog (implements CatalogRepository port)
//!    and check that it is writable
//! 6. Run one IngestionScheduler batch
//! 7. Export batch metrics to the textfile collector

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use pricewatch_ingest::adapters::api::{
    Credentials, Endpoint, MarketplaceClient, MarketplaceClientConfig, RequestSigner,
};
use pricewatch_ingest::adapters::metrics::IngestMetrics;
use pricewatch_ingest::adapters::persistence::RepositoryImpl;
use pricewatch_ingest::config;
use pricewatch_ingest::ports::repository::CatalogRepository;
use pricewatch_ingest::usecases::ingestion_scheduler::{IngestionScheduler, SchedulerConfig};

/// Environment variable overriding the config file location.
const CONFIG_PATH_ENV: &str = "PRICEWATCH_CONFIG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());
    let config = config::loader::load_config_or_default(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.ingest.log_level)),
        )
        .json()
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path,
        retailer = %config.ingest.retailer,
        batch_size = config.ingest.batch_size,
        "Starting Pricewatch ingestion worker"
    );

    // ── 3. Load vendor credentials (fatal before any request) ─
    let credentials = Credentials::from_env().context("Failed to load vendor credentials from env")?;

    // ── 4. Signed lookup client ─────────────────────────────
    let endpoint = Endpoint {
        scheme: config.api.scheme.clone(),
        host: config.api.host.clone(),
        path: config.api.path.clone(),
    };
    let client_config = MarketplaceClientConfig {
        timeout: Duration::from_secs(config.api.timeout_seconds),
        ..MarketplaceClientConfig::default()
    };
    let marketplace = Arc::new(
        MarketplaceClient::new(RequestSigner::new(credentials, endpoint), &client_config)
            .context("Failed to create marketplace client")?,
    );

    // ── 5. Catalog storage ──────────────────────────────────
    let repo = Arc::new(
        RepositoryImpl::from_data_dir(&config.persistence.data_dir)
            .await
            .context("Failed to open catalog")?,
    );
    anyhow::ensure!(
        repo.is_healthy().await,
        "Catalog storage in {} is not writable",
        config.persistence.data_dir
    );

    // ── 6. Run one batch ────────────────────────────────────
    let scheduler = IngestionScheduler::new(
        marketplace,
        repo,
        SchedulerConfig::from(&config.ingest),
    );
    let report = scheduler.run_batch().await.context("Ingestion batch failed")?;

    // ── 7. Export metrics ───────────────────────────────────
    if config.metrics.enabled {
        let metrics = IngestMetrics::new().context("Failed to create metrics registry")?;
        metrics.observe_report(&report);
        if let Err(e) = metrics.write_textfile(&config.metrics.textfile_path).await {
            warn!(error = %e, "Failed to write metrics textfile");
        }
    }

    info!(
        listings = report.listings.len(),
        skipped = report.skipped(),
        "Worker finished"
    );
    Ok(())
}

//! Prometheus Metrics Registry - Ingestion Observability
//!
//! Counts listing outcomes, price-record actions and deletions, and
//! tracks per-listing round-trip latency. The worker is a batch job, so
//! instead of serving `/metrics` the registry is rendered once per run
//! into a node-exporter textfile-collector file.

use std::path::Path;

use anyhow::Context;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use tokio::fs;
use tracing::{debug, instrument};

use crate::usecases::ingestion_scheduler::{BatchReport, ListingOutcome};

/// Centralized Prometheus metrics for the ingestion worker.
///
/// All metrics follow the naming convention `pricewatch_ingest_*`.
pub struct IngestMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// Listings processed, by outcome (reconciled, deleted, skipped).
    pub listings: IntCounterVec,
    /// Price records written, by action (inserted, refreshed, dropped).
    pub price_records: IntCounterVec,
    /// Listings deleted after an item-not-accessible answer.
    pub listings_deleted: IntCounter,
    /// Listing round-trip latency (seconds, excludes pacing).
    pub listing_duration: Histogram,
    /// Skipped listings, by error kind.
    pub errors: IntCounterVec,
}

impl IngestMetrics {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let listings = IntCounterVec::new(
            Opts::new(
                "pricewatch_ingest_listings_total",
                "Listings processed by outcome",
            ),
            &["outcome"],
        )?;

        let price_records = IntCounterVec::new(
            Opts::new(
                "pricewatch_ingest_price_records_total",
                "Price observations by reconciliation action",
            ),
            &["action"],
        )?;

        let listings_deleted = IntCounter::new(
            "pricewatch_ingest_listings_deleted_total",
            "Listings deleted because the item is no longer accessible",
        )?;

        let listing_duration = Histogram::with_opts(
            HistogramOpts::new(
                "pricewatch_ingest_listing_duration_seconds",
                "Lookup plus reconciliation time per listing",
            )
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 9.0, 30.0]),
        )?;

        let errors = IntCounterVec::new(
            Opts::new(
                "pricewatch_ingest_errors_total",
                "Skipped listings by error kind",
            ),
            &["kind"],
        )?;

        registry.register(Box::new(listings.clone()))?;
        registry.register(Box::new(price_records.clone()))?;
        registry.register(Box::new(listings_deleted.clone()))?;
        registry.register(Box::new(listing_duration.clone()))?;
        registry.register(Box::new(errors.clone()))?;

        Ok(Self {
            registry,
            listings,
            price_records,
            listings_deleted,
            listing_duration,
            errors,
        })
    }

    /// Fold a finished batch into the metrics.
    pub fn observe_report(&self, report: &BatchReport) {
        for entry in &report.listings {
            self.listings
                .with_label_values(&[entry.outcome.label()])
                .inc();
            self.listing_duration.observe(entry.elapsed.as_secs_f64());

            match &entry.outcome {
                ListingOutcome::Reconciled {
                    inserted,
                    refreshed,
                    dropped,
                } => {
                    self.price_records
                        .with_label_values(&["inserted"])
                        .inc_by(*inserted as u64);
                    self.price_records
                        .with_label_values(&["refreshed"])
                        .inc_by(*refreshed as u64);
                    self.price_records
                        .with_label_values(&["dropped"])
                        .inc_by(*dropped as u64);
                }
                ListingOutcome::Deleted { .. } => self.listings_deleted.inc(),
                ListingOutcome::Skipped { kind, .. } => {
                    self.errors.with_label_values(&[*kind]).inc();
                }
            }
        }
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics output is not UTF-8")
    }

    /// Write the rendered metrics atomically (tmp → rename).
    #[instrument(skip(self))]
    pub async fn write_textfile(&self, path: &str) -> anyhow::Result<()> {
        let path = Path::new(path);
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .context("Failed to create metrics directory")?;
        }

        let tmp_path = path.with_extension("prom.tmp");
        fs::write(&tmp_path, self.render()?)
            .await
            .context("Failed to write tmp metrics file")?;
        fs::rename(&tmp_path, path)
            .await
            .context("Failed to rename metrics file")?;

        debug!(path = %path.display(), "Metrics textfile written");
        Ok(())
    }
}

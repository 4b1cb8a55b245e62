//! Ingestion Scheduler - One Paced Batch of Listing Refreshes
//!
//! Selects the listings that are due (first fetch, or last fetched
//! before the staleness window), then walks them strictly in order:
//! lookup → interpret → gap-fill variant → reconcile each condition.
//!
//! Each listing's round trip is timed; when it finishes faster than the
//! minimum spacing the scheduler sleeps the remainder, which keeps the
//! batch under the vendor's request quota. The last listing is not paced.
//!
//! Failures are isolated per listing: a transport, parse, vendor or
//! storage failure skips that listing and the batch continues. A listing
//! is stamped as fetched only after all of its conditions are written,
//! so a skipped listing stays due for the next batch. Only a
//! failure to select the batch, or a fatal configuration error, aborts.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

use crate::config::{IngestConfig, MAX_STALENESS_HOURS};
use crate::domain::error::IngestError;
use crate::domain::interpreter::interpret;
use crate::domain::listing::{Listing, ListingId};
use crate::domain::reconcile::ReconciliationAction;
use crate::domain::variant::VariantUpdate;
use crate::ports::marketplace::Marketplace;
use crate::ports::repository::CatalogRepository;
use crate::usecases::price_reconciler::PriceReconciler;

/// Batch selection and pacing parameters.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
  /// Retailer whose listings are refreshed.
  pub retailer: String,
  /// Maximum listings per batch.
  pub batch_size: usize,
  /// Listings fetched longer ago than this are due.
  pub staleness: chrono::Duration,
  /// Minimum wall-clock time per listing.
  pub min_spacing: Duration,
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self {
      retailer: "amazon".to_string(),
      batch_size: 60,
      staleness: chrono::Duration::hours(3),
      min_spacing: Duration::from_secs(9),
    }
  }
}

impl From<&IngestConfig> for SchedulerConfig {
  fn from(config: &IngestConfig) -> Self {
    Self {
      retailer: config.retailer.clone(),
      batch_size: config.batch_size,
      staleness: chrono::Duration::hours(config.staleness_hours.min(MAX_STALENESS_HOURS) as i64),
      min_spacing: Duration::from_secs(config.min_spacing_secs),
    }
  }
}

/// What happened to one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingOutcome {
  /// Observations were merged into the price history.
  Reconciled {
    inserted: usize,
    refreshed: usize,
    /// Observations dropped as invalid.
    dropped: usize,
  },
  /// The vendor reported the item inaccessible; the listing is gone.
  Deleted { removed_records: usize },
  /// The listing failed and was left for the next batch.
  Skipped { kind: &'static str, reason: String },
}

impl ListingOutcome {
  /// Metric / log label.
  pub const fn label(&self) -> &'static str {
    match self {
      Self::Reconciled { .. } => "reconciled",
      Self::Deleted { .. } => "deleted",
      Self::Skipped { .. } => "skipped",
    }
  }
}

/// Per-listing entry of a batch report.
#[derive(Debug, Clone)]
pub struct ListingReport {
  pub listing_id: ListingId,
  pub identifier: String,
  pub outcome: ListingOutcome,
  /// Round-trip time, excluding the pacing sleep.
  pub elapsed: Duration,
}

/// Summary of one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
  pub listings: Vec<ListingReport>,
  /// Total batch time, including pacing.
  pub elapsed: Duration,
}

impl BatchReport {
  fn count(&self, label: &str) -> usize {
    self
      .listings
      .iter()
      .filter(|l| l.outcome.label() == label)
      .count()
  }

  pub fn reconciled(&self) -> usize {
    self.count("reconciled")
  }

  pub fn deleted(&self) -> usize {
    self.count("deleted")
  }

  pub fn skipped(&self) -> usize {
    self.count("skipped")
  }

  /// New current records written across the batch.
  pub fn records_inserted(&self) -> usize {
    self
      .listings
      .iter()
      .map(|l| match l.outcome {
        ListingOutcome::Reconciled { inserted, .. } => inserted,
        _ => 0,
      })
      .sum()
  }

  /// Current records refreshed in place across the batch.
  pub fn records_refreshed(&self) -> usize {
    self
      .listings
      .iter()
      .map(|l| match l.outcome {
        ListingOutcome::Reconciled { refreshed, .. } => refreshed,
        _ => 0,
      })
      .sum()
  }

  pub fn observations_dropped(&self) -> usize {
    self
      .listings
      .iter()
      .map(|l| match l.outcome {
        ListingOutcome::Reconciled { dropped, .. } => dropped,
        _ => 0,
      })
      .sum()
  }
}

/// Drives one ingestion batch.
pub struct IngestionScheduler<M: Marketplace, R: CatalogRepository> {
  /// Vendor lookup port.
  marketplace: Arc<M>,
  /// Catalog port.
  repo: Arc<R>,
  /// Price history writer.
  reconciler: PriceReconciler<R>,
  config: SchedulerConfig,
}

impl<M: Marketplace, R: CatalogRepository> IngestionScheduler<M, R> {
  /// Create a new scheduler.
  pub fn new(marketplace: Arc<M>, repo: Arc<R>, config: SchedulerConfig) -> Self {
    let reconciler = PriceReconciler::new(Arc::clone(&repo));
    Self {
      marketplace,
      repo,
      reconciler,
      config,
    }
  }

  /// Listings due for a refresh, oldest fetch first.
  pub async fn select_due(&self) -> Result<Vec<Listing>, IngestError> {
    let stale_before = Utc::now() - self.config.staleness;
    let listings = self
      .repo
      .due_listings(&self.config.retailer, stale_before, self.config.batch_size)
      .await?;
    Ok(listings)
  }

  /// Run one batch to completion.
  ///
  /// # Errors
  /// Returns an error only if the batch cannot be selected or a listing
  /// fails with a fatal error. Per-listing failures are reported in the
  /// returned `BatchReport`.
  #[instrument(skip(self), fields(retailer = %self.config.retailer))]
  pub async fn run_batch(&self) -> Result<BatchReport, IngestError> {
    let listings = self.select_due().await?;
    info!(due = listings.len(), "Starting ingestion batch");

    let batch_started = Instant::now();
    let mut report = BatchReport::default();
    let last = listings.len().saturating_sub(1);

    for (index, listing) in listings.iter().enumerate() {
      let started = Instant::now();

      let outcome = match self.process_listing(listing).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
          warn!(
            listing_id = listing.id,
            identifier = %listing.identifier,
            kind = e.kind(),
            error = %e,
            "Listing skipped"
          );
          ListingOutcome::Skipped {
            kind: e.kind(),
            reason: e.to_string(),
          }
        }
      };

      let elapsed = started.elapsed();
      report.listings.push(ListingReport {
        listing_id: listing.id,
        identifier: listing.identifier.clone(),
        outcome,
        elapsed,
      });

      if index < last && elapsed < self.config.min_spacing {
        let pause = self.config.min_spacing - elapsed;
        debug!(pause_ms = pause.as_millis() as u64, "Pacing before next listing");
        sleep(pause).await;
      }
    }

    report.elapsed = batch_started.elapsed();

    info!(
      listings = report.listings.len(),
      reconciled = report.reconciled(),
      deleted = report.deleted(),
      skipped = report.skipped(),
      inserted = report.records_inserted(),
      refreshed = report.records_refreshed(),
      dropped = report.observations_dropped(),
      elapsed_secs = report.elapsed.as_secs_f64(),
      "Ingestion batch complete"
    );

    Ok(report)
  }

  /// Refresh a single listing.
  #[instrument(skip(self, listing), fields(listing_id = listing.id, identifier = %listing.identifier))]
  pub async fn process_listing(&self, listing: &Listing) -> Result<ListingOutcome, IngestError> {
    let response = self.marketplace.lookup(listing).await?;

    let interpretation = match interpret(listing, &response) {
      Ok(interpretation) => interpretation,
      Err(IngestError::NotFound { code, .. }) => {
        let removed_records = self.repo.delete_listing(listing.id).await?;
        info!(code = %code, removed_records, "Item no longer accessible, listing deleted");
        return Ok(ListingOutcome::Deleted { removed_records });
      }
      Err(e) => return Err(e),
    };

    self.enrich_variant(listing, &interpretation.variant).await?;

    let mut inserted = 0;
    let mut refreshed = 0;
    let mut dropped = 0;

    for observation in interpretation.observations {
      match observation {
        Ok(observation) => match self.reconciler.apply(listing, &observation).await? {
          ReconciliationAction::UpdateInPlace(_) => refreshed += 1,
          ReconciliationAction::SupersedeAndInsert(_) => inserted += 1,
        },
        Err(e) => {
          warn!(kind = e.kind(), error = %e, "Observation dropped");
          dropped += 1;
        }
      }
    }

    self.repo.mark_fetched(listing.id, Utc::now()).await?;

    debug!(inserted, refreshed, dropped, "Listing reconciled");
    Ok(ListingOutcome::Reconciled {
      inserted,
      refreshed,
      dropped,
    })
  }

  /// Fill empty variant fields from the lookup.
  async fn enrich_variant(
    &self,
    listing: &Listing,
    update: &VariantUpdate,
  ) -> Result<(), IngestError> {
    let Some(mut variant) = self.repo.variant(listing.variant_id).await? else {
      warn!(variant_id = listing.variant_id, "Variant missing, enrichment skipped");
      return Ok(());
    };

    if variant.fill_gaps(update) {
      self.repo.save_variant(&variant).await?;
      debug!(variant_id = variant.id, "Variant gaps filled");
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(outcome: ListingOutcome) -> ListingReport {
    ListingReport {
      listing_id: 1,
      identifier: "B000TEST01".into(),
      outcome,
      elapsed: Duration::from_millis(10),
    }
  }

  #[test]
  fn test_report_counts() {
    let report = BatchReport {
      listings: vec![
        entry(ListingOutcome::Reconciled {
          inserted: 2,
          refreshed: 1,
          dropped: 0,
        }),
        entry(ListingOutcome::Reconciled {
          inserted: 0,
          refreshed: 3,
          dropped: 1,
        }),
        entry(ListingOutcome::Deleted { removed_records: 4 }),
        entry(ListingOutcome::Skipped {
          kind: "transport",
          reason: "timeout".into(),
        }),
      ],
      elapsed: Duration::from_secs(27),
    };

    assert_eq!(report.reconciled(), 2);
    assert_eq!(report.deleted(), 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.records_inserted(), 2);
    assert_eq!(report.records_refreshed(), 4);
    assert_eq!(report.observations_dropped(), 1);
  }

  #[test]
  fn test_scheduler_config_from_ingest_config() {
    let ingest = IngestConfig::default();
    let config = SchedulerConfig::from(&ingest);
    assert_eq!(config.retailer, "amazon");
    assert_eq!(config.batch_size, 60);
    assert_eq!(config.staleness, chrono::Duration::hours(3));
    assert_eq!(config.min_spacing, Duration::from_secs(9));
  }

  #[test]
  fn test_scheduler_config_clamps_staleness() {
    let ingest = IngestConfig {
      staleness_hours: u64::MAX,
      ..IngestConfig::default()
    };
    let config = SchedulerConfig::from(&ingest);
    assert_eq!(config.staleness, chrono::Duration::hours(24 * 365));
  }
}

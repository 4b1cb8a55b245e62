//! Repository Port - Catalog and Price-History Persistence
//!
//! The only contract between the ingestion pipeline and the catalog.
//! The catalog owns listing and variant creation; the pipeline reads
//! due listings, gap-fills variants, and maintains price history.
//!
//! Implementations must keep at most one current record per
//! (listing, condition) pair, which is why superseding the old current
//! record and inserting the new one is a single operation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::listing::{Condition, Listing, ListingId, VariantId};
use crate::domain::price::PriceRecord;
use crate::domain::variant::Variant;

/// Trait for catalog persistence providers.
#[async_trait]
pub trait CatalogRepository: Send + Sync + 'static {
  /// Listings of a retailer that are on their first fetch or were last
  /// fetched at or before `stale_before`, oldest fetch first.
  async fn due_listings(
    &self,
    retailer: &str,
    stale_before: DateTime<Utc>,
    limit: usize,
  ) -> anyhow::Result<Vec<Listing>>;

  /// Load a listing by id.
  async fn listing(&self, id: ListingId) -> anyhow::Result<Option<Listing>>;

  /// Load a variant by id.
  async fn variant(&self, id: VariantId) -> anyhow::Result<Option<Variant>>;

  /// Persist variant metadata.
  async fn save_variant(&self, variant: &Variant) -> anyhow::Result<()>;

  /// The current record for a (listing, condition) pair.
  async fn current_price(
    &self,
    listing: ListingId,
    condition: Condition,
  ) -> anyhow::Result<Option<PriceRecord>>;

  /// The most recently superseded record for a (listing, condition) pair.
  async fn previous_price(
    &self,
    listing: ListingId,
    condition: Condition,
  ) -> anyhow::Result<Option<PriceRecord>>;

  /// Full history for a (listing, condition) pair, oldest first.
  async fn price_history(
    &self,
    listing: ListingId,
    condition: Condition,
  ) -> anyhow::Result<Vec<PriceRecord>>;

  /// Overwrite an existing record (matched by id) in place.
  async fn update_price(&self, record: &PriceRecord) -> anyhow::Result<()>;

  /// Flip the pair's current record to superseded and insert `record`
  /// as the new current one.
  async fn supersede_and_insert(&self, record: &PriceRecord) -> anyhow::Result<()>;

  /// Clear the first-fetch flag and stamp the fetch time.
  async fn mark_fetched(&self, listing: ListingId, at: DateTime<Utc>) -> anyhow::Result<()>;

  /// Delete a listing and all of its price records.
  ///
  /// Returns the number of price records removed with it.
  async fn delete_listing(&self, listing: ListingId) -> anyhow::Result<usize>;

  /// Check if the repository is healthy (disk space, permissions).
  async fn is_healthy(&self) -> bool;
}

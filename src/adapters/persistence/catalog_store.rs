//! Catalog Store - In-memory Catalog with Snapshot Persistence
//!
//! Holds listings, variants and price records behind a single
//! `RwLock`. Every write holds the lock while it mutates and persists,
//! so writers are serialized and the at-most-one-current invariant can
//! never be observed broken. With no snapshot file attached the store
//! is purely in-memory.

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::warn;

use super::snapshot::{CatalogData, SnapshotFile};
use crate::domain::listing::{Condition, Listing, ListingId, VariantId};
use crate::domain::price::PriceRecord;
use crate::domain::variant::Variant;
use crate::ports::repository::CatalogRepository;

/// Shared catalog store.
pub struct CatalogStore {
    data: RwLock<CatalogData>,
    /// Where writes are persisted; `None` for in-memory stores.
    snapshot: Option<SnapshotFile>,
}

impl CatalogStore {
    /// Empty in-memory store.
    pub fn in_memory() -> Self {
        Self::with_data(CatalogData::default())
    }

    /// In-memory store seeded with data.
    pub fn with_data(data: CatalogData) -> Self {
        Self {
            data: RwLock::new(data),
            snapshot: None,
        }
    }

    /// Open (or create) the snapshot-backed store in a data directory.
    pub async fn open(data_dir: &str) -> Result<Self> {
        let snapshot = SnapshotFile::new(data_dir).await?;
        let data = snapshot.load().await?.unwrap_or_default();
        Ok(Self {
            data: RwLock::new(data),
            snapshot: Some(snapshot),
        })
    }

    /// Add or replace a listing. Catalog management owns this write.
    pub async fn upsert_listing(&self, listing: Listing) -> Result<()> {
        let mut data = self.data.write().await;
        match data.listings.iter_mut().find(|l| l.id == listing.id) {
            Some(existing) => *existing = listing,
            None => data.listings.push(listing),
        }
        self.persist(&data).await
    }

    /// Add or replace a variant. Catalog management owns this write.
    pub async fn upsert_variant(&self, variant: Variant) -> Result<()> {
        let mut data = self.data.write().await;
        match data.variants.iter_mut().find(|v| v.id == variant.id) {
            Some(existing) => *existing = variant,
            None => data.variants.push(variant),
        }
        self.persist(&data).await
    }

    /// Copy of everything currently stored.
    pub async fn snapshot(&self) -> CatalogData {
        self.data.read().await.clone()
    }

    async fn persist(&self, data: &CatalogData) -> Result<()> {
        match &self.snapshot {
            Some(snapshot) => snapshot.save(data).await,
            None => Ok(()),
        }
    }
}

fn pair(
    listing: ListingId,
    condition: Condition,
) -> impl Fn(&&PriceRecord) -> bool {
    move |record| record.listing_id == listing && record.condition == condition
}

#[async_trait]
impl CatalogRepository for CatalogStore {
    async fn due_listings(
        &self,
        retailer: &str,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Listing>> {
        let data = self.data.read().await;
        let mut due: Vec<Listing> = data
            .listings
            .iter()
            .filter(|l| l.retailer == retailer && l.is_due(stale_before))
            .cloned()
            .collect();
        due.sort_by_key(|l| (l.last_fetched_at, l.id));
        due.truncate(limit);
        Ok(due)
    }

    async fn listing(&self, id: ListingId) -> Result<Option<Listing>> {
        let data = self.data.read().await;
        Ok(data.listings.iter().find(|l| l.id == id).cloned())
    }

    async fn variant(&self, id: VariantId) -> Result<Option<Variant>> {
        let data = self.data.read().await;
        Ok(data.variants.iter().find(|v| v.id == id).cloned())
    }

    async fn save_variant(&self, variant: &Variant) -> Result<()> {
        let mut data = self.data.write().await;
        let Some(existing) = data.variants.iter_mut().find(|v| v.id == variant.id) else {
            bail!("variant {} not found", variant.id);
        };
        existing.clone_from(variant);
        self.persist(&data).await
    }

    async fn current_price(
        &self,
        listing: ListingId,
        condition: Condition,
    ) -> Result<Option<PriceRecord>> {
        let data = self.data.read().await;
        Ok(data
            .prices
            .iter()
            .filter(pair(listing, condition))
            .filter(|r| r.is_current)
            .max_by_key(|r| r.observed_at)
            .cloned())
    }

    async fn previous_price(
        &self,
        listing: ListingId,
        condition: Condition,
    ) -> Result<Option<PriceRecord>> {
        let data = self.data.read().await;
        Ok(data
            .prices
            .iter()
            .filter(pair(listing, condition))
            .filter(|r| !r.is_current)
            .max_by_key(|r| r.observed_at)
            .cloned())
    }

    async fn price_history(
        &self,
        listing: ListingId,
        condition: Condition,
    ) -> Result<Vec<PriceRecord>> {
        let data = self.data.read().await;
        let mut history: Vec<PriceRecord> = data
            .prices
            .iter()
            .filter(pair(listing, condition))
            .cloned()
            .collect();
        history.sort_by_key(|r| r.observed_at);
        Ok(history)
    }

    async fn update_price(&self, record: &PriceRecord) -> Result<()> {
        let mut data = self.data.write().await;
        let Some(existing) = data.prices.iter_mut().find(|r| r.id == record.id) else {
            bail!("price record {} not found", record.id);
        };
        existing.clone_from(record);
        self.persist(&data).await
    }

    async fn supersede_and_insert(&self, record: &PriceRecord) -> Result<()> {
        let mut data = self.data.write().await;
        if !data.listings.iter().any(|l| l.id == record.listing_id) {
            bail!("listing {} not found", record.listing_id);
        }
        for existing in data.prices.iter_mut().filter(|r| {
            r.listing_id == record.listing_id && r.condition == record.condition && r.is_current
        }) {
            existing.is_current = false;
        }
        let mut inserted = record.clone();
        inserted.is_current = true;
        data.prices.push(inserted);
        self.persist(&data).await
    }

    async fn mark_fetched(&self, listing: ListingId, at: DateTime<Utc>) -> Result<()> {
        let mut data = self.data.write().await;
        let Some(existing) = data.listings.iter_mut().find(|l| l.id == listing) else {
            bail!("listing {listing} not found");
        };
        existing.is_first_fetch = false;
        existing.last_fetched_at = at;
        self.persist(&data).await
    }

    async fn delete_listing(&self, listing: ListingId) -> Result<usize> {
        let mut data = self.data.write().await;
        let before = data.listings.len();
        data.listings.retain(|l| l.id != listing);
        if data.listings.len() == before {
            warn!(listing_id = listing, "Listing already gone, nothing to delete");
        }
        let prices_before = data.prices.len();
        data.prices.retain(|r| r.listing_id != listing);
        let removed = prices_before - data.prices.len();
        self.persist(&data).await?;
        Ok(removed)
    }

    async fn is_healthy(&self) -> bool {
        match &self.snapshot {
            Some(snapshot) => snapshot.is_healthy().await,
            None => true,
        }
    }
}

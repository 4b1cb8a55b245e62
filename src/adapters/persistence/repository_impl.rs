//! Repository Implementation — Concrete Adapter for the Repository Port
//!
//! Wraps `CatalogStore` (snapshot-backed catalog) and `HistoryLog`
//! (JSONL append-only price events) into a single struct that
//! implements the `CatalogRepository` trait from
//! `crate::ports::repository`.
//!
//! The usecases layer only knows about the trait, never about files or
//! JSON. Event logging is best-effort: the catalog write is the source
//! of truth, so a failed append is logged and not propagated.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

use super::catalog_store::CatalogStore;
use super::history_log::{HistoryLog, PriceEvent, PriceEventKind};
use crate::domain::listing::{Condition, Listing, ListingId, VariantId};
use crate::domain::price::PriceRecord;
use crate::domain::variant::Variant;
use crate::ports::repository::CatalogRepository;

/// Concrete repository adapter combining the catalog and the event log.
pub struct RepositoryImpl {
    /// Snapshot-backed catalog.
    store: CatalogStore,
    /// JSONL price event log.
    history: HistoryLog,
}

impl RepositoryImpl {
    /// Create a new repository from existing store and log instances.
    pub const fn new(store: CatalogStore, history: HistoryLog) -> Self {
        Self { store, history }
    }

    /// Create a new repository with a data directory path.
    ///
    /// Loads `catalog.json` (if any) and prepares `history/`.
    pub async fn from_data_dir(data_dir: &str) -> Result<Self> {
        let store = CatalogStore::open(data_dir).await?;
        let history = HistoryLog::new(data_dir).await?;
        Ok(Self::new(store, history))
    }

    pub const fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub const fn history(&self) -> &HistoryLog {
        &self.history
    }

    async fn record_event(&self, event: PriceEvent) {
        if let Err(e) = self.history.append(&event).await {
            warn!(
                listing_id = event.listing_id,
                error = %e,
                "Failed to append price event"
            );
        }
    }
}

#[async_trait]
impl CatalogRepository for RepositoryImpl {
    async fn due_listings(
        &self,
        retailer: &str,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Listing>> {
        self.store.due_listings(retailer, stale_before, limit).await
    }

    async fn listing(&self, id: ListingId) -> Result<Option<Listing>> {
        self.store.listing(id).await
    }

    async fn variant(&self, id: VariantId) -> Result<Option<Variant>> {
        self.store.variant(id).await
    }

    async fn save_variant(&self, variant: &Variant) -> Result<()> {
        self.store.save_variant(variant).await
    }

    async fn current_price(
        &self,
        listing: ListingId,
        condition: Condition,
    ) -> Result<Option<PriceRecord>> {
        self.store.current_price(listing, condition).await
    }

    async fn previous_price(
        &self,
        listing: ListingId,
        condition: Condition,
    ) -> Result<Option<PriceRecord>> {
        self.store.previous_price(listing, condition).await
    }

    async fn price_history(
        &self,
        listing: ListingId,
        condition: Condition,
    ) -> Result<Vec<PriceRecord>> {
        self.store.price_history(listing, condition).await
    }

    async fn update_price(&self, record: &PriceRecord) -> Result<()> {
        self.store.update_price(record).await?;
        self.record_event(PriceEvent::for_record(PriceEventKind::Refreshed, record))
            .await;
        Ok(())
    }

    async fn supersede_and_insert(&self, record: &PriceRecord) -> Result<()> {
        self.store.supersede_and_insert(record).await?;
        self.record_event(PriceEvent::for_record(PriceEventKind::Inserted, record))
            .await;
        Ok(())
    }

    async fn mark_fetched(&self, listing: ListingId, at: DateTime<Utc>) -> Result<()> {
        self.store.mark_fetched(listing, at).await
    }

    async fn delete_listing(&self, listing: ListingId) -> Result<usize> {
        let removed = self.store.delete_listing(listing).await?;
        self.record_event(PriceEvent::listing_deleted(listing, removed, Utc::now()))
            .await;
        Ok(removed)
    }

    async fn is_healthy(&self) -> bool {
        self.store.is_healthy().await && self.history.is_healthy().await
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;
    use crate::domain::listing::ConditionMode;
    use crate::domain::price::PriceObservation;

    fn temp_dir() -> String {
        std::env::temp_dir()
            .join(format!("pricewatch-repo-{}", Uuid::new_v4()))
            .to_string_lossy()
            .into_owned()
    }

    #[tokio::test]
    async fn test_writes_are_logged_as_events() {
        let dir = temp_dir();
        let repo = RepositoryImpl::from_data_dir(&dir).await.unwrap();
        repo.store()
            .upsert_listing(Listing {
                id: 1,
                variant_id: 1,
                retailer: "amazon".into(),
                identifier: "B000TEST01".into(),
                url: "https://www.amazon.com/dp/B000TEST01".into(),
                condition: ConditionMode::Discover,
                is_first_fetch: true,
                last_fetched_at: Utc::now(),
            })
            .await
            .unwrap();

        let observation = PriceObservation {
            condition: Condition::New,
            url: "https://www.amazon.com/gp/offer-listing/B000TEST01".into(),
            price: Some(dec!(29.99)),
            shipping: None,
            shipping_tier: None,
            currency: Some("USD".into()),
            seller: None,
        };
        let mut record = PriceRecord::from_observation(1, &observation, Utc::now());
        repo.supersede_and_insert(&record).await.unwrap();
        record.seller = Some("Amazon.com".into());
        repo.update_price(&record).await.unwrap();
        assert_eq!(repo.delete_listing(1).await.unwrap(), 1);
        assert!(repo.is_healthy().await);

        let kinds: Vec<_> = repo
            .history()
            .load_all()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                PriceEventKind::Inserted,
                PriceEventKind::Refreshed,
                PriceEventKind::ListingDeleted
            ]
        );
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_unwritable_history_is_unhealthy() {
        let dir = temp_dir();
        let repo = RepositoryImpl::from_data_dir(&dir).await.unwrap();
        assert!(repo.is_healthy().await);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
        assert!(!repo.is_healthy().await);
    }
}

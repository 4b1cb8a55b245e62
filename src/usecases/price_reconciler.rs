//! Price Reconciler - Applies the Dedup Policy to the Store
//!
//! Reads the current and most recently superseded records for a
//! (listing, condition) pair, asks the pure reconciliation policy what
//! to do with a new observation, and performs that single write.
//! Stamping the listing as fetched is left to the caller, once every
//! condition of the listing has been written.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};

use crate::domain::error::IngestError;
use crate::domain::listing::Listing;
use crate::domain::price::PriceObservation;
use crate::domain::reconcile::{ReconciliationAction, reconcile};
use crate::ports::repository::CatalogRepository;

/// Merges observations into the price history.
pub struct PriceReconciler<R: CatalogRepository> {
  /// Repository port.
  repo: Arc<R>,
}

impl<R: CatalogRepository> PriceReconciler<R> {
  /// Create a new reconciler.
  pub const fn new(repo: Arc<R>) -> Self {
    Self { repo }
  }

  /// Reconcile one observation for a listing.
  ///
  /// Returns the action that was applied.
  #[instrument(
    skip(self, listing, observation),
    fields(listing_id = listing.id, condition = %observation.condition)
  )]
  pub async fn apply(
    &self,
    listing: &Listing,
    observation: &PriceObservation,
  ) -> Result<ReconciliationAction, IngestError> {
    let current = self
      .repo
      .current_price(listing.id, observation.condition)
      .await?;
    let previous = self
      .repo
      .previous_price(listing.id, observation.condition)
      .await?;

    let now = Utc::now();
    let action = reconcile(
      listing.id,
      current.as_ref(),
      previous.as_ref(),
      observation,
      now,
    );

    match &action {
      ReconciliationAction::UpdateInPlace(record) => self.repo.update_price(record).await?,
      ReconciliationAction::SupersedeAndInsert(record) => {
        self.repo.supersede_and_insert(record).await?;
      }
    }

    debug!(
      action = action.label(),
      total = ?action.record().total,
      currency = ?action.record().currency,
      "Price reconciled"
    );

    Ok(action)
  }
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;
  use crate::adapters::persistence::{CatalogData, CatalogStore};
  use crate::domain::listing::{Condition, ConditionMode};
  use crate::domain::price::ShippingTier;

  fn listing() -> Listing {
    Listing {
      id: 1,
      variant_id: 1,
      retailer: "amazon".into(),
      identifier: "B000TEST01".into(),
      url: "https://www.amazon.com/dp/B000TEST01".into(),
      condition: ConditionMode::Discover,
      is_first_fetch: true,
      last_fetched_at: Utc::now() - chrono::Duration::days(1),
    }
  }

  fn observation(price: rust_decimal::Decimal, seller: &str) -> PriceObservation {
    PriceObservation {
      condition: Condition::New,
      url: "https://www.amazon.com/gp/offer-listing/B000TEST01?f_new=true".into(),
      price: Some(price),
      shipping: None,
      shipping_tier: Some(ShippingTier::Prime),
      currency: Some("USD".into()),
      seller: Some(seller.into()),
    }
  }

  fn reconciler() -> (Arc<CatalogStore>, PriceReconciler<CatalogStore>) {
    let store = Arc::new(CatalogStore::with_data(CatalogData {
      listings: vec![listing()],
      ..CatalogData::default()
    }));
    (Arc::clone(&store), PriceReconciler::new(store))
  }

  #[tokio::test]
  async fn test_three_identical_readings_collapse_into_current() {
    let (store, reconciler) = reconciler();
    let listing = listing();

    let first = reconciler.apply(&listing, &observation(dec!(29.99), "A")).await.unwrap();
    let second = reconciler.apply(&listing, &observation(dec!(29.99), "B")).await.unwrap();
    let third = reconciler.apply(&listing, &observation(dec!(29.99), "C")).await.unwrap();

    assert_eq!(first.label(), "inserted");
    assert_eq!(second.label(), "inserted");
    assert_eq!(third.label(), "refreshed");

    let history = store.price_history(1, Condition::New).await.unwrap();
    assert_eq!(history.len(), 2);
    let current: Vec<_> = history.iter().filter(|r| r.is_current).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].seller.as_deref(), Some("C"));
    assert_eq!(current[0].id, second.record().id);
  }

  #[tokio::test]
  async fn test_change_supersedes_current() {
    let (store, reconciler) = reconciler();
    let listing = listing();
    reconciler.apply(&listing, &observation(dec!(29.99), "A")).await.unwrap();
    let changed = reconciler.apply(&listing, &observation(dec!(24.99), "A")).await.unwrap();
    assert_eq!(changed.label(), "inserted");

    let current = store.current_price(1, Condition::New).await.unwrap().unwrap();
    assert_eq!(current.total, Some(dec!(24.99)));
    let previous = store.previous_price(1, Condition::New).await.unwrap().unwrap();
    assert_eq!(previous.total, Some(dec!(29.99)));
    assert!(!previous.is_current);
  }

  #[tokio::test]
  async fn test_apply_does_not_stamp_listing() {
    let (store, reconciler) = reconciler();
    let before = store.listing(1).await.unwrap().unwrap();
    reconciler.apply(&listing(), &observation(dec!(9.99), "A")).await.unwrap();
    let stored = store.listing(1).await.unwrap().unwrap();
    assert!(stored.is_first_fetch);
    assert_eq!(stored.last_fetched_at, before.last_fetched_at);
  }

  #[tokio::test]
  async fn test_storage_failure_is_storage_error() {
    let store = Arc::new(CatalogStore::in_memory());
    let reconciler = PriceReconciler::new(store);
    let err = reconciler
      .apply(&listing(), &observation(dec!(9.99), "A"))
      .await
      .unwrap_err();
    assert_eq!(err.kind(), "storage");
  }
}

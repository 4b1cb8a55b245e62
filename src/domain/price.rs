//! Price observations and historical price records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::listing::{Condition, ListingId};

/// Shipping tier reported for an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingTier {
    /// Offer is eligible for priority (Prime) shipping.
    Prime,
    Standard,
}

/// Total cost of an offer. A missing price yields a missing total; a
/// missing shipping fee counts as free.
pub fn compute_total(price: Option<Decimal>, shipping: Option<Decimal>) -> Option<Decimal> {
    price.map(|p| p + shipping.unwrap_or(Decimal::ZERO))
}

/// One freshly fetched pricing reading for a (listing, condition) pair.
///
/// All-`None` pricing fields mean the vendor had no offer for the
/// condition; such readings are still recorded so history shows the
/// unavailability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceObservation {
    pub condition: Condition,
    /// Outbound offers-page URL.
    pub url: String,
    pub price: Option<Decimal>,
    pub shipping: Option<Decimal>,
    pub shipping_tier: Option<ShippingTier>,
    pub currency: Option<String>,
    pub seller: Option<String>,
}

impl PriceObservation {
    /// Reading for a condition the vendor has no offer for.
    pub const fn unavailable(condition: Condition, url: String) -> Self {
        Self {
            condition,
            url,
            price: None,
            shipping: None,
            shipping_tier: None,
            currency: None,
            seller: None,
        }
    }

    /// Price plus shipping, computed with exact decimals.
    pub fn total(&self) -> Option<Decimal> {
        compute_total(self.price, self.shipping)
    }

    pub const fn is_available(&self) -> bool {
        self.price.is_some()
    }
}

/// One stored price observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub id: Uuid,
    pub listing_id: ListingId,
    pub condition: Condition,
    pub url: String,
    pub price: Option<Decimal>,
    pub shipping: Option<Decimal>,
    pub shipping_tier: Option<ShippingTier>,
    pub currency: Option<String>,
    /// Always `price + shipping`, recomputed on every write.
    pub total: Option<Decimal>,
    pub seller: Option<String>,
    pub observed_at: DateTime<Utc>,
    pub is_current: bool,
}

impl PriceRecord {
    /// New current record built from an observation.
    pub fn from_observation(
        listing_id: ListingId,
        observation: &PriceObservation,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            listing_id,
            condition: observation.condition,
            url: observation.url.clone(),
            price: observation.price,
            shipping: observation.shipping,
            shipping_tier: observation.shipping_tier,
            currency: observation.currency.clone(),
            total: observation.total(),
            seller: observation.seller.clone(),
            observed_at,
            is_current: true,
        }
    }

    /// Overwrite the mutable fields from a newer observation of the same
    /// price point.
    pub fn refresh_from(&mut self, observation: &PriceObservation, observed_at: DateTime<Utc>) {
        self.url.clone_from(&observation.url);
        self.price = observation.price;
        self.shipping = observation.shipping;
        self.shipping_tier = observation.shipping_tier;
        self.seller.clone_from(&observation.seller);
        self.total = compute_total(self.price, self.shipping);
        self.observed_at = observed_at;
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn observation() -> PriceObservation {
        PriceObservation {
            condition: Condition::New,
            url: "https://www.amazon.com/gp/offer-listing/B000TEST01".into(),
            price: Some(dec!(29.99)),
            shipping: Some(dec!(4.01)),
            shipping_tier: Some(ShippingTier::Standard),
            currency: Some("USD".into()),
            seller: Some("Acme".into()),
        }
    }

    #[test]
    fn test_total_is_exact() {
        assert_eq!(observation().total(), Some(dec!(34.00)));
        assert_eq!(compute_total(Some(dec!(0.1)), Some(dec!(0.2))), Some(dec!(0.3)));
        assert_eq!(compute_total(Some(dec!(29.99)), None), Some(dec!(29.99)));
        assert_eq!(compute_total(None, Some(dec!(5))), None);
    }

    #[test]
    fn test_record_from_observation_is_current() {
        let now = Utc::now();
        let record = PriceRecord::from_observation(3, &observation(), now);
        assert!(record.is_current);
        assert_eq!(record.listing_id, 3);
        assert_eq!(record.total, Some(dec!(34.00)));
        assert_eq!(record.observed_at, now);
    }

    #[test]
    fn test_refresh_recomputes_total_and_keeps_identity() {
        let mut record = PriceRecord::from_observation(3, &observation(), Utc::now());
        let id = record.id;
        let mut newer = observation();
        newer.seller = Some("Other Seller".into());
        newer.shipping = Some(dec!(0));
        newer.price = Some(dec!(34.00));
        record.refresh_from(&newer, Utc::now());
        assert_eq!(record.id, id);
        assert_eq!(record.seller.as_deref(), Some("Other Seller"));
        assert_eq!(record.total, Some(dec!(34.00)));
    }

    #[test]
    fn test_unavailable_observation() {
        let obs = PriceObservation::unavailable(Condition::Refurb, "u".into());
        assert!(!obs.is_available());
        assert_eq!(obs.total(), None);
    }
}

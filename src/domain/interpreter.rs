//! Offer interpretation.
//!
//! Turns a typed lookup response into one variant update plus one price
//! observation per evaluated condition. Every evaluated condition yields
//! exactly one entry: an observation (possibly absent-valued when the
//! vendor has no offer) or a validation error for that condition alone.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::IngestError;
use super::listing::{Condition, ConditionMode, Listing};
use super::lookup::{ITEM_NOT_ACCESSIBLE, LookupItem, LookupResponse, Money, Offer};
use super::price::{PriceObservation, ShippingTier};
use super::variant::VariantUpdate;

/// Everything extracted from one item.
#[derive(Debug)]
pub struct Interpretation {
    pub variant: VariantUpdate,
    /// One entry per evaluated condition, in evaluation order.
    pub observations: Vec<Result<PriceObservation, IngestError>>,
}

/// Interpret a lookup response for a listing.
///
/// # Errors
/// - [`IngestError::NotFound`] when the vendor reports the item as no
///   longer accessible; the caller deletes the listing.
/// - [`IngestError::Vendor`] for any other vendor error code.
/// - [`IngestError::Parse`] when item-level metadata is malformed.
pub fn interpret(
    listing: &Listing,
    response: &LookupResponse,
) -> Result<Interpretation, IngestError> {
    let item = match response {
        LookupResponse::Item(item) => item,
        LookupResponse::VendorError { code, .. } if code == ITEM_NOT_ACCESSIBLE => {
            return Err(IngestError::NotFound {
                identifier: listing.identifier.clone(),
                code: code.clone(),
            });
        }
        LookupResponse::VendorError { code, message } => {
            return Err(IngestError::Vendor {
                code: code.clone(),
                message: message.clone(),
            });
        }
    };

    let variant = extract_variant(item)?;

    let base_url = item
        .offers
        .as_ref()
        .and_then(|section| section.more_offers_url.clone())
        .unwrap_or_else(|| listing.url.clone());
    let offers = item
        .offers
        .as_ref()
        .map_or(&[][..], |section| section.offers.as_slice());

    let observations = match listing.condition {
        ConditionMode::Fixed(condition) => {
            vec![observe(condition, base_url, offers.first())]
        }
        ConditionMode::Discover => Condition::ALL
            .iter()
            .map(|&condition| {
                let offer = offers
                    .iter()
                    .find(|o| o.condition.as_deref() == Some(condition.vendor_label()));
                let url = with_filter(&base_url, condition.offers_filter());
                observe(condition, url, offer)
            })
            .collect(),
    };

    Ok(Interpretation {
        variant,
        observations,
    })
}

/// Append an offer-page filter, starting the query string when the base
/// URL has none.
fn with_filter(base: &str, filter: &str) -> String {
    match filter.strip_prefix('&') {
        Some(params) if !base.contains('?') => format!("{base}?{params}"),
        _ => format!("{base}{filter}"),
    }
}

/// Variant metadata of an item.
fn extract_variant(item: &LookupItem) -> Result<VariantUpdate, IngestError> {
    let msrp = match item.attributes.list_price.as_ref().filter(|m| m.has_amount()) {
        Some(money) => Some(minor_units(money).ok_or_else(|| {
            IngestError::Parse(format!(
                "list price amount {:?} is not a number",
                money.amount.as_deref().unwrap_or_default()
            ))
        })?),
        None => None,
    };

    Ok(VariantUpdate {
        image: item.primary_image().map(str::to_string),
        rank: item.sales_rank,
        upc: item.attributes.upc.clone().unwrap_or_default(),
        ean: item.attributes.ean.clone().unwrap_or_default(),
        msrp,
    })
}

/// Price observation for one condition.
fn observe(
    condition: Condition,
    url: String,
    offer: Option<&Offer>,
) -> Result<PriceObservation, IngestError> {
    let Some(offer) = offer else {
        return Ok(PriceObservation::unavailable(condition, url));
    };

    let invalid = |reason: String| IngestError::Validation { condition, reason };

    let listing = offer
        .listing
        .as_ref()
        .ok_or_else(|| invalid("offer has no offer listing".to_string()))?;

    let (price, currency) = match listing.effective_price() {
        Some(money) => {
            let price = minor_units(money).ok_or_else(|| {
                invalid(format!(
                    "amount {:?} is not a number",
                    money.amount.as_deref().unwrap_or_default()
                ))
            })?;
            let currency = money
                .currency_code
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .ok_or_else(|| invalid("priced offer has no currency code".to_string()))?;
            (Some(price), Some(currency.to_string()))
        }
        None => (None, None),
    };

    let shipping_tier = if listing.prime_eligible {
        ShippingTier::Prime
    } else {
        ShippingTier::Standard
    };

    Ok(PriceObservation {
        condition,
        url,
        price,
        shipping: None,
        shipping_tier: Some(shipping_tier),
        currency,
        seller: offer.merchant.clone(),
    })
}

/// Vendor amounts are minor units; divide by 100 with exact decimals.
fn minor_units(money: &Money) -> Option<Decimal> {
    let raw = money.amount.as_deref()?.trim();
    Decimal::from_str(raw).ok().map(|cents| cents / dec!(100))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::lookup::{ItemAttributes, OfferListing, OfferSection};

    const OFFERS_URL: &str = "https://www.amazon.com/gp/offer-listing/B000TEST01?tag=t-20";

    fn listing(mode: ConditionMode) -> Listing {
        Listing {
            id: 1,
            variant_id: 10,
            retailer: "amazon".into(),
            identifier: "B000TEST01".into(),
            url: "https://www.amazon.com/dp/B000TEST01".into(),
            condition: mode,
            is_first_fetch: true,
            last_fetched_at: Utc::now(),
        }
    }

    fn offer(label: &str, amount: &str, prime: bool) -> Offer {
        Offer {
            condition: Some(label.into()),
            merchant: Some(format!("{label} Seller")),
            listing: Some(OfferListing {
                price: Some(Money {
                    amount: Some(amount.into()),
                    currency_code: Some("USD".into()),
                    formatted: None,
                }),
                sale_price: None,
                prime_eligible: prime,
            }),
        }
    }

    fn item(offers: Vec<Offer>) -> LookupResponse {
        LookupResponse::Item(Box::new(LookupItem {
            asin: Some("B000TEST01".into()),
            large_image: None,
            image_sets: vec!["https://images.example/set0.jpg".into()],
            sales_rank: Some(42),
            attributes: ItemAttributes {
                upc: Some("012345678905".into()),
                ean: None,
                list_price: Some(Money {
                    amount: Some("4999".into()),
                    currency_code: Some("USD".into()),
                    formatted: Some("$49.99".into()),
                }),
            },
            offers: Some(OfferSection {
                more_offers_url: Some(OFFERS_URL.into()),
                offers,
            }),
        }))
    }

    #[test]
    fn test_only_used_offer_discovered() {
        let result = interpret(&listing(ConditionMode::Discover), &item(vec![offer("Used", "1850", false)]))
            .unwrap();
        let observations: Vec<_> = result.observations.into_iter().map(Result::unwrap).collect();
        assert_eq!(observations.len(), 3);

        assert_eq!(observations[0].condition, Condition::New);
        assert!(!observations[0].is_available());
        assert_eq!(observations[0].url, format!("{OFFERS_URL}&f_new=true"));

        let used = &observations[1];
        assert_eq!(used.condition, Condition::Used);
        assert_eq!(used.total(), Some(dec!(18.50)));
        assert_eq!(used.currency.as_deref(), Some("USD"));
        assert_eq!(used.shipping_tier, Some(ShippingTier::Standard));
        assert_eq!(used.seller.as_deref(), Some("Used Seller"));
        assert!(used.url.contains("f_usedVeryGood=true"));

        assert_eq!(observations[2].condition, Condition::Refurb);
        assert!(observations[2].seller.is_none());
    }

    #[test]
    fn test_first_matching_offer_wins() {
        let response = item(vec![
            offer("New", "2999", true),
            offer("New", "2899", false),
            offer("Refurbished", "1999", false),
        ]);
        let result = interpret(&listing(ConditionMode::Discover), &response).unwrap();
        let new = result.observations[0].as_ref().unwrap();
        assert_eq!(new.price, Some(dec!(29.99)));
        assert_eq!(new.shipping_tier, Some(ShippingTier::Prime));
        let refurb = result.observations[2].as_ref().unwrap();
        assert_eq!(refurb.price, Some(dec!(19.99)));
    }

    #[test]
    fn test_fixed_condition_takes_first_offer_regardless_of_label() {
        let response = item(vec![offer("Used", "1500", false), offer("Refurbished", "1700", false)]);
        let result =
            interpret(&listing(ConditionMode::Fixed(Condition::Refurb)), &response).unwrap();
        assert_eq!(result.observations.len(), 1);
        let obs = result.observations[0].as_ref().unwrap();
        assert_eq!(obs.condition, Condition::Refurb);
        assert_eq!(obs.price, Some(dec!(15.00)));
        assert_eq!(obs.url, OFFERS_URL);
    }

    #[test]
    fn test_missing_offer_section_yields_unavailable_readings() {
        let mut response = item(vec![]);
        if let LookupResponse::Item(ref mut item) = response {
            item.offers = None;
        }
        let result = interpret(&listing(ConditionMode::Discover), &response).unwrap();
        assert_eq!(result.observations.len(), 3);
        for obs in result.observations {
            let obs = obs.unwrap();
            assert!(!obs.is_available());
            assert!(obs.url.starts_with("https://www.amazon.com/dp/B000TEST01?f_"));
            assert_eq!(obs.url.matches('?').count(), 1);
        }
    }

    #[test]
    fn test_filter_joins_existing_query() {
        assert_eq!(
            with_filter("https://www.amazon.com/gp/offer-listing/X?tag=t-20", "&f_new=true"),
            "https://www.amazon.com/gp/offer-listing/X?tag=t-20&f_new=true"
        );
        assert_eq!(
            with_filter("https://www.amazon.com/dp/X", "&f_refurbished=true"),
            "https://www.amazon.com/dp/X?f_refurbished=true"
        );
    }

    #[test]
    fn test_variant_extraction() {
        let result = interpret(&listing(ConditionMode::Discover), &item(vec![])).unwrap();
        assert_eq!(
            result.variant,
            VariantUpdate {
                image: Some("https://images.example/set0.jpg".into()),
                rank: Some(42),
                upc: "012345678905".into(),
                ean: String::new(),
                msrp: Some(dec!(49.99)),
            }
        );
    }

    #[test]
    fn test_not_accessible_is_not_found() {
        let response = LookupResponse::VendorError {
            code: ITEM_NOT_ACCESSIBLE.into(),
            message: "This item is not accessible through the Product Advertising API.".into(),
        };
        let err = interpret(&listing(ConditionMode::Discover), &response).unwrap_err();
        assert!(matches!(err, IngestError::NotFound { ref identifier, .. } if identifier == "B000TEST01"));
    }

    #[test]
    fn test_other_vendor_error_is_vendor() {
        let response = LookupResponse::VendorError {
            code: "AWS.InvalidParameterValue".into(),
            message: "bad id".into(),
        };
        let err = interpret(&listing(ConditionMode::Discover), &response).unwrap_err();
        assert_eq!(err.kind(), "vendor");
    }

    #[test]
    fn test_invalid_amount_drops_only_that_condition() {
        let response = item(vec![offer("New", "12,99", false), offer("Used", "999", false)]);
        let result = interpret(&listing(ConditionMode::Discover), &response).unwrap();
        assert!(matches!(
            result.observations[0],
            Err(IngestError::Validation { condition: Condition::New, .. })
        ));
        assert_eq!(result.observations[1].as_ref().unwrap().price, Some(dec!(9.99)));
        assert!(result.observations[2].is_ok());
    }

    #[test]
    fn test_priced_offer_without_currency_is_invalid() {
        let mut used = offer("Used", "999", false);
        if let Some(listing) = used.listing.as_mut() {
            listing.price.as_mut().unwrap().currency_code = None;
        }
        let result = interpret(&listing(ConditionMode::Discover), &item(vec![used])).unwrap();
        assert!(result.observations[1].is_err());
    }

    #[test]
    fn test_malformed_list_price_is_parse_error() {
        let mut response = item(vec![]);
        if let LookupResponse::Item(ref mut item) = response {
            item.attributes.list_price.as_mut().unwrap().amount = Some("n/a".into());
        }
        let err = interpret(&listing(ConditionMode::Discover), &response).unwrap_err();
        assert_eq!(err.kind(), "parse");
    }
}

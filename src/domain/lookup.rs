//! Typed view of a vendor item-lookup response.
//!
//! The marketplace adapter converts the raw response tree into these
//! types. Fields the vendor may send once or many times are always
//! sequences here, so nothing downstream has to care about cardinality.
//! Amounts stay as the raw strings the vendor sent; turning them into
//! prices is the interpreter's job.

/// Vendor error code for items that will never be available again.
pub const ITEM_NOT_ACCESSIBLE: &str = "AWS.ECommerceService.ItemNotAccessible";

/// Outcome of one item lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResponse {
    Item(Box<LookupItem>),
    VendorError {
        code: String,
        message: String,
    },
}

/// One looked-up item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LookupItem {
    pub asin: Option<String>,
    /// Dedicated large image URL.
    pub large_image: Option<String>,
    /// Large image URLs of every image set, in vendor order.
    pub image_sets: Vec<String>,
    pub sales_rank: Option<u64>,
    pub attributes: ItemAttributes,
    /// `None` when the response has no offers section at all.
    pub offers: Option<OfferSection>,
}

/// Catalog attributes of an item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemAttributes {
    pub upc: Option<String>,
    pub ean: Option<String>,
    /// Manufacturer list price.
    pub list_price: Option<Money>,
}

/// Offers section of an item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OfferSection {
    /// Generic offers-page URL.
    pub more_offers_url: Option<String>,
    pub offers: Vec<Offer>,
}

/// One seller offer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Offer {
    /// Condition label, e.g. `New`, `Used`, `Refurbished`.
    pub condition: Option<String>,
    pub merchant: Option<String>,
    /// First offer listing of the offer.
    pub listing: Option<OfferListing>,
}

/// Pricing block of an offer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OfferListing {
    pub price: Option<Money>,
    pub sale_price: Option<Money>,
    pub prime_eligible: bool,
}

/// Vendor money node. `amount` is in minor units (cents).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Money {
    pub amount: Option<String>,
    pub currency_code: Option<String>,
    pub formatted: Option<String>,
}

impl Money {
    pub fn has_amount(&self) -> bool {
        self.amount.as_deref().is_some_and(|a| !a.trim().is_empty())
    }
}

impl LookupItem {
    /// Preferred image: the dedicated large image, else the first image set.
    pub fn primary_image(&self) -> Option<&str> {
        self.large_image
            .as_deref()
            .or_else(|| self.image_sets.first().map(String::as_str))
    }
}

impl OfferListing {
    /// Money block to price the offer with: sale price if it carries an
    /// amount, else the regular price.
    pub fn effective_price(&self) -> Option<&Money> {
        self.sale_price
            .as_ref()
            .filter(|m| m.has_amount())
            .or_else(|| self.price.as_ref().filter(|m| m.has_amount()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(amount: Option<&str>) -> Money {
        Money {
            amount: amount.map(str::to_string),
            currency_code: Some("USD".into()),
            formatted: None,
        }
    }

    #[test]
    fn test_primary_image_prefers_large_image() {
        let item = LookupItem {
            large_image: Some("large.jpg".into()),
            image_sets: vec!["set.jpg".into()],
            ..LookupItem::default()
        };
        assert_eq!(item.primary_image(), Some("large.jpg"));

        let item = LookupItem {
            image_sets: vec!["set0.jpg".into(), "set1.jpg".into()],
            ..LookupItem::default()
        };
        assert_eq!(item.primary_image(), Some("set0.jpg"));
        assert_eq!(LookupItem::default().primary_image(), None);
    }

    #[test]
    fn test_effective_price_prefers_sale_price() {
        let listing = OfferListing {
            price: Some(money(Some("3499"))),
            sale_price: Some(money(Some("2999"))),
            prime_eligible: false,
        };
        assert_eq!(
            listing.effective_price().and_then(|m| m.amount.as_deref()),
            Some("2999")
        );
    }

    #[test]
    fn test_effective_price_skips_sale_price_without_amount() {
        let listing = OfferListing {
            price: Some(money(Some("3499"))),
            sale_price: Some(money(None)),
            prime_eligible: false,
        };
        assert_eq!(
            listing.effective_price().and_then(|m| m.amount.as_deref()),
            Some("3499")
        );
        let empty = OfferListing {
            price: Some(money(Some("  "))),
            ..OfferListing::default()
        };
        assert!(empty.effective_price().is_none());
    }
}

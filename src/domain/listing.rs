//! Listing and condition types.
//!
//! A listing is one trackable marketplace offer slot for a product
//! variant. The catalog creates listings; the ingestion pipeline only
//! stamps fetch bookkeeping on them or deletes them when the vendor
//! drops the item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog-assigned listing identifier.
pub type ListingId = u64;

/// Catalog-assigned variant identifier.
pub type VariantId = u64;

/// Item condition category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    New,
    Used,
    Refurb,
}

impl Condition {
    /// Discovery order when a listing has no fixed condition.
    pub const ALL: [Self; 3] = [Self::New, Self::Used, Self::Refurb];

    /// Label the vendor reports in an offer's condition attribute.
    pub const fn vendor_label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Used => "Used",
            Self::Refurb => "Refurbished",
        }
    }

    /// Query fragment that filters the vendor's offers page to this condition.
    pub const fn offers_filter(self) -> &'static str {
        match self {
            Self::New => "&f_new=true",
            Self::Used => {
                "&f_used=true&f_usedAcceptable=true&f_usedGood=true\
                 &f_usedLikeNew=true&f_usedVeryGood=true"
            }
            Self::Refurb => "&f_refurbished=true",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Used => write!(f, "used"),
            Self::Refurb => write!(f, "refurb"),
        }
    }
}

/// How the conditions of a listing are resolved.
///
/// `Fixed` listings track exactly one condition and take the first offer
/// the vendor returns. `Discover` listings are evaluated for every
/// condition in [`Condition::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "condition")]
pub enum ConditionMode {
    Fixed(Condition),
    #[default]
    Discover,
}

impl ConditionMode {
    /// Conditions this mode evaluates, in order.
    pub fn conditions(self) -> Vec<Condition> {
        match self {
            Self::Fixed(condition) => vec![condition],
            Self::Discover => Condition::ALL.to_vec(),
        }
    }
}

/// One trackable marketplace offer slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    /// Variant this listing prices (owned by the catalog).
    pub variant_id: VariantId,
    /// Retailer tag, e.g. `amazon`.
    pub retailer: String,
    /// Vendor item identifier (ASIN).
    pub identifier: String,
    /// Canonical product page maintained by the catalog.
    pub url: String,
    #[serde(default)]
    pub condition: ConditionMode,
    /// True until the first successful price upload.
    pub is_first_fetch: bool,
    pub last_fetched_at: DateTime<Utc>,
}

impl Listing {
    /// Whether the listing is due for refresh at a given staleness cutoff.
    pub fn is_due(&self, stale_before: DateTime<Utc>) -> bool {
        self.is_first_fetch || self.last_fetched_at <= stale_before
    }
}

//! Product variant metadata and vendor gap-filling.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::listing::VariantId;

/// Catalog variant, enriched with vendor data where the catalog has none.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub name: String,
    pub image: Option<String>,
    /// Vendor sales rank.
    pub rank: Option<u64>,
    /// Empty when unknown.
    pub upc: String,
    /// Empty when unknown.
    pub ean: String,
    /// Manufacturer suggested price.
    pub msrp: Option<Decimal>,
}

/// Variant metadata extracted from one vendor item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariantUpdate {
    pub image: Option<String>,
    pub rank: Option<u64>,
    pub upc: String,
    pub ean: String,
    pub msrp: Option<Decimal>,
}

impl Variant {
    /// Fill empty fields from vendor data. Populated fields are never touched.
    ///
    /// Returns `true` when at least one field changed.
    pub fn fill_gaps(&mut self, update: &VariantUpdate) -> bool {
        let mut changed = false;

        if self.image.as_deref().is_none_or(str::is_empty) && update.image.is_some() {
            self.image.clone_from(&update.image);
            changed = true;
        }
        if self.rank.is_none() && update.rank.is_some() {
            self.rank = update.rank;
            changed = true;
        }
        if self.upc.is_empty() && !update.upc.is_empty() {
            self.upc.clone_from(&update.upc);
            changed = true;
        }
        if self.ean.is_empty() && !update.ean.is_empty() {
            self.ean.clone_from(&update.ean);
            changed = true;
        }
        if self.msrp.is_none() && update.msrp.is_some() {
            self.msrp = update.msrp;
            changed = true;
        }

        changed
    }
}

//! Domain layer - Core ingestion logic and models.
//!
//! Pure types and decisions for the price-history pipeline: listings,
//! variants, price records, the typed lookup schema, offer
//! interpretation and the reconciliation policy. Nothing in here does
//! I/O (hexagonal architecture inner ring).

pub mod error;
pub mod interpreter;
pub mod listing;
pub mod lookup;
pub mod price;
pub mod reconcile;
pub mod variant;

// Re-export core types for convenience
pub use error::IngestError;
pub use interpreter::{Interpretation, interpret};
pub use listing::{Condition, ConditionMode, Listing, ListingId, VariantId};
pub use lookup::LookupResponse;
pub use price::{PriceObservation, PriceRecord, ShippingTier};
pub use reconcile::{Classification, ReconciliationAction, classify, reconcile};
pub use variant::{Variant, VariantUpdate};

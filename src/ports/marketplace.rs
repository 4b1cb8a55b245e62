//! Marketplace Port - Vendor Item Lookup Interface
//!
//! One call per listing: sign, fetch and decode the vendor's response
//! into the typed lookup schema. Implementations never retry; a failed
//! listing is simply picked up again by a later run.

use async_trait::async_trait;

use crate::domain::error::IngestError;
use crate::domain::listing::Listing;
use crate::domain::lookup::LookupResponse;

/// Trait for vendor lookup providers.
#[async_trait]
pub trait Marketplace: Send + Sync + 'static {
  /// Look up the vendor item behind a listing.
  ///
  /// Fails with `Configuration`, `Transport` or `Parse` errors. Vendor
  /// error codes are not failures here; they come back as
  /// [`LookupResponse::VendorError`].
  async fn lookup(&self, listing: &Listing) -> Result<LookupResponse, IngestError>;
}

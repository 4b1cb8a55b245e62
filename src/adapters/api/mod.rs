//! Marketplace API Adapter
//!
//! Implements the `Marketplace` port against the vendor's signed-query
//! item lookup API.
//!
//! Sub-modules:
//! - `signer`: Credentials and HMAC-SHA256 query signing
//! - `client`: HTTP client (single GET, no retries)
//! - `xml`: Generic XML attribute tree
//! - `types`: Tree-to-schema decoding of lookup responses

pub mod client;
pub mod signer;
pub mod types;
pub mod xml;

pub use client::{MarketplaceClient, MarketplaceClientConfig};
pub use signer::{Credentials, Endpoint, RequestSigner};

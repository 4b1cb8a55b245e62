//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `Marketplace`: Signed item lookups against the vendor API
//! - `CatalogRepository`: Listings, variants and price history

pub mod marketplace;
pub mod repository;

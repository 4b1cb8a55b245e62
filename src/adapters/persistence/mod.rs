//! Persistence Adapters - File-backed Catalog Storage
//!
//! Implements the CatalogRepository port with an atomic JSON catalog
//! snapshot plus an append-only JSONL log of price events.
//! No database dependency — lightweight and crash-recoverable.

pub mod catalog_store;
pub mod history_log;
pub mod repository_impl;
pub mod snapshot;

pub use catalog_store::CatalogStore;
pub use history_log::{HistoryLog, PriceEvent, PriceEventKind};
pub use repository_impl::RepositoryImpl;
pub use snapshot::{CatalogData, SnapshotFile};

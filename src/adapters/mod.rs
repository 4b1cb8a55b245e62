//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP client, XML decoding, file I/O).
//! Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `api`: Signed vendor item lookups and response decoding
//! - `metrics`: Prometheus metrics textfile export
//! - `persistence`: Catalog snapshot and JSONL price event log

pub mod api;
pub mod metrics;
pub mod persistence;

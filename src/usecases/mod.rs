//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the ingestion workflow.
//!
//! Use cases:
//! - `IngestionScheduler`: Batch selection, pacing, per-listing pipeline
//! - `PriceReconciler`: Dedup policy applied to the price history

pub mod ingestion_scheduler;
pub mod price_reconciler;

//! Metrics Adapter
//!
//! Prometheus counters and histograms for the ingestion batch, exported
//! through a textfile-collector file at the end of each run.

pub mod prometheus;

pub use prometheus::IngestMetrics;

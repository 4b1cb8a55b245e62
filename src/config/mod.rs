//! Configuration Module - TOML-based Worker Configuration
//!
//! Loads and validates configuration from `config.toml`. Every field
//! has a default, so a missing file runs the worker with the standard
//! batch parameters. Vendor credentials never live here; they come
//! from the environment.

pub mod loader;

use serde::Deserialize;

/// Longest accepted staleness window (one year).
pub const MAX_STALENESS_HOURS: u64 = 24 * 365;

/// Top-level worker configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
  /// Batch selection and pacing.
  #[serde(default)]
  pub ingest: IngestConfig,
  /// Vendor endpoint.
  #[serde(default)]
  pub api: ApiConfig,
  /// Catalog storage.
  #[serde(default)]
  pub persistence: PersistenceConfig,
  /// Metrics export.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Batch selection and pacing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
  /// Retailer whose listings are refreshed.
  #[serde(default = "default_retailer")]
  pub retailer: String,
  /// Maximum listings per batch.
  #[serde(default = "default_batch_size")]
  pub batch_size: usize,
  /// Listings last fetched longer ago than this are due.
  #[serde(default = "default_staleness_hours")]
  pub staleness_hours: u64,
  /// Minimum seconds per listing round trip.
  #[serde(default = "default_min_spacing")]
  pub min_spacing_secs: u64,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

impl Default for IngestConfig {
  fn default() -> Self {
    Self {
      retailer: default_retailer(),
      batch_size: default_batch_size(),
      staleness_hours: default_staleness_hours(),
      min_spacing_secs: default_min_spacing(),
      log_level: default_log_level(),
    }
  }
}

/// Vendor endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// URL scheme of the lookup endpoint.
  #[serde(default = "default_scheme")]
  pub scheme: String,
  /// Host of the lookup endpoint.
  #[serde(default = "default_host")]
  pub host: String,
  /// Path of the lookup endpoint.
  #[serde(default = "default_path")]
  pub path: String,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      scheme: default_scheme(),
      host: default_host(),
      path: default_path(),
      timeout_seconds: default_timeout(),
    }
  }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Directory for the catalog snapshot and the price event log.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
    }
  }
}

/// Metrics export configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Write the metrics textfile after each batch.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Textfile-collector output path.
  #[serde(default = "default_textfile_path")]
  pub textfile_path: String,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: default_true(),
      textfile_path: default_textfile_path(),
    }
  }
}

// Default value functions for serde

fn default_retailer() -> String {
  "amazon".to_string()
}

fn default_batch_size() -> usize {
  60
}

fn default_staleness_hours() -> u64 {
  3
}

fn default_min_spacing() -> u64 {
  9
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_scheme() -> String {
  "https".to_string()
}

fn default_host() -> String {
  "webservices.amazon.com".to_string()
}

fn default_path() -> String {
  "/onca/xml".to_string()
}

fn default_timeout() -> u64 {
  30
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_true() -> bool {
  true
}

fn default_textfile_path() -> String {
  "data/ingest.prom".to_string()
}

//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::{AppConfig, MAX_STALENESS_HOURS};

/// Load and validate configuration from a TOML file.
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    retailer = %config.ingest.retailer,
    batch_size = config.ingest.batch_size,
    staleness_hours = config.ingest.staleness_hours,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Load the configuration, falling back to defaults when the file is absent.
///
/// A file that exists but fails to parse or validate is still an error.
pub fn load_config_or_default(path: &str) -> Result<AppConfig> {
  if Path::new(path).exists() {
    return load_config(path);
  }

  let config = AppConfig::default();
  validate_config(&config)?;
  info!(path, "No config file found, using defaults");
  Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).with_context(|| "Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  // Ingest validation
  anyhow::ensure!(
    !config.ingest.retailer.trim().is_empty(),
    "Retailer must not be empty"
  );
  anyhow::ensure!(
    config.ingest.batch_size > 0,
    "batch_size must be positive, got {}",
    config.ingest.batch_size
  );
  anyhow::ensure!(
    config.ingest.staleness_hours > 0 && config.ingest.staleness_hours <= MAX_STALENESS_HOURS,
    "staleness_hours must be in (0, {MAX_STALENESS_HOURS}], got {}",
    config.ingest.staleness_hours
  );

  // API validation
  anyhow::ensure!(
    matches!(config.api.scheme.as_str(), "http" | "https"),
    "API scheme must be http or https, got {}",
    config.api.scheme
  );
  anyhow::ensure!(!config.api.host.is_empty(), "API host must not be empty");
  anyhow::ensure!(
    config.api.path.starts_with('/'),
    "API path must start with '/', got {}",
    config.api.path
  );
  anyhow::ensure!(
    config.api.timeout_seconds > 0,
    "timeout_seconds must be positive"
  );

  // Persistence validation
  anyhow::ensure!(
    !config.persistence.data_dir.is_empty(),
    "data_dir must not be empty"
  );

  if config.metrics.enabled {
    anyhow::ensure!(
      !config.metrics.textfile_path.is_empty(),
      "Metrics textfile_path must not be empty when metrics are enabled"
    );
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_missing_file_yields_defaults() {
    let config = load_config_or_default("definitely-not-here.toml").unwrap();
    assert_eq!(config.ingest.batch_size, 60);
    assert_eq!(config.ingest.min_spacing_secs, 9);
    assert_eq!(config.api.host, "webservices.amazon.com");
    assert_eq!(config.persistence.data_dir, "data");
  }

  #[test]
  fn test_partial_file_keeps_defaults() {
    let config = parse_config(
      r#"
        [ingest]
        batch_size = 10

        [api]
        host = "webservices.amazon.co.uk"
      "#,
    )
    .unwrap();
    assert_eq!(config.ingest.batch_size, 10);
    assert_eq!(config.ingest.staleness_hours, 3);
    assert_eq!(config.api.host, "webservices.amazon.co.uk");
    assert_eq!(config.api.path, "/onca/xml");
    assert!(config.metrics.enabled);
  }

  #[test]
  fn test_rejects_invalid_values() {
    assert!(parse_config("[ingest]\nbatch_size = 0\n").is_err());
    assert!(parse_config("[api]\nscheme = \"ftp\"\n").is_err());
    assert!(parse_config("[api]\npath = \"onca/xml\"\n").is_err());
    assert!(parse_config("[ingest]\nstaleness_hours = 18446744073709551615\n").is_err());
    assert!(parse_config("[ingest]\nstaleness_hours = 8761\n").is_err());
    assert!(parse_config("[ingest]\nstaleness_hours = 8760\n").is_ok());
  }
}

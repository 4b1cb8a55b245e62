//! Snapshot File - Atomic JSON Catalog Persistence
//!
//! Saves the catalog (listings, variants, price records) to
//! `catalog.json` using atomic writes (write to tmp file, then rename).
//! The file is always either the old or the new version, never a
//! partial write.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::domain::listing::Listing;
use crate::domain::price::PriceRecord;
use crate::domain::variant::Variant;

/// Everything the shared store holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub listings: Vec<Listing>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub prices: Vec<PriceRecord>,
}

/// Atomic JSON snapshot of the catalog.
pub struct SnapshotFile {
    /// Path to catalog.json.
    path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
}

impl SnapshotFile {
    /// Create a snapshot file handle in the given data directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let dir = Path::new(data_dir);
        fs::create_dir_all(dir)
            .await
            .context("Failed to create data directory")?;

        Ok(Self {
            path: dir.join("catalog.json"),
            tmp_path: dir.join("catalog.json.tmp"),
        })
    }

    /// Save the catalog atomically (tmp → rename).
    #[instrument(skip(self, data), fields(prices = data.prices.len()))]
    pub async fn save(&self, data: &CatalogData) -> Result<()> {
        let json = serde_json::to_string_pretty(data).context("Failed to serialize catalog")?;

        fs::write(&self.tmp_path, &json)
            .await
            .context("Failed to write tmp catalog file")?;

        fs::rename(&self.tmp_path, &self.path)
            .await
            .context("Failed to rename catalog file")?;

        debug!(path = %self.path.display(), "Catalog snapshot saved");
        Ok(())
    }

    /// Load the catalog.
    ///
    /// Returns `None` if no snapshot exists yet.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Option<CatalogData>> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No catalog file found, starting empty");
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)
            .await
            .context("Failed to read catalog file")?;

        let data: CatalogData =
            serde_json::from_str(&json).context("Failed to parse catalog JSON")?;

        info!(
            listings = data.listings.len(),
            variants = data.variants.len(),
            prices = data.prices.len(),
            "Catalog snapshot loaded"
        );

        Ok(Some(data))
    }

    /// Check if the snapshot file is readable (absent is fine).
    pub async fn is_healthy(&self) -> bool {
        if !self.path.exists() {
            return true;
        }
        fs::metadata(&self.path).await.is_ok()
    }
}

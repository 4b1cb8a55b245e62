//! History Log - Append-only JSONL Price Events
//!
//! Persists every price-history mutation to daily JSONL files in the
//! format `history/YYYY-MM-DD.jsonl`. Each line is a self-contained JSON
//! record, giving an audit trail of inserts, in-place refreshes and
//! listing deletions independent of the catalog snapshot.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::listing::{Condition, ListingId};
use crate::domain::price::PriceRecord;

/// What happened to the price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceEventKind {
    /// A new current record was inserted.
    Inserted,
    /// The current record was refreshed in place.
    Refreshed,
    /// The listing and its records were deleted.
    ListingDeleted,
}

/// One line of the history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEvent {
    pub kind: PriceEventKind,
    pub listing_id: ListingId,
    pub condition: Option<Condition>,
    pub record_id: Option<Uuid>,
    pub total: Option<Decimal>,
    pub currency: Option<String>,
    /// Records removed with a deleted listing.
    pub removed_records: Option<usize>,
    pub at: DateTime<Utc>,
}

impl PriceEvent {
    pub fn for_record(kind: PriceEventKind, record: &PriceRecord) -> Self {
        Self {
            kind,
            listing_id: record.listing_id,
            condition: Some(record.condition),
            record_id: Some(record.id),
            total: record.total,
            currency: record.currency.clone(),
            removed_records: None,
            at: record.observed_at,
        }
    }

    pub fn listing_deleted(listing_id: ListingId, removed: usize, at: DateTime<Utc>) -> Self {
        Self {
            kind: PriceEventKind::ListingDeleted,
            listing_id,
            condition: None,
            record_id: None,
            total: None,
            currency: None,
            removed_records: Some(removed),
            at,
        }
    }
}

/// Append-only JSONL price event log with daily file rotation.
pub struct HistoryLog {
    /// Directory for the daily files.
    history_dir: PathBuf,
}

impl HistoryLog {
    /// Create a new history log in the given data directory.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let history_dir = Path::new(data_dir).join("history");

        fs::create_dir_all(&history_dir)
            .await
            .context("Failed to create history directory")?;

        Ok(Self { history_dir })
    }

    /// Append an event to the file of the day it happened.
    #[instrument(skip(self, event), fields(listing_id = event.listing_id, kind = ?event.kind))]
    pub async fn append(&self, event: &PriceEvent) -> Result<()> {
        let date = event.at.format("%Y-%m-%d").to_string();
        let path = self.history_dir.join(format!("{date}.jsonl"));

        let mut json = serde_json::to_string(event).context("Failed to serialize price event")?;
        json.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .context("Failed to open history log file")?;

        file.write_all(json.as_bytes())
            .await
            .context("Failed to write price event")?;

        file.flush().await.context("Failed to flush history log")?;

        Ok(())
    }

    /// Load all events from all daily files, oldest first.
    #[instrument(skip(self))]
    pub async fn load_all(&self) -> Result<Vec<PriceEvent>> {
        let mut events = Vec::new();
        let mut entries = fs::read_dir(&self.history_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "jsonl") {
                let content = fs::read_to_string(&path).await?;
                for line in content.lines() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<PriceEvent>(line) {
                        Ok(event) => events.push(event),
                        Err(e) => {
                            warn!(
                                file = %path.display(),
                                error = %e,
                                "Skipping malformed price event"
                            );
                        }
                    }
                }
            }
        }

        events.sort_by_key(|e| e.at);
        info!(count = events.len(), "Loaded price events");
        Ok(events)
    }

    /// Check if the history directory is writable.
    pub async fn is_healthy(&self) -> bool {
        let test_path = self.history_dir.join(".health_check");
        let result = fs::write(&test_path, b"ok").await;
        let _ = fs::remove_file(&test_path).await;
        result.is_ok()
    }
}

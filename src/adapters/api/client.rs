//! Marketplace HTTP Client - Single-shot Signed Lookups
//!
//! Wraps reqwest for item lookups: one GET per listing, the whole body
//! read and parsed into the generic XML tree, then decoded into the
//! typed lookup schema. No retries here; the scheduler simply picks a
//! failed listing up again on a later run.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::{debug, warn};

use super::signer::RequestSigner;
use super::xml::{XmlTree, parse_document};
use crate::domain::error::IngestError;
use crate::domain::listing::Listing;
use crate::domain::lookup::LookupResponse;
use crate::ports::marketplace::Marketplace;

/// Configuration for the marketplace HTTP client.
#[derive(Debug, Clone)]
pub struct MarketplaceClientConfig {
  /// Whole-request timeout.
  pub timeout: Duration,
  /// User agent sent with every request.
  pub user_agent: String,
}

impl Default for MarketplaceClientConfig {
  fn default() -> Self {
    Self {
      timeout: Duration::from_secs(30),
      user_agent: concat!("pricewatch-ingest/", env!("CARGO_PKG_VERSION")).to_string(),
    }
  }
}

/// HTTP client for signed item lookups.
pub struct MarketplaceClient {
  /// Underlying HTTP client.
  http: Client,
  /// Builds the signed lookup URL per listing.
  signer: RequestSigner,
}

impl MarketplaceClient {
  /// Create a new marketplace client.
  pub fn new(signer: RequestSigner, config: &MarketplaceClientConfig) -> Result<Self, IngestError> {
    let http = Client::builder()
      .timeout(config.timeout)
      .user_agent(config.user_agent.clone())
      .pool_max_idle_per_host(1)
      .build()
      .map_err(|e| IngestError::Configuration(format!("failed to build HTTP client: {e}")))?;

    Ok(Self { http, signer })
  }

  /// GET a signed URL and parse the body into the generic tree.
  ///
  /// Non-success statuses are transport failures, except when the body
  /// is the vendor's own error document (signature mismatch, throttling),
  /// which is returned so the caller sees the vendor error code.
  pub async fn get_tree(&self, url: &str) -> Result<XmlTree, IngestError> {
    let started = Instant::now();

    let response = self.http.get(url).send().await.map_err(|e| {
      let kind = if e.is_timeout() { "timed out" } else { "failed" };
      IngestError::Transport(format!("request {kind}: {e}"))
    })?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| IngestError::Transport(format!("failed to read body: {e}")))?;

    debug!(
      status = %status,
      bytes = body.len(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "Marketplace response received"
    );

    if !status.is_success() {
      if let Ok(tree) = parse_document(&body) {
        if tree.contains("ItemLookupErrorResponse") {
          warn!(status = %status, "Marketplace returned an error document");
          return Ok(tree);
        }
      }
      return Err(IngestError::Transport(format!("HTTP {status}")));
    }

    parse_document(&body)
  }
}

#[async_trait]
impl Marketplace for MarketplaceClient {
  async fn lookup(&self, listing: &Listing) -> Result<LookupResponse, IngestError> {
    let url = self.signer.signed_url(&listing.identifier, Utc::now());
    let tree = self.get_tree(&url).await?;
    LookupResponse::try_from(&tree)
  }
}

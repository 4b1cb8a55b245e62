//! Marketplace Request Signing — HMAC-SHA256 Signed Queries
//!
//! Every item lookup is a GET whose query string carries an HMAC-SHA256
//! signature over the canonical request. Credentials come from
//! environment variables (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY,
//! AMAZON_ASSOCIATE_TAG).
//!
//! Canonical request:
//! `GET\n<host>\n<path>\n<k=v pairs sorted by name, joined by &>`
//! with every value percent-encoded per RFC 3986.

use base64::Engine;
use chrono::{DateTime, Utc};

use crate::domain::error::IngestError;

/// Env var holding the access key.
pub const ENV_ACCESS_KEY: &str = "AWS_ACCESS_KEY_ID";
/// Env var holding the secret key (never sent over the wire).
pub const ENV_SECRET_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// Env var holding the partner (associate) tag.
pub const ENV_PARTNER_TAG: &str = "AMAZON_ASSOCIATE_TAG";

const SERVICE: &str = "AWSECommerceService";
const OPERATION: &str = "ItemLookup";
const ID_TYPE: &str = "ASIN";
const CONDITION_FILTER: &str = "All";
const RESPONSE_GROUPS: &str = "Images,ItemAttributes,OfferFull,SalesRank";
const METHOD: &str = "GET";

/// Process-wide marketplace credentials.
#[derive(Clone)]
pub struct Credentials {
    /// Access key, sent as `AWSAccessKeyId`.
    access_key: String,
    /// Secret key; only ever used to key the HMAC.
    secret_key: String,
    /// Partner tag, sent as `AssociateTag`.
    partner_tag: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("partner_tag", &self.partner_tag)
            .finish()
    }
}

impl Credentials {
    /// Build credentials, rejecting empty values.
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        partner_tag: impl Into<String>,
    ) -> Result<Self, IngestError> {
        let credentials = Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            partner_tag: partner_tag.into(),
        };
        for (name, value) in [
            (ENV_ACCESS_KEY, &credentials.access_key),
            (ENV_SECRET_KEY, &credentials.secret_key),
            (ENV_PARTNER_TAG, &credentials.partner_tag),
        ] {
            if value.trim().is_empty() {
                return Err(IngestError::Configuration(format!("{name} is empty")));
            }
        }
        Ok(credentials)
    }

    /// Load credentials from environment variables.
    ///
    /// Required env vars: AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY,
    /// AMAZON_ASSOCIATE_TAG.
    pub fn from_env() -> Result<Self, IngestError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load credentials through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, IngestError> {
        let var = |name: &str| {
            lookup(name).ok_or_else(|| IngestError::Configuration(format!("{name} not set")))
        };
        Self::new(var(ENV_ACCESS_KEY)?, var(ENV_SECRET_KEY)?, var(ENV_PARTNER_TAG)?)
    }
}

/// Where signed requests are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: String,
    pub host: String,
    pub path: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            host: "webservices.amazon.com".to_string(),
            path: "/onca/xml".to_string(),
        }
    }
}

/// Builds signed item-lookup URLs.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: Credentials,
    endpoint: Endpoint,
}

impl RequestSigner {
    pub const fn new(credentials: Credentials, endpoint: Endpoint) -> Self {
        Self {
            credentials,
            endpoint,
        }
    }

    /// Unencoded lookup parameters for one item, in no particular order.
    pub fn query_params(&self, identifier: &str, at: DateTime<Utc>) -> Vec<(&'static str, String)> {
        vec![
            ("Service", SERVICE.to_string()),
            ("Operation", OPERATION.to_string()),
            ("AWSAccessKeyId", self.credentials.access_key.clone()),
            ("AssociateTag", self.credentials.partner_tag.clone()),
            ("ItemId", identifier.to_string()),
            ("IdType", ID_TYPE.to_string()),
            ("Condition", CONDITION_FILTER.to_string()),
            ("ResponseGroup", RESPONSE_GROUPS.to_string()),
            ("Timestamp", at.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        ]
    }

    /// Encoded parameters sorted by name and joined with `&`.
    pub fn canonical_query(&self, identifier: &str, at: DateTime<Utc>) -> String {
        let mut params = self.query_params(identifier, at);
        params.sort_by(|a, b| a.0.cmp(b.0));
        params
            .iter()
            .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// The exact text the signature is computed over.
    pub fn string_to_sign(&self, canonical_query: &str) -> String {
        format!(
            "{METHOD}\n{}\n{}\n{canonical_query}",
            self.endpoint.host, self.endpoint.path
        )
    }

    /// Base64 HMAC-SHA256 of a message, keyed by the secret.
    pub fn sign(&self, message: &str) -> String {
        let mac = hmac_sha256::HMAC::mac(message.as_bytes(), self.credentials.secret_key.as_bytes());
        base64::engine::general_purpose::STANDARD.encode(mac)
    }

    /// Fully qualified signed URL for one item at the given instant.
    ///
    /// Deterministic for identical inputs.
    pub fn signed_url(&self, identifier: &str, at: DateTime<Utc>) -> String {
        let query = self.canonical_query(identifier, at);
        let signature = self.sign(&self.string_to_sign(&query));
        format!(
            "{}://{}{}?{query}&Signature={}",
            self.endpoint.scheme,
            self.endpoint.host,
            self.endpoint.path,
            urlencoding::encode(&signature)
        )
    }
}

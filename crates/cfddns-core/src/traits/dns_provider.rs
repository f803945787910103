// # DNS Provider Trait
//
// Defines the interface for reading and overwriting DNS records via provider APIs.
//
// ## Implementations
//
// - Cloudflare: `cfddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use cfddns_core::{DnsProvider, RecordUpdate};
//
// let provider = /* DnsProvider implementation */;
//
// if let Some(record) = provider.get_record("zone-id", "home.example.com").await? {
//     let update = RecordUpdate::from_record(&record, "203.0.113.5").with_proxied(false);
//     provider.update_record(&update).await?;
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// TTL written when the caller does not pick one
pub const DEFAULT_TTL: u32 = 120;

/// A DNS record as reported by the provider
///
/// Only `content`, `ttl` and `proxied` are ever changed by cfddns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned record ID
    pub id: String,
    /// Zone the record belongs to
    pub zone_id: String,
    /// Fully qualified record name
    pub name: String,
    /// Record type ("A", "AAAA", ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Current record content (an IP address for A/AAAA records)
    pub content: String,
    /// Time-to-live, if reported
    #[serde(default)]
    pub ttl: Option<u32>,
    /// Proxy flag, if reported
    #[serde(default)]
    pub proxied: Option<bool>,
}

/// Everything needed to overwrite one record
///
/// Built from an existing [`DnsRecord`] so the record identity carries over
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub record_id: String,
    pub zone_id: String,
    pub name: String,
    pub record_type: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
}

impl RecordUpdate {
    /// Create an update with the default TTL (120) and proxying enabled
    pub fn new(
        record_id: impl Into<String>,
        zone_id: impl Into<String>,
        name: impl Into<String>,
        record_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            zone_id: zone_id.into(),
            name: name.into(),
            record_type: record_type.into(),
            content: content.into(),
            ttl: DEFAULT_TTL,
            proxied: true,
        }
    }

    /// Create an update that rewrites `record` with new content
    pub fn from_record(record: &DnsRecord, content: impl Into<String>) -> Self {
        Self::new(
            record.id.clone(),
            record.zone_id.clone(),
            record.name.clone(),
            record.record_type.clone(),
            content,
        )
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the proxy flag
    pub fn with_proxied(mut self, proxied: bool) -> Self {
        self.proxied = proxied;
        self
    }
}

/// Trait for DNS provider implementations
///
/// Providers are stateless and single-shot: one API call per method
/// invocation, no retries, no caching. Whether an update is needed is decided
/// by the [`Reconciler`](crate::Reconciler), never by the provider.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Fetch the record with exactly this name in the zone
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))`: The first matching record
    /// - `Ok(None)`: The provider answered but had no match (or a non-success status)
    /// - `Err(Error)`: The request itself failed (transport, decoding)
    async fn get_record(
        &self,
        zone_id: &str,
        domain_name: &str,
    ) -> Result<Option<DnsRecord>, crate::Error>;

    /// Overwrite a record's content, TTL and proxy flag
    ///
    /// Implementations log the outcome themselves. An `Err` carries the
    /// provider's raw error payload.
    async fn update_record(&self, update: &RecordUpdate) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

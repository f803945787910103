// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare implementation of `DnsProvider`.
//
// ## Behavior
//
// - One HTTP request per call (GET to read, PUT to write)
// - No retries, no backoff, no caching: the next scheduled cycle is the retry
// - Authenticates with the account email and global API key
//   (`X-Auth-Email` / `X-Auth-Key`)
// - Dry-run mode performs reads and logs the PUT it would have sent
//
// ## Security Requirements
//
// - Credentials NEVER appear in logs or Debug output
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use cfddns_core::traits::{DnsProvider, DnsRecord, RecordUpdate};
use cfddns_core::{Credentials, DdnsConfig, Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Envelope of every Cloudflare API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    result: Option<T>,
}

/// Body of a record update
#[derive(Debug, Serialize)]
struct UpdatePayload<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    proxied: bool,
}

impl<'a> From<&'a RecordUpdate> for UpdatePayload<'a> {
    fn from(update: &'a RecordUpdate) -> Self {
        Self {
            record_type: &update.record_type,
            name: &update.name,
            content: &update.content,
            ttl: update.ttl,
            proxied: update.proxied,
        }
    }
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests
/// - Log the intended PUT payload
/// - **NOT** actually modify DNS records
pub struct CloudflareProvider {
    /// Account credentials
    /// ⚠️ NEVER log these values
    credentials: Credentials,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("credentials", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `credentials`: Account email and API key
    /// - `timeout`: Applied to every API request
    /// - `dry_run`: If true, perform GET requests but skip PUT updates
    pub fn new(credentials: Credentials, timeout: Duration, dry_run: bool) -> Result<Self> {
        credentials.validate()?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a provider from the daemon configuration
    ///
    /// Dry-run is enabled by `engine.dry_run` or by `CFDDNS_MODE=dry-run`.
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        let dry_run = config.engine.dry_run
            || std::env::var("CFDDNS_MODE")
                .unwrap_or_default()
                .eq_ignore_ascii_case("dry-run");

        if dry_run {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }

        Self::new(
            config.credentials.clone(),
            Duration::from_secs(config.engine.request_timeout_secs),
            dry_run,
        )
    }

    /// Point the provider at a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether PUTs are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("X-Auth-Email", &self.credentials.email)
            .header("X-Auth-Key", &self.credentials.api_key)
            .header("Content-Type", "application/json")
    }
}

/// Describe a failed response, keeping the provider's raw payload
fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
    let hint = match status.as_u16() {
        400 => "Bad request",
        401 | 403 => "Authentication failed: invalid credentials or insufficient permissions",
        404 => "Zone or record not found",
        409 => "Conflict: record is being updated by another process",
        429 => "Rate limit exceeded",
        500..=599 => "Cloudflare server error (transient)",
        _ => "Unexpected response",
    };
    format!("{} ({}): {}", hint, status, body)
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// Look up a record by exact name
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=home.example.com
    /// X-Auth-Email: <email>
    /// X-Auth-Key: <key>
    /// ```
    async fn get_record(&self, zone_id: &str, domain_name: &str) -> Result<Option<DnsRecord>> {
        tracing::debug!("Looking up DNS record: {} in zone {}", domain_name, zone_id);

        let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);
        let response = self
            .authorized(self.client.get(&url))
            .query(&[("name", domain_name)])
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {}", e)))?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            tracing::warn!(
                "Record lookup for {} failed: {}",
                domain_name,
                describe_failure(status, &error_text)
            );
            return Ok(None);
        }

        let body: ApiResponse<Vec<DnsRecord>> = response
            .json()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("Failed to parse response: {}", e)))?;

        let record = body.result.unwrap_or_default().into_iter().next();
        if let Some(ref record) = record {
            tracing::debug!(
                "Found record {} ({}) -> {}",
                record.name,
                record.record_type,
                record.content
            );
        }
        Ok(record)
    }

    /// Overwrite a record
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// {
    ///   "type": "A",
    ///   "name": "home.example.com",
    ///   "content": "203.0.113.5",
    ///   "ttl": 120,
    ///   "proxied": true
    /// }
    /// ```
    async fn update_record(&self, update: &RecordUpdate) -> Result<()> {
        let url = format!(
            "{}/zones/{}/dns_records/{}",
            self.base_url, update.zone_id, update.record_id
        );
        let payload = UpdatePayload::from(update);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(&payload)?
            );
            return Ok(());
        }

        let response = self
            .authorized(self.client.put(&url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {}", e)))?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            tracing::error!("Failed to update DNS record: {}", error_text);
            return Err(Error::provider(
                "cloudflare",
                describe_failure(status, &error_text),
            ));
        }

        tracing::info!(
            "DNS record updated successfully: {} ({}) -> {}",
            update.name,
            update.record_type,
            update.content
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

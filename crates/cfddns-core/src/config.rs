//! Configuration types for cfddns
//!
//! Everything here is parsed and validated once at startup and is immutable
//! afterwards. The reconciler and scheduler only ever borrow it.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Public IP echo services queried when none are configured, in priority order
pub const DEFAULT_IP_SERVICES: &[&str] = &["https://adresameaip.ro/ip", "https://api.ipify.org"];

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Provider credentials
    pub credentials: Credentials,

    /// Domains to keep in sync, processed in this order
    pub domains: Vec<DomainTarget>,

    /// IP echo services, tried in this order
    #[serde(default = "default_ip_services")]
    pub ip_services: Vec<String>,

    /// Connectivity probe settings
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a configuration with default services and engine settings
    pub fn new(credentials: Credentials, domains: Vec<DomainTarget>) -> Self {
        Self {
            credentials,
            domains,
            ip_services: default_ip_services(),
            probe: ProbeConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.credentials.validate()?;

        if self.domains.is_empty() {
            return Err(Error::config("No domains configured"));
        }
        for domain in &self.domains {
            domain.validate()?;
        }

        if self.ip_services.is_empty() {
            return Err(Error::config("At least one IP check service is required"));
        }
        for service in &self.ip_services {
            if !service.starts_with("https://") && !service.starts_with("http://") {
                return Err(Error::config(format!(
                    "IP check service must use HTTP or HTTPS scheme. Got: {}",
                    service
                )));
            }
        }

        self.probe.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// Provider credentials, forwarded verbatim on every API request
///
/// The Debug implementation never exposes the values.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email (`X-Auth-Email`)
    pub email: String,
    /// Global API key (`X-Auth-Key`)
    pub api_key: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            api_key: api_key.into(),
        }
    }

    /// Fail fast on empty values; the contents are otherwise opaque
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(Error::config("Account email cannot be empty"));
        }
        if self.api_key.trim().is_empty() {
            return Err(Error::config("API key cannot be empty"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &"<REDACTED>")
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

/// One DNS name to keep pointed at the public IP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTarget {
    /// Zone the record lives in
    pub zone_id: String,

    /// Exact record name (e.g. "home.example.com")
    pub domain: String,

    /// Whether traffic is routed through the provider's proxy
    #[serde(default = "default_proxied")]
    pub proxied: bool,
}

impl DomainTarget {
    pub fn new(zone_id: impl Into<String>, domain: impl Into<String>, proxied: bool) -> Self {
        Self {
            zone_id: zone_id.into(),
            domain: domain.into(),
            proxied,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.zone_id.trim().is_empty() {
            return Err(Error::invalid_input(format!(
                "Zone ID cannot be empty for domain '{}'",
                self.domain
            )));
        }
        validate_domain_name(&self.domain)
    }
}

/// Parses the command-line domain blob, e.g.
/// `{"zone_id": "abc", "domain": "example.com", "proxied": true}`.
///
/// Single quotes and `True`/`False` literals are accepted as well.
impl FromStr for DomainTarget {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let normalized = normalize_blob(raw);
        let target: DomainTarget = serde_json::from_str(&normalized)
            .map_err(|e| Error::invalid_input(format!("Invalid domain specification '{}': {}", raw, e)))?;
        target.validate()?;
        Ok(target)
    }
}

/// Rewrite a loosely quoted blob into strict JSON
fn normalize_blob(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut word = String::new();
    let mut in_string = false;
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        let c = if c == '\'' { '"' } else { c };

        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if c.is_ascii_alphabetic() {
            word.push(c);
            continue;
        }

        flush_literal(&mut word, &mut out);
        if c == '"' {
            in_string = true;
        }
        out.push(c);
    }
    flush_literal(&mut word, &mut out);

    out
}

fn flush_literal(word: &mut String, out: &mut String) {
    match word.as_str() {
        "True" => out.push_str("true"),
        "False" => out.push_str("false"),
        "None" => out.push_str("null"),
        other => out.push_str(other),
    }
    word.clear();
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks. A leading `*` label is allowed for wildcard records.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::invalid_input("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(Error::invalid_input(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for (index, label) in domain.split('.').enumerate() {
        if label.is_empty() {
            return Err(Error::invalid_input(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if index == 0 && label == "*" {
            continue;
        }

        if label.len() > 63 {
            return Err(Error::invalid_input(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(Error::invalid_input(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::invalid_input(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// Connectivity probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Well-known host to resolve and connect to
    #[serde(default = "default_probe_host")]
    pub host: String,

    /// TCP port to connect to
    #[serde(default = "default_probe_port")]
    pub port: u16,

    /// Connect timeout (in seconds)
    #[serde(default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProbeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::config("Probe host cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("Probe timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: default_probe_host(),
            port: default_probe_port(),
            timeout_secs: default_probe_timeout_secs(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between reconciliation cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Timeout applied to every HTTP request (in seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// TTL written with every update. 1 means "automatic" on Cloudflare.
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Read records but log updates instead of sending them
    #[serde(default)]
    pub dry_run: bool,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(10..=86_400).contains(&self.interval_secs) {
            return Err(Error::config(format!(
                "Interval must be between 10 and 86400 seconds. Got: {}",
                self.interval_secs
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::config("Request timeout must be > 0"));
        }
        if self.ttl != 1 && !(30..=86_400).contains(&self.ttl) {
            return Err(Error::config(format!(
                "TTL must be 1 (automatic) or between 30 and 86400. Got: {}",
                self.ttl
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            ttl: default_ttl(),
            dry_run: false,
        }
    }
}

fn default_ip_services() -> Vec<String> {
    DEFAULT_IP_SERVICES.iter().map(|s| s.to_string()).collect()
}

fn default_proxied() -> bool {
    true
}

fn default_probe_host() -> String {
    "www.cloudflare.com".to_string()
}

fn default_probe_port() -> u16 {
    80
}

fn default_probe_timeout_secs() -> u64 {
    3
}

fn default_interval_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_ttl() -> u32 {
    crate::traits::dns_provider::DEFAULT_TTL
}

// # HTTP IP Source
//
// This crate provides the network-facing collaborators of the reconciler:
//
// - [`HttpIpResolver`]: asks a prioritized list of "what is my IP" services
// - [`TcpConnectivityProbe`]: checks that a well-known host is reachable
//
// ## Architecture
//
// Echo services are tried strictly in order. The first one that answers
// `200 OK` with a non-empty body wins and no further service is contacted.
// Timeouts, connection errors and other statuses move on to the next service.
// Running out of services is not an error: the reconciler simply skips the
// cycle.

mod probe;

pub use probe::TcpConnectivityProbe;

use async_trait::async_trait;
use cfddns_core::traits::PublicIpSource;
use cfddns_core::{DdnsConfig, Error, Result};
use reqwest::StatusCode;
use std::time::Duration;

/// Public IP resolver backed by HTTP echo services
#[derive(Debug, Clone)]
pub struct HttpIpResolver {
    /// Echo service URLs, in priority order
    services: Vec<String>,

    /// HTTP client (carries the per-request timeout)
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a resolver over the given services
    ///
    /// # Parameters
    ///
    /// - `services`: URLs returning the caller's IP as a plain-text body
    /// - `timeout`: Applied to every request
    pub fn new(services: Vec<String>, timeout: Duration) -> Result<Self> {
        if services.is_empty() {
            return Err(Error::config("At least one IP check service is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { services, client })
    }

    /// Create a resolver from the daemon configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        Self::new(
            config.ip_services.clone(),
            Duration::from_secs(config.engine.request_timeout_secs),
        )
    }

    /// The configured services, in priority order
    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// Ask a single service for the public IP
    async fn query(&self, service: &str) -> Result<String> {
        let response = self
            .client
            .get(service)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request failed: {}", e)))?;

        if response.status() != StatusCode::OK {
            return Err(Error::http(format!("HTTP error: {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        let ip = body.trim();
        if ip.is_empty() {
            return Err(Error::http("Empty response body"));
        }

        Ok(ip.to_string())
    }
}

#[async_trait]
impl PublicIpSource for HttpIpResolver {
    async fn resolve(&self) -> Option<String> {
        for service in &self.services {
            match self.query(service).await {
                Ok(ip) => {
                    tracing::debug!("Public IP {} from {}", ip, service);
                    return Some(ip);
                }
                Err(e) => {
                    tracing::warn!("IP check service {} failed: {}", service, e);
                }
            }
        }

        None
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

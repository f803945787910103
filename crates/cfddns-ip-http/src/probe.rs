// # TCP Connectivity Probe
//
// Resolves a well-known host and opens (then drops) a TCP connection to it.
// Both steps are bounded by the probe timeout. IPv4 candidates are tried
// before IPv6 ones, and the first address that accepts a connection wins.

use async_trait::async_trait;
use cfddns_core::traits::ConnectivityProbe;
use cfddns_core::{ProbeConfig, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpStream, lookup_host};
use tokio::time::timeout;

/// Connectivity probe backed by a TCP connect
#[derive(Debug, Clone)]
pub struct TcpConnectivityProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpConnectivityProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(
            config.host.clone(),
            config.port,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Resolve the probe host, IPv4 addresses first
    async fn resolve(&self) -> Result<Vec<SocketAddr>> {
        let addrs = timeout(self.timeout, lookup_host((self.host.as_str(), self.port)))
            .await
            .map_err(|_| {
                cfddns_core::Error::http(format!("Resolving {} timed out", self.host))
            })??;

        Ok(ipv4_first(addrs))
    }

    /// Try each candidate in order until one accepts a connection
    ///
    /// The probe timeout bounds the whole attempt, not each address.
    async fn connect_any(&self, addrs: &[SocketAddr]) -> Option<SocketAddr> {
        let attempt = async {
            for addr in addrs {
                match TcpStream::connect(*addr).await {
                    Ok(_stream) => return Some(*addr),
                    Err(e) => {
                        tracing::debug!("Failed to connect to {} ({}): {}", self.host, addr, e);
                    }
                }
            }
            None
        };

        match timeout(self.timeout, attempt).await {
            Ok(connected) => connected,
            Err(_) => {
                tracing::debug!("Connecting to {} timed out after {:?}", self.host, self.timeout);
                None
            }
        }
    }
}

/// Order resolved addresses IPv4 first, keeping resolver order within each family
fn ipv4_first(addrs: impl IntoIterator<Item = SocketAddr>) -> Vec<SocketAddr> {
    let mut addrs: Vec<SocketAddr> = addrs.into_iter().collect();
    addrs.sort_by_key(|addr| !addr.is_ipv4());
    addrs
}

impl Default for TcpConnectivityProbe {
    fn default() -> Self {
        Self::from_config(&ProbeConfig::default())
    }
}

#[async_trait]
impl ConnectivityProbe for TcpConnectivityProbe {
    async fn has_connectivity(&self) -> bool {
        let addrs = match self.resolve().await {
            Ok(addrs) if addrs.is_empty() => {
                tracing::warn!("{} resolved to no addresses", self.host);
                return false;
            }
            Ok(addrs) => addrs,
            Err(e) => {
                tracing::warn!("Failed to resolve {}: {}", self.host, e);
                return false;
            }
        };

        match self.connect_any(&addrs).await {
            Some(addr) => {
                tracing::debug!("Connectivity confirmed via {} ({})", self.host, addr);
                true
            }
            None => {
                tracing::warn!(
                    "Could not connect to {} on any of {} address(es)",
                    self.host,
                    addrs.len()
                );
                false
            }
        }
    }
}

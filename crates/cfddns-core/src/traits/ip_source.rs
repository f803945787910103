// # Public IP Source Trait
//
// Defines the interface for discovering the caller's externally visible address.
//
// ## Implementations
//
// - Prioritized HTTP echo services: `cfddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use cfddns_core::PublicIpSource;
//
// let source = /* PublicIpSource implementation */;
// match source.resolve().await {
//     Some(ip) => println!("public IP: {ip}"),
//     None => println!("no service answered, skipping this cycle"),
// }
// ```

use async_trait::async_trait;

/// Trait for public IP sources
///
/// The result is transient: it is recomputed every cycle and never persisted.
/// The value is compared verbatim against record content, so implementations
/// should return it trimmed.
#[async_trait]
pub trait PublicIpSource: Send + Sync {
    /// Resolve the current public IP
    ///
    /// # Returns
    ///
    /// - `Some(ip)`: The first successful answer
    /// - `None`: Nothing answered. This is not an error, the caller skips the cycle.
    async fn resolve(&self) -> Option<String>;

    /// Short name for logging
    fn source_name(&self) -> &'static str;
}

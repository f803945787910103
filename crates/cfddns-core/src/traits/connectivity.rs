// # Connectivity Probe Trait
//
// Answers a single question before a cycle touches any external service:
// can we reach the network at all?
//
// ## Implementations
//
// - TCP connect to a well-known host: `cfddns-ip-http` crate

use async_trait::async_trait;

/// Trait for connectivity probes
///
/// The answer is advisory. A wrong answer never corrupts state, it only decides
/// whether the current cycle runs.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Returns `true` only if outbound connectivity was demonstrated.
    ///
    /// Implementations must never panic or return errors; every failure is `false`.
    async fn has_connectivity(&self) -> bool;
}

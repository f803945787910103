// # cfddns-core
//
// Core library for the cfddns reconciliation loop.
//
// ## Architecture Overview
//
// This library keeps DNS records pointed at the host's public IP:
// - **ConnectivityProbe**: Trait gating each cycle on network reachability
// - **PublicIpSource**: Trait for discovering the current public IP
// - **DnsProvider**: Trait for reading and updating DNS records via provider APIs
// - **Reconciler**: Runs one detect → compare → update cycle across all domains
// - **Scheduler**: Fires the reconciler on a fixed, non-overlapping cadence
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Decision logic lives here, I/O lives in plugin crates
// 2. **Stateless Cycles**: Nothing is carried between cycles except configuration
// 3. **Idempotency**: A record is only written when its content differs
// 4. **Isolation**: One domain's failure never blocks the others
// 5. **Library-First**: The daemon is a thin wrapper around this crate

pub mod config;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod traits;

// Re-export core types for convenience
pub use config::{Credentials, DdnsConfig, DomainTarget, EngineConfig, ProbeConfig};
pub use engine::{CycleOutcome, CycleReport, DomainOutcome, DomainReport, Reconciler, SkipReason};
pub use error::{Error, Result};
pub use scheduler::Scheduler;
pub use traits::{ConnectivityProbe, DnsProvider, DnsRecord, PublicIpSource, RecordUpdate};

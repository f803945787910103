//! Core traits for cfddns
//!
//! This module defines the seams between the reconciler and the outside world.
//!
//! - [`ConnectivityProbe`]: Is the network reachable at all?
//! - [`PublicIpSource`]: What is our public IP right now?
//! - [`DnsProvider`]: Read and overwrite DNS records

pub mod connectivity;
pub mod dns_provider;
pub mod ip_source;

pub use connectivity::ConnectivityProbe;
pub use dns_provider::{DnsProvider, DnsRecord, RecordUpdate};
pub use ip_source::PublicIpSource;

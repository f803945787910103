//! Reconciliation engine
//!
//! The [`Reconciler`] runs one reconciliation cycle:
//! - Checking connectivity via a ConnectivityProbe
//! - Resolving the public IP via a PublicIpSource
//! - Reading, comparing and (if needed) rewriting each configured record via a DnsProvider
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌────────────────┐
//! │ConnectivityProbe │   │ PublicIpSource │
//! └──────────────────┘   └────────────────┘
//!          │ once                 │ once
//!          └──────────┬───────────┘
//!                     ▼
//!              ┌────────────┐
//!              │ Reconciler │── per domain ──┐
//!              └────────────┘                │
//!                                            ▼
//!                            ┌───────────────────────────────┐
//!                            │ DnsProvider                   │
//!                            │ get_record → compare → update │
//!                            └───────────────────────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. No connectivity → skip the cycle
//! 2. No public IP → skip the cycle
//! 3. For every domain, in order: read, compare, write if different
//!
//! Domains are isolated from each other: a missing record or failed write
//! for one domain never prevents the next one from being processed.

use crate::config::{DdnsConfig, DomainTarget};
use crate::error::Result;
use crate::traits::{ConnectivityProbe, DnsProvider, PublicIpSource, RecordUpdate};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

/// Why a cycle stopped before touching any record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The connectivity probe failed
    NoConnectivity,
    /// Every IP echo service failed
    NoPublicIp,
}

/// What happened to a single domain during a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainOutcome {
    /// Record content was rewritten
    Updated {
        previous: String,
        current: String,
    },

    /// Record already held the public IP, nothing was sent
    Unchanged,

    /// The provider had no record for the domain, or the lookup failed
    RecordMissing {
        /// Transport/decoding error, if the lookup itself failed
        cause: Option<String>,
    },

    /// The provider rejected the write
    UpdateFailed {
        error: String,
    },
}

/// Per-domain entry of a [`CycleReport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    pub domain: String,
    pub outcome: DomainOutcome,
}

/// Overall result of a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cycle stopped before any record was read
    Skipped(SkipReason),

    /// Every domain was processed
    Completed {
        public_ip: String,
        domains: Vec<DomainReport>,
    },
}

/// Result of one reconciliation cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    /// Reports for every processed domain (empty for skipped cycles)
    pub fn domains(&self) -> &[DomainReport] {
        match &self.outcome {
            CycleOutcome::Completed { domains, .. } => domains,
            CycleOutcome::Skipped(_) => &[],
        }
    }

    /// The reason the cycle was skipped, if it was
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self.outcome {
            CycleOutcome::Skipped(reason) => Some(reason),
            CycleOutcome::Completed { .. } => None,
        }
    }

    /// Number of records rewritten in this cycle
    pub fn updated_count(&self) -> usize {
        self.count(|o| matches!(o, DomainOutcome::Updated { .. }))
    }

    /// Number of records that already matched
    pub fn unchanged_count(&self) -> usize {
        self.count(|o| matches!(o, DomainOutcome::Unchanged))
    }

    /// Number of domains that could not be read or written
    pub fn failed_count(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                DomainOutcome::RecordMissing { .. } | DomainOutcome::UpdateFailed { .. }
            )
        })
    }

    fn count(&self, predicate: impl Fn(&DomainOutcome) -> bool) -> usize {
        self.domains().iter().filter(|d| predicate(&d.outcome)).count()
    }
}

/// Reconciliation engine
///
/// Stateless between cycles: everything it holds is immutable configuration
/// and the collaborators it was built with.
pub struct Reconciler {
    /// Connectivity gate
    probe: Box<dyn ConnectivityProbe>,

    /// Public IP lookup
    ip_source: Box<dyn PublicIpSource>,

    /// DNS provider for reading and updating records
    provider: Box<dyn DnsProvider>,

    /// Domains to reconcile, in order
    domains: Vec<DomainTarget>,

    /// TTL written with every update
    ttl: u32,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `probe`: Connectivity probe implementation
    /// - `ip_source`: Public IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `config`: Validated on construction
    pub fn new(
        probe: Box<dyn ConnectivityProbe>,
        ip_source: Box<dyn PublicIpSource>,
        provider: Box<dyn DnsProvider>,
        config: DdnsConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            probe,
            ip_source,
            provider,
            domains: config.domains,
            ttl: config.engine.ttl,
        })
    }

    /// Domains this reconciler manages
    pub fn domains(&self) -> &[DomainTarget] {
        &self.domains
    }

    /// Run one reconciliation cycle
    ///
    /// Never fails: every failure is logged and reflected in the report, and
    /// the next scheduled cycle acts as the retry.
    pub async fn run_cycle(&self) -> CycleReport {
        let started_at = Utc::now();
        let outcome = self.reconcile().await;

        CycleReport {
            started_at,
            finished_at: Utc::now(),
            outcome,
        }
    }

    async fn reconcile(&self) -> CycleOutcome {
        if !self.probe.has_connectivity().await {
            error!("No internet connection. Skipping check and update.");
            return CycleOutcome::Skipped(SkipReason::NoConnectivity);
        }

        let Some(public_ip) = self.ip_source.resolve().await else {
            error!("Failed to retrieve public IP. Skipping check and update.");
            return CycleOutcome::Skipped(SkipReason::NoPublicIp);
        };
        debug!(
            "Public IP {} (via {})",
            public_ip,
            self.ip_source.source_name()
        );

        let mut domains = Vec::with_capacity(self.domains.len());
        for target in &self.domains {
            let outcome = self.reconcile_domain(target, &public_ip).await;
            domains.push(DomainReport {
                domain: target.domain.clone(),
                outcome,
            });
        }

        CycleOutcome::Completed { public_ip, domains }
    }

    /// Read, compare and (if needed) write a single domain
    ///
    /// Issues at most one update per call.
    async fn reconcile_domain(&self, target: &DomainTarget, public_ip: &str) -> DomainOutcome {
        let record = match self.provider.get_record(&target.zone_id, &target.domain).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                error!("DNS record for {} not found.", target.domain);
                return DomainOutcome::RecordMissing { cause: None };
            }
            Err(e) => {
                error!("DNS record for {} not found: {}", target.domain, e);
                return DomainOutcome::RecordMissing {
                    cause: Some(e.to_string()),
                };
            }
        };

        if record.content == public_ip {
            info!(
                "IP addresses are the same for {}. No update needed.",
                target.domain
            );
            return DomainOutcome::Unchanged;
        }

        let update = RecordUpdate::from_record(&record, public_ip)
            .with_ttl(self.ttl)
            .with_proxied(target.proxied);

        match self.provider.update_record(&update).await {
            Ok(()) => DomainOutcome::Updated {
                previous: record.content,
                current: public_ip.to_string(),
            },
            Err(e) => {
                debug!(
                    "Update of {} via {} failed: {}",
                    target.domain,
                    self.provider.provider_name(),
                    e
                );
                DomainOutcome::UpdateFailed {
                    error: e.to_string(),
                }
            }
        }
    }
}

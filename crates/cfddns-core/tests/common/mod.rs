//! Test doubles and common utilities for reconciliation contract tests
//!
//! Every double is cheap to clone and shares its counters with its clones,
//! so a test can keep a handle after boxing one into a `Reconciler`.

#![allow(dead_code)]

use cfddns_core::error::{Error, Result};
use cfddns_core::traits::{ConnectivityProbe, DnsProvider, DnsRecord, PublicIpSource, RecordUpdate};
use cfddns_core::{Credentials, DdnsConfig, DomainTarget, Reconciler};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A probe with a fixed answer
#[derive(Clone)]
pub struct StaticProbe {
    online: bool,
    calls: Arc<AtomicUsize>,
}

impl StaticProbe {
    pub fn online() -> Self {
        Self {
            online: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn offline() -> Self {
        Self {
            online: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ConnectivityProbe for StaticProbe {
    async fn has_connectivity(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.online
    }
}

/// An IP source with a fixed answer
#[derive(Clone)]
pub struct StaticIpSource {
    ip: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn new(ip: &str) -> Self {
        Self {
            ip: Some(ip.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            ip: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PublicIpSource for StaticIpSource {
    async fn resolve(&self) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ip.clone()
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// An in-memory provider that records every call
#[derive(Clone, Default)]
pub struct MockDnsProvider {
    /// Records keyed by (zone_id, name)
    records: Arc<Mutex<HashMap<(String, String), DnsRecord>>>,
    /// Names whose lookup fails at the transport level
    broken_reads: Arc<Mutex<HashSet<String>>>,
    /// Names whose update is rejected
    rejected_writes: Arc<Mutex<HashSet<String>>>,
    /// Names passed to get_record, in call order
    reads: Arc<Mutex<Vec<String>>>,
    /// Updates sent, in call order
    updates: Arc<Mutex<Vec<RecordUpdate>>>,
    /// Simulated latency of every read
    read_delay: Duration,
    /// Reads currently running and the peak seen
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    /// Seed an A record
    pub fn with_record(self, zone_id: &str, name: &str, id: &str, content: &str) -> Self {
        let record = DnsRecord {
            id: id.to_string(),
            zone_id: zone_id.to_string(),
            name: name.to_string(),
            record_type: "A".to_string(),
            content: content.to_string(),
            ttl: Some(300),
            proxied: Some(false),
        };
        self.records
            .lock()
            .unwrap()
            .insert((zone_id.to_string(), name.to_string()), record);
        self
    }

    pub fn with_broken_read(self, name: &str) -> Self {
        self.broken_reads.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn with_rejected_write(self, name: &str) -> Self {
        self.rejected_writes.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<RecordUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn content_of(&self, zone_id: &str, name: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .get(&(zone_id.to_string(), name.to_string()))
            .map(|r| r.content.clone())
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn get_record(&self, zone_id: &str, domain_name: &str) -> Result<Option<DnsRecord>> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        self.reads.lock().unwrap().push(domain_name.to_string());
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.broken_reads.lock().unwrap().contains(domain_name) {
            return Err(Error::http("connection reset"));
        }

        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(zone_id.to_string(), domain_name.to_string()))
            .cloned())
    }

    async fn update_record(&self, update: &RecordUpdate) -> Result<()> {
        self.updates.lock().unwrap().push(update.clone());

        if self.rejected_writes.lock().unwrap().contains(&update.name) {
            return Err(Error::provider(
                "mock",
                r#"400 Bad Request - {"success":false,"errors":[{"code":9005}]}"#,
            ));
        }

        let key = (update.zone_id.clone(), update.name.clone());
        if let Some(record) = self.records.lock().unwrap().get_mut(&key) {
            record.content = update.content.clone();
            record.ttl = Some(update.ttl);
            record.proxied = Some(update.proxied);
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a minimal valid config for the given targets
pub fn config_for(domains: Vec<DomainTarget>) -> DdnsConfig {
    DdnsConfig::new(Credentials::new("ops@example.com", "test-key"), domains)
}

/// Helper to build a reconciler from clones of the given doubles
pub fn reconciler(
    probe: &StaticProbe,
    ip_source: &StaticIpSource,
    provider: &MockDnsProvider,
    domains: Vec<DomainTarget>,
) -> Reconciler {
    Reconciler::new(
        Box::new(probe.clone()),
        Box::new(ip_source.clone()),
        Box::new(provider.clone()),
        config_for(domains),
    )
    .expect("reconciler construction succeeds")
}

/// Formatted log output collected by a thread-scoped subscriber
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Route this thread's events (DEBUG and above) into the capture
    ///
    /// Events stop being captured once the returned guard is dropped.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }

    /// Captured lines logged at the given level
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.split_whitespace().next() == Some(level))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

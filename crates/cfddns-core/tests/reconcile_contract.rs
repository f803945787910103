//! Contract Test: Single-Domain Reconciliation
//!
//! Constraints verified:
//! - No write is issued when the record already holds the public IP
//! - A differing record gets exactly one write carrying the new content
//! - The write preserves the record's id, zone, name and type
//! - The target's proxied flag is forwarded
//! - A failed connectivity probe or IP lookup stops the cycle before any read
//! - The user-visible log lines for each outcome are emitted exactly once

mod common;

use cfddns_core::{DomainOutcome, DomainTarget, SkipReason};
use common::*;

#[tokio::test]
async fn equal_ip_issues_no_write() {
    let probe = StaticProbe::online();
    let ip_source = StaticIpSource::new("203.0.113.5");
    let provider =
        MockDnsProvider::new().with_record("zone-1", "home.example.com", "rec-1", "203.0.113.5");

    let reconciler = reconciler(
        &probe,
        &ip_source,
        &provider,
        vec![DomainTarget::new("zone-1", "home.example.com", true)],
    );

    let logs = LogCapture::default();
    let report = {
        let _guard = logs.install();
        reconciler.run_cycle().await
    };

    assert_eq!(provider.update_count(), 0, "Matching record must not be written");
    assert_eq!(report.domains().len(), 1);
    assert_eq!(report.domains()[0].outcome, DomainOutcome::Unchanged);

    let info = logs.lines_at("INFO");
    assert!(
        info.iter()
            .any(|line| line.ends_with("IP addresses are the same for home.example.com. No update needed.")),
        "Expected the no-update line, got:\n{}",
        logs.contents()
    );
}

#[tokio::test]
async fn differing_ip_issues_exactly_one_write_preserving_identity() {
    let probe = StaticProbe::online();
    let ip_source = StaticIpSource::new("203.0.113.5");
    let provider =
        MockDnsProvider::new().with_record("zone-1", "home.example.com", "rec-1", "203.0.113.1");

    let reconciler = reconciler(
        &probe,
        &ip_source,
        &provider,
        vec![DomainTarget::new("zone-1", "home.example.com", false)],
    );

    let report = reconciler.run_cycle().await;

    let updates = provider.updates();
    assert_eq!(updates.len(), 1, "Expected exactly one write, got {}", updates.len());

    let update = &updates[0];
    assert_eq!(update.record_id, "rec-1");
    assert_eq!(update.zone_id, "zone-1");
    assert_eq!(update.name, "home.example.com");
    assert_eq!(update.record_type, "A");
    assert_eq!(update.content, "203.0.113.5");
    assert_eq!(update.ttl, 120);
    assert!(!update.proxied, "Target's proxied flag must be forwarded");

    assert_eq!(
        report.domains()[0].outcome,
        DomainOutcome::Updated {
            previous: "203.0.113.1".to_string(),
            current: "203.0.113.5".to_string(),
        }
    );
    assert_eq!(
        provider.content_of("zone-1", "home.example.com").as_deref(),
        Some("203.0.113.5")
    );
}

#[tokio::test]
async fn second_cycle_after_update_is_a_no_op() {
    let probe = StaticProbe::online();
    let ip_source = StaticIpSource::new("203.0.113.5");
    let provider =
        MockDnsProvider::new().with_record("zone-1", "home.example.com", "rec-1", "203.0.113.1");

    let reconciler = reconciler(
        &probe,
        &ip_source,
        &provider,
        vec![DomainTarget::new("zone-1", "home.example.com", true)],
    );

    reconciler.run_cycle().await;
    let second = reconciler.run_cycle().await;

    assert_eq!(provider.update_count(), 1);
    assert_eq!(second.unchanged_count(), 1);
}

#[tokio::test]
async fn no_connectivity_skips_everything() {
    let probe = StaticProbe::offline();
    let ip_source = StaticIpSource::new("203.0.113.5");
    let provider =
        MockDnsProvider::new().with_record("zone-1", "home.example.com", "rec-1", "203.0.113.1");

    let reconciler = reconciler(
        &probe,
        &ip_source,
        &provider,
        vec![DomainTarget::new("zone-1", "home.example.com", true)],
    );

    let report = reconciler.run_cycle().await;

    assert_eq!(report.skip_reason(), Some(SkipReason::NoConnectivity));
    assert_eq!(probe.call_count(), 1);
    assert_eq!(ip_source.call_count(), 0, "IP must not be resolved while offline");
    assert!(provider.reads().is_empty());
    assert_eq!(provider.update_count(), 0);
}

#[tokio::test]
async fn missing_public_ip_skips_all_domains() {
    let probe = StaticProbe::online();
    let ip_source = StaticIpSource::unavailable();
    let provider =
        MockDnsProvider::new().with_record("zone-1", "home.example.com", "rec-1", "203.0.113.1");

    let reconciler = reconciler(
        &probe,
        &ip_source,
        &provider,
        vec![DomainTarget::new("zone-1", "home.example.com", true)],
    );

    let report = reconciler.run_cycle().await;

    assert_eq!(report.skip_reason(), Some(SkipReason::NoPublicIp));
    assert!(provider.reads().is_empty());
    assert_eq!(provider.update_count(), 0);
}

#[tokio::test]
async fn probe_and_ip_lookup_run_once_per_cycle() {
    let probe = StaticProbe::online();
    let ip_source = StaticIpSource::new("203.0.113.5");
    let provider = MockDnsProvider::new()
        .with_record("zone-1", "a.example.com", "rec-a", "203.0.113.5")
        .with_record("zone-1", "b.example.com", "rec-b", "203.0.113.5");

    let reconciler = reconciler(
        &probe,
        &ip_source,
        &provider,
        vec![
            DomainTarget::new("zone-1", "a.example.com", true),
            DomainTarget::new("zone-1", "b.example.com", true),
        ],
    );

    reconciler.run_cycle().await;

    assert_eq!(probe.call_count(), 1);
    assert_eq!(ip_source.call_count(), 1);
    assert_eq!(provider.reads(), vec!["a.example.com", "b.example.com"]);
}

#[tokio::test]
async fn skipped_cycles_log_the_reason() {
    let provider = MockDnsProvider::new();
    let domains = vec![DomainTarget::new("zone-1", "home.example.com", true)];

    let offline = reconciler(
        &StaticProbe::offline(),
        &StaticIpSource::new("203.0.113.5"),
        &provider,
        domains.clone(),
    );
    let no_ip = reconciler(
        &StaticProbe::online(),
        &StaticIpSource::unavailable(),
        &provider,
        domains,
    );

    let logs = LogCapture::default();
    {
        let _guard = logs.install();
        offline.run_cycle().await;
        no_ip.run_cycle().await;
    }

    let errors = logs.lines_at("ERROR");
    assert_eq!(errors.len(), 2, "Unexpected error lines:\n{}", logs.contents());
    assert!(errors[0].ends_with("No internet connection. Skipping check and update."));
    assert!(errors[1].ends_with("Failed to retrieve public IP. Skipping check and update."));
}

#[tokio::test]
async fn missing_record_is_logged_by_domain() {
    let provider = MockDnsProvider::new();

    let reconciler = reconciler(
        &StaticProbe::online(),
        &StaticIpSource::new("203.0.113.5"),
        &provider,
        vec![DomainTarget::new("zone-1", "gone.example.com", true)],
    );

    let logs = LogCapture::default();
    {
        let _guard = logs.install();
        reconciler.run_cycle().await;
    }

    let errors = logs.lines_at("ERROR");
    assert_eq!(errors.len(), 1, "Unexpected error lines:\n{}", logs.contents());
    assert!(errors[0].ends_with("DNS record for gone.example.com not found."));
}

#[tokio::test]
async fn rejected_write_leaves_error_logging_to_the_provider() {
    let provider = MockDnsProvider::new()
        .with_record("zone-1", "home.example.com", "rec-1", "203.0.113.1")
        .with_rejected_write("home.example.com");

    let reconciler = reconciler(
        &StaticProbe::online(),
        &StaticIpSource::new("203.0.113.5"),
        &provider,
        vec![DomainTarget::new("zone-1", "home.example.com", true)],
    );

    let logs = LogCapture::default();
    let report = {
        let _guard = logs.install();
        reconciler.run_cycle().await
    };

    assert_eq!(report.failed_count(), 1);
    assert!(
        logs.lines_at("ERROR").is_empty(),
        "Reconciler must not repeat the provider's error:\n{}",
        logs.contents()
    );
    assert!(
        logs.lines_at("DEBUG")
            .iter()
            .any(|line| line.contains("Update of home.example.com via mock failed")),
        "Expected a debug trace of the failure:\n{}",
        logs.contents()
    );
}

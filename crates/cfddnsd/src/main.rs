// # cfddnsd - cfddns Daemon
//
// This is a THIN integration layer. All decision logic lives in cfddns-core.
//
// The daemon is responsible for:
// 1. Reading configuration from the command line and environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the probe, IP resolver and Cloudflare provider into a Reconciler
// 4. Running the Scheduler until SIGINT/SIGTERM
//
// ## Example
//
// ```bash
// export CFDDNS_API_KEY=your_global_api_key
// export CFDDNS_EMAIL=you@example.com
//
// cfddnsd \
//   -d '{"zone_id": "023e105f4ecef8ad9ca31a8372d0c353", "domain": "home.example.com", "proxied": true}' \
//   -d "{'zone_id': '023e105f4ecef8ad9ca31a8372d0c353', 'domain': 'vpn.example.com', 'proxied': False}"
// ```

use anyhow::{Context, Result};
use cfddns_core::config::DEFAULT_IP_SERVICES;
use cfddns_core::{Credentials, DdnsConfig, DomainTarget, EngineConfig, ProbeConfig, Reconciler, Scheduler};
use cfddns_ip_http::{HttpIpResolver, TcpConnectivityProbe};
use cfddns_provider_cloudflare::CloudflareProvider;
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keep Cloudflare DNS records pointed at this host's public IP
#[derive(Debug, Parser)]
#[command(name = "cfddnsd", version, about)]
struct Cli {
    /// Your Cloudflare global API key
    #[arg(short = 'a', long = "api-key", alias = "api_key", env = "CFDDNS_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Your Cloudflare account email
    #[arg(short = 'e', long, env = "CFDDNS_EMAIL", hide_env_values = true)]
    email: String,

    /// Domain to keep in sync, repeatable.
    /// Example: {"zone_id": "id", "domain": "example.com", "proxied": true}
    #[arg(short = 'd', long = "domains", required = true)]
    domains: Vec<DomainTarget>,

    /// Public IP check services, tried in order
    #[arg(
        short = 'i',
        long = "ip-checker",
        alias = "ip_checker",
        env = "CFDDNS_IP_CHECKERS",
        value_delimiter = ',',
        num_args = 1..
    )]
    ip_checker: Vec<String>,

    /// Seconds between reconciliation cycles
    #[arg(long, env = "CFDDNS_INTERVAL_SECS", default_value_t = 300)]
    interval_secs: u64,

    /// Timeout for every HTTP request, in seconds
    #[arg(long, env = "CFDDNS_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// TTL written with every update (1 = automatic)
    #[arg(long, env = "CFDDNS_TTL", default_value_t = 120)]
    ttl: u32,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Read records but only log the updates that would be sent
    #[arg(long)]
    dry_run: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, env = "CFDDNS_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Build the validated library configuration
    fn into_config(self) -> Result<(DdnsConfig, bool, Level)> {
        let log_level = parse_log_level(&self.log_level)?;

        let ip_services = if self.ip_checker.is_empty() {
            DEFAULT_IP_SERVICES.iter().map(|s| s.to_string()).collect()
        } else {
            self.ip_checker
        };

        let config = DdnsConfig {
            credentials: Credentials::new(self.email, self.api_key),
            domains: self.domains,
            ip_services,
            probe: ProbeConfig::default(),
            engine: EngineConfig {
                interval_secs: self.interval_secs,
                request_timeout_secs: self.timeout_secs,
                ttl: self.ttl,
                dry_run: self.dry_run,
            },
        };
        config.validate()?;

        Ok((config, self.once, log_level))
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "CFDDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, once, log_level) = match cli.into_config() {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting cfddnsd");
    info!("Configuration loaded: {} domain(s)", config.domains.len());

    let scheduler = match build_scheduler(config) {
        Ok(scheduler) => scheduler,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(scheduler, once).await {
            error!("Daemon error: {:#}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Wire the collaborators together
fn build_scheduler(config: DdnsConfig) -> Result<Scheduler> {
    let probe = TcpConnectivityProbe::from_config(&config.probe);
    let resolver = HttpIpResolver::from_config(&config).context("Failed to create IP resolver")?;
    let provider =
        CloudflareProvider::from_config(&config).context("Failed to create Cloudflare provider")?;

    for target in &config.domains {
        info!(
            "Managing record: {} (zone {}, proxied: {})",
            target.domain, target.zone_id, target.proxied
        );
    }
    info!("IP check services: {}", resolver.services().join(", "));

    let interval = Duration::from_secs(config.engine.interval_secs);
    let reconciler = Reconciler::new(
        Box::new(probe),
        Box::new(resolver),
        Box::new(provider),
        config,
    )?;

    Ok(Scheduler::new(reconciler, interval))
}

/// Run the daemon
async fn run_daemon(scheduler: Scheduler, once: bool) -> Result<()> {
    if once {
        let report = scheduler.run_once().await;
        info!(
            "Cycle finished: {} updated, {} unchanged, {} failed",
            report.updated_count(),
            report.unchanged_count(),
            report.failed_count()
        );
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let signals = tokio::spawn(async move {
        let received = wait_for_shutdown().await;
        let _ = shutdown_tx.send(());
        received
    });

    info!("Running a cycle every {:?}", scheduler.interval());
    let cycles = scheduler.run_with_shutdown(shutdown_rx).await;

    let signal = signals.await.context("Signal handler task failed")??;
    info!("Received shutdown signal: {}", signal);
    info!("Shutting down after {} cycle(s)", cycles);

    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(received)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

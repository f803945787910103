//! Periodic, non-overlapping cycle scheduler
//!
//! The [`Scheduler`] fires [`Reconciler::run_cycle`] immediately and then once
//! per interval until shutdown. Cycles run inline on the scheduler task, so a
//! slow cycle delays the next one instead of overlapping it; ticks that were
//! missed in the meantime are skipped, not queued.
//!
//! Shutdown is only observed between cycles. A cycle that has started always
//! runs to completion.

use crate::engine::{CycleReport, Reconciler};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{info, warn};

/// Drives a [`Reconciler`] on a fixed cadence
pub struct Scheduler {
    reconciler: Reconciler,

    /// Time between cycle starts
    interval: Duration,

    /// Optional sink for per-cycle reports
    report_tx: Option<mpsc::Sender<CycleReport>>,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new(reconciler: Reconciler, interval: Duration) -> Self {
        Self {
            reconciler,
            interval,
            report_tx: None,
        }
    }

    /// Publish every cycle report on a bounded channel
    ///
    /// When the channel is full the report is dropped with a warning.
    pub fn with_report_channel(mut self, capacity: usize) -> (Self, mpsc::Receiver<CycleReport>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.report_tx = Some(tx);
        (self, rx)
    }

    /// The configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run exactly one cycle
    pub async fn run_once(&self) -> CycleReport {
        let report = self.reconciler.run_cycle().await;
        self.publish(&report);
        report
    }

    /// Run until the shutdown signal fires
    ///
    /// # Parameters
    ///
    /// - `shutdown_rx`: Fires (or is dropped) to stop the scheduler
    ///
    /// # Returns
    ///
    /// The number of cycles that ran.
    pub async fn run_with_shutdown(&self, mut shutdown_rx: oneshot::Receiver<()>) -> u64 {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = IntervalStream::new(interval);

        info!(
            "Scheduler started: {} domain(s), every {:?}",
            self.reconciler.domains().len(),
            self.interval
        );

        let mut cycles = 0u64;
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received");
                    break;
                }

                Some(_) = ticks.next() => {
                    let report = self.run_once().await;
                    cycles += 1;
                    info!(
                        "Cycle {} finished: {} updated, {} unchanged, {} failed{}",
                        cycles,
                        report.updated_count(),
                        report.unchanged_count(),
                        report.failed_count(),
                        match report.skip_reason() {
                            Some(reason) => format!(" (skipped: {:?})", reason),
                            None => String::new(),
                        }
                    );
                }
            }
        }

        info!("Scheduler stopped after {} cycle(s)", cycles);
        cycles
    }

    fn publish(&self, report: &CycleReport) {
        if let Some(tx) = &self.report_tx
            && tx.try_send(report.clone()).is_err()
        {
            warn!("Report channel full or closed, dropping cycle report");
        }
    }
}

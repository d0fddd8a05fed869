//! Fixed-cadence driver of distribution passes.

use crate::distributor::{Distributor, PassReport};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub succeeded: usize,
    pub failed: usize,
    pub rewards_granted: usize,
}

impl From<&PassReport> for PassSummary {
    fn from(report: &PassReport) -> Self {
        Self {
            started_at: report.started_at,
            finished_at: report.finished_at,
            succeeded: report.succeeded(),
            failed: report.failed(),
            rewards_granted: report.rewards_granted(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub passes_completed: u64,
    /// Passes that could not start because the accounts could not be listed.
    pub passes_failed: u64,
    pub last_pass: Option<PassSummary>,
}

pub struct PollScheduler {
    distributor: Distributor,
    poll_interval: Duration,
    shutdown_grace: Duration,
    stats: watch::Sender<SchedulerStats>,
}

impl PollScheduler {
    pub fn new(distributor: Distributor, poll_interval: Duration, shutdown_grace: Duration) -> Self {
        let (stats, _) = watch::channel(SchedulerStats::default());
        Self {
            distributor,
            poll_interval,
            shutdown_grace,
            stats,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerStats> {
        self.stats.subscribe()
    }

    /// Runs a pass every `poll_interval`, counted from the end of the
    /// previous pass, until `cancel` fires.
    ///
    /// A cancellation that arrives mid-pass waits up to `shutdown_grace` for
    /// the pass to finish before dropping it. Accounts already committed stay
    /// committed, the others are picked up again on the next start.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        info!(
            "Starting poll scheduler, interval {:?}, shutdown grace {:?}",
            self.poll_interval, self.shutdown_grace
        );

        loop {
            debug!("Next distribution pass in {:?}", self.poll_interval);
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Poll scheduler received shutdown signal");
                    break;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            let pass = self.distributor.distribute_pass();
            tokio::pin!(pass);

            tokio::select! {
                result = &mut pass => self.record(result),
                _ = cancel.cancelled() => {
                    info!(
                        "Poll scheduler received shutdown signal, waiting up to {:?} for the running pass",
                        self.shutdown_grace
                    );
                    match tokio::time::timeout(self.shutdown_grace, pass).await {
                        Ok(result) => self.record(result),
                        Err(_) => warn!("Running pass did not finish in time, abandoning it"),
                    }
                    break;
                }
            }
        }

        info!("Poll scheduler stopped");
        Ok(())
    }

    fn record(&self, result: Result<PassReport>) {
        match result {
            Ok(report) => {
                let summary = PassSummary::from(&report);
                self.stats.send_modify(|stats| {
                    stats.passes_completed += 1;
                    stats.last_pass = Some(summary);
                });
            }
            Err(e) => {
                error!("Distribution pass failed: {:#}", e);
                self.stats.send_modify(|stats| stats.passes_failed += 1);
            }
        }
    }
}

//! Scheduler loop — re-invokes the bootstrap attempt until it settles.
//!
//! Each attempt runs on the blocking pool since collaborators shell out
//! and touch the local database. Attempts are strictly serialized.

use std::time::Duration;

use roleboot_core::{BootstrapError, BootstrapOutcome, Completion, RoleBootstrap};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Why the scheduler stopped.
#[derive(Debug)]
pub enum SchedulerExit {
    Completed(Completion),
    Fatal(BootstrapError),
    Shutdown,
}

/// Drives a `RoleBootstrap` at a fixed interval.
pub struct BootstrapScheduler {
    bootstrap: RoleBootstrap,
    interval: Duration,
}

impl BootstrapScheduler {
    pub fn new(bootstrap: RoleBootstrap, interval: Duration) -> Self {
        Self {
            bootstrap,
            interval,
        }
    }

    /// Run one attempt off the async runtime.
    async fn tick(bootstrap: RoleBootstrap) -> anyhow::Result<(RoleBootstrap, BootstrapOutcome)> {
        let joined = tokio::task::spawn_blocking(move || {
            let mut bootstrap = bootstrap;
            let outcome = bootstrap.attempt();
            (bootstrap, outcome)
        })
        .await?;
        Ok(joined)
    }

    /// Attempt immediately, then every interval, until completion, a fatal
    /// failure, or shutdown.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<SchedulerExit> {
        let Self {
            mut bootstrap,
            interval,
        } = self;
        info!(node_id = %bootstrap.node_id(), ?interval, "bootstrap scheduler started");
        let mut listening = true;

        loop {
            let (b, outcome) = Self::tick(bootstrap).await?;
            bootstrap = b;

            match outcome {
                BootstrapOutcome::Completed(completion) => {
                    info!(node_id = %bootstrap.node_id(), ?completion, "bootstrap settled");
                    return Ok(SchedulerExit::Completed(completion));
                }
                BootstrapOutcome::Failed(e) if e.is_fatal() => {
                    error!(node_id = %bootstrap.node_id(), error = %e, "bootstrap failed permanently");
                    return Ok(SchedulerExit::Fatal(e));
                }
                BootstrapOutcome::Failed(e) => {
                    warn!(node_id = %bootstrap.node_id(), error = %e, "bootstrap attempt failed, will retry");
                }
                BootstrapOutcome::Deferred(reason) => {
                    debug!(node_id = %bootstrap.node_id(), phase = %bootstrap.phase(), %reason, "bootstrap deferred");
                }
            }

            let sleep = tokio::time::sleep(interval);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    _ = &mut sleep => break,
                    changed = shutdown.changed(), if listening => {
                        if changed.is_ok() {
                            info!("bootstrap scheduler shutting down");
                            return Ok(SchedulerExit::Shutdown);
                        }
                        // Sender dropped; no shutdown can arrive any more.
                        warn!("shutdown channel closed, continuing without it");
                        listening = false;
                    }
                }
            }
        }
    }
}

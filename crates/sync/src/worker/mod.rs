//! Background sync worker: replays the durable ledger against the server
//! independently of the foreground queue.
//!
//! The worker shares nothing with the foreground context except the ledger;
//! both tolerate records the other has already settled.

mod cache;

pub use cache::*;

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;

use sokoni_core::sync::{
    derive_endpoint, FailureOutcome, SyncLedger, BACKGROUND_MAX_RETRIES,
};

use crate::error::Result;
use crate::transport::{OutboundRequest, RequestTransport};

/// Background worker policy knobs. The retry ceiling is intentionally lower
/// than the foreground queue's; both are named configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub max_retries: i32,
    pub request_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_retries: BACKGROUND_MAX_RETRIES,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome counts for one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub attempted: usize,
    pub completed: usize,
    pub requeued: usize,
    pub failed: usize,
}

pub struct SyncWorker {
    ledger: Arc<dyn SyncLedger>,
    transport: Arc<dyn RequestTransport>,
    config: WorkerConfig,
}

impl SyncWorker {
    pub fn new(
        ledger: Arc<dyn SyncLedger>,
        transport: Arc<dyn RequestTransport>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            ledger,
            transport,
            config,
        }
    }

    /// Replay every pending ledger record against its derived endpoint.
    /// Records claimed or completed by the foreground queue count as
    /// completed here, not as errors.
    pub async fn run_sync(&self) -> Result<SyncReport> {
        let pending = self.ledger.pending_operations()?;
        if pending.is_empty() {
            return Ok(SyncReport::default());
        }
        info!("[SyncWorker] Replaying {} pending operations", pending.len());

        let mut report = SyncReport::default();
        for op in pending {
            report.attempted += 1;
            if !self.ledger.mark_processing(op.id).await? {
                report.completed += 1;
                continue;
            }

            let endpoint = derive_endpoint(op.operation, op.entity_type, &op.entity_id);
            let request = OutboundRequest {
                method: endpoint.method,
                path: endpoint.path,
                body: if op.data.is_null() {
                    None
                } else {
                    Some(op.data)
                },
                priority: op.priority,
                timeout: self.config.request_timeout,
            };
            match self.transport.send(request).await {
                Ok(_) => {
                    self.ledger.mark_completed(op.id).await?;
                    report.completed += 1;
                }
                Err(err) => {
                    warn!(
                        "[SyncWorker] Operation {} failed ({:?}): {}",
                        op.id,
                        err.retry_class(),
                        err
                    );
                    match self
                        .ledger
                        .record_failure(op.id, self.config.max_retries)
                        .await?
                    {
                        FailureOutcome::WillRetry { retry_count } => {
                            debug!(
                                "[SyncWorker] Operation {} will retry (attempt {})",
                                op.id, retry_count
                            );
                            report.requeued += 1;
                        }
                        FailureOutcome::Exhausted => {
                            error!(
                                "[SyncWorker] Operation {} failed permanently after {} attempts",
                                op.id, self.config.max_retries
                            );
                            report.failed += 1;
                        }
                        FailureOutcome::AlreadySettled => report.completed += 1,
                    }
                }
            }
        }
        Ok(report)
    }
}

/// Run the worker on a fixed cadence, standing in for platform background
/// sync triggers.
pub fn spawn_sync_loop(worker: Arc<SyncWorker>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match worker.run_sync().await {
                Ok(report) if report.attempted > 0 => {
                    info!(
                        "[SyncWorker] Pass done: {} completed, {} requeued, {} failed",
                        report.completed, report.requeued, report.failed
                    );
                }
                Ok(_) => {}
                Err(err) => error!("[SyncWorker] Sync pass failed: {}", err),
            }
        }
    })
}

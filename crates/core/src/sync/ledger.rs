//! Durable ledger contract.
//!
//! The ledger is the single shared-mutable resource between the foreground
//! queue and the background worker. Implementations must make every
//! read-modify-write a single atomic store operation; callers never hold a
//! record across two calls and patch it back.

use async_trait::async_trait;

use super::{NewSyncOperation, SyncOperation, SyncOperationPatch};
use crate::Result;

/// Outcome of an atomic failure record against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Retry count incremented, record back to `Pending`.
    WillRetry { retry_count: i32 },
    /// Retry ceiling reached, record marked `Failed`.
    Exhausted,
    /// The record was already gone or no longer pending; the other drain
    /// context got there first. Treated as success by callers.
    AlreadySettled,
}

#[async_trait]
pub trait SyncLedger: Send + Sync {
    /// Append a new record with `Pending` status and zero retries; returns
    /// the assigned id. Never coalesces with prior records.
    async fn add_operation(&self, operation: NewSyncOperation) -> Result<i32>;

    /// All `Pending` records in natural retrieval order. Priority ordering
    /// is the queue's job, not the store's.
    fn pending_operations(&self) -> Result<Vec<SyncOperation>>;

    /// Merge-patch one record. Silent no-op when the id does not exist.
    async fn update_operation(&self, id: i32, patch: SyncOperationPatch) -> Result<()>;

    /// Atomically transition a pending record to `Processing`. Returns false
    /// when the record is gone or not pending (the other context won).
    async fn mark_processing(&self, id: i32) -> Result<bool>;

    /// Atomically mark a record `Completed`. Tolerates a missing record.
    async fn mark_completed(&self, id: i32) -> Result<()>;

    /// Atomically record a failure: increment the retry count and either
    /// reset to `Pending` or mark `Failed` once `max_retries` is reached.
    async fn record_failure(&self, id: i32, max_retries: i32) -> Result<FailureOutcome>;

    /// Flip every `Processing` record back to `Pending`; returns how many
    /// were re-adopted. Startup recovery only: a crash between a claim and
    /// its settle call would otherwise strand the record forever. Never run
    /// this while either drain context is live.
    async fn requeue_stale_processing(&self) -> Result<usize>;

    /// Number of records still pending, for the UI banner.
    fn pending_count(&self) -> Result<i64>;

    /// Delete completed records; returns how many were pruned.
    async fn prune_completed(&self) -> Result<usize>;
}

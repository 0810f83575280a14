//! SyncLedger implementation over the sync_queue table.
//!
//! Both execution contexts (foreground queue, background worker) mutate the
//! ledger only through these atomic operations; no caller ever reads a row
//! and writes it back in a second call.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;

use sokoni_core::sync::{
    FailureOutcome, NewSyncOperation, SyncLedger, SyncOperation, SyncOperationPatch, SyncStatus,
};
use sokoni_core::Result;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::sync_queue;

use super::model::{enum_to_db, to_sync_operation, NewSyncOperationDB, SyncOperationDB};

pub struct SyncQueueRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SyncQueueRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SyncLedger for SyncQueueRepository {
    async fn add_operation(&self, operation: NewSyncOperation) -> Result<i32> {
        let row = NewSyncOperationDB {
            operation: enum_to_db(&operation.operation)?,
            entity_type: enum_to_db(&operation.entity_type)?,
            entity_id: operation.entity_id.to_string(),
            data: serde_json::to_string(&operation.data)?,
            timestamp: Utc::now().timestamp_millis(),
            status: enum_to_db(&SyncStatus::Pending)?,
            retry_count: 0,
            priority: i32::from(operation.priority),
        };
        self.writer
            .exec(move |conn| {
                let id = diesel::insert_into(sync_queue::table)
                    .values(&row)
                    .returning(sync_queue::id)
                    .get_result::<i32>(conn)
                    .map_err(StorageError::from)?;
                Ok(id)
            })
            .await
    }

    fn pending_operations(&self) -> Result<Vec<SyncOperation>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = sync_queue::table
            .filter(sync_queue::status.eq(enum_to_db(&SyncStatus::Pending)?))
            .load::<SyncOperationDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(to_sync_operation).collect()
    }

    async fn update_operation(&self, id: i32, patch: SyncOperationPatch) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let existing = sync_queue::table
                    .find(id)
                    .first::<SyncOperationDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?;
                // Missing id is a silent no-op, per the store contract.
                let Some(row) = existing else {
                    return Ok(());
                };

                let status = match patch.status {
                    Some(status) => enum_to_db(&status)?,
                    None => row.status,
                };
                let retry_count = patch.retry_count.unwrap_or(row.retry_count);
                let data = match patch.data {
                    Some(value) => serde_json::to_string(&value)?,
                    None => row.data,
                };

                diesel::update(sync_queue::table.find(id))
                    .set((
                        sync_queue::status.eq(status),
                        sync_queue::retry_count.eq(retry_count),
                        sync_queue::data.eq(data),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn mark_processing(&self, id: i32) -> Result<bool> {
        self.writer
            .exec(move |conn| {
                let claimed = diesel::update(
                    sync_queue::table
                        .find(id)
                        .filter(sync_queue::status.eq(enum_to_db(&SyncStatus::Pending)?)),
                )
                .set(sync_queue::status.eq(enum_to_db(&SyncStatus::Processing)?))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(claimed == 1)
            })
            .await
    }

    async fn mark_completed(&self, id: i32) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::update(sync_queue::table.find(id))
                    .set(sync_queue::status.eq(enum_to_db(&SyncStatus::Completed)?))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn record_failure(&self, id: i32, max_retries: i32) -> Result<FailureOutcome> {
        self.writer
            .exec(move |conn| {
                let existing = sync_queue::table
                    .find(id)
                    .first::<SyncOperationDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?;
                let Some(row) = existing else {
                    return Ok(FailureOutcome::AlreadySettled);
                };
                let completed = enum_to_db(&SyncStatus::Completed)?;
                let failed = enum_to_db(&SyncStatus::Failed)?;
                if row.status == completed || row.status == failed {
                    return Ok(FailureOutcome::AlreadySettled);
                }

                let retry_count = row.retry_count + 1;
                if retry_count >= max_retries {
                    diesel::update(sync_queue::table.find(id))
                        .set((
                            sync_queue::status.eq(failed),
                            sync_queue::retry_count.eq(retry_count),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    Ok(FailureOutcome::Exhausted)
                } else {
                    diesel::update(sync_queue::table.find(id))
                        .set((
                            sync_queue::status.eq(enum_to_db(&SyncStatus::Pending)?),
                            sync_queue::retry_count.eq(retry_count),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    Ok(FailureOutcome::WillRetry { retry_count })
                }
            })
            .await
    }

    async fn requeue_stale_processing(&self) -> Result<usize> {
        self.writer
            .exec(move |conn| {
                let requeued = diesel::update(
                    sync_queue::table
                        .filter(sync_queue::status.eq(enum_to_db(&SyncStatus::Processing)?)),
                )
                .set(sync_queue::status.eq(enum_to_db(&SyncStatus::Pending)?))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(requeued)
            })
            .await
    }

    fn pending_count(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let count = sync_queue::table
            .filter(sync_queue::status.eq(enum_to_db(&SyncStatus::Pending)?))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count)
    }

    async fn prune_completed(&self) -> Result<usize> {
        self.writer
            .exec(move |conn| {
                let deleted = diesel::delete(
                    sync_queue::table
                        .filter(sync_queue::status.eq(enum_to_db(&SyncStatus::Completed)?)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(deleted)
            })
            .await
    }
}

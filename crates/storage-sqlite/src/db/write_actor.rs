//! Single-writer actor for SQLite.
//!
//! All mutations funnel through one blocking task, each job wrapped in an
//! immediate transaction. This is what makes every ledger read-modify-write
//! a single atomic store operation across the foreground queue, the facade's
//! offline branch and the background worker.

use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use log::error;
use tokio::sync::{mpsc, oneshot};

use sokoni_core::{Error, Result};

use super::DbPool;
use crate::errors::{StorageError, TxError};

type WriteJob = Box<dyn FnOnce(&mut SqliteConnection) + Send + 'static>;

#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::UnboundedSender<WriteJob>,
}

impl WriteHandle {
    /// Run a job inside a single immediate transaction on the writer
    /// thread. The job's error rolls the transaction back.
    pub async fn exec<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel::<Result<T>>();
        let wrapped: WriteJob = Box::new(move |conn| {
            let outcome = conn
                .immediate_transaction::<T, TxError, _>(|tx_conn| job(tx_conn).map_err(TxError::App))
                .map_err(Error::from);
            let _ = done_tx.send(outcome);
        });

        self.tx
            .send(wrapped)
            .map_err(|_| StorageError::Writer("Write actor is gone".to_string()))?;
        done_rx
            .await
            .map_err(|_| StorageError::Writer("Write job dropped before completion".to_string()))?
    }
}

/// Spawn the writer actor on a dedicated blocking thread.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<WriteJob>();
    tokio::task::spawn_blocking(move || {
        while let Some(job) = rx.blocking_recv() {
            match pool.get() {
                Ok(mut conn) => job(&mut conn),
                // Dropping the job cancels its oneshot; the caller sees a
                // writer error instead of hanging.
                Err(e) => error!("[Storage] Writer could not get a connection: {}", e),
            }
        }
    });
    WriteHandle { tx }
}

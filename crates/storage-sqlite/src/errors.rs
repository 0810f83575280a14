//! Storage error types and conversions into the core error.

use sokoni_core::{DatabaseError, Error};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Query error: {0}")]
    Diesel(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Writer unavailable: {0}")]
    Writer(String),
}

impl From<r2d2::Error> for StorageError {
    fn from(err: r2d2::Error) -> Self {
        StorageError::Pool(err.to_string())
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Diesel(e) => Error::Database(DatabaseError::QueryFailed(e.to_string())),
            StorageError::Pool(e) => Error::Database(DatabaseError::PoolError(e)),
            StorageError::Migration(e) => Error::Database(DatabaseError::MigrationFailed(e)),
            StorageError::Writer(e) => Error::Database(DatabaseError::Internal(e)),
        }
    }
}

/// Transaction error shim: lets writer jobs return the core error while
/// diesel's transaction machinery still sees a `From<diesel::result::Error>`
/// type for rollback handling.
#[derive(Debug, Error)]
pub(crate) enum TxError {
    #[error(transparent)]
    App(Error),
    #[error(transparent)]
    Diesel(#[from] diesel::result::Error),
}

impl From<TxError> for Error {
    fn from(err: TxError) -> Self {
        match err {
            TxError::App(e) => e,
            TxError::Diesel(e) => StorageError::Diesel(e).into(),
        }
    }
}

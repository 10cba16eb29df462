//! Storage-specific error types.
//!
//! Diesel and r2d2 error types stay inside this crate; they are converted to
//! the database-agnostic `quotecache_core` errors at the boundary.

use diesel::result::Error as DieselError;
use thiserror::Error;

use quotecache_core::errors::{DatabaseError, Error};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Core error: {0}")]
    CoreError(String),
}

// For the write actor's transaction wrapper, which runs jobs returning core
// errors inside a diesel transaction.
impl From<Error> for StorageError {
    fn from(err: Error) -> Self {
        StorageError::CoreError(err.to_string())
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConnectionFailed(e) => {
                Error::Database(DatabaseError::ConnectionFailed(e.to_string()))
            }
            StorageError::PoolError(e) => {
                Error::Database(DatabaseError::PoolCreationFailed(e.to_string()))
            }
            StorageError::QueryFailed(e) => {
                Error::Database(DatabaseError::QueryFailed(e.to_string()))
            }
            StorageError::MigrationFailed(e) => {
                Error::Database(DatabaseError::MigrationFailed(e))
            }
            StorageError::CoreError(e) => Error::Unexpected(e),
        }
    }
}

/// Shortcut for converting diesel results into core results.
pub trait IntoCore<T> {
    fn into_core(self) -> quotecache_core::Result<T>;
}

impl<T> IntoCore<T> for Result<T, DieselError> {
    fn into_core(self) -> quotecache_core::Result<T> {
        self.map_err(|e| StorageError::QueryFailed(e).into())
    }
}

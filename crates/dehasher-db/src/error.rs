//! Database error types.
//!
//! Provides error handling for database operations using `thiserror`.

use thiserror::Error;

/// Database-specific errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to open or create database connection.
    #[error("failed to open database: {0}")]
    Open(String),

    /// Migration execution failed.
    #[error("migration failed: {0}")]
    Migration(String),

    /// A filter named a column that cannot be queried.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// Failed to decode database value.
    #[error("decode error: {0}")]
    Decode(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Some insert batches failed; the others were committed.
    #[error("{failed_batches} batch(es) failed, {inserted} rows inserted: {source}")]
    PartialStore {
        /// Rows inserted by the batches that committed
        inserted: u64,
        /// Number of batches rolled back
        failed_batches: usize,
        /// Error from the last failed batch
        #[source]
        source: Box<DatabaseError>,
    },

    /// Underlying `SQLx` error.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// I/O error during database operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DatabaseError> for dehasher_core::DehasherError {
    fn from(err: DatabaseError) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;

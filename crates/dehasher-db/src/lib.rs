//! Dehasher Database Layer
//!
//! Provides `SQLite` storage for breach records, extracted credentials,
//! search run history and sealed API keys.
//!
//! # Architecture
//!
//! - **Migrations**: SQL migrations are embedded and versioned using `SQLx`
//! - **Connection Pooling**: a small pool shared by every storage module
//! - **Idempotent writes**: records and credentials are inserted with
//!   `ON CONFLICT DO NOTHING`, in batches of 100 rows per transaction
//!
//! # Example
//!
//! ```ignore
//! use dehasher_db::Database;
//!
//! let db = Database::new("dehasher.db").await?;
//! db.run_migrations().await?;
//! let inserted = db.store_results(&records).await?;
//! ```
//!
//! The API key table only holds sealed bytes; encryption lives in
//! `dehasher-vault`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod api_keys;
pub mod connection;
pub mod credentials;
pub mod error;
pub mod migrations;
pub mod results;
pub mod runs;

// Re-export commonly used types
pub use api_keys::SealedKey;
pub use credentials::CredentialFilter;
pub use error::{DatabaseError, Result};
pub use results::{ResultColumn, ResultFilter};
pub use runs::{RunFilter, RunRecord};

use dehasher_core::{BreachRecord, Credential};
use sqlx::{Pool, Sqlite};
use std::path::Path;

/// High-level database interface.
///
/// Wraps the connection pool and forwards to the storage modules.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (or create) the database at `path`.
    ///
    /// # Arguments
    /// * `path` - Path to the database file (or `:memory:` for in-memory)
    ///
    /// # Errors
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let pool = connection::open_pool(path).await?;
        Ok(Self { pool })
    }

    /// Open the database at `path` and bring its schema up to date.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Self::new(path).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    /// Create a database instance from an existing pool.
    #[must_use]
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run all pending database migrations.
    ///
    /// # Errors
    /// Returns `DatabaseError::Migration` if any migration fails.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Get the current schema version.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the version cannot be queried.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(&self.pool).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Store breach records. See [`results::store_results`].
    pub async fn store_results(&self, records: &[BreachRecord]) -> Result<u64> {
        results::store_results(&self.pool, records).await
    }

    /// Store credential pairs. See [`credentials::store_credentials`].
    pub async fn store_credentials(&self, credentials: &[Credential]) -> Result<u64> {
        credentials::store_credentials(&self.pool, credentials).await
    }

    /// Persist a run summary. See [`runs::record_run`].
    pub async fn record_run(&self, run: &RunRecord) -> Result<()> {
        runs::record_run(&self.pool, run).await
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

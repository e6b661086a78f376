//! Database connection management.
//!
//! Opens the `SQLite` connection pool used by every storage module.

use crate::error::{DatabaseError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Maximum number of pooled connections.
const MAX_CONNECTIONS: u32 = 5;

/// Open a connection pool for the database at `path`.
///
/// `:memory:` opens a private in-memory database held on a single
/// connection. For file databases the parent directory is created if it is
/// missing.
///
/// # Errors
/// Returns `DatabaseError` if:
/// - The path is not valid UTF-8
/// - The parent directory cannot be created
/// - The database file cannot be opened
pub async fn open_pool(path: impl AsRef<Path>) -> Result<Pool<Sqlite>> {
    let path = path.as_ref();
    let path_str = path
        .to_str()
        .ok_or_else(|| DatabaseError::Open("invalid database path: not valid UTF-8".to_string()))?;

    let in_memory = path_str == ":memory:";
    if !in_memory {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut connect_options = SqliteConnectOptions::from_str(path_str)
        .map_err(|e| DatabaseError::Open(format!("invalid connection string: {e}")))?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));
    if !in_memory {
        connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
    }

    let mut pool_options = SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS);
    if in_memory {
        // every connection to `:memory:` is its own database
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(connect_options)
        .await
        .map_err(|e| DatabaseError::Open(format!("failed to open {path_str}: {e}")))?;

    tracing::debug!("Database pool opened at {}", path_str);
    Ok(pool)
}

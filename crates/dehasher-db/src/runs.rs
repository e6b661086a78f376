//! Search run history.
//!
//! Every executed search leaves one row behind, whether it finished,
//! was declined at the confirmation prompt, or failed mid-fetch.

use crate::error::{DatabaseError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{Pool, QueryBuilder, Sqlite};

/// Summary of one search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Unique identifier for this run
    pub id: String,
    /// Composite query sent to the provider
    pub query: String,
    /// Run configuration as JSON
    pub config: JsonValue,
    /// Final state name (`done` or `failed`)
    pub state: String,
    /// Records fetched
    pub fetched: i64,
    /// Records the provider reported as available
    pub total: i64,
    /// Provider credit balance after the last call
    pub balance: i64,
    /// Error message for failed runs
    pub error: Option<String>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
}

impl RunRecord {
    /// Start a record with a fresh id for the given query.
    #[must_use]
    pub fn new(query: impl Into<String>, config: JsonValue, started_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            query: query.into(),
            config,
            state: String::new(),
            fetched: 0,
            total: 0,
            balance: 0,
            error: None,
            started_at,
            finished_at: started_at,
        }
    }
}

/// Default number of runs listed.
pub const DEFAULT_RUN_LIMIT: i64 = 100;

/// Filter for [`list_runs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFilter {
    /// Only runs started at or after this instant
    pub start: Option<DateTime<Utc>>,
    /// Only runs started before this instant
    pub end: Option<DateTime<Utc>>,
    /// Case-insensitive substring of the composite query
    pub contains: Option<String>,
    /// Keep the newest `n` matches and list them oldest first
    pub last: Option<i64>,
    /// Maximum rows returned, newest first
    pub limit: i64,
}

impl Default for RunFilter {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            contains: None,
            last: None,
            limit: DEFAULT_RUN_LIMIT,
        }
    }
}

/// Persist a run summary.
///
/// # Errors
/// Returns `DatabaseError` if serialization or the insert fails.
pub async fn record_run(pool: &Pool<Sqlite>, run: &RunRecord) -> Result<()> {
    let config = serde_json::to_string(&run.config)
        .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;

    sqlx::query(
        "INSERT INTO runs (id, query, config, state, fetched, total, balance, error,
                           started_at, finished_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&run.id)
    .bind(&run.query)
    .bind(config)
    .bind(&run.state)
    .bind(run.fetched)
    .bind(run.total)
    .bind(run.balance)
    .bind(&run.error)
    .bind(run.started_at.to_rfc3339())
    .bind(run.finished_at.to_rfc3339())
    .execute(pool)
    .await?;

    tracing::debug!(run_id = %run.id, state = %run.state, "Recorded search run");
    Ok(())
}

type RunRow = (
    String,
    String,
    String,
    String,
    i64,
    i64,
    i64,
    Option<String>,
    String,
    String,
);

/// List runs matching `filter`.
///
/// Rows come back newest first, except with [`RunFilter::last`] set, where
/// the newest `n` are returned in chronological order.
///
/// # Errors
/// Returns `DatabaseError` if the query fails or a stored row cannot be decoded.
pub async fn list_runs(pool: &Pool<Sqlite>, filter: &RunFilter) -> Result<Vec<RunRecord>> {
    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT id, query, config, state, fetched, total, balance, error, started_at, finished_at
         FROM runs
         WHERE 1 = 1",
    );

    // Stored timestamps carry a variable number of fractional digits.
    if let Some(start) = filter.start {
        builder.push(" AND julianday(started_at) >= julianday(");
        builder.push_bind(start.to_rfc3339());
        builder.push(")");
    }
    if let Some(end) = filter.end {
        builder.push(" AND julianday(started_at) < julianday(");
        builder.push_bind(end.to_rfc3339());
        builder.push(")");
    }
    if let Some(needle) = filter.contains.as_deref().filter(|n| !n.is_empty()) {
        builder.push(" AND instr(lower(query), lower(");
        builder.push_bind(needle.to_string());
        builder.push(")) > 0");
    }

    builder.push(" ORDER BY started_at DESC LIMIT ");
    builder.push_bind(filter.last.unwrap_or(filter.limit).max(0));

    let rows: Vec<RunRow> = builder.build_query_as().fetch_all(pool).await?;

    let mut runs = rows
        .into_iter()
        .map(
            |(id, query, config, state, fetched, total, balance, error, started_at, finished_at)|
             -> Result<RunRecord> {
                Ok(RunRecord {
                    id,
                    query,
                    config: serde_json::from_str(&config)
                        .map_err(|e| DatabaseError::Decode(format!("invalid run config: {e}")))?,
                    state,
                    fetched,
                    total,
                    balance,
                    error,
                    started_at: parse_timestamp(&started_at)?,
                    finished_at: parse_timestamp(&finished_at)?,
                })
            },
        )
        .collect::<Result<Vec<_>>>()?;

    if filter.last.is_some() {
        runs.reverse();
    }
    Ok(runs)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Decode(format!("invalid timestamp '{s}': {e}")))
}

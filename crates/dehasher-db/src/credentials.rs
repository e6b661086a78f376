//! Credential pair storage.
//!
//! A credential row is unique on `(email, username, password)`; storing the
//! same triple twice keeps a single row.

use crate::error::Result;
use crate::results::{BatchTally, BATCH_SIZE, DEFAULT_LIMIT};
use dehasher_core::Credential;
use sqlx::{Pool, QueryBuilder, Sqlite};

/// Filter for [`query_credentials`].
#[derive(Debug, Clone)]
pub struct CredentialFilter {
    /// Email to match
    pub email: Option<String>,
    /// Username to match
    pub username: Option<String>,
    /// Password to match
    pub password: Option<String>,
    /// Exact match instead of substring
    pub exact: bool,
    /// Maximum number of rows returned
    pub limit: i64,
}

impl Default for CredentialFilter {
    fn default() -> Self {
        Self {
            email: None,
            username: None,
            password: None,
            exact: false,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Store credential pairs, skipping triples that are already present.
///
/// Batches are stored the same way as breach records: a failed batch is
/// logged and skipped. Returns the number of newly inserted rows.
///
/// # Errors
/// Returns `DatabaseError::PartialStore` if any batch failed.
pub async fn store_credentials(pool: &Pool<Sqlite>, credentials: &[Credential]) -> Result<u64> {
    let mut tally = BatchTally::default();
    for (index, batch) in credentials.chunks(BATCH_SIZE).enumerate() {
        tally.record("credentials", index, insert_credentials(pool, batch).await);
    }
    tally.finish("credentials", credentials.len())
}

async fn insert_credentials(pool: &Pool<Sqlite>, batch: &[Credential]) -> Result<u64> {
    let mut inserted = 0;
    let mut tx = pool.begin().await?;
    for credential in batch {
        let result = sqlx::query(
            "INSERT INTO credentials (email, username, password)
             VALUES (?, ?, ?)
             ON CONFLICT(email, username, password) DO NOTHING",
        )
        .bind(&credential.email)
        .bind(&credential.username)
        .bind(&credential.password)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }
    tx.commit().await?;
    Ok(inserted)
}

/// Query stored credential pairs.
///
/// # Errors
/// Returns `DatabaseError` if the query fails.
pub async fn query_credentials(
    pool: &Pool<Sqlite>,
    filter: &CredentialFilter,
) -> Result<Vec<Credential>> {
    let mut builder =
        QueryBuilder::<Sqlite>::new("SELECT email, username, password FROM credentials WHERE 1 = 1");

    for (column, value) in [
        ("email", &filter.email),
        ("username", &filter.username),
        ("password", &filter.password),
    ] {
        let Some(value) = value else { continue };
        if filter.exact {
            builder.push(format!(" AND {column} = "));
            builder.push_bind(value.clone());
        } else {
            builder.push(format!(" AND {column} LIKE '%' || "));
            builder.push_bind(value.clone());
            builder.push(" || '%'");
        }
    }

    builder.push(" ORDER BY id LIMIT ");
    builder.push_bind(filter.limit.max(0));

    let rows: Vec<(String, String, String)> = builder.build_query_as().fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|(email, username, password)| Credential {
            email,
            username,
            password,
        })
        .collect())
}

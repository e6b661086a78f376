//! Breach record storage and local querying.
//!
//! Records are keyed by the provider's record id; list-valued fields are
//! stored as JSON arrays so that `json_each` can match single elements.

use crate::error::{DatabaseError, Result};
use dehasher_core::BreachRecord;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use std::fmt;
use std::str::FromStr;

/// Rows inserted per transaction.
pub const BATCH_SIZE: usize = 100;

/// Default row limit for local queries.
pub const DEFAULT_LIMIT: i64 = 100;

/// Queryable columns of the `results` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultColumn {
    /// `email`
    Email,
    /// `ip_address`
    IpAddress,
    /// `username`
    Username,
    /// `password`
    Password,
    /// `hashed_password`
    HashedPassword,
    /// `name`
    Name,
    /// `vin`
    Vin,
    /// `license_plate`
    LicensePlate,
    /// `url`
    Url,
    /// `social`
    Social,
    /// `cryptocurrency_address`
    CryptoAddress,
    /// `address`
    Address,
    /// `phone`
    Phone,
    /// `company`
    Company,
    /// `database_name`
    DatabaseName,
}

impl ResultColumn {
    /// SQL column name.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::IpAddress => "ip_address",
            Self::Username => "username",
            Self::Password => "password",
            Self::HashedPassword => "hashed_password",
            Self::Name => "name",
            Self::Vin => "vin",
            Self::LicensePlate => "license_plate",
            Self::Url => "url",
            Self::Social => "social",
            Self::CryptoAddress => "cryptocurrency_address",
            Self::Address => "address",
            Self::Phone => "phone",
            Self::Company => "company",
            Self::DatabaseName => "database_name",
        }
    }

    /// Whether the column holds a JSON array.
    #[must_use]
    pub fn is_list(self) -> bool {
        !matches!(self, Self::DatabaseName)
    }
}

impl fmt::Display for ResultColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for ResultColumn {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        let column = match s.trim().to_ascii_lowercase().as_str() {
            "email" => Self::Email,
            "ip" | "ip_address" => Self::IpAddress,
            "username" => Self::Username,
            "password" => Self::Password,
            "hash" | "hashed_password" => Self::HashedPassword,
            "name" => Self::Name,
            "vin" => Self::Vin,
            "license" | "license_plate" => Self::LicensePlate,
            "url" | "domain" => Self::Url,
            "social" => Self::Social,
            "crypto" | "cryptocurrency_address" => Self::CryptoAddress,
            "address" => Self::Address,
            "phone" => Self::Phone,
            "company" => Self::Company,
            "database" | "database_name" => Self::DatabaseName,
            other => return Err(DatabaseError::UnknownColumn(other.to_string())),
        };
        Ok(column)
    }
}

/// Filter for [`query_results`].
#[derive(Debug, Clone)]
pub struct ResultFilter {
    /// Per-column match values; all must match
    pub matches: Vec<(ResultColumn, String)>,
    /// Match list elements exactly instead of by substring
    pub exact: bool,
    /// Columns that must hold at least one value
    pub non_empty: Vec<ResultColumn>,
    /// Maximum number of rows returned
    pub limit: i64,
}

impl Default for ResultFilter {
    fn default() -> Self {
        Self {
            matches: Vec::new(),
            exact: false,
            non_empty: Vec::new(),
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Outcome of a batched insert: rows inserted plus the failures seen.
#[derive(Debug, Default)]
pub(crate) struct BatchTally {
    inserted: u64,
    failed_batches: usize,
    last_error: Option<DatabaseError>,
}

impl BatchTally {
    pub(crate) fn record(&mut self, table: &str, index: usize, outcome: Result<u64>) {
        match outcome {
            Ok(count) => self.inserted += count,
            Err(error) => {
                tracing::error!(table, batch = index, error = %error, "Failed to store batch");
                self.failed_batches += 1;
                self.last_error = Some(error);
            }
        }
    }

    pub(crate) fn finish(self, table: &str, received: usize) -> Result<u64> {
        tracing::debug!(
            table,
            received,
            inserted = self.inserted,
            failed_batches = self.failed_batches,
            "Stored batches"
        );
        match self.last_error {
            None => Ok(self.inserted),
            Some(error) => Err(DatabaseError::PartialStore {
                inserted: self.inserted,
                failed_batches: self.failed_batches,
                source: Box::new(error),
            }),
        }
    }
}

/// Store breach records, skipping ids that are already present.
///
/// Inserts run in transactions of [`BATCH_SIZE`] rows. A failed batch is
/// rolled back and logged, and the remaining batches are still attempted.
/// Returns the number of newly inserted rows.
///
/// # Errors
/// Returns `DatabaseError::PartialStore` carrying the inserted count and the
/// last batch error if any batch failed.
pub async fn store_results(pool: &Pool<Sqlite>, records: &[BreachRecord]) -> Result<u64> {
    let mut tally = BatchTally::default();
    for (index, batch) in records.chunks(BATCH_SIZE).enumerate() {
        tally.record("results", index, insert_results(pool, batch).await);
    }
    tally.finish("results", records.len())
}

async fn insert_results(pool: &Pool<Sqlite>, batch: &[BreachRecord]) -> Result<u64> {
    let mut inserted = 0;
    let mut tx = pool.begin().await?;
    for record in batch {
        let result = sqlx::query(
            "INSERT INTO results (dehashed_id, email, ip_address, username, password,
                                  hashed_password, hash_type, name, vin, license_plate,
                                  url, social, cryptocurrency_address, address, phone,
                                  company, database_name)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(dehashed_id) DO NOTHING",
        )
        .bind(&record.id)
        .bind(to_json(&record.email)?)
        .bind(to_json(&record.ip_address)?)
        .bind(to_json(&record.username)?)
        .bind(to_json(&record.password)?)
        .bind(to_json(&record.hashed_password)?)
        .bind(&record.hash_type)
        .bind(to_json(&record.name)?)
        .bind(to_json(&record.vin)?)
        .bind(to_json(&record.license_plate)?)
        .bind(to_json(&record.url)?)
        .bind(to_json(&record.social)?)
        .bind(to_json(&record.cryptocurrency_address)?)
        .bind(to_json(&record.address)?)
        .bind(to_json(&record.phone)?)
        .bind(to_json(&record.company)?)
        .bind(&record.database_name)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }
    tx.commit().await?;
    Ok(inserted)
}

/// Query stored breach records.
///
/// # Errors
/// Returns `DatabaseError` if the query fails or a stored list cannot be decoded.
pub async fn query_results(pool: &Pool<Sqlite>, filter: &ResultFilter) -> Result<Vec<BreachRecord>> {
    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT dehashed_id, email, ip_address, username, password, hashed_password, hash_type,
                name, vin, license_plate, url, social, cryptocurrency_address, address, phone,
                company, database_name
         FROM results WHERE 1 = 1",
    );

    for (column, value) in &filter.matches {
        let col = column.column();
        if filter.exact && column.is_list() {
            builder.push(format!(
                " AND EXISTS (SELECT 1 FROM json_each(results.{col}) WHERE json_each.value = "
            ));
            builder.push_bind(value.clone());
            builder.push(")");
        } else if filter.exact {
            builder.push(format!(" AND {col} = "));
            builder.push_bind(value.clone());
        } else {
            builder.push(format!(" AND {col} LIKE '%' || "));
            builder.push_bind(value.clone());
            builder.push(" || '%'");
        }
    }

    for column in &filter.non_empty {
        let col = column.column();
        if column.is_list() {
            builder.push(format!(" AND {col} != '[]'"));
        } else {
            builder.push(format!(" AND {col} != ''"));
        }
    }

    builder.push(" ORDER BY id LIMIT ");
    builder.push_bind(filter.limit.max(0));

    let rows = builder.build().fetch_all(pool).await?;
    rows.iter().map(record_from_row).collect()
}

/// Count all stored breach records.
///
/// # Errors
/// Returns `DatabaseError` if the query fails.
pub async fn count_results(pool: &Pool<Sqlite>) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM results")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn to_json(values: &[String]) -> Result<String> {
    serde_json::to_string(values).map_err(|e| DatabaseError::SerializationError(e.to_string()))
}

fn list(row: &SqliteRow, column: &str) -> Result<Vec<String>> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw)
        .map_err(|e| DatabaseError::Decode(format!("column '{column}' is not a JSON list: {e}")))
}

fn record_from_row(row: &SqliteRow) -> Result<BreachRecord> {
    Ok(BreachRecord {
        id: row.try_get("dehashed_id")?,
        email: list(row, "email")?,
        ip_address: list(row, "ip_address")?,
        username: list(row, "username")?,
        password: list(row, "password")?,
        hashed_password: list(row, "hashed_password")?,
        hash_type: row.try_get("hash_type")?,
        name: list(row, "name")?,
        vin: list(row, "vin")?,
        license_plate: list(row, "license_plate")?,
        url: list(row, "url")?,
        social: list(row, "social")?,
        cryptocurrency_address: list(row, "cryptocurrency_address")?,
        address: list(row, "address")?,
        phone: list(row, "phone")?,
        company: list(row, "company")?,
        database_name: row.try_get("database_name")?,
    })
}

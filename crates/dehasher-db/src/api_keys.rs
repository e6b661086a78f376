//! Encrypted API key blobs.
//!
//! This module only moves sealed bytes in and out of the `api_keys` table.
//! Sealing and opening happen in the key store.

use crate::error::Result;
use sqlx::{Pool, Sqlite};

/// A sealed API key as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedKey {
    /// Encrypted key bytes (including the authentication tag)
    pub ciphertext: Vec<u8>,
    /// Nonce used for encryption
    pub nonce: Vec<u8>,
}

/// Insert or replace the sealed key for `provider`.
pub async fn set_api_key(pool: &Pool<Sqlite>, provider: &str, sealed: &SealedKey) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO api_keys (provider, ciphertext, nonce, updated_at)
        VALUES (?, ?, ?, datetime('now'))
        ON CONFLICT(provider) DO UPDATE SET
            ciphertext = excluded.ciphertext,
            nonce = excluded.nonce,
            updated_at = datetime('now')
        ",
    )
    .bind(provider)
    .bind(&sealed.ciphertext)
    .bind(&sealed.nonce)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get the sealed key for `provider`, if one is stored.
pub async fn get_api_key(pool: &Pool<Sqlite>, provider: &str) -> Result<Option<SealedKey>> {
    let row: Option<(Vec<u8>, Vec<u8>)> =
        sqlx::query_as("SELECT ciphertext, nonce FROM api_keys WHERE provider = ?")
            .bind(provider)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(ciphertext, nonce)| SealedKey { ciphertext, nonce }))
}

/// Delete the sealed key for `provider`. Returns true if a key was removed.
pub async fn delete_api_key(pool: &Pool<Sqlite>, provider: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM api_keys WHERE provider = ?")
        .bind(provider)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

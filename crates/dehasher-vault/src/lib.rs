//! Dehasher Vault - encrypted API key storage
//!
//! Stores provider API keys in the local database, sealed with
//! ChaCha20-Poly1305 under a key derived by Argon2id.
//!
//! # Security Model
//!
//! - Machine fingerprint + random salt file → Argon2id → 256-bit key
//! - ChaCha20-Poly1305 AEAD with a fresh nonce for every write
//! - The derived key and decrypted API keys are zeroized on drop
//! - API keys are never logged or included in error messages
//!
//! # Example
//!
//! ```ignore
//! use dehasher_vault::{KeyStore, KdfParams, salt_path_for};
//!
//! let db = dehasher_db::Database::open("dehasher.db").await?;
//! let store = KeyStore::open(db, salt_path_for("dehasher.db".as_ref()), KdfParams::default()).await?;
//! store.set_api_key(DEHASHED_PROVIDER, "…").await?;
//! let key = store.api_key(DEHASHED_PROVIDER).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cipher;
pub mod error;
pub mod kdf;

pub use cipher::EncryptedField;
pub use error::{Result, VaultError};
pub use kdf::KdfParams;

use dehasher_db::{api_keys, Database};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Provider name under which the breach-search API key is stored.
pub const DEHASHED_PROVIDER: &str = "dehashed";

/// Salt storage file name (stored alongside the database).
const SALT_FILE_NAME: &str = ".dehasher_salt";

/// Encrypted API key store backed by the local database.
#[derive(Debug)]
pub struct KeyStore {
    db: Database,
    key: Zeroizing<[u8; kdf::KEY_LENGTH]>,
}

impl KeyStore {
    /// Open the key store using this machine's fingerprint as key material.
    ///
    /// The salt file at `salt_path` is created on first use.
    ///
    /// # Errors
    /// Returns error if:
    /// - The salt file cannot be read or written, or has the wrong length
    /// - Key derivation fails
    pub async fn open(db: Database, salt_path: impl AsRef<Path>, params: KdfParams) -> Result<Self> {
        let fingerprint = kdf::machine_fingerprint();
        Self::open_with_secret(db, salt_path, &fingerprint, params).await
    }

    /// Open the key store with explicit key material.
    pub async fn open_with_secret(
        db: Database,
        salt_path: impl AsRef<Path>,
        secret: &str,
        params: KdfParams,
    ) -> Result<Self> {
        let salt = load_or_create_salt(salt_path.as_ref()).await?;
        let key = kdf::derive_key(secret, &salt, params)?;
        Ok(Self { db, key })
    }

    /// Seal and store the API key for `provider`, replacing any previous key.
    ///
    /// # Errors
    /// Returns `VaultError::InvalidData` if `api_key` is blank.
    pub async fn set_api_key(&self, provider: &str, api_key: &str) -> Result<()> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(VaultError::InvalidData("API key must not be empty".to_string()));
        }

        let sealed = EncryptedField::encrypt(&api_key.to_string(), &self.key)?;
        api_keys::set_api_key(self.db.pool(), provider, &sealed.into()).await?;

        tracing::info!(provider, "Stored API key");
        Ok(())
    }

    /// Get the API key for `provider`, or `None` when none is stored.
    ///
    /// # Errors
    /// Returns `VaultError::KeyMismatch` if the stored key was sealed under
    /// a different fingerprint or salt.
    pub async fn api_key(&self, provider: &str) -> Result<Option<Zeroizing<String>>> {
        let Some(sealed) = api_keys::get_api_key(self.db.pool(), provider).await? else {
            return Ok(None);
        };

        let field = EncryptedField::<String>::try_from(sealed)?;
        let api_key = field.decrypt(&self.key).map_err(|_| {
            tracing::warn!(provider, "Stored API key failed to decrypt");
            VaultError::KeyMismatch(provider.to_string())
        })?;

        Ok(Some(Zeroizing::new(api_key)))
    }

    /// Remove the API key for `provider`. Returns true if a key was removed.
    pub async fn clear_api_key(&self, provider: &str) -> Result<bool> {
        let removed = api_keys::delete_api_key(self.db.pool(), provider).await?;
        if removed {
            tracing::info!(provider, "Removed API key");
        }
        Ok(removed)
    }
}

/// Get the salt file path for a database path.
#[must_use]
pub fn salt_path_for(db_path: &Path) -> PathBuf {
    db_path.parent().map_or_else(
        || PathBuf::from(SALT_FILE_NAME),
        |dir| dir.join(SALT_FILE_NAME),
    )
}

async fn load_or_create_salt(salt_path: &Path) -> Result<Vec<u8>> {
    if tokio::fs::try_exists(salt_path).await.unwrap_or(false) {
        let salt = tokio::fs::read(salt_path)
            .await
            .map_err(|e| VaultError::InvalidData(format!("failed to read salt file: {e}")))?;
        if salt.len() != kdf::SALT_LENGTH {
            return Err(VaultError::InvalidData(format!(
                "invalid salt file: expected {} bytes, got {}",
                kdf::SALT_LENGTH,
                salt.len()
            )));
        }
        return Ok(salt);
    }

    if let Some(parent) = salt_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| VaultError::InvalidData(format!("failed to create salt directory: {e}")))?;
    }

    let salt = kdf::generate_salt();
    tokio::fs::write(salt_path, salt)
        .await
        .map_err(|e| VaultError::InvalidData(format!("failed to write salt file: {e}")))?;
    tracing::debug!("Created key store salt at {}", salt_path.display());

    Ok(salt.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FAST: KdfParams = KdfParams {
        memory_kb: 1024,
        iterations: 1,
    };

    async fn test_db() -> Database {
        Database::open(":memory:").await.expect("open database")
    }

    #[tokio::test]
    async fn test_set_and_get_api_key() {
        let tmp = TempDir::new().expect("create temp dir");
        let store = KeyStore::open(test_db().await, tmp.path().join("salt"), FAST)
            .await
            .expect("open key store");

        assert!(store.api_key(DEHASHED_PROVIDER).await.expect("get").is_none());

        store
            .set_api_key(DEHASHED_PROVIDER, "  abc123  ")
            .await
            .expect("set key");

        let key = store.api_key(DEHASHED_PROVIDER).await.expect("get");
        assert_eq!(key.as_deref().map(String::as_str), Some("abc123"));
    }

    #[tokio::test]
    async fn test_stored_key_is_not_plaintext() {
        let tmp = TempDir::new().expect("create temp dir");
        let db = test_db().await;
        let store = KeyStore::open(db.clone(), tmp.path().join("salt"), FAST)
            .await
            .expect("open key store");

        store
            .set_api_key(DEHASHED_PROVIDER, "plain-api-key")
            .await
            .expect("set key");

        let sealed = api_keys::get_api_key(db.pool(), DEHASHED_PROVIDER)
            .await
            .expect("get sealed")
            .expect("sealed key present");
        assert!(!sealed
            .ciphertext
            .windows(b"plain-api-key".len())
            .any(|w| w == b"plain-api-key"));
    }

    #[tokio::test]
    async fn test_empty_api_key_rejected() {
        let tmp = TempDir::new().expect("create temp dir");
        let store = KeyStore::open(test_db().await, tmp.path().join("salt"), FAST)
            .await
            .expect("open key store");

        let result = store.set_api_key(DEHASHED_PROVIDER, "   ").await;
        assert!(matches!(result, Err(VaultError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_salt_reused_across_opens() {
        let tmp = TempDir::new().expect("create temp dir");
        let salt_path = tmp.path().join("salt");
        let db = test_db().await;

        let first = KeyStore::open(db.clone(), &salt_path, FAST)
            .await
            .expect("open key store");
        first
            .set_api_key(DEHASHED_PROVIDER, "abc123")
            .await
            .expect("set key");

        let second = KeyStore::open(db, &salt_path, FAST)
            .await
            .expect("reopen key store");
        let key = second.api_key(DEHASHED_PROVIDER).await.expect("get");
        assert_eq!(key.as_deref().map(String::as_str), Some("abc123"));
    }

    #[tokio::test]
    async fn test_different_secret_cannot_open() {
        let tmp = TempDir::new().expect("create temp dir");
        let salt_path = tmp.path().join("salt");
        let db = test_db().await;

        let ours = KeyStore::open_with_secret(db.clone(), &salt_path, "machine-a", FAST)
            .await
            .expect("open key store");
        ours.set_api_key(DEHASHED_PROVIDER, "abc123")
            .await
            .expect("set key");

        let theirs = KeyStore::open_with_secret(db, &salt_path, "machine-b", FAST)
            .await
            .expect("open key store");
        let result = theirs.api_key(DEHASHED_PROVIDER).await;
        assert!(matches!(result, Err(VaultError::KeyMismatch(_))));
    }

    #[tokio::test]
    async fn test_clear_api_key() {
        let tmp = TempDir::new().expect("create temp dir");
        let store = KeyStore::open(test_db().await, tmp.path().join("salt"), FAST)
            .await
            .expect("open key store");

        store
            .set_api_key(DEHASHED_PROVIDER, "abc123")
            .await
            .expect("set key");
        assert!(store.clear_api_key(DEHASHED_PROVIDER).await.expect("clear"));
        assert!(!store.clear_api_key(DEHASHED_PROVIDER).await.expect("clear again"));
        assert!(store.api_key(DEHASHED_PROVIDER).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_invalid_salt_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let salt_path = tmp.path().join("salt");
        tokio::fs::write(&salt_path, b"short").await.expect("write salt");

        let result = KeyStore::open(test_db().await, &salt_path, FAST).await;
        assert!(matches!(result, Err(VaultError::InvalidData(_))));
    }

    #[test]
    fn test_salt_path_for() {
        assert_eq!(
            salt_path_for(Path::new("/data/dehasher.db")),
            PathBuf::from("/data/.dehasher_salt")
        );
        assert_eq!(
            salt_path_for(Path::new("dehasher.db")),
            PathBuf::from(".dehasher_salt")
        );
    }
}

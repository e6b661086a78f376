//! Error types for the key store.

use thiserror::Error;

/// Errors that can occur during key store operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Failed to derive the sealing key.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption operation failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption operation failed (different machine, new salt, or corrupted data).
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// A stored key could not be opened with this machine's sealing key.
    #[error("stored API key for '{0}' cannot be decrypted on this machine; set it again")]
    KeyMismatch(String),

    /// Invalid input or corrupted data.
    #[error("invalid key store data: {0}")]
    InvalidData(String),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] dehasher_db::DatabaseError),
}

impl From<VaultError> for dehasher_core::DehasherError {
    fn from(err: VaultError) -> Self {
        Self::Vault(err.to_string())
    }
}

/// Result type for key store operations.
pub type Result<T> = std::result::Result<T, VaultError>;

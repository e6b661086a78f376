//! Key derivation using Argon2id.
//!
//! The sealing key is derived from a machine fingerprint and a random salt
//! kept next to the database, so stored API keys open only on the machine
//! (and for the user) that stored them.

use crate::error::{Result, VaultError};
use argon2::{Algorithm, Argon2, ParamsBuilder, Version};
use dehasher_core::VaultConfig;
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

/// Length of the derived key in bytes (256 bits).
pub const KEY_LENGTH: usize = 32;

/// Length of the salt in bytes.
pub const SALT_LENGTH: usize = 32;

/// Argon2id parallelism (threads).
const PARALLELISM: u32 = 1;

/// Application-specific string mixed into the fingerprint.
const FINGERPRINT_CONTEXT: &str = "dehasher-api-key-store-v1";

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KB
    pub memory_kb: u32,
    /// Time cost (iterations)
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::from(&VaultConfig::default())
    }
}

impl From<&VaultConfig> for KdfParams {
    fn from(config: &VaultConfig) -> Self {
        Self {
            memory_kb: config.argon2_memory_kb,
            iterations: config.argon2_iterations,
        }
    }
}

/// Generate a random salt for key derivation.
#[must_use]
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    let mut salt = [0u8; SALT_LENGTH];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Build the machine fingerprint used as key material.
///
/// Combines the user name, host name, OS and architecture with a fixed
/// application string.
#[must_use]
pub fn machine_fingerprint() -> Zeroizing<String> {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default();
    let host = std::env::var("HOSTNAME")
        .ok()
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|h| h.trim().to_string())
        })
        .unwrap_or_default();

    Zeroizing::new(format!(
        "{user}|{host}|{}-{}|{FINGERPRINT_CONTEXT}",
        std::env::consts::OS,
        std::env::consts::ARCH
    ))
}

/// Derive a 256-bit key from `secret` and `salt` using Argon2id.
///
/// # Errors
/// Returns `VaultError::KeyDerivation` if the salt has the wrong length,
/// the parameters are rejected, or the derivation fails.
pub fn derive_key(
    secret: &str,
    salt: &[u8],
    params: KdfParams,
) -> Result<Zeroizing<[u8; KEY_LENGTH]>> {
    if salt.len() != SALT_LENGTH {
        return Err(VaultError::KeyDerivation(format!(
            "invalid salt length: expected {SALT_LENGTH} bytes, got {}",
            salt.len()
        )));
    }

    let argon_params = ParamsBuilder::new()
        .m_cost(params.memory_kb)
        .t_cost(params.iterations)
        .p_cost(PARALLELISM)
        .output_len(KEY_LENGTH)
        .build()
        .map_err(|e| VaultError::KeyDerivation(format!("failed to build parameters: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    argon2
        .hash_password_into(secret.as_bytes(), salt, key.as_mut())
        .map_err(|e| VaultError::KeyDerivation(format!("key derivation failed: {e}")))?;

    Ok(key)
}

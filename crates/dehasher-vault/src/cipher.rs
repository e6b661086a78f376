//! Value sealing using ChaCha20-Poly1305 AEAD.
//!
//! Each sealed value carries its own random 96-bit nonce and a Poly1305
//! authentication tag, so values can be opened independently.

use crate::error::{Result, VaultError};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    ChaCha20Poly1305, Nonce,
};
use dehasher_db::SealedKey;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Length of the nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_LENGTH: usize = 12;

/// Encrypted value with ciphertext and nonce.
///
/// `T` is the plaintext type; it is serialized to JSON before sealing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedField<T> {
    /// Ciphertext + authentication tag (16 bytes)
    ciphertext: Vec<u8>,
    /// Random nonce used for this encryption
    nonce: [u8; NONCE_LENGTH],
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

impl<T> EncryptedField<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    /// Encrypt a value using the provided key.
    ///
    /// # Errors
    /// Returns `VaultError::Encryption` if encryption or serialization fails.
    pub fn encrypt(value: &T, key: &[u8; 32]) -> Result<Self> {
        let plaintext = zeroize::Zeroizing::new(
            serde_json::to_vec(value)
                .map_err(|e| VaultError::Encryption(format!("serialization failed: {e}")))?,
        );

        let nonce_bytes = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let nonce: [u8; NONCE_LENGTH] = nonce_bytes
            .as_slice()
            .try_into()
            .map_err(|_| VaultError::Encryption("unexpected nonce length".to_string()))?;

        let cipher = ChaCha20Poly1305::new(key.into());
        let ciphertext = cipher
            .encrypt(&nonce_bytes, plaintext.as_ref())
            .map_err(|e| VaultError::Encryption(format!("encryption failed: {e}")))?;

        Ok(Self {
            ciphertext,
            nonce,
            _phantom: PhantomData,
        })
    }

    /// Decrypt the value using the provided key.
    ///
    /// # Errors
    /// Returns `VaultError::Decryption` if:
    /// - The key is incorrect
    /// - The ciphertext or nonce has been tampered with
    /// - Deserialization fails
    pub fn decrypt(&self, key: &[u8; 32]) -> Result<T> {
        let cipher = ChaCha20Poly1305::new(key.into());

        let nonce = Nonce::from_slice(&self.nonce);
        let plaintext = zeroize::Zeroizing::new(
            cipher
                .decrypt(nonce, self.ciphertext.as_ref())
                .map_err(|e| VaultError::Decryption(format!("decryption failed: {e}")))?,
        );

        serde_json::from_slice(&plaintext)
            .map_err(|e| VaultError::Decryption(format!("deserialization failed: {e}")))
    }

    /// Get the nonce.
    #[must_use]
    pub fn nonce(&self) -> &[u8; NONCE_LENGTH] {
        &self.nonce
    }

    /// Get the ciphertext.
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

impl<T> From<EncryptedField<T>> for SealedKey {
    fn from(field: EncryptedField<T>) -> Self {
        SealedKey {
            ciphertext: field.ciphertext,
            nonce: field.nonce.to_vec(),
        }
    }
}

impl<T> TryFrom<SealedKey> for EncryptedField<T> {
    type Error = VaultError;

    fn try_from(sealed: SealedKey) -> Result<Self> {
        let nonce: [u8; NONCE_LENGTH] = sealed.nonce.as_slice().try_into().map_err(|_| {
            VaultError::InvalidData(format!(
                "stored nonce is {} bytes, expected {NONCE_LENGTH}",
                sealed.nonce.len()
            ))
        })?;
        Ok(Self {
            ciphertext: sealed.ciphertext,
            nonce,
            _phantom: PhantomData,
        })
    }
}

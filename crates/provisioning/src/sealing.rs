//! Anonymous sealed-box encryption of secret values.
//!
//! GitHub accepts Actions secrets only as libsodium `crypto_box_seal`
//! ciphertext under a per-scope X25519 public key. The sender holds no key
//! pair; only the holder of the matching private key can open the box.
//!
//! This module performs no I/O. The caller fetches the key for the target
//! scope immediately before sealing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crypto_box::aead::OsRng;
use crypto_box::PublicKey;
use thiserror::Error;

use crate::{RecipientKey, SealedSecret, SecretString};

/// Length in bytes of an X25519 public key.
const PUBLIC_KEY_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SealError {
    #[error("Recipient public key is not valid base64")]
    KeyEncoding,

    #[error("Recipient public key must be {PUBLIC_KEY_LEN} bytes, got {actual}")]
    KeyLength { actual: usize },

    #[error("Sealed-box encryption failed")]
    Encryption,
}

/// Seals `plaintext` for the holder of `recipient_public_key` (base64) and
/// returns the base64 ciphertext.
pub fn seal(plaintext: &[u8], recipient_public_key: &str) -> Result<String, SealError> {
    let key_bytes = STANDARD
        .decode(recipient_public_key.trim())
        .map_err(|_| SealError::KeyEncoding)?;
    let key: [u8; PUBLIC_KEY_LEN] = key_bytes
        .as_slice()
        .try_into()
        .map_err(|_| SealError::KeyLength {
            actual: key_bytes.len(),
        })?;

    let ciphertext = PublicKey::from(key)
        .seal(&mut OsRng, plaintext)
        .map_err(|_| SealError::Encryption)?;

    Ok(STANDARD.encode(ciphertext))
}

/// Seals a secret value under a fetched recipient key, pairing the
/// ciphertext with the key id GitHub needs to open it.
pub fn seal_secret(value: &SecretString, key: &RecipientKey) -> Result<SealedSecret, SealError> {
    Ok(SealedSecret {
        encrypted_value: seal(value.expose().as_bytes(), &key.key)?,
        key_id: key.key_id.clone(),
    })
}

#[cfg(test)]
#[path = "sealing_tests.rs"]
mod tests;

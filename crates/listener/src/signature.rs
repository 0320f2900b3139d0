//! Webhook signature verification.
//!
//! The platform signs each delivery with HMAC-SHA256 over the raw request
//! body, keyed by the shared component secret, and sends the lowercase hex
//! digest in the [`SIGNATURE_HEADER`] header.

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Header carrying the hex digest.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

type HmacSha256 = Hmac<Sha256>;

/// Computes the hex-encoded signature of `payload` under `secret`.
pub fn sign(payload: &[u8], secret: &str) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Returns `true` only if `signature` is the signature of `payload` under
/// `secret`.
///
/// An absent signature or an empty secret is a failed verification. The
/// digest comparison is constant-time and tolerates signatures of any
/// length or content.
pub fn verify(payload: &[u8], signature: Option<&str>, secret: &str) -> bool {
    let Some(signature) = signature else {
        return false;
    };
    if secret.is_empty() {
        return false;
    }
    let Ok(expected) = sign(payload, secret) else {
        return false;
    };

    // Slices of unequal length compare unequal without panicking.
    expected.as_bytes().ct_eq(signature.trim().as_bytes()).into()
}

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;

// ABOUTME: Password hashing and session token generation primitives
// ABOUTME: PBKDF2-HMAC-SHA256 with per-user salts and constant-time verification
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Cryptographic Utilities
//!
//! Password hashes use salted PBKDF2-HMAC-SHA256, stored as
//! `pbkdf2$<iterations>$<salt-hex>$<hash-hex>` so the iteration count can be
//! raised without invalidating existing hashes. Session tokens are 32 random
//! bytes, hex encoded.

use anyhow::{anyhow, Result};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// PBKDF2 iteration count for newly created hashes
const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt length in bytes
const SALT_LEN: usize = 16;

/// Derived key length in bytes
const HASH_LEN: usize = 32;

/// Session token entropy in bytes
const TOKEN_LEN: usize = 32;

/// Hash a password with a fresh random salt
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);

    let mut derived = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut derived);

    format!(
        "pbkdf2${PBKDF2_ITERATIONS}${}${}",
        hex::encode(salt),
        hex::encode(derived)
    )
}

/// Verify a password against a stored hash in constant time
///
/// # Errors
///
/// Returns an error if the stored hash is malformed; a well-formed hash that
/// simply does not match yields `Ok(false)`.
pub fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let mut parts = stored.split('$');
    let scheme = parts.next().unwrap_or_default();
    if scheme != "pbkdf2" {
        return Err(anyhow!("unsupported password hash scheme: {scheme}"));
    }

    let iterations: u32 = parts
        .next()
        .ok_or_else(|| anyhow!("password hash missing iteration count"))?
        .parse()
        .map_err(|_| anyhow!("invalid iteration count in password hash"))?;
    let salt = hex::decode(
        parts
            .next()
            .ok_or_else(|| anyhow!("password hash missing salt"))?,
    )?;
    let expected = hex::decode(
        parts
            .next()
            .ok_or_else(|| anyhow!("password hash missing digest"))?,
    )?;

    let mut derived = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut derived);

    Ok(derived.ct_eq(&expected).into())
}

/// Generate an opaque session token
#[must_use]
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("correct horse battery staple");
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password");
        let b = hash_password("same password");
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("x", "bcrypt$whatever").is_err());
        assert!(verify_password("x", "pbkdf2$notanumber$aa$bb").is_err());
    }

    #[test]
    fn test_session_tokens_unique_and_hex() {
        let token = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_session_token());
    }
}

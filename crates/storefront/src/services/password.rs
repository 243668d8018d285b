//! Password hashing and verification.
//!
//! PBKDF2-HMAC-SHA256 with a 16-byte random salt and 100 000 iterations; the
//! stored form is standard base64 of `salt ‖ derived key`. Verification
//! re-derives with the stored salt and compares with an XOR-accumulate loop
//! so the comparison takes the same time whether it fails on the first byte
//! or the last.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// Derived key length in bytes.
const KEY_LEN: usize = 32;

/// PBKDF2 iteration count.
const ITERATIONS: u32 = 100_000;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 255;

/// Password policy violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    /// Password is too short.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,

    /// Password is too long.
    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    TooLong,
}

/// Validate a password against the length policy.
///
/// # Errors
///
/// Returns a [`PasswordPolicyError`] describing the violation.
pub fn validate_password(password: &str) -> Result<(), PasswordPolicyError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooShort);
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooLong);
    }
    Ok(())
}

/// Hash a password for storage.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, ITERATIONS, &mut key);

    let mut encoded = Vec::with_capacity(SALT_LEN + KEY_LEN);
    encoded.extend_from_slice(&salt);
    encoded.extend_from_slice(&key);
    STANDARD.encode(encoded)
}

/// Verify a password against a stored hash.
///
/// Malformed stored values verify as false rather than erroring; a login
/// attempt against corrupt data behaves like a wrong password.
#[must_use]
pub fn verify_password(stored: &str, password: &str) -> bool {
    let Ok(decoded) = STANDARD.decode(stored) else {
        return false;
    };
    if decoded.len() != SALT_LEN + KEY_LEN {
        return false;
    }
    let (salt, expected) = decoded.split_at(SALT_LEN);

    let mut derived = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, ITERATIONS, &mut derived);

    // Constant-time compare: accumulate differences, no early exit.
    let mut diff = 0u8;
    for (a, b) in derived.iter().zip(expected) {
        diff |= a ^ b;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verify_roundtrip() {
        let hash = hash_password("correct horse battery staple");
        assert!(verify_password(&hash, "correct horse battery staple"));
        assert!(!verify_password(&hash, "correct horse battery stapl"));
        assert!(!verify_password(&hash, ""));
    }

    #[test]
    fn test_same_password_hashes_differently() {
        // Random salt per hash
        assert_ne!(hash_password("hunter22"), hash_password("hunter22"));
    }

    #[test]
    fn test_malformed_stored_values_do_not_verify() {
        assert!(!verify_password("not base64 at all!!!", "anything"));
        assert!(!verify_password("", "anything"));
        // Valid base64 but the wrong length
        assert!(!verify_password(&STANDARD.encode([0u8; 10]), "anything"));
    }

    #[test]
    fn test_length_policy() {
        assert_eq!(validate_password("short"), Err(PasswordPolicyError::TooShort));
        assert_eq!(
            validate_password(&"x".repeat(256)),
            Err(PasswordPolicyError::TooLong)
        );
        assert!(validate_password("just long enough").is_ok());
        assert!(validate_password(&"x".repeat(255)).is_ok());
    }
}

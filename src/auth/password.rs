// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password verifiers (Argon2id, PHC string format).
//!
//! Both functions are CPU bound; async callers run them on the blocking pool.

use std::sync::LazyLock;

use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

use super::error::AuthError;

/// Verifier checked when the account does not exist, so unknown contacts cost
/// the same as wrong passwords.
static DUMMY_VERIFIER: LazyLock<String> =
    LazyLock::new(|| hash_password("placeholder-password-0").unwrap_or_default());

/// Hash a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("password hashing failed: {e}")))
}

/// Check a password against a stored PHC string.
///
/// An unparsable stored verifier is treated as a mismatch.
pub fn verify_password(password: &str, verifier: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(verifier) else {
        tracing::warn!("Stored password verifier is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Spend one verification's worth of work and report a mismatch.
pub fn verify_against_dummy(password: &str) -> bool {
    let _ = verify_password(password, &DUMMY_VERIFIER);
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("Passw0rd!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Passw0rd!", &hash));
        assert!(!verify_password("passw0rd!", &hash));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("Passw0rd!").unwrap();
        let b = hash_password("Passw0rd!").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_verifier_never_matches() {
        assert!(!verify_password("Passw0rd!", "plaintext"));
        assert!(!verify_password("Passw0rd!", ""));
    }

    #[test]
    fn dummy_verification_always_fails() {
        assert!(!verify_against_dummy("placeholder-password-0"));
    }
}

//! Password hashing for pending registrations and login checks.
//!
//! Hashing happens once, when a code is issued; promoting a pending
//! registration into an account copies the stored hash verbatim.

use anyhow::{Result, anyhow};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hash a password with Argon2id and a fresh random salt.
///
/// # Errors
/// Returns an error for an empty password or if hashing itself fails.
pub(crate) fn hash_password(password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(anyhow!("password must not be empty"));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Check a password against a stored PHC hash string.
///
/// Malformed hashes verify as `false` rather than erroring; login treats
/// them the same as a wrong password.
pub(crate) fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

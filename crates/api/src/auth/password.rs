//! Password hashing (Argon2id, PHC strings) and the admin password policy.

use std::sync::LazyLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Minimum length of an admin password.
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Hash verified when a login names no account, so that response time
/// does not reveal whether the username exists.
static DECOY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("folio-decoy-password").ok());

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

/// `Ok(false)` on mismatch; `Err` only when `hash` is not a valid PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Spend the cost of one verification without an account to check against.
pub fn burn_verification(password: &str) {
    if let Some(hash) = DECOY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}

/// Reject admin passwords that are short or contain the username.
pub fn check_password_policy(password: &str, username: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "must be at least {MIN_PASSWORD_LENGTH} characters long"
        ));
    }
    let username = username.trim().to_lowercase();
    if !username.is_empty() && password.to_lowercase().contains(&username) {
        return Err("must not contain the username".into());
    }
    Ok(())
}

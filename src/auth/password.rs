use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;

use crate::error::AppError;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Hashes with argon2id and a fresh random salt, returning a PHC string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|e| AppError::Internal(e.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// One message per unmet rule; empty when the password is acceptable.
pub fn policy_violations(password: &str) -> Vec<String> {
    let mut violations = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        violations.push(format!(
            "Passwords must be at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }
    if password.chars().all(char::is_alphanumeric) {
        violations.push("Passwords must have at least one non alphanumeric character.".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push("Passwords must have at least one digit ('0'-'9').".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        violations.push("Passwords must have at least one lowercase ('a'-'z').".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        violations.push("Passwords must have at least one uppercase ('A'-'Z').".to_string());
    }
    violations
}

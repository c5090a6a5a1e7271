//! Student credential helpers.
//!
//! Passwords are stored as `sha256(salt || ":" || password)` in lowercase hex,
//! with a random per-student salt. Plaintext never reaches the store.

use sha2::{Digest, Sha256};
use tally_schemas::NewStudent;

/// Fresh random salt (32 hex chars).
pub fn new_salt() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_password(salt: &str, password: &str, expected_hash: &str) -> bool {
    constant_time_eq(&hash_password(salt, password), expected_hash)
}

/// Equality whose running time does not depend on where the first mismatch
/// sits. Only the length leaks.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Build an insertable record with a fresh salt. Blank `team_name` becomes
/// `None`; other fields are trimmed.
pub fn new_student(
    student_id: &str,
    full_name: &str,
    team_name: Option<&str>,
    password: &str,
) -> NewStudent {
    let password_salt = new_salt();
    let password_hash = hash_password(&password_salt, password);
    NewStudent {
        student_id: student_id.trim().to_string(),
        full_name: full_name.trim().to_string(),
        team_name: team_name
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        password_salt,
        password_hash,
    }
}

//! Password hashing for locally stored accounts.

use constant_time_eq::constant_time_eq;
use sha2::{Digest, Sha256};

const SALT: &str = "SwiftBoard_Salt_2025";

/// Hex SHA-256 of `email ++ password ++ salt`.
///
/// The email doubles as a per-user salt, so the same password hashes
/// differently for different accounts.
#[must_use]
pub fn hash_password(password: &str, email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update(password.as_bytes());
    hasher.update(SALT.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check `password` against a stored hash in constant time.
#[must_use]
pub fn verify_password(password: &str, email: &str, hash: &str) -> bool {
    constant_time_eq(hash_password(password, email).as_bytes(), hash.as_bytes())
}

//! Password hashing for user accounts.
//!
//! Hashes are stored as Argon2id PHC strings (`$argon2id$v=19$m=...`), so the
//! parameters travel with each hash and verification needs no configuration.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;

fn hasher() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params())
}

#[cfg(not(test))]
fn params() -> Params {
    Params::default()
}

// Kept cheap under unit tests.
#[cfg(test)]
fn params() -> Params {
    Params::new(1024, 1, 1, None).expect("valid argon2 test params")
}

/// Hash a plaintext password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(hasher().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Check a plaintext password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    hasher().verify_password(password.as_bytes(), &parsed).is_ok()
}

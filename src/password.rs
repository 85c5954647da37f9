//! Argon2id password hashing. Hashes are PHC strings with a random salt.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};

use crate::error::Result;

pub fn hash_password(plain_text_password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(plain_text_password.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

/// A malformed stored hash verifies as false.
pub fn verify_password(plain_text_password: &str, password_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plain_text_password.as_bytes(), &parsed_hash)
        .is_ok()
}

//! Error taxonomy shared by the entity model, repositories and services.

use thiserror::Error;

/// Every failure in the core is exactly one of these kinds.
#[derive(Debug, Error)]
pub enum KitchenError {
    /// Malformed or out-of-range caller input, detected before any store access.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A status-transition precondition was violated.
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// The acting user lacks the role required for the mutation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A uniqueness rule (email, station name, allergen name, menu week) was violated.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Unknown email or wrong password. Deliberately does not say which.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

impl KitchenError {
    pub fn invalid(message: impl Into<String>) -> Self {
        KitchenError::InvalidArgument(message.into())
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        KitchenError::IllegalState(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        KitchenError::Unauthorized(message.into())
    }

    /// `"<Entity> with ID <id> was not found."`
    pub fn not_found(entity: &str, id: i64) -> Self {
        KitchenError::NotFound(format!("{} with ID {} was not found.", entity, id))
    }
}

impl From<argon2::password_hash::Error> for KitchenError {
    fn from(value: argon2::password_hash::Error) -> Self {
        KitchenError::PasswordHash(value.to_string())
    }
}

/// Result type for every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, KitchenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = KitchenError::not_found("WeeklyMenu", 42);
        assert_eq!(
            err.to_string(),
            "Not found: WeeklyMenu with ID 42 was not found."
        );
    }

    #[test]
    fn test_invalid_credentials_does_not_leak_detail() {
        assert_eq!(
            KitchenError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }
}

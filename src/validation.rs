//! Input checks run before anything touches the store.
//!
//! Every function here is pure and returns [`KitchenError::InvalidArgument`]
//! on failure.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{KitchenError, Result};

pub const MIN_WEEK: i32 = 1;
pub const MAX_WEEK: i32 = 53;
pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9+_.-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .expect("email pattern is a valid regex")
    })
}

/// Identifiers must be present and strictly positive.
pub fn validate_id(id: i64) -> Result<i64> {
    if id <= 0 {
        return Err(KitchenError::invalid(
            "Invalid ID: Must be provided and greater than 0.",
        ));
    }
    Ok(id)
}

/// Unwraps the identity of an entity that must already be persisted.
pub fn require_id(id: Option<i64>, entity: &str) -> Result<i64> {
    match id {
        Some(id) => validate_id(id),
        None => Err(KitchenError::invalid(format!(
            "{} has no ID; it must be persisted first",
            entity
        ))),
    }
}

/// Inclusive range check.
pub fn validate_range(value: i32, min: i32, max: i32, field: &str) -> Result<i32> {
    if value < min || value > max {
        return Err(KitchenError::invalid(format!(
            "{} must be between {} and {}, got: {}",
            field, min, max, value
        )));
    }
    Ok(value)
}

pub fn validate_week_and_year(week_number: i32, year: i32) -> Result<()> {
    validate_range(week_number, MIN_WEEK, MAX_WEEK, "Week number")?;
    validate_range(year, MIN_YEAR, MAX_YEAR, "Year")?;
    Ok(())
}

/// Returns the trimmed value, or an error if it is blank.
pub fn validate_not_blank(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(KitchenError::invalid(format!("{} cannot be blank", field)));
    }
    Ok(trimmed.to_string())
}

/// Returns the trimmed, lower-cased address.
pub fn validate_email(email: &str) -> Result<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(KitchenError::invalid("Email cannot be blank"));
    }
    if !email_regex().is_match(trimmed) {
        return Err(KitchenError::invalid(format!(
            "'{}' is not a valid email address",
            trimmed
        )));
    }
    Ok(trimmed.to_lowercase())
}

/// At least 8 characters, one upper-case letter and one digit.
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < 8 {
        return Err(KitchenError::invalid(
            "Password must be at least 8 characters",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(KitchenError::invalid(
            "Password must contain an upper-case letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(KitchenError::invalid("Password must contain a digit"));
    }
    Ok(())
}

/// Person names: non-blank and at least two characters after trimming.
pub fn validate_name(name: &str, field: &str) -> Result<String> {
    let trimmed = validate_not_blank(name, field)?;
    if trimmed.chars().count() < 2 {
        return Err(KitchenError::invalid(format!(
            "{} must be at least 2 characters",
            field
        )));
    }
    Ok(trimmed)
}

pub fn validate_quantity(quantity: f64, field: &str) -> Result<f64> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(KitchenError::invalid(format!(
            "{} must be a non-negative number, got: {}",
            field, quantity
        )));
    }
    Ok(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_invalid<T: std::fmt::Debug>(result: Result<T>) -> bool {
        matches!(result, Err(KitchenError::InvalidArgument(_)))
    }

    #[test]
    fn test_validate_id() {
        assert_eq!(validate_id(1).unwrap(), 1);
        assert!(is_invalid(validate_id(0)));
        assert!(is_invalid(validate_id(-7)));
    }

    #[test]
    fn test_require_id() {
        assert_eq!(require_id(Some(3), "User").unwrap(), 3);
        assert!(is_invalid(require_id(None, "User")));
        assert!(is_invalid(require_id(Some(0), "User")));
    }

    #[test]
    fn test_validate_week_and_year_bounds() {
        assert!(validate_week_and_year(1, 2000).is_ok());
        assert!(validate_week_and_year(53, 2100).is_ok());
        assert!(is_invalid(validate_week_and_year(0, 2025)));
        assert!(is_invalid(validate_week_and_year(60, 2025)));
        assert!(is_invalid(validate_week_and_year(7, 1999)));
        assert!(is_invalid(validate_week_and_year(7, 2101)));
    }

    #[test]
    fn test_validate_email_normalizes() {
        assert_eq!(
            validate_email("  Gordon@Kitchen.COM ").unwrap(),
            "gordon@kitchen.com"
        );
    }

    #[test]
    fn test_validate_email_rejects_malformed() {
        assert!(is_invalid(validate_email("")));
        assert!(is_invalid(validate_email("gordon")));
        assert!(is_invalid(validate_email("gordon@kitchen")));
        assert!(is_invalid(validate_email("gordon@kitchen.c")));
        assert!(is_invalid(validate_email("gor don@kitchen.com")));
    }

    #[test]
    fn test_validate_password_rules() {
        assert!(validate_password("Secret123").is_ok());
        assert!(is_invalid(validate_password("Sh0rt")));
        assert!(is_invalid(validate_password("alllower123")));
        assert!(is_invalid(validate_password("NoDigitsHere")));
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Gordon ", "First name").unwrap(), "Gordon");
        assert!(is_invalid(validate_name("G", "First name")));
        assert!(is_invalid(validate_name("   ", "First name")));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(0.0, "Quantity").is_ok());
        assert!(validate_quantity(2.5, "Quantity").is_ok());
        assert!(is_invalid(validate_quantity(-1.0, "Quantity")));
        assert!(is_invalid(validate_quantity(f64::NAN, "Quantity")));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::role::{Action, Role};
use crate::error::{KitchenError, Result};
use crate::password;
use crate::validation;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub(crate) hashed_password: String,
    pub role: Role,
    pub station_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Builds a transient user. The email is validated and stored trimmed and
    /// lower-cased; `hashed_password` must already be a hash.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: &str,
        hashed_password: impl Into<String>,
        role: Role,
    ) -> Result<Self> {
        let email = validation::validate_email(email)?;
        let now = Utc::now();
        Ok(Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email,
            hashed_password: hashed_password.into(),
            role,
            station_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_station(mut self, station_id: i64) -> Self {
        self.station_id = Some(station_id);
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_head_chef(&self) -> bool {
        self.role == Role::HeadChef
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn can(&self, action: Action) -> bool {
        self.role.has_permission(action)
    }

    /// Fails with `Unauthorized` unless this user's role allows `action`.
    pub fn authorize(&self, action: Action) -> Result<()> {
        if self.can(action) {
            Ok(())
        } else {
            Err(KitchenError::unauthorized(format!(
                "{} ({}) is not allowed to {}",
                self.email, self.role, action
            )))
        }
    }

    pub fn verify_password(&self, plain_text_password: &str) -> bool {
        password::verify_password(plain_text_password, &self.hashed_password)
    }

    pub(crate) fn set_hashed_password(&mut self, hashed_password: String) {
        self.hashed_password = hashed_password;
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validation::validate_not_blank(&self.first_name, "First name")?;
        validation::validate_not_blank(&self.last_name, "Last name")?;
        validation::validate_email(&self.email)?;
        validation::validate_not_blank(&self.hashed_password, "Password hash")?;
        Ok(())
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> [{}]", self.full_name(), self.email, self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_normalizes_email() {
        let user = User::new("Gordon", "Ramsay", " Gordon@Kitchen.com ", "hash", Role::HeadChef)
            .unwrap();
        assert_eq!(user.email, "gordon@kitchen.com");
        assert!(user.id.is_none());
        assert!(user.is_head_chef());
    }

    #[test]
    fn test_new_user_rejects_bad_email() {
        let result = User::new("Gordon", "Ramsay", "not-an-email", "hash", Role::HeadChef);
        assert!(matches!(result, Err(KitchenError::InvalidArgument(_))));
    }

    #[test]
    fn test_authorize() {
        let cook = User::new("Claire", "Smyth", "claire@pastry.com", "hash", Role::LineCook)
            .unwrap();
        assert!(cook.authorize(Action::SuggestDish).is_ok());
        assert!(matches!(
            cook.authorize(Action::PublishMenu),
            Err(KitchenError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_identity_equality() {
        let mut a = User::new("Marco", "Pierre", "marco@grill.com", "hash", Role::LineCook).unwrap();
        let mut b = a.clone();
        assert_ne!(a, b, "transient users are never equal");

        a.id = Some(4);
        b.id = Some(4);
        b.first_name = "Someone".to_string();
        assert_eq!(a, b);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new("Rene", "Redzepi", "rene@cold.com", "secret-hash", Role::LineCook)
            .unwrap();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"LINE_COOK\""));
    }
}

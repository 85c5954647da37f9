use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::role::Action;
use super::user::User;
use crate::error::{KitchenError, Result};

/// A kitchen station (Hot Kitchen, Pastry, ...). Names are stored trimmed and
/// upper-cased so that uniqueness is case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: Option<i64>,
    pub(crate) name: String,
    pub description: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Station {
    /// Only a head chef may open a new station.
    pub fn create(name: &str, description: Option<String>, creator: &User) -> Result<Self> {
        creator.authorize(Action::ManageStations)?;
        let name = Self::normalize_name(name)?;

        Ok(Self {
            id: None,
            name,
            description: description.filter(|d| !d.trim().is_empty()),
            created_by: creator.id,
            created_at: Utc::now(),
        })
    }

    /// Trim + upper-case; blank names are rejected.
    pub fn normalize_name(name: &str) -> Result<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(KitchenError::invalid("Station name cannot be empty"));
        }
        Ok(trimmed.to_uppercase())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: &str) -> Result<()> {
        self.name = Self::normalize_name(name)?;
        Ok(())
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{} ({})", self.name, description),
            None => write!(f, "{}", self.name),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::validation;

/// Shared reference data; dish suggestions link to allergens, never own them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allergen {
    pub id: Option<i64>,
    pub name: String,
    pub icon_code: Option<String>,
}

impl Allergen {
    pub fn new(name: &str) -> Result<Self> {
        Ok(Self {
            id: None,
            name: validation::validate_not_blank(name, "Allergen name")?,
            icon_code: None,
        })
    }

    pub fn with_icon_code(mut self, icon_code: impl Into<String>) -> Self {
        self.icon_code = Some(icon_code.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validation::validate_not_blank(&self.name, "Allergen name")?;
        Ok(())
    }
}

impl fmt::Display for Allergen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.icon_code {
            Some(icon) => write!(f, "{} [{}]", self.name, icon),
            None => write!(f, "{}", self.name),
        }
    }
}

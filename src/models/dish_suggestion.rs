use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::allergen::Allergen;
use super::review::Review;
use super::role::Action;
use super::station::Station;
use super::status::ReviewStatus;
use super::user::User;
use crate::error::Result;
use crate::validation;

/// A dish proposed by a cook for a station, awaiting head-chef review.
/// Names and descriptions are kept in Danish and, optionally, English.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishSuggestion {
    pub id: Option<i64>,
    pub name_da: String,
    pub name_en: Option<String>,
    pub description_da: String,
    pub description_en: Option<String>,
    pub station_id: i64,
    pub created_by: i64,
    pub allergens: Vec<Allergen>,
    #[serde(flatten)]
    pub(crate) review: Review,
    pub created_at: DateTime<Utc>,
}

impl DishSuggestion {
    /// Both the station and the author must already be persisted.
    pub fn new(
        name: &str,
        description: impl Into<String>,
        station: &Station,
        author: &User,
    ) -> Result<Self> {
        author.authorize(Action::SuggestDish)?;
        Ok(Self {
            id: None,
            name_da: validation::validate_not_blank(name, "Dish name")?,
            name_en: None,
            description_da: description.into(),
            description_en: None,
            station_id: validation::require_id(station.id, "Station")?,
            created_by: validation::require_id(author.id, "Author")?,
            allergens: Vec::new(),
            review: Review::pending(),
            created_at: Utc::now(),
        })
    }

    pub fn with_english(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.name_en = Some(name.into());
        self.description_en = Some(description.into());
        self
    }

    pub fn with_allergens(mut self, allergens: Vec<Allergen>) -> Self {
        for allergen in allergens {
            self.add_allergen(allergen);
        }
        self
    }

    /// Adds a link to an allergen; the same allergen is only linked once.
    pub fn add_allergen(&mut self, allergen: Allergen) {
        if !self.allergens.iter().any(|a| a == &allergen) {
            self.allergens.push(allergen);
        }
    }

    pub fn remove_allergen(&mut self, allergen_id: i64) -> Option<Allergen> {
        let index = self
            .allergens
            .iter()
            .position(|a| a.id == Some(allergen_id))?;
        Some(self.allergens.remove(index))
    }

    pub fn review(&self) -> &Review {
        &self.review
    }

    pub fn status(&self) -> ReviewStatus {
        self.review.status()
    }

    pub fn reviewed_by(&self) -> Option<i64> {
        self.review.reviewed_by()
    }

    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.review.reviewed_at()
    }

    pub fn feedback(&self) -> Option<&str> {
        self.review.feedback()
    }

    pub fn approve(&mut self, head_chef: &User) -> Result<()> {
        self.review
            .approve(head_chef, Action::ReviewDishSuggestion, "dish suggestion")
    }

    pub fn reject(&mut self, head_chef: &User, feedback: &str) -> Result<()> {
        self.review.reject(
            head_chef,
            Action::ReviewDishSuggestion,
            "dish suggestion",
            feedback,
        )
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validation::validate_not_blank(&self.name_da, "Dish name")?;
        validation::validate_id(self.station_id)?;
        validation::validate_id(self.created_by)?;
        for allergen in &self.allergens {
            validation::require_id(allergen.id, "Allergen")?;
        }
        Ok(())
    }
}

impl fmt::Display for DishSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name_da)?;
        writeln!(f, "{}", "=".repeat(self.name_da.chars().count()))?;
        if let Some(name_en) = &self.name_en {
            writeln!(f, "English: {}", name_en)?;
        }
        writeln!(f, "Status: {}", self.status())?;
        if let Some(feedback) = self.feedback() {
            writeln!(f, "Feedback: {}", feedback)?;
        }
        if !self.description_da.is_empty() {
            writeln!(f, "\n{}", self.description_da)?;
        }
        if !self.allergens.is_empty() {
            writeln!(f, "\nAllergens:")?;
            for allergen in &self.allergens {
                writeln!(f, "  - {}", allergen)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KitchenError;
    use crate::models::Role;

    fn user(role: Role, id: i64) -> User {
        let mut user = User::new("Test", "User", "test@kitchen.com", "hash", role).unwrap();
        user.id = Some(id);
        user
    }

    fn station() -> Station {
        let mut station = Station::create("Hot Kitchen", None, &user(Role::HeadChef, 1)).unwrap();
        station.id = Some(10);
        station
    }

    fn allergen(id: i64, name: &str) -> Allergen {
        let mut allergen = Allergen::new(name).unwrap();
        allergen.id = Some(id);
        allergen
    }

    #[test]
    fn test_new_suggestion_is_pending() {
        let dish = DishSuggestion::new("Pasta", "Fresh pasta", &station(), &user(Role::LineCook, 2))
            .unwrap()
            .with_english("Pasta", "Fresh pasta");

        assert_eq!(dish.status(), ReviewStatus::Pending);
        assert_eq!(dish.station_id, 10);
        assert_eq!(dish.created_by, 2);
        assert!(dish.reviewed_by().is_none());
    }

    #[test]
    fn test_new_requires_persisted_station() {
        let mut transient = station();
        transient.id = None;
        let result = DishSuggestion::new("Pasta", "", &transient, &user(Role::LineCook, 2));
        assert!(matches!(result, Err(KitchenError::InvalidArgument(_))));
    }

    #[test]
    fn test_approve_then_approve_again() {
        let gordon = user(Role::HeadChef, 1);
        let mut dish =
            DishSuggestion::new("Pasta", "", &station(), &user(Role::LineCook, 2)).unwrap();

        dish.approve(&gordon).unwrap();
        assert_eq!(dish.status(), ReviewStatus::Approved);
        assert_eq!(dish.reviewed_by(), Some(1));
        assert!(dish.reviewed_at().is_some());

        assert!(matches!(
            dish.approve(&gordon),
            Err(KitchenError::IllegalState(_))
        ));
    }

    #[test]
    fn test_reject_by_line_cook_is_unauthorized() {
        let mut dish =
            DishSuggestion::new("Pasta", "", &station(), &user(Role::LineCook, 2)).unwrap();
        let result = dish.reject(&user(Role::LineCook, 3), "nope");
        assert!(matches!(result, Err(KitchenError::Unauthorized(_))));
        assert_eq!(dish.status(), ReviewStatus::Pending);
    }

    #[test]
    fn test_allergens_deduplicated() {
        let mut dish = DishSuggestion::new("Pasta", "", &station(), &user(Role::LineCook, 2))
            .unwrap()
            .with_allergens(vec![allergen(1, "Gluten"), allergen(2, "Dairy")]);
        dish.add_allergen(allergen(1, "Gluten"));
        assert_eq!(dish.allergens.len(), 2);

        let removed = dish.remove_allergen(2).unwrap();
        assert_eq!(removed.name, "Dairy");
        assert_eq!(dish.allergens.len(), 1);
        assert!(dish.remove_allergen(99).is_none());
    }

    #[test]
    fn test_display_lists_allergens() {
        let dish = DishSuggestion::new("Tarteletter", "Høns i asparges", &station(), &user(Role::LineCook, 2))
            .unwrap()
            .with_allergens(vec![allergen(1, "Gluten")]);
        let output = dish.to_string();
        assert!(output.contains("Tarteletter"));
        assert!(output.contains("PENDING"));
        assert!(output.contains("Gluten"));
    }
}

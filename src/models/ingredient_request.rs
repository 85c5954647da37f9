use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::review::Review;
use super::role::Action;
use super::status::{RequestType, ReviewStatus};
use super::user::User;
use crate::error::{KitchenError, Result};
use crate::validation;

/// A request for an ingredient to be ordered for a given delivery date,
/// either for a specific dish or for general stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientRequest {
    pub id: Option<i64>,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub preferred_supplier: Option<String>,
    pub note: Option<String>,
    pub request_type: RequestType,
    pub delivery_date: NaiveDate,
    pub dish_suggestion_id: Option<i64>,
    pub created_by: i64,
    #[serde(flatten)]
    pub(crate) review: Review,
    pub created_at: DateTime<Utc>,
}

impl IngredientRequest {
    pub fn new(
        name: &str,
        quantity: f64,
        unit: &str,
        request_type: RequestType,
        delivery_date: NaiveDate,
        author: &User,
    ) -> Result<Self> {
        author.authorize(Action::RequestIngredient)?;
        Ok(Self {
            id: None,
            name: validation::validate_not_blank(name, "Ingredient name")?,
            quantity,
            unit: validation::validate_not_blank(unit, "Unit")?,
            preferred_supplier: None,
            note: None,
            request_type,
            delivery_date,
            dish_suggestion_id: None,
            created_by: validation::require_id(author.id, "Author")?,
            review: Review::pending(),
            created_at: Utc::now(),
        })
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.preferred_supplier = Some(supplier.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn for_dish(mut self, dish_suggestion_id: i64) -> Self {
        self.dish_suggestion_id = Some(dish_suggestion_id);
        self
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
            .approve(head_chef, Action::ReviewIngredientRequest, "ingredient request")
    }

    pub fn reject(&mut self, head_chef: &User, feedback: &str) -> Result<()> {
        self.review.reject(
            head_chef,
            Action::ReviewIngredientRequest,
            "ingredient request",
            feedback,
        )
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validation::validate_not_blank(&self.name, "Ingredient name")?;
        validation::validate_not_blank(&self.unit, "Unit")?;
        validation::validate_quantity(self.quantity, "Quantity")?;
        if self.quantity == 0.0 {
            return Err(KitchenError::invalid("Quantity must be greater than 0"));
        }
        validation::validate_id(self.created_by)?;
        match (self.request_type, self.dish_suggestion_id) {
            (RequestType::DishSpecific, None) => Err(KitchenError::invalid(
                "A dish-specific request must reference a dish suggestion",
            )),
            (_, Some(id)) => validation::validate_id(id).map(|_| ()),
            (RequestType::GeneralStock, None) => Ok(()),
        }
    }
}

impl fmt::Display for IngredientRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} for {} [{}]",
            self.quantity,
            self.unit,
            self.name,
            self.delivery_date,
            self.status()
        )?;
        if let Some(supplier) = &self.preferred_supplier {
            write!(f, " from {}", supplier)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user(role: Role, id: i64) -> User {
        let mut user = User::new("Test", "User", "test@kitchen.com", "hash", role).unwrap();
        user.id = Some(id);
        user
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 14).unwrap()
    }

    #[test]
    fn test_new_request() {
        let request = IngredientRequest::new(
            "Hvedemel Type 00",
            25.0,
            "kg",
            RequestType::GeneralStock,
            date(),
            &user(Role::HeadChef, 1),
        )
        .unwrap()
        .with_supplier("Valsemøllen")
        .with_note("Lageret er næsten tomt");

        assert_eq!(request.status(), ReviewStatus::Pending);
        assert!(request.validate().is_ok());
        assert_eq!(
            request.to_string(),
            "25 kg Hvedemel Type 00 for 2025-02-14 [PENDING] from Valsemøllen"
        );
    }

    #[test]
    fn test_dish_specific_requires_dish() {
        let request = IngredientRequest::new(
            "Frisk Dild",
            10.0,
            "bundter",
            RequestType::DishSpecific,
            date(),
            &user(Role::LineCook, 2),
        )
        .unwrap();
        assert!(matches!(
            request.validate(),
            Err(KitchenError::InvalidArgument(_))
        ));
        assert!(request.for_dish(5).validate().is_ok());
    }

    #[test]
    fn test_zero_quantity_invalid() {
        let request = IngredientRequest::new(
            "Salt",
            0.0,
            "kg",
            RequestType::GeneralStock,
            date(),
            &user(Role::LineCook, 2),
        )
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_review_flow() {
        let gordon = user(Role::HeadChef, 1);
        let mut request = IngredientRequest::new(
            "Trøffelolie",
            2.0,
            "liter",
            RequestType::GeneralStock,
            date(),
            &user(Role::LineCook, 2),
        )
        .unwrap();

        assert!(matches!(
            request.approve(&user(Role::ChefDePartie, 3)),
            Err(KitchenError::Unauthorized(_))
        ));
        request.reject(&gordon, "Too expensive").unwrap();
        assert_eq!(request.status(), ReviewStatus::Rejected);
        assert_eq!(request.feedback(), Some("Too expensive"));
        assert!(matches!(
            request.approve(&gordon),
            Err(KitchenError::IllegalState(_))
        ));
    }
}

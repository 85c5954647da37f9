use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{AllergenRepository, DishSuggestionRepository, StationRepository};
use crate::error::Result;
use crate::models::{DishSuggestion, ReviewStatus, User};

/// Input for [`DishSuggestionService::suggest`].
#[derive(Debug, Clone, Default)]
pub struct NewDishSuggestion {
    pub name_da: String,
    pub description_da: String,
    pub name_en: Option<String>,
    pub description_en: Option<String>,
    pub station_id: i64,
    pub allergen_ids: Vec<i64>,
}

pub struct DishSuggestionService {
    dishes: DishSuggestionRepository,
    stations: StationRepository,
    allergens: AllergenRepository,
}

impl DishSuggestionService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            dishes: DishSuggestionRepository::new(pool.clone()),
            stations: StationRepository::new(pool.clone()),
            allergens: AllergenRepository::new(pool),
        }
    }

    pub async fn suggest(&self, author: &User, input: NewDishSuggestion) -> Result<DishSuggestion> {
        let station = self.stations.get_by_id(input.station_id).await?;

        let mut allergens = Vec::with_capacity(input.allergen_ids.len());
        for allergen_id in &input.allergen_ids {
            allergens.push(self.allergens.get_by_id(*allergen_id).await?);
        }

        let mut dish = DishSuggestion::new(&input.name_da, input.description_da, &station, author)?
            .with_allergens(allergens);
        dish.name_en = input.name_en;
        dish.description_en = input.description_en;

        let dish = self.dishes.create(&dish).await?;
        info!(
            dish_suggestion_id = ?dish.id,
            name = %dish.name_da,
            station = %station.name(),
            "dish suggested"
        );
        Ok(dish)
    }

    /// Loads the suggestion, approves it as `actor` and persists the result.
    pub async fn approve(&self, actor: &User, dish_id: i64) -> Result<DishSuggestion> {
        let mut dish = self.dishes.get_by_id(dish_id).await?;
        dish.approve(actor).inspect_err(|e| {
            warn!(dish_suggestion_id = dish_id, actor = %actor.email, error = %e, "approval refused");
        })?;

        let dish = self.dishes.record_review(&dish).await.inspect_err(|e| {
            warn!(dish_suggestion_id = dish_id, actor = %actor.email, error = %e, "review not recorded");
        })?;
        info!(dish_suggestion_id = dish_id, reviewer = %actor.email, "dish suggestion approved");
        Ok(dish)
    }

    pub async fn reject(&self, actor: &User, dish_id: i64, feedback: &str) -> Result<DishSuggestion> {
        let mut dish = self.dishes.get_by_id(dish_id).await?;
        dish.reject(actor, feedback).inspect_err(|e| {
            warn!(dish_suggestion_id = dish_id, actor = %actor.email, error = %e, "rejection refused");
        })?;

        let dish = self.dishes.record_review(&dish).await.inspect_err(|e| {
            warn!(dish_suggestion_id = dish_id, actor = %actor.email, error = %e, "review not recorded");
        })?;
        info!(dish_suggestion_id = dish_id, reviewer = %actor.email, "dish suggestion rejected");
        Ok(dish)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<DishSuggestion> {
        self.dishes.get_by_id(id).await
    }

    pub async fn find_all(&self) -> Result<Vec<DishSuggestion>> {
        self.dishes.get_all().await
    }

    pub async fn find_by_status(&self, status: ReviewStatus) -> Result<Vec<DishSuggestion>> {
        self.dishes.find_by_status(status).await
    }

    pub async fn find_by_station_and_status(
        &self,
        station_id: i64,
        status: ReviewStatus,
    ) -> Result<Vec<DishSuggestion>> {
        self.dishes.find_by_station_and_status(station_id, status).await
    }

    pub async fn find_by_author(&self, user_id: i64) -> Result<Vec<DishSuggestion>> {
        self.dishes.find_by_created_by(user_id).await
    }

    /// Dishes on the menu for the given week.
    pub async fn find_for_week(&self, week_number: i32, year: i32) -> Result<Vec<DishSuggestion>> {
        self.dishes.find_by_week_and_year(week_number, year).await
    }
}

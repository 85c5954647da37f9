use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{DishSuggestionRepository, IngredientRequestRepository};
use crate::error::Result;
use crate::models::{IngredientRequest, RequestType, ReviewStatus, User};

/// Input for [`IngredientRequestService::submit`].
#[derive(Debug, Clone)]
pub struct NewIngredientRequest {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub request_type: RequestType,
    pub delivery_date: NaiveDate,
    pub preferred_supplier: Option<String>,
    pub note: Option<String>,
    pub dish_suggestion_id: Option<i64>,
}

pub struct IngredientRequestService {
    requests: IngredientRequestRepository,
    dishes: DishSuggestionRepository,
}

impl IngredientRequestService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            requests: IngredientRequestRepository::new(pool.clone()),
            dishes: DishSuggestionRepository::new(pool),
        }
    }

    pub async fn submit(&self, author: &User, input: NewIngredientRequest) -> Result<IngredientRequest> {
        let mut request = IngredientRequest::new(
            &input.name,
            input.quantity,
            &input.unit,
            input.request_type,
            input.delivery_date,
            author,
        )?;
        request.preferred_supplier = input.preferred_supplier;
        request.note = input.note;

        if let Some(dish_id) = input.dish_suggestion_id {
            self.dishes.get_by_id(dish_id).await?;
            request = request.for_dish(dish_id);
        }

        let request = self.requests.create(&request).await?;
        info!(
            ingredient_request_id = ?request.id,
            name = %request.name,
            delivery_date = %request.delivery_date,
            "ingredient requested"
        );
        Ok(request)
    }

    pub async fn approve(&self, actor: &User, request_id: i64) -> Result<IngredientRequest> {
        let mut request = self.requests.get_by_id(request_id).await?;
        request.approve(actor).inspect_err(|e| {
            warn!(ingredient_request_id = request_id, actor = %actor.email, error = %e, "approval refused");
        })?;

        let request = self.requests.record_review(&request).await.inspect_err(|e| {
            warn!(ingredient_request_id = request_id, actor = %actor.email, error = %e, "review not recorded");
        })?;
        info!(ingredient_request_id = request_id, reviewer = %actor.email, "ingredient request approved");
        Ok(request)
    }

    pub async fn reject(
        &self,
        actor: &User,
        request_id: i64,
        feedback: &str,
    ) -> Result<IngredientRequest> {
        let mut request = self.requests.get_by_id(request_id).await?;
        request.reject(actor, feedback).inspect_err(|e| {
            warn!(ingredient_request_id = request_id, actor = %actor.email, error = %e, "rejection refused");
        })?;

        let request = self.requests.record_review(&request).await.inspect_err(|e| {
            warn!(ingredient_request_id = request_id, actor = %actor.email, error = %e, "review not recorded");
        })?;
        info!(ingredient_request_id = request_id, reviewer = %actor.email, "ingredient request rejected");
        Ok(request)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<IngredientRequest> {
        self.requests.get_by_id(id).await
    }

    pub async fn find_all(&self) -> Result<Vec<IngredientRequest>> {
        self.requests.get_all().await
    }

    pub async fn find_by_status(&self, status: ReviewStatus) -> Result<Vec<IngredientRequest>> {
        self.requests.find_by_status(status).await
    }

    /// Approved requests due on `delivery_date`.
    pub async fn find_approved_for_delivery(
        &self,
        delivery_date: NaiveDate,
    ) -> Result<Vec<IngredientRequest>> {
        self.requests
            .find_by_status_and_delivery_date(ReviewStatus::Approved, delivery_date)
            .await
    }

    pub async fn find_by_dish(&self, dish_suggestion_id: i64) -> Result<Vec<IngredientRequest>> {
        self.requests.find_by_dish_suggestion(dish_suggestion_id).await
    }

    pub async fn find_by_author(&self, user_id: i64) -> Result<Vec<IngredientRequest>> {
        self.requests.find_by_created_by(user_id).await
    }
}

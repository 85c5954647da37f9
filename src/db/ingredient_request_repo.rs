use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use super::{delete_error, ensure_transient, stale_write, write_error};
use crate::error::{KitchenError, Result};
use crate::models::{IngredientRequest, RequestType, Review, ReviewStatus};
use crate::validation;

pub struct IngredientRequestRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct IngredientRequestRow {
    id: i64,
    name: String,
    quantity: f64,
    unit: String,
    preferred_supplier: Option<String>,
    note: Option<String>,
    request_type: RequestType,
    delivery_date: NaiveDate,
    dish_suggestion_id: Option<i64>,
    created_by: i64,
    status: ReviewStatus,
    reviewed_by: Option<i64>,
    reviewed_at: Option<DateTime<Utc>>,
    feedback: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<IngredientRequestRow> for IngredientRequest {
    fn from(row: IngredientRequestRow) -> Self {
        IngredientRequest {
            id: Some(row.id),
            name: row.name,
            quantity: row.quantity,
            unit: row.unit,
            preferred_supplier: row.preferred_supplier,
            note: row.note,
            request_type: row.request_type,
            delivery_date: row.delivery_date,
            dish_suggestion_id: row.dish_suggestion_id,
            created_by: row.created_by,
            review: Review::restore(row.status, row.reviewed_by, row.reviewed_at, row.feedback),
            created_at: row.created_at,
        }
    }
}

impl IngredientRequestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &IngredientRequest) -> Result<IngredientRequest> {
        ensure_transient(request.id, "IngredientRequest")?;
        request.validate()?;

        let mut tx = self.pool.begin().await?;

        let review = request.review();
        let id = sqlx::query(
            r#"
            INSERT INTO ingredient_requests (name, quantity, unit, preferred_supplier, note, request_type,
                                             delivery_date, dish_suggestion_id, created_by, status,
                                             reviewed_by, reviewed_at, feedback, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.name.trim())
        .bind(request.quantity)
        .bind(request.unit.trim())
        .bind(&request.preferred_supplier)
        .bind(&request.note)
        .bind(request.request_type)
        .bind(request.delivery_date)
        .bind(request.dish_suggestion_id)
        .bind(request.created_by)
        .bind(review.status())
        .bind(review.reviewed_by())
        .bind(review.reviewed_at())
        .bind(review.feedback())
        .bind(request.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "IngredientRequest"))?
        .last_insert_rowid();

        tx.commit().await?;
        tracing::debug!(ingredient_request_id = id, name = %request.name, "ingredient request created");

        self.get_by_id(id).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<IngredientRequest> {
        validation::validate_id(id)?;

        let row: Option<IngredientRequestRow> =
            sqlx::query_as("SELECT * FROM ingredient_requests WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(IngredientRequest::from)
            .ok_or_else(|| KitchenError::not_found("IngredientRequest", id))
    }

    pub async fn get_all(&self) -> Result<Vec<IngredientRequest>> {
        let rows: Vec<IngredientRequestRow> =
            sqlx::query_as("SELECT * FROM ingredient_requests ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(IngredientRequest::from).collect())
    }

    /// Rewrites the row. The stored review status must be PENDING or already
    /// equal the new one.
    pub async fn update(&self, request: &IngredientRequest) -> Result<IngredientRequest> {
        let id = validation::require_id(request.id, "IngredientRequest")?;
        request.validate()?;

        let mut tx = self.pool.begin().await?;

        let review = request.review();
        let result = sqlx::query(
            r#"
            UPDATE ingredient_requests
            SET name = ?, quantity = ?, unit = ?, preferred_supplier = ?, note = ?, request_type = ?,
                delivery_date = ?, dish_suggestion_id = ?, status = ?, reviewed_by = ?,
                reviewed_at = ?, feedback = ?
            WHERE id = ? AND status IN (?, ?)
            "#,
        )
        .bind(request.name.trim())
        .bind(request.quantity)
        .bind(request.unit.trim())
        .bind(&request.preferred_supplier)
        .bind(&request.note)
        .bind(request.request_type)
        .bind(request.delivery_date)
        .bind(request.dish_suggestion_id)
        .bind(review.status())
        .bind(review.reviewed_by())
        .bind(review.reviewed_at())
        .bind(review.feedback())
        .bind(id)
        .bind(ReviewStatus::Pending)
        .bind(review.status())
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "IngredientRequest"))?;

        if result.rows_affected() == 0 {
            return Err(stale_write(&mut tx, "ingredient_requests", "IngredientRequest", id).await);
        }

        tx.commit().await?;
        tracing::debug!(ingredient_request_id = id, status = %review.status(), "ingredient request updated");

        self.get_by_id(id).await
    }

    /// Persists an approve or reject decision on a request still PENDING in
    /// the store.
    pub async fn record_review(&self, request: &IngredientRequest) -> Result<IngredientRequest> {
        let id = validation::require_id(request.id, "IngredientRequest")?;
        let review = request.review();
        if review.is_pending() {
            return Err(KitchenError::invalid(
                "IngredientRequest has no review decision to record",
            ));
        }

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE ingredient_requests
            SET status = ?, reviewed_by = ?, reviewed_at = ?, feedback = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(review.status())
        .bind(review.reviewed_by())
        .bind(review.reviewed_at())
        .bind(review.feedback())
        .bind(id)
        .bind(ReviewStatus::Pending)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "IngredientRequest"))?;

        if result.rows_affected() == 0 {
            return Err(stale_write(&mut tx, "ingredient_requests", "IngredientRequest", id).await);
        }

        tx.commit().await?;
        tracing::debug!(ingredient_request_id = id, status = %review.status(), "ingredient request reviewed");

        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        validation::validate_id(id)?;

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM ingredient_requests WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| delete_error(e, "IngredientRequest", id))?;

        if result.rows_affected() == 0 {
            return Err(KitchenError::not_found("IngredientRequest", id));
        }

        tx.commit().await?;
        Ok(true)
    }

    pub async fn find_by_status(&self, status: ReviewStatus) -> Result<Vec<IngredientRequest>> {
        let rows: Vec<IngredientRequestRow> =
            sqlx::query_as("SELECT * FROM ingredient_requests WHERE status = ? ORDER BY id")
                .bind(status)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(IngredientRequest::from).collect())
    }

    pub async fn find_by_status_and_delivery_date(
        &self,
        status: ReviewStatus,
        delivery_date: NaiveDate,
    ) -> Result<Vec<IngredientRequest>> {
        let rows: Vec<IngredientRequestRow> = sqlx::query_as(
            "SELECT * FROM ingredient_requests WHERE status = ? AND delivery_date = ? ORDER BY id",
        )
        .bind(status)
        .bind(delivery_date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(IngredientRequest::from).collect())
    }

    pub async fn find_by_dish_suggestion(
        &self,
        dish_suggestion_id: i64,
    ) -> Result<Vec<IngredientRequest>> {
        validation::validate_id(dish_suggestion_id)?;
        let rows: Vec<IngredientRequestRow> = sqlx::query_as(
            "SELECT * FROM ingredient_requests WHERE dish_suggestion_id = ? ORDER BY id",
        )
        .bind(dish_suggestion_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(IngredientRequest::from).collect())
    }

    pub async fn find_by_created_by(&self, user_id: i64) -> Result<Vec<IngredientRequest>> {
        validation::validate_id(user_id)?;
        let rows: Vec<IngredientRequestRow> =
            sqlx::query_as("SELECT * FROM ingredient_requests WHERE created_by = ? ORDER BY id")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(IngredientRequest::from).collect())
    }
}

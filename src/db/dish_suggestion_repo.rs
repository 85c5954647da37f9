use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use super::allergen_repo::AllergenRow;
use super::{delete_error, ensure_transient, stale_write, write_error};
use crate::error::{KitchenError, Result};
use crate::models::{Allergen, DishSuggestion, Review, ReviewStatus};
use crate::validation;

pub struct DishSuggestionRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct DishSuggestionRow {
    id: i64,
    name_da: String,
    name_en: Option<String>,
    description_da: String,
    description_en: Option<String>,
    station_id: i64,
    created_by: i64,
    status: ReviewStatus,
    reviewed_by: Option<i64>,
    reviewed_at: Option<DateTime<Utc>>,
    feedback: Option<String>,
    created_at: DateTime<Utc>,
}

impl DishSuggestionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Writes the suggestion and its allergen links in one transaction.
    pub async fn create(&self, dish: &DishSuggestion) -> Result<DishSuggestion> {
        ensure_transient(dish.id, "DishSuggestion")?;
        dish.validate()?;

        let mut tx = self.pool.begin().await?;

        let review = dish.review();
        let id = sqlx::query(
            r#"
            INSERT INTO dish_suggestions (name_da, name_en, description_da, description_en, station_id, created_by,
                                          status, reviewed_by, reviewed_at, feedback, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(dish.name_da.trim())
        .bind(&dish.name_en)
        .bind(&dish.description_da)
        .bind(&dish.description_en)
        .bind(dish.station_id)
        .bind(dish.created_by)
        .bind(review.status())
        .bind(review.reviewed_by())
        .bind(review.reviewed_at())
        .bind(review.feedback())
        .bind(dish.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "DishSuggestion"))?
        .last_insert_rowid();

        Self::insert_allergen_links(&mut tx, id, &dish.allergens).await?;

        tx.commit().await?;
        tracing::debug!(dish_suggestion_id = id, name = %dish.name_da, "dish suggestion created");

        self.get_by_id(id).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<DishSuggestion> {
        validation::validate_id(id)?;

        let row: Option<DishSuggestionRow> =
            sqlx::query_as("SELECT * FROM dish_suggestions WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => self.hydrate_dish_suggestion(row).await,
            None => Err(KitchenError::not_found("DishSuggestion", id)),
        }
    }

    pub async fn get_all(&self) -> Result<Vec<DishSuggestion>> {
        let rows: Vec<DishSuggestionRow> =
            sqlx::query_as("SELECT * FROM dish_suggestions ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        self.hydrate_all(rows).await
    }

    /// Rewrites the row and replaces the allergen links. The stored review
    /// status must be PENDING or already equal the new one; a reviewed
    /// suggestion never moves back.
    pub async fn update(&self, dish: &DishSuggestion) -> Result<DishSuggestion> {
        let id = validation::require_id(dish.id, "DishSuggestion")?;
        dish.validate()?;

        let mut tx = self.pool.begin().await?;

        let review = dish.review();
        let result = sqlx::query(
            r#"
            UPDATE dish_suggestions
            SET name_da = ?, name_en = ?, description_da = ?, description_en = ?, station_id = ?,
                status = ?, reviewed_by = ?, reviewed_at = ?, feedback = ?
            WHERE id = ? AND status IN (?, ?)
            "#,
        )
        .bind(dish.name_da.trim())
        .bind(&dish.name_en)
        .bind(&dish.description_da)
        .bind(&dish.description_en)
        .bind(dish.station_id)
        .bind(review.status())
        .bind(review.reviewed_by())
        .bind(review.reviewed_at())
        .bind(review.feedback())
        .bind(id)
        .bind(ReviewStatus::Pending)
        .bind(review.status())
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "DishSuggestion"))?;

        if result.rows_affected() == 0 {
            return Err(stale_write(&mut tx, "dish_suggestions", "DishSuggestion", id).await);
        }

        sqlx::query("DELETE FROM dish_suggestion_allergens WHERE dish_suggestion_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::insert_allergen_links(&mut tx, id, &dish.allergens).await?;

        tx.commit().await?;
        tracing::debug!(dish_suggestion_id = id, status = %review.status(), "dish suggestion updated");

        self.get_by_id(id).await
    }

    /// Persists an approve or reject decision. Only a row still PENDING in the
    /// store is written, so of two racing reviews exactly one lands.
    pub async fn record_review(&self, dish: &DishSuggestion) -> Result<DishSuggestion> {
        let id = validation::require_id(dish.id, "DishSuggestion")?;
        let review = dish.review();
        if review.is_pending() {
            return Err(KitchenError::invalid(
                "DishSuggestion has no review decision to record",
            ));
        }

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE dish_suggestions
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
        .map_err(|e| write_error(e, "DishSuggestion"))?;

        if result.rows_affected() == 0 {
            return Err(stale_write(&mut tx, "dish_suggestions", "DishSuggestion", id).await);
        }

        tx.commit().await?;
        tracing::debug!(dish_suggestion_id = id, status = %review.status(), "dish suggestion reviewed");

        self.get_by_id(id).await
    }

    /// Allergen links go with the suggestion; the allergens themselves stay.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        validation::validate_id(id)?;

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM dish_suggestions WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| delete_error(e, "DishSuggestion", id))?;

        if result.rows_affected() == 0 {
            return Err(KitchenError::not_found("DishSuggestion", id));
        }

        tx.commit().await?;
        tracing::debug!(dish_suggestion_id = id, "dish suggestion deleted");
        Ok(true)
    }

    pub async fn find_by_status(&self, status: ReviewStatus) -> Result<Vec<DishSuggestion>> {
        let rows: Vec<DishSuggestionRow> =
            sqlx::query_as("SELECT * FROM dish_suggestions WHERE status = ? ORDER BY id")
                .bind(status)
                .fetch_all(&self.pool)
                .await?;
        self.hydrate_all(rows).await
    }

    pub async fn find_by_station_and_status(
        &self,
        station_id: i64,
        status: ReviewStatus,
    ) -> Result<Vec<DishSuggestion>> {
        validation::validate_id(station_id)?;
        let rows: Vec<DishSuggestionRow> = sqlx::query_as(
            "SELECT * FROM dish_suggestions WHERE station_id = ? AND status = ? ORDER BY id",
        )
        .bind(station_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_all(rows).await
    }

    pub async fn find_by_created_by(&self, user_id: i64) -> Result<Vec<DishSuggestion>> {
        validation::validate_id(user_id)?;
        let rows: Vec<DishSuggestionRow> =
            sqlx::query_as("SELECT * FROM dish_suggestions WHERE created_by = ? ORDER BY id")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        self.hydrate_all(rows).await
    }

    /// Suggestions placed on the menu for the given week, each once, in the
    /// order their first slot was added.
    pub async fn find_by_week_and_year(
        &self,
        week_number: i32,
        year: i32,
    ) -> Result<Vec<DishSuggestion>> {
        validation::validate_week_and_year(week_number, year)?;

        let rows: Vec<DishSuggestionRow> = sqlx::query_as(
            r#"
            SELECT ds.* FROM dish_suggestions ds
            JOIN weekly_menu_slots s ON s.dish_suggestion_id = ds.id
            JOIN weekly_menus m ON m.id = s.weekly_menu_id
            WHERE m.week_number = ? AND m.year = ?
            GROUP BY ds.id
            ORDER BY MIN(s.id)
            "#,
        )
        .bind(week_number)
        .bind(year)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_all(rows).await
    }

    async fn insert_allergen_links(
        conn: &mut SqliteConnection,
        dish_id: i64,
        allergens: &[Allergen],
    ) -> Result<()> {
        for allergen in allergens {
            let allergen_id = validation::require_id(allergen.id, "Allergen")?;
            sqlx::query(
                "INSERT INTO dish_suggestion_allergens (dish_suggestion_id, allergen_id) VALUES (?, ?)",
            )
            .bind(dish_id)
            .bind(allergen_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| write_error(e, "DishSuggestion allergen link"))?;
        }
        Ok(())
    }

    async fn hydrate_all(&self, rows: Vec<DishSuggestionRow>) -> Result<Vec<DishSuggestion>> {
        let mut dishes = Vec::with_capacity(rows.len());
        for row in rows {
            dishes.push(self.hydrate_dish_suggestion(row).await?);
        }
        Ok(dishes)
    }

    async fn hydrate_dish_suggestion(&self, row: DishSuggestionRow) -> Result<DishSuggestion> {
        let allergens: Vec<AllergenRow> = sqlx::query_as(
            r#"
            SELECT a.id, a.name, a.icon_code FROM allergens a
            JOIN dish_suggestion_allergens dsa ON dsa.allergen_id = a.id
            WHERE dsa.dish_suggestion_id = ?
            ORDER BY a.id
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(DishSuggestion {
            id: Some(row.id),
            name_da: row.name_da,
            name_en: row.name_en,
            description_da: row.description_da,
            description_en: row.description_en,
            station_id: row.station_id,
            created_by: row.created_by,
            allergens: allergens.into_iter().map(Allergen::from).collect(),
            review: Review::restore(row.status, row.reviewed_by, row.reviewed_at, row.feedback),
            created_at: row.created_at,
        })
    }
}

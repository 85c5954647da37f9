use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;

use super::{delete_error, ensure_transient, stale_write, write_error};
use crate::error::{KitchenError, Result};
use crate::models::{DayOfWeek, MenuStatus, WeeklyMenu, WeeklyMenuSlot};
use crate::validation;

pub struct WeeklyMenuRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct WeeklyMenuRow {
    id: i64,
    week_number: i32,
    year: i32,
    status: MenuStatus,
    published_at: Option<DateTime<Utc>>,
    published_by: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct SlotRow {
    id: i64,
    weekly_menu_id: i64,
    day_of_week: DayOfWeek,
    dish_suggestion_id: Option<i64>,
    station_id: i64,
}

impl From<SlotRow> for WeeklyMenuSlot {
    fn from(row: SlotRow) -> Self {
        WeeklyMenuSlot {
            id: Some(row.id),
            day_of_week: row.day_of_week,
            station_id: row.station_id,
            dish_suggestion_id: row.dish_suggestion_id,
            weekly_menu_id: Some(row.weekly_menu_id),
        }
    }
}

impl WeeklyMenuRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Writes the menu and all of its slots in one transaction.
    pub async fn create(&self, menu: &WeeklyMenu) -> Result<WeeklyMenu> {
        ensure_transient(menu.id, "WeeklyMenu")?;
        menu.validate()?;

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO weekly_menus (week_number, year, status, published_at, published_by)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(menu.week_number())
        .bind(menu.year())
        .bind(menu.status())
        .bind(menu.published_at())
        .bind(menu.published_by())
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "WeeklyMenu"))?
        .last_insert_rowid();

        for slot in menu.slots() {
            if let Some(slot_id) = slot.id {
                return Err(KitchenError::invalid(format!(
                    "Slot {} is already persisted and cannot be added to a new menu",
                    slot_id
                )));
            }
            Self::insert_slot(&mut tx, id, slot).await?;
        }

        tx.commit().await?;
        tracing::debug!(
            weekly_menu_id = id,
            week = menu.week_number(),
            year = menu.year(),
            slots = menu.slots().len(),
            "weekly menu created"
        );

        self.get_by_id(id).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<WeeklyMenu> {
        validation::validate_id(id)?;

        let row: Option<WeeklyMenuRow> = sqlx::query_as("SELECT * FROM weekly_menus WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => self.hydrate_menu(row).await,
            None => Err(KitchenError::not_found("WeeklyMenu", id)),
        }
    }

    pub async fn get_all(&self) -> Result<Vec<WeeklyMenu>> {
        let rows: Vec<WeeklyMenuRow> = sqlx::query_as("SELECT * FROM weekly_menus ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        self.hydrate_all(rows).await
    }

    /// Synchronizes slots: new ones are inserted, known ones updated, and
    /// persisted slots no longer on the menu are deleted. Only a menu stored
    /// as DRAFT is written; a published menu is frozen.
    pub async fn update(&self, menu: &WeeklyMenu) -> Result<WeeklyMenu> {
        let id = validation::require_id(menu.id, "WeeklyMenu")?;
        menu.validate()?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE weekly_menus
            SET week_number = ?, year = ?, status = ?, published_at = ?, published_by = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(menu.week_number())
        .bind(menu.year())
        .bind(menu.status())
        .bind(menu.published_at())
        .bind(menu.published_by())
        .bind(id)
        .bind(MenuStatus::Draft)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "WeeklyMenu"))?;

        if result.rows_affected() == 0 {
            return Err(stale_write(&mut tx, "weekly_menus", "WeeklyMenu", id).await);
        }

        let existing: HashSet<i64> =
            sqlx::query_scalar::<_, i64>("SELECT id FROM weekly_menu_slots WHERE weekly_menu_id = ?")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .collect();

        let mut kept = HashSet::new();
        for slot in menu.slots() {
            if let Some(slot_id) = slot.id {
                if !existing.contains(&slot_id) {
                    return Err(KitchenError::invalid(format!(
                        "Slot {} does not belong to weekly menu {}",
                        slot_id, id
                    )));
                }
                kept.insert(slot_id);
            }
        }

        for orphan in existing.difference(&kept) {
            sqlx::query("DELETE FROM weekly_menu_slots WHERE id = ?")
                .bind(*orphan)
                .execute(&mut *tx)
                .await?;
        }

        for slot in menu.slots() {
            match slot.id {
                Some(slot_id) => {
                    sqlx::query(
                        r#"
                        UPDATE weekly_menu_slots
                        SET day_of_week = ?, dish_suggestion_id = ?, station_id = ?, is_empty = ?
                        WHERE id = ?
                        "#,
                    )
                    .bind(slot.day_of_week)
                    .bind(slot.dish_suggestion_id())
                    .bind(slot.station_id)
                    .bind(slot.is_empty())
                    .bind(slot_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| write_error(e, "WeeklyMenuSlot"))?;
                }
                None => {
                    Self::insert_slot(&mut tx, id, slot).await?;
                }
            }
        }

        tx.commit().await?;
        tracing::debug!(weekly_menu_id = id, status = %menu.status(), "weekly menu updated");

        self.get_by_id(id).await
    }

    /// Slots are removed with the menu.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        validation::validate_id(id)?;

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM weekly_menus WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| delete_error(e, "WeeklyMenu", id))?;

        if result.rows_affected() == 0 {
            return Err(KitchenError::not_found("WeeklyMenu", id));
        }

        tx.commit().await?;
        tracing::debug!(weekly_menu_id = id, "weekly menu deleted");
        Ok(true)
    }

    pub async fn find_by_status(&self, status: MenuStatus) -> Result<Vec<WeeklyMenu>> {
        let rows: Vec<WeeklyMenuRow> =
            sqlx::query_as("SELECT * FROM weekly_menus WHERE status = ? ORDER BY id")
                .bind(status)
                .fetch_all(&self.pool)
                .await?;
        self.hydrate_all(rows).await
    }

    pub async fn find_by_week_and_year(
        &self,
        week_number: i32,
        year: i32,
    ) -> Result<Option<WeeklyMenu>> {
        validation::validate_week_and_year(week_number, year)?;

        let row: Option<WeeklyMenuRow> =
            sqlx::query_as("SELECT * FROM weekly_menus WHERE week_number = ? AND year = ?")
                .bind(week_number)
                .bind(year)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => self.hydrate_menu(row).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn get_slot_by_id(&self, id: i64) -> Result<WeeklyMenuSlot> {
        validation::validate_id(id)?;

        let row: Option<SlotRow> = sqlx::query_as(
            "SELECT id, weekly_menu_id, day_of_week, dish_suggestion_id, station_id FROM weekly_menu_slots WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(WeeklyMenuSlot::from)
            .ok_or_else(|| KitchenError::not_found("WeeklyMenuSlot", id))
    }

    async fn insert_slot(
        conn: &mut SqliteConnection,
        menu_id: i64,
        slot: &WeeklyMenuSlot,
    ) -> Result<i64> {
        let slot_id = sqlx::query(
            r#"
            INSERT INTO weekly_menu_slots (weekly_menu_id, day_of_week, dish_suggestion_id, station_id, is_empty)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(menu_id)
        .bind(slot.day_of_week)
        .bind(slot.dish_suggestion_id())
        .bind(slot.station_id)
        .bind(slot.is_empty())
        .execute(&mut *conn)
        .await
        .map_err(|e| write_error(e, "WeeklyMenuSlot"))?
        .last_insert_rowid();
        Ok(slot_id)
    }

    async fn hydrate_all(&self, rows: Vec<WeeklyMenuRow>) -> Result<Vec<WeeklyMenu>> {
        let mut menus = Vec::with_capacity(rows.len());
        for row in rows {
            menus.push(self.hydrate_menu(row).await?);
        }
        Ok(menus)
    }

    async fn hydrate_menu(&self, row: WeeklyMenuRow) -> Result<WeeklyMenu> {
        let slots: Vec<SlotRow> = sqlx::query_as(
            r#"
            SELECT id, weekly_menu_id, day_of_week, dish_suggestion_id, station_id
            FROM weekly_menu_slots WHERE weekly_menu_id = ? ORDER BY id
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(WeeklyMenu {
            id: Some(row.id),
            week_number: row.week_number,
            year: row.year,
            status: row.status,
            published_at: row.published_at,
            published_by: row.published_by,
            slots: slots.into_iter().map(WeeklyMenuSlot::from).collect(),
        })
    }
}

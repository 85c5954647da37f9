use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;

use super::{delete_error, ensure_transient, stale_write, write_error};
use crate::error::{KitchenError, Result};
use crate::models::{ShoppingList, ShoppingListItem, ShoppingListStatus};
use crate::validation;

pub struct ShoppingListRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct ShoppingListRow {
    id: i64,
    delivery_date: NaiveDate,
    status: ShoppingListStatus,
    created_by: i64,
    created_at: DateTime<Utc>,
    finalized_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    shopping_list_id: i64,
    ingredient_name: String,
    quantity: f64,
    unit: String,
    supplier: Option<String>,
    is_ordered: bool,
    notes: Option<String>,
}

impl From<ItemRow> for ShoppingListItem {
    fn from(row: ItemRow) -> Self {
        ShoppingListItem {
            id: Some(row.id),
            ingredient_name: row.ingredient_name,
            quantity: row.quantity,
            unit: row.unit,
            supplier: row.supplier,
            is_ordered: row.is_ordered,
            notes: row.notes,
            shopping_list_id: Some(row.shopping_list_id),
        }
    }
}

impl ShoppingListRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Writes the list and all of its items in one transaction.
    pub async fn create(&self, list: &ShoppingList) -> Result<ShoppingList> {
        ensure_transient(list.id, "ShoppingList")?;
        list.validate()?;

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO shopping_lists (delivery_date, status, created_by, created_at, finalized_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(list.delivery_date)
        .bind(list.status())
        .bind(list.created_by)
        .bind(list.created_at)
        .bind(list.finalized_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "ShoppingList"))?
        .last_insert_rowid();

        for item in list.items() {
            if let Some(item_id) = item.id {
                return Err(KitchenError::invalid(format!(
                    "Item {} is already persisted and cannot be added to a new list",
                    item_id
                )));
            }
            Self::insert_item(&mut tx, id, item).await?;
        }

        tx.commit().await?;
        tracing::debug!(
            shopping_list_id = id,
            delivery_date = %list.delivery_date,
            items = list.items().len(),
            "shopping list created"
        );

        self.get_by_id(id).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<ShoppingList> {
        validation::validate_id(id)?;

        let row: Option<ShoppingListRow> =
            sqlx::query_as("SELECT * FROM shopping_lists WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => self.hydrate_list(row).await,
            None => Err(KitchenError::not_found("ShoppingList", id)),
        }
    }

    pub async fn get_all(&self) -> Result<Vec<ShoppingList>> {
        let rows: Vec<ShoppingListRow> =
            sqlx::query_as("SELECT * FROM shopping_lists ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        self.hydrate_all(rows).await
    }

    /// Synchronizes items the same way menus synchronize slots. The stored
    /// status must equal the list's; status only moves through
    /// [`record_finalization`](Self::record_finalization).
    pub async fn update(&self, list: &ShoppingList) -> Result<ShoppingList> {
        let id = validation::require_id(list.id, "ShoppingList")?;
        list.validate()?;

        let mut tx = self.pool.begin().await?;

        let result =
            sqlx::query("UPDATE shopping_lists SET delivery_date = ? WHERE id = ? AND status = ?")
                .bind(list.delivery_date)
                .bind(id)
                .bind(list.status())
                .execute(&mut *tx)
                .await
                .map_err(|e| write_error(e, "ShoppingList"))?;

        if result.rows_affected() == 0 {
            return Err(stale_write(&mut tx, "shopping_lists", "ShoppingList", id).await);
        }

        let existing: HashSet<i64> = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM shopping_list_items WHERE shopping_list_id = ?",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        let mut kept = HashSet::new();
        for item in list.items() {
            if let Some(item_id) = item.id {
                if !existing.contains(&item_id) {
                    return Err(KitchenError::invalid(format!(
                        "Item {} does not belong to shopping list {}",
                        item_id, id
                    )));
                }
                kept.insert(item_id);
            }
        }

        for orphan in existing.difference(&kept) {
            sqlx::query("DELETE FROM shopping_list_items WHERE id = ?")
                .bind(*orphan)
                .execute(&mut *tx)
                .await?;
        }

        for item in list.items() {
            match item.id {
                Some(item_id) => {
                    sqlx::query(
                        r#"
                        UPDATE shopping_list_items
                        SET ingredient_name = ?, quantity = ?, unit = ?, supplier = ?, is_ordered = ?, notes = ?
                        WHERE id = ?
                        "#,
                    )
                    .bind(item.ingredient_name.trim())
                    .bind(item.quantity())
                    .bind(item.unit.trim())
                    .bind(&item.supplier)
                    .bind(item.is_ordered)
                    .bind(&item.notes)
                    .bind(item_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| write_error(e, "ShoppingListItem"))?;
                }
                None => {
                    Self::insert_item(&mut tx, id, item).await?;
                }
            }
        }

        tx.commit().await?;
        tracing::debug!(shopping_list_id = id, status = %list.status(), "shopping list updated");

        self.get_by_id(id).await
    }

    /// Moves a list stored as DRAFT to FINALIZED. Items are left untouched.
    pub async fn record_finalization(&self, list: &ShoppingList) -> Result<ShoppingList> {
        let id = validation::require_id(list.id, "ShoppingList")?;
        let finalized_at = list.finalized_at().ok_or_else(|| {
            KitchenError::invalid("ShoppingList has not been finalized")
        })?;

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE shopping_lists SET status = ?, finalized_at = ? WHERE id = ? AND status = ?",
        )
        .bind(ShoppingListStatus::Finalized)
        .bind(finalized_at)
        .bind(id)
        .bind(ShoppingListStatus::Draft)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(stale_write(&mut tx, "shopping_lists", "ShoppingList", id).await);
        }

        tx.commit().await?;
        tracing::debug!(shopping_list_id = id, "shopping list finalized");

        self.get_by_id(id).await
    }

    /// Items are removed with the list.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        validation::validate_id(id)?;

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM shopping_lists WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| delete_error(e, "ShoppingList", id))?;

        if result.rows_affected() == 0 {
            return Err(KitchenError::not_found("ShoppingList", id));
        }

        tx.commit().await?;
        tracing::debug!(shopping_list_id = id, "shopping list deleted");
        Ok(true)
    }

    pub async fn find_by_status(&self, status: ShoppingListStatus) -> Result<Vec<ShoppingList>> {
        let rows: Vec<ShoppingListRow> =
            sqlx::query_as("SELECT * FROM shopping_lists WHERE status = ? ORDER BY id")
                .bind(status)
                .fetch_all(&self.pool)
                .await?;
        self.hydrate_all(rows).await
    }

    /// The earliest list for the date, if any.
    pub async fn find_by_delivery_date(
        &self,
        delivery_date: NaiveDate,
    ) -> Result<Option<ShoppingList>> {
        let row: Option<ShoppingListRow> = sqlx::query_as(
            "SELECT * FROM shopping_lists WHERE delivery_date = ? ORDER BY id LIMIT 1",
        )
        .bind(delivery_date)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => self.hydrate_list(row).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn get_item_by_id(&self, id: i64) -> Result<ShoppingListItem> {
        validation::validate_id(id)?;

        let row: Option<ItemRow> = sqlx::query_as("SELECT * FROM shopping_list_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ShoppingListItem::from)
            .ok_or_else(|| KitchenError::not_found("ShoppingListItem", id))
    }

    async fn insert_item(
        conn: &mut SqliteConnection,
        list_id: i64,
        item: &ShoppingListItem,
    ) -> Result<i64> {
        let item_id = sqlx::query(
            r#"
            INSERT INTO shopping_list_items (shopping_list_id, ingredient_name, quantity, unit, supplier, is_ordered, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(list_id)
        .bind(item.ingredient_name.trim())
        .bind(item.quantity())
        .bind(item.unit.trim())
        .bind(&item.supplier)
        .bind(item.is_ordered)
        .bind(&item.notes)
        .execute(&mut *conn)
        .await
        .map_err(|e| write_error(e, "ShoppingListItem"))?
        .last_insert_rowid();
        Ok(item_id)
    }

    async fn hydrate_all(&self, rows: Vec<ShoppingListRow>) -> Result<Vec<ShoppingList>> {
        let mut lists = Vec::with_capacity(rows.len());
        for row in rows {
            lists.push(self.hydrate_list(row).await?);
        }
        Ok(lists)
    }

    async fn hydrate_list(&self, row: ShoppingListRow) -> Result<ShoppingList> {
        let items: Vec<ItemRow> = sqlx::query_as(
            "SELECT * FROM shopping_list_items WHERE shopping_list_id = ? ORDER BY id",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ShoppingList {
            id: Some(row.id),
            delivery_date: row.delivery_date,
            created_by: row.created_by,
            created_at: row.created_at,
            status: row.status,
            finalized_at: row.finalized_at,
            items: items.into_iter().map(ShoppingListItem::from).collect(),
        })
    }
}

use sqlx::SqlitePool;

use super::{delete_error, ensure_transient, write_error};
use crate::error::{KitchenError, Result};
use crate::models::Allergen;
use crate::validation;

pub struct AllergenRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
pub(super) struct AllergenRow {
    id: i64,
    name: String,
    icon_code: Option<String>,
}

impl From<AllergenRow> for Allergen {
    fn from(row: AllergenRow) -> Self {
        Allergen {
            id: Some(row.id),
            name: row.name,
            icon_code: row.icon_code,
        }
    }
}

impl AllergenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, allergen: &Allergen) -> Result<Allergen> {
        ensure_transient(allergen.id, "Allergen")?;
        allergen.validate()?;

        let mut tx = self.pool.begin().await?;
        let id = sqlx::query("INSERT INTO allergens (name, icon_code) VALUES (?, ?)")
            .bind(allergen.name.trim())
            .bind(&allergen.icon_code)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, "Allergen"))?
            .last_insert_rowid();
        tx.commit().await?;

        self.get_by_id(id).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Allergen> {
        validation::validate_id(id)?;

        let row: Option<AllergenRow> = sqlx::query_as("SELECT * FROM allergens WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Allergen::from)
            .ok_or_else(|| KitchenError::not_found("Allergen", id))
    }

    pub async fn get_all(&self) -> Result<Vec<Allergen>> {
        let rows: Vec<AllergenRow> = sqlx::query_as("SELECT * FROM allergens ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Allergen::from).collect())
    }

    pub async fn update(&self, allergen: &Allergen) -> Result<Allergen> {
        let id = validation::require_id(allergen.id, "Allergen")?;
        allergen.validate()?;

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("UPDATE allergens SET name = ?, icon_code = ? WHERE id = ?")
            .bind(allergen.name.trim())
            .bind(&allergen.icon_code)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, "Allergen"))?;

        if result.rows_affected() == 0 {
            return Err(KitchenError::not_found("Allergen", id));
        }
        tx.commit().await?;

        self.get_by_id(id).await
    }

    /// Fails with `IllegalState` while a dish suggestion still links to it.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        validation::validate_id(id)?;

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM allergens WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| delete_error(e, "Allergen", id))?;

        if result.rows_affected() == 0 {
            return Err(KitchenError::not_found("Allergen", id));
        }
        tx.commit().await?;
        Ok(true)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Allergen>> {
        let row: Option<AllergenRow> =
            sqlx::query_as("SELECT * FROM allergens WHERE name = ? COLLATE NOCASE")
                .bind(name.trim())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Allergen::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_db;

    #[tokio::test]
    async fn test_create_get_and_find() {
        let db = setup_db().await;
        let repo = AllergenRepository::new(db.pool.clone());

        let created = repo
            .create(&Allergen::new("Gluten").unwrap().with_icon_code("GL"))
            .await
            .unwrap();
        let fetched = repo.get_by_id(created.id.unwrap()).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "Gluten");
        assert_eq!(fetched.icon_code.as_deref(), Some("GL"));

        let found = repo.find_by_name("GLUTEN").await.unwrap();
        assert_eq!(found, Some(created));
        assert!(repo.find_by_name("Sesame").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_case_insensitive() {
        let db = setup_db().await;
        let repo = AllergenRepository::new(db.pool.clone());

        repo.create(&Allergen::new("Nuts").unwrap()).await.unwrap();
        let result = repo.create(&Allergen::new("nuts").unwrap()).await;
        assert!(matches!(result, Err(KitchenError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = setup_db().await;
        let repo = AllergenRepository::new(db.pool.clone());

        let mut allergen = repo.create(&Allergen::new("Dairy").unwrap()).await.unwrap();
        allergen.icon_code = Some("DA".to_string());
        let updated = repo.update(&allergen).await.unwrap();
        assert_eq!(updated.icon_code.as_deref(), Some("DA"));

        let id = updated.id.unwrap();
        assert!(repo.delete(id).await.unwrap());
        assert!(repo.get_all().await.unwrap().is_empty());
        assert!(matches!(
            repo.delete(id).await,
            Err(KitchenError::NotFound(_))
        ));
    }
}

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{delete_error, ensure_transient, write_error};
use crate::error::{KitchenError, Result};
use crate::models::Station;
use crate::validation;

pub struct StationRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct StationRow {
    id: i64,
    name: String,
    description: Option<String>,
    created_by: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<StationRow> for Station {
    fn from(row: StationRow) -> Self {
        Station {
            id: Some(row.id),
            name: row.name,
            description: row.description,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

impl StationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, station: &Station) -> Result<Station> {
        ensure_transient(station.id, "Station")?;
        let name = Station::normalize_name(station.name())?;

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            "INSERT INTO stations (name, description, created_by, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&name)
        .bind(&station.description)
        .bind(station.created_by)
        .bind(station.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "Station"))?
        .last_insert_rowid();

        tx.commit().await?;
        tracing::debug!(station_id = id, name = %name, "station created");

        self.get_by_id(id).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Station> {
        validation::validate_id(id)?;

        let row: Option<StationRow> = sqlx::query_as("SELECT * FROM stations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Station::from)
            .ok_or_else(|| KitchenError::not_found("Station", id))
    }

    pub async fn get_all(&self) -> Result<Vec<Station>> {
        let rows: Vec<StationRow> = sqlx::query_as("SELECT * FROM stations ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Station::from).collect())
    }

    pub async fn update(&self, station: &Station) -> Result<Station> {
        let id = validation::require_id(station.id, "Station")?;
        let name = Station::normalize_name(station.name())?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE stations SET name = ?, description = ? WHERE id = ?")
            .bind(&name)
            .bind(&station.description)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, "Station"))?;

        if result.rows_affected() == 0 {
            return Err(KitchenError::not_found("Station", id));
        }

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Fails with `IllegalState` while dish suggestions or menu slots still
    /// point at the station. Staff assigned to it are unassigned.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        validation::validate_id(id)?;

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM stations WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| delete_error(e, "Station", id))?;

        if result.rows_affected() == 0 {
            return Err(KitchenError::not_found("Station", id));
        }

        tx.commit().await?;
        tracing::debug!(station_id = id, "station deleted");
        Ok(true)
    }

    /// The name is normalized the same way it is on creation.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Station>> {
        let name = Station::normalize_name(name)?;
        let row: Option<StationRow> = sqlx::query_as("SELECT * FROM stations WHERE name = ?")
            .bind(&name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Station::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{insert_user, setup_db};
    use crate::models::{Role, User};

    async fn head_chef(pool: &SqlitePool) -> User {
        let id = insert_user(pool, "gordon@kitchen.com", Role::HeadChef).await;
        let mut user =
            User::new("Gordon", "Ramsay", "gordon@kitchen.com", "hash", Role::HeadChef).unwrap();
        user.id = Some(id);
        user
    }

    #[tokio::test]
    async fn test_create_and_get_station() {
        let db = setup_db().await;
        let repo = StationRepository::new(db.pool.clone());
        let gordon = head_chef(&db.pool).await;

        let station =
            Station::create("Hot Kitchen", Some("Mains".to_string()), &gordon).unwrap();
        let created = repo.create(&station).await.unwrap();

        let fetched = repo.get_by_id(created.id.unwrap()).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.name(), "HOT KITCHEN");
        assert_eq!(fetched.description.as_deref(), Some("Mains"));
        assert_eq!(fetched.created_by, gordon.id);
    }

    #[tokio::test]
    async fn test_duplicate_name_already_exists() {
        let db = setup_db().await;
        let repo = StationRepository::new(db.pool.clone());
        let gordon = head_chef(&db.pool).await;

        repo.create(&Station::create("Pastry", None, &gordon).unwrap())
            .await
            .unwrap();
        let result = repo
            .create(&Station::create(" pastry ", None, &gordon).unwrap())
            .await;
        assert!(matches!(result, Err(KitchenError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_find_by_name_normalizes() {
        let db = setup_db().await;
        let repo = StationRepository::new(db.pool.clone());
        let gordon = head_chef(&db.pool).await;

        repo.create(&Station::create("Cold Kitchen", None, &gordon).unwrap())
            .await
            .unwrap();

        let found = repo.find_by_name("  cold kitchen").await.unwrap();
        assert_eq!(found.unwrap().name(), "COLD KITCHEN");
        assert!(repo.find_by_name("Grill").await.unwrap().is_none());
        assert!(matches!(
            repo.find_by_name(" ").await,
            Err(KitchenError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_station() {
        let db = setup_db().await;
        let repo = StationRepository::new(db.pool.clone());
        let gordon = head_chef(&db.pool).await;

        let mut station = repo
            .create(&Station::create("Grill", None, &gordon).unwrap())
            .await
            .unwrap();
        station.rename("Barbecue").unwrap();
        let updated = repo.update(&station).await.unwrap();
        assert_eq!(updated.name(), "BARBECUE");

        let id = updated.id.unwrap();
        assert!(repo.delete(id).await.unwrap());
        assert!(matches!(
            repo.get_by_id(id).await,
            Err(KitchenError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_referenced_station_is_illegal_state() {
        let db = setup_db().await;
        let repo = StationRepository::new(db.pool.clone());
        let gordon = head_chef(&db.pool).await;

        let station = repo
            .create(&Station::create("Hot Kitchen", None, &gordon).unwrap())
            .await
            .unwrap();
        let station_id = station.id.unwrap();

        sqlx::query(
            "INSERT INTO dish_suggestions (name_da, station_id, created_by, created_at) VALUES ('Pasta', ?, ?, ?)",
        )
        .bind(station_id)
        .bind(gordon.id)
        .bind(Utc::now())
        .execute(&db.pool)
        .await
        .unwrap();

        assert!(matches!(
            repo.delete(station_id).await,
            Err(KitchenError::IllegalState(_))
        ));
        assert!(repo.get_by_id(station_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_unknown_station_not_found() {
        let db = setup_db().await;
        let repo = StationRepository::new(db.pool.clone());
        let gordon = head_chef(&db.pool).await;

        let mut station = Station::create("Ghost", None, &gordon).unwrap();
        station.id = Some(123);
        assert!(matches!(
            repo.update(&station).await,
            Err(KitchenError::NotFound(_))
        ));
    }
}

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{delete_error, ensure_transient, write_error};
use crate::error::{KitchenError, Result};
use crate::models::{Role, User};
use crate::validation;

pub struct UserRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    hashed_password: String,
    role: Role,
    station_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: Some(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            hashed_password: row.hashed_password,
            role: row.role,
            station_id: row.station_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User) -> Result<User> {
        ensure_transient(user.id, "User")?;
        user.validate()?;

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO users (first_name, last_name, email, hashed_password, role, station_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.first_name.trim())
        .bind(user.last_name.trim())
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(user.role)
        .bind(user.station_id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "User"))?
        .last_insert_rowid();

        tx.commit().await?;
        tracing::debug!(user_id = id, email = %user.email, "user created");

        self.get_by_id(id).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<User> {
        validation::validate_id(id)?;

        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::from)
            .ok_or_else(|| KitchenError::not_found("User", id))
    }

    pub async fn get_all(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn update(&self, user: &User) -> Result<User> {
        let id = validation::require_id(user.id, "User")?;
        user.validate()?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = ?, last_name = ?, email = ?, hashed_password = ?, role = ?,
                station_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(user.first_name.trim())
        .bind(user.last_name.trim())
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(user.role)
        .bind(user.station_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "User"))?;

        if result.rows_affected() == 0 {
            return Err(KitchenError::not_found("User", id));
        }

        tx.commit().await?;
        tracing::debug!(user_id = id, "user updated");

        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        validation::validate_id(id)?;

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| delete_error(e, "User", id))?;

        if result.rows_affected() == 0 {
            return Err(KitchenError::not_found("User", id));
        }

        tx.commit().await?;
        tracing::debug!(user_id = id, "user deleted");
        Ok(true)
    }

    /// Lookup is case-insensitive; the address is trimmed first.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(email.trim().to_lowercase())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn find_by_role(&self, role: Role) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as("SELECT * FROM users WHERE role = ? ORDER BY id")
            .bind(role)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn find_by_station(&self, station_id: i64) -> Result<Vec<User>> {
        validation::validate_id(station_id)?;
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT * FROM users WHERE station_id = ? ORDER BY id")
                .bind(station_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{insert_station, setup_db};

    fn gordon() -> User {
        User::new("Gordon", "Ramsay", "gordon@kitchen.com", "hash", Role::HeadChef).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool.clone());

        let created = repo.create(&gordon()).await.unwrap();
        assert!(created.id.is_some());

        let fetched = repo.get_by_id(created.id.unwrap()).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.first_name, "Gordon");
        assert_eq!(fetched.last_name, "Ramsay");
        assert_eq!(fetched.email, "gordon@kitchen.com");
        assert_eq!(fetched.role, Role::HeadChef);
        assert_eq!(fetched.hashed_password, "hash");
        assert!(fetched.station_id.is_none());
    }

    #[tokio::test]
    async fn test_create_persisted_user_is_invalid() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool.clone());

        let created = repo.create(&gordon()).await.unwrap();
        let result = repo.create(&created).await;
        assert!(matches!(result, Err(KitchenError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_already_exists() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool.clone());

        repo.create(&gordon()).await.unwrap();
        let mut twin = gordon();
        twin.email = "GORDON@kitchen.com".to_string();
        let result = repo.create(&twin).await;
        assert!(matches!(result, Err(KitchenError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_get_by_id_errors() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool.clone());

        assert!(matches!(
            repo.get_by_id(0).await,
            Err(KitchenError::InvalidArgument(_))
        ));
        assert!(matches!(
            repo.get_by_id(42).await,
            Err(KitchenError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool.clone());
        let station_id = insert_station(&db.pool, "HOT KITCHEN").await;

        let mut user = repo.create(&gordon()).await.unwrap();
        user.first_name = "Chef".to_string();
        user.station_id = Some(station_id);
        let updated = repo.update(&user).await.unwrap();

        assert_eq!(updated.first_name, "Chef");
        assert_eq!(updated.station_id, Some(station_id));
        assert!(updated.updated_at >= user.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_or_transient_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool.clone());

        let transient = gordon();
        assert!(matches!(
            repo.update(&transient).await,
            Err(KitchenError::InvalidArgument(_))
        ));

        let mut ghost = gordon();
        ghost.id = Some(77);
        assert!(matches!(
            repo.update(&ghost).await,
            Err(KitchenError::NotFound(_))
        ));
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_with_unknown_station_is_not_found() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool.clone());

        let mut user = repo.create(&gordon()).await.unwrap();
        user.station_id = Some(999);
        assert!(matches!(
            repo.update(&user).await,
            Err(KitchenError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool.clone());

        let user = repo.create(&gordon()).await.unwrap();
        let id = user.id.unwrap();
        assert!(repo.delete(id).await.unwrap());
        assert!(matches!(
            repo.get_by_id(id).await,
            Err(KitchenError::NotFound(_))
        ));
        assert!(matches!(
            repo.delete(id).await,
            Err(KitchenError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_finders() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool.clone());
        let station_id = insert_station(&db.pool, "PASTRY").await;

        repo.create(&gordon()).await.unwrap();
        let claire = User::new("Claire", "Smyth", "claire@pastry.com", "hash", Role::LineCook)
            .unwrap()
            .with_station(station_id);
        repo.create(&claire).await.unwrap();
        let marco = User::new("Marco", "Pierre", "marco@grill.com", "hash", Role::LineCook).unwrap();
        repo.create(&marco).await.unwrap();

        let found = repo.find_by_email(" Claire@Pastry.com ").await.unwrap();
        assert_eq!(found.unwrap().first_name, "Claire");
        assert!(repo.find_by_email("nobody@kitchen.com").await.unwrap().is_none());

        assert!(repo.exists_by_email("MARCO@grill.com").await.unwrap());
        assert!(!repo.exists_by_email("rene@cold.com").await.unwrap());

        let cooks = repo.find_by_role(Role::LineCook).await.unwrap();
        assert_eq!(cooks.len(), 2);
        assert_eq!(cooks[0].first_name, "Claire");
        assert_eq!(cooks[1].first_name, "Marco");

        let pastry = repo.find_by_station(station_id).await.unwrap();
        assert_eq!(pastry.len(), 1);
        assert!(matches!(
            repo.find_by_station(-1).await,
            Err(KitchenError::InvalidArgument(_))
        ));
    }
}

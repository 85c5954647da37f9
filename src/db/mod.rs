mod allergen_repo;
mod dish_suggestion_repo;
mod ingredient_request_repo;
mod shopping_list_repo;
mod station_repo;
mod user_repo;
mod weekly_menu_repo;

pub use allergen_repo::AllergenRepository;
pub use dish_suggestion_repo::DishSuggestionRepository;
pub use ingredient_request_repo::IngredientRequestRepository;
pub use shopping_list_repo::ShoppingListRepository;
pub use station_repo::StationRepository;
pub use user_repo::UserRepository;
pub use weekly_menu_repo::WeeklyMenuRepository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::SqliteConnection;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{KitchenError, Result};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Initialize the database connection pool and run migrations
pub async fn init_db(db_path: Option<PathBuf>) -> Result<SqlitePool> {
    let path = db_path.ok_or_else(|| KitchenError::invalid("database_path must be provided"))?;
    connect(&path, DEFAULT_MAX_CONNECTIONS).await
}

/// Open (creating if needed) the SQLite file at `path` with foreign keys
/// enforced on every connection, then apply pending migrations.
pub async fn connect(path: &Path, max_connections: u32) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
        }
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::debug!(path = %path.display(), "database ready");
    Ok(pool)
}

/// Translates constraint failures raised by an insert or update.
pub(crate) fn write_error(err: sqlx::Error, entity: &str) -> KitchenError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return KitchenError::AlreadyExists(format!(
                "{} conflicts with an existing record: {}",
                entity,
                db_err.message()
            ));
        }
        if db_err.is_foreign_key_violation() {
            return KitchenError::NotFound(format!(
                "{} references a record that does not exist",
                entity
            ));
        }
    }
    KitchenError::Database(err)
}

/// Translates constraint failures raised by a delete.
pub(crate) fn delete_error(err: sqlx::Error, entity: &str, id: i64) -> KitchenError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_foreign_key_violation() {
            return KitchenError::illegal_state(format!(
                "{} with ID {} is still referenced and cannot be deleted",
                entity, id
            ));
        }
    }
    KitchenError::Database(err)
}

/// A status-guarded write matched no row: the row is gone (`NotFound`) or
/// its stored status has moved on since it was loaded (`IllegalState`).
pub(crate) async fn stale_write(
    conn: &mut SqliteConnection,
    table: &str,
    entity: &str,
    id: i64,
) -> KitchenError {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", table);
    match sqlx::query_scalar::<_, bool>(&sql).bind(id).fetch_one(conn).await {
        Ok(true) => KitchenError::illegal_state(format!(
            "{} with ID {} was changed by another operation; reload it and try again",
            entity, id
        )),
        Ok(false) => KitchenError::not_found(entity, id),
        Err(e) => KitchenError::Database(e),
    }
}

/// Rejects an entity that already carries an identity.
pub(crate) fn ensure_transient(id: Option<i64>, entity: &str) -> Result<()> {
    match id {
        Some(id) => Err(KitchenError::invalid(format!(
            "{} already has ID {}; use update instead",
            entity, id
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    use crate::models::{Role, Station, User};

    pub struct TestDb {
        pub pool: SqlitePool,
        _temp_dir: TempDir, // Keep alive for duration of test
    }

    pub async fn setup_db() -> TestDb {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = init_db(Some(db_path)).await.unwrap();
        TestDb {
            pool,
            _temp_dir: temp_dir,
        }
    }

    /// Inserts a bare user row and returns its id.
    pub async fn insert_user(pool: &SqlitePool, email: &str, role: Role) -> i64 {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO users (first_name, last_name, email, hashed_password, role, created_at, updated_at)
             VALUES ('Test', 'User', ?, 'hash', ?, ?, ?)",
        )
        .bind(email)
        .bind(role)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    /// Inserts a bare station row and returns its id.
    pub async fn insert_station(pool: &SqlitePool, name: &str) -> i64 {
        sqlx::query("INSERT INTO stations (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(Utc::now())
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    /// Inserts a user row and returns the matching in-memory user.
    pub async fn persisted_user(pool: &SqlitePool, email: &str, role: Role) -> User {
        let id = insert_user(pool, email, role).await;
        let mut user = User::new("Test", "User", email, "hash", role).unwrap();
        user.id = Some(id);
        user
    }

    /// Inserts a station row and returns the matching in-memory station.
    pub async fn persisted_station(pool: &SqlitePool, name: &str) -> Station {
        let id = insert_station(pool, name).await;
        Station {
            id: Some(id),
            name: name.to_string(),
            description: None,
            created_by: None,
            created_at: Utc::now(),
        }
    }
}

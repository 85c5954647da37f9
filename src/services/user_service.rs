use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{StationRepository, UserRepository};
use crate::error::{KitchenError, Result};
use crate::models::{Action, Role, User};
use crate::password;
use crate::validation;

/// Input for [`UserService::register`].
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub station_id: Option<i64>,
}

/// Input for [`UserService::update_profile`].
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

pub struct UserService {
    users: UserRepository,
    stations: StationRepository,
}

impl UserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            stations: StationRepository::new(pool),
        }
    }

    /// Validates the input, rejects a taken email and stores the user with
    /// an Argon2 hash of the password. A given station must exist.
    pub async fn register(&self, registration: Registration) -> Result<User> {
        let first_name = validation::validate_name(&registration.first_name, "First name")?;
        let last_name = validation::validate_name(&registration.last_name, "Last name")?;
        let email = validation::validate_email(&registration.email)?;
        validation::validate_password(&registration.password)?;

        if self.users.exists_by_email(&email).await? {
            return Err(KitchenError::AlreadyExists(format!(
                "A user with email {} already exists",
                email
            )));
        }

        if let Some(station_id) = registration.station_id {
            self.stations.get_by_id(station_id).await?;
        }

        let hashed_password = password::hash_password(&registration.password)?;
        let mut user = User::new(first_name, last_name, &email, hashed_password, registration.role)?;
        if let Some(station_id) = registration.station_id {
            user = user.with_station(station_id);
        }
        let user = self.users.create(&user).await?;

        info!(user_id = ?user.id, email = %user.email, role = %user.role, "user registered");
        Ok(user)
    }

    /// Unknown email and wrong password fail the same way.
    pub async fn login(&self, email: &str, plain_text_password: &str) -> Result<User> {
        let email = validation::validate_email(email)?;

        let Some(user) = self.users.find_by_email(&email).await? else {
            warn!(email = %email, "login failed");
            return Err(KitchenError::InvalidCredentials);
        };

        if !user.verify_password(plain_text_password) {
            warn!(email = %email, "login failed");
            return Err(KitchenError::InvalidCredentials);
        }

        info!(user_id = ?user.id, "user logged in");
        Ok(user)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<User> {
        self.users.get_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User> {
        let email = validation::validate_email(email)?;
        self.users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| KitchenError::NotFound(format!("User with email {} was not found.", email)))
    }

    pub async fn find_all(&self) -> Result<Vec<User>> {
        self.users.get_all().await
    }

    pub async fn find_by_role(&self, role: Role) -> Result<Vec<User>> {
        self.users.find_by_role(role).await
    }

    /// Users edit their own profile; staff managers may edit anyone's.
    pub async fn update_profile(
        &self,
        actor: &User,
        user_id: i64,
        update: ProfileUpdate,
    ) -> Result<User> {
        if actor.id != Some(user_id) {
            actor.authorize(Action::ManageStaff)?;
        }

        let first_name = validation::validate_name(&update.first_name, "First name")?;
        let last_name = validation::validate_name(&update.last_name, "Last name")?;
        let email = validation::validate_email(&update.email)?;

        let mut user = self.users.get_by_id(user_id).await?;
        if email != user.email && self.users.exists_by_email(&email).await? {
            return Err(KitchenError::AlreadyExists(format!(
                "A user with email {} already exists",
                email
            )));
        }

        user.first_name = first_name;
        user.last_name = last_name;
        user.email = email;
        let user = self.users.update(&user).await?;

        info!(user_id, "profile updated");
        Ok(user)
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<User> {
        let mut user = self.users.get_by_id(user_id).await?;
        if !user.verify_password(current_password) {
            warn!(user_id, "password change refused");
            return Err(KitchenError::InvalidCredentials);
        }
        validation::validate_password(new_password)?;

        user.set_hashed_password(password::hash_password(new_password)?);
        let user = self.users.update(&user).await?;

        info!(user_id, "password changed");
        Ok(user)
    }

    pub async fn change_role(&self, actor: &User, user_id: i64, role: Role) -> Result<User> {
        self.authorize(actor, Action::ManageStaff)?;

        let mut user = self.users.get_by_id(user_id).await?;
        let previous = user.role;
        user.role = role;
        let user = self.users.update(&user).await?;

        info!(user_id, from = %previous, to = %role, "role changed");
        Ok(user)
    }

    /// `None` unassigns the user from any station.
    pub async fn assign_station(
        &self,
        actor: &User,
        user_id: i64,
        station_id: Option<i64>,
    ) -> Result<User> {
        self.authorize(actor, Action::ManageStaff)?;

        let mut user = self.users.get_by_id(user_id).await?;
        if let Some(station_id) = station_id {
            self.stations.get_by_id(station_id).await?;
        }
        user.station_id = station_id;
        let user = self.users.update(&user).await?;

        info!(user_id, station_id = ?station_id, "station assigned");
        Ok(user)
    }

    pub async fn delete(&self, actor: &User, user_id: i64) -> Result<bool> {
        self.authorize(actor, Action::ManageStaff)?;
        if actor.id == Some(user_id) {
            return Err(KitchenError::illegal_state("Users cannot delete themselves"));
        }

        let deleted = self.users.delete(user_id).await?;
        info!(user_id, "user deleted");
        Ok(deleted)
    }

    fn authorize(&self, actor: &User, action: Action) -> Result<()> {
        actor.authorize(action).inspect_err(|_| {
            warn!(actor = %actor.email, %action, "unauthorized");
        })
    }
}

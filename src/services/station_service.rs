use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::StationRepository;
use crate::error::{KitchenError, Result};
use crate::models::{Action, Station, User};

pub struct StationService {
    stations: StationRepository,
}

impl StationService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            stations: StationRepository::new(pool),
        }
    }

    pub async fn create_station(
        &self,
        actor: &User,
        name: &str,
        description: Option<String>,
    ) -> Result<Station> {
        let station = Station::create(name, description, actor).inspect_err(|e| {
            warn!(actor = %actor.email, error = %e, "station not created");
        })?;

        if self.stations.find_by_name(station.name()).await?.is_some() {
            return Err(KitchenError::AlreadyExists(format!(
                "Station {} already exists",
                station.name()
            )));
        }

        let station = self.stations.create(&station).await?;
        info!(station_id = ?station.id, name = %station.name(), "station created");
        Ok(station)
    }

    pub async fn rename_station(&self, actor: &User, station_id: i64, name: &str) -> Result<Station> {
        actor.authorize(Action::ManageStations)?;

        let mut station = self.stations.get_by_id(station_id).await?;
        station.rename(name)?;
        if let Some(existing) = self.stations.find_by_name(station.name()).await? {
            if existing.id != station.id {
                return Err(KitchenError::AlreadyExists(format!(
                    "Station {} already exists",
                    station.name()
                )));
            }
        }

        let station = self.stations.update(&station).await?;
        info!(station_id, name = %station.name(), "station renamed");
        Ok(station)
    }

    /// Fails with `IllegalState` while the station has dishes or menu slots.
    pub async fn delete_station(&self, actor: &User, station_id: i64) -> Result<bool> {
        actor.authorize(Action::ManageStations)?;
        let deleted = self.stations.delete(station_id).await?;
        info!(station_id, "station deleted");
        Ok(deleted)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Station> {
        self.stations.get_by_id(id).await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Station>> {
        self.stations.find_by_name(name).await
    }

    pub async fn find_all(&self) -> Result<Vec<Station>> {
        self.stations.get_all().await
    }
}

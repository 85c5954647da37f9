use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{DishSuggestionRepository, StationRepository, WeeklyMenuRepository};
use crate::error::{KitchenError, Result};
use crate::models::{Action, DayOfWeek, MenuStatus, ReviewStatus, User, WeeklyMenu, WeeklyMenuSlot};

pub struct WeeklyMenuService {
    menus: WeeklyMenuRepository,
    dishes: DishSuggestionRepository,
    stations: StationRepository,
}

impl WeeklyMenuService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            menus: WeeklyMenuRepository::new(pool.clone()),
            dishes: DishSuggestionRepository::new(pool.clone()),
            stations: StationRepository::new(pool),
        }
    }

    /// Opens an empty draft menu for the week. One menu per week and year.
    pub async fn create_menu(&self, actor: &User, week_number: i32, year: i32) -> Result<WeeklyMenu> {
        actor.authorize(Action::PlanMenu).inspect_err(|e| {
            warn!(actor = %actor.email, error = %e, "menu not created");
        })?;

        let menu = WeeklyMenu::new(week_number, year)?;
        if self.menus.find_by_week_and_year(week_number, year).await?.is_some() {
            return Err(KitchenError::AlreadyExists(format!(
                "A menu for week {} of {} already exists",
                week_number, year
            )));
        }

        let menu = self.menus.create(&menu).await?;
        info!(weekly_menu_id = ?menu.id, week = week_number, year, "weekly menu created");
        Ok(menu)
    }

    pub async fn add_slot(
        &self,
        actor: &User,
        menu_id: i64,
        day_of_week: DayOfWeek,
        station_id: i64,
        dish_suggestion_id: Option<i64>,
    ) -> Result<WeeklyMenu> {
        actor.authorize(Action::PlanMenu)?;

        let mut menu = self.draft_menu(menu_id).await?;
        self.stations.get_by_id(station_id).await?;
        if let Some(dish_id) = dish_suggestion_id {
            self.ensure_approved(dish_id).await?;
        }

        menu.add_menu_slot(WeeklyMenuSlot::new(day_of_week, dish_suggestion_id, station_id));
        let menu = self.menus.update(&menu).await?;
        info!(weekly_menu_id = menu_id, day = %day_of_week, station_id, "menu slot added");
        Ok(menu)
    }

    pub async fn remove_slot(&self, actor: &User, menu_id: i64, slot_id: i64) -> Result<WeeklyMenu> {
        actor.authorize(Action::PlanMenu)?;

        let mut menu = self.draft_menu(menu_id).await?;
        menu.remove_menu_slot(slot_id)
            .ok_or_else(|| KitchenError::not_found("WeeklyMenuSlot", slot_id))?;

        let menu = self.menus.update(&menu).await?;
        info!(weekly_menu_id = menu_id, slot_id, "menu slot removed");
        Ok(menu)
    }

    /// Puts a dish in a slot, or clears it with `None`.
    pub async fn assign_dish(
        &self,
        actor: &User,
        menu_id: i64,
        slot_id: i64,
        dish_suggestion_id: Option<i64>,
    ) -> Result<WeeklyMenu> {
        actor.authorize(Action::PlanMenu)?;

        let mut menu = self.draft_menu(menu_id).await?;
        if let Some(dish_id) = dish_suggestion_id {
            self.ensure_approved(dish_id).await?;
        }
        menu.slot_mut(slot_id)
            .ok_or_else(|| KitchenError::not_found("WeeklyMenuSlot", slot_id))?
            .assign_dish(dish_suggestion_id);

        let menu = self.menus.update(&menu).await?;
        info!(weekly_menu_id = menu_id, slot_id, dish_suggestion_id = ?dish_suggestion_id, "menu slot assigned");
        Ok(menu)
    }

    pub async fn publish(&self, actor: &User, menu_id: i64) -> Result<WeeklyMenu> {
        let mut menu = self.menus.get_by_id(menu_id).await?;
        menu.publish(actor).inspect_err(|e| {
            warn!(weekly_menu_id = menu_id, actor = %actor.email, error = %e, "publish refused");
        })?;

        let menu = self.menus.update(&menu).await?;
        info!(
            weekly_menu_id = menu_id,
            week = menu.week_number(),
            year = menu.year(),
            publisher = %actor.email,
            "weekly menu published"
        );
        Ok(menu)
    }

    pub async fn find_by_week_and_year(&self, week_number: i32, year: i32) -> Result<Option<WeeklyMenu>> {
        self.menus.find_by_week_and_year(week_number, year).await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<WeeklyMenu> {
        self.menus.get_by_id(id).await
    }

    pub async fn find_all(&self) -> Result<Vec<WeeklyMenu>> {
        self.menus.get_all().await
    }

    pub async fn find_by_status(&self, status: MenuStatus) -> Result<Vec<WeeklyMenu>> {
        self.menus.find_by_status(status).await
    }

    async fn draft_menu(&self, menu_id: i64) -> Result<WeeklyMenu> {
        let menu = self.menus.get_by_id(menu_id).await?;
        if menu.is_published() {
            return Err(KitchenError::illegal_state(format!(
                "Menu {} is published and can no longer be changed",
                menu_id
            )));
        }
        Ok(menu)
    }

    async fn ensure_approved(&self, dish_id: i64) -> Result<()> {
        let dish = self.dishes.get_by_id(dish_id).await?;
        if dish.status() != ReviewStatus::Approved {
            return Err(KitchenError::illegal_state(format!(
                "Dish suggestion {} is {} and cannot be put on a menu",
                dish_id,
                dish.status()
            )));
        }
        Ok(())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::role::Action;
use super::status::{DayOfWeek, MenuStatus};
use super::user::User;
use crate::error::{KitchenError, Result};
use crate::validation;

/// One station's dish for one day. A slot without a dish is an empty slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyMenuSlot {
    pub id: Option<i64>,
    pub day_of_week: DayOfWeek,
    pub station_id: i64,
    pub(crate) dish_suggestion_id: Option<i64>,
    pub(crate) weekly_menu_id: Option<i64>,
}

impl WeeklyMenuSlot {
    pub fn new(day_of_week: DayOfWeek, dish_suggestion_id: Option<i64>, station_id: i64) -> Self {
        Self {
            id: None,
            day_of_week,
            station_id,
            dish_suggestion_id,
            weekly_menu_id: None,
        }
    }

    pub fn dish_suggestion_id(&self) -> Option<i64> {
        self.dish_suggestion_id
    }

    /// The menu this slot belongs to, once it has been attached to a persisted menu.
    pub fn weekly_menu_id(&self) -> Option<i64> {
        self.weekly_menu_id
    }

    /// Derived from the dish reference so the two can never disagree.
    pub fn is_empty(&self) -> bool {
        self.dish_suggestion_id.is_none()
    }

    pub fn assign_dish(&mut self, dish_suggestion_id: Option<i64>) {
        self.dish_suggestion_id = dish_suggestion_id;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyMenu {
    pub id: Option<i64>,
    pub(crate) week_number: i32,
    pub(crate) year: i32,
    pub(crate) status: MenuStatus,
    pub(crate) published_at: Option<DateTime<Utc>>,
    pub(crate) published_by: Option<i64>,
    pub(crate) slots: Vec<WeeklyMenuSlot>,
}

impl WeeklyMenu {
    /// A new menu starts as a draft with no slots.
    pub fn new(week_number: i32, year: i32) -> Result<Self> {
        validation::validate_week_and_year(week_number, year)?;
        Ok(Self {
            id: None,
            week_number,
            year,
            status: MenuStatus::Draft,
            published_at: None,
            published_by: None,
            slots: Vec::new(),
        })
    }

    pub fn week_number(&self) -> i32 {
        self.week_number
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn status(&self) -> MenuStatus {
        self.status
    }

    pub fn is_published(&self) -> bool {
        self.status == MenuStatus::Published
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn published_by(&self) -> Option<i64> {
        self.published_by
    }

    pub fn slots(&self) -> &[WeeklyMenuSlot] {
        &self.slots
    }

    pub fn slots_for(&self, day: DayOfWeek) -> impl Iterator<Item = &WeeklyMenuSlot> {
        self.slots.iter().filter(move |s| s.day_of_week == day)
    }

    pub fn slot_mut(&mut self, slot_id: i64) -> Option<&mut WeeklyMenuSlot> {
        self.slots.iter_mut().find(|s| s.id == Some(slot_id))
    }

    /// Takes ownership of the slot and points it back at this menu.
    pub fn add_menu_slot(&mut self, mut slot: WeeklyMenuSlot) {
        slot.weekly_menu_id = self.id;
        self.slots.push(slot);
    }

    /// Detaches a persisted slot. Saving the menu afterwards deletes it.
    pub fn remove_menu_slot(&mut self, slot_id: i64) -> Option<WeeklyMenuSlot> {
        self.remove_slot_where(|s| s.id == Some(slot_id))
    }

    /// Detaches the first slot matching `pred`, including slots not yet saved.
    pub fn remove_slot_where<F>(&mut self, pred: F) -> Option<WeeklyMenuSlot>
    where
        F: FnMut(&WeeklyMenuSlot) -> bool,
    {
        let index = self.slots.iter().position(pred)?;
        let mut slot = self.slots.remove(index);
        slot.weekly_menu_id = None;
        Some(slot)
    }

    /// DRAFT -> PUBLISHED, once, by a head chef.
    pub fn publish(&mut self, head_chef: &User) -> Result<()> {
        head_chef.authorize(Action::PublishMenu)?;
        if self.status == MenuStatus::Published {
            return Err(KitchenError::illegal_state("Menu is already published"));
        }
        let publisher = validation::require_id(head_chef.id, "Publisher")?;

        self.status = MenuStatus::Published;
        self.published_at = Some(Utc::now());
        self.published_by = Some(publisher);
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validation::validate_week_and_year(self.week_number, self.year)?;
        for slot in &self.slots {
            validation::validate_id(slot.station_id)?;
            if let Some(dish_id) = slot.dish_suggestion_id {
                validation::validate_id(dish_id)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for WeeklyMenu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Week {} / {} [{}]", self.week_number, self.year, self.status)?;
        let mut slots: Vec<&WeeklyMenuSlot> = self.slots.iter().collect();
        slots.sort_by_key(|s| (s.day_of_week, s.station_id));
        for slot in slots {
            match slot.dish_suggestion_id {
                Some(dish_id) => writeln!(
                    f,
                    "  {:<9} station #{:<3} dish #{}",
                    slot.day_of_week, slot.station_id, dish_id
                )?,
                None => writeln!(
                    f,
                    "  {:<9} station #{:<3} (empty)",
                    slot.day_of_week, slot.station_id
                )?,
            }
        }
        Ok(())
    }
}

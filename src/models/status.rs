use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Review state shared by dish suggestions and ingredient requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    DishSpecific,
    GeneralStock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MenuStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShoppingListStatus {
    Draft,
    Finalized,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewStatus::Pending => write!(f, "PENDING"),
            ReviewStatus::Approved => write!(f, "APPROVED"),
            ReviewStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(ReviewStatus::Pending),
            "APPROVED" => Ok(ReviewStatus::Approved),
            "REJECTED" => Ok(ReviewStatus::Rejected),
            _ => Err(format!(
                "Invalid status '{}'. Valid options: pending, approved, rejected",
                s
            )),
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestType::DishSpecific => write!(f, "DISH_SPECIFIC"),
            RequestType::GeneralStock => write!(f, "GENERAL_STOCK"),
        }
    }
}

impl fmt::Display for MenuStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuStatus::Draft => write!(f, "DRAFT"),
            MenuStatus::Published => write!(f, "PUBLISHED"),
        }
    }
}

impl fmt::Display for ShoppingListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShoppingListStatus::Draft => write!(f, "DRAFT"),
            ShoppingListStatus::Finalized => write!(f, "FINALIZED"),
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayOfWeek::Monday => write!(f, "MONDAY"),
            DayOfWeek::Tuesday => write!(f, "TUESDAY"),
            DayOfWeek::Wednesday => write!(f, "WEDNESDAY"),
            DayOfWeek::Thursday => write!(f, "THURSDAY"),
            DayOfWeek::Friday => write!(f, "FRIDAY"),
            DayOfWeek::Saturday => write!(f, "SATURDAY"),
            DayOfWeek::Sunday => write!(f, "SUNDAY"),
        }
    }
}

impl FromStr for DayOfWeek {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MONDAY" | "MON" => Ok(DayOfWeek::Monday),
            "TUESDAY" | "TUE" => Ok(DayOfWeek::Tuesday),
            "WEDNESDAY" | "WED" => Ok(DayOfWeek::Wednesday),
            "THURSDAY" | "THU" => Ok(DayOfWeek::Thursday),
            "FRIDAY" | "FRI" => Ok(DayOfWeek::Friday),
            "SATURDAY" | "SAT" => Ok(DayOfWeek::Saturday),
            "SUNDAY" | "SUN" => Ok(DayOfWeek::Sunday),
            _ => Err(format!("Invalid day of week '{}'", s)),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kitchen brigade rank. Stored by its canonical name (`HEAD_CHEF`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    HeadChef,
    SousChef,
    ChefDePartie,
    LineCook,
}

/// Something a user may try to do that is gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    SuggestDish,
    RequestIngredient,
    ReviewDishSuggestion,
    ReviewIngredientRequest,
    PlanMenu,
    PublishMenu,
    ManageShoppingLists,
    ManageStations,
    ManageStaff,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::HeadChef,
        Role::SousChef,
        Role::ChefDePartie,
        Role::LineCook,
    ];

    /// The one place that decides which role may perform which action.
    pub fn has_permission(self, action: Action) -> bool {
        match action {
            Action::SuggestDish | Action::RequestIngredient => true,
            Action::PlanMenu | Action::ManageShoppingLists => {
                matches!(self, Role::HeadChef | Role::SousChef)
            }
            Action::ReviewDishSuggestion
            | Action::ReviewIngredientRequest
            | Action::PublishMenu
            | Action::ManageStations
            | Action::ManageStaff => self == Role::HeadChef,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::HeadChef => "HEAD_CHEF",
            Role::SousChef => "SOUS_CHEF",
            Role::ChefDePartie => "CHEF_DE_PARTIE",
            Role::LineCook => "LINE_COOK",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "HEAD_CHEF" => Ok(Role::HeadChef),
            "SOUS_CHEF" => Ok(Role::SousChef),
            "CHEF_DE_PARTIE" => Ok(Role::ChefDePartie),
            "LINE_COOK" => Ok(Role::LineCook),
            _ => Err(format!(
                "Invalid role '{}'. Valid options: head_chef, sous_chef, chef_de_partie, line_cook",
                s
            )),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Action::SuggestDish => "suggest dishes",
            Action::RequestIngredient => "request ingredients",
            Action::ReviewDishSuggestion => "review dish suggestions",
            Action::ReviewIngredientRequest => "review ingredient requests",
            Action::PlanMenu => "plan weekly menus",
            Action::PublishMenu => "publish weekly menus",
            Action::ManageShoppingLists => "manage shopping lists",
            Action::ManageStations => "manage stations",
            Action::ManageStaff => "manage staff",
        };
        f.write_str(text)
    }
}

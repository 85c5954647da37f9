//! Use cases over the repositories. Each service owns the repositories it
//! needs, all built from one shared pool, and checks the acting user's role
//! before anything is written.

mod dish_suggestion_service;
mod ingredient_request_service;
mod shopping_list_service;
mod station_service;
mod user_service;
mod weekly_menu_service;

pub use dish_suggestion_service::{DishSuggestionService, NewDishSuggestion};
pub use ingredient_request_service::{IngredientRequestService, NewIngredientRequest};
pub use shopping_list_service::{NewShoppingListItem, ShoppingListService};
pub use station_service::StationService;
pub use user_service::{ProfileUpdate, Registration, UserService};
pub use weekly_menu_service::WeeklyMenuService;

use sqlx::SqlitePool;

/// Every service over one pool.
pub struct Services {
    pub users: UserService,
    pub stations: StationService,
    pub dishes: DishSuggestionService,
    pub ingredient_requests: IngredientRequestService,
    pub menus: WeeklyMenuService,
    pub shopping_lists: ShoppingListService,
}

impl Services {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserService::new(pool.clone()),
            stations: StationService::new(pool.clone()),
            dishes: DishSuggestionService::new(pool.clone()),
            ingredient_requests: IngredientRequestService::new(pool.clone()),
            menus: WeeklyMenuService::new(pool.clone()),
            shopping_lists: ShoppingListService::new(pool),
        }
    }
}

mod allergen;
mod dish_suggestion;
mod ingredient_request;
mod review;
mod role;
mod shopping_list;
mod station;
mod status;
mod user;
mod weekly_menu;

pub use allergen::Allergen;
pub use dish_suggestion::DishSuggestion;
pub use ingredient_request::IngredientRequest;
pub use review::Review;
pub use role::{Action, Role};
pub use shopping_list::{ShoppingList, ShoppingListItem};
pub use station::Station;
pub use status::{DayOfWeek, MenuStatus, RequestType, ReviewStatus, ShoppingListStatus};
pub use user::User;
pub use weekly_menu::{WeeklyMenu, WeeklyMenuSlot};

/// Entities compare by identity, and only once they have one.
/// Two transient values are never equal, even to themselves.
macro_rules! identity_eq {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    self.id.is_some() && self.id == other.id
                }
            }
        )*
    };
}

identity_eq!(
    Allergen,
    DishSuggestion,
    IngredientRequest,
    ShoppingList,
    ShoppingListItem,
    Station,
    User,
    WeeklyMenu,
    WeeklyMenuSlot,
);

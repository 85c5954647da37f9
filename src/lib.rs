//! Kitchen operations: staff, stations, dish suggestions, ingredient
//! requests, weekly menus and shopping lists over a SQLite store.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod password;
pub mod services;
pub mod validation;

pub use error::{KitchenError, Result};

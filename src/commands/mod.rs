mod config_cmd;
mod dish;
mod menu;
mod station;
mod user;

pub use config_cmd::ConfigCommand;
pub use dish::DishCommand;
pub use menu::MenuCommand;
pub use station::StationCommand;
pub use user::UserCommand;

use clap::ValueEnum;
use kitchenops::models::User;
use kitchenops::services::UserService;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Looks up the user named by `--actor`. Privileged commands call this first.
pub async fn resolve_actor(
    users: &UserService,
    actor: Option<&str>,
) -> Result<User, Box<dyn std::error::Error>> {
    let email = actor.ok_or("This command needs --actor <email> naming the acting user")?;
    Ok(users.find_by_email(email).await?)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let head: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

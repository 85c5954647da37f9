use clap::{Args, Subcommand};

use super::{resolve_actor, CommandResult, OutputFormat};
use kitchenops::services::Services;

#[derive(Args)]
pub struct MenuCommand {
    #[command(subcommand)]
    pub command: MenuSubcommand,
}

#[derive(Subcommand)]
pub enum MenuSubcommand {
    /// Open a draft menu for a week (head or sous chef)
    Create { week: i32, year: i32 },

    /// Show the menu for a week
    Show {
        week: i32,
        year: i32,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Publish the menu for a week (head chef only)
    Publish { week: i32, year: i32 },
}

impl MenuCommand {
    pub async fn run(&self, services: &Services, actor: Option<&str>) -> CommandResult {
        match &self.command {
            MenuSubcommand::Create { week, year } => {
                let actor = resolve_actor(&services.users, actor).await?;
                let menu = services.menus.create_menu(&actor, *week, *year).await?;
                println!("Created menu:");
                print!("{}", menu);
                Ok(())
            }

            MenuSubcommand::Show { week, year, format } => {
                let menu = services
                    .menus
                    .find_by_week_and_year(*week, *year)
                    .await?
                    .ok_or_else(|| format!("No menu for week {} of {}", week, year))?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&menu)?),
                    OutputFormat::Text => {
                        print!("{}", menu);
                        let dishes = services.dishes.find_for_week(*week, *year).await?;
                        if !dishes.is_empty() {
                            println!("\nDishes:");
                            for dish in &dishes {
                                println!("  {:<5} {}", dish.id.unwrap_or_default(), dish.name_da);
                            }
                        }
                    }
                }
                Ok(())
            }

            MenuSubcommand::Publish { week, year } => {
                let actor = resolve_actor(&services.users, actor).await?;
                let menu = services
                    .menus
                    .find_by_week_and_year(*week, *year)
                    .await?
                    .ok_or_else(|| format!("No menu for week {} of {}", week, year))?;
                let id = menu.id.ok_or("Menu has no id")?;
                let menu = services.menus.publish(&actor, id).await?;
                println!(
                    "Published week {} of {} ({} slot(s))",
                    menu.week_number(),
                    menu.year(),
                    menu.slots().len()
                );
                Ok(())
            }
        }
    }
}

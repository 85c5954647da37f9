use clap::{Args, Subcommand};

use super::{resolve_actor, truncate, CommandResult, OutputFormat};
use kitchenops::models::ReviewStatus;
use kitchenops::services::Services;

#[derive(Args)]
pub struct DishCommand {
    #[command(subcommand)]
    pub command: DishSubcommand,
}

#[derive(Subcommand)]
pub enum DishSubcommand {
    /// List dish suggestions
    List {
        /// pending, approved or rejected
        #[arg(long)]
        status: Option<ReviewStatus>,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Approve a pending suggestion (head chef only)
    Approve { id: i64 },

    /// Reject a pending suggestion with feedback (head chef only)
    Reject {
        id: i64,

        #[arg(long)]
        feedback: String,
    },
}

impl DishCommand {
    pub async fn run(&self, services: &Services, actor: Option<&str>) -> CommandResult {
        match &self.command {
            DishSubcommand::List { status, format } => {
                let dishes = match status {
                    Some(status) => services.dishes.find_by_status(*status).await?,
                    None => services.dishes.find_all().await?,
                };

                if dishes.is_empty() {
                    println!("No dish suggestions found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&dishes)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<5}  {:<30}  {:<8}  STATUS", "ID", "NAME", "STATION");
                        println!("{}", "-".repeat(64));
                        for dish in &dishes {
                            println!(
                                "{:<5}  {:<30}  {:<8}  {}",
                                dish.id.unwrap_or_default(),
                                truncate(&dish.name_da, 30),
                                dish.station_id,
                                dish.status()
                            );
                        }
                        println!("\nTotal: {} suggestion(s)", dishes.len());
                    }
                }
                Ok(())
            }

            DishSubcommand::Approve { id } => {
                let actor = resolve_actor(&services.users, actor).await?;
                let dish = services.dishes.approve(&actor, *id).await?;
                println!("Approved: {}", dish.name_da);
                Ok(())
            }

            DishSubcommand::Reject { id, feedback } => {
                let actor = resolve_actor(&services.users, actor).await?;
                let dish = services.dishes.reject(&actor, *id, feedback).await?;
                println!("Rejected: {}", dish.name_da);
                Ok(())
            }
        }
    }
}

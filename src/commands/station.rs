use clap::{Args, Subcommand};

use super::{resolve_actor, CommandResult, OutputFormat};
use kitchenops::services::Services;

#[derive(Args)]
pub struct StationCommand {
    #[command(subcommand)]
    pub command: StationSubcommand,
}

#[derive(Subcommand)]
pub enum StationSubcommand {
    /// Create a station (head chef only)
    Create {
        /// Station name, stored upper-case
        name: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// List all stations
    List {
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl StationCommand {
    pub async fn run(&self, services: &Services, actor: Option<&str>) -> CommandResult {
        match &self.command {
            StationSubcommand::Create { name, description } => {
                let actor = resolve_actor(&services.users, actor).await?;
                let station = services
                    .stations
                    .create_station(&actor, name, description.clone())
                    .await?;
                println!("Created station:");
                println!("{}", station);
                Ok(())
            }

            StationSubcommand::List { format } => {
                let stations = services.stations.find_all().await?;
                if stations.is_empty() {
                    println!("No stations found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&stations)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<5}  {:<24}  DESCRIPTION", "ID", "NAME");
                        println!("{}", "-".repeat(60));
                        for station in &stations {
                            println!(
                                "{:<5}  {:<24}  {}",
                                station.id.unwrap_or_default(),
                                station.name(),
                                station.description.as_deref().unwrap_or("")
                            );
                        }
                        println!("\nTotal: {} station(s)", stations.len());
                    }
                }
                Ok(())
            }
        }
    }
}

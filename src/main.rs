use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{ConfigCommand, DishCommand, MenuCommand, StationCommand, UserCommand};
use kitchenops::config::Config;
use kitchenops::db;
use kitchenops::services::Services;

#[derive(Parser)]
#[command(name = "kitchenops")]
#[command(version)]
#[command(about = "Kitchen operations admin CLI", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Email of the acting user, required by privileged commands
    #[arg(long, global = true)]
    actor: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage staff
    User(UserCommand),

    /// Manage stations
    Station(StationCommand),

    /// Review dish suggestions
    Dish(DishCommand),

    /// Plan and publish weekly menus
    Menu(MenuCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kitchenops=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;
    let actor = cli.actor.as_deref();

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let pool = db::connect(&config.database_path.value, config.max_connections.value).await?;
    let services = Services::new(pool);

    match command {
        Commands::User(cmd) => cmd.run(&services, actor).await,
        Commands::Station(cmd) => cmd.run(&services, actor).await,
        Commands::Dish(cmd) => cmd.run(&services, actor).await,
        Commands::Menu(cmd) => cmd.run(&services, actor).await,
        Commands::Config(cmd) => cmd.run(&config),
    }
}

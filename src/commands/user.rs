use clap::{Args, Subcommand};

use super::{resolve_actor, truncate, CommandResult, OutputFormat};
use kitchenops::models::Role;
use kitchenops::services::{Registration, Services};

#[derive(Args)]
pub struct UserCommand {
    #[command(subcommand)]
    pub command: UserSubcommand,
}

#[derive(Subcommand)]
pub enum UserSubcommand {
    /// Register a new member of staff
    Register {
        /// Email address, used to log in
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        /// At least 8 characters
        #[arg(long)]
        password: String,

        /// head_chef, sous_chef, chef_de_partie or line_cook
        #[arg(long, default_value = "line_cook")]
        role: Role,

        /// Station id to assign
        #[arg(long)]
        station: Option<i64>,
    },

    /// List staff
    List {
        /// Only show this role
        #[arg(long)]
        role: Option<Role>,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one member of staff by email
    Show {
        email: String,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Change a user's role (head chef only)
    Role { email: String, role: Role },
}

impl UserCommand {
    pub async fn run(&self, services: &Services, actor: Option<&str>) -> CommandResult {
        match &self.command {
            UserSubcommand::Register {
                email,
                first_name,
                last_name,
                password,
                role,
                station,
            } => {
                let user = services
                    .users
                    .register(Registration {
                        first_name: first_name.clone(),
                        last_name: last_name.clone(),
                        email: email.clone(),
                        password: password.clone(),
                        role: *role,
                        station_id: *station,
                    })
                    .await?;
                println!("Registered:");
                println!("{}", user);
                Ok(())
            }

            UserSubcommand::List { role, format } => {
                let users = match role {
                    Some(role) => services.users.find_by_role(*role).await?,
                    None => services.users.find_all().await?,
                };

                if users.is_empty() {
                    println!("No users found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&users)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<5}  {:<30}  {:<24}  ROLE", "ID", "EMAIL", "NAME");
                        println!("{}", "-".repeat(80));
                        for user in &users {
                            println!(
                                "{:<5}  {:<30}  {:<24}  {}",
                                user.id.unwrap_or_default(),
                                truncate(&user.email, 30),
                                truncate(&user.full_name(), 24),
                                user.role
                            );
                        }
                        println!();
                        for role in Role::ALL {
                            let count = users.iter().filter(|u| u.role == role).count();
                            if count > 0 {
                                println!("{}: {}", role, count);
                            }
                        }
                        println!("Total: {} user(s)", users.len());
                    }
                }
                Ok(())
            }

            UserSubcommand::Show { email, format } => {
                let user = services.users.find_by_email(email).await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&user)?),
                    OutputFormat::Text => println!("{}", user),
                }
                Ok(())
            }

            UserSubcommand::Role { email, role } => {
                let actor = resolve_actor(&services.users, actor).await?;
                let user = services.users.find_by_email(email).await?;
                let id = user.id.ok_or("User has no id")?;
                let updated = services.users.change_role(&actor, id, *role).await?;
                println!("{} is now {}", updated.email, updated.role);
                Ok(())
            }
        }
    }
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use teamjoin_core::{config::Config, migration, server, telemetry};
use tracing::info;

#[derive(Parser)]
#[command(name = "teamjoin-core", version, about = "Team join request service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run migrations, seed roles, and serve HTTP (default)
    Serve,
    /// Run database migrations and exit
    Migrate,
    /// Seed the canonical role hierarchy and exit
    SeedRoles,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;
    let prometheus_handle = telemetry::init(&config.telemetry)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            info!("Starting Teamjoin Core Service");
            info!("HTTP server listening on {}", config.http_addr());
            server::run(config, prometheus_handle).await
        }
        Command::Migrate => migration::run_migrations(&config).await,
        Command::SeedRoles => migration::seed_roles(&config).await,
    }
}

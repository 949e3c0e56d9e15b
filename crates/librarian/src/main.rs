mod commands;
mod config;

use clap::{Parser, Subcommand};
use commands::standing_order::StandingOrderCommands;
use commands::store::StoreCommands;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "librarian")]
#[command(about = "Federated data-librarian transfer coordination core", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/librarian/config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API and background task runner
    Server {
        /// Generate default configuration file and exit
        #[arg(long)]
        init_config: bool,
    },

    /// Manage local stores
    #[command(subcommand)]
    Store(StoreCommands),

    /// Manage standing orders
    #[command(subcommand, name = "standing-order")]
    StandingOrder(StandingOrderCommands),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "librarian=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server { init_config } => {
            if init_config {
                commands::server::init_config(&cli.config).await?;
            } else {
                commands::server::run(&cli.config).await?;
            }
        }
        Commands::Store(cmd) => {
            commands::store::handle(&cli.config, cmd).await?;
        }
        Commands::StandingOrder(cmd) => {
            commands::standing_order::handle(&cli.config, cmd).await?;
        }
    }

    Ok(())
}

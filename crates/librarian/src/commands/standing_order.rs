use anyhow::{Context, Result};
use clap::Subcommand;
use librarian_core::{SavedSearch, StandingOrder};
use librarian_db::Database;
use std::path::Path;

use crate::config;

#[derive(Subcommand)]
pub enum StandingOrderCommands {
    /// List all standing orders
    List,

    /// Create or update a standing order matching a time-window predicate
    Create {
        name: String,
        conn_name: String,
        /// Only consider files created within this many days
        #[arg(long, default_value_t = 14)]
        days: i64,
        /// SQL LIKE pattern the file name must match
        #[arg(long, default_value = "%")]
        like_pattern: String,
    },

    /// Delete a standing order
    Delete {
        name: String,
    },
}

pub async fn handle(config_path: &Path, cmd: StandingOrderCommands) -> Result<()> {
    let settings = config::load_config(config_path)
        .await
        .context("Failed to load configuration")?;
    let db = Database::new(&settings.database_url)
        .await
        .context("Failed to connect to database")?;

    match cmd {
        StandingOrderCommands::List => {
            for order in db.list_standing_orders().await? {
                println!("{}\t{}\t{:?}", order.name, order.conn_name, order.search);
            }
        }
        StandingOrderCommands::Create {
            name,
            conn_name,
            days,
            like_pattern,
        } => {
            db.create_standing_order(&StandingOrder {
                name: name.clone(),
                search: SavedSearch::TimeWindow { days, like_pattern },
                conn_name,
            })
            .await?;
            println!("Standing order '{name}' saved.");
        }
        StandingOrderCommands::Delete { name } => {
            if db.delete_standing_order(&name).await? {
                println!("Standing order '{name}' deleted.");
            } else {
                println!("No standing order named '{name}'.");
            }
        }
    }

    Ok(())
}

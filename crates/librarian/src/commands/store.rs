use anyhow::{Context, Result};
use clap::Subcommand;
use librarian_core::{Store, StoreKind};
use librarian_db::Database;
use librarian_store::LocalStore;
use std::path::{Path, PathBuf};

use crate::config;

#[derive(Subcommand)]
pub enum StoreCommands {
    /// List all registered stores
    List,

    /// Register a new local store, or update an existing one
    Add {
        name: String,
        root: PathBuf,
        #[arg(long, default_value_t = true)]
        ingestable: bool,
    },

    /// Recommend a store able to hold a file of the given size
    Recommend {
        size: u64,
    },

    /// Show the manifest of files a store believes it holds
    Manifest {
        name: String,
    },

    /// Enable a store, making it eligible for new instances
    Enable {
        name: String,
    },

    /// Disable a store
    Disable {
        name: String,
    },
}

pub async fn handle(config_path: &Path, cmd: StoreCommands) -> Result<()> {
    let settings = config::load_config(config_path)
        .await
        .context("Failed to load configuration")?;
    let db = Database::new(&settings.database_url)
        .await
        .context("Failed to connect to database")?;

    match cmd {
        StoreCommands::List => {
            for store in db.list_enabled_available_stores().await? {
                println!("{}\t{:?}\t{}", store.name, store.kind, store.root.display());
            }
        }
        StoreCommands::Add { name, root, ingestable } => {
            db.create_store(&Store {
                name: name.clone(),
                kind: StoreKind::Local,
                root,
                ingestable,
                available: true,
                enabled: true,
            })
            .await?;
            println!("Store '{name}' registered.");
        }
        StoreCommands::Recommend { size } => {
            let stores = db.list_enabled_available_stores().await?;
            let mut candidates = Vec::with_capacity(stores.len());
            for store in &stores {
                if store.kind != StoreKind::Local {
                    continue;
                }
                let free = LocalStore::new(&store.root).free_space().await.unwrap_or(0);
                candidates.push((store.name.clone(), free));
            }

            match librarian_core::recommend_store(&candidates, size) {
                Ok(name) => println!("{name}"),
                Err(error) => println!("No store available: {error}"),
            }
        }
        StoreCommands::Manifest { name } => {
            for entry in db.list_manifest_entries(&name).await? {
                println!(
                    "{}\t{}\t{}",
                    entry.relative_path.display(),
                    entry.size,
                    entry.checksum
                );
            }
        }
        StoreCommands::Enable { name } => {
            db.set_store_enabled(&name, true).await?;
            println!("Store '{name}' enabled.");
        }
        StoreCommands::Disable { name } => {
            db.set_store_enabled(&name, false).await?;
            println!("Store '{name}' disabled.");
        }
    }

    Ok(())
}

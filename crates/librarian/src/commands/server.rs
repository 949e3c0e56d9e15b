use anyhow::{Context, Result};
use librarian_core::ServerSettings;
use librarian_db::Database;
use librarian_http::HttpServer;
use librarian_store::LocalStore;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config;

pub async fn init_config(config_path: &Path) -> Result<()> {
    let default_config = ServerSettings::default();
    config::save_config(config_path, &default_config).await?;
    println!("Configuration file created at: {}", config_path.display());
    println!("\nPlease review and edit the configuration before starting the server.");
    Ok(())
}

pub async fn run(config_path: &Path) -> Result<()> {
    info!("Starting librarian server...");

    let settings = config::load_config(config_path)
        .await
        .context("Failed to load configuration")?;

    info!("Configuration loaded from {}", config_path.display());

    tokio::fs::create_dir_all(&settings.primary_store_root).await?;
    tokio::fs::create_dir_all(&settings.transfer_defaults.local_staging_dir).await?;

    let db = Arc::new(
        Database::new(&settings.database_url)
            .await
            .context("Failed to initialize database")?,
    );
    info!("Database connection established");

    let store = Arc::new(LocalStore::new(&settings.primary_store_root));
    let settings = Arc::new(settings);

    let (_runner, shutdown_tx, tasks_handle) =
        librarian_tasks::spawn(db.clone(), store, (*settings).clone());
    info!("Background task runner started");

    let http_server = HttpServer::new(db, settings);
    let http_handle = tokio::spawn(async move {
        if let Err(error) = http_server.run().await {
            tracing::error!("HTTP server error: {error}");
        }
    });

    info!("Librarian server is running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    shutdown_tx.send(true).ok();
    tasks_handle.abort();
    http_handle.abort();

    Ok(())
}

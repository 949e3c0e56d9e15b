//! The relational catalog (spec §3). One `Database` handle wraps a
//! Postgres connection pool; every entity in the data model gets its own
//! module of query functions grouped around it.
//!
//! One `Database` struct, split across modules here because this
//! catalog's entity count is considerably larger than a single file
//! comfortably holds.

mod errors;
mod files;
mod instances;
mod librarians;
mod queue;
mod rows;
mod standing_orders;
mod stores;
mod transfers;

pub use queue::ClaimedQueueItem;

use librarian_core::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};

pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Builds a `Database` around an already-connected pool, e.g. the one
    /// `#[sqlx::test]` hands to an async test function, running the same
    /// migrations [`Database::new`] does.
    pub async fn from_pool(pool: PgPool) -> Result<Self> {
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS files (
                name TEXT PRIMARY KEY,
                create_time TIMESTAMPTZ NOT NULL,
                size BIGINT NOT NULL,
                checksum TEXT NOT NULL,
                uploader TEXT NOT NULL,
                source TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stores (
                name TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                root TEXT NOT NULL,
                ingestable BOOLEAN NOT NULL DEFAULT TRUE,
                available BOOLEAN NOT NULL DEFAULT TRUE,
                enabled BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS instances (
                id UUID PRIMARY KEY,
                file_name TEXT NOT NULL REFERENCES files(name),
                store_name TEXT NOT NULL REFERENCES stores(name),
                path TEXT NOT NULL,
                deletion_policy TEXT NOT NULL,
                create_time TIMESTAMPTZ NOT NULL,
                available BOOLEAN NOT NULL DEFAULT TRUE,
                UNIQUE (store_name, path)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS librarians (
                name TEXT PRIMARY KEY,
                url TEXT NOT NULL,
                port INTEGER NOT NULL,
                available BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS remote_instances (
                id UUID PRIMARY KEY,
                file_name TEXT NOT NULL REFERENCES files(name),
                librarian_name TEXT NOT NULL REFERENCES librarians(name),
                copy_time TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS outgoing_transfers (
                id BIGSERIAL PRIMARY KEY,
                file_name TEXT NOT NULL REFERENCES files(name),
                destination_librarian TEXT NOT NULL,
                source_path TEXT NOT NULL,
                dest_path TEXT NOT NULL,
                transfer_size BIGINT NOT NULL,
                transfer_checksum TEXT NOT NULL,
                status TEXT NOT NULL,
                start_time TIMESTAMPTZ NOT NULL,
                end_time TIMESTAMPTZ,
                send_queue_id BIGINT,
                standing_order_event TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS incoming_transfers (
                id BIGSERIAL PRIMARY KEY,
                upload_name TEXT NOT NULL,
                uploader TEXT NOT NULL,
                source TEXT NOT NULL,
                transfer_size BIGINT NOT NULL,
                transfer_checksum TEXT NOT NULL,
                staging_path TEXT NOT NULL,
                store_path TEXT NOT NULL,
                store_name TEXT NOT NULL REFERENCES stores(name),
                status TEXT NOT NULL,
                end_time TIMESTAMPTZ
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS send_queue (
                id BIGSERIAL PRIMARY KEY,
                priority INTEGER NOT NULL DEFAULT 0,
                created_time TIMESTAMPTZ NOT NULL,
                destination TEXT NOT NULL,
                async_transfer_manager JSONB NOT NULL,
                consumed BOOLEAN NOT NULL DEFAULT FALSE,
                consumed_time TIMESTAMPTZ,
                completed BOOLEAN NOT NULL DEFAULT FALSE,
                completed_time TIMESTAMPTZ,
                retries INTEGER NOT NULL DEFAULT 0,
                failed BOOLEAN NOT NULL DEFAULT FALSE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS send_queue_transfers (
                send_queue_id BIGINT NOT NULL REFERENCES send_queue(id),
                outgoing_transfer_id BIGINT NOT NULL REFERENCES outgoing_transfers(id),
                source_path TEXT NOT NULL,
                dest_path TEXT NOT NULL,
                PRIMARY KEY (send_queue_id, outgoing_transfer_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS standing_orders (
                name TEXT PRIMARY KEY,
                search TEXT NOT NULL,
                conn_name TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS file_events (
                file_name TEXT NOT NULL REFERENCES files(name),
                event_type TEXT NOT NULL,
                create_time TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (file_name, event_type)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS errors (
                id BIGSERIAL PRIMARY KEY,
                severity TEXT NOT NULL,
                category TEXT NOT NULL,
                message TEXT NOT NULL,
                create_time TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

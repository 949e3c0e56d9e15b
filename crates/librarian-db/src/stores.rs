use crate::rows::StoreRow;
use crate::Database;
use librarian_core::{Result, Store};

impl Database {
    pub async fn create_store(&self, store: &Store) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stores (name, kind, root, ingestable, available, enabled)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO UPDATE SET
                kind = EXCLUDED.kind,
                root = EXCLUDED.root,
                ingestable = EXCLUDED.ingestable,
                available = EXCLUDED.available,
                enabled = EXCLUDED.enabled
            "#,
        )
        .bind(&store.name)
        .bind(store.kind)
        .bind(store.root.to_string_lossy().to_string())
        .bind(store.ingestable)
        .bind(store.available)
        .bind(store.enabled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_store_by_name(&self, name: &str) -> Result<Option<Store>> {
        let row = sqlx::query_as::<_, StoreRow>("SELECT * FROM stores WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Store::from))
    }

    pub async fn list_enabled_available_stores(&self) -> Result<Vec<Store>> {
        let rows = sqlx::query_as::<_, StoreRow>(
            "SELECT * FROM stores WHERE enabled = TRUE AND available = TRUE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Store::from).collect())
    }

    /// Flips `enabled` on a store in place; used by the admin
    /// store-state-change endpoint.
    pub async fn set_store_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        sqlx::query("UPDATE stores SET enabled = $2 WHERE name = $1")
            .bind(name)
            .bind(enabled)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

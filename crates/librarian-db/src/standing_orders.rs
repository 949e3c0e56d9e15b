use crate::Database;
use chrono::Utc;
use librarian_core::{Result, SavedSearch, StandingOrder};

impl Database {
    pub async fn create_standing_order(&self, order: &StandingOrder) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO standing_orders (name, search, conn_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET search = EXCLUDED.search, conn_name = EXCLUDED.conn_name
            "#,
        )
        .bind(&order.name)
        .bind(order.search.to_storage_string())
        .bind(&order.conn_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_standing_orders(&self) -> Result<Vec<StandingOrder>> {
        let rows =
            sqlx::query_as::<_, (String, String, String)>("SELECT name, search, conn_name FROM standing_orders")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(name, search, conn_name)| {
                Ok(StandingOrder {
                    name,
                    search: SavedSearch::from_storage_string(&search)?,
                    conn_name,
                })
            })
            .collect()
    }

    pub async fn delete_standing_order(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM standing_orders WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether `file_name` has already fired `event_type` (e.g. a standing
    /// order's `standing_order_succeeded:<name>` event), used to avoid
    /// re-copying a file a standing order already picked up.
    pub async fn has_file_event(&self, file_name: &str, event_type: &str) -> Result<bool> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM file_events WHERE file_name = $1 AND event_type = $2",
        )
        .bind(file_name)
        .bind(event_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    pub async fn record_file_event(&self, file_name: &str, event_type: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO file_events (file_name, event_type, create_time)
            VALUES ($1, $2, $3)
            ON CONFLICT (file_name, event_type) DO NOTHING
            "#,
        )
        .bind(file_name)
        .bind(event_type)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

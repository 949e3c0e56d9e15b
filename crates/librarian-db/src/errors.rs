use crate::rows::ErrorRow;
use crate::Database;
use chrono::Utc;
use librarian_core::{ErrorCategory, ErrorRecord, ErrorSeverity, Result};

impl Database {
    /// Writes an entry to the `errors` catalog table. This is the sink
    /// every background task and request handler reports through instead
    /// of letting an error propagate out of its loop.
    pub async fn log_error(
        &self,
        severity: ErrorSeverity,
        category: ErrorCategory,
        message: impl Into<String>,
    ) -> Result<()> {
        let message = message.into();

        match severity {
            ErrorSeverity::Critical => tracing::error!(?category, "{message}"),
            ErrorSeverity::Error => tracing::error!(?category, "{message}"),
            ErrorSeverity::Warning => tracing::warn!(?category, "{message}"),
            ErrorSeverity::Info => tracing::info!(?category, "{message}"),
        }

        sqlx::query(
            r#"
            INSERT INTO errors (severity, category, message, create_time)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(severity)
        .bind(category)
        .bind(&message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn recent_errors(&self, limit: i64) -> Result<Vec<ErrorRecord>> {
        let rows = sqlx::query_as::<_, ErrorRow>(
            "SELECT * FROM errors ORDER BY create_time DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ErrorRecord::from).collect())
    }
}

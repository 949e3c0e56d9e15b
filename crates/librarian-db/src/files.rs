use crate::rows::FileRow;
use crate::Database;
use chrono::{DateTime, Utc};
use librarian_core::{File, Result};

impl Database {
    pub async fn create_file(&self, file: &File) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO files (name, create_time, size, checksum, uploader, source)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(&file.name)
        .bind(file.create_time)
        .bind(file.size)
        .bind(&file.checksum)
        .bind(&file.uploader)
        .bind(&file.source)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_file_by_name(&self, name: &str) -> Result<Option<File>> {
        let row = sqlx::query_as::<_, FileRow>("SELECT * FROM files WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(File::from))
    }

    pub async fn file_exists(&self, name: &str) -> Result<bool> {
        Ok(self.get_file_by_name(name).await?.is_some())
    }

    /// Files created after `since` whose name matches a SQL `LIKE`
    /// pattern. Backs [`librarian_core::SavedSearch::TimeWindow`].
    pub async fn files_in_time_window(
        &self,
        since: DateTime<Utc>,
        like_pattern: &str,
    ) -> Result<Vec<File>> {
        let rows = sqlx::query_as::<_, FileRow>(
            "SELECT * FROM files WHERE create_time > $1 AND name LIKE $2 ORDER BY create_time",
        )
        .bind(since)
        .bind(like_pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(File::from).collect())
    }

    /// The small registry of hard-coded named predicates carried over
    /// from the original `select_files` dispatcher. Unknown names match
    /// nothing rather than erroring, since a misconfigured standing order
    /// should not wedge the evaluator.
    pub async fn files_matching_named_query(&self, name: &str) -> Result<Vec<File>> {
        let two_weeks_ago = Utc::now() - chrono::Duration::days(14);

        match name {
            "special-test-1" => self.files_in_time_window(two_weeks_ago, "%22130%").await,
            "special-test-2" => self.files_in_time_window(two_weeks_ago, "zen%HH.uvc").await,
            _ => Ok(Vec::new()),
        }
    }
}

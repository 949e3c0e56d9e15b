use crate::rows::RemoteInstanceRow;
use crate::Database;
use librarian_core::{Librarian, RemoteInstance, Result};
use uuid::Uuid;

impl Database {
    pub async fn get_librarian_by_name(&self, name: &str) -> Result<Option<Librarian>> {
        let row = sqlx::query_as::<_, (String, String, i32, bool)>(
            "SELECT name, url, port, available FROM librarians WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(name, url, port, available)| Librarian {
            name,
            url,
            port: port as u16,
            available,
        }))
    }

    pub async fn list_librarians(&self) -> Result<Vec<Librarian>> {
        let rows = sqlx::query_as::<_, (String, String, i32, bool)>(
            "SELECT name, url, port, available FROM librarians",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, url, port, available)| Librarian {
                name,
                url,
                port: port as u16,
                available,
            })
            .collect())
    }

    /// Records that a peer librarian holds its own instance of `file_name`,
    /// as reported by a `clone/complete` callback.
    pub async fn record_remote_instance(
        &self,
        file_name: &str,
        librarian_name: &str,
    ) -> Result<RemoteInstance> {
        let id = Uuid::new_v4();
        let copy_time = chrono::Utc::now();

        sqlx::query(
            r#"
            INSERT INTO remote_instances (id, file_name, librarian_name, copy_time)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(file_name)
        .bind(librarian_name)
        .bind(copy_time)
        .execute(&self.pool)
        .await?;

        Ok(RemoteInstance {
            id,
            file_name: file_name.to_string(),
            librarian_name: librarian_name.to_string(),
            copy_time,
        })
    }

    pub async fn list_remote_instances_for_file(
        &self,
        file_name: &str,
    ) -> Result<Vec<RemoteInstance>> {
        let rows = sqlx::query_as::<_, RemoteInstanceRow>(
            "SELECT * FROM remote_instances WHERE file_name = $1",
        )
        .bind(file_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RemoteInstance::from).collect())
    }

    pub async fn get_remote_instance(&self, id: Uuid) -> Result<Option<RemoteInstance>> {
        let row = sqlx::query_as::<_, RemoteInstanceRow>(
            "SELECT * FROM remote_instances WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RemoteInstance::from))
    }

    pub async fn delete_remote_instance(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM remote_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

use crate::rows::InstanceRow;
use crate::Database;
use librarian_core::{DeletionPolicy, Instance, ManifestEntry, Result};
use uuid::Uuid;

impl Database {
    pub async fn create_instance(
        &self,
        file_name: &str,
        store_name: &str,
        path: &str,
        deletion_policy: DeletionPolicy,
    ) -> Result<Instance> {
        let id = Uuid::new_v4();
        let create_time = chrono::Utc::now();

        sqlx::query(
            r#"
            INSERT INTO instances (id, file_name, store_name, path, deletion_policy, create_time, available)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            "#,
        )
        .bind(id)
        .bind(file_name)
        .bind(store_name)
        .bind(path)
        .bind(deletion_policy)
        .bind(create_time)
        .execute(&self.pool)
        .await?;

        Ok(Instance {
            id,
            file_name: file_name.to_string(),
            store_name: store_name.to_string(),
            path: path.to_string(),
            deletion_policy,
            create_time,
            available: true,
        })
    }

    pub async fn get_instance(&self, id: Uuid) -> Result<Option<Instance>> {
        let row = sqlx::query_as::<_, InstanceRow>("SELECT * FROM instances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Instance::from))
    }

    pub async fn get_instance_by_store_path(
        &self,
        store_name: &str,
        path: &str,
    ) -> Result<Option<Instance>> {
        let row = sqlx::query_as::<_, InstanceRow>(
            "SELECT * FROM instances WHERE store_name = $1 AND path = $2",
        )
        .bind(store_name)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Instance::from))
    }

    pub async fn list_instances_for_store(&self, store_name: &str) -> Result<Vec<Instance>> {
        let rows = sqlx::query_as::<_, InstanceRow>(
            "SELECT * FROM instances WHERE store_name = $1 ORDER BY create_time",
        )
        .bind(store_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Instance::from).collect())
    }

    pub async fn list_instances_for_file(&self, file_name: &str) -> Result<Vec<Instance>> {
        let rows = sqlx::query_as::<_, InstanceRow>(
            "SELECT * FROM instances WHERE file_name = $1 ORDER BY create_time",
        )
        .bind(file_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Instance::from).collect())
    }

    pub async fn delete_instance(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// The manifest of a store: every instance it holds, joined against
    /// its file's size and checksum. Backs the admin `manifest` endpoint.
    pub async fn list_manifest_entries(&self, store_name: &str) -> Result<Vec<ManifestEntry>> {
        let rows = sqlx::query_as::<_, (String, i64, String)>(
            r#"
            SELECT instances.path, files.size, files.checksum
            FROM instances
            JOIN files ON files.name = instances.file_name
            WHERE instances.store_name = $1
            ORDER BY instances.create_time
            "#,
        )
        .bind(store_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(path, size, checksum)| ManifestEntry {
                relative_path: path.into(),
                size,
                checksum,
            })
            .collect())
    }
}

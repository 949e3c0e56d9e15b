use crate::rows::{IncomingTransferRow, OutgoingTransferRow};
use crate::Database;
use chrono::Utc;
use librarian_core::{IncomingTransfer, OutgoingTransfer, Result, TransferStatus};

impl Database {
    pub async fn create_outgoing_transfer(
        &self,
        file_name: &str,
        destination_librarian: &str,
        source_path: &str,
        dest_path: &str,
        transfer_size: i64,
        transfer_checksum: &str,
        standing_order_event: Option<&str>,
    ) -> Result<OutgoingTransfer> {
        let start_time = Utc::now();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO outgoing_transfers
                (file_name, destination_librarian, source_path, dest_path,
                 transfer_size, transfer_checksum, status, start_time, standing_order_event)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(file_name)
        .bind(destination_librarian)
        .bind(source_path)
        .bind(dest_path)
        .bind(transfer_size)
        .bind(transfer_checksum)
        .bind(TransferStatus::Initiated)
        .bind(start_time)
        .bind(standing_order_event)
        .fetch_one(&self.pool)
        .await?;

        Ok(OutgoingTransfer {
            id,
            file_name: file_name.to_string(),
            destination_librarian: destination_librarian.to_string(),
            source_path: source_path.to_string(),
            dest_path: dest_path.to_string(),
            transfer_size,
            transfer_checksum: transfer_checksum.to_string(),
            status: TransferStatus::Initiated,
            start_time,
            end_time: None,
            send_queue_id: None,
            standing_order_event: standing_order_event.map(str::to_string),
        })
    }

    /// Whether a standing order's launch event already has an outgoing
    /// transfer that hasn't failed or been cancelled — either still in
    /// flight or already completed. Used to dedup set C (in-flight) from
    /// set B (already succeeded) without recording the success marker
    /// before the transfer actually lands.
    pub async fn has_unresolved_standing_order_transfer(
        &self,
        file_name: &str,
        standing_order_event: &str,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM outgoing_transfers
            WHERE file_name = $1 AND standing_order_event = $2
              AND status NOT IN ($3, $4)
            "#,
        )
        .bind(file_name)
        .bind(standing_order_event)
        .bind(TransferStatus::Failed)
        .bind(TransferStatus::Cancelled)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    pub async fn get_outgoing_transfer(&self, id: i64) -> Result<Option<OutgoingTransfer>> {
        let row =
            sqlx::query_as::<_, OutgoingTransferRow>("SELECT * FROM outgoing_transfers WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(OutgoingTransfer::from))
    }

    pub async fn set_outgoing_transfer_status(
        &self,
        id: i64,
        status: TransferStatus,
    ) -> Result<()> {
        let end_time = status.is_terminal().then(Utc::now);

        sqlx::query(
            "UPDATE outgoing_transfers SET status = $2, end_time = COALESCE($3, end_time) WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(end_time)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn fail_outgoing_transfer(&self, id: i64) -> Result<()> {
        self.set_outgoing_transfer_status(id, TransferStatus::Failed)
            .await
    }

    pub async fn create_incoming_transfer(
        &self,
        upload_name: &str,
        uploader: &str,
        source: &str,
        transfer_size: i64,
        transfer_checksum: &str,
        staging_path: &str,
        store_path: &str,
        store_name: &str,
    ) -> Result<IncomingTransfer> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO incoming_transfers
                (upload_name, uploader, source, transfer_size, transfer_checksum,
                 staging_path, store_path, store_name, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(upload_name)
        .bind(uploader)
        .bind(source)
        .bind(transfer_size)
        .bind(transfer_checksum)
        .bind(staging_path)
        .bind(store_path)
        .bind(store_name)
        .bind(TransferStatus::Ongoing)
        .fetch_one(&self.pool)
        .await?;

        Ok(IncomingTransfer {
            id,
            upload_name: upload_name.to_string(),
            uploader: uploader.to_string(),
            source: source.to_string(),
            transfer_size,
            transfer_checksum: transfer_checksum.to_string(),
            staging_path: staging_path.to_string(),
            store_path: store_path.to_string(),
            store_name: store_name.to_string(),
            status: TransferStatus::Ongoing,
            end_time: None,
        })
    }

    pub async fn list_ongoing_incoming_transfers(&self) -> Result<Vec<IncomingTransfer>> {
        let rows = sqlx::query_as::<_, IncomingTransferRow>(
            "SELECT * FROM incoming_transfers WHERE status = $1",
        )
        .bind(TransferStatus::Ongoing)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(IncomingTransfer::from).collect())
    }

    pub async fn complete_incoming_transfer(&self, id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE incoming_transfers SET status = $2, end_time = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(TransferStatus::Completed)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

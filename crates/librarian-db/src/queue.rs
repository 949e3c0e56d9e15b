use crate::rows::{SendQueueRow, SendQueueTransferRow};
use crate::Database;
use chrono::Utc;
use librarian_core::{Result, SendQueueItem, SendQueueTransfer};
use sqlx::{Postgres, Transaction};

/// A `send_queue` row claimed under `SELECT ... FOR UPDATE SKIP LOCKED`,
/// together with the open transaction holding its row lock.
///
/// The lock is held across whatever async work the caller does with
/// `item` and `transfers` (driving a [`librarian_core::TransferManager`]
/// lives outside this crate) and is only released by one of the
/// finishing methods below, or by dropping this value, which rolls the
/// transaction back and leaves the row exactly as found for the next
/// poll.
pub struct ClaimedQueueItem {
    txn: Transaction<'static, Postgres>,
    pub item: SendQueueItem,
    pub transfers: Vec<SendQueueTransfer>,
}

impl Database {
    /// Claims the highest-priority, oldest un-consumed queue item, if any.
    /// Mirrors `consume_queue_item`'s selection order.
    pub async fn claim_next_send_queue_item(&self) -> Result<Option<ClaimedQueueItem>> {
        let mut txn = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SendQueueRow>(
            r#"
            SELECT * FROM send_queue
            WHERE completed = FALSE AND consumed = FALSE
            ORDER BY priority DESC, created_time ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .fetch_optional(&mut *txn)
        .await?;

        let Some(row) = row else {
            txn.rollback().await?;
            return Ok(None);
        };

        let item = SendQueueItem::from(row);
        let transfers = fetch_transfers(&mut txn, item.id).await?;

        Ok(Some(ClaimedQueueItem {
            txn,
            item,
            transfers,
        }))
    }

    /// Claims the oldest consumed-but-not-completed queue item, if any.
    /// Mirrors `check_on_consumed`'s selection order.
    pub async fn claim_next_consumed_item(&self) -> Result<Option<ClaimedQueueItem>> {
        let mut txn = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SendQueueRow>(
            r#"
            SELECT * FROM send_queue
            WHERE consumed = TRUE AND completed = FALSE
            ORDER BY created_time ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .fetch_optional(&mut *txn)
        .await?;

        let Some(row) = row else {
            txn.rollback().await?;
            return Ok(None);
        };

        let item = SendQueueItem::from(row);
        let transfers = fetch_transfers(&mut txn, item.id).await?;

        Ok(Some(ClaimedQueueItem {
            txn,
            item,
            transfers,
        }))
    }

    pub async fn enqueue_send_queue_item(
        &self,
        priority: i32,
        destination: &str,
        async_transfer_manager: serde_json::Value,
        transfers: &[(i64, String, String)],
    ) -> Result<i64> {
        let mut txn = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO send_queue
                (priority, created_time, destination, async_transfer_manager, consumed, completed, retries, failed)
            VALUES ($1, $2, $3, $4, FALSE, FALSE, 0, FALSE)
            RETURNING id
            "#,
        )
        .bind(priority)
        .bind(Utc::now())
        .bind(destination)
        .bind(async_transfer_manager)
        .fetch_one(&mut *txn)
        .await?;

        for (outgoing_transfer_id, source_path, dest_path) in transfers {
            sqlx::query(
                r#"
                INSERT INTO send_queue_transfers (send_queue_id, outgoing_transfer_id, source_path, dest_path)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(id)
            .bind(outgoing_transfer_id)
            .bind(source_path)
            .bind(dest_path)
            .execute(&mut *txn)
            .await?;

            sqlx::query("UPDATE outgoing_transfers SET send_queue_id = $2 WHERE id = $1")
                .bind(outgoing_transfer_id)
                .bind(id)
                .execute(&mut *txn)
                .await?;
        }

        txn.commit().await?;
        Ok(id)
    }
}

async fn fetch_transfers(
    txn: &mut Transaction<'static, Postgres>,
    send_queue_id: i64,
) -> Result<Vec<SendQueueTransfer>> {
    let rows = sqlx::query_as::<_, SendQueueTransferRow>(
        "SELECT * FROM send_queue_transfers WHERE send_queue_id = $1",
    )
    .bind(send_queue_id)
    .fetch_all(&mut **txn)
    .await?;

    Ok(rows.into_iter().map(SendQueueTransfer::from).collect())
}

impl ClaimedQueueItem {
    /// The batch transfer succeeded: record the mutated transfer-manager
    /// state and mark the item consumed, releasing the lock.
    pub async fn mark_consumed(mut self, updated_manager_state: serde_json::Value) -> Result<()> {
        sqlx::query(
            "UPDATE send_queue SET consumed = TRUE, consumed_time = $2, async_transfer_manager = $3 WHERE id = $1",
        )
        .bind(self.item.id)
        .bind(Utc::now())
        .bind(updated_manager_state)
        .execute(&mut *self.txn)
        .await?;

        self.txn.commit().await?;
        Ok(())
    }

    /// The batch transfer failed: persist the mutated manager state and
    /// bump the retry counter, marking the item `failed` once it exceeds
    /// `max_retries`. Returns whether the item was given up on.
    pub async fn mark_retry(
        mut self,
        updated_manager_state: serde_json::Value,
        max_retries: i32,
    ) -> Result<bool> {
        let retries = self.item.retries + 1;
        let failed = retries > max_retries;

        sqlx::query(
            "UPDATE send_queue SET retries = $2, failed = $3, async_transfer_manager = $4 WHERE id = $1",
        )
        .bind(self.item.id)
        .bind(retries)
        .bind(failed)
        .bind(updated_manager_state)
        .execute(&mut *self.txn)
        .await?;

        self.txn.commit().await?;
        Ok(failed)
    }

    /// The consumed item's transfers all reached a terminal state:
    /// mark the queue item completed, releasing the lock.
    pub async fn mark_completed(mut self) -> Result<()> {
        sqlx::query(
            "UPDATE send_queue SET completed = TRUE, completed_time = $2 WHERE id = $1",
        )
        .bind(self.item.id)
        .bind(Utc::now())
        .execute(&mut *self.txn)
        .await?;

        self.txn.commit().await?;
        Ok(())
    }

    /// Leaves the row untouched and releases the lock. Used when a
    /// claimed item's transfers are still in flight (`INITIATED`), or
    /// when the peer librarian for this destination is missing and the
    /// item should be revisited on the next poll rather than abandoned.
    pub async fn release(mut self) -> Result<()> {
        self.txn.rollback().await?;
        Ok(())
    }
}

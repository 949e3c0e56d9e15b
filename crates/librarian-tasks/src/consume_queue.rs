use std::path::PathBuf;

use librarian_core::{ErrorCategory, ErrorSeverity, ServerSettings};
use librarian_db::Database;

use crate::transfer_manager_state::TransferManagerState;

/// Claims and drives a single `send_queue` item (spec §4.4). Returns
/// whether a row was available to work on, so the caller can decide
/// whether to keep draining the queue or wait for the next poll.
pub async fn consume_queue_item(db: &Database, settings: &ServerSettings) -> anyhow::Result<bool> {
    let Some(claimed) = db.claim_next_send_queue_item().await? else {
        return Ok(false);
    };

    let mut manager = match TransferManagerState::from_json(claimed.item.async_transfer_manager.clone())
    {
        Ok(manager) => manager,
        Err(error) => {
            db.log_error(
                ErrorSeverity::Critical,
                ErrorCategory::Programming,
                format!(
                    "send_queue item {} carries an unparseable transfer manager: {error}",
                    claimed.item.id
                ),
            )
            .await
            .ok();
            claimed.release().await?;
            return Ok(true);
        }
    };

    let transfers: Vec<(PathBuf, PathBuf)> = claimed
        .transfers
        .iter()
        .map(|t| (PathBuf::from(&t.source_path), PathBuf::from(&t.dest_path)))
        .collect();

    match manager.batch_transfer(&transfers, &settings.transfer_defaults).await {
        Ok(true) => {
            let state = manager.to_json();
            claimed.mark_consumed(state).await?;
        }
        Ok(false) => {
            let item_id = claimed.item.id;
            let state = manager.to_json();
            let gave_up = claimed
                .mark_retry(state, settings.max_async_send_retries)
                .await?;

            if gave_up {
                db.log_error(
                    ErrorSeverity::Error,
                    ErrorCategory::Transfer,
                    format!("send_queue item {item_id} exceeded max retries and was marked failed"),
                )
                .await
                .ok();
            }
        }
        Err(error) => {
            db.log_error(
                ErrorSeverity::Warning,
                ErrorCategory::Transfer,
                format!(
                    "batch_transfer failed for send_queue item {}: {error}",
                    claimed.item.id
                ),
            )
            .await
            .ok();

            let item_id = claimed.item.id;
            let state = manager.to_json();
            let gave_up = claimed
                .mark_retry(state, settings.max_async_send_retries)
                .await?;

            if gave_up {
                db.log_error(
                    ErrorSeverity::Error,
                    ErrorCategory::Transfer,
                    format!("send_queue item {item_id} exceeded max retries and was marked failed"),
                )
                .await
                .ok();
            }
        }
    }

    Ok(true)
}

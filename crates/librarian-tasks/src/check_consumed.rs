use librarian_core::{ErrorCategory, ErrorSeverity, ServerSettings, TransferStatus};
use librarian_db::Database;

use crate::transfer_manager_state::TransferManagerState;

/// Probes a single consumed-but-not-completed `send_queue` item (spec
/// §4.5). A missing destination librarian is left for the next poll
/// rather than abandoned outright — there is no evidence the transfer
/// itself failed, only that we can't currently confirm it.
pub async fn check_on_consumed_item(db: &Database, settings: &ServerSettings) -> anyhow::Result<bool> {
    let Some(claimed) = db.claim_next_consumed_item().await? else {
        return Ok(false);
    };

    if db.get_librarian_by_name(&claimed.item.destination).await?.is_none() {
        db.log_error(
            ErrorSeverity::Critical,
            ErrorCategory::LibrarianNetworkAvailability,
            format!(
                "destination librarian '{}' not found while checking send_queue item {}",
                claimed.item.destination, claimed.item.id
            ),
        )
        .await
        .ok();
        claimed.release().await?;
        return Ok(true);
    }

    let manager = match TransferManagerState::from_json(claimed.item.async_transfer_manager.clone()) {
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

    let status = match manager.transfer_status(&settings.transfer_defaults).await {
        Ok(status) => status,
        Err(error) => {
            db.log_error(
                ErrorSeverity::Warning,
                ErrorCategory::Transfer,
                format!(
                    "transfer_status failed for send_queue item {}: {error}",
                    claimed.item.id
                ),
            )
            .await
            .ok();
            claimed.release().await?;
            return Ok(true);
        }
    };

    match status {
        TransferStatus::Initiated | TransferStatus::Ongoing => {
            claimed.release().await?;
        }
        TransferStatus::Completed | TransferStatus::Staged => {
            for transfer in &claimed.transfers {
                if let Err(error) = db
                    .set_outgoing_transfer_status(transfer.outgoing_transfer_id, settings.complete_status)
                    .await
                {
                    db.log_error(
                        ErrorSeverity::Critical,
                        ErrorCategory::Programming,
                        format!(
                            "failed to update outgoing transfer {}: {error}",
                            transfer.outgoing_transfer_id
                        ),
                    )
                    .await
                    .ok();
                }
            }
            claimed.mark_completed().await?;
        }
        TransferStatus::Failed | TransferStatus::Cancelled => {
            for transfer in &claimed.transfers {
                if let Err(error) = db.fail_outgoing_transfer(transfer.outgoing_transfer_id).await {
                    db.log_error(
                        ErrorSeverity::Warning,
                        ErrorCategory::Transfer,
                        format!(
                            "failed to mark outgoing transfer {} failed: {error}",
                            transfer.outgoing_transfer_id
                        ),
                    )
                    .await
                    .ok();
                }
            }
            claimed.mark_completed().await?;
        }
    }

    Ok(true)
}

use std::path::PathBuf;

use librarian_core::{
    CloneCompleteRequest, ErrorCategory, ErrorSeverity, File, LibrarianError, ServerSettings,
    StoreManager,
};
use librarian_db::Database;

/// Reconciles `ONGOING` incoming transfers against their staged files
/// (spec §4.6). A transfer whose staged file doesn't yet match the
/// advertised checksum/size is simply not done uploading yet and is left
/// for the next poll; every other failure is logged and the transfer is
/// also left in place rather than force-failed, since the upload could
/// still complete correctly on a later attempt.
pub async fn reconcile_incoming_transfers(
    db: &Database,
    store: &dyn StoreManager,
    http: &reqwest::Client,
    settings: &ServerSettings,
) -> anyhow::Result<()> {
    for transfer in db.list_ongoing_incoming_transfers().await? {
        let staged_path = PathBuf::from(&transfer.staging_path);

        let info = match store.path_info(&staged_path).await {
            Ok(info) => info,
            Err(LibrarianError::NotStaged(_)) => {
                db.log_error(
                    ErrorSeverity::Error,
                    ErrorCategory::DataAvailability,
                    format!(
                        "staged file for incoming transfer {} is missing: {}",
                        transfer.id, transfer.staging_path
                    ),
                )
                .await
                .ok();
                continue;
            }
            Err(error) => {
                db.log_error(
                    ErrorSeverity::Critical,
                    ErrorCategory::Store,
                    format!("path_info failed for incoming transfer {}: {error}", transfer.id),
                )
                .await
                .ok();
                continue;
            }
        };

        if info.md5.to_lowercase() != transfer.transfer_checksum.to_lowercase()
            || info.size != transfer.transfer_size as u64
        {
            tracing::info!(transfer_id = transfer.id, "incoming transfer not yet complete");
            continue;
        }

        let final_path = PathBuf::from(&transfer.store_path);
        if let Err(error) = store.commit(&staged_path, &final_path).await {
            db.log_error(
                ErrorSeverity::Error,
                ErrorCategory::Store,
                format!("commit failed for incoming transfer {}: {error}", transfer.id),
            )
            .await
            .ok();
            continue;
        }

        db.create_file(&File::new(
            transfer.upload_name.clone(),
            transfer.transfer_size,
            transfer.transfer_checksum.clone(),
            transfer.uploader.clone(),
            transfer.source.clone(),
        ))
        .await?;

        let instance = db
            .create_instance(
                &transfer.upload_name,
                &transfer.store_name,
                &transfer.store_path,
                settings.default_deletion_policy,
            )
            .await?;

        db.complete_incoming_transfer(transfer.id).await?;

        match db.get_librarian_by_name(&transfer.source).await? {
            Some(peer) => {
                let url = format!("{}:{}/api/v2/clone/complete", peer.url, peer.port);
                let body = CloneCompleteRequest {
                    source_transfer_id: transfer.id,
                    destination_instance_id: instance.id,
                    store_id: transfer.store_name.clone(),
                };

                if let Err(error) = http.post(&url).json(&body).send().await {
                    db.log_error(
                        ErrorSeverity::Warning,
                        ErrorCategory::LibrarianNetworkAvailability,
                        format!(
                            "clone/complete callback to '{}' failed: {error}",
                            transfer.source
                        ),
                    )
                    .await
                    .ok();
                }
            }
            None => {
                db.log_error(
                    ErrorSeverity::Warning,
                    ErrorCategory::LibrarianNetworkAvailability,
                    format!(
                        "source librarian '{}' not found for clone/complete callback",
                        transfer.source
                    ),
                )
                .await
                .ok();
            }
        }

        // Best effort: the transfer is already committed and recorded,
        // so a failure to clean up the staging copy is not retried here.
        store.unstage(&staged_path).await;
    }

    Ok(())
}

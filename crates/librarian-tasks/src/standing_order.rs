use std::time::{Duration, Instant};

use chrono::Utc;
use librarian_core::{ErrorCategory, ErrorSeverity, SavedSearch, ServerSettings};
use librarian_db::Database;
use librarian_transfer::RsyncSshTransferManager;

use crate::transfer_manager_state::TransferManagerState;

/// Throttled evaluator for standing orders (spec §4.7). Mirrors the
/// original `StandingOrderManager` singleton: a minimum interval between
/// full sweeps, and per-file dedup against any outgoing transfer for the
/// order that hasn't failed or been cancelled, so a file with a copy
/// already in flight or already landed is never relaunched. The
/// `file_events` success marker itself is only recorded once the transfer
/// actually completes (see `librarian-http::api::clone_complete`), not at
/// launch time.
pub struct StandingOrderEvaluator {
    last_check: Option<Instant>,
}

impl Default for StandingOrderEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl StandingOrderEvaluator {
    pub fn new() -> Self {
        Self { last_check: None }
    }

    /// Returns the number of new copies launched, or `None` if the
    /// minimum interval since the last sweep hasn't elapsed yet.
    pub async fn maybe_launch_copies(
        &mut self,
        db: &Database,
        settings: &ServerSettings,
        now: Instant,
    ) -> anyhow::Result<Option<usize>> {
        if let Some(last) = self.last_check {
            let min_interval = Duration::from_secs(settings.standing_order_min_eval_interval_secs);
            if now.duration_since(last) < min_interval {
                return Ok(None);
            }
        }
        self.last_check = Some(now);

        let orders = db.list_standing_orders().await?;
        let mut launched = 0;

        for order in orders {
            match launch_copies_for_order(db, &order).await {
                Ok(count) => launched += count,
                Err(error) => {
                    db.log_error(
                        ErrorSeverity::Error,
                        ErrorCategory::Programming,
                        format!("standing order '{}' failed to evaluate: {error}", order.name),
                    )
                    .await
                    .ok();
                }
            }
        }

        Ok(Some(launched))
    }
}

async fn launch_copies_for_order(
    db: &Database,
    order: &librarian_core::StandingOrder,
) -> anyhow::Result<usize> {
    let Some(destination) = db.get_librarian_by_name(&order.conn_name).await? else {
        db.log_error(
            ErrorSeverity::Warning,
            ErrorCategory::LibrarianNetworkAvailability,
            format!(
                "standing order '{}' targets unknown librarian connection '{}'",
                order.name, order.conn_name
            ),
        )
        .await
        .ok();
        return Ok(0);
    };

    let candidates = match &order.search {
        SavedSearch::Empty => Vec::new(),
        SavedSearch::NamedQuery { name } => db.files_matching_named_query(name).await?,
        SavedSearch::TimeWindow { days, like_pattern } => {
            db.files_in_time_window(Utc::now() - chrono::Duration::days(*days), like_pattern)
                .await?
        }
    };

    let event_type = order.event_type();
    let mut launched = 0;

    for file in candidates {
        if db.has_unresolved_standing_order_transfer(&file.name, &event_type).await? {
            continue;
        }

        let instances = db.list_instances_for_file(&file.name).await?;
        let Some(instance) = instances.into_iter().find(|i| i.available) else {
            continue;
        };

        let outgoing = db
            .create_outgoing_transfer(
                &file.name,
                &destination.name,
                &instance.path,
                &instance.path,
                file.size,
                &file.checksum,
                Some(&event_type),
            )
            .await?;

        let manager = TransferManagerState::RsyncSsh(RsyncSshTransferManager::new(
            destination.url.clone(),
            None,
        ));

        db.enqueue_send_queue_item(
            0,
            &destination.name,
            manager.to_json(),
            &[(outgoing.id, instance.path.clone(), instance.path.clone())],
        )
        .await?;

        launched += 1;
    }

    Ok(launched)
}

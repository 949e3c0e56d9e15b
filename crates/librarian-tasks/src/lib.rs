//! Background task runner (spec §4.4-§4.7): a periodic-loop-plus-
//! graceful-shutdown runner driving four independent jobs off one poll
//! tick.
//!
//! Every job here follows the same error-handling rule: nothing a job
//! does is allowed to panic or propagate out of the runner's loop. A
//! failure is logged through [`librarian_db::Database::log_error`] and
//! the loop moves on to the next tick.

mod check_consumed;
mod consume_queue;
mod receive_clone;
mod standing_order;
mod transfer_manager_state;

pub use check_consumed::check_on_consumed_item;
pub use consume_queue::consume_queue_item;
pub use receive_clone::reconcile_incoming_transfers;
pub use standing_order::StandingOrderEvaluator;
pub use transfer_manager_state::TransferManagerState;

use std::sync::Arc;
use std::time::Instant;

use librarian_core::{ErrorCategory, ErrorSeverity, ServerSettings, StoreManager};
use librarian_db::Database;
use tokio::sync::watch;

pub struct TaskRunner {
    db: Arc<Database>,
    store: Arc<dyn StoreManager>,
    http: reqwest::Client,
    settings: ServerSettings,
}

impl TaskRunner {
    pub fn new(db: Arc<Database>, store: Arc<dyn StoreManager>, settings: ServerSettings) -> Self {
        Self {
            db,
            store,
            http: reqwest::Client::new(),
            settings,
        }
    }

    /// Runs one pass of every background job: drain what's ready on the
    /// send queue, check on what's already consumed, reconcile incoming
    /// transfers, and evaluate standing orders. Each job is isolated from
    /// the others' failures.
    pub async fn tick(&self) {
        self.drain_send_queue().await;
        self.drain_consumed_checks().await;

        if let Err(error) =
            reconcile_incoming_transfers(&self.db, self.store.as_ref(), &self.http, &self.settings)
                .await
        {
            self.log(ErrorCategory::Transfer, format!("incoming reconciliation pass failed: {error}"))
                .await;
        }
    }

    async fn drain_send_queue(&self) {
        loop {
            match consume_queue_item(&self.db, &self.settings).await {
                Ok(true) => continue,
                Ok(false) => break,
                Err(error) => {
                    self.log(ErrorCategory::Transfer, format!("consume_queue_item failed: {error}"))
                        .await;
                    break;
                }
            }
        }
    }

    async fn drain_consumed_checks(&self) {
        loop {
            match check_on_consumed_item(&self.db, &self.settings).await {
                Ok(true) => continue,
                Ok(false) => break,
                Err(error) => {
                    self.log(
                        ErrorCategory::Transfer,
                        format!("check_on_consumed_item failed: {error}"),
                    )
                    .await;
                    break;
                }
            }
        }
    }

    async fn log(&self, category: ErrorCategory, message: String) {
        self.db
            .log_error(ErrorSeverity::Error, category, message)
            .await
            .ok();
    }

    /// Runs [`Self::tick`] on `settings.task_poll_interval`, plus a
    /// standing-order sweep throttled to its own, longer interval, until
    /// `shutdown` fires.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut standing_orders = StandingOrderEvaluator::new();
        let mut interval = tokio::time::interval(self.settings.task_poll_interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let started = Instant::now();
                    self.tick().await;

                    match standing_orders
                        .maybe_launch_copies(&self.db, &self.settings, Instant::now())
                        .await
                    {
                        Ok(Some(launched)) if launched > 0 => {
                            tracing::info!(launched, "standing orders launched new copies");
                        }
                        Ok(_) => {}
                        Err(error) => {
                            self.log(
                                ErrorCategory::Programming,
                                format!("standing order evaluation failed: {error}"),
                            )
                            .await;
                        }
                    }

                    let elapsed = started.elapsed();
                    if elapsed > self.settings.task_soft_deadline {
                        tracing::warn!(
                            ?elapsed,
                            deadline = ?self.settings.task_soft_deadline,
                            "background task tick exceeded its soft deadline"
                        );
                    }
                }
                _ = shutdown.changed() => {
                    tracing::info!("background task runner shutting down");
                    break;
                }
            }
        }
    }
}

/// Convenience for tests and the binary entry point: spins up a runner
/// and a shutdown channel together.
pub fn spawn(
    db: Arc<Database>,
    store: Arc<dyn StoreManager>,
    settings: ServerSettings,
) -> (Arc<TaskRunner>, watch::Sender<bool>, tokio::task::JoinHandle<()>) {
    let runner = Arc::new(TaskRunner::new(db, store, settings));
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(runner.clone().run(rx));
    (runner, tx, handle)
}

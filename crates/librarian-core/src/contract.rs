use crate::{Result, TransferManagerDefaults, TransferStatus};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Result of probing a staged file (spec §4.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInfo {
    pub path: PathBuf,
    pub md5: String,
    pub size: u64,
}

/// The store manager contract (spec §4.1). Implementations own one
/// store's filesystem; the rest of the core only ever calls through this
/// trait, never touches the filesystem directly.
#[async_trait]
pub trait StoreManager: Send + Sync {
    /// Probe a staged file. Fails with [`crate::LibrarianError::NotStaged`]
    /// if it doesn't exist.
    async fn path_info(&self, staged_path: &Path) -> Result<PathInfo>;

    /// Atomically move bytes from the staging area to `final_path`. Must
    /// be durable and idempotent: a repeat commit of identical content
    /// succeeds (or returns `AlreadyPresent`), never corrupts.
    async fn commit(&self, staged_path: &Path, final_path: &Path) -> Result<()>;

    /// Best-effort delete of a staged file. A missing file is not an
    /// error.
    async fn unstage(&self, staged_path: &Path);

    /// Bytes free on the underlying device.
    async fn free_space(&self) -> Result<u64>;

    fn enabled(&self) -> bool;
    fn available(&self) -> bool;
    fn ingestable(&self) -> bool;
}

/// The async transfer manager contract (spec §4.2): a polymorphic byte
/// mover. `batch_transfer` may mutate internal state (e.g. an issued job
/// id); callers must read the state back via [`serialize_state`] after
/// every call and persist it, since the next call may come from a
/// different process.
#[async_trait]
pub trait TransferManager: Send + Sync {
    /// Enqueue or perform the batch. Returns `true` on success. `false`
    /// means the caller should retry (spec §4.4 step 6).
    async fn batch_transfer(
        &mut self,
        transfers: &[(PathBuf, PathBuf)],
        settings: &TransferManagerDefaults,
    ) -> Result<bool>;

    /// Idempotent probe of the batch's current status.
    async fn transfer_status(&self, settings: &TransferManagerDefaults) -> Result<TransferStatus>;

    /// A self-contained, round-trippable snapshot of this manager's
    /// state, for storage in [`crate::SendQueueItem::async_transfer_manager`].
    fn serialize_state(&self) -> serde_json::Value;
}

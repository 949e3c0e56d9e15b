use std::path::PathBuf;

use librarian_core::{LibrarianError, Result, TransferManagerDefaults, TransferManager, TransferStatus};
use librarian_transfer::{LocalCopyTransferManager, RsyncSshTransferManager};
use serde::{Deserialize, Serialize};

/// The tagged union of [`TransferManager`] kinds a `send_queue` row can
/// carry, dispatched on the `kind` tag stored alongside the manager's own
/// state in `async_transfer_manager`. Kept in this crate rather than
/// `librarian-transfer` since it is the task runner, not the transfer
/// crate itself, that needs to serialize/deserialize across polls.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TransferManagerState {
    Local(LocalCopyTransferManager),
    RsyncSsh(RsyncSshTransferManager),
}

impl TransferManagerState {
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| LibrarianError::Transfer(format!("bad transfer manager state: {e}")))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("TransferManagerState always serializes")
    }

    pub async fn batch_transfer(
        &mut self,
        transfers: &[(PathBuf, PathBuf)],
        settings: &TransferManagerDefaults,
    ) -> Result<bool> {
        match self {
            Self::Local(manager) => manager.batch_transfer(transfers, settings).await,
            Self::RsyncSsh(manager) => manager.batch_transfer(transfers, settings).await,
        }
    }

    pub async fn transfer_status(&self, settings: &TransferManagerDefaults) -> Result<TransferStatus> {
        match self {
            Self::Local(manager) => manager.transfer_status(settings).await,
            Self::RsyncSsh(manager) => manager.transfer_status(settings).await,
        }
    }
}

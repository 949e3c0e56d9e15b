//! [`TransferManager`] implementations for outgoing copies (spec §4.3,
//! §9).
//!
//! Modeled as a plain, `Clone`-able progress struct rather than a live
//! connection held across polls, and on the `rsync_bandwidth_limit_kbps` /
//! `connect_timeout_secs` knobs already carried on
//! [`librarian_core::TransferManagerDefaults`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use librarian_core::{LibrarianError, Result, TransferManagerDefaults, TransferManager, TransferStatus};
use serde::{Deserialize, Serialize};

/// Copies files on a shared or locally mounted filesystem. `batch_transfer`
/// performs the whole batch inline, so the manager is always either fully
/// done or has not run yet.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LocalCopyTransferManager {
    completed: bool,
}

impl LocalCopyTransferManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: serde_json::Value) -> Result<Self> {
        serde_json::from_value(state)
            .map_err(|e| LibrarianError::Transfer(format!("bad local-copy manager state: {e}")))
    }
}

#[async_trait]
impl TransferManager for LocalCopyTransferManager {
    async fn batch_transfer(
        &mut self,
        transfers: &[(PathBuf, PathBuf)],
        _settings: &TransferManagerDefaults,
    ) -> Result<bool> {
        for (source, dest) in transfers {
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::copy(source, dest).await?;
        }

        self.completed = true;
        Ok(true)
    }

    async fn transfer_status(&self, _settings: &TransferManagerDefaults) -> Result<TransferStatus> {
        Ok(if self.completed {
            TransferStatus::Completed
        } else {
            TransferStatus::Initiated
        })
    }

    fn serialize_state(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("LocalCopyTransferManager state always serializes")
    }
}

/// Copies files to a remote librarian over `rsync`-over-SSH, launched as a
/// detached background process. `batch_transfer` only starts the rsync
/// run; `transfer_status` is polled afterwards to learn whether it
/// finished, matching the original's two-phase consume/check split.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RsyncSshTransferManager {
    host: String,
    user: Option<String>,
    launched: bool,
    destinations: Vec<PathBuf>,
}

impl RsyncSshTransferManager {
    pub fn new(host: impl Into<String>, user: Option<String>) -> Self {
        Self {
            host: host.into(),
            user,
            launched: false,
            destinations: Vec::new(),
        }
    }

    pub fn from_state(state: serde_json::Value) -> Result<Self> {
        serde_json::from_value(state)
            .map_err(|e| LibrarianError::Transfer(format!("bad rsync manager state: {e}")))
    }

    fn remote_target(&self, path: &Path) -> String {
        let user_prefix = self
            .user
            .as_deref()
            .map(|u| format!("{u}@"))
            .unwrap_or_default();
        format!("{user_prefix}{}:{}", self.host, path.display())
    }
}

#[async_trait]
impl TransferManager for RsyncSshTransferManager {
    async fn batch_transfer(
        &mut self,
        transfers: &[(PathBuf, PathBuf)],
        settings: &TransferManagerDefaults,
    ) -> Result<bool> {
        if self.launched {
            // Already in flight; nothing to do until transfer_status sees it finish.
            return Ok(true);
        }

        for (source, dest) in transfers {
            let mut command = tokio::process::Command::new("rsync");
            command.arg("-a").arg("--timeout").arg(settings.connect_timeout_secs.to_string());

            if let Some(limit) = settings.rsync_bandwidth_limit_kbps {
                command.arg(format!("--bwlimit={limit}"));
            }

            command.arg(source).arg(self.remote_target(dest));

            command
                .spawn()
                .map_err(|e| LibrarianError::Transfer(format!("failed to spawn rsync: {e}")))?;

            self.destinations.push(dest.clone());
        }

        self.launched = true;
        Ok(true)
    }

    async fn transfer_status(&self, _settings: &TransferManagerDefaults) -> Result<TransferStatus> {
        if !self.launched {
            return Ok(TransferStatus::Initiated);
        }

        // Best-effort liveness check: a destination path reachable over
        // the local filesystem (e.g. an NFS-mounted store) lets us confirm
        // completion without a callback from the remote side.
        for dest in &self.destinations {
            if !dest.exists() {
                return Ok(TransferStatus::Ongoing);
            }
        }

        Ok(TransferStatus::Completed)
    }

    fn serialize_state(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("RsyncSshTransferManager state always serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_copy_batch_transfer_copies_all_files_and_reports_completed() {
        let src_dir = tempfile::tempdir().unwrap();
        let dst_dir = tempfile::tempdir().unwrap();
        let settings = TransferManagerDefaults::default();

        let src_path = src_dir.path().join("a.dat");
        tokio::fs::write(&src_path, b"contents").await.unwrap();
        let dst_path = dst_dir.path().join("nested/a.dat");

        let mut manager = LocalCopyTransferManager::new();
        let ok = manager
            .batch_transfer(&[(src_path, dst_path.clone())], &settings)
            .await
            .unwrap();

        assert!(ok);
        assert!(dst_path.exists());
        assert_eq!(
            manager.transfer_status(&settings).await.unwrap(),
            TransferStatus::Completed
        );
    }

    #[test]
    fn local_copy_manager_state_round_trips() {
        let manager = LocalCopyTransferManager { completed: true };
        let state = manager.serialize_state();
        let restored = LocalCopyTransferManager::from_state(state).unwrap();
        assert!(restored.completed);
    }
}

//! Filesystem-backed [`StoreManager`] implementations (spec §4.2, §9).
//!
//! Shaped after `nativelink-util`'s `StoreDriver` trait (the `async_trait`
//! object pattern reused here), adapted to the checksum-and-commit
//! contract a content-addressed store needs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use librarian_core::{LibrarianError, PathInfo, Result, StoreManager};
use md5::{Digest, Md5};
use tokio::io::AsyncReadExt;

/// A store backed by a local (or locally mounted, e.g. NFS) filesystem
/// root. This is the only [`StoreManager`] kind spec §9 asks this
/// expansion to carry; remote store kinds are a documented non-goal.
pub struct LocalStore {
    root: PathBuf,
    enabled: bool,
    available: bool,
    ingestable: bool,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            enabled: true,
            available: true,
            ingestable: true,
        }
    }

    pub fn with_flags(mut self, enabled: bool, available: bool, ingestable: bool) -> Self {
        self.enabled = enabled;
        self.available = available;
        self.ingestable = ingestable;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

const MD5_CHUNK_SIZE: usize = 64 * 1024;

async fn md5_and_size(path: &Path) -> Result<(String, u64)> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Md5::new();
    let mut size = 0u64;
    let mut buf = vec![0u8; MD5_CHUNK_SIZE];

    loop {
        let read = file.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
        size += read as u64;
    }

    Ok((hex::encode(hasher.finalize()), size))
}

#[async_trait]
impl StoreManager for LocalStore {
    async fn path_info(&self, staged_path: &Path) -> Result<PathInfo> {
        if !staged_path.exists() {
            return Err(LibrarianError::NotStaged(staged_path.display().to_string()));
        }

        let (md5, size) = md5_and_size(staged_path).await?;

        Ok(PathInfo {
            path: staged_path.to_path_buf(),
            md5,
            size,
        })
    }

    async fn commit(&self, staged_path: &Path, final_path: &Path) -> Result<()> {
        if final_path.exists() {
            return Err(LibrarianError::AlreadyPresent(
                final_path.display().to_string(),
            ));
        }

        if let Some(parent) = final_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::rename(staged_path, final_path).await?;
        Ok(())
    }

    async fn unstage(&self, staged_path: &Path) {
        if let Err(error) = tokio::fs::remove_file(staged_path).await {
            tracing::warn!(path = %staged_path.display(), %error, "failed to remove staged file");
        }
    }

    async fn free_space(&self) -> Result<u64> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || fs2::available_space(&root))
            .await
            .map_err(|e| LibrarianError::Store(e.to_string()))?
            .map_err(LibrarianError::Io)
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn available(&self) -> bool {
        self.available
    }

    fn ingestable(&self) -> bool {
        self.ingestable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn path_info_hashes_a_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("staged.bin");
        tokio::fs::write(&staged, b"hello librarian").await.unwrap();

        let store = LocalStore::new(dir.path());
        let info = store.path_info(&staged).await.unwrap();

        assert_eq!(info.size, 15);
        assert_eq!(info.md5, "8b61d638da9a35f66f93b51472e92698");
    }

    #[tokio::test]
    async fn path_info_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        let err = store
            .path_info(&dir.path().join("missing.bin"))
            .await
            .unwrap_err();

        assert!(matches!(err, LibrarianError::NotStaged(_)));
    }

    #[tokio::test]
    async fn commit_moves_staged_file_into_place_and_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("staged.bin");
        let final_path = dir.path().join("final/out.bin");
        tokio::fs::write(&staged, b"payload").await.unwrap();

        let store = LocalStore::new(dir.path());
        store.commit(&staged, &final_path).await.unwrap();

        assert!(!staged.exists());
        assert!(final_path.exists());

        tokio::fs::write(&staged, b"payload-again").await.unwrap();
        let err = store.commit(&staged, &final_path).await.unwrap_err();
        assert!(matches!(err, LibrarianError::AlreadyPresent(_)));
    }
}

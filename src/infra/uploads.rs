//! Filesystem-backed image storage.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use metrics::counter;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::info;
use url::Url;

use crate::application::repos::{FileStorage, RepoError};

#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error("public base url `{0}` must end with `/`")]
    BaseUrl(Url),
    #[error("failed to build download url: {0}")]
    Url(#[from] url::ParseError),
}

/// Result of storing an upload payload.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub stored_path: String,
    pub checksum: String,
    pub size_bytes: u64,
    pub url: Url,
}

/// Writes uploads below `root` and serves them from `public_base_url`.
#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
    public_base_url: Url,
}

impl UploadStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf, public_base_url: Url) -> Result<Self, UploadStorageError> {
        if !public_base_url.path().ends_with('/') {
            return Err(UploadStorageError::BaseUrl(public_base_url));
        }
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            public_base_url,
        })
    }

    /// Store `data` at `stored_path`, replacing any previous file.
    pub async fn store(
        &self,
        stored_path: &str,
        data: Bytes,
    ) -> Result<StoredUpload, UploadStorageError> {
        if data.is_empty() {
            return Err(UploadStorageError::EmptyPayload);
        }

        let absolute = self.resolve(stored_path)?;
        let url = self.public_base_url.join(stored_path)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        if let Err(err) = file.write_all(&data).await {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(err.into());
        }
        file.flush().await?;

        let checksum = hex::encode(Sha256::digest(&data));
        counter!("narrative_upload_total").increment(1);

        Ok(StoredUpload {
            stored_path: stored_path.to_string(),
            checksum,
            size_bytes: data.len() as u64,
            url,
        })
    }

    /// Attempt to read the stored payload into memory.
    pub async fn read(&self, stored_path: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_path);
        if stored_path.is_empty()
            || relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(UploadStorageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStorage for UploadStorage {
    async fn upload(&self, path: &str, bytes: Bytes) -> Result<Url, RepoError> {
        let stored = self
            .store(path, bytes)
            .await
            .map_err(RepoError::from_persistence)?;
        info!(
            target: "narrative::uploads",
            path = %stored.stored_path,
            size_bytes = stored.size_bytes,
            checksum = %stored.checksum,
            "Upload stored"
        );
        Ok(stored.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &tempfile::TempDir) -> UploadStorage {
        UploadStorage::new(
            dir.path().to_path_buf(),
            Url::parse("https://cdn.example/uploads/").expect("url"),
        )
        .expect("storage")
    }

    #[tokio::test]
    async fn store_writes_file_and_returns_public_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = storage(&dir);

        let stored = storage
            .store("post-images/market/1700000000000-stall.jpg", Bytes::from_static(b"abc"))
            .await
            .expect("stored");

        assert_eq!(
            stored.url.as_str(),
            "https://cdn.example/uploads/post-images/market/1700000000000-stall.jpg"
        );
        assert_eq!(
            stored.checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(stored.size_bytes, 3);
        assert_eq!(
            storage.read(&stored.stored_path).await.expect("read"),
            Bytes::from_static(b"abc")
        );
    }

    #[tokio::test]
    async fn rejects_escaping_paths_and_empty_payloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = storage(&dir);

        for path in ["../outside.jpg", "/etc/passwd", "a/../../b.jpg", ""] {
            assert!(matches!(
                storage.store(path, Bytes::from_static(b"x")).await,
                Err(UploadStorageError::InvalidPath)
            ));
        }
        assert!(matches!(
            storage.store("site/hero/empty.png", Bytes::new()).await,
            Err(UploadStorageError::EmptyPayload)
        ));
    }

    #[test]
    fn base_url_must_be_a_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = UploadStorage::new(
            dir.path().to_path_buf(),
            Url::parse("https://cdn.example/uploads").expect("url"),
        )
        .unwrap_err();
        assert!(matches!(err, UploadStorageError::BaseUrl(_)));
    }
}

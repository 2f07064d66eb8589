//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::domain::entities::{PostDocument, PostRecord, SiteSettingsPatch, SiteSettingsRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("malformed document: {message}")]
    Malformed { message: String },
    #[error("resource not found")]
    NotFound,
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// Read side of the story collection.
#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Every record with `published = true`.
    async fn fetch_published(&self) -> Result<Vec<PostRecord>, RepoError>;

    /// Published record with exactly this slug.
    async fn fetch_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError>;

    /// Every record including drafts, for the admin list.
    async fn fetch_all(&self) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, document: PostDocument) -> Result<Uuid, RepoError>;

    async fn update_post(&self, id: Uuid, document: PostDocument) -> Result<(), RepoError>;

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn load_site_settings(&self) -> Result<Option<SiteSettingsRecord>, RepoError>;

    /// Merge the provided fields into the stored settings document.
    async fn merge_site_settings(&self, patch: SiteSettingsPatch) -> Result<(), RepoError>;
}

/// Object storage for uploaded images.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `bytes` at `path` and return the public download URL.
    async fn upload(&self, path: &str, bytes: Bytes) -> Result<Url, RepoError>;
}

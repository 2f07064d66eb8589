//! Admin write flows. Every operation takes an [`AdminSession`](crate::application::auth::AdminSession).

pub mod posts;
pub mod settings;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::RepoError;

/// Failure of an admin create/update/delete, shown to the admin verbatim.
///
/// Backend failures carry the operation that hit them.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("story `{0}` not found")]
    NotFound(Uuid),
    #[error("Failed to upload image: {0}")]
    Upload(String),
    #[error("Error loading post for editing: {0}")]
    Load(#[source] RepoError),
    #[error("Error saving post: {0}")]
    Save(#[source] RepoError),
    #[error("Error deleting post: {0}")]
    Delete(#[source] RepoError),
    #[error("Failed to save settings: {0}")]
    Settings(#[source] RepoError),
}

pub(crate) fn ensure_non_empty(value: &str, message: &'static str) -> Result<(), WriteError> {
    if value.trim().is_empty() {
        return Err(WriteError::Validation(message));
    }
    Ok(())
}

pub(crate) fn unix_millis() -> i128 {
    time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{admin::WriteError, auth::LoginError, collection::FetchError, repos::RepoError},
    domain::error::DomainError,
    infra::error::InfraError,
};

/// Flattened error chain used when reporting a failure to the operator.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error(transparent)]
    Login(#[from] LoginError),
    #[error("resource not found")]
    NotFound,
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Message safe to show to the person at the terminal.
    pub fn presentation_message(&self) -> String {
        match self {
            AppError::Write(WriteError::NotFound(_)) | AppError::NotFound => {
                "Story not found".to_string()
            }
            AppError::Domain(err) => err.to_string(),
            AppError::Write(err) => err.to_string(),
            AppError::Login(err) => err.to_string(),
            AppError::Repo(_) | AppError::Fetch(_) => "Error loading posts.".to_string(),
            AppError::Infra(InfraError::Configuration(_)) => "Service misconfigured".to_string(),
            AppError::Infra(InfraError::Telemetry(_)) => {
                "Logging subsystem could not start".to_string()
            }
            AppError::Infra(InfraError::CorruptStore { .. }) => {
                "Story store unavailable".to_string()
            }
            AppError::Infra(err @ InfraError::Read { .. }) => err.to_string(),
            AppError::Unexpected(_) => "Unexpected error occurred".to_string(),
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}

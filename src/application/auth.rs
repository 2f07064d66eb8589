//! Admin sign-in.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

/// Proof that an admin signed in; required by every write flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub email: String,
    pub authenticated_at: OffsetDateTime,
}

impl AdminSession {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            authenticated_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Failures reported by the credential backend.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("wrong password")]
    WrongPassword,
    #[error("user not found")]
    UserNotFound,
    #[error("invalid email")]
    InvalidEmail,
    #[error("invalid credential")]
    InvalidCredential,
    #[error("authentication backend failed: {0}")]
    Backend(String),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn verify(&self, email: &str, password: &str) -> Result<AdminSession, AuthError>;
}

/// Login outcome with the message shown next to the form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("Please enter both email and password.")]
    MissingCredentials,
    #[error("{}", message_for(.0))]
    Rejected(AuthError),
}

fn message_for(error: &AuthError) -> &'static str {
    match error {
        AuthError::WrongPassword => "Incorrect password.",
        AuthError::UserNotFound => "No user found with this email.",
        AuthError::InvalidEmail => "Invalid email address.",
        AuthError::InvalidCredential => "Invalid credentials.",
        AuthError::Backend(_) => "Login failed. Please try again.",
    }
}

#[derive(Clone)]
pub struct AuthService {
    authenticator: Arc<dyn Authenticator>,
}

impl AuthService {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AdminSession, LoginError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(LoginError::MissingCredentials);
        }

        match self.authenticator.verify(email, password).await {
            Ok(session) => {
                info!(target: "narrative::auth", email = %session.email, "Admin signed in");
                Ok(session)
            }
            Err(err) => {
                warn!(target: "narrative::auth", email, error = %err, "Admin sign-in rejected");
                Err(LoginError::Rejected(err))
            }
        }
    }
}

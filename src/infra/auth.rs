//! Single configured admin account.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::application::auth::{AdminSession, AuthError, Authenticator};

use super::error::InfraError;

const DIGEST_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct StaticAuthenticator {
    email: String,
    password_sha256: Vec<u8>,
}

impl StaticAuthenticator {
    /// `password_sha256` is the hex encoded SHA-256 of the admin password.
    pub fn new(email: impl Into<String>, password_sha256: &str) -> Result<Self, InfraError> {
        let email = email.into().trim().to_string();
        if email.is_empty() {
            return Err(InfraError::configuration("admin email must not be empty"));
        }
        let password_sha256 = hex::decode(password_sha256.trim()).map_err(|err| {
            InfraError::configuration(format!("admin password hash is not hex: {err}"))
        })?;
        if password_sha256.len() != DIGEST_LEN {
            return Err(InfraError::configuration(format!(
                "admin password hash must be {DIGEST_LEN} bytes, got {}",
                password_sha256.len()
            )));
        }
        Ok(Self {
            email,
            password_sha256,
        })
    }

    fn hash_password(password: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hasher.finalize().to_vec()
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn verify(&self, email: &str, password: &str) -> Result<AdminSession, AuthError> {
        let email = email.trim();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(user, host)| !user.is_empty() && !host.is_empty());
        if !well_formed {
            return Err(AuthError::InvalidEmail);
        }
        if !email.eq_ignore_ascii_case(&self.email) {
            return Err(AuthError::UserNotFound);
        }

        let hashed_input = Self::hash_password(password);
        if self.password_sha256.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(AuthError::WrongPassword);
        }

        Ok(AdminSession::new(self.email.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha256("secret")
    const SECRET_HASH: &str = "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b";

    fn authenticator() -> StaticAuthenticator {
        StaticAuthenticator::new("carla@example.com", SECRET_HASH).expect("valid")
    }

    #[tokio::test]
    async fn accepts_matching_credentials_case_insensitively() {
        let session = authenticator()
            .verify("Carla@Example.com", "secret")
            .await
            .expect("session");
        assert_eq!(session.email, "carla@example.com");
    }

    #[tokio::test]
    async fn distinguishes_rejection_reasons() {
        let auth = authenticator();
        assert_eq!(
            auth.verify("carla@example.com", "Secret").await,
            Err(AuthError::WrongPassword)
        );
        assert_eq!(
            auth.verify("bob@example.com", "secret").await,
            Err(AuthError::UserNotFound)
        );
        assert_eq!(
            auth.verify("carla", "secret").await,
            Err(AuthError::InvalidEmail)
        );
    }

    #[test]
    fn rejects_malformed_hashes() {
        assert!(StaticAuthenticator::new("carla@example.com", "zz").is_err());
        assert!(StaticAuthenticator::new("carla@example.com", "abcd").is_err());
        assert!(StaticAuthenticator::new(" ", SECRET_HASH).is_err());
    }
}

//! Login, registration and logout.
//!
//! Login looks the user up by name, checks the password with an injected
//! [`PasswordVerifier`] and stores a session token. Registration posts the
//! full payload; field errors from the backend come back in the same shape
//! as local validation errors.

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use shared::{domain::RegistrationPayload, error::FieldErrors};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;
use wizard::{
    raw,
    steps::{login_schema, registration_payload, wizard_field_name},
    AccumulatedRecord, FinalSubmit, SubmitError,
};

use crate::{
    backend::{BackendError, UserDirectory},
    session::{Route, SessionStore},
};

pub trait PasswordVerifier: Send + Sync {
    fn verify(&self, plain: &str, hash: &str) -> bool;
}

/// Compares against a lowercase or uppercase hex SHA-256 digest.
pub struct Sha256PasswordVerifier;

impl PasswordVerifier for Sha256PasswordVerifier {
    fn verify(&self, plain: &str, hash: &str) -> bool {
        sha256_hex(plain).eq_ignore_ascii_case(hash.trim())
    }
}

pub fn sha256_hex(plain: &str) -> String {
    Sha256::digest(plain.as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("invalid login form: {0}")]
    Validation(FieldErrors),
    #[error("Username not found")]
    UnknownUser,
    #[error("Incorrect password")]
    IncorrectPassword,
    #[error("login request failed: {0}")]
    Backend(#[source] BackendError),
    #[error("failed to persist session: {0}")]
    Session(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("registration rejected: {0}")]
    Rejected(FieldErrors),
    #[error("registration failed: {0}")]
    Backend(#[source] BackendError),
    #[error("failed to persist session: {0}")]
    Session(#[source] anyhow::Error),
}

pub struct AuthFlow {
    users: Arc<dyn UserDirectory>,
    sessions: Arc<dyn SessionStore>,
    verifier: Arc<dyn PasswordVerifier>,
}

impl AuthFlow {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionStore>,
        verifier: Arc<dyn PasswordVerifier>,
    ) -> Self {
        Self {
            users,
            sessions,
            verifier,
        }
    }

    /// Returns the route to continue to.
    pub async fn login(&self, username: &str, password: &str) -> Result<Route, LoginError> {
        let input = raw([("username", username), ("password", password)]);
        wizard::validate(&login_schema(), &input, wizard::today())
            .map_err(LoginError::Validation)?;

        let candidates = self
            .users
            .find_users(username)
            .await
            .map_err(LoginError::Backend)?;
        let user = candidates
            .into_iter()
            .find(|user| user.username == username)
            .ok_or(LoginError::UnknownUser)?;

        if !self.verifier.verify(password, &user.password_hash) {
            info!(%username, "auth: password mismatch");
            return Err(LoginError::IncorrectPassword);
        }

        let token = match user.token.filter(|token| !token.is_empty()) {
            Some(token) => token,
            None => {
                warn!(%username, "auth: backend issued no token, using a local session id");
                Uuid::new_v4().to_string()
            }
        };
        self.sessions
            .set(&token)
            .await
            .map_err(LoginError::Session)?;
        info!(%username, "auth: logged in");
        Ok(Route::Category)
    }

    /// Returns the route to continue to.
    pub async fn register(&self, payload: &RegistrationPayload) -> Result<Route, RegisterError> {
        let response = match self.users.register_user(payload).await {
            Ok(response) => response,
            Err(err) => {
                if let Some(errors) = err.payload().and_then(|p| p.field_errors()) {
                    warn!(
                        username = %payload.username,
                        invalid_fields = errors.len(),
                        "auth: registration rejected"
                    );
                    return Err(RegisterError::Rejected(errors));
                }
                warn!(username = %payload.username, error = %err, "auth: registration failed");
                return Err(RegisterError::Backend(err));
            }
        };

        self.sessions
            .set(&response.token)
            .await
            .map_err(RegisterError::Session)?;
        info!(username = %payload.username, "auth: registered");
        Ok(Route::Login)
    }

    pub async fn logout(&self) -> anyhow::Result<()> {
        self.sessions.clear().await?;
        info!("auth: logged out");
        Ok(())
    }
}

/// Final step of the registration wizard: posts the accumulated record.
pub struct RegistrationSubmit {
    auth: Arc<AuthFlow>,
}

impl RegistrationSubmit {
    pub fn new(auth: Arc<AuthFlow>) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl FinalSubmit for RegistrationSubmit {
    async fn submit(&self, record: &AccumulatedRecord) -> Result<(), SubmitError> {
        let payload = registration_payload(record);
        match self.auth.register(&payload).await {
            Ok(_) => Ok(()),
            Err(RegisterError::Rejected(errors)) => Err(SubmitError::Rejected(
                errors
                    .iter()
                    .map(|(field, message)| {
                        (wizard_field_name(field).to_string(), message.to_string())
                    })
                    .collect(),
            )),
            Err(err) => Err(SubmitError::Failed(err.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;

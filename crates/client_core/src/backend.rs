//! REST backend seams and their reqwest implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{CategoryDraft, CategoryId, CategoryRecord, RegistrationPayload, UserRecord},
    error::ErrorPayload,
    protocol::{RegisterResponse, UserLookupQuery},
};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("invalid backend url '{0}'")]
    InvalidUrl(String),
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("backend returned {status}: {message}")]
    Status {
        status: u16,
        message: String,
        payload: Option<ErrorPayload>,
    },
    #[error("malformed backend response: {0}")]
    Malformed(String),
    #[error("backend did not answer within {0:?}")]
    TimedOut(Duration),
}

impl BackendError {
    pub fn payload(&self) -> Option<&ErrorPayload> {
        match self {
            Self::Status { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }
}

#[async_trait]
pub trait CategoryBackend: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, BackendError>;
    async fn create_category(&self, draft: &CategoryDraft) -> Result<CategoryRecord, BackendError>;
    async fn update_category(&self, record: &CategoryRecord)
        -> Result<CategoryRecord, BackendError>;
    async fn delete_category(&self, id: CategoryId) -> Result<(), BackendError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Users whose name matches `username`. Backends that ignore the filter
    /// may return more; callers still check for an exact match.
    async fn find_users(&self, username: &str) -> Result<Vec<UserRecord>, BackendError>;
    async fn register_user(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<RegisterResponse, BackendError>;
}

pub struct HttpBackend {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let parsed =
            Url::parse(base_url).map_err(|_| BackendError::InvalidUrl(base_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BackendError::InvalidUrl(base_url.to_string()));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(|e| self.request_error(e))?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "backend: response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let payload = serde_json::from_slice::<ErrorPayload>(&body).ok();
        let fallback = status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
        let message = match &payload {
            Some(payload) => payload.message_or(&fallback),
            None => fallback,
        };
        Err(BackendError::Status {
            status: status.as_u16(),
            message,
            payload,
        })
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, BackendError> {
        let body = response.bytes().await.map_err(|e| self.request_error(e))?;
        serde_json::from_slice(&body).map_err(|e| BackendError::Malformed(e.to_string()))
    }

    fn request_error(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::TimedOut(self.timeout)
        } else if err.is_decode() {
            BackendError::Malformed(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl CategoryBackend for HttpBackend {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, BackendError> {
        let response = self.send(self.http.get(self.url("/categories"))).await?;
        self.decode(response).await
    }

    async fn create_category(&self, draft: &CategoryDraft) -> Result<CategoryRecord, BackendError> {
        let response = self
            .send(self.http.post(self.url("/categories")).json(draft))
            .await?;
        self.decode(response).await
    }

    async fn update_category(
        &self,
        record: &CategoryRecord,
    ) -> Result<CategoryRecord, BackendError> {
        let response = self
            .send(
                self.http
                    .put(self.url(&format!("/categories/{}", record.id)))
                    .json(record),
            )
            .await?;
        // Some backends acknowledge an update without echoing the record.
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(record.clone());
        }
        let body = response.bytes().await.map_err(|e| self.request_error(e))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(record.clone());
        }
        serde_json::from_slice(&body).map_err(|e| BackendError::Malformed(e.to_string()))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), BackendError> {
        self.send(self.http.delete(self.url(&format!("/categories/{id}"))))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for HttpBackend {
    async fn find_users(&self, username: &str) -> Result<Vec<UserRecord>, BackendError> {
        let response = self
            .send(self.http.get(self.url("/users")).query(&UserLookupQuery {
                username: username.to_string(),
            }))
            .await?;
        self.decode(response).await
    }

    async fn register_user(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<RegisterResponse, BackendError> {
        let response = self
            .send(self.http.post(self.url("/users")).json(payload))
            .await?;
        self.decode(response).await
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;

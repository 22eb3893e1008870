//! Session token persistence and the route guard built on it.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use storage::Storage;
use tokio::sync::RwLock;
use tracing::warn;

/// Key the session token is stored under.
pub const AUTH_TOKEN_KEY: &str = "authToken";

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self) -> Result<Option<String>>;
    async fn set(&self, token: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self) -> Result<Option<String>> {
        Ok(self.token.read().await.clone())
    }

    async fn set(&self, token: &str) -> Result<()> {
        *self.token.write().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.token.write().await = None;
        Ok(())
    }
}

/// Keeps the token in the SQLite key/value store so it survives restarts.
pub struct StorageSessionStore {
    storage: Storage,
}

impl StorageSessionStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl SessionStore for StorageSessionStore {
    async fn get(&self) -> Result<Option<String>> {
        self.storage.get_value(AUTH_TOKEN_KEY).await
    }

    async fn set(&self, token: &str) -> Result<()> {
        self.storage.set_value(AUTH_TOKEN_KEY, token).await
    }

    async fn clear(&self) -> Result<()> {
        self.storage.delete_value(AUTH_TOKEN_KEY).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Category,
}

impl Route {
    pub fn requires_session(self) -> bool {
        matches!(self, Self::Category)
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Category => "/category",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectToLogin,
}

pub struct RouteGuard {
    sessions: Arc<dyn SessionStore>,
}

impl RouteGuard {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    /// A non-empty token means authenticated. An unreadable store does not.
    pub async fn is_authenticated(&self) -> bool {
        match self.sessions.get().await {
            Ok(token) => token.is_some_and(|token| !token.is_empty()),
            Err(error) => {
                warn!(%error, "session: token store unreadable, treating as signed out");
                false
            }
        }
    }

    pub async fn decide(&self, route: Route) -> RouteDecision {
        if !route.requires_session() || self.is_authenticated().await {
            RouteDecision::Allow
        } else {
            RouteDecision::RedirectToLogin
        }
    }
}

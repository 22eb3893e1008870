//! Local mirror of the backend's category collection.
//!
//! The cache only ever changes after the backend confirms an operation. A
//! failed or timed out call leaves it exactly as it was. The lock is never
//! held across a backend call, so two commits may be in flight at once; the
//! one confirmed last is applied last.

use std::{collections::HashSet, future::Future, sync::Arc, time::Duration};

use shared::domain::{CategoryDraft, CategoryId, CategoryRecord};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::backend::{BackendError, CategoryBackend};

#[derive(Debug, Error)]
#[error("Failed to fetch categories: {0}")]
pub struct FetchError(#[from] pub BackendError);

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("Failed to add category: {0}")]
    Add(#[source] BackendError),
    #[error("Failed to update category {id}: {source}")]
    Update {
        id: CategoryId,
        source: BackendError,
    },
    #[error("Failed to delete category {id}: {source}")]
    Delete {
        id: CategoryId,
        source: BackendError,
    },
}

impl MutationError {
    pub fn backend(&self) -> &BackendError {
        match self {
            Self::Add(source) => source,
            Self::Update { source, .. } | Self::Delete { source, .. } => source,
        }
    }
}

pub struct ListController {
    backend: Arc<dyn CategoryBackend>,
    cache: RwLock<Vec<CategoryRecord>>,
    request_timeout: Duration,
}

impl ListController {
    pub fn new(backend: Arc<dyn CategoryBackend>, request_timeout: Duration) -> Self {
        Self {
            backend,
            cache: RwLock::new(Vec::new()),
            request_timeout,
        }
    }

    pub async fn snapshot(&self) -> Vec<CategoryRecord> {
        self.cache.read().await.clone()
    }

    pub async fn get(&self, id: CategoryId) -> Option<CategoryRecord> {
        self.cache
            .read()
            .await
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }

    /// Replaces the cache with the backend's current list.
    pub async fn load(&self) -> Result<Vec<CategoryRecord>, FetchError> {
        let fetched = self.bounded(self.backend.list_categories()).await?;

        let mut seen = HashSet::with_capacity(fetched.len());
        let mut records: Vec<CategoryRecord> = Vec::with_capacity(fetched.len());
        for record in fetched {
            if !seen.insert(record.id) {
                warn!(category_id = record.id.0, "categories: duplicate id in list, keeping first");
                continue;
            }
            records.push(record);
        }

        info!(count = records.len(), "categories: loaded");
        *self.cache.write().await = records.clone();
        Ok(records)
    }

    pub async fn request_add(&self, draft: CategoryDraft) -> Result<CategoryRecord, MutationError> {
        let created = self
            .bounded(self.backend.create_category(&draft))
            .await
            .map_err(MutationError::Add)?;
        if !created.id.is_assigned() {
            return Err(MutationError::Add(BackendError::Malformed(
                "created category has no id".to_string(),
            )));
        }

        let mut cache = self.cache.write().await;
        match cache.iter_mut().find(|record| record.id == created.id) {
            Some(existing) => {
                warn!(category_id = created.id.0, "categories: created id already cached, replacing");
                *existing = created.clone();
            }
            None => cache.push(created.clone()),
        }
        info!(category_id = created.id.0, "categories: add confirmed");
        Ok(created)
    }

    pub async fn request_edit(
        &self,
        id: CategoryId,
        values: CategoryDraft,
    ) -> Result<CategoryRecord, MutationError> {
        let outgoing = CategoryRecord::from_draft(id, values);
        let updated = self
            .bounded(self.backend.update_category(&outgoing))
            .await
            .map_err(|source| MutationError::Update { id, source })?;
        if updated.id != id {
            return Err(MutationError::Update {
                id,
                source: BackendError::Malformed(format!(
                    "update of category {id} answered with category {}",
                    updated.id
                )),
            });
        }

        let mut cache = self.cache.write().await;
        match cache.iter_mut().find(|record| record.id == id) {
            Some(existing) => *existing = updated.clone(),
            None => warn!(
                category_id = id.0,
                "categories: update confirmed for an entry no longer cached"
            ),
        }
        info!(category_id = id.0, "categories: update confirmed");
        Ok(updated)
    }

    pub async fn request_delete(&self, id: CategoryId) -> Result<(), MutationError> {
        self.bounded(self.backend.delete_category(id))
            .await
            .map_err(|source| MutationError::Delete { id, source })?;

        self.cache.write().await.retain(|record| record.id != id);
        info!(category_id = id.0, "categories: delete confirmed");
        Ok(())
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.request_timeout, "categories: backend call timed out");
                Err(BackendError::TimedOut(self.request_timeout))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/list_controller_tests.rs"]
mod tests;

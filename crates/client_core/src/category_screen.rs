//! The category page: list cache, dialog state, loading flag and the
//! page-level error message, wired together.

use shared::domain::{CategoryId, CategoryRecord};
use thiserror::Error;
use tracing::debug;

use crate::{
    dialog::{DialogKind, DialogState},
    list_controller::{FetchError, ListController, MutationError},
};

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("no add/edit dialog is open")]
    NoFormOpen,
    #[error("no delete confirmation is open")]
    NoDeleteConfirmation,
    #[error(transparent)]
    Mutation(#[from] MutationError),
}

pub struct CategoryScreen {
    list: ListController,
    dialog: DialogState,
    loading: bool,
    error: Option<String>,
}

impl CategoryScreen {
    pub fn new(list: ListController) -> Self {
        Self {
            list,
            dialog: DialogState::new(),
            loading: true,
            error: None,
        }
    }

    pub fn list(&self) -> &ListController {
        &self.list
    }

    pub fn dialog(&self) -> &DialogState {
        &self.dialog
    }

    pub fn dialog_mut(&mut self) -> &mut DialogState {
        &mut self.dialog
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn mount(&mut self) -> Result<Vec<CategoryRecord>, FetchError> {
        self.loading = true;
        let result = self.list.load().await;
        self.loading = false;
        match result {
            Ok(records) => {
                self.error = None;
                Ok(records)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Sends the staged draft: an add when the form has no target, an edit
    /// otherwise. The dialog closes only once the backend confirms.
    pub async fn commit_dialog(&mut self) -> Result<CategoryRecord, ScreenError> {
        let DialogKind::AddOrEdit { target } = self.dialog.kind() else {
            return Err(ScreenError::NoFormOpen);
        };
        let draft = self.dialog.draft().to_draft();
        let result = match target {
            Some(target) => self.list.request_edit(target.id, draft).await,
            None => self.list.request_add(draft).await,
        };
        self.settle(result)
    }

    pub async fn confirm_delete(&mut self) -> Result<CategoryId, ScreenError> {
        let Some(target) = self.dialog.delete_target() else {
            return Err(ScreenError::NoDeleteConfirmation);
        };
        let id = target.id;
        let result = self.list.request_delete(id).await.map(|()| id);
        self.settle(result)
    }

    pub fn cancel(&mut self) {
        self.dialog.close();
    }

    fn settle<T>(&mut self, result: Result<T, MutationError>) -> Result<T, ScreenError> {
        match result {
            Ok(value) => {
                self.dialog.close();
                self.error = None;
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "categories: dialog kept open after failure");
                self.error = Some(err.to_string());
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/category_screen_tests.rs"]
mod tests;

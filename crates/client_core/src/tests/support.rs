//! In-process fakes shared by the unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use shared::{
    domain::{CategoryDraft, CategoryId, CategoryRecord, RegistrationPayload, UserRecord},
    protocol::RegisterResponse,
};
use tokio::sync::Notify;

use crate::backend::{BackendError, CategoryBackend, UserDirectory};

pub fn category(id: i64, name: &str) -> CategoryRecord {
    CategoryRecord {
        id: CategoryId(id),
        name: name.to_string(),
        description: format!("{name} description"),
    }
}

pub fn server_down() -> BackendError {
    BackendError::Status {
        status: 500,
        message: "Internal Server Error".to_string(),
        payload: None,
    }
}

/// Backend holding its own copy of the collection. Set `fail_with` to make
/// every call fail.
pub struct FakeCategoryBackend {
    records: Mutex<Vec<CategoryRecord>>,
    next_id: Mutex<i64>,
    fail_with: Mutex<Option<BackendError>>,
    calls: Mutex<Vec<String>>,
}

impl FakeCategoryBackend {
    pub fn with_records(records: Vec<CategoryRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id.0).max().unwrap_or(0) + 1;
        Self {
            records: Mutex::new(records),
            next_id: Mutex::new(next_id),
            fail_with: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_with(&self, err: BackendError) {
        *self.fail_with.lock().expect("lock") = Some(err);
    }

    pub fn recover(&self) {
        *self.fail_with.lock().expect("lock") = None;
    }

    pub fn server_records(&self) -> Vec<CategoryRecord> {
        self.records.lock().expect("lock").clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }

    fn enter(&self, call: String) -> Result<(), BackendError> {
        self.calls.lock().expect("lock").push(call);
        match self.fail_with.lock().expect("lock").clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CategoryBackend for FakeCategoryBackend {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, BackendError> {
        self.enter("list".to_string())?;
        Ok(self.server_records())
    }

    async fn create_category(&self, draft: &CategoryDraft) -> Result<CategoryRecord, BackendError> {
        self.enter(format!("create {}", draft.name))?;
        let mut next_id = self.next_id.lock().expect("lock");
        let record = CategoryRecord::from_draft(CategoryId(*next_id), draft.clone());
        *next_id += 1;
        self.records.lock().expect("lock").push(record.clone());
        Ok(record)
    }

    async fn update_category(
        &self,
        record: &CategoryRecord,
    ) -> Result<CategoryRecord, BackendError> {
        self.enter(format!("update {}", record.id))?;
        let mut records = self.records.lock().expect("lock");
        let Some(existing) = records.iter_mut().find(|r| r.id == record.id) else {
            return Err(BackendError::Status {
                status: 404,
                message: "Not Found".to_string(),
                payload: None,
            });
        };
        *existing = record.clone();
        Ok(record.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), BackendError> {
        self.enter(format!("delete {id}"))?;
        self.records.lock().expect("lock").retain(|r| r.id != id);
        Ok(())
    }
}

/// Update and delete calls park until the test releases them, so the order
/// in which their confirmations arrive can be chosen.
pub struct GatedCategoryBackend {
    inner: FakeCategoryBackend,
    update_gate: Notify,
    delete_gate: Notify,
}

impl GatedCategoryBackend {
    pub fn with_records(records: Vec<CategoryRecord>) -> Self {
        Self {
            inner: FakeCategoryBackend::with_records(records),
            update_gate: Notify::new(),
            delete_gate: Notify::new(),
        }
    }

    pub fn release_update(&self) {
        self.update_gate.notify_one();
    }

    pub fn release_delete(&self) {
        self.delete_gate.notify_one();
    }
}

#[async_trait]
impl CategoryBackend for GatedCategoryBackend {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, BackendError> {
        self.inner.list_categories().await
    }

    async fn create_category(&self, draft: &CategoryDraft) -> Result<CategoryRecord, BackendError> {
        self.inner.create_category(draft).await
    }

    async fn update_category(
        &self,
        record: &CategoryRecord,
    ) -> Result<CategoryRecord, BackendError> {
        self.update_gate.notified().await;
        // The server accepted the update before the delete removed the row.
        Ok(record.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), BackendError> {
        self.delete_gate.notified().await;
        self.inner.delete_category(id).await
    }
}

/// Backend that never answers.
pub struct HangingBackend;

#[async_trait]
impl CategoryBackend for HangingBackend {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, BackendError> {
        std::future::pending().await
    }

    async fn create_category(&self, _draft: &CategoryDraft) -> Result<CategoryRecord, BackendError> {
        std::future::pending().await
    }

    async fn update_category(
        &self,
        _record: &CategoryRecord,
    ) -> Result<CategoryRecord, BackendError> {
        std::future::pending().await
    }

    async fn delete_category(&self, _id: CategoryId) -> Result<(), BackendError> {
        std::future::pending().await
    }
}

pub struct FakeUserDirectory {
    pub users: Vec<UserRecord>,
    pub register_result: Mutex<Option<Result<RegisterResponse, BackendError>>>,
    pub registered: Mutex<Vec<RegistrationPayload>>,
    pub lookups: Mutex<Vec<String>>,
}

impl FakeUserDirectory {
    pub fn with_users(users: Vec<UserRecord>) -> Self {
        Self {
            users,
            register_result: Mutex::new(None),
            registered: Mutex::new(Vec::new()),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn answer_register_with(&self, result: Result<RegisterResponse, BackendError>) {
        *self.register_result.lock().expect("lock") = Some(result);
    }
}

#[async_trait]
impl UserDirectory for FakeUserDirectory {
    async fn find_users(&self, username: &str) -> Result<Vec<UserRecord>, BackendError> {
        self.lookups.lock().expect("lock").push(username.to_string());
        // Mimics a backend that ignores the filter and returns everyone.
        Ok(self.users.clone())
    }

    async fn register_user(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<RegisterResponse, BackendError> {
        self.registered.lock().expect("lock").push(payload.clone());
        self.register_result
            .lock()
            .expect("lock")
            .clone()
            .unwrap_or_else(|| {
                Ok(RegisterResponse {
                    token: "issued-token".to_string(),
                    extra: Default::default(),
                })
            })
    }
}

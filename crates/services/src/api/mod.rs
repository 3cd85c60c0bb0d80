//! The portal REST surface as a trait, with a reqwest implementation.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::SecretString;

use portal_core::model::{
    Credentials, Department, DepartmentId, Module, ModuleDraft, ModuleId, ProgressSnapshot,
    Training, TrainingId, UserAccount, UserDraft, UserId, UserTrainingReport,
};

use crate::error::ApiError;

mod dto;
mod http;

pub use http::HttpPortalApi;

/// Training fields as written to the server, department already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingWrite {
    pub code: String,
    pub name: String,
    pub owner: String,
    pub last_updated: Option<NaiveDate>,
    pub department_id: DepartmentId,
}

/// Every backend call the client makes.
///
/// Lists accept either a bare array or a paginated `results` envelope.
#[async_trait]
pub trait PortalApi: Send + Sync {
    // Collaborator surface.
    async fn fetch_catalog(&self) -> Result<Vec<Department>, ApiError>;
    async fn fetch_my_progress(&self) -> Result<ProgressSnapshot, ApiError>;
    async fn start_training(&self, training_id: TrainingId) -> Result<(), ApiError>;
    async fn complete_module(&self, module_id: ModuleId, completed: bool) -> Result<(), ApiError>;
    /// Legacy email-only registration; the login flow no longer calls it.
    async fn login_email(&self, email: &str, name: Option<&str>) -> Result<(), ApiError>;

    /// Exchange credentials for an access token.
    async fn obtain_token(&self, credentials: &Credentials) -> Result<SecretString, ApiError>;

    // Admin surface.
    async fn list_departments(&self) -> Result<Vec<Department>, ApiError>;
    async fn create_department(&self, name: &str) -> Result<Department, ApiError>;
    async fn update_department(&self, id: DepartmentId, name: &str)
    -> Result<Department, ApiError>;
    async fn delete_department(&self, id: DepartmentId) -> Result<(), ApiError>;

    async fn list_trainings(&self) -> Result<Vec<Training>, ApiError>;
    async fn create_training(&self, training: &TrainingWrite) -> Result<Training, ApiError>;
    async fn update_training(
        &self,
        id: TrainingId,
        training: &TrainingWrite,
    ) -> Result<Training, ApiError>;
    async fn delete_training(&self, id: TrainingId) -> Result<(), ApiError>;

    async fn list_modules(&self) -> Result<Vec<Module>, ApiError>;
    async fn create_module(
        &self,
        training_id: TrainingId,
        module: &ModuleDraft,
    ) -> Result<Module, ApiError>;
    async fn update_module(
        &self,
        id: ModuleId,
        training_id: TrainingId,
        module: &ModuleDraft,
    ) -> Result<Module, ApiError>;
    async fn delete_module(&self, id: ModuleId) -> Result<(), ApiError>;

    async fn list_users(&self) -> Result<Vec<UserAccount>, ApiError>;
    /// A `None` password lets the server apply its default.
    async fn create_user(
        &self,
        user: &UserDraft,
        password: Option<&SecretString>,
    ) -> Result<UserAccount, ApiError>;
    /// A `None` password leaves the current one untouched.
    async fn update_user(
        &self,
        id: UserId,
        user: &UserDraft,
        password: Option<&SecretString>,
    ) -> Result<UserAccount, ApiError>;
    async fn delete_user(&self, id: UserId) -> Result<(), ApiError>;
    async fn reset_password(&self, id: UserId) -> Result<(), ApiError>;
    async fn user_trainings(&self, id: UserId) -> Result<Vec<UserTrainingReport>, ApiError>;
}

/// Shared slot for the token attached to outgoing requests.
#[derive(Clone, Default)]
pub struct BearerToken {
    inner: Arc<RwLock<Option<SecretString>>>,
}

impl BearerToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: Option<SecretString>) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = token;
    }

    #[must_use]
    pub fn current(&self) -> Option<SecretString> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("set", &self.is_set())
            .finish()
    }
}

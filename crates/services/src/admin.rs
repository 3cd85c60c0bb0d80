use std::sync::Arc;

use secrecy::SecretString;
use tracing::{info, warn};

use portal_core::model::{
    Department, DepartmentId, DepartmentRef, Module, ModuleDraft, ModuleId, Training,
    TrainingDraft, TrainingId, UserAccount, UserDraft, UserId, UserTrainingReport,
    ValidationError,
};
use portal_core::screen::Editing;
use portal_core::table::TrainingRow;

use crate::api::{PortalApi, TrainingWrite};
use crate::error::{AdminServiceError, ApiError};

pub const DATA_LOAD_FAILED: &str = "Falha ao carregar dados. Verifique o login.";
pub const USERS_LOAD_FAILED: &str = "Falha ao carregar usuarios.";
/// Password the server assigns on creation without one, and on reset.
pub const DEFAULT_PASSWORD: &str = "Mudar123";

/// Everything the trainings admin screen shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminCatalog {
    pub departments: Vec<Department>,
    pub trainings: Vec<Training>,
    pub modules: Vec<Module>,
}

impl AdminCatalog {
    /// Trainings joined with their department names, ready for the table.
    #[must_use]
    pub fn training_rows(&self) -> Vec<TrainingRow> {
        TrainingRow::join(self.trainings.clone(), &self.departments)
    }

    /// Modules of one training, in server order.
    #[must_use]
    pub fn modules_of(&self, training_id: TrainingId) -> Vec<&Module> {
        self.modules
            .iter()
            .filter(|module| module.training_id() == training_id)
            .collect()
    }

    /// Case-insensitive lookup, ignoring surrounding blanks.
    #[must_use]
    pub fn department_by_name(&self, name: &str) -> Option<&Department> {
        find_department_by_name(&self.departments, name)
    }
}

fn find_department_by_name<'a>(departments: &'a [Department], name: &str) -> Option<&'a Department> {
    let wanted = name.trim().to_lowercase();
    departments
        .iter()
        .find(|dep| dep.name().trim().to_lowercase() == wanted)
}

fn load_error(message: &'static str) -> impl FnOnce(ApiError) -> AdminServiceError {
    move |source| {
        warn!(error = %source, reason = message, "admin load failed");
        AdminServiceError::Load { message, source }
    }
}

/// Administrative CRUD over departments, trainings, modules and users.
#[derive(Clone)]
pub struct AdminService {
    api: Arc<dyn PortalApi>,
}

impl AdminService {
    #[must_use]
    pub fn new(api: Arc<dyn PortalApi>) -> Self {
        Self { api }
    }

    //
    // ─── TRAININGS ─────────────────────────────────────────────────────────────
    //

    /// Fetch departments, trainings and modules together.
    ///
    /// # Errors
    ///
    /// Returns `AdminServiceError::Load` if any of the three lists fails.
    pub async fn load_catalog(&self) -> Result<AdminCatalog, AdminServiceError> {
        let (departments, trainings, modules) = tokio::try_join!(
            self.api.list_departments(),
            self.api.list_trainings(),
            self.api.list_modules(),
        )
        .map_err(load_error(DATA_LOAD_FAILED))?;
        info!(
            departments = departments.len(),
            trainings = trainings.len(),
            modules = modules.len(),
            "admin catalog loaded"
        );
        Ok(AdminCatalog {
            departments,
            trainings,
            modules,
        })
    }

    /// Validate and create or update a training.
    ///
    /// A department given by name is matched case-insensitively against the
    /// existing ones and created when absent.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank name or department (nothing is sent),
    /// otherwise `Api`.
    pub async fn save_training(
        &self,
        editing: Editing<TrainingId>,
        draft: TrainingDraft,
    ) -> Result<Training, AdminServiceError> {
        let valid = draft.validate()?;
        let department_id = self.resolve_department(&valid.department).await?;
        let write = TrainingWrite {
            code: valid.code,
            name: valid.name,
            owner: valid.owner,
            last_updated: valid.last_updated,
            department_id,
        };
        let saved = match editing {
            Editing::New => self.api.create_training(&write).await?,
            Editing::Existing(id) => self.api.update_training(id, &write).await?,
        };
        info!(training = %saved.id(), name = saved.name(), "training saved");
        Ok(saved)
    }

    /// # Errors
    ///
    /// Returns `AdminServiceError::Api` on failure.
    pub async fn delete_training(&self, id: TrainingId) -> Result<(), AdminServiceError> {
        self.api.delete_training(id).await?;
        info!(training = %id, "training deleted");
        Ok(())
    }

    async fn resolve_department(
        &self,
        department: &DepartmentRef,
    ) -> Result<DepartmentId, AdminServiceError> {
        match department {
            DepartmentRef::Id(id) => Ok(*id),
            DepartmentRef::Name(name) => {
                let departments = self.api.list_departments().await?;
                if let Some(existing) = find_department_by_name(&departments, name) {
                    return Ok(existing.id());
                }
                let created = self.api.create_department(name).await?;
                info!(department = %created.id(), name = created.name(), "department created");
                Ok(created.id())
            }
        }
    }

    //
    // ─── DEPARTMENTS ───────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `AdminServiceError::Load` on failure.
    pub async fn list_departments(&self) -> Result<Vec<Department>, AdminServiceError> {
        self.api
            .list_departments()
            .await
            .map_err(load_error(DATA_LOAD_FAILED))
    }

    /// # Errors
    ///
    /// Returns `Validation` for a blank name, otherwise `Api`.
    pub async fn save_department(
        &self,
        editing: Editing<DepartmentId>,
        name: &str,
    ) -> Result<Department, AdminServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let saved = match editing {
            Editing::New => self.api.create_department(name).await?,
            Editing::Existing(id) => self.api.update_department(id, name).await?,
        };
        Ok(saved)
    }

    /// # Errors
    ///
    /// Returns `AdminServiceError::Api` on failure.
    pub async fn delete_department(&self, id: DepartmentId) -> Result<(), AdminServiceError> {
        self.api.delete_department(id).await?;
        Ok(())
    }

    //
    // ─── MODULES ───────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `AdminServiceError::Load` on failure.
    pub async fn modules_of_training(
        &self,
        training_id: TrainingId,
    ) -> Result<Vec<Module>, AdminServiceError> {
        let modules = self
            .api
            .list_modules()
            .await
            .map_err(load_error(DATA_LOAD_FAILED))?;
        Ok(modules
            .into_iter()
            .filter(|module| module.training_id() == training_id)
            .collect())
    }

    /// Create or update a module of a persisted training.
    ///
    /// # Errors
    ///
    /// Returns `Validation(UnsavedTraining)` when `training_id` is `None`,
    /// `Validation(EmptyTitle)` for a blank title, otherwise `Api`.
    pub async fn save_module(
        &self,
        training_id: Option<TrainingId>,
        editing: Editing<ModuleId>,
        draft: ModuleDraft,
    ) -> Result<Module, AdminServiceError> {
        let training_id = training_id.ok_or(ValidationError::UnsavedTraining)?;
        let draft = draft.validate()?;
        let saved = match editing {
            Editing::New => self.api.create_module(training_id, &draft).await?,
            Editing::Existing(id) => self.api.update_module(id, training_id, &draft).await?,
        };
        info!(module = %saved.id(), training = %training_id, "module saved");
        Ok(saved)
    }

    /// # Errors
    ///
    /// Returns `AdminServiceError::Api` on failure.
    pub async fn delete_module(&self, id: ModuleId) -> Result<(), AdminServiceError> {
        self.api.delete_module(id).await?;
        Ok(())
    }

    //
    // ─── USERS ─────────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `AdminServiceError::Load` on failure.
    pub async fn list_users(&self) -> Result<Vec<UserAccount>, AdminServiceError> {
        self.api
            .list_users()
            .await
            .map_err(load_error(USERS_LOAD_FAILED))
    }

    /// Create or update a user; the username is always the email.
    ///
    /// Without a password a new user gets `DEFAULT_PASSWORD` from the server
    /// and an existing user keeps theirs.
    ///
    /// # Errors
    ///
    /// Returns `Validation(EmptyEmail)` for a blank email, otherwise `Api`.
    pub async fn save_user(
        &self,
        editing: Editing<UserId>,
        draft: UserDraft,
        password: Option<SecretString>,
    ) -> Result<UserAccount, AdminServiceError> {
        let draft = draft.validate()?;
        let saved = match editing {
            Editing::New => self.api.create_user(&draft, password.as_ref()).await?,
            Editing::Existing(id) => self.api.update_user(id, &draft, password.as_ref()).await?,
        };
        info!(user = %saved.id, username = %saved.username, "user saved");
        Ok(saved)
    }

    /// # Errors
    ///
    /// Returns `AdminServiceError::Api` on failure.
    pub async fn delete_user(&self, id: UserId) -> Result<(), AdminServiceError> {
        self.api.delete_user(id).await?;
        info!(user = %id, "user deleted");
        Ok(())
    }

    /// Reset a user's password to `DEFAULT_PASSWORD`.
    ///
    /// # Errors
    ///
    /// Returns `AdminServiceError::Api` on failure.
    pub async fn reset_password(&self, id: UserId) -> Result<(), AdminServiceError> {
        self.api.reset_password(id).await?;
        info!(user = %id, "password reset");
        Ok(())
    }

    /// Per-user enrollment report shown on the user form.
    ///
    /// # Errors
    ///
    /// Returns `AdminServiceError::Api` on failure.
    pub async fn user_report(&self, id: UserId) -> Result<Vec<UserTrainingReport>, AdminServiceError> {
        Ok(self.api.user_trainings(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_lookup_ignores_case_and_blanks() {
        let catalog = AdminCatalog {
            departments: vec![
                Department::new(DepartmentId::new(1), "Fiscal", Vec::new()),
                Department::new(DepartmentId::new(2), "Departamento Pessoal", Vec::new()),
            ],
            ..AdminCatalog::default()
        };
        assert_eq!(
            catalog.department_by_name("  departamento pessoal ").map(Department::id),
            Some(DepartmentId::new(2))
        );
        assert!(catalog.department_by_name("TI").is_none());
    }

    #[test]
    fn modules_of_filters_by_training() {
        let catalog = AdminCatalog {
            modules: vec![
                Module::new(ModuleId::new(1), TrainingId::new(10), "A", "", ""),
                Module::new(ModuleId::new(2), TrainingId::new(11), "B", "", ""),
                Module::new(ModuleId::new(3), TrainingId::new(10), "C", "", ""),
            ],
            ..AdminCatalog::default()
        };
        let titles: Vec<&str> = catalog
            .modules_of(TrainingId::new(10))
            .into_iter()
            .map(Module::title)
            .collect();
        assert_eq!(titles, vec!["A", "C"]);
    }
}

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::ids::{DepartmentId, ModuleId, TrainingId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Client-side form validation failures; these never reach the server.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("name cannot be empty")]
    EmptyName,

    #[error("department cannot be empty")]
    EmptyDepartment,

    #[error("module title cannot be empty")]
    EmptyTitle,

    #[error("email cannot be empty")]
    EmptyEmail,

    #[error("username cannot be empty")]
    EmptyUsername,

    #[error("password cannot be empty")]
    EmptyPassword,

    #[error("training must be saved before adding modules")]
    UnsavedTraining,
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// A single lesson unit with a video embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    id: ModuleId,
    training_id: TrainingId,
    title: String,
    description: String,
    video_embed_url: String,
}

impl Module {
    #[must_use]
    pub fn new(
        id: ModuleId,
        training_id: TrainingId,
        title: impl Into<String>,
        description: impl Into<String>,
        video_embed_url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            training_id,
            title: title.into(),
            description: description.into(),
            video_embed_url: video_embed_url.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn training_id(&self) -> TrainingId {
        self.training_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn video_embed_url(&self) -> &str {
        &self.video_embed_url
    }
}

/// A course composed of ordered modules, owned by one department.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Training {
    id: TrainingId,
    code: String,
    name: String,
    owner: String,
    last_updated: Option<NaiveDate>,
    department_id: DepartmentId,
    modules: Vec<Module>,
}

impl Training {
    /// Rehydrate a training as served by the backend.
    ///
    /// Module order is kept exactly as given.
    #[must_use]
    pub fn from_server(
        id: TrainingId,
        code: impl Into<String>,
        name: impl Into<String>,
        owner: impl Into<String>,
        last_updated: Option<NaiveDate>,
        department_id: DepartmentId,
        modules: Vec<Module>,
    ) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
            owner: owner.into(),
            last_updated,
            department_id,
            modules,
        }
    }

    #[must_use]
    pub fn id(&self) -> TrainingId {
        self.id
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn last_updated(&self) -> Option<NaiveDate> {
        self.last_updated
    }

    /// Last-updated date in the `dd/mm/yyyy` form shown to users.
    #[must_use]
    pub fn last_updated_display(&self) -> String {
        self.last_updated
            .map(|date| date.format("%d/%m/%Y").to_string())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn department_id(&self) -> DepartmentId {
        self.department_id
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.iter().find(|module| module.id == id)
    }
}

/// A department and the trainings it displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    id: DepartmentId,
    name: String,
    trainings: Vec<Training>,
}

impl Department {
    #[must_use]
    pub fn new(id: DepartmentId, name: impl Into<String>, trainings: Vec<Training>) -> Self {
        Self {
            id,
            name: name.into(),
            trainings,
        }
    }

    #[must_use]
    pub fn id(&self) -> DepartmentId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn trainings(&self) -> &[Training] {
        &self.trainings
    }
}

/// Department names offered by the training form.
pub const DEFAULT_DEPARTMENTS: [&str; 7] = [
    "Contabil",
    "Consultoria",
    "Departamento Pessoal",
    "Empresarial",
    "Fiscal",
    "TI",
    "Geral",
];

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// How a training form refers to its department.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepartmentRef {
    Id(DepartmentId),
    /// Free-text name; resolved case-insensitively, created when missing.
    Name(String),
}

impl DepartmentRef {
    /// Interpret a raw form value: numeric input is an id, anything else a name.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<u64>() {
            Ok(id) => Self::Id(DepartmentId::new(id)),
            Err(_) => Self::Name(trimmed.to_string()),
        }
    }
}

/// Unvalidated training form as edited in the admin screen.
#[derive(Debug, Clone, Default)]
pub struct TrainingDraft {
    pub code: String,
    pub name: String,
    pub owner: String,
    pub last_updated: Option<NaiveDate>,
    pub department: String,
}

/// Training form that passed client-side validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTrainingDraft {
    pub code: String,
    pub name: String,
    pub owner: String,
    pub last_updated: Option<NaiveDate>,
    pub department: DepartmentRef,
}

impl TrainingDraft {
    /// Prefill a draft from an existing training for editing.
    #[must_use]
    pub fn from_training(training: &Training, department_name: Option<&str>) -> Self {
        Self {
            code: training.code().to_string(),
            name: training.name().to_string(),
            owner: training.owner().to_string(),
            last_updated: training.last_updated(),
            department: department_name
                .map_or_else(|| training.department_id().to_string(), str::to_string),
        }
    }

    /// # Errors
    ///
    /// Returns `ValidationError::EmptyName` or `ValidationError::EmptyDepartment`.
    pub fn validate(self) -> Result<ValidTrainingDraft, ValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.department.trim().is_empty() {
            return Err(ValidationError::EmptyDepartment);
        }
        Ok(ValidTrainingDraft {
            code: self.code.trim().to_string(),
            name,
            owner: self.owner.trim().to_string(),
            last_updated: self.last_updated,
            department: DepartmentRef::parse(&self.department),
        })
    }
}

/// Unvalidated module form.
#[derive(Debug, Clone, Default)]
pub struct ModuleDraft {
    pub title: String,
    pub description: String,
    pub video_embed_url: String,
}

impl ModuleDraft {
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyTitle` when the title is blank.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(Self {
            title,
            description: self.description,
            video_embed_url: self.video_embed_url.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_ref_distinguishes_ids_from_names() {
        assert_eq!(
            DepartmentRef::parse(" 12 "),
            DepartmentRef::Id(DepartmentId::new(12))
        );
        assert_eq!(
            DepartmentRef::parse("Fiscal"),
            DepartmentRef::Name("Fiscal".into())
        );
    }

    #[test]
    fn training_draft_requires_name_and_department() {
        let draft = TrainingDraft {
            name: "  ".into(),
            department: "Fiscal".into(),
            ..TrainingDraft::default()
        };
        assert_eq!(draft.validate(), Err(ValidationError::EmptyName));

        let draft = TrainingDraft {
            name: "ICMS".into(),
            ..TrainingDraft::default()
        };
        assert_eq!(draft.validate(), Err(ValidationError::EmptyDepartment));
    }

    #[test]
    fn module_draft_trims_title() {
        let draft = ModuleDraft {
            title: "  Intro ".into(),
            ..ModuleDraft::default()
        };
        assert_eq!(draft.validate().unwrap().title, "Intro");
    }

    #[test]
    fn last_updated_renders_day_first() {
        let training = Training::from_server(
            TrainingId::new(1),
            "F01",
            "T1",
            "Ana",
            NaiveDate::from_ymd_opt(2024, 3, 9),
            DepartmentId::new(1),
            Vec::new(),
        );
        assert_eq!(training.last_updated_display(), "09/03/2024");
    }
}

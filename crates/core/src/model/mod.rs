mod catalog;
mod ids;
mod mutation;
mod progress;
mod session;
mod settings;
mod user;

pub use catalog::{
    DEFAULT_DEPARTMENTS, Department, DepartmentRef, Module, ModuleDraft, Training, TrainingDraft,
    ValidTrainingDraft, ValidationError,
};
pub use ids::{DepartmentId, ModuleId, ParseIdError, TrainingId, UserId};
pub use mutation::{Mutation, MutationId, MutationKind, ProgressLedger, ProgressPatch};
pub use progress::{
    CompletionMap, Enrollment, EnrollmentMap, EnrollmentStatus, ModuleProgressRecord,
    ParseStatusError, ProgressSnapshot,
};
pub use session::{Credentials, Role};
pub use settings::{
    ClientSettings, ClientSettingsDraft, ClientSettingsError, DEFAULT_API_BASE_URL,
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_TIMEOUT_SECS,
};
pub use user::{UserAccount, UserDraft, UserTrainingReport};

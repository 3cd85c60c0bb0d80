//! Derived progress state: per-module completion flags, per-training
//! percentage and status, and the "my trainings" dashboard lists.
//!
//! Everything here is a pure function over the catalog and the two
//! session-local maps. Callers rebuild the derived lists from scratch on every
//! catalog or progress change.

use chrono::{DateTime, Utc};

use crate::model::{
    CompletionMap, Department, Enrollment, EnrollmentMap, EnrollmentStatus, ModuleId,
    ModuleProgressRecord, Training, TrainingId,
};

/// Completion figures for a single training.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingProgress {
    pub percent: u8,
    pub completed_count: usize,
    pub total_count: usize,
}

/// One entry of the "my trainings" list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MyTrainingItem {
    pub id: TrainingId,
    pub name: String,
    pub status: EnrollmentStatus,
    pub percent: u8,
}

/// The two dashboard columns. Not-started trainings appear in neither.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dashboard {
    pub in_progress: Vec<MyTrainingItem>,
    pub completed: Vec<MyTrainingItem>,
}

/// Build the completion map; later duplicates overwrite earlier ones.
#[must_use]
pub fn compute_module_completion_map(records: &[ModuleProgressRecord]) -> CompletionMap {
    records
        .iter()
        .map(|record| (record.module_id, record.completed))
        .collect()
}

/// Build the enrollment map keyed by training; later duplicates overwrite earlier ones.
#[must_use]
pub fn compute_enrollment_status_map(records: &[Enrollment]) -> EnrollmentMap {
    records
        .iter()
        .map(|record| (record.training_id, record.clone()))
        .collect()
}

/// Count completed modules of `training` and derive its percentage.
#[must_use]
pub fn compute_training_progress(training: &Training, completion: &CompletionMap) -> TrainingProgress {
    let total_count = training.modules().len();
    let completed_count = training
        .modules()
        .iter()
        .filter(|module| completion.get(&module.id()).copied().unwrap_or(false))
        .count();

    TrainingProgress {
        percent: rounded_percent(completed_count, total_count),
        completed_count,
        total_count,
    }
}

/// `round(100 * completed / total)` with halves rounded up; `0` when `total == 0`.
fn rounded_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    // (100c / t + 1/2) floored, kept in integers.
    let percent = (200 * completed + total) / (2 * total);
    u8::try_from(percent).unwrap_or(100)
}

/// Status shown for a training.
///
/// Percentage decides, except that a server-side `InProgress` lifts a 0%
/// training out of `NotStarted`. A server `Completed` at 0% is not honoured.
#[must_use]
pub fn compute_training_status(
    percent: u8,
    enrollment_status: Option<EnrollmentStatus>,
) -> EnrollmentStatus {
    if percent >= 100 {
        EnrollmentStatus::Completed
    } else if percent > 0 || enrollment_status == Some(EnrollmentStatus::InProgress) {
        EnrollmentStatus::InProgress
    } else {
        EnrollmentStatus::NotStarted
    }
}

/// Progress and status of one training in a single call.
#[must_use]
pub fn evaluate_training(
    training: &Training,
    completion: &CompletionMap,
    enrollments: &EnrollmentMap,
) -> (TrainingProgress, EnrollmentStatus) {
    let progress = compute_training_progress(training, completion);
    let server_status = enrollments.get(&training.id()).map(|e| e.status);
    let status = compute_training_status(progress.percent, server_status);
    (progress, status)
}

/// One item per training, in catalog order (departments, then trainings).
#[must_use]
pub fn build_my_trainings_list(
    departments: &[Department],
    completion: &CompletionMap,
    enrollments: &EnrollmentMap,
) -> Vec<MyTrainingItem> {
    departments
        .iter()
        .flat_map(Department::trainings)
        .map(|training| {
            let (progress, status) = evaluate_training(training, completion, enrollments);
            MyTrainingItem {
                id: training.id(),
                name: training.name().to_string(),
                status,
                percent: progress.percent,
            }
        })
        .collect()
}

/// Split the list into the "in progress" and "completed" dashboard columns.
#[must_use]
pub fn partition_dashboard(items: &[MyTrainingItem]) -> Dashboard {
    let mut dashboard = Dashboard::default();
    for item in items {
        match item.status {
            EnrollmentStatus::InProgress => dashboard.in_progress.push(item.clone()),
            EnrollmentStatus::Completed => dashboard.completed.push(item.clone()),
            EnrollmentStatus::NotStarted => {}
        }
    }
    dashboard
}

/// Flip a module's completion flag and mark its training as started.
///
/// The enrollment is only ever upgraded from absent/`NotStarted` to
/// `InProgress`; toggling a module back off does not downgrade it.
#[must_use]
pub fn toggle_module_completion(
    training_id: TrainingId,
    module_id: ModuleId,
    completion: &CompletionMap,
    enrollments: &EnrollmentMap,
) -> (CompletionMap, EnrollmentMap) {
    let mut next_completion = completion.clone();
    let current = next_completion.get(&module_id).copied().unwrap_or(false);
    next_completion.insert(module_id, !current);

    let mut next_enrollments = enrollments.clone();
    let entry = next_enrollments
        .entry(training_id)
        .or_insert_with(|| Enrollment::not_started(training_id));
    if entry.status == EnrollmentStatus::NotStarted {
        entry.status = EnrollmentStatus::InProgress;
    }

    (next_completion, next_enrollments)
}

/// Mark a training as started at `now`, keeping an existing start timestamp.
#[must_use]
pub fn start_training(
    training_id: TrainingId,
    enrollments: &EnrollmentMap,
    now: DateTime<Utc>,
) -> EnrollmentMap {
    let mut next = enrollments.clone();
    let entry = next
        .entry(training_id)
        .or_insert_with(|| Enrollment::not_started(training_id));
    entry.status = EnrollmentStatus::InProgress;
    entry.started_at.get_or_insert(now);
    next
}

/// Locate a training anywhere in the catalog tree.
#[must_use]
pub fn find_training(departments: &[Department], id: TrainingId) -> Option<&Training> {
    departments
        .iter()
        .flat_map(Department::trainings)
        .find(|training| training.id() == id)
}

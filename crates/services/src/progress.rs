use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use portal_core::Clock;
use portal_core::model::{
    CompletionMap, Department, EnrollmentMap, EnrollmentStatus, Module, ModuleId, Mutation,
    ProgressLedger, Training, TrainingId,
};
use portal_core::progress::{
    Dashboard, MyTrainingItem, TrainingProgress, build_my_trainings_list,
    compute_enrollment_status_map, compute_module_completion_map, evaluate_training,
    find_training, partition_dashboard,
};

use crate::api::PortalApi;
use crate::error::ProgressServiceError;
use crate::mutation_queue::MutationQueue;
use crate::session::SessionContext;

pub const CATALOG_LOAD_FAILED: &str = "Falha ao acessar os treinamentos. Verifique o acesso.";

/// Catalog plus the progress ledger for the signed-in collaborator.
#[derive(Debug, Clone, Default)]
struct WorkingSet {
    catalog: Vec<Department>,
    progress: ProgressLedger,
}

/// One module as shown on a training page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleView {
    pub module: Module,
    pub completed: bool,
}

/// Everything the training page needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingDetail {
    pub training: Training,
    pub progress: TrainingProgress,
    pub status: EnrollmentStatus,
    pub modules: Vec<ModuleView>,
}

/// Collaborator-facing progress: loads the working set and applies
/// mutations optimistically, dropping them again when delivery fails.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    api: Arc<dyn PortalApi>,
    queue: MutationQueue,
    state: Arc<Mutex<WorkingSet>>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, api: Arc<dyn PortalApi>, queue: MutationQueue) -> Self {
        Self {
            clock,
            api,
            queue,
            state: Arc::new(Mutex::new(WorkingSet::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, WorkingSet> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reload catalog and progress. Without a collaborator token the working
    /// set is simply emptied.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Load` if the catalog cannot be fetched;
    /// the catalog is cleared in that case. A failed progress fetch is only
    /// logged and leaves the confirmed maps empty; mutations still in flight
    /// stay applied on top.
    pub async fn refresh(&self, session: &SessionContext) -> Result<(), ProgressServiceError> {
        if !session.has_user_token() {
            *self.state() = WorkingSet::default();
            return Ok(());
        }

        let (catalog, progress) =
            tokio::join!(self.api.fetch_catalog(), self.api.fetch_my_progress());

        let (completion, enrollments) = match progress {
            Ok(snapshot) => (
                compute_module_completion_map(&snapshot.modules),
                compute_enrollment_status_map(&snapshot.enrollments),
            ),
            Err(err) => {
                warn!(error = %err, "failed to load progress");
                (CompletionMap::new(), EnrollmentMap::new())
            }
        };

        let mut state = self.state();
        state.progress.reset(completion, enrollments);
        match catalog {
            Ok(catalog) => {
                info!(departments = catalog.len(), "catalog loaded");
                state.catalog = catalog;
                Ok(())
            }
            Err(source) => {
                warn!(error = %source, "failed to load catalog");
                state.catalog.clear();
                Err(ProgressServiceError::Load {
                    message: CATALOG_LOAD_FAILED,
                    source,
                })
            }
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Vec<Department> {
        self.state().catalog.clone()
    }

    #[must_use]
    pub fn completion(&self) -> CompletionMap {
        self.state().progress.completion().clone()
    }

    #[must_use]
    pub fn enrollments(&self) -> EnrollmentMap {
        self.state().progress.enrollments().clone()
    }

    /// Mutations applied locally and still waiting for the server.
    #[must_use]
    pub fn pending_mutations(&self) -> usize {
        self.state().progress.pending()
    }

    /// All trainings in catalog order with their derived status.
    #[must_use]
    pub fn my_trainings(&self) -> Vec<MyTrainingItem> {
        let state = self.state();
        build_my_trainings_list(
            &state.catalog,
            state.progress.completion(),
            state.progress.enrollments(),
        )
    }

    #[must_use]
    pub fn dashboard(&self) -> Dashboard {
        partition_dashboard(&self.my_trainings())
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::UnknownTraining` if the id is not in the catalog.
    pub fn training_detail(&self, id: TrainingId) -> Result<TrainingDetail, ProgressServiceError> {
        let state = self.state();
        let training = find_training(&state.catalog, id)
            .ok_or(ProgressServiceError::UnknownTraining(id))?;
        let completion = state.progress.completion();
        let (progress, status) =
            evaluate_training(training, completion, state.progress.enrollments());
        let modules = training
            .modules()
            .iter()
            .map(|module| ModuleView {
                module: module.clone(),
                completed: completion.get(&module.id()).copied().unwrap_or(false),
            })
            .collect();
        Ok(TrainingDetail {
            training: training.clone(),
            progress,
            status,
            modules,
        })
    }

    /// Mark a training as started.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTraining` for an id outside the catalog, or the
    /// delivery error after the optimistic change has been rolled back.
    pub async fn start_training(&self, id: TrainingId) -> Result<(), ProgressServiceError> {
        let mutation = {
            let mut state = self.state();
            if find_training(&state.catalog, id).is_none() {
                return Err(ProgressServiceError::UnknownTraining(id));
            }
            let mutation =
                Mutation::start_training(id, state.progress.enrollments(), self.clock.now());
            state.progress.record(mutation.clone());
            mutation
        };
        self.deliver(mutation).await
    }

    /// Flip one module's completion flag.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTraining`/`UnknownModule` for ids outside the catalog,
    /// or the delivery error after the optimistic change has been rolled back.
    pub async fn toggle_module(
        &self,
        training_id: TrainingId,
        module_id: ModuleId,
    ) -> Result<bool, ProgressServiceError> {
        let (mutation, completed) = {
            let mut state = self.state();
            let training = find_training(&state.catalog, training_id)
                .ok_or(ProgressServiceError::UnknownTraining(training_id))?;
            if training.module(module_id).is_none() {
                return Err(ProgressServiceError::UnknownModule {
                    training_id,
                    module_id,
                });
            }
            let mutation = Mutation::toggle_module(
                training_id,
                module_id,
                state.progress.completion(),
                state.progress.enrollments(),
            );
            state.progress.record(mutation.clone());
            let completed = state
                .progress
                .completion()
                .get(&module_id)
                .copied()
                .unwrap_or(false);
            (mutation, completed)
        };
        self.deliver(mutation).await?;
        Ok(completed)
    }

    async fn deliver(&self, mutation: Mutation) -> Result<(), ProgressServiceError> {
        let result = self.queue.submit(&mutation).await;
        let mut state = self.state();
        match result {
            Ok(()) => {
                state.progress.confirm(mutation.id());
                Ok(())
            }
            Err(err) => {
                warn!(mutation = %mutation.id(), kind = mutation.kind().name(), "rolling back");
                state.progress.reject(mutation.id());
                Err(err.into())
            }
        }
    }
}

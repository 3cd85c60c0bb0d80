use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::ids::{ModuleId, TrainingId};
use crate::model::progress::{CompletionMap, Enrollment, EnrollmentMap};
use crate::progress;

/// Client-generated identifier for a queued mutation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationId(Uuid);

impl MutationId {
    #[must_use]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Debug for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MutationId({})", self.0)
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the server is asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    StartTraining {
        training_id: TrainingId,
    },
    SetModuleCompletion {
        training_id: TrainingId,
        module_id: ModuleId,
        completed: bool,
    },
}

impl MutationKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartTraining { .. } => "start_training",
            Self::SetModuleCompletion { .. } => "set_module_completion",
        }
    }
}

/// Point values for the keys a mutation touches. `None` removes the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressPatch {
    pub modules: Vec<(ModuleId, Option<bool>)>,
    pub enrollments: Vec<(TrainingId, Option<Enrollment>)>,
}

impl ProgressPatch {
    pub fn apply(&self, completion: &mut CompletionMap, enrollments: &mut EnrollmentMap) {
        for (module_id, value) in &self.modules {
            match value {
                Some(done) => {
                    completion.insert(*module_id, *done);
                }
                None => {
                    completion.remove(module_id);
                }
            }
        }
        for (training_id, value) in &self.enrollments {
            match value {
                Some(enrollment) => {
                    enrollments.insert(*training_id, enrollment.clone());
                }
                None => {
                    enrollments.remove(training_id);
                }
            }
        }
    }
}

/// A user action with its optimistic effect.
///
/// There is no stored inverse: undoing a mutation means dropping it from the
/// `ProgressLedger`, which rebuilds the view from confirmed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    id: MutationId,
    kind: MutationKind,
    optimistic: ProgressPatch,
}

impl Mutation {
    /// Toggle a module as currently displayed.
    #[must_use]
    pub fn toggle_module(
        training_id: TrainingId,
        module_id: ModuleId,
        completion: &CompletionMap,
        enrollments: &EnrollmentMap,
    ) -> Self {
        let (next_completion, next_enrollments) =
            progress::toggle_module_completion(training_id, module_id, completion, enrollments);
        let completed = next_completion.get(&module_id).copied().unwrap_or(false);

        Self {
            id: MutationId::new_v4(),
            kind: MutationKind::SetModuleCompletion {
                training_id,
                module_id,
                completed,
            },
            optimistic: ProgressPatch {
                modules: vec![(module_id, Some(completed))],
                enrollments: vec![(training_id, next_enrollments.get(&training_id).cloned())],
            },
        }
    }

    #[must_use]
    pub fn start_training(
        training_id: TrainingId,
        enrollments: &EnrollmentMap,
        now: DateTime<Utc>,
    ) -> Self {
        let next = progress::start_training(training_id, enrollments, now);

        Self {
            id: MutationId::new_v4(),
            kind: MutationKind::StartTraining { training_id },
            optimistic: ProgressPatch {
                modules: Vec::new(),
                enrollments: vec![(training_id, next.get(&training_id).cloned())],
            },
        }
    }

    #[must_use]
    pub fn id(&self) -> MutationId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    #[must_use]
    pub fn optimistic(&self) -> &ProgressPatch {
        &self.optimistic
    }
}

#[derive(Debug, Clone)]
struct PendingMutation {
    mutation: Mutation,
    delivered: bool,
}

/// Server-confirmed progress plus the optimistic mutations still in flight.
///
/// The displayed maps are always `confirmed` with every pending patch applied
/// in submission order. A delivered mutation is folded into `confirmed` only
/// once every mutation submitted before it has settled, so the confirmed maps
/// see patches in the same order the server did. A failed mutation is simply
/// dropped and the view rebuilt.
#[derive(Debug, Clone, Default)]
pub struct ProgressLedger {
    confirmed_completion: CompletionMap,
    confirmed_enrollments: EnrollmentMap,
    pending: Vec<PendingMutation>,
    completion: CompletionMap,
    enrollments: EnrollmentMap,
}

impl ProgressLedger {
    /// Start from a fresh server snapshot. Mutations still in flight stay
    /// applied on top of it.
    pub fn reset(&mut self, completion: CompletionMap, enrollments: EnrollmentMap) {
        self.confirmed_completion = completion;
        self.confirmed_enrollments = enrollments;
        self.rebuild();
    }

    /// Completion map as displayed.
    #[must_use]
    pub fn completion(&self) -> &CompletionMap {
        &self.completion
    }

    /// Enrollment map as displayed.
    #[must_use]
    pub fn enrollments(&self) -> &EnrollmentMap {
        &self.enrollments
    }

    #[must_use]
    pub fn confirmed_completion(&self) -> &CompletionMap {
        &self.confirmed_completion
    }

    #[must_use]
    pub fn confirmed_enrollments(&self) -> &EnrollmentMap {
        &self.confirmed_enrollments
    }

    /// Mutations recorded and not yet settled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.iter().filter(|entry| !entry.delivered).count()
    }

    /// Apply a new mutation's optimistic patch to the view.
    pub fn record(&mut self, mutation: Mutation) {
        mutation
            .optimistic
            .apply(&mut self.completion, &mut self.enrollments);
        self.pending.push(PendingMutation {
            mutation,
            delivered: false,
        });
    }

    /// The server accepted `id`. Returns `false` for an unknown id.
    pub fn confirm(&mut self, id: MutationId) -> bool {
        let Some(entry) = self.pending.iter_mut().find(|entry| entry.mutation.id == id) else {
            return false;
        };
        entry.delivered = true;

        let settled = self.pending.iter().take_while(|entry| entry.delivered).count();
        for entry in self.pending.drain(..settled) {
            entry.mutation.optimistic.apply(
                &mut self.confirmed_completion,
                &mut self.confirmed_enrollments,
            );
        }
        true
    }

    /// The server never accepted `id`: drop it and rebuild the view.
    /// Returns `false` for an unknown id.
    pub fn reject(&mut self, id: MutationId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|entry| entry.mutation.id != id);
        if self.pending.len() == before {
            return false;
        }
        self.rebuild();
        true
    }

    fn rebuild(&mut self) {
        self.completion = self.confirmed_completion.clone();
        self.enrollments = self.confirmed_enrollments.clone();
        for entry in &self.pending {
            entry
                .mutation
                .optimistic
                .apply(&mut self.completion, &mut self.enrollments);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EnrollmentStatus;
    use crate::time::fixed_now;

    fn training() -> TrainingId {
        TrainingId::new(1)
    }

    fn module() -> ModuleId {
        ModuleId::new(2)
    }

    fn toggle(ledger: &mut ProgressLedger) -> Mutation {
        let mutation =
            Mutation::toggle_module(training(), module(), ledger.completion(), ledger.enrollments());
        ledger.record(mutation.clone());
        mutation
    }

    #[test]
    fn toggle_of_absent_module_sends_true_and_starts_training() {
        let mut ledger = ProgressLedger::default();
        let mutation = toggle(&mut ledger);
        assert_eq!(
            mutation.kind(),
            MutationKind::SetModuleCompletion {
                training_id: training(),
                module_id: module(),
                completed: true,
            }
        );
        assert_eq!(ledger.completion().get(&module()), Some(&true));
        assert_eq!(ledger.enrollments()[&training()].status, EnrollmentStatus::InProgress);
        assert!(ledger.confirmed_completion().is_empty());
        assert_eq!(ledger.pending(), 1);
    }

    #[test]
    fn toggle_of_completed_module_sends_false() {
        let mut completion = CompletionMap::new();
        completion.insert(module(), true);
        let mutation = Mutation::toggle_module(training(), module(), &completion, &EnrollmentMap::new());
        assert!(matches!(
            mutation.kind(),
            MutationKind::SetModuleCompletion {
                completed: false,
                ..
            }
        ));
    }

    #[test]
    fn rejected_mutation_restores_confirmed_state() {
        let mut ledger = ProgressLedger::default();
        let mut enrollments = EnrollmentMap::new();
        enrollments.insert(TrainingId::new(4), Enrollment::not_started(TrainingId::new(4)));
        ledger.reset(CompletionMap::new(), enrollments.clone());

        let mutation =
            Mutation::start_training(TrainingId::new(4), ledger.enrollments(), fixed_now());
        ledger.record(mutation.clone());
        assert_eq!(
            ledger.enrollments()[&TrainingId::new(4)].started_at,
            Some(fixed_now())
        );

        assert!(ledger.reject(mutation.id()));
        assert_eq!(ledger.enrollments(), &enrollments);
        assert_eq!(ledger.pending(), 0);
        assert!(!ledger.reject(mutation.id()));
    }

    #[test]
    fn overlapping_failures_leave_nothing_behind() {
        let mut ledger = ProgressLedger::default();
        let first = toggle(&mut ledger);
        let second = toggle(&mut ledger);
        assert_eq!(ledger.completion().get(&module()), Some(&false));

        ledger.reject(first.id());
        ledger.reject(second.id());
        assert!(ledger.completion().is_empty());
        assert!(ledger.enrollments().is_empty());
    }

    #[test]
    fn first_failing_keeps_the_later_delivered_value() {
        let mut ledger = ProgressLedger::default();
        let first = toggle(&mut ledger);
        let second = toggle(&mut ledger);

        ledger.reject(first.id());
        assert_eq!(ledger.completion().get(&module()), Some(&false));
        ledger.confirm(second.id());
        assert_eq!(ledger.confirmed_completion().get(&module()), Some(&false));
        assert_eq!(ledger.completion(), ledger.confirmed_completion());
    }

    #[test]
    fn confirmations_fold_in_submission_order() {
        let mut ledger = ProgressLedger::default();
        let first = toggle(&mut ledger);
        let second = toggle(&mut ledger);

        // The later mutation settles first; it must wait for the earlier one.
        assert!(ledger.confirm(second.id()));
        assert!(ledger.confirmed_completion().is_empty());
        assert_eq!(ledger.pending(), 1);

        assert!(ledger.confirm(first.id()));
        assert_eq!(ledger.confirmed_completion().get(&module()), Some(&false));
        assert_eq!(ledger.completion(), ledger.confirmed_completion());
        assert_eq!(ledger.enrollments(), ledger.confirmed_enrollments());
    }

    #[test]
    fn reset_keeps_in_flight_patches_on_top() {
        let mut ledger = ProgressLedger::default();
        toggle(&mut ledger);

        let mut server = CompletionMap::new();
        server.insert(ModuleId::new(9), true);
        ledger.reset(server.clone(), EnrollmentMap::new());
        assert_eq!(ledger.confirmed_completion(), &server);
        assert_eq!(ledger.completion().get(&ModuleId::new(9)), Some(&true));
        assert_eq!(ledger.completion().get(&module()), Some(&true));
    }

    #[test]
    fn mutation_ids_are_unique() {
        assert_ne!(MutationId::new_v4(), MutationId::new_v4());
    }
}

//! Serialized, retried delivery of progress mutations.

use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, rng};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use portal_core::model::{ClientSettings, Mutation, MutationKind};

use crate::api::PortalApi;
use crate::error::ApiError;

const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(250);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(4);

/// How often, and how patiently, a transient failure is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` counts the first try; zero is treated as one.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self::new(
            settings.retry_attempts(),
            DEFAULT_BASE_DELAY,
            DEFAULT_MAX_DELAY,
        )
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retry number `attempt` (1-based), before jitter.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1 << exponent)
            .min(self.max_delay)
    }

    /// `backoff` scaled into `[delay / 2, delay]` by `jitter` in `0.0..=1.0`.
    #[must_use]
    pub fn jittered(&self, attempt: u32, jitter: f64) -> Duration {
        let delay = self.backoff(attempt);
        delay.mul_f64(0.5 + 0.5 * jitter.clamp(0.0, 1.0))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&ClientSettings::default())
    }
}

/// FIFO of mutations sent one at a time.
///
/// Callers await their own mutation; the fair lock hands out turns in
/// submission order.
#[derive(Clone)]
pub struct MutationQueue {
    api: Arc<dyn PortalApi>,
    policy: RetryPolicy,
    turn: Arc<Mutex<()>>,
}

impl MutationQueue {
    #[must_use]
    pub fn new(api: Arc<dyn PortalApi>, policy: RetryPolicy) -> Self {
        Self {
            api,
            policy,
            turn: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Deliver a mutation, retrying transient failures with backoff.
    ///
    /// # Errors
    ///
    /// Returns the last `ApiError` once the failure is permanent or the
    /// attempts are used up.
    pub async fn submit(&self, mutation: &Mutation) -> Result<(), ApiError> {
        let _turn = self.turn.lock().await;

        let mut attempt = 1;
        loop {
            debug!(mutation = %mutation.id(), kind = mutation.kind().name(), attempt, "sending mutation");
            match self.execute(mutation.kind()).await {
                Ok(()) => {
                    if attempt > 1 {
                        info!(mutation = %mutation.id(), attempt, "mutation delivered after retry");
                    }
                    return Ok(());
                }
                Err(err) if err.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.jittered(attempt, rng().random_range(0.0..=1.0));
                    warn!(
                        mutation = %mutation.id(),
                        kind = mutation.kind().name(),
                        attempt,
                        ?delay,
                        error = %err,
                        "mutation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(
                        mutation = %mutation.id(),
                        kind = mutation.kind().name(),
                        attempt,
                        error = %err,
                        "mutation failed"
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn execute(&self, kind: MutationKind) -> Result<(), ApiError> {
        match kind {
            MutationKind::StartTraining { training_id } => {
                self.api.start_training(training_id).await
            }
            MutationKind::SetModuleCompletion {
                module_id,
                completed,
                ..
            } => self.api.complete_module(module_id, completed).await,
        }
    }
}

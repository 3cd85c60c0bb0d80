use std::sync::Arc;

use portal_core::model::ClientSettings;
use storage::repository::Storage;

use crate::Clock;
use crate::admin::AdminService;
use crate::api::{BearerToken, HttpPortalApi, PortalApi};
use crate::error::PortalClientError;
use crate::mutation_queue::{MutationQueue, RetryPolicy};
use crate::progress::ProgressService;
use crate::session::SessionService;

/// Assembles the client services around one API and one session store.
#[derive(Clone)]
pub struct PortalClient {
    session: SessionService,
    progress: ProgressService,
    admin: AdminService,
}

impl PortalClient {
    /// Build a client talking HTTP, with the session persisted in `SQLite`.
    ///
    /// The persisted session is loaded so the first request already carries
    /// the right bearer token.
    ///
    /// # Errors
    ///
    /// Returns `PortalClientError` if storage or the HTTP client cannot be
    /// initialized, or the stored session cannot be read.
    pub async fn new_sqlite(
        db_url: &str,
        settings: ClientSettings,
        clock: Clock,
    ) -> Result<Self, PortalClientError> {
        let storage = Storage::sqlite(db_url).await?;
        let bearer = BearerToken::new();
        let policy = RetryPolicy::from_settings(&settings);
        let api: Arc<dyn PortalApi> = Arc::new(HttpPortalApi::new(settings, bearer.clone())?);
        let client = Self::from_parts(api, bearer, &storage, policy, clock);
        client.session.load().await?;
        Ok(client)
    }

    /// Wire services from explicit parts; used with fakes in tests.
    #[must_use]
    pub fn from_parts(
        api: Arc<dyn PortalApi>,
        bearer: BearerToken,
        storage: &Storage,
        policy: RetryPolicy,
        clock: Clock,
    ) -> Self {
        let queue = MutationQueue::new(Arc::clone(&api), policy);
        Self {
            session: SessionService::new(Arc::clone(&api), Arc::clone(&storage.sessions), bearer),
            progress: ProgressService::new(clock, Arc::clone(&api), queue),
            admin: AdminService::new(api),
        }
    }

    #[must_use]
    pub fn session(&self) -> &SessionService {
        &self.session
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    #[must_use]
    pub fn admin(&self) -> &AdminService {
        &self.admin
    }
}

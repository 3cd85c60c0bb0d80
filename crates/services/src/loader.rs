use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::debug;

use portal_core::load::{LoadState, LoadTicket, Resource};

struct LoaderState<K, T> {
    resource: Resource<K, T>,
    task: Option<JoinHandle<()>>,
}

/// Runs at most one fetch per resource; starting a new one aborts the old.
///
/// A result that still slips through after an abort is rejected by the
/// resource's generation check.
pub struct ResourceLoader<K, T> {
    inner: Arc<Mutex<LoaderState<K, T>>>,
}

impl<K, T> Clone for ResourceLoader<K, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, T> Default for ResourceLoader<K, T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(LoaderState {
                resource: Resource::default(),
                task: None,
            })),
        }
    }
}

impl<K, T> ResourceLoader<K, T>
where
    K: PartialEq + Send + 'static,
    T: Clone + Send + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(inner: &Mutex<LoaderState<K, T>>) -> MutexGuard<'_, LoaderState<K, T>> {
        inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start loading `key`, aborting whatever was in flight.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn load<F>(&self, key: K, fetch: F) -> LoadTicket
    where
        F: Future<Output = Result<T, String>> + Send + 'static,
    {
        let mut state = Self::lock(&self.inner);
        if let Some(previous) = state.task.take() {
            previous.abort();
        }
        let ticket = state.resource.begin(key);

        let inner = Arc::clone(&self.inner);
        state.task = Some(tokio::spawn(async move {
            let result = fetch.await;
            let mut state = Self::lock(&inner);
            if !state.resource.finish(ticket, result) {
                debug!("discarding stale load result");
            }
        }));
        ticket
    }

    /// Like `load`, but a no-op when `key` is already loaded or loading.
    /// A key whose last attempt failed is fetched again.
    pub fn load_if_changed<F>(&self, key: K, fetch: F) -> Option<LoadTicket>
    where
        F: Future<Output = Result<T, String>> + Send + 'static,
    {
        {
            let state = Self::lock(&self.inner);
            let failed = matches!(state.resource.state(), LoadState::Error(_));
            if !failed && !state.resource.key_changed(&key) {
                return None;
            }
        }
        Some(self.load(key, fetch))
    }

    /// Abort the in-flight fetch and forget any loaded value.
    pub fn cancel(&self) {
        let mut state = Self::lock(&self.inner);
        if let Some(task) = state.task.take() {
            task.abort();
        }
        state.resource.reset();
    }

    /// Wait for the current fetch, if any, to settle.
    pub async fn settled(&self) {
        let task = Self::lock(&self.inner).task.take();
        if let Some(task) = task {
            // An aborted task resolves with a cancellation error; nothing to report.
            let _ = task.await;
        }
    }

    #[must_use]
    pub fn state(&self) -> LoadState<T> {
        Self::lock(&self.inner).resource.state().clone()
    }
}

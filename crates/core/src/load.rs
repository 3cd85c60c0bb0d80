//! Per-resource loading state with stale-result rejection.

/// Observable state of one remote resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(String),
}

impl<T> LoadState<T> {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Handle for one load attempt; results carrying an old ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// Tracks the state of a resource identified by key `K`.
///
/// Every `begin` bumps the generation, so a result that arrives after the key
/// changed (or after a reload) is ignored by `finish`.
#[derive(Debug, Clone)]
pub struct Resource<K, T> {
    key: Option<K>,
    generation: u64,
    state: LoadState<T>,
}

impl<K, T> Default for Resource<K, T> {
    fn default() -> Self {
        Self {
            key: None,
            generation: 0,
            state: LoadState::Idle,
        }
    }
}

impl<K: PartialEq, T> Resource<K, T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start loading `key`, superseding any attempt in flight.
    pub fn begin(&mut self, key: K) -> LoadTicket {
        self.generation = self.generation.wrapping_add(1);
        self.key = Some(key);
        self.state = LoadState::Loading;
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Record the outcome of an attempt. Returns `false` if the ticket is stale.
    pub fn finish(&mut self, ticket: LoadTicket, result: Result<T, String>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.state = match result {
            Ok(value) => LoadState::Ready(value),
            Err(message) => LoadState::Error(message),
        };
        true
    }

    #[must_use]
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.generation && self.state.is_loading()
    }

    /// Drop any data and in-flight attempt.
    pub fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.key = None;
        self.state = LoadState::Idle;
    }

    #[must_use]
    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> &LoadState<T> {
        &self.state
    }

    /// Whether `key` differs from the key last loaded.
    #[must_use]
    pub fn key_changed(&self, key: &K) -> bool {
        self.key.as_ref() != Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_loading_ready() {
        let mut resource: Resource<&str, u32> = Resource::new();
        assert_eq!(resource.state(), &LoadState::Idle);

        let ticket = resource.begin("catalog");
        assert!(resource.state().is_loading());
        assert!(resource.finish(ticket, Ok(3)));
        assert_eq!(resource.state().ready(), Some(&3));
    }

    #[test]
    fn stale_results_are_ignored() {
        let mut resource: Resource<u64, &str> = Resource::new();
        let first = resource.begin(1);
        let second = resource.begin(2);

        assert!(!resource.finish(first, Ok("user 1")));
        assert!(resource.state().is_loading());
        assert!(resource.finish(second, Err("boom".into())));
        assert_eq!(resource.state().error(), Some("boom"));
        assert!(!resource.finish(second, Ok("late duplicate")));
    }

    #[test]
    fn reset_invalidates_in_flight_ticket() {
        let mut resource: Resource<u64, u8> = Resource::new();
        let ticket = resource.begin(7);
        resource.reset();
        assert!(!resource.finish(ticket, Ok(1)));
        assert_eq!(resource.state(), &LoadState::Idle);
        assert!(resource.key_changed(&7));
    }
}

use async_trait::async_trait;
use portal_core::model::Role;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Keys of the client-side session store. Entries never expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    AdminToken,
    UserToken,
    LastEmail,
}

impl SessionKey {
    pub const ALL: [SessionKey; 3] = [Self::AdminToken, Self::UserToken, Self::LastEmail];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AdminToken => "admin_token",
            Self::UserToken => "user_token",
            Self::LastEmail => "treinamentos_email",
        }
    }
}

/// Everything the client remembers between runs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionRecord {
    pub admin_token: Option<String>,
    pub user_token: Option<String>,
    pub last_email: Option<String>,
}

impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .field("user_token", &self.user_token.as_ref().map(|_| "<redacted>"))
            .field("last_email", &self.last_email)
            .finish()
    }
}

impl SessionRecord {
    #[must_use]
    pub fn role(&self) -> Role {
        Role::derive(self.admin_token.is_some(), self.user_token.is_some())
    }

    fn slot(&mut self, key: SessionKey) -> &mut Option<String> {
        match key {
            SessionKey::AdminToken => &mut self.admin_token,
            SessionKey::UserToken => &mut self.user_token,
            SessionKey::LastEmail => &mut self.last_email,
        }
    }
}

/// Key-value contract for the persisted session.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Read one entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: SessionKey) -> Result<Option<String>, StorageError>;

    /// Insert or overwrite one entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn set(&self, key: SessionKey, value: &str) -> Result<(), StorageError>;

    /// Remove one entry; removing a missing entry is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: SessionKey) -> Result<(), StorageError>;

    /// Read every known key at once.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any entry cannot be read.
    async fn load_record(&self) -> Result<SessionRecord, StorageError> {
        let mut record = SessionRecord::default();
        for key in SessionKey::ALL {
            *record.slot(key) = self.get(key).await?;
        }
        Ok(record)
    }
}

/// Simple in-memory session store for tests and throwaway runs.
#[derive(Clone, Default)]
pub struct InMemorySessionRepository {
    entries: Arc<Mutex<HashMap<SessionKey, String>>>,
}

impl InMemorySessionRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn get(&self, key: SessionKey) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&key).cloned())
    }

    async fn set(&self, key: SessionKey, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key, value.to_string());
        Ok(())
    }

    async fn remove(&self, key: SessionKey) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&key);
        Ok(())
    }
}

/// Repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(InMemorySessionRepository::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_session_entries() {
        let repo = InMemorySessionRepository::new();
        repo.set(SessionKey::UserToken, "abc").await.unwrap();
        repo.set(SessionKey::LastEmail, "ana@example.com").await.unwrap();

        let record = repo.load_record().await.unwrap();
        assert_eq!(record.user_token.as_deref(), Some("abc"));
        assert_eq!(record.admin_token, None);
        assert_eq!(record.role(), Role::Collaborator);

        repo.remove(SessionKey::UserToken).await.unwrap();
        repo.remove(SessionKey::UserToken).await.unwrap();
        let record = repo.load_record().await.unwrap();
        assert_eq!(record.role(), Role::Anonymous);
        assert_eq!(record.last_email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn debug_redacts_tokens() {
        let record = SessionRecord {
            admin_token: Some("secret-admin".into()),
            user_token: None,
            last_email: None,
        };
        let rendered = format!("{record:?}");
        assert!(!rendered.contains("secret-admin"));
        assert_eq!(record.role(), Role::Admin);
    }
}

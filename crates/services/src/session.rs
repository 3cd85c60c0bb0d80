use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use portal_core::model::{Credentials, Role};
use storage::repository::{SessionKey, SessionRecord, SessionRepository};

use crate::api::{BearerToken, PortalApi};
use crate::error::SessionServiceError;

/// Tokens and identity the client currently holds.
#[derive(Clone, Default)]
pub struct SessionContext {
    admin_token: Option<SecretString>,
    user_token: Option<SecretString>,
    last_email: Option<String>,
    role: Role,
}

impl SessionContext {
    #[must_use]
    pub fn from_record(record: SessionRecord) -> Self {
        let role = record.role();
        Self {
            admin_token: record.admin_token.map(SecretString::new),
            user_token: record.user_token.map(SecretString::new),
            last_email: record.last_email,
            role,
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn last_email(&self) -> Option<&str> {
        self.last_email.as_deref()
    }

    #[must_use]
    pub fn has_user_token(&self) -> bool {
        self.user_token.is_some()
    }

    #[must_use]
    pub fn has_admin_token(&self) -> bool {
        self.admin_token.is_some()
    }

    /// Token sent with requests; the admin token wins when both are present.
    #[must_use]
    pub fn bearer(&self) -> Option<&SecretString> {
        self.admin_token.as_ref().or(self.user_token.as_ref())
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("admin_token", &self.admin_token.is_some())
            .field("user_token", &self.user_token.is_some())
            .field("last_email", &self.last_email)
            .field("role", &self.role)
            .finish()
    }
}

/// Login, logout and persistence of the client session.
#[derive(Clone)]
pub struct SessionService {
    api: Arc<dyn PortalApi>,
    sessions: Arc<dyn SessionRepository>,
    bearer: BearerToken,
    current: Arc<RwLock<SessionContext>>,
}

impl SessionService {
    #[must_use]
    pub fn new(
        api: Arc<dyn PortalApi>,
        sessions: Arc<dyn SessionRepository>,
        bearer: BearerToken,
    ) -> Self {
        Self {
            api,
            sessions,
            bearer,
            current: Arc::new(RwLock::new(SessionContext::default())),
        }
    }

    /// Last context produced by `load` or a login/logout.
    #[must_use]
    pub fn current(&self) -> SessionContext {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rebuild the context from persisted state and refresh the bearer token.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if the session store cannot be read.
    pub async fn load(&self) -> Result<SessionContext, SessionServiceError> {
        let record = self.sessions.load_record().await?;
        let context = SessionContext::from_record(record);
        self.bearer.set(context.bearer().cloned());
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = context.clone();
        Ok(context)
    }

    /// Sign a collaborator in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Validation` for blank input (no request is
    /// made), `Api` if the server rejects the credentials, or `Storage`.
    pub async fn login_collaborator(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionContext, SessionServiceError> {
        let credentials = Credentials::new(email, password)?;
        let token = self.api.obtain_token(&credentials).await?;
        self.sessions
            .set(SessionKey::UserToken, token.expose_secret())
            .await?;
        self.sessions
            .set(SessionKey::LastEmail, credentials.username())
            .await?;
        info!(email = credentials.username(), "collaborator signed in");
        self.load().await
    }

    /// Sign an administrator in.
    ///
    /// # Errors
    ///
    /// Same as `login_collaborator`.
    pub async fn login_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionContext, SessionServiceError> {
        let credentials = Credentials::new(username, password)?;
        let token = self.api.obtain_token(&credentials).await?;
        self.sessions
            .set(SessionKey::AdminToken, token.expose_secret())
            .await?;
        info!(username = credentials.username(), "admin signed in");
        self.load().await
    }

    /// Drop the collaborator token and remembered email.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if the store cannot be written.
    pub async fn logout_collaborator(&self) -> Result<SessionContext, SessionServiceError> {
        self.sessions.remove(SessionKey::UserToken).await?;
        self.sessions.remove(SessionKey::LastEmail).await?;
        info!("collaborator signed out");
        self.load().await
    }

    /// Drop the admin token; a collaborator session, if any, remains.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if the store cannot be written.
    pub async fn logout_admin(&self) -> Result<SessionContext, SessionServiceError> {
        self.sessions.remove(SessionKey::AdminToken).await?;
        info!("admin signed out");
        self.load().await
    }
}

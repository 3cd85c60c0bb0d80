//! Shared error types for the services crate.

use reqwest::StatusCode;
use thiserror::Error;

use portal_core::model::{ClientSettingsError, ModuleId, TrainingId, ValidationError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by a `PortalApi` implementation.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("request failed with status {0}")]
    HttpStatus(StatusCode),
    #[error("not authorized")]
    Unauthorized,
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error(transparent)]
    Config(#[from] ClientSettingsError),
}

impl ApiError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::HttpStatus(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Unauthorized | Self::Decode(_) | Self::Config(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status)
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl ApiError {
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            Self::Unauthorized
        } else {
            Self::HttpStatus(status)
        }
    }
}

/// Errors emitted by `SessionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    /// A read failed; `message` is the text shown to the user.
    #[error("{message}")]
    Load {
        message: &'static str,
        #[source]
        source: ApiError,
    },
    #[error("training {0} is not in the catalog")]
    UnknownTraining(TrainingId),
    #[error("module {module_id} does not belong to training {training_id}")]
    UnknownModule {
        training_id: TrainingId,
        module_id: ModuleId,
    },
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `AdminService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdminServiceError {
    #[error("{message}")]
    Load {
        message: &'static str,
        #[source]
        source: ApiError,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted while bootstrapping the portal client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PortalClientError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionServiceError),
}

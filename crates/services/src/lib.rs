#![forbid(unsafe_code)]

pub mod admin;
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod loader;
pub mod mutation_queue;
pub mod progress;
pub mod session;

pub use portal_core::Clock;

pub use admin::{AdminCatalog, AdminService};
pub use api::{BearerToken, HttpPortalApi, PortalApi, TrainingWrite};
pub use client::PortalClient;
pub use config::ApiConfig;
pub use error::{
    AdminServiceError, ApiError, PortalClientError, ProgressServiceError, SessionServiceError,
};
pub use loader::ResourceLoader;
pub use mutation_queue::{MutationQueue, RetryPolicy};
pub use progress::{ModuleView, ProgressService, TrainingDetail};
pub use session::{SessionContext, SessionService};

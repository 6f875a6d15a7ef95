//! External service interfaces
//!
//! The core talks to the build service, the hosting service and the operator
//! only through these traits. Concrete HTTP clients live in `rotor-client`;
//! the prompt lives in the CLI.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::hook::Hook;
use crate::domain::repository::Repository;
use crate::dto::pipeline::PipelineRecord;

/// Error type returned by service implementations
pub type ServiceError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by service implementations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// The build service that owns pipelines and their webhook secrets
#[async_trait]
pub trait BuildService: Send + Sync {
    /// List every pipeline of an organization
    async fn list_pipelines(&self, org: &str) -> ServiceResult<Vec<PipelineRecord>>;

    /// Replace a pipeline's webhook secret, returning the new delivery URL
    ///
    /// Not idempotent: every call invalidates the previous URL.
    async fn rotate_webhook(&self, pipeline_id: &str) -> ServiceResult<String>;
}

/// The hosting service that owns repositories and their hook registrations
#[async_trait]
pub trait HostingService: Send + Sync {
    /// List all hooks registered on a repository
    async fn list_hooks(&self, repository: &Repository) -> ServiceResult<Vec<Hook>>;

    /// Overwrite the delivery URL of a hook
    async fn update_hook_url(
        &self,
        repository: &Repository,
        hook_id: u64,
        url: &str,
    ) -> ServiceResult<()>;
}

/// Yes/no question put to the operator
pub trait Confirmation {
    fn confirm(&self, question: &str, default: bool) -> ServiceResult<bool>;
}

/// Confirmation that accepts every question without asking
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirmation for AlwaysConfirm {
    fn confirm(&self, _question: &str, _default: bool) -> ServiceResult<bool> {
        Ok(true)
    }
}

/// Both API clients for a run, created once and shared for its duration
#[derive(Clone)]
pub struct ServiceContext {
    pub build: Arc<dyn BuildService>,
    pub hosting: Arc<dyn HostingService>,
}

impl ServiceContext {
    pub fn new(build: Arc<dyn BuildService>, hosting: Arc<dyn HostingService>) -> Self {
        Self { build, hosting }
    }
}

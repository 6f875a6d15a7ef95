//! Pipeline DTOs returned by the build service

use serde::{Deserialize, Serialize};

/// Provider type name of pipelines backed by GitHub
pub const GITHUB_PROVIDER: &str = "RepositoryProviderGithub";

/// A pipeline row as listed by the build service, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRecord {
    pub id: String,
    pub slug: String,
    pub url: String,
    /// GraphQL `__typename` of the repository provider
    pub provider_type: String,
    /// Only present for providers that deliver through webhooks
    pub webhook_url: Option<String>,
    pub repository_url: String,
}

impl PipelineRecord {
    pub fn is_github(&self) -> bool {
        self.provider_type == GITHUB_PROVIDER
    }
}

//! Correspondence between pipelines and hosting-side hooks
//!
//! Pipelines and hooks share no identifier. The only link is the webhook
//! token, so every discovered hook is indexed by the token of its delivery
//! URL. The map is built completely, for every repository in the catalog,
//! before anything is mutated: rotating one pipeline must not change what
//! the next pipeline sees.

use std::collections::HashMap;
use tracing::info;

use crate::catalog::PipelineCatalog;
use crate::discovery::discover_hooks;
use crate::domain::hook::{Hook, RepositoryHook};
use crate::domain::repository::Repository;
use crate::error::Result;
use crate::service::HostingService;
use crate::token::{WebhookHosts, WebhookToken};

/// Token → hooks index over every repository in a catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrespondenceMap {
    by_token: HashMap<WebhookToken, Vec<RepositoryHook>>,
    by_repository: HashMap<Repository, Vec<Hook>>,
}

impl CorrespondenceMap {
    /// Discover hooks for every repository in the catalog and index them
    ///
    /// Each repository is listed once even when several pipelines build it.
    ///
    /// # Errors
    /// Fails on the first discovery error, or if a discovered hook URL cannot
    /// be tokenized.
    pub async fn build(
        catalog: &PipelineCatalog,
        hosting: &dyn HostingService,
        hosts: &WebhookHosts,
    ) -> Result<Self> {
        let mut map = Self::default();

        for repository in catalog.repositories() {
            let hooks = discover_hooks(hosting, repository, hosts).await?;
            map.insert(repository, hooks)?;
        }

        info!(
            "Indexed {} webhook token(s) across {} repositories",
            map.token_count(),
            map.repository_count()
        );

        Ok(map)
    }

    /// Record the discovered hooks of one repository
    pub fn insert(&mut self, repository: &Repository, hooks: Vec<Hook>) -> Result<()> {
        for hook in &hooks {
            let Some(token) = hook.token() else {
                continue;
            };
            self.by_token
                .entry(token?)
                .or_default()
                .push(RepositoryHook::new(repository.clone(), hook.clone()));
        }

        self.by_repository.insert(repository.clone(), hooks);
        Ok(())
    }

    /// Hooks whose delivery URL carries this token, in discovery order
    pub fn matches(&self, token: &WebhookToken) -> &[RepositoryHook] {
        self.by_token.get(token).map(Vec::as_slice).unwrap_or_default()
    }

    /// Build-service hooks discovered on a repository
    pub fn hooks_for(&self, repository: &Repository) -> &[Hook] {
        self.by_repository
            .get(repository)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Hooks on a repository that no pipeline in the catalog points at
    ///
    /// A hook whose URL cannot be tokenized counts as unreferenced.
    pub fn orphans<'a>(
        &'a self,
        repository: &Repository,
        catalog: &PipelineCatalog,
    ) -> Vec<&'a Hook> {
        self.hooks_for(repository)
            .iter()
            .filter(|hook| match hook.token() {
                Some(Ok(token)) => !catalog.references(&token),
                _ => true,
            })
            .collect()
    }

    pub fn repository_count(&self) -> usize {
        self.by_repository.len()
    }

    pub fn token_count(&self) -> usize {
        self.by_token.len()
    }
}

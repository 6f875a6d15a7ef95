//! Hook discovery
//!
//! Lists a repository's hooks and keeps the ones delivering to the build
//! service.

use tracing::{debug, info};

use crate::domain::hook::Hook;
use crate::domain::repository::Repository;
use crate::error::{Result, RotorError};
use crate::service::HostingService;
use crate::token::WebhookHosts;

/// Find the build-service hooks registered on a repository
///
/// Hooks without a delivery URL, or whose URL host is not in `hosts`, are
/// left out. API failures are returned as [`RotorError::Discovery`] without
/// retrying.
pub async fn discover_hooks(
    hosting: &dyn HostingService,
    repository: &Repository,
    hosts: &WebhookHosts,
) -> Result<Vec<Hook>> {
    info!("Finding webhooks for {}", repository.html_url());

    let hooks = hosting
        .list_hooks(repository)
        .await
        .map_err(|source| RotorError::Discovery {
            repository: repository.to_string(),
            source,
        })?;

    let total = hooks.len();
    let matching: Vec<Hook> = hooks
        .into_iter()
        .filter(|hook| hook.url().is_some_and(|url| hosts.matches(url)))
        .collect();

    debug!(
        "{}: {} of {} hook(s) deliver to the build service",
        repository,
        matching.len(),
        total
    );

    Ok(matching)
}

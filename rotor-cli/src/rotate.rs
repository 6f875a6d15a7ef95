//! Rotation run
//!
//! Wires the API clients into the core: load the catalog, discover every
//! repository's hooks, then hand both to the orchestrator.

use anyhow::{Context, Result};
use rotor_client::{BuildkiteClient, GithubClient};
use rotor_core::{CorrespondenceMap, Orchestrator, PipelineCatalog, RunSummary, ServiceContext};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::prompt::TerminalConfirmation;
use crate::report::ConsoleReporter;

/// Create both API clients for the run
pub fn connect(config: &Config) -> ServiceContext {
    ServiceContext::new(
        Arc::new(BuildkiteClient::with_endpoint(
            &config.graphql_url,
            &config.graphql_token,
        )),
        Arc::new(GithubClient::with_base_url(
            &config.github_api_url,
            &config.github_token,
        )),
    )
}

/// Discover and rotate every pipeline of the configured organization
pub async fn run(config: &Config) -> Result<RunSummary> {
    let services = connect(config);
    let hosts = config.hosts();

    info!(
        "Building a map of GitHub repositories with Buildkite webhooks for {}",
        config.organization
    );

    let catalog = PipelineCatalog::load(
        services.build.as_ref(),
        &config.organization,
        config.pipeline.as_deref(),
    )
    .await?;

    if catalog.is_empty() {
        if let Some(slug) = &config.pipeline {
            anyhow::bail!(
                "no GitHub pipeline named {} in {}",
                slug,
                config.organization
            );
        }
        return Ok(RunSummary::default());
    }
    info!("Found {} GitHub pipeline(s)", catalog.len());

    let map = CorrespondenceMap::build(&catalog, services.hosting.as_ref(), &hosts).await?;
    println!();

    let reporter = ConsoleReporter::new(hosts);
    let confirmation = TerminalConfirmation;
    let orchestrator = Orchestrator::new(
        services,
        config.rotation_options(),
        &reporter,
        &confirmation,
    );

    orchestrator
        .run(&catalog, &map)
        .await
        .with_context(|| format!("Rotation stopped for {}", config.organization))
}

//! Rotor CLI
//!
//! Rotates Buildkite pipeline webhook URLs and updates every GitHub hook
//! that delivers to them.

mod config;
mod prompt;
mod report;
mod rotate;

use clap::{ArgAction, Parser};
use rotor_client::{DEFAULT_API_URL, DEFAULT_GRAPHQL_URL};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "rotor")]
#[command(about = "Rotate Buildkite webhooks and update matching GitHub hooks", long_about = None)]
struct Cli {
    /// The Buildkite organization
    #[arg(long, env = "BUILDKITE_ORG")]
    buildkite_org: String,

    /// A Buildkite API token with GraphQL access
    #[arg(long, env = "BUILDKITE_GRAPHQL_TOKEN", hide_env_values = true)]
    graphql_token: String,

    /// A GitHub personal access token with `admin:repo_hook`
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: String,

    /// Whether to prompt before each rotate
    #[arg(
        long,
        env = "ROTOR_PROMPT",
        default_value_t = true,
        action = ArgAction::Set,
        value_name = "BOOL"
    )]
    prompt: bool,

    /// A specific pipeline slug to rotate
    #[arg(long, env = "ROTOR_PIPELINE")]
    pipeline: Option<String>,

    /// Extra webhook delivery host to recognise (repeatable)
    #[arg(long = "webhook-host", value_name = "HOST")]
    webhook_hosts: Vec<String>,

    /// Buildkite GraphQL endpoint
    #[arg(long, env = "BUILDKITE_GRAPHQL_URL", default_value = DEFAULT_GRAPHQL_URL)]
    graphql_url: String,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    github_api_url: String,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            organization: cli.buildkite_org,
            graphql_token: cli.graphql_token,
            github_token: cli.github_token,
            prompt: cli.prompt,
            pipeline: cli.pipeline,
            webhook_hosts: cli.webhook_hosts,
            graphql_url: cli.graphql_url,
            github_api_url: cli.github_api_url,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rotor_cli=info,rotor_core=info,rotor_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from(Cli::parse());
    if let Err(e) = config.validate() {
        return report::print_failure(&e);
    }
    tracing::debug!("Loaded configuration: {:?}", config);

    match rotate::run(&config).await {
        Ok(summary) => {
            report::print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => report::print_failure(&e),
    }
}

//! Rotor HTTP Clients
//!
//! Type-safe HTTP clients for the two services a rotation touches:
//! - [`BuildkiteClient`]: the Buildkite GraphQL API (pipeline listing, webhook rotation)
//! - [`GithubClient`]: the GitHub REST API (hook listing and updates)
//!
//! Both implement the service traits from `rotor-core`, so the orchestrator
//! never sees HTTP details.
//!
//! # Example
//!
//! ```no_run
//! use rotor_client::{BuildkiteClient, GithubClient};
//! use rotor_core::domain::repository::Repository;
//!
//! # async fn example() -> Result<(), rotor_client::ClientError> {
//! let buildkite = BuildkiteClient::new("graphql-token");
//! let github = GithubClient::new("github-token");
//!
//! let pipelines = buildkite.list_pipelines("acme").await?;
//! let repo = Repository::parse(&pipelines[0].repository_url).unwrap();
//! let hooks = github.list_hooks(&repo).await?;
//! println!("{} hook(s) on {}", hooks.len(), repo);
//! # Ok(())
//! # }
//! ```

mod buildkite;
pub mod error;
mod github;

pub use buildkite::{BuildkiteClient, DEFAULT_GRAPHQL_URL};
pub use error::{ClientError, Result};
pub use github::{DEFAULT_API_URL, GithubClient};

use serde::de::DeserializeOwned;

/// User agent sent with every request; GitHub rejects requests without one
pub const USER_AGENT: &str = concat!("rotor/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Response Handlers
// =============================================================================

/// Handle an API response and deserialize JSON
///
/// This checks the status code and returns an appropriate error if the
/// request failed, or deserializes the response body if successful.
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let response = check_status(response).await?;

    response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}

/// Handle an API response whose body is not needed
async fn handle_empty_response(response: reqwest::Response) -> Result<()> {
    check_status(response).await?;
    Ok(())
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    Ok(response)
}

/// Strip trailing slashes from a configured base URL
fn normalize_base_url(base_url: impl Into<String>) -> String {
    base_url.into().trim_end_matches('/').to_string()
}

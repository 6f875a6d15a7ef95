//! GitHub REST API
//!
//! Only repository hooks are used. The token needs `admin:repo_hook`.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, LINK, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use rotor_core::domain::hook::Hook;
use rotor_core::domain::repository::Repository;
use rotor_core::service::{HostingService, ServiceResult};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::error::Result;
use crate::{handle_empty_response, handle_response, normalize_base_url};

/// Default GitHub API base URL
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const PER_PAGE: u32 = 100;

/// HTTP client for the GitHub REST API
#[derive(Clone)]
pub struct GithubClient {
    /// Base URL of the API (e.g., "https://api.github.com")
    base_url: String,
    /// Personal access token
    token: String,
    /// HTTP client instance
    client: Client,
}

impl fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct HookConfigUpdate<'a> {
    url: &'a str,
}

impl GithubClient {
    /// Create a client for api.github.com
    ///
    /// # Example
    /// ```
    /// use rotor_client::GithubClient;
    ///
    /// let client = GithubClient::new("my-token");
    /// assert_eq!(client.base_url(), "https://api.github.com");
    /// ```
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_API_URL, token)
    }

    /// Create a client for a custom API base URL
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(base_url, token, Client::new())
    }

    /// Create a client with a custom HTTP client
    pub fn with_client(
        base_url: impl Into<String>,
        token: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            token: token.into(),
            client,
        }
    }

    /// Get the API base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List every hook registered on a repository
    ///
    /// Follows `Link: rel="next"` headers until all pages are read.
    pub async fn list_hooks(&self, repository: &Repository) -> Result<Vec<Hook>> {
        let mut hooks = Vec::new();
        let mut url = Some(format!(
            "{}?per_page={}",
            self.hooks_url(repository),
            PER_PAGE
        ));

        while let Some(page_url) = url {
            let response = self.request(self.client.get(&page_url)).send().await?;
            url = next_link(response.headers());

            let page: Vec<Hook> = handle_response(response).await?;
            debug!("Fetched {} hook(s) for {}", page.len(), repository);
            hooks.extend(page);
        }

        Ok(hooks)
    }

    /// Set the delivery URL of a hook
    ///
    /// Uses the hook config endpoint so content type and secret are kept.
    pub async fn update_hook_url(
        &self,
        repository: &Repository,
        hook_id: u64,
        url: &str,
    ) -> Result<()> {
        let endpoint = format!("{}/{}/config", self.hooks_url(repository), hook_id);
        debug!("PATCH {}", endpoint);

        let response = self
            .request(self.client.patch(&endpoint))
            .json(&HookConfigUpdate { url })
            .send()
            .await?;

        handle_empty_response(response).await
    }

    fn hooks_url(&self, repository: &Repository) -> String {
        format!(
            "{}/repos/{}/{}/hooks",
            self.base_url, repository.org, repository.name
        )
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header(USER_AGENT, crate::USER_AGENT)
    }
}

#[async_trait]
impl HostingService for GithubClient {
    async fn list_hooks(&self, repository: &Repository) -> ServiceResult<Vec<Hook>> {
        Ok(GithubClient::list_hooks(self, repository).await?)
    }

    async fn update_hook_url(
        &self,
        repository: &Repository,
        hook_id: u64,
        url: &str,
    ) -> ServiceResult<()> {
        Ok(GithubClient::update_hook_url(self, repository, hook_id, url).await?)
    }
}

/// Extract the `rel="next"` target from a `Link` header
///
/// `rel` may hold several space-separated relation types. Targets containing
/// a comma are not supported; GitHub never emits them.
fn next_link(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;

    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        if !params.split(';').any(is_next_rel) {
            return None;
        }
        target
            .trim()
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

fn is_next_rel(param: &str) -> bool {
    let Some((key, value)) = param.split_once('=') else {
        return false;
    };
    key.trim().eq_ignore_ascii_case("rel")
        && value
            .trim()
            .trim_matches('"')
            .split_whitespace()
            .any(|rel| rel.eq_ignore_ascii_case("next"))
}

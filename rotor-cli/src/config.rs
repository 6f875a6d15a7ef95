//! Configuration module
//!
//! Settings for a rotation run, assembled from command-line flags and
//! environment variables and validated before any network call.

use std::fmt;

use rotor_core::{RotationOptions, WebhookHosts};

/// CLI configuration
#[derive(Clone)]
pub struct Config {
    /// Buildkite organization slug
    pub organization: String,

    /// Buildkite GraphQL API token
    pub graphql_token: String,

    /// GitHub token with `admin:repo_hook`
    pub github_token: String,

    /// Ask before rotating each pipeline
    pub prompt: bool,

    /// Only rotate the pipeline with this slug
    pub pipeline: Option<String>,

    /// Delivery hosts recognised in addition to the built-in ones
    pub webhook_hosts: Vec<String>,

    /// Buildkite GraphQL endpoint
    pub graphql_url: String,

    /// GitHub API base URL
    pub github_api_url: String,
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.organization.trim().is_empty() {
            anyhow::bail!("buildkite organization cannot be empty");
        }

        if self.graphql_token.trim().is_empty() {
            anyhow::bail!("graphql token cannot be empty");
        }

        if self.github_token.trim().is_empty() {
            anyhow::bail!("github token cannot be empty");
        }

        for (name, url) in [
            ("graphql_url", &self.graphql_url),
            ("github_api_url", &self.github_api_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if self.pipeline.as_deref().is_some_and(|p| p.trim().is_empty()) {
            anyhow::bail!("pipeline filter cannot be empty");
        }

        if self.webhook_hosts.iter().any(|h| h.trim().is_empty() || h.contains('/')) {
            anyhow::bail!("webhook hosts must be bare host names");
        }

        Ok(())
    }

    /// Known delivery hosts, including any extra ones
    pub fn hosts(&self) -> WebhookHosts {
        self.webhook_hosts
            .iter()
            .fold(WebhookHosts::default(), |hosts, host| hosts.with_host(host))
    }

    pub fn rotation_options(&self) -> RotationOptions {
        RotationOptions {
            confirm: self.prompt,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("organization", &self.organization)
            .field("graphql_token", &"<redacted>")
            .field("github_token", &"<redacted>")
            .field("prompt", &self.prompt)
            .field("pipeline", &self.pipeline)
            .field("webhook_hosts", &self.webhook_hosts)
            .field("graphql_url", &self.graphql_url)
            .field("github_api_url", &self.github_api_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            organization: "acme".to_string(),
            graphql_token: "bk-token".to_string(),
            github_token: "gh-token".to_string(),
            prompt: true,
            pipeline: None,
            webhook_hosts: vec![],
            graphql_url: rotor_client::DEFAULT_GRAPHQL_URL.to_string(),
            github_api_url: rotor_client::DEFAULT_API_URL.to_string(),
        }
    }

    #[test]
    fn test_config_validation() {
        let mut config = config();

        // Valid config should pass
        assert!(config.validate().is_ok());

        // Empty organization should fail
        config.organization = String::new();
        assert!(config.validate().is_err());
        config.organization = "acme".to_string();

        // Missing token should fail
        config.github_token = "  ".to_string();
        assert!(config.validate().is_err());
        config.github_token = "gh-token".to_string();

        // Invalid URL should fail
        config.github_api_url = "api.github.com".to_string();
        assert!(config.validate().is_err());
        config.github_api_url = "https://api.github.com".to_string();

        // Empty pipeline filter should fail
        config.pipeline = Some(String::new());
        assert!(config.validate().is_err());
        config.pipeline = Some("web".to_string());

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_webhook_host_validation() {
        let mut config = config();
        config.webhook_hosts = vec!["https://hooks.example.com/x".to_string()];
        assert!(config.validate().is_err());

        config.webhook_hosts = vec!["hooks.example.com".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hosts_extends_defaults() {
        let mut config = config();
        config.webhook_hosts = vec!["hooks.example.com".to_string()];

        let hosts = config.hosts();

        assert!(hosts.matches("https://hooks.example.com/deliver/abc"));
        assert!(hosts.matches("https://webhook.buildkite.com/deliver/abc"));
    }

    #[test]
    fn test_rotation_options_follow_prompt() {
        let mut config = config();
        assert!(config.rotation_options().confirm);

        config.prompt = false;
        assert!(!config.rotation_options().confirm);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", config());
        assert!(!debug.contains("bk-token"));
        assert!(!debug.contains("gh-token"));
        assert!(debug.contains("acme"));
    }
}

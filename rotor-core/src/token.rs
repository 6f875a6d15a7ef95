//! Webhook tokens
//!
//! The build service has changed its delivery hostname and path prefix over
//! the years, but the trailing path segment has always been the secret:
//!
//! ```text
//! https://webhook.buildbox.io/github/<token>
//! https://webhook.buildkite.com/github/<token>
//! https://webhook.buildkite.com/deliver/<token>
//! ```
//!
//! Webhooks on both systems are therefore compared on that segment alone.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::error::{Result, RotorError};

/// The stable comparison key extracted from a webhook delivery URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebhookToken(String);

impl WebhookToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WebhookToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the webhook token from a delivery URL
///
/// Scheme, host and every leading path segment are ignored. A trailing slash
/// does not count as a segment.
///
/// # Errors
/// Returns [`RotorError::Parse`] if the input is not an absolute URL or has
/// no path segment to use as a token.
pub fn extract_token(webhook_url: &str) -> Result<WebhookToken> {
    let url = Url::parse(webhook_url).map_err(|e| RotorError::parse(webhook_url, e.to_string()))?;

    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|segment| WebhookToken(segment.to_string()))
        .ok_or_else(|| RotorError::parse(webhook_url, "URL has no path segment to use as a token"))
}

/// A known shape of build-service delivery URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookFormat {
    pub host: String,
    pub path_prefix: String,
}

impl WebhookFormat {
    pub fn new(host: impl Into<String>, path_prefix: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path_prefix: path_prefix.into(),
        }
    }
}

/// Table of delivery URL formats used to recognise build-service hooks
///
/// Hosting-side hooks whose URL host is not listed here belong to other
/// integrations and are never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookHosts {
    formats: Vec<WebhookFormat>,
}

impl Default for WebhookHosts {
    fn default() -> Self {
        Self {
            formats: vec![
                WebhookFormat::new("webhook.buildbox.io", "/github/"),
                WebhookFormat::new("webhook.buildkite.com", "/github/"),
                WebhookFormat::new("webhook.buildkite.com", "/deliver/"),
            ],
        }
    }
}

impl WebhookHosts {
    /// Create an empty table
    pub fn empty() -> Self {
        Self {
            formats: Vec::new(),
        }
    }

    /// Add a format to the table
    pub fn with_format(mut self, format: WebhookFormat) -> Self {
        if !self.formats.contains(&format) {
            self.formats.push(format);
        }
        self
    }

    /// Add a host that accepts any path prefix
    pub fn with_host(self, host: impl Into<String>) -> Self {
        self.with_format(WebhookFormat::new(host, "/"))
    }

    pub fn formats(&self) -> &[WebhookFormat] {
        &self.formats
    }

    /// Check whether a delivery URL points at a known build-service host
    ///
    /// Host comparison is case-insensitive. Unparseable URLs never match.
    pub fn matches(&self, webhook_url: &str) -> bool {
        let Ok(url) = Url::parse(webhook_url) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };

        self.formats
            .iter()
            .any(|format| format.host.eq_ignore_ascii_case(host))
    }

    /// Find the format a delivery URL was issued in, if it is a known one
    pub fn format_of(&self, webhook_url: &str) -> Option<&WebhookFormat> {
        let url = Url::parse(webhook_url).ok()?;
        let host = url.host_str()?;

        self.formats.iter().find(|format| {
            format.host.eq_ignore_ascii_case(host) && url.path().starts_with(&format.path_prefix)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn test_historical_formats_share_token() {
        let urls = [
            format!("https://webhook.buildbox.io/github/{TOKEN}"),
            format!("https://webhook.buildkite.com/github/{TOKEN}"),
            format!("https://webhook.buildkite.com/deliver/{TOKEN}"),
        ];

        let tokens: Vec<_> = urls.iter().map(|u| extract_token(u).unwrap()).collect();

        assert!(tokens.iter().all(|t| t.as_str() == TOKEN));
    }

    #[test]
    fn test_trailing_slash_ignored() {
        let token = extract_token("https://webhook.buildkite.com/deliver/abc123/").unwrap();
        assert_eq!(token.as_str(), "abc123");
    }

    #[test]
    fn test_query_string_ignored() {
        let token = extract_token("https://webhook.buildkite.com/deliver/abc123?x=1").unwrap();
        assert_eq!(token.as_str(), "abc123");
    }

    #[test]
    fn test_invalid_url_is_parse_error() {
        let result = extract_token("not a url");
        assert!(matches!(result, Err(RotorError::Parse { .. })));
    }

    #[test]
    fn test_url_without_path_is_parse_error() {
        let result = extract_token("https://webhook.buildkite.com/");
        assert!(matches!(result, Err(RotorError::Parse { .. })));
    }

    #[test]
    fn test_default_hosts_match_known_urls() {
        let hosts = WebhookHosts::default();

        assert!(hosts.matches("https://webhook.buildbox.io/github/abc"));
        assert!(hosts.matches("https://webhook.buildkite.com/deliver/abc"));
        assert!(hosts.matches("https://WEBHOOK.BUILDKITE.COM/deliver/abc"));
        assert!(!hosts.matches("https://hooks.slack.com/services/abc"));
        assert!(!hosts.matches("garbage"));
    }

    #[test]
    fn test_host_table_is_extensible() {
        let hosts = WebhookHosts::default().with_host("hooks.example.com");

        assert!(hosts.matches("https://hooks.example.com/anything/abc"));
        assert_eq!(hosts.formats().len(), 4);
    }

    #[test]
    fn test_with_format_deduplicates() {
        let hosts = WebhookHosts::default()
            .with_format(WebhookFormat::new("webhook.buildkite.com", "/deliver/"));

        assert_eq!(hosts.formats().len(), 3);
    }

    #[test]
    fn test_format_of() {
        let hosts = WebhookHosts::default();

        let format = hosts
            .format_of("https://webhook.buildkite.com/github/abc")
            .unwrap();
        assert_eq!(format.path_prefix, "/github/");

        assert!(hosts.format_of("https://webhook.buildkite.com/other/abc").is_none());
        assert!(WebhookHosts::empty().format_of("https://webhook.buildkite.com/deliver/abc").is_none());
    }
}

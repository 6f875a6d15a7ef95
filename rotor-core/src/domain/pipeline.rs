//! Pipeline domain types

use serde::{Deserialize, Serialize};
use std::fmt;

use super::repository::Repository;
use crate::token::WebhookToken;

/// A build pipeline backed by a GitHub repository
///
/// The webhook URL and token describe the secret at discovery time and go
/// stale as soon as the pipeline is rotated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: String,
    pub org: String,
    pub slug: String,
    /// Web URL of the pipeline on the build service
    pub url: String,
    pub webhook_url: String,
    pub webhook_token: WebhookToken,
    pub repository: Repository,
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.slug)
    }
}

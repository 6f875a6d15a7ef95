//! Hook domain types

use serde::{Deserialize, Serialize};
use std::fmt;

use super::repository::Repository;
use crate::error::Result;
use crate::token::{WebhookToken, extract_token};

/// A webhook registration on the hosting service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hook {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub config: HookConfig,
}

/// Delivery configuration of a hook
///
/// Only the delivery URL is read or written; other fields are carried along.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Hook {
    /// Registered delivery URL, if the hook has one
    pub fn url(&self) -> Option<&str> {
        self.config.url.as_deref()
    }

    /// Webhook token of the delivery URL
    ///
    /// A hook without a delivery URL has no token.
    pub fn token(&self) -> Option<Result<WebhookToken>> {
        self.url().map(extract_token)
    }
}

/// A hook together with the repository it is registered on
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryHook {
    pub repository: Repository,
    pub hook: Hook,
}

impl RepositoryHook {
    pub fn new(repository: Repository, hook: Hook) -> Self {
        Self { repository, hook }
    }

    pub fn hook_ref(&self) -> HookRef {
        HookRef {
            repository: self.repository.clone(),
            hook_id: self.hook.id,
        }
    }
}

/// Lightweight reference to a hook, used in reports and errors
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookRef {
    pub repository: Repository,
    pub hook_id: u64,
}

impl HookRef {
    /// Settings page where the hook can be edited by hand
    pub fn settings_url(&self) -> String {
        format!("{}/settings/hooks/{}", self.repository.html_url(), self.hook_id)
    }
}

impl fmt::Display for HookRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repository, self.hook_id)
    }
}

//! Repository domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use url::Url;

use crate::error::{Result, RotorError};

/// A repository on the hosting service
///
/// Identity is organization + name; the remote it was parsed from is kept
/// for display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub org: String,
    pub name: String,
    pub remote: String,
}

impl Repository {
    pub fn new(org: impl Into<String>, name: impl Into<String>, remote: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            name: name.into(),
            remote: remote.into(),
        }
    }

    /// Parse a git remote into a repository
    ///
    /// Accepts URL remotes (`https://`, `ssh://`, `git://`) and scp-like
    /// remotes such as `git@github.com:org/name.git`. A trailing `.git` is
    /// dropped; everything after the organization becomes the name.
    ///
    /// # Errors
    /// Returns [`RotorError::Parse`] if the remote is not a URL or fewer than
    /// two path segments remain.
    pub fn parse(remote: &str) -> Result<Self> {
        let url = parse_gittable_url(remote)?;

        let path = url.path();
        let path = path.strip_suffix(".git").unwrap_or(path);
        let path = path.trim_start_matches('/');

        match path.split_once('/') {
            Some((org, name)) if !org.is_empty() && !name.is_empty() => {
                Ok(Self::new(org, name, remote))
            }
            _ => Err(RotorError::parse(
                remote,
                "expected an organization and repository name",
            )),
        }
    }

    /// Web URL of the repository on GitHub
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}", self)
    }
}

/// Normalize a git remote to a URL
///
/// scp-like remotes (`[user@]host:path`) become `ssh://[user@]host/path`.
fn parse_gittable_url(remote: &str) -> Result<Url> {
    let remote = remote.trim();

    if remote.contains("://") {
        return Url::parse(remote).map_err(|e| RotorError::parse(remote, e.to_string()));
    }

    let Some((authority, path)) = remote.split_once(':') else {
        return Err(RotorError::parse(remote, "not a git remote URL"));
    };
    if authority.is_empty() || authority.contains('/') {
        return Err(RotorError::parse(remote, "not a git remote URL"));
    }

    let normalized = format!("ssh://{}/{}", authority, path.trim_start_matches('/'));
    Url::parse(&normalized).map_err(|e| RotorError::parse(remote, e.to_string()))
}

impl PartialEq for Repository {
    fn eq(&self, other: &Self) -> bool {
        self.org == other.org && self.name == other.name
    }
}

impl Eq for Repository {}

impl Hash for Repository {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.org.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.name)
    }
}

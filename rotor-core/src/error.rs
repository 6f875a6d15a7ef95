//! Error types for webhook rotation
//!
//! Every variant is fatal for the run. They differ in what state they leave
//! behind: only [`RotorError::PartiallyPropagated`] is raised after the build
//! service has already accepted a new secret.

use thiserror::Error;

use crate::domain::hook::HookRef;
use crate::orchestrator::PipelineState;
use crate::service::ServiceError;

/// Result type alias for rotation operations
pub type Result<T> = std::result::Result<T, RotorError>;

/// Errors that can occur while discovering or rotating webhooks
#[derive(Debug, Error)]
pub enum RotorError {
    /// A webhook URL or repository remote did not have the expected shape
    #[error("failed to parse {input:?}: {reason}")]
    Parse {
        /// The offending input
        input: String,
        /// What was wrong with it
        reason: String,
    },

    /// A pipeline record could not be turned into a rotatable pipeline
    #[error("invalid pipeline {pipeline}: {source}")]
    InvalidPipeline {
        /// `org/slug` of the offending pipeline
        pipeline: String,
        #[source]
        source: Box<RotorError>,
    },

    /// The pipeline catalog query failed
    #[error("error getting pipelines for {organization}: {source}")]
    Catalog {
        organization: String,
        #[source]
        source: ServiceError,
    },

    /// Listing hooks for a repository failed
    #[error("error getting webhooks for {repository}: {source}")]
    Discovery {
        repository: String,
        #[source]
        source: ServiceError,
    },

    /// The verification update was rejected before rotation
    #[error("can't update webhook {hook} for {pipeline}, permissions perhaps? {source}")]
    Permission {
        pipeline: String,
        hook: HookRef,
        #[source]
        source: ServiceError,
    },

    /// The build service refused to rotate the webhook
    #[error("error rotating webhook for {pipeline}: {source}")]
    Rotation {
        pipeline: String,
        #[source]
        source: ServiceError,
    },

    /// Rotation succeeded but at least one hook still holds the old URL
    #[error("{0}")]
    PartiallyPropagated(Box<PartialPropagation>),

    /// The operator prompt could not be shown or read
    #[error("confirmation prompt failed: {source}")]
    Prompt {
        #[source]
        source: ServiceError,
    },

    /// A pipeline attempted a state change the rotation sequence forbids
    #[error("invalid pipeline state transition {from:?} -> {to:?}")]
    InvalidTransition { from: PipelineState, to: PipelineState },
}

/// Details of a rotation whose propagation stopped part way
#[derive(Debug, Error)]
#[error(
    "error updating webhooks for {pipeline} after rotation, {} hook(s) unresolved: {source}",
    .unresolved.len()
)]
pub struct PartialPropagation {
    /// Pipeline whose secret was rotated
    pub pipeline: String,
    /// Delivery URL the build service now expects
    pub new_webhook_url: String,
    /// Hooks that already carry the new URL
    pub updated: Vec<HookRef>,
    /// The failing hook followed by every hook not yet attempted
    pub unresolved: Vec<HookRef>,
    #[source]
    pub source: ServiceError,
}

impl RotorError {
    /// Create a parse error from the input and a reason
    pub fn parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Attach the `org/slug` of the pipeline being processed
    pub fn in_pipeline(self, pipeline: impl Into<String>) -> Self {
        Self::InvalidPipeline {
            pipeline: pipeline.into(),
            source: Box::new(self),
        }
    }

    /// Check if this error left the build service and hosting service out of sync
    pub fn is_partial_propagation(&self) -> bool {
        matches!(self, Self::PartiallyPropagated(_))
    }

    /// Check if the failing pipeline is still in its pre-rotation state
    pub fn is_safe(&self) -> bool {
        !self.is_partial_propagation()
    }

    /// Get the partial propagation details, if any
    pub fn partial_propagation(&self) -> Option<&PartialPropagation> {
        match self {
            Self::PartiallyPropagated(partial) => Some(partial),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::Repository;

    fn hook_ref(id: u64) -> HookRef {
        HookRef {
            repository: Repository::new("acme", "widgets", "git@github.com:acme/widgets.git"),
            hook_id: id,
        }
    }

    #[test]
    fn test_partial_propagation_is_not_safe() {
        let err = RotorError::PartiallyPropagated(Box::new(PartialPropagation {
            pipeline: "acme/widgets".to_string(),
            new_webhook_url: "https://webhook.buildkite.com/deliver/new".to_string(),
            updated: vec![hook_ref(1)],
            unresolved: vec![hook_ref(2)],
            source: "boom".into(),
        }));

        assert!(err.is_partial_propagation());
        assert!(!err.is_safe());
        assert_eq!(err.partial_propagation().map(|p| p.unresolved.len()), Some(1));
        assert!(err.to_string().contains("1 hook(s) unresolved"));
    }

    #[test]
    fn test_rotation_error_is_safe() {
        let err = RotorError::Rotation {
            pipeline: "acme/widgets".to_string(),
            source: "denied".into(),
        };

        assert!(err.is_safe());
        assert!(err.partial_propagation().is_none());
        assert_eq!(
            err.to_string(),
            "error rotating webhook for acme/widgets: denied"
        );
    }

    #[test]
    fn test_in_pipeline_names_pipeline_and_input() {
        let err = RotorError::parse("https://github.com/acme", "expected an organization and repository name")
            .in_pipeline("acme/broken");

        let message = err.to_string();
        assert!(message.contains("acme/broken"));
        assert!(message.contains("https://github.com/acme"));
        assert!(err.is_safe());
    }

    #[test]
    fn test_permission_error_names_hook() {
        let err = RotorError::Permission {
            pipeline: "acme/widgets".to_string(),
            hook: hook_ref(42),
            source: "403 Forbidden".into(),
        };

        assert!(err.to_string().contains("acme/widgets#42"));
    }
}

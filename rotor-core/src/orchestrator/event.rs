//! Operator-facing rotation events

use crate::domain::hook::{Hook, RepositoryHook};
use crate::domain::pipeline::Pipeline;

/// Something the operator should see while a run progresses
#[derive(Debug, Clone, Copy)]
pub enum RotationEvent<'a> {
    /// A pipeline is about to be considered
    Listed { pipeline: &'a Pipeline },
    /// Hooks referencing the pipeline's current token were found
    Matched {
        pipeline: &'a Pipeline,
        matches: &'a [RepositoryHook],
    },
    /// No hook references the pipeline's current token
    Unmatched { pipeline: &'a Pipeline },
    /// Hooks on the pipeline's repository that no pipeline references
    Orphaned {
        pipeline: &'a Pipeline,
        hooks: &'a [&'a Hook],
    },
    /// The operator declined the rotation
    Skipped { pipeline: &'a Pipeline },
    /// The first matched hook accepted an update to its current URL
    Verified {
        pipeline: &'a Pipeline,
        hook: &'a RepositoryHook,
    },
    /// The build service issued a new delivery URL
    Rotated {
        pipeline: &'a Pipeline,
        new_webhook_url: &'a str,
    },
    /// A matched hook now carries the new delivery URL
    HookUpdated {
        pipeline: &'a Pipeline,
        hook: &'a RepositoryHook,
    },
    /// Rotation and propagation finished
    Done {
        pipeline: &'a Pipeline,
        propagated: usize,
    },
}

impl RotationEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Listed { .. } => "listed",
            Self::Matched { .. } => "matched",
            Self::Unmatched { .. } => "unmatched",
            Self::Orphaned { .. } => "orphaned",
            Self::Skipped { .. } => "skipped",
            Self::Verified { .. } => "verified",
            Self::Rotated { .. } => "rotated",
            Self::HookUpdated { .. } => "hook_updated",
            Self::Done { .. } => "done",
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        match self {
            Self::Listed { pipeline }
            | Self::Matched { pipeline, .. }
            | Self::Unmatched { pipeline }
            | Self::Orphaned { pipeline, .. }
            | Self::Skipped { pipeline }
            | Self::Verified { pipeline, .. }
            | Self::Rotated { pipeline, .. }
            | Self::HookUpdated { pipeline, .. }
            | Self::Done { pipeline, .. } => *pipeline,
        }
    }
}

/// Receives rotation events as they happen
pub trait Reporter {
    fn report(&self, event: RotationEvent<'_>);
}

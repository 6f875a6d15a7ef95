//! Rotation orchestrator
//!
//! Walks the catalog one pipeline at a time and, for each, proves that the
//! matched hooks can be updated, rotates the secret on the build service,
//! then pushes the new delivery URL to every matched hook. Any failure ends
//! the run. A failure after rotation is reported as
//! [`RotorError::PartiallyPropagated`] and is not rolled back.

mod event;
mod state;

pub use event::{Reporter, RotationEvent};
pub use state::{PipelineProgress, PipelineState};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::catalog::PipelineCatalog;
use crate::correspondence::CorrespondenceMap;
use crate::domain::hook::RepositoryHook;
use crate::domain::pipeline::Pipeline;
use crate::error::{PartialPropagation, Result, RotorError};
use crate::service::{Confirmation, ServiceContext};

/// Question put to the operator before each rotation
pub const CONFIRM_QUESTION: &str = "Rotate webhook?";

/// Run-wide rotation options
#[derive(Debug, Clone)]
pub struct RotationOptions {
    /// Ask the operator before rotating each pipeline
    pub confirm: bool,
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self { confirm: true }
    }
}

/// How a single pipeline ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub pipeline: String,
    pub state: PipelineState,
    pub new_webhook_url: Option<String>,
    pub propagated: usize,
}

/// Outcomes of a completed run, in catalog order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub outcomes: Vec<PipelineOutcome>,
}

impl RunSummary {
    pub fn rotated(&self) -> usize {
        self.outcomes.iter().filter(|o| o.state.is_rotated()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == PipelineState::Skipped)
            .count()
    }

    pub fn hooks_updated(&self) -> usize {
        self.outcomes.iter().map(|o| o.propagated).sum()
    }
}

/// Drives rotation for every pipeline in a catalog
pub struct Orchestrator<'a> {
    services: ServiceContext,
    options: RotationOptions,
    reporter: &'a dyn Reporter,
    confirmation: &'a dyn Confirmation,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        services: ServiceContext,
        options: RotationOptions,
        reporter: &'a dyn Reporter,
        confirmation: &'a dyn Confirmation,
    ) -> Self {
        Self {
            services,
            options,
            reporter,
            confirmation,
        }
    }

    /// Rotate every pipeline in catalog order
    ///
    /// `map` must have been built from `catalog` before this call.
    ///
    /// # Errors
    /// Stops at the first error; later pipelines are not processed.
    pub async fn run(
        &self,
        catalog: &PipelineCatalog,
        map: &CorrespondenceMap,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for pipeline in catalog.iter() {
            let outcome = self.rotate_pipeline(pipeline, catalog, map).await?;
            summary.outcomes.push(outcome);
        }

        Ok(summary)
    }

    async fn rotate_pipeline(
        &self,
        pipeline: &Pipeline,
        catalog: &PipelineCatalog,
        map: &CorrespondenceMap,
    ) -> Result<PipelineOutcome> {
        let mut progress = PipelineProgress::new();
        self.reporter.report(RotationEvent::Listed { pipeline });

        let matches = map.matches(&pipeline.webhook_token);
        if matches.is_empty() {
            warn!("No GitHub repositories with matching hooks for {}", pipeline);
            progress.advance(PipelineState::Unmatched)?;
            self.reporter.report(RotationEvent::Unmatched { pipeline });
        } else {
            progress.advance(PipelineState::Matched)?;
            self.reporter
                .report(RotationEvent::Matched { pipeline, matches });
        }

        let orphans = map.orphans(&pipeline.repository, catalog);
        if !orphans.is_empty() {
            self.reporter.report(RotationEvent::Orphaned {
                pipeline,
                hooks: &orphans,
            });
        }

        if self.options.confirm && !self.confirm()? {
            progress.advance(PipelineState::Skipped)?;
            self.reporter.report(RotationEvent::Skipped { pipeline });
            return Ok(outcome(pipeline, &progress, None, 0));
        }
        progress.advance(PipelineState::Confirmed)?;

        if let Some(first) = matches.first() {
            self.verify(pipeline, first).await?;
            progress.advance(PipelineState::Verified)?;
            self.reporter.report(RotationEvent::Verified {
                pipeline,
                hook: first,
            });
        }

        let new_webhook_url = self
            .services
            .build
            .rotate_webhook(&pipeline.id)
            .await
            .map_err(|source| RotorError::Rotation {
                pipeline: pipeline.to_string(),
                source,
            })?;
        progress.advance(PipelineState::Rotated)?;
        info!("New webhook for {} is {}", pipeline, new_webhook_url);
        self.reporter.report(RotationEvent::Rotated {
            pipeline,
            new_webhook_url: &new_webhook_url,
        });

        self.propagate(pipeline, matches, &new_webhook_url, &mut progress)
            .await?;
        progress.advance(PipelineState::Done)?;
        self.reporter.report(RotationEvent::Done {
            pipeline,
            propagated: matches.len(),
        });

        Ok(outcome(
            pipeline,
            &progress,
            Some(new_webhook_url),
            matches.len(),
        ))
    }

    fn confirm(&self) -> Result<bool> {
        self.confirmation
            .confirm(CONFIRM_QUESTION, true)
            .map_err(|source| RotorError::Prompt { source })
    }

    /// Rewrite the first matched hook with the URL it already has
    ///
    /// Fails before anything irreversible happens if the hosting token
    /// cannot edit hooks.
    async fn verify(&self, pipeline: &Pipeline, first: &RepositoryHook) -> Result<()> {
        self.services
            .hosting
            .update_hook_url(&first.repository, first.hook.id, &pipeline.webhook_url)
            .await
            .map_err(|source| RotorError::Permission {
                pipeline: pipeline.to_string(),
                hook: first.hook_ref(),
                source,
            })?;

        info!("Successfully tested updating webhook {}", first.hook_ref());
        Ok(())
    }

    async fn propagate(
        &self,
        pipeline: &Pipeline,
        matches: &[RepositoryHook],
        new_webhook_url: &str,
        progress: &mut PipelineProgress,
    ) -> Result<()> {
        for (i, matched) in matches.iter().enumerate() {
            info!("Updating {}", matched.hook_ref().settings_url());

            let updated = self
                .services
                .hosting
                .update_hook_url(&matched.repository, matched.hook.id, new_webhook_url)
                .await;

            if let Err(source) = updated {
                progress.advance(PipelineState::PartiallyPropagated)?;
                error!(
                    "{} rotated but {} of {} hook(s) still use the old webhook",
                    pipeline,
                    matches.len() - i,
                    matches.len()
                );
                return Err(RotorError::PartiallyPropagated(Box::new(
                    PartialPropagation {
                        pipeline: pipeline.to_string(),
                        new_webhook_url: new_webhook_url.to_string(),
                        updated: matches[..i].iter().map(RepositoryHook::hook_ref).collect(),
                        unresolved: matches[i..].iter().map(RepositoryHook::hook_ref).collect(),
                        source,
                    },
                )));
            }

            self.reporter.report(RotationEvent::HookUpdated {
                pipeline,
                hook: matched,
            });
        }

        if !matches.is_empty() {
            progress.advance(PipelineState::Propagated)?;
        }
        Ok(())
    }
}

fn outcome(
    pipeline: &Pipeline,
    progress: &PipelineProgress,
    new_webhook_url: Option<String>,
    propagated: usize,
) -> PipelineOutcome {
    PipelineOutcome {
        pipeline: pipeline.to_string(),
        state: progress.state(),
        new_webhook_url,
        propagated,
    }
}

//! Per-pipeline rotation state machine
//!
//! ```text
//! Listed ─┬─ Matched ───┬─ Confirmed ── Verified ── Rotated ─┬─ Propagated ── Done
//!         │             └─ Skipped                           └─ PartiallyPropagated
//!         └─ Unmatched ─┬─ Confirmed ─────────────── Rotated ─── Done
//!                       └─ Skipped
//! ```
//!
//! A matched pipeline can only reach `Rotated` through `Verified`, so the
//! build service is never asked to rotate before the hosting-side update
//! permission has been proven.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RotorError};

/// Where a pipeline is in the rotation sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Listed,
    Matched,
    Unmatched,
    Confirmed,
    Skipped,
    Verified,
    Rotated,
    Propagated,
    Done,
    PartiallyPropagated,
}

impl PipelineState {
    /// No further transitions are possible
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineState::Skipped | PipelineState::Done | PipelineState::PartiallyPropagated
        )
    }

    /// The build service holds a new secret
    pub fn is_rotated(self) -> bool {
        matches!(
            self,
            PipelineState::Rotated
                | PipelineState::Propagated
                | PipelineState::Done
                | PipelineState::PartiallyPropagated
        )
    }
}

/// Tracks one pipeline through the state machine
#[derive(Debug, Clone)]
pub struct PipelineProgress {
    state: PipelineState,
    matched: bool,
}

impl Default for PipelineProgress {
    fn default() -> Self {
        Self {
            state: PipelineState::Listed,
            matched: false,
        }
    }
}

impl PipelineProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Move to the next state
    ///
    /// # Errors
    /// Returns [`RotorError::InvalidTransition`] if `next` does not follow
    /// the current state.
    pub fn advance(&mut self, next: PipelineState) -> Result<()> {
        if !self.allows(next) {
            return Err(RotorError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        debug!("{:?} -> {:?}", self.state, next);
        if next == PipelineState::Matched {
            self.matched = true;
        }
        self.state = next;
        Ok(())
    }

    fn allows(&self, next: PipelineState) -> bool {
        use PipelineState::*;

        match (self.state, next) {
            (Listed, Matched | Unmatched) => true,
            (Matched | Unmatched, Confirmed | Skipped) => true,
            (Confirmed, Verified) => self.matched,
            (Confirmed, Rotated) => !self.matched,
            (Verified, Rotated) => true,
            (Rotated, Propagated | PartiallyPropagated) => self.matched,
            (Rotated, Done) => !self.matched,
            (Propagated, Done) => true,
            _ => false,
        }
    }
}

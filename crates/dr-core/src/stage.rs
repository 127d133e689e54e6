//! Stage outcome taxonomy.
//!
//! Each pipeline stage has a fixed [`FailurePolicy`]. A stage's
//! `Result` is converted into a [`StageOutcome`] with [`Stage::classify`],
//! so callers branch on an explicit enumeration instead of on null or
//! boolean sentinels:
//!
//! | Policy    | Stages                    | Effect on the run                         |
//! |-----------|---------------------------|-------------------------------------------|
//! | `Skip`    | render, encode            | the feature is dropped, the run continues |
//! | `Degrade` | tone, overlay, compress   | the previous artifact is kept             |
//! | `Abort`   | gate, concat              | the run ends without an artifact          |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Error;

/// How a failure of a stage affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Drop the current feature and continue.
    Skip,
    /// Keep the previously successful artifact and continue.
    Degrade,
    /// End the run without an artifact.
    Abort,
}

/// A step of the demo pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Render,
    Encode,
    Gate,
    Concat,
    Tone,
    Overlay,
    Compress,
}

impl Stage {
    /// The failure policy bound to this stage.
    pub fn policy(&self) -> FailurePolicy {
        match self {
            Stage::Render | Stage::Encode => FailurePolicy::Skip,
            Stage::Tone | Stage::Overlay | Stage::Compress => FailurePolicy::Degrade,
            Stage::Gate | Stage::Concat => FailurePolicy::Abort,
        }
    }

    /// Classify a stage result according to this stage's policy.
    pub fn classify<T>(self, result: Result<T, Error>) -> StageOutcome<T> {
        match result {
            Ok(value) => StageOutcome::Success(value),
            Err(e) => self.fail(e.to_string()),
        }
    }

    /// Build the failure outcome for this stage.
    pub fn fail<T>(self, reason: impl Into<String>) -> StageOutcome<T> {
        let reason = reason.into();
        match self.policy() {
            FailurePolicy::Skip => StageOutcome::Skipped { stage: self, reason },
            FailurePolicy::Degrade => StageOutcome::Degraded { stage: self, reason },
            FailurePolicy::Abort => StageOutcome::Aborted { stage: self, reason },
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Render => "render",
            Stage::Encode => "encode",
            Stage::Gate => "gate",
            Stage::Concat => "concat",
            Stage::Tone => "tone",
            Stage::Overlay => "overlay",
            Stage::Compress => "compress",
        };
        f.write_str(name)
    }
}

/// Result of running one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    /// The stage produced its artifact.
    Success(T),
    /// The stage failed; the current feature is dropped.
    Skipped { stage: Stage, reason: String },
    /// The stage failed; the previous artifact stands.
    Degraded { stage: Stage, reason: String },
    /// The stage failed; the run produces no artifact.
    Aborted { stage: Stage, reason: String },
}

impl<T> StageOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, StageOutcome::Success(_))
    }

    /// The produced value, discarding failure details.
    pub fn success(self) -> Option<T> {
        match self {
            StageOutcome::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Transform the success value, keeping failure details.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StageOutcome<U> {
        match self {
            StageOutcome::Success(value) => StageOutcome::Success(f(value)),
            StageOutcome::Skipped { stage, reason } => StageOutcome::Skipped { stage, reason },
            StageOutcome::Degraded { stage, reason } => StageOutcome::Degraded { stage, reason },
            StageOutcome::Aborted { stage, reason } => StageOutcome::Aborted { stage, reason },
        }
    }

    /// The failure policy that applied, `None` on success.
    pub fn policy(&self) -> Option<FailurePolicy> {
        match self {
            StageOutcome::Success(_) => None,
            StageOutcome::Skipped { .. } => Some(FailurePolicy::Skip),
            StageOutcome::Degraded { .. } => Some(FailurePolicy::Degrade),
            StageOutcome::Aborted { .. } => Some(FailurePolicy::Abort),
        }
    }

    /// The failure reason, `None` on success.
    pub fn reason(&self) -> Option<&str> {
        match self {
            StageOutcome::Success(_) => None,
            StageOutcome::Skipped { reason, .. }
            | StageOutcome::Degraded { reason, .. }
            | StageOutcome::Aborted { reason, .. } => Some(reason),
        }
    }
}

//! dr-core: shared types for the demoreel pipeline.
//!
//! This crate is the foundational dependency for all other dr-* crates,
//! providing the unified error type, the feature model, collision-free
//! artifact naming, and the stage outcome taxonomy the orchestrator uses to
//! decide between skipping, degrading, and aborting.

pub mod error;
pub mod feature;
pub mod naming;
pub mod stage;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use feature::{Feature, FeatureSet};
pub use naming::{ArtifactKind, ArtifactName};
pub use stage::{FailurePolicy, Stage, StageOutcome};

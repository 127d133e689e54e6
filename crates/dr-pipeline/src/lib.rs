//! # dr-pipeline
//!
//! Sequences the demoreel stages over a [`dr_core::FeatureSet`]:
//!
//! 1. render a banner per feature and encode it into a clip (failures skip
//!    the feature),
//! 2. stop when no clip survived,
//! 3. concatenate the clips (failure ends the run),
//! 4. optionally overlay a library track or a synthesized tone,
//! 5. optionally compress,
//!
//! and purges stale scratch files however the run ends.

pub mod audio;
pub mod media;
pub mod orchestrator;

pub use audio::{AudioConfig, AudioSource};
pub use media::{clip_duration, ClipConfig, FfmpegMedia, MediaOps, MediaSettings, MAX_CLIP_SECS};
pub use orchestrator::{
    DemoOptions, DemoReport, FinalVideo, Orchestrator, StageEvent, DEFAULT_CRF, DEFAULT_RETENTION,
};

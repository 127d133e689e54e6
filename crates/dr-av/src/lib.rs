//! # dr-av
//!
//! External tool plumbing for the demoreel pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache the path to
//!   ffmpeg, plus the per-call timeouts.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Typed invocations** ([`invocation`]) -- one validated descriptor per
//!   kind of ffmpeg call.
//! - **Workspace layout** ([`Workspace`]) -- the work root and its
//!   banner/audio/output/temp directories.
//! - **Action functions** ([`actions`]) -- clip encoding, concatenation,
//!   tone synthesis, audio overlay and compression.
//! - **Scratch cleanup** ([`TempJanitor`]) -- age-based purge of the temp
//!   directory.

pub mod actions;
pub mod command;
pub mod invocation;
pub mod janitor;
pub mod tools;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use invocation::Invocation;
pub use janitor::{PurgeGuard, PurgeSummary, TempJanitor};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry, ToolsConfig};
pub use workspace::{Workspace, WorkspaceLayout};

// Action functions
pub use actions::{
    compress_video, concat_clips, encode_clip, overlay_audio, supports_sine, synthesize_tone,
    Clip, RetryPolicy,
};

//! Still banner → fixed-duration clip.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::run_to_file;
use crate::invocation::{EncodeClip, Invocation};
use crate::tools::ToolRegistry;

/// An encoded clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    pub path: PathBuf,
    pub banner: PathBuf,
    pub duration: Duration,
    pub fps: u32,
}

/// Fixed-backoff retry schedule for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Encode `image` into an H.264 clip at `output`.
///
/// Tool failures are retried per `retry`; invalid parameters are not.
/// After the last failed attempt the final error is returned.
pub async fn encode_clip(
    tools: &ToolRegistry,
    image: &Path,
    output: &Path,
    duration: Duration,
    fps: u32,
    retry: &RetryPolicy,
) -> dr_core::Result<Clip> {
    let inv = EncodeClip {
        image: image.to_path_buf(),
        output: output.to_path_buf(),
        duration,
        fps,
    };
    // Fail fast on bad input before spending any attempts.
    inv.command(tools)?;

    let attempts = retry.attempts.max(1);
    let mut attempt = 1;
    loop {
        tracing::info!(
            "encode {} -> {} (attempt {attempt}/{attempts})",
            image.display(),
            output.display()
        );
        match run_to_file(tools, &inv, output).await {
            Ok(()) => {
                return Ok(Clip {
                    path: output.to_path_buf(),
                    banner: image.to_path_buf(),
                    duration,
                    fps,
                })
            }
            Err(e) if attempt < attempts => {
                tracing::warn!("encode attempt {attempt}/{attempts} failed: {e}");
                attempt += 1;
                tokio::time::sleep(retry.backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

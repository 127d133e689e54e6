//! Constant-quality re-encode.

use std::path::{Path, PathBuf};

use super::run_to_file;
use crate::invocation::Compress;
use crate::tools::ToolRegistry;

pub const DEFAULT_PRESET: &str = "medium";

/// Re-encode `input` to `output` at `crf` (0..=51, lower is better).
///
/// `input` is never modified, so on failure the caller still holds a
/// playable video.
pub async fn compress_video(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    crf: u8,
) -> dr_core::Result<PathBuf> {
    tracing::info!("compress {} (crf {crf}) -> {}", input.display(), output.display());
    let inv = Compress {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        crf,
        preset: DEFAULT_PRESET.to_string(),
    };
    run_to_file(tools, &inv, output).await?;
    Ok(output.to_path_buf())
}

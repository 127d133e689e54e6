//! Mux an audio track onto a video.

use std::path::{Path, PathBuf};

use super::run_to_file;
use crate::invocation::MuxAudio;
use crate::tools::ToolRegistry;

pub const DEFAULT_AUDIO_BITRATE: &str = "192k";

/// Copy the video stream of `video`, encode the first audio stream of
/// `audio` to AAC, and cut the result at the shorter of the two.
pub async fn overlay_audio(
    tools: &ToolRegistry,
    video: &Path,
    audio: &Path,
    output: &Path,
    bitrate: &str,
) -> dr_core::Result<PathBuf> {
    tracing::info!(
        "overlay {} onto {} -> {}",
        audio.display(),
        video.display(),
        output.display()
    );
    let inv = MuxAudio {
        video: video.to_path_buf(),
        audio: audio.to_path_buf(),
        output: output.to_path_buf(),
        audio_bitrate: bitrate.to_string(),
    };
    run_to_file(tools, &inv, output).await?;
    Ok(output.to_path_buf())
}

//! The media operations the orchestrator drives.
//!
//! [`MediaOps`] is the seam between sequencing and the external tool:
//! [`FfmpegMedia`] forwards to the `dr_av` actions, while tests substitute
//! fakes that never spawn a process.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use dr_av::actions::{DEFAULT_AUDIO_BITRATE, DEFAULT_TONE_HZ};
use dr_av::{Clip, RetryPolicy, ToolRegistry};

/// Clip, tone and mux parameters for [`FfmpegMedia`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSettings {
    pub fps: u32,
    pub retry: RetryPolicy,
    pub tone_hz: u32,
    pub audio_bitrate: String,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            fps: 24,
            retry: RetryPolicy::default(),
            tone_hz: DEFAULT_TONE_HZ,
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
        }
    }
}

/// Longest accepted per-feature clip.
pub const MAX_CLIP_SECS: f64 = 3600.0;

/// Convert a per-clip duration in seconds, rejecting values that are not
/// finite, not positive, or longer than [`MAX_CLIP_SECS`].
pub fn clip_duration(secs: f64) -> dr_core::Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 || secs > MAX_CLIP_SECS {
        return Err(dr_core::Error::Validation(format!(
            "clip duration {secs} must be within (0, {MAX_CLIP_SECS}] seconds"
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| dr_core::Error::Validation(format!("clip duration {secs}: {e}")))
}

/// The `[clip]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipConfig {
    pub duration_secs: f64,
    pub fps: u32,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            duration_secs: 3.0,
            fps: 24,
            retry_attempts: 3,
            retry_backoff_ms: 1000,
        }
    }
}

impl ClipConfig {
    pub fn validate(&self) -> dr_core::Result<()> {
        clip_duration(self.duration_secs)?;
        if self.fps == 0 || self.fps > dr_av::invocation::MAX_FPS {
            return Err(dr_core::Error::Validation(format!(
                "fps {} outside 1..={}",
                self.fps,
                dr_av::invocation::MAX_FPS
            )));
        }
        if self.retry_attempts == 0 {
            return Err(dr_core::Error::Validation(
                "retry attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The clip length; zero when the configured value is out of range.
    pub fn duration(&self) -> Duration {
        clip_duration(self.duration_secs).unwrap_or_default()
    }

    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

/// Media operations, one per pipeline stage that touches a video or audio
/// file.
#[async_trait]
pub trait MediaOps: Send + Sync {
    /// Encode a still image into a clip of `duration`.
    async fn encode_clip(
        &self,
        image: &Path,
        output: &Path,
        duration: Duration,
    ) -> dr_core::Result<Clip>;

    /// Join `clips` in order, writing the list to `list_file`.
    async fn concat(
        &self,
        clips: &[PathBuf],
        list_file: &Path,
        output: &Path,
    ) -> dr_core::Result<PathBuf>;

    /// Synthesize a fallback tone; `None` when unavailable.
    async fn synthesize_tone(&self, output: &Path, duration: Duration) -> Option<PathBuf>;

    /// Mux `audio` onto `video`.
    async fn overlay_audio(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
    ) -> dr_core::Result<PathBuf>;

    /// Re-encode `input` at `crf`.
    async fn compress(&self, input: &Path, output: &Path, crf: u8) -> dr_core::Result<PathBuf>;
}

/// [`MediaOps`] backed by ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegMedia {
    tools: Arc<ToolRegistry>,
    settings: MediaSettings,
}

impl FfmpegMedia {
    pub fn new(tools: Arc<ToolRegistry>, settings: MediaSettings) -> Self {
        Self { tools, settings }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }
}

#[async_trait]
impl MediaOps for FfmpegMedia {
    async fn encode_clip(
        &self,
        image: &Path,
        output: &Path,
        duration: Duration,
    ) -> dr_core::Result<Clip> {
        dr_av::encode_clip(
            &self.tools,
            image,
            output,
            duration,
            self.settings.fps,
            &self.settings.retry,
        )
        .await
    }

    async fn concat(
        &self,
        clips: &[PathBuf],
        list_file: &Path,
        output: &Path,
    ) -> dr_core::Result<PathBuf> {
        dr_av::concat_clips(&self.tools, clips, list_file, output).await
    }

    async fn synthesize_tone(&self, output: &Path, duration: Duration) -> Option<PathBuf> {
        dr_av::synthesize_tone(&self.tools, output, self.settings.tone_hz, duration).await
    }

    async fn overlay_audio(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
    ) -> dr_core::Result<PathBuf> {
        dr_av::overlay_audio(
            &self.tools,
            video,
            audio,
            output,
            &self.settings.audio_bitrate,
        )
        .await
    }

    async fn compress(&self, input: &Path, output: &Path, crf: u8) -> dr_core::Result<PathBuf> {
        dr_av::compress_video(&self.tools, input, output, crf).await
    }
}

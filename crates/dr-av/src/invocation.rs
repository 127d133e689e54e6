//! Typed ffmpeg invocations.
//!
//! Each external call the pipeline makes has its own descriptor. A
//! descriptor is validated before it is turned into a [`ToolCommand`], so
//! malformed parameters and option-like paths never reach the process.

use std::path::{Path, PathBuf};
use std::time::Duration;

use dr_core::{Error, Result};

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Highest constant-rate-factor libx264 accepts.
pub const MAX_CRF: u8 = 51;

/// Highest frame rate accepted for still-image clips.
pub const MAX_FPS: u32 = 120;

/// A validated ffmpeg call.
pub trait Invocation: Send + Sync {
    /// Short label used in logs and errors.
    fn label(&self) -> &'static str;

    /// Check parameters and paths.
    fn validate(&self) -> Result<()>;

    /// Arguments passed after the program name.
    fn args(&self) -> Vec<String>;

    /// Whether this call gets the long timeout.
    fn long_running(&self) -> bool {
        false
    }

    /// Validate and build the command against the registry's ffmpeg.
    fn command(&self, tools: &ToolRegistry) -> Result<ToolCommand> {
        self.validate()
            .map_err(|e| Error::Validation(format!("{}: {e}", self.label())))?;
        let ffmpeg = tools.require("ffmpeg")?;
        let mut cmd = ToolCommand::new(ffmpeg.path.clone());
        cmd.args(self.args());
        cmd.timeout(if self.long_running() {
            tools.compress_timeout()
        } else {
            tools.timeout()
        });
        Ok(cmd)
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn seconds_arg(d: Duration) -> String {
    format!("{:.3}", d.as_secs_f64())
}

/// A path handed to ffmpeg must be non-empty and must not look like an option.
fn check_path(what: &str, path: &Path) -> Result<()> {
    let s = path.to_string_lossy();
    if s.is_empty() {
        return Err(Error::Validation(format!("{what} path is empty")));
    }
    if s.starts_with('-') {
        return Err(Error::Validation(format!(
            "{what} path '{s}' must not start with '-'"
        )));
    }
    Ok(())
}

fn check_input(what: &str, path: &Path) -> Result<()> {
    check_path(what, path)?;
    if !path.is_file() {
        return Err(Error::Validation(format!(
            "{what} '{}' does not exist",
            path.display()
        )));
    }
    Ok(())
}

fn check_distinct(input: &Path, output: &Path) -> Result<()> {
    if input == output {
        return Err(Error::Validation(format!(
            "output '{}' would overwrite its input",
            output.display()
        )));
    }
    Ok(())
}

fn check_duration(d: Duration) -> Result<()> {
    if d.is_zero() {
        return Err(Error::Validation("duration must be positive".into()));
    }
    Ok(())
}

/// Still image → fixed-duration H.264 clip.
///
/// `-loop 1 -i <image> -t <d> -r <fps> -c:v libx264 -pix_fmt yuv420p`
/// with a scale filter that rounds both dimensions down to even values.
#[derive(Debug, Clone)]
pub struct EncodeClip {
    pub image: PathBuf,
    pub output: PathBuf,
    pub duration: Duration,
    pub fps: u32,
}

impl Invocation for EncodeClip {
    fn label(&self) -> &'static str {
        "encode"
    }

    fn validate(&self) -> Result<()> {
        check_input("image", &self.image)?;
        check_path("clip", &self.output)?;
        check_duration(self.duration)?;
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(Error::Validation(format!(
                "fps {} outside 1..={MAX_FPS}",
                self.fps
            )));
        }
        Ok(())
    }

    fn args(&self) -> Vec<String> {
        vec![
            "-y".into(),
            "-loop".into(),
            "1".into(),
            "-i".into(),
            path_arg(&self.image),
            "-t".into(),
            seconds_arg(self.duration),
            "-r".into(),
            self.fps.to_string(),
            "-c:v".into(),
            "libx264".into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-vf".into(),
            "scale=trunc(iw/2)*2:trunc(ih/2)*2".into(),
            path_arg(&self.output),
        ]
    }
}

/// Stream-copy concatenation driven by a `file '<path>'` list.
#[derive(Debug, Clone)]
pub struct ConcatList {
    pub list_file: PathBuf,
    pub output: PathBuf,
}

impl Invocation for ConcatList {
    fn label(&self) -> &'static str {
        "concat"
    }

    fn validate(&self) -> Result<()> {
        check_input("concat list", &self.list_file)?;
        check_path("output", &self.output)?;
        check_distinct(&self.list_file, &self.output)
    }

    fn args(&self) -> Vec<String> {
        vec![
            "-y".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            path_arg(&self.list_file),
            "-c".into(),
            "copy".into(),
            path_arg(&self.output),
        ]
    }
}

/// Capability listing: `ffmpeg -hide_banner -filters`.
#[derive(Debug, Clone, Default)]
pub struct ListFilters;

impl Invocation for ListFilters {
    fn label(&self) -> &'static str {
        "list-filters"
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn args(&self) -> Vec<String> {
        vec!["-hide_banner".into(), "-filters".into()]
    }
}

/// lavfi sine source rendered to an audio file.
#[derive(Debug, Clone)]
pub struct SineTone {
    pub frequency_hz: u32,
    pub duration: Duration,
    pub output: PathBuf,
}

impl Invocation for SineTone {
    fn label(&self) -> &'static str {
        "tone"
    }

    fn validate(&self) -> Result<()> {
        check_path("tone", &self.output)?;
        check_duration(self.duration)?;
        if self.frequency_hz == 0 {
            return Err(Error::Validation("tone frequency must be positive".into()));
        }
        Ok(())
    }

    fn args(&self) -> Vec<String> {
        vec![
            "-y".into(),
            "-f".into(),
            "lavfi".into(),
            "-i".into(),
            format!(
                "sine=frequency={}:duration={}",
                self.frequency_hz,
                seconds_arg(self.duration)
            ),
            path_arg(&self.output),
        ]
    }
}

/// Video (stream copy) + audio (re-encoded) mux, cut to the shorter stream.
#[derive(Debug, Clone)]
pub struct MuxAudio {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
    pub audio_bitrate: String,
}

impl Invocation for MuxAudio {
    fn label(&self) -> &'static str {
        "overlay"
    }

    fn validate(&self) -> Result<()> {
        check_input("video", &self.video)?;
        check_input("audio", &self.audio)?;
        check_path("output", &self.output)?;
        check_distinct(&self.video, &self.output)?;
        if self.audio_bitrate.is_empty()
            || !self
                .audio_bitrate
                .chars()
                .all(|c| c.is_ascii_alphanumeric())
        {
            return Err(Error::Validation(format!(
                "invalid audio bitrate '{}'",
                self.audio_bitrate
            )));
        }
        Ok(())
    }

    fn args(&self) -> Vec<String> {
        vec![
            "-y".into(),
            "-i".into(),
            path_arg(&self.video),
            "-i".into(),
            path_arg(&self.audio),
            "-map".into(),
            "0:v:0".into(),
            "-map".into(),
            "1:a:0".into(),
            "-c:v".into(),
            "copy".into(),
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            self.audio_bitrate.clone(),
            "-shortest".into(),
            path_arg(&self.output),
        ]
    }
}

/// Constant-rate-factor H.264 re-encode.
#[derive(Debug, Clone)]
pub struct Compress {
    pub input: PathBuf,
    pub output: PathBuf,
    pub crf: u8,
    pub preset: String,
}

/// x264 presets accepted by [`Compress`].
const PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
];

impl Invocation for Compress {
    fn label(&self) -> &'static str {
        "compress"
    }

    fn validate(&self) -> Result<()> {
        check_input("video", &self.input)?;
        check_path("output", &self.output)?;
        check_distinct(&self.input, &self.output)?;
        if self.crf > MAX_CRF {
            return Err(Error::Validation(format!(
                "crf {} outside 0..={MAX_CRF}",
                self.crf
            )));
        }
        if !PRESETS.contains(&self.preset.as_str()) {
            return Err(Error::Validation(format!("unknown preset '{}'", self.preset)));
        }
        Ok(())
    }

    fn args(&self) -> Vec<String> {
        vec![
            "-y".into(),
            "-i".into(),
            path_arg(&self.input),
            "-c:v".into(),
            "libx264".into(),
            "-crf".into(),
            self.crf.to_string(),
            "-preset".into(),
            self.preset.clone(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-c:a".into(),
            "copy".into(),
            path_arg(&self.output),
        ]
    }

    fn long_running(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolsConfig;

    fn registry() -> ToolRegistry {
        ToolRegistry::empty(&ToolsConfig::default())
            .with_tool("ffmpeg", "/opt/ffmpeg/bin/ffmpeg")
            .with_timeouts(Duration::from_secs(3), Duration::from_secs(30))
    }

    fn existing_file(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn encode_args_loop_still_frame() {
        let dir = tempfile::tempdir().unwrap();
        let inv = EncodeClip {
            image: existing_file(&dir, "banner.png"),
            output: dir.path().join("clip.mp4"),
            duration: Duration::from_secs(3),
            fps: 24,
        };
        inv.validate().unwrap();
        let args = inv.args();
        assert_eq!(&args[..3], &["-y", "-loop", "1"]);
        assert!(args.windows(2).any(|w| w == ["-t", "3.000"]));
        assert!(args.windows(2).any(|w| w == ["-r", "24"]));
        assert!(args.windows(2).any(|w| w == ["-pix_fmt", "yuv420p"]));
        assert!(args.contains(&"scale=trunc(iw/2)*2:trunc(ih/2)*2".to_string()));
        assert!(args.last().unwrap().ends_with("clip.mp4"));
    }

    #[test]
    fn encode_rejects_missing_image_and_bad_fps() {
        let dir = tempfile::tempdir().unwrap();
        let mut inv = EncodeClip {
            image: dir.path().join("missing.png"),
            output: dir.path().join("clip.mp4"),
            duration: Duration::from_secs(3),
            fps: 24,
        };
        assert!(inv.validate().is_err());

        inv.image = existing_file(&dir, "banner.png");
        inv.fps = 0;
        assert!(inv.validate().is_err());
        inv.fps = 24;
        inv.duration = Duration::ZERO;
        assert!(inv.validate().is_err());
    }

    #[test]
    fn option_like_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let inv = ConcatList {
            list_file: existing_file(&dir, "list.txt"),
            output: PathBuf::from("-f"),
        };
        let err = inv.validate().unwrap_err().to_string();
        assert!(err.contains("must not start with '-'"), "got {err}");
    }

    #[test]
    fn concat_args_stream_copy() {
        let dir = tempfile::tempdir().unwrap();
        let inv = ConcatList {
            list_file: existing_file(&dir, "list.txt"),
            output: dir.path().join("joined.mp4"),
        };
        let args = inv.args();
        assert!(args.windows(2).any(|w| w == ["-f", "concat"]));
        assert!(args.windows(2).any(|w| w == ["-safe", "0"]));
        assert!(args.windows(2).any(|w| w == ["-c", "copy"]));
    }

    #[test]
    fn sine_source_expression() {
        let inv = SineTone {
            frequency_hz: 440,
            duration: Duration::from_millis(1500),
            output: PathBuf::from("/tmp/tone.wav"),
        };
        inv.validate().unwrap();
        assert!(inv
            .args()
            .contains(&"sine=frequency=440:duration=1.500".to_string()));
    }

    #[test]
    fn mux_truncates_to_shortest_stream() {
        let dir = tempfile::tempdir().unwrap();
        let inv = MuxAudio {
            video: existing_file(&dir, "v.mp4"),
            audio: existing_file(&dir, "a.mp3"),
            output: dir.path().join("out.mp4"),
            audio_bitrate: "192k".into(),
        };
        inv.validate().unwrap();
        let args = inv.args();
        assert!(args.contains(&"-shortest".to_string()));
        assert!(args.windows(2).any(|w| w == ["-c:v", "copy"]));
        assert!(args.windows(2).any(|w| w == ["-c:a", "aac"]));
    }

    #[test]
    fn mux_rejects_odd_bitrate() {
        let dir = tempfile::tempdir().unwrap();
        let inv = MuxAudio {
            video: existing_file(&dir, "v.mp4"),
            audio: existing_file(&dir, "a.mp3"),
            output: dir.path().join("out.mp4"),
            audio_bitrate: "192k -f null".into(),
        };
        assert!(inv.validate().is_err());
    }

    #[test]
    fn compress_validates_crf_and_preset() {
        let dir = tempfile::tempdir().unwrap();
        let mut inv = Compress {
            input: existing_file(&dir, "in.mp4"),
            output: dir.path().join("out.mp4"),
            crf: 28,
            preset: "medium".into(),
        };
        inv.validate().unwrap();
        inv.crf = 52;
        assert!(inv.validate().is_err());
        inv.crf = 28;
        inv.preset = "warp".into();
        assert!(inv.validate().is_err());
        inv.preset = "medium".into();
        inv.output = inv.input.clone();
        assert!(inv.validate().is_err());
    }

    #[test]
    fn command_uses_registry_path_and_timeouts() {
        let dir = tempfile::tempdir().unwrap();
        let tools = registry();

        let compress = Compress {
            input: existing_file(&dir, "in.mp4"),
            output: dir.path().join("out.mp4"),
            crf: 23,
            preset: "fast".into(),
        };
        let cmd = compress.command(&tools).unwrap();
        assert_eq!(cmd.program_name(), "ffmpeg");
        assert_eq!(cmd.get_timeout(), Duration::from_secs(30));

        let cmd = ListFilters.command(&tools).unwrap();
        assert_eq!(cmd.get_args(), &["-hide_banner", "-filters"]);
        assert_eq!(cmd.get_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn command_fails_without_ffmpeg() {
        let tools = ToolRegistry::empty(&ToolsConfig::default());
        assert!(ListFilters.command(&tools).is_err());
    }
}

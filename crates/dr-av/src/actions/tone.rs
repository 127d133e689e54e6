//! Fallback audio: a synthesized sine tone.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::run_to_file;
use crate::invocation::{Invocation, ListFilters, SineTone};
use crate::tools::ToolRegistry;

/// Concert A.
pub const DEFAULT_TONE_HZ: u32 = 440;

/// Whether an `ffmpeg -filters` listing contains `name`.
///
/// Entries look like ` ... sine   |->A   Generate sine wave audio signal.`:
/// capability flags, then the filter name, then the pad layout.
pub fn listing_has_filter(listing: &str, name: &str) -> bool {
    listing
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(name))
}

/// Probe ffmpeg for the lavfi `sine` source. Any probe failure counts as
/// "not supported".
pub async fn supports_sine(tools: &ToolRegistry) -> bool {
    let cmd = match ListFilters.command(tools) {
        Ok(cmd) => cmd,
        Err(e) => {
            tracing::debug!("tone: cannot probe filters: {e}");
            return false;
        }
    };
    match cmd.execute().await {
        Ok(out) => listing_has_filter(&out.stdout, "sine"),
        Err(e) => {
            tracing::debug!("tone: filter probe failed: {e}");
            false
        }
    }
}

/// Render a tone of `duration` to `output`.
///
/// Returns `None` when ffmpeg lacks the `sine` source or synthesis fails.
pub async fn synthesize_tone(
    tools: &ToolRegistry,
    output: &Path,
    frequency_hz: u32,
    duration: Duration,
) -> Option<PathBuf> {
    if !supports_sine(tools).await {
        tracing::info!("tone: sine source unavailable, no fallback audio");
        return None;
    }

    let inv = SineTone {
        frequency_hz,
        duration,
        output: output.to_path_buf(),
    };
    match run_to_file(tools, &inv, output).await {
        Ok(()) => {
            tracing::info!("tone: synthesized {frequency_hz} Hz -> {}", output.display());
            Some(output.to_path_buf())
        }
        Err(e) => {
            tracing::warn!("tone synthesis failed: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Filters:
  T.. = Timeline support
  --
 ... abench            A->A       Benchmark part of a filtergraph.
 ... sine              |->A       Generate sine wave audio signal.
 ... sinc              |->A       Generate a sinc kaiser-windowed low-pass.
";

    #[test]
    fn finds_sine_entry() {
        assert!(listing_has_filter(LISTING, "sine"));
        assert!(listing_has_filter(LISTING, "abench"));
    }

    #[test]
    fn ignores_descriptions_and_prefixes() {
        let listing = " ... anoisesrc         |->A       Generate a sine-like noise.\n";
        assert!(!listing_has_filter(listing, "sine"));
        assert!(!listing_has_filter(LISTING, "sin"));
        assert!(!listing_has_filter("", "sine"));
    }

    #[tokio::test]
    async fn no_ffmpeg_means_no_tone() {
        use crate::tools::ToolsConfig;

        let tmp = tempfile::tempdir().unwrap();
        let tools = ToolRegistry::empty(&ToolsConfig::default());
        let tone = synthesize_tone(
            &tools,
            &tmp.path().join("tone.wav"),
            DEFAULT_TONE_HZ,
            Duration::from_secs(5),
        )
        .await;
        assert!(tone.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn synthesizes_when_sine_is_listed() {
        use crate::actions::testutil;

        let tmp = tempfile::tempdir().unwrap();
        let tools = testutil::registry(testutil::working_ffmpeg(tmp.path()));
        let out = tmp.path().join("tone.wav");

        assert!(supports_sine(&tools).await);
        let tone = synthesize_tone(&tools, &out, DEFAULT_TONE_HZ, Duration::from_secs(5)).await;
        assert_eq!(tone.as_deref(), Some(out.as_path()));
        assert!(out.is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn skips_when_sine_is_missing() {
        use crate::actions::testutil;

        let tmp = tempfile::tempdir().unwrap();
        let tools = testutil::registry(testutil::ffmpeg_without_sine(tmp.path()));
        let out = tmp.path().join("tone.wav");

        assert!(!supports_sine(&tools).await);
        assert!(
            synthesize_tone(&tools, &out, DEFAULT_TONE_HZ, Duration::from_secs(5))
                .await
                .is_none()
        );
        assert!(!out.exists());
    }
}

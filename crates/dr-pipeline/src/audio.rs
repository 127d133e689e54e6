//! Audio source selection: a random library track, else a synthesized
//! tone, else nothing.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::media::MediaOps;

/// The `[audio]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// File extensions recognized in the audio library, without the dot.
    pub extensions: Vec<String>,
    pub tone_frequency_hz: u32,
    pub bitrate: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            extensions: ["mp3", "wav", "ogg", "m4a", "aac", "flac"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            tone_frequency_hz: dr_av::actions::DEFAULT_TONE_HZ,
            bitrate: dr_av::actions::DEFAULT_AUDIO_BITRATE.to_string(),
        }
    }
}

/// Where the overlaid audio came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Library(PathBuf),
    Tone(PathBuf),
}

impl AudioSource {
    pub fn path(&self) -> &Path {
        match self {
            AudioSource::Library(p) | AudioSource::Tone(p) => p,
        }
    }
}

/// Regular files directly under `dir` whose extension is in `extensions`
/// (case-insensitive), sorted by path. A missing directory yields nothing.
pub fn library_tracks(dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("audio library {} unreadable: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut tracks: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        })
        .collect();
    tracks.sort();
    tracks
}

/// Uniformly random track from the library.
pub fn pick_track<R: Rng + ?Sized>(
    dir: &Path,
    extensions: &[String],
    rng: &mut R,
) -> Option<PathBuf> {
    library_tracks(dir, extensions).choose(rng).cloned()
}

/// Apply the selection policy. `tone_output` is where a fallback tone is
/// written if one is needed.
pub async fn select_audio<R: Rng + ?Sized>(
    media: &dyn MediaOps,
    library: &Path,
    extensions: &[String],
    tone_output: &Path,
    duration: Duration,
    rng: &mut R,
) -> Option<AudioSource> {
    if let Some(track) = pick_track(library, extensions, rng) {
        tracing::info!("Using library track {}", track.display());
        return Some(AudioSource::Library(track));
    }
    tracing::info!(
        "No tracks in {}; trying a synthesized tone",
        library.display()
    );
    media
        .synthesize_tone(tone_output, duration)
        .await
        .map(AudioSource::Tone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, b"x").unwrap();
        p
    }

    #[test]
    fn filters_by_extension_case_insensitively() {
        let tmp = tempfile::tempdir().unwrap();
        let a = touch(tmp.path(), "a.MP3");
        let b = touch(tmp.path(), "b.flac");
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), "noext");
        std::fs::create_dir(tmp.path().join("dir.mp3")).unwrap();

        let tracks = library_tracks(tmp.path(), &AudioConfig::default().extensions);
        assert_eq!(tracks, vec![a, b]);
    }

    #[test]
    fn missing_library_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(library_tracks(&tmp.path().join("nope"), &AudioConfig::default().extensions)
            .is_empty());
    }

    #[test]
    fn pick_covers_every_track() {
        let tmp = tempfile::tempdir().unwrap();
        let exts = AudioConfig::default().extensions;
        let all: Vec<PathBuf> = ["1.mp3", "2.ogg", "3.wav"]
            .iter()
            .map(|n| touch(tmp.path(), n))
            .collect();
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(pick_track(tmp.path(), &exts, &mut rng).unwrap());
        }
        assert_eq!(seen.len(), all.len());
    }
}

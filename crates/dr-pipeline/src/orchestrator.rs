//! Demo generation: render → encode → gate → concat → audio → compress,
//! with scratch cleanup on every exit path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use dr_av::{TempJanitor, Workspace};
use dr_core::{ArtifactKind, FeatureSet, Stage, StageOutcome};
use dr_render::{BannerRenderer, TextEngine};

use crate::audio::{select_audio, AudioConfig, AudioSource};
use crate::media::MediaOps;

/// Default scratch retention: one day.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 3600);

/// Default constant-rate-factor for compression.
pub const DEFAULT_CRF: u8 = 28;

/// Per-run options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoOptions {
    pub clip_duration: Duration,
    pub add_music: bool,
    pub compress: bool,
    pub crf: u8,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            clip_duration: Duration::from_secs(3),
            add_music: false,
            compress: false,
            crf: DEFAULT_CRF,
        }
    }
}

/// The video a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalVideo {
    pub path: PathBuf,
    /// Contributing clips, in feature order.
    pub clips: Vec<PathBuf>,
    pub audio: Option<AudioSource>,
    pub compressed: bool,
}

/// One recorded stage result. `subject` names the feature for per-feature
/// stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageEvent {
    pub stage: Stage,
    pub subject: Option<String>,
    pub outcome: StageOutcome<PathBuf>,
}

/// Everything a run produced: the final video, if any, and what happened
/// along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoReport {
    pub video: Option<FinalVideo>,
    pub events: Vec<StageEvent>,
}

impl DemoReport {
    pub fn path(&self) -> Option<&Path> {
        self.video.as_ref().map(|v| v.path.as_path())
    }

    /// The abort that ended the run, if one did.
    pub fn aborted(&self) -> Option<&StageEvent> {
        self.events
            .iter()
            .find(|e| matches!(e.outcome, StageOutcome::Aborted { .. }))
    }

    pub fn events_for(&self, stage: Stage) -> impl Iterator<Item = &StageEvent> {
        self.events.iter().filter(move |e| e.stage == stage)
    }

    fn record(&mut self, stage: Stage, subject: Option<&str>, outcome: StageOutcome<PathBuf>) {
        match &outcome {
            StageOutcome::Success(path) => {
                tracing::debug!("[{stage}] ok: {}", path.display());
            }
            StageOutcome::Skipped { reason, .. } => {
                tracing::warn!(
                    "[{stage}] skipping '{}': {reason}",
                    subject.unwrap_or("?")
                );
            }
            StageOutcome::Degraded { reason, .. } => {
                tracing::warn!("[{stage}] continuing without this stage: {reason}");
            }
            StageOutcome::Aborted { reason, .. } => {
                tracing::error!("[{stage}] aborting run: {reason}");
            }
        }
        self.events.push(StageEvent {
            stage,
            subject: subject.map(str::to_string),
            outcome,
        });
    }
}

/// Sequences the pipeline stages over a feature set.
pub struct Orchestrator<M: MediaOps, E: TextEngine = Box<dyn TextEngine>> {
    workspace: Workspace,
    media: M,
    renderer: BannerRenderer<E>,
    audio: AudioConfig,
    janitor: TempJanitor,
    retention: Duration,
    rng: StdRng,
}

impl<M: MediaOps, E: TextEngine> Orchestrator<M, E> {
    pub fn new(workspace: Workspace, media: M, renderer: BannerRenderer<E>) -> Self {
        let janitor = workspace.janitor();
        Self {
            workspace,
            media,
            renderer,
            audio: AudioConfig::default(),
            janitor,
            retention: DEFAULT_RETENTION,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_audio(mut self, audio: AudioConfig) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Fix the random source used for track selection.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Build a demo video from `features`.
    ///
    /// Never fails: every stage failure is classified by its
    /// [`dr_core::FailurePolicy`] and recorded in the report. The scratch
    /// area is purged when this returns, whatever the outcome.
    pub async fn generate_demo(
        &mut self,
        features: &FeatureSet,
        options: &DemoOptions,
    ) -> DemoReport {
        let _cleanup = self.janitor.guard(self.retention);
        let mut report = DemoReport::default();

        if let Err(e) = self.workspace.ensure_dirs() {
            tracing::warn!("Could not prepare {}: {e}", self.workspace.root().display());
        }

        tracing::info!("Generating demo from {} feature(s)", features.len());

        // Render and encode, dropping failed features.
        let mut clips = Vec::new();
        for feature in features.iter() {
            let name = feature.name();

            let banner_path = self.workspace.banner_file();
            let rendered = self.renderer.render(feature, &banner_path);
            let banner = match Stage::Render.classify(rendered) {
                StageOutcome::Success(banner) => {
                    let outcome = StageOutcome::Success(banner.path.clone());
                    report.record(Stage::Render, Some(name), outcome);
                    banner
                }
                failed => {
                    report.record(Stage::Render, Some(name), failed.map(|b| b.path));
                    continue;
                }
            };

            let clip_path = self.workspace.temp_file(ArtifactKind::Clip);
            let encoded = self
                .media
                .encode_clip(&banner.path, &clip_path, options.clip_duration)
                .await;
            match Stage::Encode.classify(encoded) {
                StageOutcome::Success(clip) => {
                    let outcome = StageOutcome::Success(clip.path.clone());
                    report.record(Stage::Encode, Some(name), outcome);
                    clips.push(clip.path);
                }
                failed => report.record(Stage::Encode, Some(name), failed.map(|c| c.path)),
            }
        }

        if clips.is_empty() {
            report.record(Stage::Gate, None, Stage::Gate.fail("no clips were produced"));
            return report;
        }

        let list_file = self.workspace.temp_file(ArtifactKind::ConcatList);
        let concat_path = self.workspace.temp_file(ArtifactKind::Concat);
        let joined = self.media.concat(&clips, &list_file, &concat_path).await;
        let mut current = match Stage::Concat.classify(joined) {
            StageOutcome::Success(path) => {
                report.record(Stage::Concat, None, StageOutcome::Success(path.clone()));
                path
            }
            failed => {
                report.record(Stage::Concat, None, failed);
                return report;
            }
        };

        let mut audio = None;
        if options.add_music {
            let count = u32::try_from(clips.len()).unwrap_or(u32::MAX);
            let total = options.clip_duration.saturating_mul(count);
            if let Some((path, source)) = self.add_audio(&current, total, &mut report).await {
                current = path;
                audio = Some(source);
            }
        }

        let mut compressed = false;
        if options.compress {
            let out = self.workspace.temp_file(ArtifactKind::Compressed);
            let result = self.media.compress(&current, &out, options.crf).await;
            if let Some(path) = record_degradable(&mut report, Stage::Compress, result) {
                current = path;
                compressed = true;
            }
        }

        let current = match self.workspace.promote(&current) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(
                    "Could not move {} to {}: {e}; it stays in the scratch area",
                    current.display(),
                    self.workspace.output_dir().display()
                );
                current
            }
        };

        tracing::info!("Demo ready: {}", current.display());
        report.video = Some(FinalVideo {
            path: current,
            clips,
            audio,
            compressed,
        });
        report
    }

    /// Select a source and overlay it; `None` leaves `video` as the result.
    async fn add_audio(
        &mut self,
        video: &Path,
        duration: Duration,
        report: &mut DemoReport,
    ) -> Option<(PathBuf, AudioSource)> {
        let tone_path = self.workspace.temp_file(ArtifactKind::Tone);
        let source = select_audio(
            &self.media,
            self.workspace.audio_dir(),
            &self.audio.extensions,
            &tone_path,
            duration,
            &mut self.rng,
        )
        .await;

        let source = match source {
            Some(source) => {
                if let AudioSource::Tone(path) = &source {
                    report.record(Stage::Tone, None, StageOutcome::Success(path.clone()));
                }
                source
            }
            None => {
                report.record(
                    Stage::Tone,
                    None,
                    Stage::Tone.fail("no library track and no synthesized tone"),
                );
                return None;
            }
        };

        let out = self.workspace.temp_file(ArtifactKind::Music);
        let result = self.media.overlay_audio(video, source.path(), &out).await;
        record_degradable(report, Stage::Overlay, result).map(|path| (path, source))
    }
}

fn record_degradable(
    report: &mut DemoReport,
    stage: Stage,
    result: dr_core::Result<PathBuf>,
) -> Option<PathBuf> {
    let outcome = stage.classify(result);
    let path = match &outcome {
        StageOutcome::Success(path) => Some(path.clone()),
        _ => None,
    };
    report.record(stage, None, outcome);
    path
}

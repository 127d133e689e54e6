//! Work directory layout.
//!
//! A [`Workspace`] owns one root directory with fixed subdirectories:
//!
//! ```text
//! <root>/
//!   banners/      rendered banner images, purged by age
//!   audio/        audio library (scanned, never written)
//!   output/       final videos only
//!   apps/         reserved for the app-skeleton collaborator
//!   temp/         clips, intermediate videos, lists and tones; purged by age
//!   demoreel.log  append-only log
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use dr_core::{ArtifactKind, ArtifactName};

use crate::janitor::TempJanitor;

/// Subdirectory names relative to the root; each may be overridden.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceLayout {
    pub root: PathBuf,
    pub banners: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
    pub apps: PathBuf,
    pub temp: PathBuf,
    pub log_file: PathBuf,
}

impl Default for WorkspaceLayout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./demoreel-data"),
            banners: PathBuf::from("banners"),
            audio: PathBuf::from("audio"),
            output: PathBuf::from("output"),
            apps: PathBuf::from("apps"),
            temp: PathBuf::from("temp"),
            log_file: PathBuf::from("demoreel.log"),
        }
    }
}

/// Resolved directory layout for pipeline runs.
///
/// Relative entries of the layout are resolved against its root; absolute
/// entries are used as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    banners: PathBuf,
    audio: PathBuf,
    output: PathBuf,
    apps: PathBuf,
    temp: PathBuf,
    log_file: PathBuf,
}

impl Workspace {
    /// Workspace with the default subdirectory names under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_layout(&WorkspaceLayout {
            root: root.into(),
            ..WorkspaceLayout::default()
        })
    }

    /// Resolve a layout.
    pub fn from_layout(layout: &WorkspaceLayout) -> Self {
        let root = layout.root.clone();
        let resolve = |p: &Path| -> PathBuf {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            }
        };
        Self {
            banners: resolve(&layout.banners),
            audio: resolve(&layout.audio),
            output: resolve(&layout.output),
            apps: resolve(&layout.apps),
            temp: resolve(&layout.temp),
            log_file: resolve(&layout.log_file),
            root,
        }
    }

    /// Create every directory of the layout (the audio library included, so
    /// users have somewhere to drop tracks).
    pub fn ensure_dirs(&self) -> dr_core::Result<()> {
        for dir in [
            &self.root,
            &self.banners,
            &self.audio,
            &self.output,
            &self.apps,
            &self.temp,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        if let Some(parent) = self.log_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn banner_dir(&self) -> &Path {
        &self.banners
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio
    }

    pub fn output_dir(&self) -> &Path {
        &self.output
    }

    pub fn apps_dir(&self) -> &Path {
        &self.apps
    }

    /// Scratch area for everything a run supersedes.
    pub fn temp_dir(&self) -> &Path {
        &self.temp
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Fresh path for a banner image.
    pub fn banner_file(&self) -> PathBuf {
        ArtifactName::new(ArtifactKind::Banner).in_dir(&self.banners)
    }

    /// Fresh path for an intermediate artifact (`Clip`, `Concat`, `Music`,
    /// `Compressed`, `ConcatList`, `Tone`) in the scratch area.
    pub fn temp_file(&self, kind: ArtifactKind) -> PathBuf {
        ArtifactName::new(kind).in_dir(&self.temp)
    }

    /// Move a finished video into the output directory, keeping its name.
    ///
    /// Falls back to copy-and-remove when a rename is not possible (for
    /// example across filesystems).
    pub fn promote(&self, artifact: &Path) -> dr_core::Result<PathBuf> {
        let name = artifact.file_name().ok_or_else(|| {
            dr_core::Error::Validation(format!("{} has no file name", artifact.display()))
        })?;
        std::fs::create_dir_all(&self.output)?;
        let target = self.output.join(name);
        if std::fs::rename(artifact, &target).is_err() {
            std::fs::copy(artifact, &target)?;
            if let Err(e) = std::fs::remove_file(artifact) {
                tracing::debug!("left {} behind: {e}", artifact.display());
            }
        }
        Ok(target)
    }

    /// Janitor over everything a run leaves behind: the scratch area and
    /// the banners.
    pub fn janitor(&self) -> TempJanitor {
        TempJanitor::new(&self.temp).with_dir(&self.banners)
    }
}

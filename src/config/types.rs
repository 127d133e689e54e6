use serde::{Deserialize, Serialize};

use dr_av::{ToolsConfig, WorkspaceLayout};
use dr_core::{Feature, FeatureSet};
use dr_pipeline::{AudioConfig, ClipConfig, DEFAULT_CRF};
use dr_render::RenderConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: WorkspaceLayout,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub clip: ClipConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub compress: CompressConfig,

    #[serde(default)]
    pub cleanup: CleanupConfig,

    #[serde(default)]
    pub health: HealthConfig,

    /// Features to render, in order. Empty means the built-in set.
    #[serde(default)]
    pub features: Vec<FeatureEntry>,
}

impl Config {
    /// The configured features, or the built-in set when none are listed.
    pub fn feature_set(&self) -> dr_core::Result<FeatureSet> {
        if self.features.is_empty() {
            return Ok(FeatureSet::default_set());
        }
        self.features
            .iter()
            .map(|f| Feature::new(f.name.clone(), f.value))
            .collect()
    }
}

/// One `[[features]]` entry. Values outside 0..=100 are clamped.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureEntry {
    pub name: String,

    #[serde(default = "default_feature_value")]
    pub value: i64,
}

fn default_feature_value() -> i64 {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompressConfig {
    /// Constant rate factor, 0 (lossless) to 51 (worst)
    #[serde(default = "default_crf")]
    pub crf: u8,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self { crf: default_crf() }
    }
}

fn default_crf() -> u8 {
    DEFAULT_CRF
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CleanupConfig {
    /// Scratch files older than this are deleted after every run
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            retention_hours: default_retention_hours(),
        }
    }
}

fn default_retention_hours() -> u64 {
    24
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> u64 {
    30
}

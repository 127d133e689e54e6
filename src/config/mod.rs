mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use dr_av::invocation::MAX_CRF;
use dr_pipeline::MediaSettings;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./demoreel.toml", "~/.config/demoreel/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    config.render.validate().context("Invalid [render] section")?;
    config.clip.validate().context("Invalid [clip] section")?;

    if config.compress.crf > MAX_CRF {
        anyhow::bail!("crf {} exceeds {}", config.compress.crf, MAX_CRF);
    }

    if config.tools.timeout_secs == 0 || config.tools.compress_timeout_secs == 0 {
        anyhow::bail!("Tool timeouts must be positive");
    }

    if config.health.poll_interval_secs == 0 {
        anyhow::bail!("Health poll interval must be positive");
    }

    if config.audio.tone_frequency_hz == 0 {
        anyhow::bail!("Tone frequency must be positive");
    }

    let mut seen = HashSet::new();
    for entry in &config.features {
        let name = entry.name.trim();
        if name.is_empty() {
            anyhow::bail!("Feature names cannot be empty");
        }
        if !seen.insert(name) {
            anyhow::bail!("Feature '{}' is listed more than once", name);
        }
    }

    if !config.paths.root.exists() {
        tracing::debug!(
            "Work root {:?} does not exist yet; it is created on first run",
            config.paths.root
        );
    }

    Ok(())
}

impl Config {
    /// Clip, tone and mux settings for the ffmpeg-backed media operations.
    pub fn media_settings(&self) -> MediaSettings {
        MediaSettings {
            fps: self.clip.fps,
            retry: self.clip.retry(),
            tone_hz: self.audio.tone_frequency_hz,
            audio_bitrate: self.audio.bitrate.clone(),
        }
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.cleanup.retention_hours.saturating_mul(3600))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.health.poll_interval_secs)
    }
}

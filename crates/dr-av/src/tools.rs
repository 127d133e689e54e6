//! External tool detection and management.
//!
//! The [`ToolRegistry`] discovers and caches the location of ffmpeg and
//! carries the per-call timeouts the actions apply: a short default for
//! encode/concat/mux/probe calls and a longer one for re-encoding.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::DEFAULT_TIMEOUT;

/// Default timeout for compression: 10 minutes.
pub const DEFAULT_COMPRESS_TIMEOUT: Duration = Duration::from_secs(600);

/// Known tool names that the registry manages.
const KNOWN_TOOLS: &[&str] = &["ffmpeg"];

/// Tool paths and timeouts, as read from the `[tools]` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Explicit ffmpeg location; `PATH` is searched when unset or missing.
    pub ffmpeg_path: Option<PathBuf>,
    /// Timeout for render-adjacent calls (encode, concat, mux, probe).
    pub timeout_secs: u64,
    /// Timeout for the compression re-encode.
    pub compress_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            compress_timeout_secs: DEFAULT_COMPRESS_TIMEOUT.as_secs(),
        }
    }
}

/// Configuration for a single discovered tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Human-readable tool name (e.g. "ffmpeg").
    pub name: String,
    /// Resolved path to the executable.
    pub path: PathBuf,
}

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of `-version` output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool configurations.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolConfig>,
    timeout: Duration,
    compress_timeout: Duration,
}

impl ToolRegistry {
    /// Discover tools by searching `PATH` (or using overrides from config).
    ///
    /// If the config supplies a custom path **and** that path exists, it is
    /// used directly. Otherwise [`which::which`] is used to locate the tool
    /// in `PATH`. Tools that are not found are omitted from the registry.
    pub fn discover(config: &ToolsConfig) -> Self {
        let mut registry = Self::empty(config);

        for &name in KNOWN_TOOLS {
            let custom_path = match name {
                "ffmpeg" => config.ffmpeg_path.as_deref(),
                _ => None,
            };

            let resolved = match custom_path {
                Some(p) if p.exists() => Some(p.to_path_buf()),
                Some(p) => {
                    tracing::warn!(
                        "Configured {name} path {} does not exist; searching PATH",
                        p.display()
                    );
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            match resolved {
                Some(path) => {
                    tracing::debug!("Found {name} at {}", path.display());
                    registry = registry.with_tool(name, path);
                }
                None => tracing::debug!("{name} not found"),
            }
        }

        registry
    }

    /// A registry with no tools, using the timeouts from `config`.
    pub fn empty(config: &ToolsConfig) -> Self {
        Self {
            tools: HashMap::new(),
            timeout: Duration::from_secs(config.timeout_secs),
            compress_timeout: Duration::from_secs(config.compress_timeout_secs),
        }
    }

    /// Builder: register `name` at an explicit `path`.
    pub fn with_tool(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.tools.insert(
            name.to_string(),
            ToolConfig {
                name: name.to_string(),
                path: path.into(),
            },
        );
        self
    }

    /// Builder: override both timeouts.
    pub fn with_timeouts(mut self, timeout: Duration, compress_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.compress_timeout = compress_timeout;
        self
    }

    /// Return a reference to the [`ToolConfig`] for the given tool, or a
    /// [`dr_core::Error::Tool`] if the tool was not found during discovery.
    pub fn require(&self, name: &str) -> dr_core::Result<&ToolConfig> {
        self.tools.get(name).ok_or_else(|| {
            dr_core::Error::tool(name, format!("{name} not found; is it installed and in PATH?"))
        })
    }

    /// Whether `name` was discovered.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Timeout applied to ordinary tool calls.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Timeout applied to the compression re-encode.
    pub fn compress_timeout(&self) -> Duration {
        self.compress_timeout
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(cfg) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(name, &cfg.path),
                    path: Some(cfg.path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

/// Run `<tool> -version` (or `--version` for non-ffmpeg tools) and return
/// the first line of stdout.
fn detect_version(name: &str, path: &Path) -> Option<String> {
    let version_arg = match name {
        "ffmpeg" => "-version",
        _ => "--version",
    };

    let output = std::process::Command::new(path)
        .arg(version_arg)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}

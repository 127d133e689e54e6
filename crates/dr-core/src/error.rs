//! Unified error type for the demoreel pipeline.
//!
//! All crates funnel their failures into [`Error`]. The orchestrator never
//! lets one escape a run: each stage's error is classified into a
//! [`StageOutcome`](crate::StageOutcome) instead.

use std::process::ExitStatus;

/// Unified error type covering all failure modes in demoreel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool could not be located or spawned, or timed out.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// An external tool ran to completion but exited unsuccessfully.
    #[error("Tool error [{tool}]: exited with {}: {}", describe_code(.code), .stderr.trim())]
    ToolExit {
        /// Name of the tool that failed.
        tool: String,
        /// Exit code, `None` when the process was killed by a signal.
        code: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },

    /// Banner rendering failed.
    #[error("Render error: {0}")]
    Render(String),

    /// A pipeline stage failed.
    #[error("Pipeline error [{step}]: {message}")]
    Pipeline {
        /// The pipeline step that failed.
        step: String,
        /// Human-readable error description.
        message: String,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "signal".to_string(),
    }
}

impl Error {
    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Build an [`Error::ToolExit`] from a finished process.
    pub fn tool_exit(
        tool: impl Into<String>,
        status: ExitStatus,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Error::ToolExit {
            tool: tool.into(),
            code: status.code(),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Convenience constructor for [`Error::Pipeline`].
    pub fn pipeline(step: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Pipeline {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Render`].
    pub fn render(message: impl Into<String>) -> Self {
        Error::Render(message.into())
    }

    /// Exit code of a failed tool run, if this error carries one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::ToolExit { code, .. } => *code,
            _ => None,
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display() {
        let err = Error::Validation("feature name is empty".into());
        assert_eq!(err.to_string(), "Validation error: feature name is empty");
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn tool_display() {
        let err = Error::tool("ffmpeg", "timed out after 2s");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: timed out after 2s");
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn tool_exit_display_trims_stderr() {
        let err = Error::ToolExit {
            tool: "ffmpeg".into(),
            code: Some(1),
            stdout: String::new(),
            stderr: "Invalid data found\n".into(),
        };
        assert_eq!(
            err.to_string(),
            "Tool error [ffmpeg]: exited with exit code 1: Invalid data found"
        );
        assert_eq!(err.exit_code(), Some(1));
    }

    #[test]
    fn tool_exit_without_code_reports_signal() {
        let err = Error::ToolExit {
            tool: "ffmpeg".into(),
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(err.to_string().contains("signal"));
    }

    #[test]
    fn pipeline_display() {
        let err = Error::pipeline("concat", "no clips");
        assert_eq!(err.to_string(), "Pipeline error [concat]: no clips");
    }

    #[test]
    fn render_display() {
        let err = Error::render("canvas too small");
        assert_eq!(err.to_string(), "Render error: canvas too small");
    }
}

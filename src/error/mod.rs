//! Error types for posture-audit.
//!
//! Strategy implementations never surface these to the aggregator: a failing
//! strategy is reported as absence in the manifest. The types here cover the
//! process boundary (root path, configuration, output) and the internals of
//! strategies before their failures are folded into `None`.

mod context;

pub use context::{IoOperation, ParseFormat};

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all posture-audit operations.
#[derive(Error, Debug)]
pub enum PostureError {
    /// I/O operation failed.
    #[error("Failed to {operation} {path}: {source}")]
    Io {
        path: PathBuf,
        operation: IoOperation,
        #[source]
        source: std::io::Error,
    },

    /// Scan root does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Scan root is not a directory.
    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// External tool invocation failed.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Translation of an external tool's output failed.
    #[error("Failed to parse {format} output in {path}")]
    Parse {
        path: PathBuf,
        format: ParseFormat,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PostureError {
    /// Create an I/O error with operation context.
    pub fn io(path: impl Into<PathBuf>, operation: IoOperation, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Create a JSON parse error for a tool output file.
    pub fn json_parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            format: ParseFormat::Json,
            source: Box::new(source),
        }
    }
}

/// Errors raised while spawning or waiting on an external tool.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{program} not found. Please install it or adjust the configuration.")]
    NotFound { program: String },

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Result type alias for posture-audit operations.
pub type Result<T> = std::result::Result<T, PostureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_a_directory() {
        let err = PostureError::NotADirectory(PathBuf::from("/path/to/file"));
        assert_eq!(err.to_string(), "Path is not a directory: /path/to/file");
    }

    #[test]
    fn test_error_display_io() {
        let err = PostureError::io(
            "/staging/nginx.conf",
            IoOperation::Copy,
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "Failed to copy /staging/nginx.conf: denied");
    }

    #[test]
    fn test_error_display_tool_failed() {
        let err: PostureError = ToolError::Failed {
            program: "trivy".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "boom".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "trivy exited with exit status: 1: boom");
    }

    #[test]
    fn test_error_display_tool_not_found() {
        let err = ToolError::NotFound {
            program: "semgrep".to_string(),
        };
        assert!(err.to_string().starts_with("semgrep not found"));
    }

    #[test]
    fn test_error_from_config_error() {
        let err: PostureError =
            ConfigError::UnsupportedFormat("cfg.ini".to_string(), "ini".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Unsupported config format for cfg.ini: .ini"
        );
    }
}

//! Error type for the site build pipeline.
//!
//! Page-level expansion failures are not errors at this layer; they are
//! collected per file in [`BuildStats`](crate::site::BuildStats) so one bad
//! template cannot stop the rest of the build. `BuildError` covers the
//! conditions that do stop a build: unusable configuration and filesystem
//! failures on the output side.

use std::fmt;
use std::path::PathBuf;

/// A fatal build-pipeline error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// `site.toml` could not be read or parsed, or its contents failed
    /// validation.
    Config {
        /// Human-readable description of what was wrong.
        message: String,
    },
    /// A filesystem operation on the given path failed. Output-side I/O is
    /// not recoverable per file, so the build aborts.
    Io {
        /// The path the operation touched.
        path: PathBuf,
        /// The underlying OS error, rendered.
        message: String,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Config { message } => {
                write!(f, "configuration error: {}", message)
            }
            BuildError::Io { path, message } => {
                write!(f, "i/o error on '{}': {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for BuildError {}

impl BuildError {
    /// Wrap an `std::io::Error` with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Build a configuration error from any displayable message.
    pub fn config(message: impl Into<String>) -> Self {
        BuildError::Config {
            message: message.into(),
        }
    }
}

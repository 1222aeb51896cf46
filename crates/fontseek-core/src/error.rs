//! Error and warning types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while preparing a scan or loading settings.
///
/// A running scan never returns these; per-entry failures are turned into
/// [`ScanWarning`]s and the walk moves on.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Settings file could not be parsed.
    #[error("Invalid settings file {path}: {message}")]
    Settings { path: PathBuf, message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Downgrade into the warning recorded by a scan.
    pub fn into_warning(self) -> ScanWarning {
        let message = self.to_string();
        match self {
            Self::PermissionDenied { path } => {
                ScanWarning::new(path, message, WarningKind::PermissionDenied)
            }
            Self::NotFound { path } => ScanWarning::new(path, message, WarningKind::NotFound),
            Self::Io { path, .. } | Self::Settings { path, .. } => {
                ScanWarning::new(path, message, WarningKind::ReadError)
            }
            Self::InvalidConfig { .. } => {
                ScanWarning::new(PathBuf::new(), message, WarningKind::ReadError)
            }
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Symbolic link target does not exist.
    BrokenSymlink,
    /// Error reading a file or directory.
    ReadError,
    /// A configured root does not exist.
    NotFound,
}

/// Non-fatal problem skipped during a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a broken symlink warning.
    pub fn broken_symlink(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Broken symlink: {}", path.display()),
            path,
            kind: WarningKind::BrokenSymlink,
        }
    }

    /// Create a warning from an I/O error, classifying it by error kind.
    pub fn from_io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        ScanError::io(path, error).into_warning()
    }
}

//! Error types for per-thread logging.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Coarse classification of a [`LogError`], useful for matching without
/// destructuring the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogErrorKind {
    Config,
    Create,
    Write,
    Close,
}

/// Errors surfaced by [`crate::ThreadLogger::log`] and [`crate::ThreadLogger::clear`].
#[derive(Debug)]
pub enum LogError {
    /// The temp directory setting is missing or empty.
    Config { message: String },
    /// The per-thread log file could not be created or opened.
    Create {
        dir: PathBuf,
        source: std::io::Error,
    },
    /// Writing or flushing a line failed. The handle stays registered.
    Write {
        path: PathBuf,
        message: String,
        source: std::io::Error,
    },
    /// Flushing or closing during `clear()` failed. The handle is removed anyway.
    Close {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl LogError {
    pub fn kind(&self) -> LogErrorKind {
        match self {
            Self::Config { .. } => LogErrorKind::Config,
            Self::Create { .. } => LogErrorKind::Create,
            Self::Write { .. } => LogErrorKind::Write,
            Self::Close { .. } => LogErrorKind::Close,
        }
    }
}

impl Display for LogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config { message } => write!(f, "failed to find tmp directory: {}", message),
            Self::Create { dir, source } => write!(
                f,
                "failed to create log file in '{}': {}",
                dir.display(),
                source
            ),
            Self::Write {
                path,
                message,
                source,
            } => write!(
                f,
                "logging a line to '{}' failed: {}: {}",
                path.display(),
                message,
                source
            ),
            Self::Close { path, source } => {
                write!(f, "failed to close log '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config { .. } => None,
            Self::Create { source, .. }
            | Self::Write { source, .. }
            | Self::Close { source, .. } => Some(source),
        }
    }
}

/// Result type for logging operations.
pub type LogResult<T> = Result<T, LogError>;

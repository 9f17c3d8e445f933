// src/error.rs

//! Error types for recipe parsing, cooking, and verification

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure class, used by callers to tell install failures
/// apart from a package that installed but failed its self-test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Source unreachable, digest mismatch, or unresolved build dependency
    Resolution,
    /// Isolated build environment could not be constructed
    Environment,
    /// A declared library dependency could not be fetched
    DependencyFetch,
    /// The toolchain failed to produce or install the artifact
    Build,
    /// Recipe could not be read or is malformed
    Recipe,
    /// Anything else (filesystem, missing files)
    Other,
}

impl ErrorCategory {
    /// Get the category name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Resolution => "resolution",
            ErrorCategory::Environment => "environment",
            ErrorCategory::DependencyFetch => "dependency-fetch",
            ErrorCategory::Build => "build",
            ErrorCategory::Recipe => "recipe",
            ErrorCategory::Other => "other",
        }
    }
}

/// Errors raised while parsing or cooking a recipe
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Required tool not found: {0}")]
    ToolNotFound(String),

    #[error("Download failed: {0}")]
    DownloadError(String),

    #[error("Source fetch failed: {0}")]
    SourceFetchFailed(String),

    #[error("Checksum mismatch for {source_ref}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        source_ref: String,
        expected: String,
        actual: String,
    },

    #[error("Resolution failed: {0}")]
    ResolutionError(String),

    #[error("Build environment error: {0}")]
    EnvironmentError(String),

    #[error("Failed to fetch dependency {package}: {message}")]
    DependencyFetchError { package: String, message: String },

    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error("Install failed: {0}")]
    InstallFailed(String),
}

impl Error {
    /// Classify this error by the phase that raised it
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::DownloadError(_)
            | Error::SourceFetchFailed(_)
            | Error::ChecksumMismatch { .. }
            | Error::ResolutionError(_) => ErrorCategory::Resolution,
            Error::EnvironmentError(_) => ErrorCategory::Environment,
            Error::DependencyFetchError { .. } => ErrorCategory::DependencyFetch,
            Error::BuildFailed(_) | Error::InstallFailed(_) => ErrorCategory::Build,
            Error::ParseError(_) => ErrorCategory::Recipe,
            Error::IoError(_) | Error::NotFound(_) | Error::ToolNotFound(_) => {
                ErrorCategory::Other
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

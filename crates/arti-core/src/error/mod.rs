//! Error types and result aliases for resolver operations.
//!
//! Provides a unified error type covering endpoint parsing, registry
//! transport, archive handling and configuration, with the short error
//! codes the host package manager displays next to failure messages.

use thiserror::Error;

/// Unified error type for all resolver operations.
///
/// Variants carry owned message data rather than boxed sources so the
/// type is `Clone`: a failure on a shared in-flight metadata fetch is
/// delivered to every caller awaiting it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtiError {
    // Endpoint errors
    #[error("'{reference}' is not a valid artifactory package source")]
    InvalidSource {
        reference: String,
        details: Option<String>,
    },

    #[error("no artifactory registry found in configuration")]
    RegistryNotFound,

    // Transport errors
    #[error("request to {url} failed: {message}")]
    Transport {
        url: String,
        message: String,
        code: Option<String>,
    },

    #[error("tag/branch '{target}' does not exist")]
    TargetNotFound {
        target: String,
        details: Option<String>,
    },

    #[error("request to {url} failed with status {status}")]
    InvalidResponse { url: String, status: u16 },

    // Local errors
    #[error("failed to extract archive {archive}: {message}")]
    Extraction { archive: String, message: String },

    #[error("{message}")]
    Io {
        message: String,
        kind: std::io::ErrorKind,
    },

    // Config errors
    #[error("failed to parse configuration: {message}")]
    Config { message: String },
}

/// Result type alias for resolver operations
pub type ArtiResult<T> = Result<T, ArtiError>;

impl ArtiError {
    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io {
            kind: source.kind(),
            message: format!("{message}: {source}"),
        }
    }

    /// Short error code shown to the user alongside the message
    pub fn code(&self) -> &str {
        match self {
            ArtiError::InvalidSource { .. } | ArtiError::RegistryNotFound => "EINVEND",
            ArtiError::Transport { code, .. } => code.as_deref().unwrap_or("ETRANSPORT"),
            ArtiError::TargetNotFound { .. } => "ENORESTARGET",
            ArtiError::InvalidResponse { .. } => "EINVRES",
            ArtiError::Extraction { .. } => "EEXTRACT",
            ArtiError::Io { .. } => "EIO",
            ArtiError::Config { .. } => "ECONFIG",
        }
    }

    /// Server-provided diagnostic text, when the registry supplied one
    pub fn details(&self) -> Option<&str> {
        match self {
            ArtiError::InvalidSource { details, .. } => details.as_deref(),
            ArtiError::TargetNotFound { details, .. } => details.as_deref(),
            _ => None,
        }
    }

    /// Whether the host may usefully fall back to another resolution
    /// strategy after this failure
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ArtiError::Transport { .. } | ArtiError::Extraction { .. } | ArtiError::Io { .. }
        )
    }
}

//! Error types for the documentation engine

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building the registry or resolving section content
#[derive(Debug, Error)]
pub enum DocsError {
    /// A manifest or content file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid JSON for the expected shape
    #[error("Invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    /// Two sections or sub-items share a key
    #[error("Duplicate section key: {0}")]
    DuplicateKey(String),

    /// A section has neither content, a loader, nor sub-items
    #[error("Section '{0}' has no content, no loader and no sub-items")]
    EmptySection(String),

    /// A loader reported a failure
    #[error("Failed to load section '{key}': {reason}")]
    Load {
        /// Section whose loader failed
        key: String,
        /// Human readable cause
        reason: String,
    },
}

impl DocsError {
    /// Build an I/O error for the given path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Check if retrying the same operation could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, DocsError::Io { .. } | DocsError::Load { .. })
    }
}

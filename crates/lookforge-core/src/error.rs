//! Unified error handling for Lookforge
//!
//! This module provides a comprehensive error type that encompasses
//! all possible errors across the Lookforge crates.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all Lookforge operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    // ==================== Scene Errors ====================

    /// Scene description could not be built
    #[error("Invalid scene description: {message}")]
    SceneDescription {
        message: String,
    },

    /// A node referenced by name does not exist in the scene
    #[error("Unknown node: {name}")]
    UnknownNode {
        name: String,
    },

    /// Nothing is selected, so there is nothing to publish
    #[error("Nothing selected")]
    NothingSelected,

    // ==================== Asset Errors ====================

    /// The scene path does not sit under an `assets` directory
    #[error("No asset found for scene: {scene}")]
    AssetNotFound {
        scene: PathBuf,
    },

    // ==================== Export Errors ====================

    /// Geometry cache export failed
    #[error("Cache export failed: {message}")]
    CacheExportFailed {
        message: String,
    },

    /// Graph serialization failed
    #[error("Graph serialization failed: {message}")]
    SerializeFailed {
        message: String,
    },

    // ==================== General Errors ====================

    /// Operation cancelled by the user
    #[error("Operation cancelled")]
    Cancelled,

    /// Internal error (should not happen)
    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },

    /// Custom error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },

    /// External error (from other crates)
    #[error("{0}")]
    External(String),
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Create a scene description error
    pub fn scene_description(message: impl Into<String>) -> Self {
        Error::SceneDescription {
            message: message.into(),
        }
    }

    /// Create an unknown node error
    pub fn unknown_node(name: impl Into<String>) -> Self {
        Error::UnknownNode { name: name.into() }
    }

    /// Create a cache export error
    pub fn cache_export(message: impl Into<String>) -> Self {
        Error::CacheExportFailed {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialize(message: impl Into<String>) -> Self {
        Error::SerializeFailed {
            message: message.into(),
        }
    }

    /// Check if this is a "not found" type error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::FileNotFound(_) | Error::UnknownNode { .. } | Error::AssetNotFound { .. }
        )
    }

    /// Check if this error came from the user declining a confirmation
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled => true,
            Error::WithContext { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Check if this is a fatal collaborator failure
    pub fn is_export_failure(&self) -> bool {
        matches!(
            self,
            Error::CacheExportFailed { .. } | Error::SerializeFailed { .. }
        )
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_with_context() {
        let err = Error::FileNotFound(PathBuf::from("/test"));
        let contextualized = err.with_context("while swapping textures");

        assert!(contextualized.to_string().contains("while swapping textures"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::FileNotFound(PathBuf::from("/test")).is_not_found());
        assert!(Error::unknown_node("merge1").is_not_found());
        assert!(!Error::Cancelled.is_not_found());
    }

    #[test]
    fn test_is_cancelled_through_context() {
        let err = Error::Cancelled.with_context("color set check");
        assert!(err.is_cancelled());
        assert!(!Error::NothingSelected.is_cancelled());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::FileNotFound(PathBuf::from("/test")));
        let with_context = result.context("loading scene");

        assert!(with_context.is_err());
        assert!(with_context.unwrap_err().to_string().contains("loading scene"));
    }
}

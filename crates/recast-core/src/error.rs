//! Error types for Recast operations
//!
//! Only conditions that stop a file from being processed are errors. Sites the
//! engine cannot reason about are reported as [`crate::Diagnostic`]s instead.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Recast operations
#[derive(Debug, Error)]
pub enum RecastError {
    /// Source text could not be turned into a tree
    #[error("Parse error: {message} at offset {offset}")]
    ParseError { message: String, offset: usize },

    /// Printing the freshly parsed tree did not reproduce the input
    #[error("Round-trip mismatch{}: {message}", path_suffix(.path))]
    RoundTrip {
        path: Option<PathBuf>,
        message: String,
    },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// A textual match pattern could not be parsed
    #[error("Invalid match pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Recipe lookup or construction errors
    #[error("Recipe error in '{recipe}': {message}")]
    RecipeError { recipe: String, message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" in '{}'", p.display()))
        .unwrap_or_default()
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    RoundTrip,
    Config,
    Pattern,
    Recipe,
    Io,
    Internal,
}

impl RecastError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecastError::ParseError { .. } => ErrorKind::Parse,
            RecastError::RoundTrip { .. } => ErrorKind::RoundTrip,
            RecastError::ConfigError { .. } => ErrorKind::Config,
            RecastError::InvalidPattern { .. } => ErrorKind::Pattern,
            RecastError::RecipeError { .. } => ErrorKind::Recipe,
            RecastError::IoError { .. } => ErrorKind::Io,
            RecastError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error is recoverable (can continue processing other files)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Parse | ErrorKind::RoundTrip | ErrorKind::Io
        )
    }

    /// Create a parse error
    pub fn parse_error(message: impl Into<String>, offset: usize) -> Self {
        Self::ParseError {
            message: message.into(),
            offset,
        }
    }

    /// Create a round-trip error, optionally tied to a file
    pub fn round_trip(message: impl Into<String>) -> Self {
        Self::RoundTrip {
            path: None,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a recipe error
    pub fn recipe_error(recipe: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecipeError {
            recipe: recipe.into(),
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Attach a file path to errors that carry one
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            RecastError::RoundTrip { message, .. } => RecastError::RoundTrip {
                path: Some(path.into()),
                message,
            },
            other => other,
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for RecastError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(RecastError::parse_error("x", 0).kind(), ErrorKind::Parse);
        assert_eq!(RecastError::config_error("x").kind(), ErrorKind::Config);
        assert_eq!(
            RecastError::invalid_pattern("a b(", "x").kind(),
            ErrorKind::Pattern
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(RecastError::round_trip("mismatch").is_recoverable());
        assert!(!RecastError::config_error("bad").is_recoverable());
        assert!(!RecastError::internal_error("bug").is_recoverable());
    }

    #[test]
    fn test_round_trip_display_with_path() {
        let err = RecastError::round_trip("printed text differs").with_path("src/Foo.java");
        assert_eq!(
            err.to_string(),
            "Round-trip mismatch in 'src/Foo.java': printed text differs"
        );
        let bare = RecastError::round_trip("printed text differs");
        assert_eq!(bare.to_string(), "Round-trip mismatch: printed text differs");
    }
}

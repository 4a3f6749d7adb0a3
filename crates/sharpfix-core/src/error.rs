//! Error types and handling for code-fix operations

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for code-fix operations
#[derive(Debug, Error)]
pub enum SharpfixError {
    /// Source text could not be turned into a usable tree
    #[error("Parse error: {message} at offset {offset}")]
    ParseError { message: String, offset: usize },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Configuration file could not be decoded
    #[error("Invalid configuration in '{path}': {message}")]
    InvalidConfigFile { path: PathBuf, message: String },

    /// A code-fix provider failed for a specific rule
    #[error("Fix error in '{rule_id}': {message}")]
    FixError { rule_id: String, message: String },

    /// A descriptor names a rule with no registered provider
    #[error("No code fix registered for rule '{rule_id}'")]
    UnknownRule { rule_id: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Semantic model query failures
    #[error("Semantic error: {message}")]
    SemanticError { message: String },

    /// The operation observed a cancellation request
    #[error("Operation cancelled")]
    Cancelled,

    /// A hand-written helper reached a state that well-formed callers can
    /// never produce
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Config,
    Fix,
    Io,
    Semantic,
    Cancelled,
    InvalidOperation,
}

impl SharpfixError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SharpfixError::ParseError { .. } => ErrorKind::Parse,
            SharpfixError::ConfigError { .. } => ErrorKind::Config,
            SharpfixError::InvalidConfigFile { .. } => ErrorKind::Config,
            SharpfixError::FixError { .. } => ErrorKind::Fix,
            SharpfixError::UnknownRule { .. } => ErrorKind::Fix,
            SharpfixError::IoError { .. } => ErrorKind::Io,
            SharpfixError::SemanticError { .. } => ErrorKind::Semantic,
            SharpfixError::Cancelled => ErrorKind::Cancelled,
            SharpfixError::InvalidOperation { .. } => ErrorKind::InvalidOperation,
        }
    }

    /// Check if this error is recoverable (other documents can still be
    /// processed)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Parse | ErrorKind::Fix | ErrorKind::Semantic
        )
    }

    /// Create a parse error
    pub fn parse_error(message: impl Into<String>, offset: usize) -> Self {
        Self::ParseError {
            message: message.into(),
            offset,
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a configuration file error
    pub fn invalid_config_file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidConfigFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a fix error
    pub fn fix_error(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FixError {
            rule_id: rule_id.into(),
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

    /// Create a semantic error
    pub fn semantic_error(message: impl Into<String>) -> Self {
        Self::SemanticError {
            message: message.into(),
        }
    }

    /// Create an invalid-operation error
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for SharpfixError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}

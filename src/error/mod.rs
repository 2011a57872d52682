//! Error handling for the key rotation subsystem
//!
//! Only configuration problems and an empty pool ever reach a caller.
//! Storage errors are produced by the snapshot stores, but the manager
//! downgrades them to log lines: persistence is best-effort.

pub mod types;

use thiserror::Error;
use tracing::{error, warn};

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String, line: Option<usize> },

    // Key management
    #[error("No API keys configured for category '{category}'")]
    NoKeysConfigured { category: String },

    // Storage errors
    #[error("Storage persistence failed: {message}")]
    StoragePersistence { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("IO operation failed: {operation} - {message}")]
    Io { operation: String, message: String },
}

impl AppError {
    /// Create a new configuration validation error
    pub fn config_validation(message: impl Into<String>, field: Option<impl Into<String>>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
            field: field.map(Into::into),
        }
    }

    pub fn io(operation: impl Into<String>, err: &std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    /// Short machine-friendly category used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigValidation { .. } | Self::ConfigNotFound { .. } | Self::ConfigParse { .. } => {
                "configuration"
            }
            Self::NoKeysConfigured { .. } => "key_management",
            Self::StoragePersistence { .. } | Self::Serialization { .. } | Self::Io { .. } => {
                "storage"
            }
        }
    }

    /// Whether the error stops the operation that produced it.
    ///
    /// Storage failures never do: the in-memory state stays authoritative.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind(), "storage")
    }

    /// Log the error with appropriate level
    pub fn log(&self, operation: &str) {
        if self.is_fatal() {
            error!(
                error = %self,
                error_kind = self.kind(),
                operation,
                "Key rotation error occurred"
            );
        } else {
            warn!(
                error = %self,
                error_kind = self.kind(),
                operation,
                "Non-fatal storage error, continuing with in-memory state"
            );
        }
    }
}

/// Result type alias for the crate
pub type Result<T, E = AppError> = std::result::Result<T, E>;

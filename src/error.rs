//! Custom error types for trailkeeper
//!
//! This module defines the error hierarchy for the audit subsystem using
//! thiserror for ergonomic error definitions.

use thiserror::Error;

/// The main error type for audit-trail operations
#[derive(Error, Debug)]
pub enum AuditError {
    /// Caller contract violation: an authenticated actor was required but
    /// not supplied. This is the one error the dispatch wrapper re-raises.
    #[error("Invalid actor: {0}")]
    InvalidActor(String),

    /// The record store is unavailable or a write failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Malformed filter input to the selector layer
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Storage lock or index errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },
}

impl AuditError {
    /// Create a "not found" error for audit records
    pub fn record_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "AuditRecord",
            identifier: identifier.into(),
        }
    }

    /// Create an invalid-actor error with the standard message
    pub fn missing_actor() -> Self {
        Self::InvalidActor("valid authenticated actor required for audit logging".into())
    }

    /// Check if this is an invalid-actor error (always re-raised by the
    /// dispatch wrapper)
    pub fn is_invalid_actor(&self) -> bool {
        matches!(self, Self::InvalidActor(_))
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a persistence error
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for AuditError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for audit-trail operations
pub type AuditResult<T> = Result<T, AuditError>;

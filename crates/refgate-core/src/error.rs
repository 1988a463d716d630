//! Unified error type and stable error codes.
//!
//! Every subsystem error is converted into [`GateError`] before it reaches
//! the CLI, which renders it as a JSON error envelope with a numeric code
//! from [`OutputErrorCode`]:
//!
//! - `2`: invalid arguments or configuration (unknown metadata kind,
//!   malformed reference value)
//! - `3`: resolution errors (definition file absent, empty extraction)
//! - `4`: query transport failure
//! - `10`: internal errors (bugs, unexpected state)
//!
//! There is no recovered or degraded mode: every error here is fatal and
//! aborts the run before a report is printed.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::category::Category;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output and process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments or configuration from the caller.
    InvalidArguments = 2,
    /// Resolution errors (definition file absent, nothing extracted).
    ResolutionError = 3,
    /// Remote query transport failure.
    QueryError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for the verification pipeline.
#[derive(Debug, Error)]
pub enum GateError {
    /// Metadata kind is not in the type profile registry.
    #[error("unknown metadata kind '{kind}'")]
    UnknownMetadataKind { kind: String },

    /// Definition document missing at the resolved path.
    #[error("definition file not found: {}", path.display())]
    DefinitionNotFound { path: PathBuf },

    /// Extraction produced no references of any category.
    #[error("no references extracted from {}", path.display())]
    EmptyDocument { path: PathBuf },

    /// A reference value failed validation before planning.
    #[error("invalid {category} reference '{value}': {reason}")]
    InvalidReference {
        category: Category,
        value: String,
        reason: String,
    },

    /// Remote query failed; the run aborts with no partial report.
    #[error("query against {entity} failed: {message}")]
    QueryFailed { entity: String, message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&GateError> for OutputErrorCode {
    fn from(err: &GateError) -> Self {
        match err {
            GateError::UnknownMetadataKind { .. } => OutputErrorCode::InvalidArguments,
            GateError::InvalidReference { .. } => OutputErrorCode::InvalidArguments,
            GateError::DefinitionNotFound { .. } => OutputErrorCode::ResolutionError,
            GateError::EmptyDocument { .. } => OutputErrorCode::ResolutionError,
            GateError::QueryFailed { .. } => OutputErrorCode::QueryError,
            GateError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<GateError> for OutputErrorCode {
    fn from(err: GateError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl GateError {
    /// Create an unknown-kind error.
    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        GateError::UnknownMetadataKind { kind: kind.into() }
    }

    /// Create an invalid-reference error.
    pub fn invalid_reference(
        category: Category,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        GateError::InvalidReference {
            category,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a query-failed error.
    pub fn query_failed(entity: impl Into<String>, message: impl fmt::Display) -> Self {
        GateError::QueryFailed {
            entity: entity.into(),
            message: message.to_string(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        GateError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

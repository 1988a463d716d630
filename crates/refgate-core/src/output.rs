//! JSON output types for CLI responses.
//!
//! These types form the machine-readable contract of the tool. Every
//! response carries `status` as its first field and a schema version for
//! forward compatibility; errors carry the stable numeric code from the
//! error table. Same input produces the same output: field order is fixed
//! by declaration, array order by the pipeline's deterministic ordering.

use std::io::{self, Write};

use serde::Serialize;

use crate::error::{GateError, OutputErrorCode};
use crate::report::MissingReference;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Response Structs
// ============================================================================

/// Response for the `verify` command.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResponse {
    /// Always `"ok"`: a completed run is a success regardless of how many
    /// references were missing.
    pub status: String,
    /// Response schema version.
    pub schema_version: String,
    /// Metadata kind that was verified.
    pub kind: String,
    /// Name of the verified object.
    pub name: String,
    /// Total references checked.
    pub checked: usize,
    /// References that could not be confirmed.
    pub missing: Vec<MissingReference>,
}

impl VerifyResponse {
    /// Build a verify response.
    pub fn new(
        kind: impl Into<String>,
        name: impl Into<String>,
        checked: usize,
        missing: Vec<MissingReference>,
    ) -> Self {
        VerifyResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            kind: kind.into(),
            name: name.into(),
            checked,
            missing,
        }
    }
}

/// One registered metadata kind, for `kinds` output.
#[derive(Debug, Clone, Serialize)]
pub struct KindInfo {
    /// Kind identifier.
    pub kind: String,
    /// Definition path template relative to the source root.
    pub path: String,
}

/// Response for the `kinds` command.
#[derive(Debug, Clone, Serialize)]
pub struct KindsResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Response schema version.
    pub schema_version: String,
    /// Registered kinds in registry order.
    pub kinds: Vec<KindInfo>,
}

impl KindsResponse {
    /// Build a kinds response.
    pub fn new(kinds: Vec<KindInfo>) -> Self {
        KindsResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            kinds,
        }
    }
}

// ============================================================================
// Error Envelope
// ============================================================================

/// Error payload inside an [`ErrorResponse`].
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    /// Create from a [`GateError`].
    pub fn from_error(err: &GateError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();

        let details = match err {
            GateError::UnknownMetadataKind { kind } => {
                Some(serde_json::json!({ "kind": kind }))
            }
            GateError::DefinitionNotFound { path } | GateError::EmptyDocument { path } => {
                Some(serde_json::json!({ "path": path.display().to_string() }))
            }
            GateError::InvalidReference {
                category,
                value,
                reason,
            } => Some(serde_json::json!({
                "category": category,
                "value": value,
                "reason": reason,
            })),
            GateError::QueryFailed { entity, .. } => {
                Some(serde_json::json!({ "entity": entity }))
            }
            GateError::InternalError { .. } => None,
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

/// Top-level error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Always `"error"`.
    pub status: String,
    /// Response schema version.
    pub schema_version: String,
    /// The error payload.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Build an error response from a [`GateError`].
    pub fn from_error(err: &GateError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Serialize a response as pretty JSON followed by a newline.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, response).map_err(io::Error::other)?;
    writeln!(writer)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;

    #[test]
    fn verify_response_puts_status_first() {
        let response = VerifyResponse::new("application", "Console", 3, vec![]);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.starts_with("{\"status\":\"ok\""));
    }

    #[test]
    fn missing_entries_serialize_with_category_and_reference() {
        let response = VerifyResponse::new(
            "permission-set",
            "Sales_Admin",
            2,
            vec![MissingReference {
                category: Category::Field,
                reference: "Account.Custom_Field__c".to_string(),
            }],
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value["missing"][0],
            serde_json::json!({
                "category": "field",
                "reference": "Account.Custom_Field__c",
            })
        );
    }

    #[test]
    fn error_info_carries_the_stable_code() {
        let err = GateError::unknown_kind("flow");
        let info = ErrorInfo::from_error(&err);
        assert_eq!(info.code, 2);
        assert_eq!(info.details, Some(serde_json::json!({ "kind": "flow" })));
    }

    #[test]
    fn query_failure_details_name_the_entity() {
        let err = GateError::query_failed("CustomField", "exit status 1");
        let info = ErrorInfo::from_error(&err);
        assert_eq!(info.code, 4);
        assert_eq!(
            info.details,
            Some(serde_json::json!({ "entity": "CustomField" }))
        );
    }

    #[test]
    fn emit_response_appends_a_newline() {
        let mut out = Vec::new();
        emit_response(&KindsResponse::new(vec![]), &mut out).unwrap();
        assert!(out.ends_with(b"\n"));
    }
}

//! Reference categories and name normalization rules.
//!
//! A [`Category`] names one class of cross-reference that a definition
//! document may contain. Each category compares either by a flat name or by
//! a composite `(parent, child)` key, and some categories apply a transform
//! to the captured value before it is ever compared against the org:
//!
//! - the built-in `Admin` profile is stored under its display name
//!   `System Administrator`, because that is what the org returns;
//! - custom-object (`__c`) and custom-metadata (`__mdt`) suffixes are
//!   stripped from query keys, never from the reported value.
//!
//! All transforms here are idempotent. Extraction, planning, and
//! reconciliation call the same functions, so a value is never compared
//! against a differently-normalized twin.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Shorthand profile name accepted in definition documents.
pub const ADMIN_PROFILE_ALIAS: &str = "Admin";

/// Display name the org reports for the built-in admin profile.
pub const ADMIN_PROFILE_NAME: &str = "System Administrator";

/// API-name suffix marking a custom object or custom field.
pub const CUSTOM_OBJECT_SUFFIX: &str = "__c";

/// API-name suffix marking a custom metadata type.
pub const CUSTOM_METADATA_SUFFIX: &str = "__mdt";

// ============================================================================
// Category
// ============================================================================

/// A class of cross-referenced org entity.
///
/// Declaration order is the stable category order used by the metadata
/// document and all serialized artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    /// Custom application referenced by a permission set.
    Application,
    /// Apex class enabled by a permission set.
    ApexClass,
    /// Flexi page backing an action override.
    Content,
    /// Object field, composite `Object.Field`.
    Field,
    /// Content asset used as an application logo.
    Logo,
    /// Custom object or custom setting.
    Object,
    /// Custom metadata type, distinguished by the `__mdt` suffix.
    CustomMetadataType,
    /// Profile named by an action override assignment.
    Profile,
    /// Record type, composite `Object.RecordType`.
    RecordType,
    /// Workspace tab.
    Tab,
    /// Utility bar flexi page.
    UtilityBar,
}

/// Comparison key shape for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Compared by a single name.
    Flat,
    /// Compared by a `(parent, child)` pair split on the first `.`.
    Composite,
}

impl Category {
    /// Identifier used in reports and serialized documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Application => "application",
            Category::ApexClass => "apexClass",
            Category::Content => "content",
            Category::Field => "field",
            Category::Logo => "logo",
            Category::Object => "object",
            Category::CustomMetadataType => "customMetadataType",
            Category::Profile => "profile",
            Category::RecordType => "recordType",
            Category::Tab => "tab",
            Category::UtilityBar => "utilityBar",
        }
    }

    /// Comparison key shape for this category.
    pub fn key_kind(&self) -> KeyKind {
        match self {
            Category::Field | Category::RecordType => KeyKind::Composite,
            _ => KeyKind::Flat,
        }
    }

    /// Normalize a captured value for storage.
    ///
    /// Applied once, at extraction time, before dedup. The only transform
    /// at this stage is the admin profile alias; suffix stripping is a
    /// query-key concern and must not touch the stored value.
    pub fn normalize(&self, raw: &str) -> String {
        match self {
            Category::Profile => normalize_profile(raw).to_string(),
            _ => raw.to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Normalization Helpers
// ============================================================================

/// Rewrite the `Admin` alias to the profile display name.
pub fn normalize_profile(value: &str) -> &str {
    if value == ADMIN_PROFILE_ALIAS {
        ADMIN_PROFILE_NAME
    } else {
        value
    }
}

/// Strip a trailing custom-object marker (`__c`) if present.
pub fn strip_custom_suffix(value: &str) -> &str {
    value.strip_suffix(CUSTOM_OBJECT_SUFFIX).unwrap_or(value)
}

/// Strip a trailing custom-metadata marker (`__mdt`) if present.
pub fn strip_metadata_suffix(value: &str) -> &str {
    value.strip_suffix(CUSTOM_METADATA_SUFFIX).unwrap_or(value)
}

// ============================================================================
// Tests
// ============================================================================

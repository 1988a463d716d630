//! Type profile registry: what each metadata kind contains and where it lives.
//!
//! A [`TypeProfile`] binds a [`MetadataKind`] to the file path template of
//! its definition document and to the ordered list of `<tag>` matchers the
//! extractor may interpret in it. The registry is static: adding a kind
//! means adding a profile table here.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::GateError;

// ============================================================================
// Constants
// ============================================================================

/// Default source-format root for definition documents.
pub const DEFAULT_SOURCE_DIR: &str = "force-app/main/default";

// ============================================================================
// Metadata Kind
// ============================================================================

/// Metadata kind whose definition document can be audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataKind {
    /// Custom application (`.app-meta.xml`).
    Application,
    /// Permission set (`.permissionset-meta.xml`).
    PermissionSet,
}

impl MetadataKind {
    /// All registered kinds, in registry order.
    pub fn all() -> &'static [MetadataKind] {
        &[MetadataKind::Application, MetadataKind::PermissionSet]
    }

    /// Identifier used on the CLI and in JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataKind::Application => "application",
            MetadataKind::PermissionSet => "permission-set",
        }
    }
}

impl FromStr for MetadataKind {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "application" => Ok(MetadataKind::Application),
            "permission-set" => Ok(MetadataKind::PermissionSet),
            other => Err(GateError::unknown_kind(other)),
        }
    }
}

impl std::fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Type Profiles
// ============================================================================

/// One extractable `<tag>` and the category its values belong to.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    /// XML tag name, matched as a same-line `<tag>value</tag>` pair.
    pub tag: &'static str,
    /// Category the captured value is recorded under.
    pub category: Category,
}

/// Registry entry for one metadata kind.
#[derive(Debug, Clone, Copy)]
pub struct TypeProfile {
    /// The kind this profile describes.
    pub kind: MetadataKind,
    /// Directory under the source root holding these documents.
    pub dir: &'static str,
    /// File name suffix appended to the object name.
    pub suffix: &'static str,
    /// Ordered matcher table; at most one matcher claims a line.
    pub matchers: &'static [Matcher],
}

const APPLICATION_MATCHERS: &[Matcher] = &[
    Matcher {
        tag: "tabs",
        category: Category::Tab,
    },
    Matcher {
        tag: "logo",
        category: Category::Logo,
    },
    Matcher {
        tag: "profile",
        category: Category::Profile,
    },
    Matcher {
        tag: "content",
        category: Category::Content,
    },
    Matcher {
        tag: "utilityBar",
        category: Category::UtilityBar,
    },
    Matcher {
        tag: "recordType",
        category: Category::RecordType,
    },
];

const PERMISSION_SET_MATCHERS: &[Matcher] = &[
    Matcher {
        tag: "application",
        category: Category::Application,
    },
    Matcher {
        tag: "apexClass",
        category: Category::ApexClass,
    },
    Matcher {
        tag: "tab",
        category: Category::Tab,
    },
    Matcher {
        tag: "field",
        category: Category::Field,
    },
    Matcher {
        tag: "object",
        category: Category::Object,
    },
    Matcher {
        tag: "recordType",
        category: Category::RecordType,
    },
    // Discriminator: only __mdt values count; plain names route to Object.
    Matcher {
        tag: "name",
        category: Category::CustomMetadataType,
    },
];

const APPLICATION_PROFILE: TypeProfile = TypeProfile {
    kind: MetadataKind::Application,
    dir: "applications",
    suffix: ".app-meta.xml",
    matchers: APPLICATION_MATCHERS,
};

const PERMISSION_SET_PROFILE: TypeProfile = TypeProfile {
    kind: MetadataKind::PermissionSet,
    dir: "permissionsets",
    suffix: ".permissionset-meta.xml",
    matchers: PERMISSION_SET_MATCHERS,
};

impl TypeProfile {
    /// Look up the profile for a kind.
    pub fn for_kind(kind: MetadataKind) -> &'static TypeProfile {
        match kind {
            MetadataKind::Application => &APPLICATION_PROFILE,
            MetadataKind::PermissionSet => &PERMISSION_SET_PROFILE,
        }
    }

    /// Resolve the definition document path for a named object.
    pub fn definition_path(&self, source_dir: &Path, name: &str) -> PathBuf {
        source_dir.join(self.dir).join(format!("{}{}", name, self.suffix))
    }

    /// Path template shown in `kinds` output, relative to the source root.
    pub fn path_template(&self) -> String {
        format!("{}/<name>{}", self.dir, self.suffix)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod kind_parsing {
        use super::*;

        #[test]
        fn known_kinds_parse() {
            assert_eq!(
                "application".parse::<MetadataKind>().unwrap(),
                MetadataKind::Application
            );
            assert_eq!(
                "permission-set".parse::<MetadataKind>().unwrap(),
                MetadataKind::PermissionSet
            );
        }

        #[test]
        fn unknown_kind_is_a_configuration_error() {
            let err = "flow".parse::<MetadataKind>().unwrap_err();
            assert_eq!(err.error_code().code(), 2);
        }

        #[test]
        fn display_round_trips() {
            for kind in MetadataKind::all() {
                assert_eq!(kind.as_str().parse::<MetadataKind>().unwrap(), *kind);
            }
        }
    }

    mod path_resolution {
        use super::*;

        #[test]
        fn application_path() {
            let profile = TypeProfile::for_kind(MetadataKind::Application);
            let path = profile.definition_path(Path::new("force-app/main/default"), "Console");
            assert_eq!(
                path,
                Path::new("force-app/main/default/applications/Console.app-meta.xml")
            );
        }

        #[test]
        fn permission_set_path() {
            let profile = TypeProfile::for_kind(MetadataKind::PermissionSet);
            let path = profile.definition_path(Path::new("src"), "Sales_Admin");
            assert_eq!(
                path,
                Path::new("src/permissionsets/Sales_Admin.permissionset-meta.xml")
            );
        }
    }

    mod matcher_tables {
        use super::*;

        #[test]
        fn application_profile_has_no_discriminator() {
            let profile = TypeProfile::for_kind(MetadataKind::Application);
            assert!(profile
                .matchers
                .iter()
                .all(|m| m.category != Category::CustomMetadataType));
        }

        #[test]
        fn permission_set_profile_ends_with_discriminator() {
            let profile = TypeProfile::for_kind(MetadataKind::PermissionSet);
            let last = profile.matchers.last().unwrap();
            assert_eq!(last.tag, "name");
            assert_eq!(last.category, Category::CustomMetadataType);
        }

        #[test]
        fn tags_are_unique_within_a_profile() {
            for kind in MetadataKind::all() {
                let profile = TypeProfile::for_kind(*kind);
                let mut tags: Vec<_> = profile.matchers.iter().map(|m| m.tag).collect();
                tags.sort_unstable();
                tags.dedup();
                assert_eq!(tags.len(), profile.matchers.len());
            }
        }
    }
}

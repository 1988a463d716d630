//! Query planning: from document categories to executable existence queries.
//!
//! For each non-empty category the planner decides the target queryable
//! entity, the query mode (standard or tooling), and the key transform
//! applied to each value before it is compared against the org. Composite
//! categories (`field`, `recordType`) are split into `(parent, child)`
//! pairs and grouped by parent, one plan per distinct parent.
//!
//! Every planned value keeps both the original reference (what the report
//! shows) and the query key (what the org is asked about). Suffix stripping
//! only ever touches the query key.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::category::{strip_custom_suffix, strip_metadata_suffix, Category, KeyKind};
use crate::document::MetadataDocument;
use crate::error::GateError;

// ============================================================================
// Types
// ============================================================================

/// Query execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Regular data query.
    Standard,
    /// Tooling API query, required for setup entities.
    Tooling,
}

/// One reference inside a plan's scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedValue {
    /// The reference as extracted; used for reporting, never transformed.
    pub original: String,
    /// The comparison key sent to and matched against the org.
    pub query_key: String,
}

/// A single existence query against one target entity.
#[derive(Debug, Clone, Serialize)]
pub struct QueryPlan {
    /// Category this plan verifies.
    pub category: Category,
    /// Target queryable entity.
    pub entity: &'static str,
    /// Field holding the comparable name on the target entity.
    pub name_field: &'static str,
    /// Query execution mode.
    pub mode: QueryMode,
    /// Filter field scoping a composite plan to its parent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_field: Option<&'static str>,
    /// Parent name (suffix-stripped) for composite plans.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// References in this plan's scope.
    pub values: Vec<PlannedValue>,
}

impl QueryPlan {
    /// Number of references this plan expects the org to confirm.
    pub fn expected(&self) -> usize {
        self.values.len()
    }

    /// Render the plan as a SOQL existence query.
    pub fn soql(&self) -> String {
        let keys: Vec<String> = self
            .values
            .iter()
            .map(|v| format!("'{}'", quote_literal(&v.query_key)))
            .collect();
        match (&self.parent_field, &self.parent) {
            (Some(field), Some(parent)) => format!(
                "SELECT {0} FROM {1} WHERE {2} = '{3}' AND {0} IN ({4})",
                self.name_field,
                self.entity,
                field,
                quote_literal(parent),
                keys.join(", ")
            ),
            _ => format!(
                "SELECT {0} FROM {1} WHERE {0} IN ({2})",
                self.name_field,
                self.entity,
                keys.join(", ")
            ),
        }
    }
}

/// Escape a string for use inside a single-quoted SOQL literal.
fn quote_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

// ============================================================================
// Target Table
// ============================================================================

struct Target {
    entity: &'static str,
    name_field: &'static str,
    mode: QueryMode,
    /// Transform from stored value to query key (flat) or child key (composite).
    key: fn(&str) -> &str,
}

fn identity(value: &str) -> &str {
    value
}

fn target(category: Category) -> Target {
    match category {
        Category::Application => Target {
            entity: "AppDefinition",
            name_field: "DeveloperName",
            mode: QueryMode::Standard,
            key: identity,
        },
        Category::ApexClass => Target {
            entity: "ApexClass",
            name_field: "Name",
            mode: QueryMode::Standard,
            key: identity,
        },
        Category::Content | Category::UtilityBar => Target {
            entity: "FlexiPage",
            name_field: "DeveloperName",
            mode: QueryMode::Tooling,
            key: identity,
        },
        Category::Field => Target {
            entity: "CustomField",
            name_field: "DeveloperName",
            mode: QueryMode::Tooling,
            key: strip_custom_suffix,
        },
        Category::Logo => Target {
            entity: "ContentAsset",
            name_field: "DeveloperName",
            mode: QueryMode::Standard,
            key: identity,
        },
        Category::Object => Target {
            entity: "EntityDefinition",
            name_field: "DeveloperName",
            mode: QueryMode::Standard,
            key: strip_custom_suffix,
        },
        Category::CustomMetadataType => Target {
            entity: "EntityDefinition",
            name_field: "DeveloperName",
            mode: QueryMode::Standard,
            key: strip_metadata_suffix,
        },
        Category::Profile => Target {
            entity: "Profile",
            name_field: "Name",
            mode: QueryMode::Standard,
            key: identity,
        },
        Category::RecordType => Target {
            entity: "RecordType",
            name_field: "DeveloperName",
            mode: QueryMode::Standard,
            key: identity,
        },
        Category::Tab => Target {
            entity: "TabDefinition",
            name_field: "Name",
            mode: QueryMode::Standard,
            key: identity,
        },
    }
}

/// Filter field scoping a composite category to its parent entity.
fn parent_field(category: Category) -> &'static str {
    match category {
        Category::Field => "EntityDefinition.DeveloperName",
        Category::RecordType => "SobjectType",
        _ => unreachable!("parent_field is only defined for composite categories"),
    }
}

// ============================================================================
// Planning
// ============================================================================

/// Plan the queries for one category's values.
pub fn plan_category(category: Category, values: &[String]) -> Result<Vec<QueryPlan>, GateError> {
    let target = target(category);
    match category.key_kind() {
        KeyKind::Flat => Ok(vec![QueryPlan {
            category,
            entity: target.entity,
            name_field: target.name_field,
            mode: target.mode,
            parent_field: None,
            parent: None,
            values: values
                .iter()
                .map(|v| PlannedValue {
                    original: v.clone(),
                    query_key: (target.key)(v).to_string(),
                })
                .collect(),
        }]),
        KeyKind::Composite => {
            // Group children by their suffix-stripped parent. Parent
            // stripping is independent of the per-child transform.
            let mut groups: BTreeMap<String, Vec<PlannedValue>> = BTreeMap::new();
            for value in values {
                let (parent, child) = split_composite(category, value)?;
                groups
                    .entry(strip_custom_suffix(parent).to_string())
                    .or_default()
                    .push(PlannedValue {
                        original: value.clone(),
                        query_key: (target.key)(child).to_string(),
                    });
            }
            Ok(groups
                .into_iter()
                .map(|(parent, values)| QueryPlan {
                    category,
                    entity: target.entity,
                    name_field: target.name_field,
                    mode: target.mode,
                    parent_field: Some(parent_field(category)),
                    parent: Some(parent),
                    values,
                })
                .collect())
        }
    }
}

/// Split a composite value into `(parent, child)` on the first `.`.
///
/// A value with no separator, or an empty half, is rejected before any
/// query executes.
fn split_composite<'a>(
    category: Category,
    value: &'a str,
) -> Result<(&'a str, &'a str), GateError> {
    match value.split_once('.') {
        Some((parent, child)) if !parent.is_empty() && !child.is_empty() => Ok((parent, child)),
        _ => Err(GateError::invalid_reference(
            category,
            value,
            "expected a composite 'Parent.Child' value",
        )),
    }
}

/// Plan all queries for a document, in stable category order.
pub fn plan_document(document: &MetadataDocument) -> Result<Vec<QueryPlan>, GateError> {
    let mut plans = Vec::new();
    for (category, values) in document.iter() {
        plans.extend(plan_category(category, values)?);
    }
    Ok(plans)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn values(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    mod flat_plans {
        use super::*;

        #[test]
        fn one_plan_per_flat_category() {
            let plans =
                plan_category(Category::Profile, &values(&["Sales User", "Support"])).unwrap();
            assert_eq!(plans.len(), 1);
            assert_eq!(plans[0].entity, "Profile");
            assert_eq!(plans[0].mode, QueryMode::Standard);
            assert_eq!(plans[0].expected(), 2);
        }

        #[test]
        fn object_keys_strip_custom_suffix_but_keep_original() {
            let plans =
                plan_category(Category::Object, &values(&["Account", "Invoice__c"])).unwrap();
            let planned = &plans[0].values;
            assert_eq!(planned[0].original, "Account");
            assert_eq!(planned[0].query_key, "Account");
            assert_eq!(planned[1].original, "Invoice__c");
            assert_eq!(planned[1].query_key, "Invoice");
        }

        #[test]
        fn custom_metadata_keys_strip_mdt_suffix() {
            let plans =
                plan_category(Category::CustomMetadataType, &values(&["Feature_Flag__mdt"]))
                    .unwrap();
            assert_eq!(plans[0].entity, "EntityDefinition");
            assert_eq!(plans[0].values[0].query_key, "Feature_Flag");
            assert_eq!(plans[0].values[0].original, "Feature_Flag__mdt");
        }

        #[test]
        fn content_and_utility_bar_share_the_tooling_target() {
            let content = plan_category(Category::Content, &values(&["Record_Page"])).unwrap();
            let bar = plan_category(Category::UtilityBar, &values(&["Console_Utility"])).unwrap();
            assert_eq!(content[0].entity, "FlexiPage");
            assert_eq!(bar[0].entity, "FlexiPage");
            assert_eq!(content[0].mode, QueryMode::Tooling);
            assert_eq!(bar[0].mode, QueryMode::Tooling);
        }

        #[test]
        fn flat_soql_filters_on_the_name_field() {
            let plans = plan_category(Category::Tab, &values(&["Account", "Invoice__c"])).unwrap();
            assert_eq!(
                plans[0].soql(),
                "SELECT Name FROM TabDefinition WHERE Name IN ('Account', 'Invoice__c')"
            );
        }
    }

    mod composite_plans {
        use super::*;

        #[test]
        fn children_group_by_parent() {
            let plans = plan_category(
                Category::RecordType,
                &values(&["Account.Business", "Account.Person", "Case.Support"]),
            )
            .unwrap();
            assert_eq!(plans.len(), 2);
            assert_eq!(plans[0].parent.as_deref(), Some("Account"));
            assert_eq!(plans[0].expected(), 2);
            assert_eq!(plans[1].parent.as_deref(), Some("Case"));
            assert_eq!(plans[1].expected(), 1);
        }

        #[test]
        fn field_plans_require_tooling_mode() {
            let plans = plan_category(Category::Field, &values(&["Account.Rating"])).unwrap();
            assert_eq!(plans[0].mode, QueryMode::Tooling);
            assert_eq!(plans[0].entity, "CustomField");
        }

        #[test]
        fn field_children_strip_custom_suffix() {
            let plans =
                plan_category(Category::Field, &values(&["Account.Custom_Field__c"])).unwrap();
            assert_eq!(plans[0].values[0].query_key, "Custom_Field");
            assert_eq!(plans[0].values[0].original, "Account.Custom_Field__c");
        }

        #[test]
        fn record_type_children_are_not_stripped() {
            let plans =
                plan_category(Category::RecordType, &values(&["Invoice__c.Draft"])).unwrap();
            assert_eq!(plans[0].values[0].query_key, "Draft");
        }

        #[test]
        fn custom_object_parents_are_stripped_independently() {
            let fields =
                plan_category(Category::Field, &values(&["Invoice__c.Amount__c"])).unwrap();
            assert_eq!(fields[0].parent.as_deref(), Some("Invoice"));
            let record_types =
                plan_category(Category::RecordType, &values(&["Invoice__c.Draft"])).unwrap();
            assert_eq!(record_types[0].parent.as_deref(), Some("Invoice"));
        }

        #[test]
        fn composite_soql_scopes_to_the_parent() {
            let plans = plan_category(
                Category::Field,
                &values(&["Account.Industry", "Account.Rating__c"]),
            )
            .unwrap();
            assert_eq!(
                plans[0].soql(),
                "SELECT DeveloperName FROM CustomField \
                 WHERE EntityDefinition.DeveloperName = 'Account' \
                 AND DeveloperName IN ('Industry', 'Rating')"
            );
        }

        #[test]
        fn separator_less_value_is_rejected() {
            let err = plan_category(Category::Field, &values(&["NoSeparator"])).unwrap_err();
            assert!(matches!(err, GateError::InvalidReference { .. }));
            assert_eq!(err.error_code().code(), 2);
        }

        #[test]
        fn empty_halves_are_rejected() {
            assert!(plan_category(Category::RecordType, &values(&[".Draft"])).is_err());
            assert!(plan_category(Category::RecordType, &values(&["Account."])).is_err());
        }
    }

    mod soql_quoting {
        use super::*;

        #[test]
        fn single_quotes_are_escaped() {
            let plans = plan_category(Category::Profile, &values(&["O'Brien Profile"])).unwrap();
            assert_eq!(
                plans[0].soql(),
                "SELECT Name FROM Profile WHERE Name IN ('O\\'Brien Profile')"
            );
        }
    }

    mod document_planning {
        use super::*;
        use crate::extract::Accumulator;

        #[test]
        fn plans_follow_document_category_order() {
            let mut acc = Accumulator::new();
            acc.record(Category::Tab, "Account");
            acc.record(Category::ApexClass, "InvoiceController");
            acc.record(Category::Field, "Account.Rating");
            let doc = MetadataDocument::from_accumulator(acc);
            let plans = plan_document(&doc).unwrap();
            let order: Vec<Category> = plans.iter().map(|p| p.category).collect();
            assert_eq!(
                order,
                [Category::ApexClass, Category::Field, Category::Tab]
            );
        }
    }
}

//! The canonical metadata document: category → sorted distinct references.
//!
//! Built once per run from the extractor's accumulator, then consumed
//! read-only by the planner. The serialized copy written next to the run is
//! a side effect for inspection; later stages read the in-memory document,
//! never the file.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::extract::Accumulator;

// ============================================================================
// Metadata Document
// ============================================================================

/// Mapping from category to its sorted, distinct reference values.
///
/// Invariants:
/// - no duplicate values within a category;
/// - values sorted ascending for reproducible diffing;
/// - categories with zero values are absent, not empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataDocument {
    categories: BTreeMap<Category, Vec<String>>,
}

impl MetadataDocument {
    /// Build the canonical document from an accumulator.
    ///
    /// Deduplicates defensively (the extractor already dedups, but the
    /// builder must not assume) and sorts each category's values.
    pub fn from_accumulator(acc: Accumulator) -> Self {
        let mut categories = BTreeMap::new();
        for (category, values) in acc.into_values() {
            let distinct: BTreeSet<String> = values.into_iter().collect();
            if !distinct.is_empty() {
                categories.insert(category, distinct.into_iter().collect());
            }
        }
        MetadataDocument { categories }
    }

    /// Values for one category, if present.
    pub fn get(&self, category: Category) -> Option<&[String]> {
        self.categories.get(&category).map(Vec::as_slice)
    }

    /// Iterate categories in stable order with their values.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[String])> {
        self.categories.iter().map(|(c, v)| (*c, v.as_slice()))
    }

    /// Total reference count across all categories.
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Whether the document holds no references at all.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn acc(entries: &[(Category, &str)]) -> Accumulator {
        let mut acc = Accumulator::new();
        for (category, value) in entries {
            acc.record(*category, *value);
        }
        acc
    }

    mod building {
        use super::*;

        #[test]
        fn values_are_sorted_ascending() {
            let doc = MetadataDocument::from_accumulator(acc(&[
                (Category::Tab, "Zebra"),
                (Category::Tab, "Alpha"),
                (Category::Tab, "Middle"),
            ]));
            assert_eq!(
                doc.get(Category::Tab).unwrap(),
                ["Alpha", "Middle", "Zebra"]
            );
        }

        #[test]
        fn repeated_recordings_collapse_to_one_value() {
            let mut raw = Accumulator::new();
            raw.record(Category::Object, "Invoice__c");
            raw.record(Category::Object, "Invoice__c");
            let doc = MetadataDocument::from_accumulator(raw);
            assert_eq!(doc.get(Category::Object).unwrap(), ["Invoice__c"]);
        }

        #[test]
        fn empty_categories_are_absent() {
            let doc = MetadataDocument::from_accumulator(acc(&[(Category::Profile, "Sales User")]));
            assert!(doc.get(Category::Tab).is_none());
            assert_eq!(doc.len(), 1);
        }

        #[test]
        fn empty_accumulator_builds_empty_document() {
            let doc = MetadataDocument::from_accumulator(Accumulator::new());
            assert!(doc.is_empty());
        }
    }

    mod serialization {
        use super::*;

        #[test]
        fn serializes_with_category_keys() {
            let doc = MetadataDocument::from_accumulator(acc(&[
                (Category::RecordType, "Account.Business"),
                (Category::ApexClass, "InvoiceController"),
            ]));
            let json = serde_json::to_value(&doc).unwrap();
            assert_eq!(
                json,
                serde_json::json!({
                    "apexClass": ["InvoiceController"],
                    "recordType": ["Account.Business"],
                })
            );
        }

        #[test]
        fn round_trips_through_json() {
            let doc = MetadataDocument::from_accumulator(acc(&[
                (Category::Field, "Account.Rating"),
                (Category::Field, "Account.Industry"),
            ]));
            let json = serde_json::to_string(&doc).unwrap();
            let back: MetadataDocument = serde_json::from_str(&json).unwrap();
            assert_eq!(back, doc);
        }
    }
}

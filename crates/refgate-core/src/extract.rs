//! Reference extraction from definition documents.
//!
//! The extractor streams a definition document one line at a time and
//! matches each line against the active profile's `<tag>value</tag>`
//! matchers. There is no XML parse and no well-formedness requirement;
//! only individual tag pairs on a single line are interpreted, which is
//! exactly how the source format lays these documents out.
//!
//! Captured values are normalized (profile alias) and deduplicated into an
//! [`Accumulator`] that the caller owns and passes forward. The same
//! reference may appear many times in a document; it is recorded once.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::category::{Category, CUSTOM_METADATA_SUFFIX};
use crate::error::GateError;
use crate::profile::TypeProfile;

// ============================================================================
// Error Types
// ============================================================================

/// Errors from extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Definition document missing at the resolved path.
    #[error("definition file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// IO error while reading the document.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<ExtractError> for GateError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::NotFound { path } => GateError::DefinitionNotFound { path },
            ExtractError::Io { path, source } => {
                GateError::internal(format!("failed to read {}: {}", path.display(), source))
            }
        }
    }
}

// ============================================================================
// Accumulator
// ============================================================================

/// Per-category reference collection with a dedup index.
///
/// The accumulator is explicit state: the extractor builds one and returns
/// it, the document builder consumes it. Nothing here is ambient.
#[derive(Debug, Default)]
pub struct Accumulator {
    values: BTreeMap<Category, Vec<String>>,
    seen: HashSet<(Category, String)>,
}

impl Accumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Accumulator::default()
    }

    /// Record a normalized value under a category.
    ///
    /// Returns `true` if the value was new, `false` if the
    /// `(category, value)` pair had been seen before.
    pub fn record(&mut self, category: Category, value: impl Into<String>) -> bool {
        let value = value.into();
        if !self.seen.insert((category, value.clone())) {
            return false;
        }
        self.values.entry(category).or_default().push(value);
        true
    }

    /// Total recorded references across all categories.
    pub fn len(&self) -> usize {
        self.values.values().map(Vec::len).sum()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume the accumulator, yielding per-category insertion-order values.
    pub fn into_values(self) -> BTreeMap<Category, Vec<String>> {
        self.values
    }
}

// ============================================================================
// Extraction
// ============================================================================

struct CompiledMatcher {
    category: Category,
    pattern: Regex,
}

/// Compile the profile's matcher table into line patterns.
fn compile_matchers(profile: &TypeProfile) -> Vec<CompiledMatcher> {
    profile
        .matchers
        .iter()
        .map(|m| CompiledMatcher {
            category: m.category,
            // Tags are static identifiers; no escaping needed.
            pattern: Regex::new(&format!("<{0}>([^<]+)</{0}>", m.tag))
                .unwrap_or_else(|e| unreachable!("invalid matcher pattern for <{}>: {e}", m.tag)),
        })
        .collect()
}

/// Route a captured value to its final category.
///
/// The `name` tag is a discriminator: only values carrying the custom
/// metadata suffix belong to [`Category::CustomMetadataType`]; plain names
/// under that tag are custom settings and belong to [`Category::Object`].
fn route(matched: Category, value: &str) -> Category {
    if matched == Category::CustomMetadataType && !value.ends_with(CUSTOM_METADATA_SUFFIX) {
        Category::Object
    } else {
        matched
    }
}

/// Extract all typed references from a definition document.
///
/// Fails fast if the document does not exist; no partial accumulator is
/// ever produced.
pub fn extract_document(path: &Path, profile: &TypeProfile) -> Result<Accumulator, ExtractError> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ExtractError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ExtractError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let matchers = compile_matchers(profile);
    let mut acc = Accumulator::new();

    for line in content.lines() {
        // At most one matcher claims a line; tags are unique per profile.
        for matcher in &matchers {
            if let Some(cap) = matcher.pattern.captures(line) {
                let raw = cap[1].trim();
                if raw.is_empty() {
                    break;
                }
                let category = route(matcher.category, raw);
                let value = category.normalize(raw);
                if acc.record(category, value) {
                    debug!(category = %category, value = raw, "captured reference");
                }
                break;
            }
        }
    }

    debug!(
        path = %path.display(),
        references = acc.len(),
        "extraction complete"
    );
    Ok(acc)
}

// ============================================================================
// Tests
// ============================================================================

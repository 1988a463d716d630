//! Verdict aggregation and the final report.
//!
//! The report collects every verdict across all plans and renders the
//! unresolved references. It is read-only: it never re-queries or
//! re-extracts, and completion with missing entries is still a successful
//! run (absence is reported, not treated as failure).

use std::io::{self, Write};

use serde::Serialize;

use crate::category::Category;
use crate::reconcile::{Outcome, Verdict};

// ============================================================================
// Types
// ============================================================================

/// One unresolved reference, annotated for the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingReference {
    /// Category the reference belongs to.
    pub category: Category,
    /// The original (pre-stripped) reference value.
    pub reference: String,
}

/// Aggregated verdicts for a completed run.
#[derive(Debug, Clone)]
pub struct Report {
    verdicts: Vec<Verdict>,
}

impl Report {
    /// Build a report from collected verdicts.
    pub fn new(verdicts: Vec<Verdict>) -> Self {
        Report { verdicts }
    }

    /// All verdicts, in plan execution order.
    pub fn verdicts(&self) -> &[Verdict] {
        &self.verdicts
    }

    /// Number of references checked.
    pub fn checked(&self) -> usize {
        self.verdicts.len()
    }

    /// The unresolved references, in verdict order.
    pub fn missing(&self) -> Vec<MissingReference> {
        self.verdicts
            .iter()
            .filter(|v| v.outcome == Outcome::NotFound)
            .map(|v| MissingReference {
                category: v.category,
                reference: v.reference.clone(),
            })
            .collect()
    }

    /// Whether every reference was confirmed.
    pub fn is_clean(&self) -> bool {
        self.verdicts.iter().all(|v| v.outcome == Outcome::Found)
    }

    /// Render the human-readable report.
    pub fn render_text(&self, writer: &mut impl Write) -> io::Result<()> {
        let missing = self.missing();
        if missing.is_empty() {
            writeln!(
                writer,
                "all {} references found in target org",
                self.checked()
            )
        } else {
            for entry in &missing {
                writeln!(writer, "missing {}: {}", entry.category, entry.reference)?;
            }
            writeln!(
                writer,
                "{} of {} references missing from target org",
                missing.len(),
                self.checked()
            )
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

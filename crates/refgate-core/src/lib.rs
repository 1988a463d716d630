//! Core engine for refgate.
//!
//! This crate implements the extraction-and-reconciliation pipeline that
//! audits a definition document's cross-references against a target org:
//! - Type profile registry: what each metadata kind contains, and where
//! - Reference extraction with normalization and dedup
//! - The canonical metadata document (sorted, distinct, per category)
//! - Query planning with composite-key grouping
//! - Reconciliation with fast (count) and slow (membership) comparison
//! - Verdict aggregation and report rendering
//! - JSON output types for CLI responses
//! - Run artifacts (reference document, query log)
//!
//! Data flows strictly forward; no stage mutates a predecessor's output.

pub mod artifact;
pub mod category;
pub mod document;
pub mod error;
pub mod extract;
pub mod output;
pub mod plan;
pub mod profile;
pub mod reconcile;
pub mod report;
pub mod transport;

//! Run artifacts: the persisted reference document and query log.
//!
//! Both files are side effects for external inspection. They are written
//! into the working directory as the run progresses and removed when the
//! run finishes unless the caller asked to keep them. Pipeline stages read
//! the in-memory document, never these files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::document::MetadataDocument;
use crate::error::GateError;
use crate::reconcile::QueryRecord;

// ============================================================================
// Artifact Set
// ============================================================================

/// The artifacts one run owns.
#[derive(Debug)]
pub struct ArtifactSet {
    dir: PathBuf,
    stem: String,
    keep: bool,
    written: Vec<PathBuf>,
}

impl ArtifactSet {
    /// Create an artifact set rooted in `dir`, named after `stem`.
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>, keep: bool) -> Self {
        ArtifactSet {
            dir: dir.into(),
            stem: stem.into(),
            keep,
            written: Vec::new(),
        }
    }

    /// Path of the reference document artifact.
    pub fn document_path(&self) -> PathBuf {
        self.dir.join(format!("{}.refs.json", self.stem))
    }

    /// Path of the query log artifact.
    pub fn query_log_path(&self) -> PathBuf {
        self.dir.join(format!("{}.queries.json", self.stem))
    }

    /// Persist the metadata document. Written at build time.
    pub fn write_document(&mut self, document: &MetadataDocument) -> Result<PathBuf, GateError> {
        self.write_json(self.document_path(), document)
    }

    /// Persist the query log. Written after reconciliation.
    pub fn write_query_log(&mut self, records: &[QueryRecord]) -> Result<PathBuf, GateError> {
        self.write_json(self.query_log_path(), &records)
    }

    fn write_json<T: Serialize>(&mut self, path: PathBuf, value: &T) -> Result<PathBuf, GateError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| GateError::internal(format!("failed to serialize artifact: {e}")))?;
        fs::write(&path, json).map_err(|e| {
            GateError::internal(format!("failed to write {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "artifact written");
        self.written.push(path.clone());
        Ok(path)
    }

    /// Finish the run: remove artifacts unless retention was requested.
    ///
    /// Removal failures are logged, not fatal; the report has already been
    /// produced by the time this runs.
    pub fn finish(self) {
        if self.keep {
            return;
        }
        for path in &self.written {
            if let Err(e) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "failed to remove artifact");
            }
        }
    }

    /// Artifacts written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Root directory of this artifact set.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Pipeline orchestration for the `verify` command.
//!
//! Wires the core stages together in their fixed order: registry lookup,
//! extraction, document build, planning, reconciliation, reporting. The
//! transport is injected so tests can drive the whole pipeline against a
//! scripted org.
//!
//! The pipeline is strictly sequential. Extraction completes fully before
//! any plan is built, and queries execute one at a time; a failure anywhere
//! aborts with no partial report.

use std::path::PathBuf;

use tracing::info;

use refgate_core::artifact::ArtifactSet;
use refgate_core::document::MetadataDocument;
use refgate_core::error::GateError;
use refgate_core::extract::extract_document;
use refgate_core::plan::plan_document;
use refgate_core::profile::{MetadataKind, TypeProfile};
use refgate_core::reconcile::reconcile_all;
use refgate_core::report::Report;
use refgate_core::transport::QueryTransport;

// ============================================================================
// Request / Outcome
// ============================================================================

/// Parsed inputs for one verification run.
#[derive(Debug, Clone)]
pub struct VerifyRequest {
    /// Metadata kind to audit.
    pub kind: MetadataKind,
    /// Name of the application or permission set.
    pub name: String,
    /// Source-format root holding the definition documents.
    pub source_dir: PathBuf,
    /// Directory the run artifacts are written into.
    pub artifact_dir: PathBuf,
    /// Keep the artifacts instead of removing them at run end.
    pub keep_artifacts: bool,
}

/// Result of a completed verification run.
#[derive(Debug)]
pub struct VerifyOutcome {
    /// Kind that was verified.
    pub kind: MetadataKind,
    /// Name that was verified.
    pub name: String,
    /// Aggregated verdicts.
    pub report: Report,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Run the full verification pipeline.
///
/// Artifacts are written as the run progresses and removed at the end
/// (success or failure) unless the request asked to keep them.
pub fn run_verify(
    request: &VerifyRequest,
    transport: &dyn QueryTransport,
) -> Result<VerifyOutcome, GateError> {
    let mut artifacts = ArtifactSet::new(
        &request.artifact_dir,
        &request.name,
        request.keep_artifacts,
    );
    let result = run_pipeline(request, transport, &mut artifacts);
    artifacts.finish();
    result
}

fn run_pipeline(
    request: &VerifyRequest,
    transport: &dyn QueryTransport,
    artifacts: &mut ArtifactSet,
) -> Result<VerifyOutcome, GateError> {
    let profile = TypeProfile::for_kind(request.kind);
    let path = profile.definition_path(&request.source_dir, &request.name);
    info!(kind = %request.kind, path = %path.display(), "verifying references");

    let accumulator = extract_document(&path, profile)?;
    let document = MetadataDocument::from_accumulator(accumulator);
    if document.is_empty() {
        return Err(GateError::EmptyDocument { path });
    }
    artifacts.write_document(&document)?;

    let plans = plan_document(&document)?;
    info!(
        references = document.len(),
        queries = plans.len(),
        "document built, executing queries"
    );

    let (verdicts, records) = reconcile_all(&plans, transport)?;
    artifacts.write_query_log(&records)?;

    let report = Report::new(verdicts);
    info!(
        checked = report.checked(),
        missing = report.missing().len(),
        "verification complete"
    );

    Ok(VerifyOutcome {
        kind: request.kind,
        name: request.name.clone(),
        report,
    })
}

// ============================================================================
// Tests
// ============================================================================

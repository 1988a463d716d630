//! Query transport: how existence queries reach the org.
//!
//! The engine only needs one capability from the platform: run a query,
//! get back a total count and the list of matching names. That seam is the
//! [`QueryTransport`] trait. The production implementation shells out to
//! the platform CLI (`sf data query --json`); tests use
//! [`ScriptedTransport`] to replay canned results.
//!
//! Queries block until the CLI returns. There is deliberately no timeout,
//! retry, or cancellation: a transport failure is fatal to the run.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

use crate::plan::QueryMode;

// ============================================================================
// Types
// ============================================================================

/// Outcome of one existence query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// Total number of matching records reported by the org.
    pub total: usize,
    /// Names of the matching records.
    pub names: Vec<String>,
}

impl QueryResult {
    /// Convenience constructor.
    pub fn new(total: usize, names: Vec<String>) -> Self {
        QueryResult { total, names }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors from the query transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The query CLI could not be spawned.
    #[error("failed to run query CLI '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: io::Error,
    },

    /// The query CLI exited unsuccessfully.
    #[error("query CLI exited with {status}: {detail}")]
    CommandFailed { status: String, detail: String },

    /// The query CLI produced output the transport could not interpret.
    #[error("malformed query response: {0}")]
    Malformed(String),
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Black-box query capability: count plus matching names.
pub trait QueryTransport {
    /// Execute one query and return its result.
    ///
    /// `name_field` is the record field holding the comparable name in the
    /// response payload.
    fn run(
        &self,
        soql: &str,
        mode: QueryMode,
        name_field: &str,
    ) -> Result<QueryResult, TransportError>;
}

// ============================================================================
// Platform CLI Transport
// ============================================================================

/// Transport backed by the platform CLI.
///
/// Invokes `sf data query --query <soql> --json`, adding
/// `--use-tooling-api` for tooling-mode queries and `--target-org` when an
/// org alias was given.
#[derive(Debug, Clone)]
pub struct SfCliTransport {
    binary: PathBuf,
    target_org: Option<String>,
}

impl SfCliTransport {
    /// Create a transport for the default `sf` binary.
    pub fn new(target_org: Option<String>) -> Self {
        SfCliTransport {
            binary: PathBuf::from("sf"),
            target_org,
        }
    }

    /// Override the CLI binary path.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    fn parse_response(&self, stdout: &[u8], name_field: &str) -> Result<QueryResult, TransportError> {
        let payload: serde_json::Value = serde_json::from_slice(stdout)
            .map_err(|e| TransportError::Malformed(format!("invalid JSON: {e}")))?;

        let result = payload
            .get("result")
            .ok_or_else(|| TransportError::Malformed("missing 'result' object".to_string()))?;
        let total = result
            .get("totalSize")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| TransportError::Malformed("missing 'totalSize'".to_string()))?;
        let records = result
            .get("records")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| TransportError::Malformed("missing 'records' array".to_string()))?;

        let mut names = Vec::with_capacity(records.len());
        for record in records {
            let name = record.get(name_field).and_then(serde_json::Value::as_str).ok_or_else(
                || TransportError::Malformed(format!("record missing '{name_field}'")),
            )?;
            names.push(name.to_string());
        }

        Ok(QueryResult::new(total as usize, names))
    }
}

impl QueryTransport for SfCliTransport {
    fn run(
        &self,
        soql: &str,
        mode: QueryMode,
        name_field: &str,
    ) -> Result<QueryResult, TransportError> {
        let mut command = Command::new(&self.binary);
        command.args(["data", "query", "--query", soql, "--json"]);
        if mode == QueryMode::Tooling {
            command.arg("--use-tooling-api");
        }
        if let Some(org) = &self.target_org {
            command.args(["--target-org", org]);
        }

        debug!(query = soql, ?mode, "executing org query");
        let output = command.output().map_err(|source| TransportError::Spawn {
            binary: self.binary.display().to_string(),
            source,
        })?;

        if !output.status.success() {
            // The CLI reports errors on stderr, or as a JSON envelope on
            // stdout when --json is set; surface whichever is non-empty.
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr
            };
            return Err(TransportError::CommandFailed {
                status: output.status.to_string(),
                detail,
            });
        }

        self.parse_response(&output.stdout, name_field)
    }
}

// ============================================================================
// Scripted Transport (test double)
// ============================================================================

/// Transport replaying canned results in order.
///
/// Used by tests and dry runs: each [`run`](QueryTransport::run) call pops
/// the next scripted result and records the executed query. Running past
/// the script is a transport error, which doubles as the "query failure
/// aborts the run" fixture.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<QueryResult>>,
    executed: RefCell<Vec<String>>,
}

impl ScriptedTransport {
    /// Create an empty script.
    pub fn new() -> Self {
        ScriptedTransport::default()
    }

    /// Append a canned result to the script.
    pub fn respond(self, total: usize, names: &[&str]) -> Self {
        self.responses.borrow_mut().push_back(QueryResult::new(
            total,
            names.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Queries executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }
}

impl QueryTransport for ScriptedTransport {
    fn run(
        &self,
        soql: &str,
        _mode: QueryMode,
        _name_field: &str,
    ) -> Result<QueryResult, TransportError> {
        self.executed.borrow_mut().push(soql.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| TransportError::Malformed("no scripted response left".to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

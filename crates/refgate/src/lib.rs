//! CLI front door for refgate.
//!
//! The binary lives in `main.rs`; this library target exposes the pipeline
//! orchestration so integration tests can drive a full verification run
//! with an injected transport.

pub mod cli;

//! Checker CLI adapter module.
//!
//! This module owns every step of one checker round trip: building a
//! fully-specified command line from editor state, executing it with the
//! document piped over stdin, and translating the JSON response into
//! normalized results.
//!
//! # Architecture
//!
//! The module is organized into:
//! - `invocation`: operation definitions, the ordered argument builder, and
//!   request validation
//! - `process`: subprocess execution and output capture
//! - `response`: typed response shapes and translation into editor-facing
//!   results
//!
//! The checker encodes "found problems" as a JSON payload with a non-zero
//! exit code, so exit status never decides success here; only whether the
//! captured output parses as JSON does.

pub mod invocation;
pub mod process;
pub mod response;

pub use invocation::{Invocation, Operation};
pub use process::invoke;

/// Outcome of one checker invocation.
///
/// `Failure` means the merged output was not JSON; a non-zero exit code with
/// a JSON payload is still `Success`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliResult {
    /// The merged output parsed as a JSON document.
    Success(serde_json::Value),
    /// The merged output was not valid JSON; carries the raw text.
    Failure(String),
}

//! Error types for the flow-bridge adapter.
//!
//! This module defines all error types used throughout the crate, organized
//! by subsystem: request validation, checker invocation, and response
//! translation.
//!
//! Validation failures are expected and silent: they short-circuit an
//! operation before a checker process is spawned and are never surfaced to
//! the user as errors. Everything else is an adapter fault that the bridge
//! resolves at the triggering event (log, clear decorations, set status).

use thiserror::Error;

/// Expected preconditions that an operation must satisfy before a checker
/// invocation may be built.
///
/// These are not faults: a buffer outside any Flow project, or without the
/// opt-in marker comment, simply does not participate in type checking.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No `.flowconfig` was found in any ancestor of the document's path.
    #[error("no .flowconfig found above the document")]
    NoProjectRoot,

    /// The document lacks the `@flow` opt-in marker comment.
    #[error("document has no @flow marker comment")]
    MissingPragma,

    /// The cursor's lexical scope is not JavaScript source.
    #[error("cursor scope is not JavaScript source: {0}")]
    NotJavascript(String),

    /// The document has no backing file path (e.g. an unsaved scratch
    /// buffer), so no project can be located for it.
    #[error("document has no file path")]
    MissingPath,
}

/// Errors raised while invoking the checker subprocess.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The checker binary could not be spawned.
    #[error("failed to spawn checker '{command}': {source}")]
    SpawnFailed {
        /// The executable that was invoked.
        command: String,
        /// The underlying spawn error.
        source: std::io::Error,
    },

    /// The child's stdin pipe was not available after spawning.
    #[error("failed to capture checker stdin")]
    StdinUnavailable,

    /// Writing the document payload to the child failed.
    #[error("failed to feed document to checker stdin: {0}")]
    StdinWrite(#[source] std::io::Error),

    /// Collecting the child's output failed.
    #[error("failed to collect checker output: {0}")]
    OutputCapture(#[source] std::io::Error),
}

/// Errors raised while translating a checker JSON response.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The response parsed as JSON but did not match the documented shape
    /// for the operation.
    #[error("unrecognized {operation} response shape: {detail}")]
    UnrecognizedShape {
        /// The operation whose response failed to translate.
        operation: &'static str,
        /// What the deserializer rejected.
        detail: String,
    },
}

/// A unified error type for the entire crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A request precondition was not met.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Checker invocation fault.
    #[error("invocation failed: {0}")]
    Invoke(#[from] InvokeError),

    /// Response translation fault.
    #[error("translation failed: {0}")]
    Translate(#[from] TranslateError),

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for flow-bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Flow Bridge
//!
//! An editor-agnostic adapter that shells out to the Flow type checker CLI
//! to provide go-to-definition, type-on-hover, autocomplete, inline
//! diagnostics, and type-coverage overlays inside a text editor.
//!
//! # Overview
//!
//! This library provides:
//! - Project root discovery via the `.flowconfig` marker file
//! - Order-correct checker invocations built from editor state
//! - Subprocess execution with the document piped over stdin
//! - Translation of the checker's JSON responses into editor decorations
//! - Debounced dispatch for continuous-feedback operations
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   EditorHost    ┌─────────────────┐
//! │  Text editor    │◄───────────────►│   FlowBridge    │
//! │  (plugin glue)  │    (trait)      │  (orchestrator) │
//! └─────────────────┘                 └────────┬────────┘
//!                                              │
//!                                       ┌──────▼──────┐
//!                                       │ CLI adapter │
//!                                       └──────┬──────┘
//!                                              │ argv + stdin / JSON stdout
//!                                       ┌──────▼────────┐
//!                                       │   flow CLI    │
//!                                       │ (type checker)│
//!                                       └───────────────┘
//! ```
//!
//! The checker is an opaque collaborator: it reads unsaved document text
//! from stdin and emits one JSON document on stdout for every operation,
//! encoding "found problems" as a JSON payload with a non-zero exit code.
//!
//! # Modules
//!
//! - [`cli`] - Invocation building, subprocess execution, response
//!   translation
//! - [`debounce`] - Per-key trigger collapsing for continuous feedback
//! - [`editor`] - The host trait seam and the bridge orchestrator
//! - [`error`] - Error types for the entire crate
//! - [`project`] - `.flowconfig` project root discovery
//! - [`settings`] - Layered configuration surface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use flow_bridge::editor::FlowBridge;
//! use flow_bridge::settings::SettingsOverlay;
//!
//! let bridge = Arc::new(FlowBridge::new());
//! bridge.initialize(SettingsOverlay::default());
//!
//! // Point-in-time operations run on demand:
//! let definition = bridge.goto_definition(view.as_ref()).await;
//!
//! // Continuous feedback goes through the debounce gate:
//! bridge.schedule_check(&view);
//! ```

// Enforce documentation and other quality attributes
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are too strict
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod cli;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod project;
pub mod settings;

// Re-export commonly used types at the crate root
pub use error::{Error, Result};

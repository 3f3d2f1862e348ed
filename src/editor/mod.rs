//! Editor-facing surface of the adapter.
//!
//! This module is organized into:
//! - `host`: the [`EditorHost`] trait the editor side implements, plus the
//!   snapshot and span types exchanged across it
//! - `bridge`: the [`FlowBridge`] orchestrator that wires editor events
//!   through the checker CLI and back into decorations
//!
//! # Usage
//!
//! ```ignore
//! use flow_bridge::editor::{EditorHost, FlowBridge};
//!
//! let bridge = FlowBridge::new();
//! bridge.initialize(global_settings_overlay);
//! if let Some(location) = bridge.goto_definition(&view).await {
//!     // the host has already been asked to open the location
//! }
//! ```

pub mod bridge;
pub mod host;

pub use bridge::{Completion, CompletionList, FlowBridge};
pub use host::{DocumentSnapshot, EditorHost, SourceSpan};

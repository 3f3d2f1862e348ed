//! Configuration surface for the adapter.
//!
//! Settings resolve in three layers, per key: built-in defaults, then a
//! global overlay, then a project-level overlay. A key unset at the project
//! level falls back to the global value, and an unset global key falls back
//! to the default. Overlays deserialize from plain JSON objects so that any
//! host can hand them over verbatim from its own configuration store.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Fully resolved adapter settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    /// Prefer a project-local checker (`<root>/node_modules/.bin/flow`) over
    /// the configured binary when one exists.
    pub use_local_binary: bool,
    /// Checker executable to invoke when no project-local one is used.
    pub binary_path: String,
    /// Suppress parameter lists when synthesizing completion snippets.
    pub omit_function_parameters: bool,
    /// Let the host's own completion suggestions show alongside checker
    /// completions instead of suppressing them.
    pub show_inline_completion_suggestions: bool,
    /// Delay applied by the debounce gate to continuous-feedback operations.
    pub debounce_ms: u64,
    /// Run the coverage operation and draw uncovered-span overlays.
    pub show_coverage: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_local_binary: true,
            binary_path: "flow".to_string(),
            omit_function_parameters: false,
            show_inline_completion_suggestions: false,
            debounce_ms: 200,
            show_coverage: false,
        }
    }
}

/// A partial settings layer. Every field is optional; unset fields fall
/// through to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsOverlay {
    /// See [`Settings::use_local_binary`].
    pub use_local_binary: Option<bool>,
    /// See [`Settings::binary_path`].
    pub binary_path: Option<String>,
    /// See [`Settings::omit_function_parameters`].
    pub omit_function_parameters: Option<bool>,
    /// See [`Settings::show_inline_completion_suggestions`].
    pub show_inline_completion_suggestions: Option<bool>,
    /// See [`Settings::debounce_ms`].
    pub debounce_ms: Option<u64>,
    /// See [`Settings::show_coverage`].
    pub show_coverage: Option<bool>,
}

impl Settings {
    /// Resolves the effective settings from the default layer plus the given
    /// overlays, applied in order (later overlays win per key).
    pub fn resolve<'a>(overlays: impl IntoIterator<Item = &'a SettingsOverlay>) -> Self {
        let mut settings = Self::default();
        for overlay in overlays {
            settings.apply(overlay);
        }
        settings
    }

    /// Applies one overlay on top of `self`, key by key.
    pub fn apply(&mut self, overlay: &SettingsOverlay) {
        if let Some(v) = overlay.use_local_binary {
            self.use_local_binary = v;
        }
        if let Some(v) = &overlay.binary_path {
            self.binary_path = v.clone();
        }
        if let Some(v) = overlay.omit_function_parameters {
            self.omit_function_parameters = v;
        }
        if let Some(v) = overlay.show_inline_completion_suggestions {
            self.show_inline_completion_suggestions = v;
        }
        if let Some(v) = overlay.debounce_ms {
            self.debounce_ms = v;
        }
        if let Some(v) = overlay.show_coverage {
            self.show_coverage = v;
        }
    }

    /// Resolves the checker executable for a project.
    ///
    /// When [`Settings::use_local_binary`] is set and the project root holds
    /// an npm-installed checker, that one wins; otherwise the configured
    /// [`Settings::binary_path`] is used as-is.
    pub fn resolve_binary(&self, root: Option<&Path>) -> PathBuf {
        if self.use_local_binary {
            if let Some(root) = root {
                let local = root.join("node_modules").join(".bin").join("flow");
                if local.is_file() {
                    return local;
                }
            }
        }
        PathBuf::from(&self.binary_path)
    }
}

//! The bridge between editor events and checker invocations.
//!
//! [`FlowBridge`] owns the adapter's only persistent state: the resolved
//! global settings, the lifecycle gate, the debounce gate for
//! continuous-feedback operations, and the response sequence gate. Every
//! operation captures a fresh document snapshot, validates it, builds an
//! invocation, runs the checker, and applies the translated result to the
//! host, resolving every failure at the triggering event. Nothing here
//! propagates an error to the caller.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::cli::invocation::Invocation;
use crate::cli::response::{
    self, DefinitionLocation, Diagnostic, descriptions_by_row,
};
use crate::cli::{CliResult, process};
use crate::debounce::DebounceGate;
use crate::editor::host::{DocumentSnapshot, EditorHost, SourceSpan};
use crate::error::Error;
use crate::project::ProjectContext;
use crate::settings::{Settings, SettingsOverlay};

/// Region key for diagnostic underlines.
pub const ERROR_REGION_KEY: &str = "flow_error";
/// Region key for uncovered-expression overlays.
pub const COVERAGE_REGION_KEY: &str = "flow_uncovered";
/// Status key for diagnostic summaries.
pub const ERROR_STATUS_KEY: &str = "flow_error";
/// Status key for coverage summaries.
pub const COVERAGE_STATUS_KEY: &str = "flow_coverage";

/// One completion ready for the host to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    /// Matching/display text: the candidate name and its type, tab
    /// separated.
    pub label: String,
    /// Text inserted on acceptance.
    pub snippet: String,
}

/// A completed autocomplete round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionList {
    /// Ordered completions.
    pub items: Vec<Completion>,
    /// Whether the host should suppress its own word/buffer suggestions
    /// while showing these.
    pub suppress_host_suggestions: bool,
}

/// Adapter lifecycle. Operations dispatched before initialization complete
/// as no-ops rather than errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Lifecycle {
    #[default]
    Uninitialized,
    Ready,
}

/// Per-key monotonic sequence numbers for continuous-feedback responses.
///
/// Overlapping in-flight invocations are tolerated; the gate ensures a
/// superseded response can no longer overwrite a newer one's decorations.
#[derive(Debug, Default)]
struct SequenceGate {
    next: AtomicU64,
    applied: Mutex<HashMap<String, u64>>,
}

impl SequenceGate {
    fn issue(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Records `seq` as applied for `key` unless a newer response already
    /// was; returns whether the caller may apply its result.
    fn try_apply(&self, key: &str, seq: u64) -> bool {
        let mut applied = self.applied.lock().expect("sequence gate lock poisoned");
        let latest = applied.entry(key.to_string()).or_insert(0);
        if seq < *latest {
            return false;
        }
        *latest = seq;
        true
    }
}

/// Orchestrates checker operations for any [`EditorHost`].
///
/// One bridge serves a whole editor session; per-document state is limited
/// to debounce timers and applied-response sequence numbers, keyed by file
/// path.
#[derive(Debug, Default)]
pub struct FlowBridge {
    lifecycle: RwLock<Lifecycle>,
    settings: RwLock<Settings>,
    debounce: DebounceGate,
    sequences: SequenceGate,
}

impl FlowBridge {
    /// Creates a bridge in the `Uninitialized` state. No operation
    /// dispatches until [`FlowBridge::initialize`] runs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the global settings overlay and transitions to `Ready`.
    pub fn initialize(&self, global: SettingsOverlay) {
        let mut settings = Settings::default();
        settings.apply(&global);
        *self.settings.write().expect("settings lock poisoned") = settings;
        *self.lifecycle.write().expect("lifecycle lock poisoned") = Lifecycle::Ready;
        info!("flow-bridge ready");
    }

    /// Whether initialization has completed.
    pub fn is_ready(&self) -> bool {
        *self.lifecycle.read().expect("lifecycle lock poisoned") == Lifecycle::Ready
    }

    /// Settings for one triggering event: the resolved global layer with
    /// the host's project overlay applied on top, per key.
    fn effective_settings<H: EditorHost + ?Sized>(&self, host: &H) -> Settings {
        let mut settings = self.settings.read().expect("settings lock poisoned").clone();
        if let Some(project) = host.project_settings() {
            settings.apply(&project);
        }
        settings
    }

    /// Jumps to the definition of the symbol under the cursor.
    ///
    /// On success the host is asked to open the location, which is also
    /// returned. "No definition found" and every failure resolve to `None`.
    pub async fn goto_definition<H: EditorHost + ?Sized>(
        &self,
        host: &H,
    ) -> Option<DefinitionLocation> {
        if !self.is_ready() {
            return None;
        }
        let snapshot = DocumentSnapshot::capture(host);
        let settings = self.effective_settings(host);
        let project = ProjectContext::locate(snapshot.path.as_deref());

        let invocation = match Invocation::get_def(&snapshot, &project, &settings) {
            Ok(invocation) => invocation,
            Err(reason) => {
                trace!(%reason, "get-def skipped");
                return None;
            }
        };

        let json = self.run_checker(host, &invocation).await?;
        match response::translate_definition(json) {
            Ok(Some(location)) => {
                host.open_location(&location.file, location.line, location.column);
                Some(location)
            }
            Ok(None) => {
                debug!("no definition found");
                None
            }
            Err(fault) => {
                self.report_fault(host, &fault.into());
                None
            }
        }
    }

    /// Shows the inferred type of the expression under the cursor in a
    /// popup and returns its label.
    pub async fn type_at_cursor<H: EditorHost + ?Sized>(&self, host: &H) -> Option<String> {
        if !self.is_ready() {
            return None;
        }
        let snapshot = DocumentSnapshot::capture(host);
        let settings = self.effective_settings(host);
        let project = ProjectContext::locate(snapshot.path.as_deref());

        let invocation = match Invocation::type_at_pos(&snapshot, &project, &settings) {
            Ok(invocation) => invocation,
            Err(reason) => {
                trace!(%reason, "type-at-pos skipped");
                return None;
            }
        };

        let json = self.run_checker(host, &invocation).await?;
        match response::translate_type(json) {
            Ok(type_label) => {
                host.show_popup(&type_label);
                Some(type_label)
            }
            Err(fault) => {
                self.report_fault(host, &fault.into());
                None
            }
        }
    }

    /// Completes the token at the cursor.
    pub async fn autocomplete<H: EditorHost + ?Sized>(&self, host: &H) -> Option<CompletionList> {
        if !self.is_ready() {
            return None;
        }
        let snapshot = DocumentSnapshot::capture(host);
        let settings = self.effective_settings(host);
        let project = ProjectContext::locate(snapshot.path.as_deref());

        let invocation = match Invocation::autocomplete(&snapshot, &project, &settings) {
            Ok(invocation) => invocation,
            Err(reason) => {
                trace!(%reason, "autocomplete skipped");
                return None;
            }
        };

        let json = self.run_checker(host, &invocation).await?;
        let candidates = match response::translate_completions(json) {
            Ok(candidates) => candidates,
            Err(fault) => {
                self.report_fault(host, &fault.into());
                return None;
            }
        };

        let items = candidates
            .iter()
            .map(|candidate| Completion {
                label: format!("{}\t{}", candidate.name, candidate.type_label),
                snippet: candidate.snippet(settings.omit_function_parameters),
            })
            .collect();
        Some(CompletionList {
            items,
            suppress_host_suggestions: !settings.show_inline_completion_suggestions,
        })
    }

    /// Type-checks the buffer and applies diagnostic decorations.
    pub async fn check<H: EditorHost + ?Sized>(&self, host: &H) {
        if !self.is_ready() {
            return;
        }
        let snapshot = DocumentSnapshot::capture(host);
        let settings = self.effective_settings(host);
        let project = ProjectContext::locate(snapshot.path.as_deref());

        let invocation = match Invocation::check_contents(&snapshot, &project, &settings) {
            Ok(invocation) => invocation,
            Err(reason) => {
                // The buffer may have just left the project or lost its
                // pragma; stale decorations must not outlive that.
                trace!(%reason, "check skipped");
                host.erase_regions(ERROR_REGION_KEY);
                host.erase_regions(COVERAGE_REGION_KEY);
                return;
            }
        };

        let key = format!("check:{}", document_key(snapshot.path.as_deref()));
        let seq = self.sequences.issue();

        let Some(json) = self.run_checker(host, &invocation).await else {
            return;
        };
        let diagnostics = match response::translate_diagnostics(json) {
            Ok(diagnostics) => diagnostics,
            Err(fault) => {
                self.report_fault(host, &fault.into());
                return;
            }
        };

        if !self.sequences.try_apply(&key, seq) {
            debug!(%key, "discarding superseded diagnostics response");
            return;
        }
        apply_diagnostics(host, &snapshot, &diagnostics);
    }

    /// Queries coverage and applies uncovered-span decorations. A no-op
    /// unless the `show_coverage` setting is on.
    pub async fn coverage<H: EditorHost + ?Sized>(&self, host: &H) {
        if !self.is_ready() {
            return;
        }
        let snapshot = DocumentSnapshot::capture(host);
        let settings = self.effective_settings(host);
        if !settings.show_coverage {
            return;
        }
        let project = ProjectContext::locate(snapshot.path.as_deref());

        let invocation = match Invocation::coverage(&snapshot, &project, &settings) {
            Ok(invocation) => invocation,
            Err(reason) => {
                trace!(%reason, "coverage skipped");
                host.erase_regions(ERROR_REGION_KEY);
                host.erase_regions(COVERAGE_REGION_KEY);
                return;
            }
        };

        let key = format!("coverage:{}", document_key(snapshot.path.as_deref()));
        let seq = self.sequences.issue();

        let Some(json) = self.run_checker(host, &invocation).await else {
            return;
        };
        let report = match response::translate_coverage(json) {
            Ok(report) => report,
            Err(fault) => {
                self.report_fault(host, &fault.into());
                return;
            }
        };

        if !self.sequences.try_apply(&key, seq) {
            debug!(%key, "discarding superseded coverage response");
            return;
        }

        if report.uncovered.is_empty() {
            host.erase_regions(COVERAGE_REGION_KEY);
        } else {
            host.add_regions(COVERAGE_REGION_KEY, &report.uncovered);
        }
        let count = report.uncovered_count;
        host.set_status(
            COVERAGE_STATUS_KEY,
            &format!(
                "Flow coverage: {count} line{} uncovered",
                if count == 1 { "" } else { "s" }
            ),
        );
    }

    /// Debounced entry point for [`FlowBridge::check`]; collapses rapid
    /// retriggers (cursor movement) into one delayed run per document.
    pub fn schedule_check<H: EditorHost + 'static>(self: &Arc<Self>, host: &Arc<H>) {
        if !self.is_ready() {
            return;
        }
        let delay = Duration::from_millis(self.effective_settings(host.as_ref()).debounce_ms);
        let key = format!("check:{}", document_key(host.file_path().as_deref()));
        let bridge = Arc::clone(self);
        let host = Arc::clone(host);
        self.debounce.trigger(key, delay, move || async move {
            bridge.check(host.as_ref()).await;
        });
    }

    /// Debounced entry point for [`FlowBridge::coverage`].
    pub fn schedule_coverage<H: EditorHost + 'static>(self: &Arc<Self>, host: &Arc<H>) {
        if !self.is_ready() {
            return;
        }
        let delay = Duration::from_millis(self.effective_settings(host.as_ref()).debounce_ms);
        let key = format!("coverage:{}", document_key(host.file_path().as_deref()));
        let bridge = Arc::clone(self);
        let host = Arc::clone(host);
        self.debounce.trigger(key, delay, move || async move {
            bridge.coverage(host.as_ref()).await;
        });
    }

    /// Runs one invocation and peels off the non-result outcomes.
    ///
    /// Unparseable output and adapter faults are resolved here: logged,
    /// decorations cleared, a status message set. Only a parsed JSON
    /// payload comes back.
    async fn run_checker<H: EditorHost + ?Sized>(
        &self,
        host: &H,
        invocation: &Invocation,
    ) -> Option<Value> {
        match process::invoke(invocation).await {
            Ok(CliResult::Success(json)) => Some(json),
            Ok(CliResult::Failure(raw)) => {
                warn!(
                    operation = %invocation.operation,
                    raw = %raw.trim(),
                    "checker produced unparseable output"
                );
                clear_decorations(host);
                host.set_status(ERROR_STATUS_KEY, "Flow: unexpected checker output");
                None
            }
            Err(fault) => {
                self.report_fault(host, &fault.into());
                None
            }
        }
    }

    /// Resolves an adapter fault at the triggering event.
    fn report_fault<H: EditorHost + ?Sized>(&self, host: &H, fault: &Error) {
        warn!(%fault, "checker round trip failed");
        clear_decorations(host);
        host.set_status(ERROR_STATUS_KEY, &format!("Flow error: {fault}"));
    }
}

/// Debounce/sequence key for a document.
fn document_key(path: Option<&Path>) -> String {
    path.map_or_else(|| "<untitled>".to_string(), |p| p.display().to_string())
}

fn clear_decorations<H: EditorHost + ?Sized>(host: &H) {
    host.erase_regions(ERROR_REGION_KEY);
    host.erase_regions(COVERAGE_REGION_KEY);
}

fn apply_diagnostics<H: EditorHost + ?Sized>(
    host: &H,
    snapshot: &DocumentSnapshot,
    diagnostics: &[Diagnostic],
) {
    if diagnostics.is_empty() {
        host.erase_regions(ERROR_REGION_KEY);
        host.set_status(ERROR_STATUS_KEY, "Flow: no errors");
        return;
    }

    let spans: Vec<SourceSpan> = diagnostics
        .iter()
        .flat_map(|diagnostic| diagnostic.spans.iter().copied())
        .collect();
    host.add_regions(ERROR_REGION_KEY, &spans);

    let count = diagnostics.len();
    let mut status = format!("Flow: {count} error{}", if count == 1 { "" } else { "s" });
    if let Some(description) = descriptions_by_row(diagnostics).get(&snapshot.cursor_row) {
        status.push_str(": ");
        status.push_str(description);
    }
    host.set_status(ERROR_STATUS_KEY, &status);
}

//! Shared helpers for integration tests: a scratch Flow project with fake
//! checker binaries, and an editor host that records every decoration call.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use flow_bridge::editor::{EditorHost, SourceSpan};
use flow_bridge::settings::SettingsOverlay;
use tempfile::TempDir;

/// A temporary project directory with a `.flowconfig` at its root.
///
/// Fake checker binaries installed with [`TestProject::fake_checker`] land
/// in `node_modules/.bin/flow`, where the adapter's default binary
/// resolution picks them up.
pub struct TestProject {
    /// Scratch directory; removed on drop.
    pub dir: TempDir,
}

impl TestProject {
    /// Creates a project with an empty `.flowconfig`.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp project");
        std::fs::write(dir.path().join(".flowconfig"), "").expect("failed to write .flowconfig");
        Self { dir }
    }

    /// Root directory of the project.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a source file under the project root and returns its path.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root().join(name);
        std::fs::write(&path, content).expect("failed to write source file");
        path
    }

    /// Installs a fake checker at `node_modules/.bin/flow` running the
    /// given shell body.
    pub fn fake_checker(&self, body: &str) -> PathBuf {
        let bin_dir = self.root().join("node_modules").join(".bin");
        std::fs::create_dir_all(&bin_dir).expect("failed to create bin dir");
        let path = bin_dir.join("flow");
        write_script(&path, body);
        path
    }

    /// Installs a fake checker that appends one line to `log` per
    /// invocation before emitting `response`.
    pub fn spy_checker(&self, log: &Path, response: &str) -> PathBuf {
        self.fake_checker(&format!(
            "echo invoked >> \"{}\"\ncat > /dev/null\necho '{}'\n",
            log.display(),
            response
        ))
    }

    /// Path of a log file inside the project, plus the number of lines in
    /// it (zero when absent).
    pub fn spy_log(&self) -> PathBuf {
        self.root().join("spy.log")
    }
}

/// Writes an executable `/bin/sh` script.
pub fn write_script(path: &Path, body: &str) {
    std::fs::write(path, format!("#!/bin/sh\n{body}")).expect("failed to write script");
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .expect("failed to chmod script");
}

/// Number of invocations a spy log recorded.
pub fn invocation_count(log: &Path) -> usize {
    std::fs::read_to_string(log).map_or(0, |content| content.lines().count())
}

/// An [`EditorHost`] over fixed buffer state that records every decoration
/// call for assertions.
pub struct RecordingHost {
    /// Backing file path.
    pub path: Option<PathBuf>,
    /// Buffer text.
    pub text: String,
    /// Zero-based cursor.
    pub cursor: (u32, u32),
    /// Scope reported at the cursor.
    pub scope: String,
    /// Project-level settings overlay, if any.
    pub overlay: Option<SettingsOverlay>,
    /// Live decoration regions by key.
    pub regions: Mutex<BTreeMap<String, Vec<SourceSpan>>>,
    /// Live status text by key.
    pub status: Mutex<BTreeMap<String, String>>,
    /// Popups shown, in order.
    pub popups: Mutex<Vec<String>>,
    /// Locations opened, in order, as `(file, line, column)`.
    pub opened: Mutex<Vec<(PathBuf, u32, u32)>>,
}

impl RecordingHost {
    /// Creates a host over a JavaScript buffer with the cursor at the
    /// origin.
    pub fn new(path: PathBuf, text: &str) -> Self {
        Self {
            path: Some(path),
            text: text.to_string(),
            cursor: (0, 0),
            scope: "source.js".to_string(),
            overlay: None,
            regions: Mutex::new(BTreeMap::new()),
            status: Mutex::new(BTreeMap::new()),
            popups: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Moves the cursor (zero-based).
    #[must_use]
    pub fn with_cursor(mut self, row: u32, col: u32) -> Self {
        self.cursor = (row, col);
        self
    }

    /// Sets a project-level settings overlay.
    #[must_use]
    pub fn with_overlay(mut self, overlay: SettingsOverlay) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Current status text for a key, if set.
    pub fn status_text(&self, key: &str) -> Option<String> {
        self.status.lock().unwrap().get(key).cloned()
    }

    /// Current regions for a key, if drawn.
    pub fn regions_for(&self, key: &str) -> Option<Vec<SourceSpan>> {
        self.regions.lock().unwrap().get(key).cloned()
    }
}

impl EditorHost for RecordingHost {
    fn file_path(&self) -> Option<PathBuf> {
        self.path.clone()
    }

    fn buffer_text(&self) -> String {
        self.text.clone()
    }

    fn cursor(&self) -> (u32, u32) {
        self.cursor
    }

    fn scope_at_cursor(&self) -> String {
        self.scope.clone()
    }

    fn project_settings(&self) -> Option<SettingsOverlay> {
        self.overlay.clone()
    }

    fn open_location(&self, file: &Path, line: u32, column: u32) {
        self.opened
            .lock()
            .unwrap()
            .push((file.to_path_buf(), line, column));
    }

    fn add_regions(&self, key: &str, spans: &[SourceSpan]) {
        self.regions
            .lock()
            .unwrap()
            .insert(key.to_string(), spans.to_vec());
    }

    fn erase_regions(&self, key: &str) {
        self.regions.lock().unwrap().remove(key);
    }

    fn set_status(&self, key: &str, text: &str) {
        self.status
            .lock()
            .unwrap()
            .insert(key.to_string(), text.to_string());
    }

    fn clear_status(&self, key: &str) {
        self.status.lock().unwrap().remove(key);
    }

    fn show_popup(&self, text: &str) {
        self.popups.lock().unwrap().push(text.to_string());
    }
}

//! The editor-side collaborator seam.
//!
//! Everything the adapter needs from a text editor is expressed through the
//! [`EditorHost`] trait: reading buffer state and writing decorations. Editor
//! plugins implement it over their native view APIs; the demo binary ships a
//! file-backed implementation and the integration tests a recording fake.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::settings::SettingsOverlay;

/// A region of source text, zero-based rows and columns, end column
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceSpan {
    /// Zero-based row the span starts on.
    pub start_row: u32,
    /// Zero-based column the span starts at.
    pub start_col: u32,
    /// Zero-based row the span ends on.
    pub end_row: u32,
    /// Zero-based, exclusive column the span ends at.
    pub end_col: u32,
}

/// Immutable capture of editor state, taken once per triggering event.
///
/// Rows and columns are zero-based offsets into `text`, which reflects
/// unsaved buffer content rather than the file on disk.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    /// Backing file path, if the buffer has one.
    pub path: Option<PathBuf>,
    /// Full buffer text.
    pub text: String,
    /// Zero-based cursor row.
    pub cursor_row: u32,
    /// Zero-based cursor column.
    pub cursor_col: u32,
    /// Lexical scope name at the cursor (e.g. `source.js`).
    pub cursor_scope: String,
}

impl DocumentSnapshot {
    /// Captures the current state of `host`.
    pub fn capture<H: EditorHost + ?Sized>(host: &H) -> Self {
        let (cursor_row, cursor_col) = host.cursor();
        Self {
            path: host.file_path(),
            text: host.buffer_text(),
            cursor_row,
            cursor_col,
            cursor_scope: host.scope_at_cursor(),
        }
    }
}

/// The editor surface the adapter reads from and decorates.
///
/// Implementations wrap one editor view/buffer. All methods are expected to
/// be cheap; the adapter calls the read side once per triggering event and
/// the write side once per completed round trip.
pub trait EditorHost: Send + Sync {
    /// Path of the file backing this buffer, if any.
    fn file_path(&self) -> Option<PathBuf>;

    /// Full (possibly unsaved) buffer text.
    fn buffer_text(&self) -> String;

    /// Zero-based `(row, column)` of the primary cursor.
    fn cursor(&self) -> (u32, u32);

    /// Lexical scope name at the cursor position.
    fn scope_at_cursor(&self) -> String;

    /// Project-level settings overlay, if the host has one for this buffer.
    fn project_settings(&self) -> Option<SettingsOverlay> {
        None
    }

    /// Opens `file` at a 1-based `line:column` position.
    fn open_location(&self, file: &Path, line: u32, column: u32);

    /// Draws the named decoration regions, replacing any previous set under
    /// the same key.
    fn add_regions(&self, key: &str, spans: &[SourceSpan]);

    /// Erases the named decoration regions.
    fn erase_regions(&self, key: &str);

    /// Sets the named status-bar text.
    fn set_status(&self, key: &str, text: &str);

    /// Clears the named status-bar text.
    fn clear_status(&self, key: &str);

    /// Shows a popup containing `text` near the cursor.
    fn show_popup(&self, text: &str);
}

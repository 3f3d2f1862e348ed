//! Project root discovery.
//!
//! Flow scopes type checking to the nearest enclosing directory containing a
//! `.flowconfig` marker file. Discovery is a pure lookup performed once per
//! triggering event; there is no cache, so a renamed or deleted project
//! root is observed on the very next call.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Name of the marker file that designates a Flow project root.
pub const MARKER_FILE: &str = ".flowconfig";

/// The project enclosing a document, derived per request from the document's
/// path.
///
/// `root: None` means "no enclosing project found": a valid terminal state,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectContext {
    /// Directory containing the `.flowconfig`, if one was found.
    pub root: Option<PathBuf>,
}

impl ProjectContext {
    /// Locates the project enclosing `path`.
    pub fn locate(path: Option<&Path>) -> Self {
        Self {
            root: path.and_then(find_project_root),
        }
    }
}

/// Walks ancestor directories of `path` looking for a [`MARKER_FILE`].
///
/// Starts at the directory containing `path` and moves upward, returning the
/// first directory that contains the marker. Terminates at the filesystem
/// root, returning `None`. An empty path returns `None` immediately.
pub fn find_project_root(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        return None;
    }

    let mut current = path.parent()?;
    loop {
        if current.join(MARKER_FILE).is_file() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

//! Checker invocations and the ordered argument builder.
//!
//! An [`Invocation`] is a fully-specified command line plus the document
//! text to pipe over stdin, built fresh per triggering event and never
//! reused. The checker's argument parser is order-sensitive: flags precede
//! positional targets, and flags serialize in a fixed precedence: origin
//! tag, project root, file path, output format, retry policy.

use std::fmt;
use std::path::PathBuf;

use crate::editor::host::DocumentSnapshot;
use crate::error::ValidationError;
use crate::project::ProjectContext;
use crate::settings::Settings;

/// Sentinel marker injected at the cursor so the checker can locate the
/// completion position itself; autocomplete invocations carry no coordinate
/// targets.
pub const MAGIC_TOKEN: &str = "AUTO332";

/// Fixed origin tag identifying this integration to the checker; affects
/// the checker's response formatting conventions.
pub const ORIGIN_TAG: &str = "nuclide";

/// Opt-in marker comments. A document must contain one of these for
/// type-checking features to activate on it.
pub const PRAGMA_MARKERS: [&str; 2] = ["// @flow", "/* @flow */"];

/// Lexical scope fragment a cursor must sit in for requests to be built.
pub const JS_SCOPE: &str = "source.js";

/// One checker operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Jump to the definition of the symbol at a position.
    GetDef,
    /// Report the inferred type at a position.
    TypeAtPos,
    /// Complete the token at the injected marker.
    Autocomplete,
    /// Type-check the piped document contents.
    CheckContents,
    /// Report expressions the checker could not cover.
    Coverage,
}

impl Operation {
    /// The checker subcommand name.
    pub fn name(self) -> &'static str {
        match self {
            Self::GetDef => "get-def",
            Self::TypeAtPos => "type-at-pos",
            Self::Autocomplete => "autocomplete",
            Self::CheckContents => "check-contents",
            Self::Coverage => "coverage",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The ordered flag set of an invocation.
///
/// [`ArgSet::to_args`] is a pure function from this record to argument
/// tokens; field order here mirrors the serialization precedence the
/// checker's parser expects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgSet {
    /// `--from <tag>`: origin tag.
    pub from_editor: Option<String>,
    /// `--root <dir>`: project root.
    pub root: Option<PathBuf>,
    /// `--path <file>`: path attributed to the piped contents.
    pub path: Option<PathBuf>,
    /// `--json`: machine-readable output.
    pub json: bool,
    /// `--retry-if-init <bool>`: whether to wait for a server still
    /// initializing. Omitted entirely when `None`.
    pub retry_if_init: Option<bool>,
}

impl ArgSet {
    /// Serializes the flags in their fixed precedence order.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(from) = &self.from_editor {
            args.push("--from".to_string());
            args.push(from.clone());
        }
        if let Some(root) = &self.root {
            args.push("--root".to_string());
            args.push(root.display().to_string());
        }
        if let Some(path) = &self.path {
            args.push("--path".to_string());
            args.push(path.display().to_string());
        }
        if self.json {
            args.push("--json".to_string());
        }
        if let Some(retry) = self.retry_if_init {
            args.push("--retry-if-init".to_string());
            args.push(if retry { "true" } else { "false" }.to_string());
        }
        args
    }
}

/// A fully-specified checker call: executable, subcommand, ordered flags,
/// positional targets, and the text piped to stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Checker executable to spawn.
    pub executable: PathBuf,
    /// Subcommand to run.
    pub operation: Operation,
    /// Ordered flags.
    pub args: ArgSet,
    /// Positional targets, appended after all flags.
    pub targets: Vec<String>,
    /// Document text written to the child's stdin.
    pub stdin_payload: String,
}

impl Invocation {
    /// The argument vector passed to the spawned process (everything after
    /// the executable itself).
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.operation.name().to_string()];
        argv.extend(self.args.to_args());
        argv.extend(self.targets.iter().cloned());
        argv
    }

    /// Builds a go-to-definition lookup at the snapshot's cursor.
    pub fn get_def(
        snapshot: &DocumentSnapshot,
        project: &ProjectContext,
        settings: &Settings,
    ) -> Result<Self, ValidationError> {
        let root = validate(snapshot, project, PragmaCheck::Skip)?;
        Ok(Self {
            executable: settings.resolve_binary(Some(&root)),
            operation: Operation::GetDef,
            args: ArgSet {
                from_editor: Some(ORIGIN_TAG.to_string()),
                root: Some(root),
                path: snapshot.path.clone(),
                json: true,
                retry_if_init: None,
            },
            targets: position_targets(snapshot.cursor_row, snapshot.cursor_col),
            stdin_payload: snapshot.text.clone(),
        })
    }

    /// Builds a type-at-position query at the snapshot's cursor.
    pub fn type_at_pos(
        snapshot: &DocumentSnapshot,
        project: &ProjectContext,
        settings: &Settings,
    ) -> Result<Self, ValidationError> {
        let root = validate(snapshot, project, PragmaCheck::Skip)?;
        Ok(Self {
            executable: settings.resolve_binary(Some(&root)),
            operation: Operation::TypeAtPos,
            args: ArgSet {
                from_editor: Some(ORIGIN_TAG.to_string()),
                root: Some(root),
                path: snapshot.path.clone(),
                json: true,
                retry_if_init: None,
            },
            targets: position_targets(snapshot.cursor_row, snapshot.cursor_col),
            stdin_payload: snapshot.text.clone(),
        })
    }

    /// Builds an autocomplete request.
    ///
    /// The piped text gets the [`MAGIC_TOKEN`] injected at the cursor so the
    /// checker infers the position itself; interactive latency matters more
    /// than completeness here, so retry-on-init is disabled.
    pub fn autocomplete(
        snapshot: &DocumentSnapshot,
        project: &ProjectContext,
        settings: &Settings,
    ) -> Result<Self, ValidationError> {
        let root = validate(snapshot, project, PragmaCheck::Require)?;
        Ok(Self {
            executable: settings.resolve_binary(Some(&root)),
            operation: Operation::Autocomplete,
            args: ArgSet {
                from_editor: Some(ORIGIN_TAG.to_string()),
                root: Some(root),
                path: None,
                json: true,
                retry_if_init: Some(false),
            },
            targets: file_target(snapshot),
            stdin_payload: inject_completion_token(
                &snapshot.text,
                snapshot.cursor_row,
                snapshot.cursor_col,
            ),
        })
    }

    /// Builds a whole-document diagnostics check.
    pub fn check_contents(
        snapshot: &DocumentSnapshot,
        project: &ProjectContext,
        settings: &Settings,
    ) -> Result<Self, ValidationError> {
        let root = validate(snapshot, project, PragmaCheck::Require)?;
        Ok(Self {
            executable: settings.resolve_binary(Some(&root)),
            operation: Operation::CheckContents,
            args: whole_document_args(),
            targets: file_target(snapshot),
            stdin_payload: snapshot.text.clone(),
        })
    }

    /// Builds a whole-document coverage query.
    pub fn coverage(
        snapshot: &DocumentSnapshot,
        project: &ProjectContext,
        settings: &Settings,
    ) -> Result<Self, ValidationError> {
        let root = validate(snapshot, project, PragmaCheck::Require)?;
        Ok(Self {
            executable: settings.resolve_binary(Some(&root)),
            operation: Operation::Coverage,
            args: whole_document_args(),
            targets: file_target(snapshot),
            stdin_payload: snapshot.text.clone(),
        })
    }
}

/// Whole-document operations carry only origin tag, format, and the
/// no-retry directive.
fn whole_document_args() -> ArgSet {
    ArgSet {
        from_editor: Some(ORIGIN_TAG.to_string()),
        root: None,
        path: None,
        json: true,
        retry_if_init: Some(false),
    }
}

/// The checker expects 1-based coordinates; snapshot coordinates are
/// zero-based. The adjustment happens exactly once, here.
fn position_targets(row: u32, col: u32) -> Vec<String> {
    vec![(row + 1).to_string(), (col + 1).to_string()]
}

fn file_target(snapshot: &DocumentSnapshot) -> Vec<String> {
    snapshot
        .path
        .iter()
        .map(|p| p.display().to_string())
        .collect()
}

/// Whether a builder enforces the opt-in marker comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PragmaCheck {
    Require,
    Skip,
}

/// Checks the shared request preconditions and returns the project root.
///
/// Failures here are expected states, not faults: they short-circuit the
/// operation before any process is spawned.
fn validate(
    snapshot: &DocumentSnapshot,
    project: &ProjectContext,
    pragma: PragmaCheck,
) -> Result<PathBuf, ValidationError> {
    if snapshot.path.is_none() {
        return Err(ValidationError::MissingPath);
    }
    let Some(root) = &project.root else {
        return Err(ValidationError::NoProjectRoot);
    };
    if pragma == PragmaCheck::Require && !has_pragma(&snapshot.text) {
        return Err(ValidationError::MissingPragma);
    }
    if !snapshot.cursor_scope.contains(JS_SCOPE) {
        return Err(ValidationError::NotJavascript(snapshot.cursor_scope.clone()));
    }
    Ok(root.clone())
}

/// Whether the document opts in to type checking.
pub fn has_pragma(text: &str) -> bool {
    PRAGMA_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Inserts the [`MAGIC_TOKEN`] at `(row, col)` within the cursor's line,
/// leaving every other line untouched.
///
/// `col` counts characters, so the insertion point is resolved to a UTF-8
/// boundary; a cursor at or past the end of the line appends the token
/// without dropping the line's trailing characters. A `row` past the last
/// line returns the text unchanged.
pub fn inject_completion_token(text: &str, row: u32, col: u32) -> String {
    let row = row as usize;
    let mut result = String::with_capacity(text.len() + MAGIC_TOKEN.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            result.push('\n');
        }
        if i == row {
            let at = char_boundary(line, col as usize);
            result.push_str(&line[..at]);
            result.push_str(MAGIC_TOKEN);
            result.push_str(&line[at..]);
        } else {
            result.push_str(line);
        }
    }
    result
}

/// Byte offset of the `col`-th character of `line`, clamped to the line
/// end.
fn char_boundary(line: &str, col: usize) -> usize {
    line.char_indices()
        .map(|(offset, _)| offset)
        .nth(col)
        .unwrap_or(line.len())
}

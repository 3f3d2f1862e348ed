//! Translation of checker JSON responses into normalized results.
//!
//! One pure function per operation, total over the documented response
//! shapes. A payload that parses as JSON but does not match its operation's
//! shape is an explicit [`TranslateError::UnrecognizedShape`] fault, never a
//! panic. The checker speaks 1-based, end-inclusive coordinates; spans are
//! normalized here to zero-based rows and columns with exclusive end
//! columns, and nowhere else.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::editor::host::SourceSpan;
use crate::error::TranslateError;

/// Where a symbol is defined, in the checker's 1-based coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionLocation {
    /// File containing the definition.
    pub file: PathBuf,
    /// One-based line.
    pub line: u32,
    /// One-based column.
    pub column: u32,
}

/// One completion suggestion from the checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionCandidate {
    /// Candidate symbol name.
    pub name: String,
    /// Human-readable type of the candidate.
    pub type_label: String,
    /// Parameter names when the candidate is callable; `None` for
    /// non-function candidates.
    pub params: Option<Vec<String>>,
}

impl CompletionCandidate {
    /// Synthesizes the text inserted on acceptance.
    ///
    /// Callable candidates become a call snippet `name(p1, p2)` (an empty
    /// parameter list yields `name()`); non-callables and suppressed
    /// parameter lists fall back to the bare name.
    pub fn snippet(&self, omit_parameters: bool) -> String {
        match &self.params {
            Some(params) if !omit_parameters => {
                format!("{}({})", self.name, params.join(", "))
            }
            _ => self.name.clone(),
        }
    }
}

/// One checker error: the regions it touches plus its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Regions the error touches: zero-or-one operation span followed by
    /// one-or-more message spans, in response order.
    pub spans: Vec<SourceSpan>,
    /// Concatenated message text.
    pub message: String,
}

/// Spans the checker could not cover, plus the response's own total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageReport {
    /// Uncovered regions, in response order.
    pub uncovered: Vec<SourceSpan>,
    /// Total uncovered count as reported by the checker.
    pub uncovered_count: u64,
}

// Raw response shapes. These mirror the checker's JSON exactly and stay
// private to this module.

#[derive(Debug, Deserialize)]
struct RawDefinition {
    #[serde(default)]
    path: String,
    #[serde(default)]
    line: u32,
    #[serde(default)]
    start: u32,
}

#[derive(Debug, Deserialize)]
struct RawType {
    #[serde(rename = "type")]
    type_label: String,
}

#[derive(Debug, Deserialize)]
struct RawCompletions {
    result: Vec<RawCandidate>,
}

#[derive(Debug, Deserialize)]
struct RawCandidate {
    name: String,
    #[serde(rename = "type", default)]
    type_label: String,
    func_details: Option<RawFuncDetails>,
}

#[derive(Debug, Deserialize)]
struct RawFuncDetails {
    #[serde(default)]
    params: Vec<RawParam>,
}

#[derive(Debug, Deserialize)]
struct RawParam {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawCheck {
    #[serde(default)]
    passed: bool,
    #[serde(default)]
    errors: Vec<RawError>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    operation: Option<RawFragment>,
    #[serde(default)]
    message: Vec<RawFragment>,
}

#[derive(Debug, Deserialize)]
struct RawFragment {
    line: u32,
    endline: Option<u32>,
    start: u32,
    end: u32,
    #[serde(default)]
    descr: String,
}

impl RawFragment {
    fn span(&self) -> SourceSpan {
        SourceSpan {
            start_row: self.line.saturating_sub(1),
            start_col: self.start.saturating_sub(1),
            end_row: self.endline.unwrap_or(self.line).saturating_sub(1),
            // 1-based inclusive end equals zero-based exclusive end.
            end_col: self.end,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCoverage {
    expressions: RawExpressions,
}

#[derive(Debug, Deserialize)]
struct RawExpressions {
    #[serde(default)]
    uncovered_locs: Vec<RawLoc>,
    #[serde(default)]
    uncovered_count: u64,
}

#[derive(Debug, Deserialize)]
struct RawLoc {
    start: RawPoint,
    end: RawEndPoint,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    line: u32,
    column: u32,
}

#[derive(Debug, Deserialize)]
struct RawEndPoint {
    line: Option<u32>,
    column: u32,
}

fn shape<T: for<'de> Deserialize<'de>>(
    operation: &'static str,
    json: Value,
) -> Result<T, TranslateError> {
    serde_json::from_value(json).map_err(|e| TranslateError::UnrecognizedShape {
        operation,
        detail: e.to_string(),
    })
}

/// Translates a `get-def` response.
///
/// An empty path field means "no definition found", which is a valid
/// outcome rather than an error.
pub fn translate_definition(json: Value) -> Result<Option<DefinitionLocation>, TranslateError> {
    let raw: RawDefinition = shape("get-def", json)?;
    if raw.path.is_empty() {
        return Ok(None);
    }
    Ok(Some(DefinitionLocation {
        file: PathBuf::from(raw.path),
        line: raw.line,
        column: raw.start,
    }))
}

/// Translates a `type-at-pos` response into the inferred type label.
pub fn translate_type(json: Value) -> Result<String, TranslateError> {
    let raw: RawType = shape("type-at-pos", json)?;
    Ok(raw.type_label)
}

/// Translates an `autocomplete` response into ordered candidates.
pub fn translate_completions(json: Value) -> Result<Vec<CompletionCandidate>, TranslateError> {
    let raw: RawCompletions = shape("autocomplete", json)?;
    Ok(raw
        .result
        .into_iter()
        .map(|candidate| CompletionCandidate {
            name: candidate.name,
            type_label: candidate.type_label,
            params: candidate
                .func_details
                .map(|details| details.params.into_iter().map(|p| p.name).collect()),
        })
        .collect())
}

/// Translates a `check-contents` response into ordered diagnostics.
///
/// `passed: true` yields an empty list, which callers use to clear prior
/// decorations.
pub fn translate_diagnostics(json: Value) -> Result<Vec<Diagnostic>, TranslateError> {
    let raw: RawCheck = shape("check-contents", json)?;
    if raw.passed {
        return Ok(Vec::new());
    }
    Ok(raw
        .errors
        .into_iter()
        .map(|error| {
            let mut spans = Vec::new();
            if let Some(operation) = &error.operation {
                spans.push(operation.span());
            }
            let mut descriptions = Vec::new();
            for fragment in &error.message {
                spans.push(fragment.span());
                if !fragment.descr.is_empty() {
                    descriptions.push(fragment.descr.clone());
                }
            }
            Diagnostic {
                spans,
                message: descriptions.join(" "),
            }
        })
        .collect())
}

/// Aggregates diagnostic messages per row.
///
/// Rows touched by multiple diagnostics get the messages appended with a
/// `"; "` separator; text already present for a row is not repeated.
pub fn descriptions_by_row(diagnostics: &[Diagnostic]) -> BTreeMap<u32, String> {
    let mut by_row: BTreeMap<u32, String> = BTreeMap::new();
    for diagnostic in diagnostics {
        if diagnostic.message.is_empty() {
            continue;
        }
        let rows: BTreeSet<u32> = diagnostic.spans.iter().map(|span| span.start_row).collect();
        for row in rows {
            match by_row.get_mut(&row) {
                None => {
                    by_row.insert(row, diagnostic.message.clone());
                }
                Some(existing) => {
                    if !existing.contains(&diagnostic.message) {
                        existing.push_str("; ");
                        existing.push_str(&diagnostic.message);
                    }
                }
            }
        }
    }
    by_row
}

/// Translates a `coverage` response.
pub fn translate_coverage(json: Value) -> Result<CoverageReport, TranslateError> {
    let raw: RawCoverage = shape("coverage", json)?;
    let uncovered = raw
        .expressions
        .uncovered_locs
        .into_iter()
        .map(|loc| SourceSpan {
            start_row: loc.start.line.saturating_sub(1),
            start_col: loc.start.column.saturating_sub(1),
            end_row: loc.end.line.unwrap_or(loc.start.line).saturating_sub(1),
            end_col: loc.end.column,
        })
        .collect();
    Ok(CoverageReport {
        uncovered,
        uncovered_count: raw.expressions.uncovered_count,
    })
}

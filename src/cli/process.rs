//! Checker subprocess execution.
//!
//! One invocation, one short-lived child process: the document is fed over
//! a stdin pipe, the write end is closed before the child can block reading
//! it, and stdout/stderr are captured and merged. The merged output is
//! parsed as JSON regardless of exit status: the checker reports "found
//! problems" as a JSON payload with a non-zero exit code.
//!
//! All pipes are closed on every exit path: `output()` consumes the child
//! and collects both streams, and `kill_on_drop` reaps it if collection is
//! abandoned early.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::Path;
use std::process::Stdio;

use futures::AsyncWriteExt;
use tracing::{debug, warn};

use crate::cli::CliResult;
use crate::cli::invocation::Invocation;
use crate::error::InvokeError;

/// Common checker install location appended to the child's search path when
/// the caller's environment omits it.
const FALLBACK_BIN_DIR: &str = "/usr/local/bin";

/// Executes `invocation` and classifies its output.
///
/// Returns `Ok(CliResult::Success)` whenever the merged output parses as
/// JSON, irrespective of exit code, and `Ok(CliResult::Failure)` with the
/// raw text otherwise. `Err` is reserved for adapter faults: the binary
/// could not be spawned or a pipe failed.
pub async fn invoke(invocation: &Invocation) -> Result<CliResult, InvokeError> {
    let argv = invocation.argv();
    debug!(
        executable = %invocation.executable.display(),
        args = ?argv,
        "invoking checker"
    );

    let mut command = async_process::Command::new(&invocation.executable);
    command
        .args(&argv)
        .env("PATH", augmented_path(std::env::var_os("PATH").as_deref()))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|source| InvokeError::SpawnFailed {
        command: invocation.executable.display().to_string(),
        source,
    })?;

    let mut stdin = child.stdin.take().ok_or(InvokeError::StdinUnavailable)?;
    let payload = invocation.stdin_payload.clone();
    let feed = async move {
        // A child that exits without draining stdin closes the pipe early;
        // that is its prerogative, not a fault.
        match stdin.write_all(payload.as_bytes()).await {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => return Ok(()),
            other => other.map_err(InvokeError::StdinWrite)?,
        }
        match stdin.close().await {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other.map_err(InvokeError::StdinWrite),
        }
    };
    let collect = async { child.output().await.map_err(InvokeError::OutputCapture) };

    // Feed and collect concurrently so a chatty child can never deadlock
    // against an unfinished stdin write.
    let (output, ()) = futures::future::try_join(collect, feed).await?;

    let mut merged = output.stdout;
    merged.extend_from_slice(&output.stderr);

    debug!(
        status = ?output.status.code(),
        bytes = merged.len(),
        "checker exited"
    );

    match serde_json::from_slice(&merged) {
        Ok(json) => Ok(CliResult::Success(json)),
        Err(parse_err) => {
            let raw = String::from_utf8_lossy(&merged).into_owned();
            warn!(
                operation = %invocation.operation,
                error = %parse_err,
                "checker output was not JSON"
            );
            Ok(CliResult::Failure(raw))
        }
    }
}

/// Returns `current` with [`FALLBACK_BIN_DIR`] appended when missing.
///
/// Applied to the child environment only; the parent's PATH is never
/// mutated.
fn augmented_path(current: Option<&OsStr>) -> OsString {
    let mut parts: Vec<std::path::PathBuf> = current
        .map(|path| std::env::split_paths(path).collect())
        .unwrap_or_default();
    if !parts.iter().any(|part| part == Path::new(FALLBACK_BIN_DIR)) {
        parts.push(FALLBACK_BIN_DIR.into());
    }
    std::env::join_paths(parts)
        .unwrap_or_else(|_| current.map_or_else(|| FALLBACK_BIN_DIR.into(), OsStr::to_os_string))
}

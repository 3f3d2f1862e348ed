//! Flow Bridge - Headless Entry Point
//!
//! A file-backed host for the adapter: runs one checker operation against a
//! source file from the command line and prints the normalized result as
//! JSON. Useful for driving the adapter without an editor attached.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use flow_bridge::editor::{EditorHost, FlowBridge, SourceSpan};
use flow_bridge::settings::SettingsOverlay;

/// Headless driver for the Flow checker adapter.
#[derive(Parser, Debug)]
#[command(name = "flow-bridge")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Operation to run.
    #[arg(value_enum)]
    operation: OperationArg,

    /// Source file to run the operation against.
    file: PathBuf,

    /// One-based cursor line for position-based operations.
    #[arg(short, long, default_value_t = 1)]
    line: u32,

    /// One-based cursor column for position-based operations.
    #[arg(short, long, default_value_t = 1)]
    column: u32,

    /// Path to a JSON settings overlay.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error.
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Operations the driver exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OperationArg {
    /// Jump to the definition under the cursor.
    GetDef,
    /// Report the inferred type under the cursor.
    TypeAtPos,
    /// Complete the token at the cursor.
    Autocomplete,
    /// Type-check the document.
    Check,
    /// Report uncovered expressions.
    Coverage,
}

impl Args {
    /// Parses the log level string into a tracing Level.
    fn parse_log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            other => anyhow::bail!("invalid log level: {}", other),
        }
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(level: Level) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("flow_bridge={level}")));

    // Logs go to stderr to keep stdout clean for the result JSON.
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    Ok(())
}

/// A file-backed [`EditorHost`]: buffer text comes from disk, decorations
/// are recorded for the final report instead of drawn.
struct FileHost {
    path: PathBuf,
    text: String,
    cursor: (u32, u32),
    regions: Mutex<BTreeMap<String, Vec<SourceSpan>>>,
    status: Mutex<BTreeMap<String, String>>,
    popups: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
}

impl FileHost {
    fn load(path: &Path, line: u32, column: u32) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let path = path
            .canonicalize()
            .with_context(|| format!("failed to canonicalize {}", path.display()))?;
        Ok(Self {
            path,
            text,
            cursor: (line.saturating_sub(1), column.saturating_sub(1)),
            regions: Mutex::new(BTreeMap::new()),
            status: Mutex::new(BTreeMap::new()),
            popups: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
        })
    }
}

impl EditorHost for FileHost {
    fn file_path(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }

    fn buffer_text(&self) -> String {
        self.text.clone()
    }

    fn cursor(&self) -> (u32, u32) {
        self.cursor
    }

    fn scope_at_cursor(&self) -> String {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("js" | "jsx" | "mjs") => "source.js".to_string(),
            _ => "text.plain".to_string(),
        }
    }

    fn open_location(&self, file: &Path, line: u32, column: u32) {
        self.opened
            .lock()
            .unwrap()
            .push(format!("{}:{line}:{column}", file.display()));
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

fn load_overlay(path: Option<&Path>) -> Result<SettingsOverlay> {
    let Some(path) = path else {
        return Ok(SettingsOverlay::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse settings file {}", path.display()))
}

/// Main entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = args.parse_log_level()?;
    init_tracing(log_level)?;

    let mut overlay = load_overlay(args.settings.as_deref())?;
    if args.operation == OperationArg::Coverage {
        // The coverage operation is opt-in; running it from the driver is
        // the opt-in.
        overlay.show_coverage = Some(true);
    }

    let host = FileHost::load(&args.file, args.line, args.column)?;

    info!(
        file = %host.path.display(),
        operation = ?args.operation,
        "running checker operation"
    );

    let bridge = FlowBridge::new();
    bridge.initialize(overlay);

    let report = match args.operation {
        OperationArg::GetDef => {
            let definition = bridge.goto_definition(&host).await;
            serde_json::json!({ "definition": definition })
        }
        OperationArg::TypeAtPos => {
            let type_label = bridge.type_at_cursor(&host).await;
            serde_json::json!({ "type": type_label })
        }
        OperationArg::Autocomplete => {
            let completions = bridge.autocomplete(&host).await;
            serde_json::json!({ "completions": completions })
        }
        OperationArg::Check => {
            bridge.check(&host).await;
            serde_json::json!({
                "regions": *host.regions.lock().unwrap(),
                "status": *host.status.lock().unwrap(),
            })
        }
        OperationArg::Coverage => {
            bridge.coverage(&host).await;
            serde_json::json!({
                "regions": *host.regions.lock().unwrap(),
                "status": *host.status.lock().unwrap(),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

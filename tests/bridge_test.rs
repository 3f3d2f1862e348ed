//! End-to-end tests for the bridge: real subprocess round trips against
//! fake checker binaries installed in a scratch project.

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use common::{RecordingHost, TestProject, invocation_count};
use flow_bridge::cli::response::DefinitionLocation;
use flow_bridge::editor::{FlowBridge, SourceSpan};
use flow_bridge::settings::SettingsOverlay;
use serial_test::serial;

const PRAGMA_BUFFER: &str = "// @flow\nconst x: number = 'nope';\n";

fn ready_bridge() -> FlowBridge {
    let bridge = FlowBridge::new();
    bridge.initialize(SettingsOverlay::default());
    bridge
}

fn seed_error_regions(host: &RecordingHost) {
    use flow_bridge::editor::EditorHost;
    host.add_regions(
        "flow_error",
        &[SourceSpan { start_row: 0, start_col: 0, end_row: 0, end_col: 1 }],
    );
}

#[tokio::test]
async fn test_goto_definition_opens_location() {
    let project = TestProject::new();
    project.fake_checker(
        "cat > /dev/null\necho '{\"path\":\"/project/lib.js\",\"line\":3,\"start\":2}'\n",
    );
    let file = project.write_file("app.js", PRAGMA_BUFFER);
    let host = RecordingHost::new(file, PRAGMA_BUFFER);

    let location = ready_bridge().goto_definition(&host).await;

    assert_eq!(
        location,
        Some(DefinitionLocation {
            file: PathBuf::from("/project/lib.js"),
            line: 3,
            column: 2,
        })
    );
    assert_eq!(
        *host.opened.lock().unwrap(),
        vec![(PathBuf::from("/project/lib.js"), 3, 2)]
    );
}

#[tokio::test]
async fn test_goto_definition_absent_result_opens_nothing() {
    let project = TestProject::new();
    project.fake_checker("cat > /dev/null\necho '{\"path\":\"\",\"line\":0,\"start\":1}'\n");
    let file = project.write_file("app.js", PRAGMA_BUFFER);
    let host = RecordingHost::new(file, PRAGMA_BUFFER);

    assert_eq!(ready_bridge().goto_definition(&host).await, None);
    assert!(host.opened.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_type_at_cursor_shows_popup() {
    let project = TestProject::new();
    project.fake_checker("cat > /dev/null\necho '{\"type\":\"(x: number) => string\"}'\n");
    let file = project.write_file("app.js", PRAGMA_BUFFER);
    let host = RecordingHost::new(file, PRAGMA_BUFFER);

    let label = ready_bridge().type_at_cursor(&host).await;

    assert_eq!(label.as_deref(), Some("(x: number) => string"));
    assert_eq!(*host.popups.lock().unwrap(), vec!["(x: number) => string"]);
}

#[tokio::test]
async fn test_autocomplete_pipes_tokenized_buffer_and_returns_snippets() {
    let project = TestProject::new();
    let capture = project.root().join("stdin.capture");
    project.fake_checker(&format!(
        "cat > \"{}\"\necho '{{\"result\":[{{\"name\":\"bar\",\"type\":\"() => void\",\"func_details\":{{\"params\":[]}}}},{{\"name\":\"baz\",\"type\":\"number\"}}]}}'\n",
        capture.display()
    ));
    let text = "// @flow\nfoo.bar\n";
    let file = project.write_file("app.js", text);
    let host = RecordingHost::new(file, text).with_cursor(1, 4);

    let completions = ready_bridge().autocomplete(&host).await.unwrap();

    // The piped buffer carries the magic token at the cursor, with the rest
    // of the line intact.
    let piped = std::fs::read_to_string(&capture).unwrap();
    assert_eq!(piped, "// @flow\nfoo.AUTO332bar\n");

    assert_eq!(completions.items.len(), 2);
    assert_eq!(completions.items[0].label, "bar\t() => void");
    assert_eq!(completions.items[0].snippet, "bar()");
    assert_eq!(completions.items[1].snippet, "baz");
    assert!(completions.suppress_host_suggestions);
}

#[tokio::test]
async fn test_check_draws_regions_and_row_status() {
    let project = TestProject::new();
    project.fake_checker(
        "cat > /dev/null\necho '{\"passed\":false,\"errors\":[{\"message\":[{\"descr\":\"number is incompatible with string\",\"line\":2,\"start\":1,\"end\":6}]}]}'\n",
    );
    let file = project.write_file("app.js", PRAGMA_BUFFER);
    let host = RecordingHost::new(file, PRAGMA_BUFFER).with_cursor(1, 0);

    ready_bridge().check(&host).await;

    assert_eq!(
        host.regions_for("flow_error"),
        Some(vec![SourceSpan { start_row: 1, start_col: 0, end_row: 1, end_col: 6 }])
    );
    assert_eq!(
        host.status_text("flow_error").as_deref(),
        Some("Flow: 1 error: number is incompatible with string")
    );
}

#[tokio::test]
async fn test_passing_check_clears_prior_decorations() {
    let project = TestProject::new();
    project.fake_checker("cat > /dev/null\necho '{\"passed\":true,\"errors\":[]}'\n");
    let file = project.write_file("app.js", PRAGMA_BUFFER);
    let host = RecordingHost::new(file, PRAGMA_BUFFER);
    seed_error_regions(&host);

    ready_bridge().check(&host).await;

    assert_eq!(host.regions_for("flow_error"), None);
    assert_eq!(host.status_text("flow_error").as_deref(), Some("Flow: no errors"));
}

#[tokio::test]
async fn test_document_without_pragma_never_invokes_checker() {
    let project = TestProject::new();
    let log = project.spy_log();
    project.spy_checker(&log, "{\"passed\":true,\"errors\":[]}");
    let text = "const x = 1;\n";
    let file = project.write_file("app.js", text);
    let host = RecordingHost::new(file, text);
    seed_error_regions(&host);

    ready_bridge().check(&host).await;

    assert_eq!(invocation_count(&log), 0);
    // Validation still clears stale decorations.
    assert_eq!(host.regions_for("flow_error"), None);
}

#[tokio::test]
async fn test_unparseable_output_clears_decorations_and_sets_status() {
    let project = TestProject::new();
    project.fake_checker("cat > /dev/null\necho 'flow is still initializing'\n");
    let file = project.write_file("app.js", PRAGMA_BUFFER);
    let host = RecordingHost::new(file, PRAGMA_BUFFER);
    seed_error_regions(&host);

    ready_bridge().check(&host).await;

    assert_eq!(host.regions_for("flow_error"), None);
    assert_eq!(
        host.status_text("flow_error").as_deref(),
        Some("Flow: unexpected checker output")
    );
}

#[tokio::test]
async fn test_uninitialized_bridge_never_invokes_checker() {
    let project = TestProject::new();
    let log = project.spy_log();
    project.spy_checker(&log, "{\"passed\":true,\"errors\":[]}");
    let file = project.write_file("app.js", PRAGMA_BUFFER);
    let host = RecordingHost::new(file, PRAGMA_BUFFER);

    let bridge = FlowBridge::new();
    bridge.check(&host).await;

    assert_eq!(invocation_count(&log), 0);
}

#[tokio::test]
#[serial]
async fn test_rapid_schedule_check_collapses_to_one_invocation() {
    let project = TestProject::new();
    let log = project.spy_log();
    project.spy_checker(&log, "{\"passed\":true,\"errors\":[]}");
    let file = project.write_file("app.js", PRAGMA_BUFFER);
    let host = Arc::new(RecordingHost::new(file, PRAGMA_BUFFER));

    let bridge = Arc::new(FlowBridge::new());
    bridge.initialize(SettingsOverlay {
        debounce_ms: Some(50),
        ..Default::default()
    });

    for _ in 0..5 {
        bridge.schedule_check(&host);
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(invocation_count(&log), 1);
    assert_eq!(host.status_text("flow_error").as_deref(), Some("Flow: no errors"));
}

#[tokio::test]
async fn test_coverage_draws_uncovered_spans_when_enabled() {
    let project = TestProject::new();
    project.fake_checker(
        "cat > /dev/null\necho '{\"expressions\":{\"uncovered_count\":1,\"uncovered_locs\":[{\"start\":{\"line\":4,\"column\":2},\"end\":{\"line\":4,\"column\":9}}]}}'\n",
    );
    let file = project.write_file("app.js", PRAGMA_BUFFER);
    let host = RecordingHost::new(file, PRAGMA_BUFFER).with_overlay(SettingsOverlay {
        show_coverage: Some(true),
        ..Default::default()
    });

    ready_bridge().coverage(&host).await;

    assert_eq!(
        host.regions_for("flow_uncovered"),
        Some(vec![SourceSpan { start_row: 3, start_col: 1, end_row: 3, end_col: 9 }])
    );
    assert_eq!(
        host.status_text("flow_coverage").as_deref(),
        Some("Flow coverage: 1 line uncovered")
    );
}

#[tokio::test]
async fn test_coverage_is_off_by_default() {
    let project = TestProject::new();
    let log = project.spy_log();
    project.spy_checker(
        &log,
        "{\"expressions\":{\"uncovered_count\":0,\"uncovered_locs\":[]}}",
    );
    let file = project.write_file("app.js", PRAGMA_BUFFER);
    let host = RecordingHost::new(file, PRAGMA_BUFFER);

    ready_bridge().coverage(&host).await;

    assert_eq!(invocation_count(&log), 0);
}

#[tokio::test]
async fn test_file_outside_any_project_is_ignored() {
    // No .flowconfig: buffer lives in a bare temp dir.
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("loose.js");
    std::fs::write(&file, PRAGMA_BUFFER).unwrap();
    let host = RecordingHost::new(file, PRAGMA_BUFFER);

    assert_eq!(ready_bridge().goto_definition(&host).await, None);
    assert!(host.opened.lock().unwrap().is_empty());
}

use std::path::Path;
use std::process::{Command, Output};

fn dfnref_cmd(fixture: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dfnref"));
    cmd.current_dir(Path::new("tests/fixtures").join(fixture));
    cmd
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!("stdout is not JSON ({e}): {}", String::from_utf8_lossy(&output.stdout))
    })
}

fn diagnostic_kinds(report: &serde_json::Value) -> Vec<String> {
    report[0]["diagnostics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["kind"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn render_links_definitions_and_references() {
    let out = dfnref_cmd("basic").args(["render", "index.html"]).output().unwrap();
    assert!(
        out.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let html = String::from_utf8(out.stdout).unwrap();

    assert!(html.contains("<dfn id=\"dfn-widget\">widget</dfn>"), "{html}");
    assert!(html.contains("<a href=\"#dfn-widget\">widgets</a>"), "{html}");
    assert!(html.contains("<a href=\"#dfn-widget\">widget</a>"), "{html}");
    assert!(html.contains("data-lt=\"gizmo|gadget\""), "{html}");
    assert!(html.contains("gizmos</a>"), "{html}");
    assert!(
        html.contains("<dfn data-dfn-for=\"Widget\" id=\"dom-widget-name\" data-dfn-type=\"attribute\">"),
        "{html}"
    );
    assert!(html.contains("<a href=\"#dom-widget-name\"><code>name</code></a>"), "{html}");
    assert!(html.contains("<dfn id=\"idl-def-widget\" data-dfn-type=\"interface\">Widget</dfn>"), "{html}");
    assert!(html.contains("<a href=\"#idl-def-widget\"><code>Widget</code></a>"), "{html}");
    assert!(!html.contains("{{"), "shorthand left in output: {html}");
}

#[test]
fn render_inserts_head_block_after_body() {
    let out = dfnref_cmd("basic").args(["render", "index.html"]).output().unwrap();
    let html = String::from_utf8(out.stdout).unwrap();
    let body = html.find("<body>").unwrap();
    let head = html.find("<div class=\"head\">").unwrap();
    assert!(head > body);
    assert!(html.contains("Widget API</h1>"));
    assert!(html.contains("19 October 2026"));
    assert!(html.contains("https://example.org/widget/"));
    assert!(html.contains("A. Editor"));
}

#[test]
fn check_clean_document_reports_json() {
    let out = dfnref_cmd("basic")
        .args(["check", "index.html", "--format", "json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let report = stdout_json(&out);
    assert!(diagnostic_kinds(&report).is_empty(), "{report}");
    assert_eq!(report[0]["references"], report[0]["resolved"]);
    assert_eq!(report[0]["references"], 6);
}

#[test]
fn check_broken_document_fails_build() {
    let out = dfnref_cmd("broken")
        .args(["check", "index.html", "--format", "json"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));

    let kinds = diagnostic_kinds(&stdout_json(&out));
    assert!(kinds.contains(&"duplicate-definition".to_string()), "{kinds:?}");
    assert!(kinds.contains(&"unknown-definition-type".to_string()), "{kinds:?}");
    assert_eq!(kinds.iter().filter(|k| *k == "unresolved-reference").count(), 2, "{kinds:?}");
}

#[test]
fn render_broken_document_still_writes_output() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.html");
    let out = dfnref_cmd("broken")
        .args(["render", "index.html", "-o"])
        .arg(&target)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Duplicate Definition"), "{stderr}");

    let html = std::fs::read_to_string(&target).unwrap();
    assert!(html.contains("<dfn id=\"dfn-alpha\">alpha</dfn>"));
    assert!(html.contains("<p>See <a>beta</a> and gamma.</p>"), "{html}");
}

#[test]
fn render_directory_applies_filters() {
    let dir = tempfile::tempdir().unwrap();
    let out = dfnref_cmd("tree")
        .args(["render", "spec", "-o"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );

    let html = std::fs::read_to_string(dir.path().join("a.html")).unwrap();
    assert!(html.contains("<a href=\"#dfn-current\">current</a>"));
    assert!(!dir.path().join("old/b.html").exists());
}

#[test]
fn render_directory_skips_its_own_output() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<p><dfn>term</dfn> <a>term</a></p>").unwrap();

    for _ in 0..2 {
        let out = Command::new(env!("CARGO_BIN_EXE_dfnref"))
            .current_dir(dir.path())
            .args(["render", ".", "-o", "build"])
            .output()
            .unwrap();
        assert!(
            out.status.success(),
            "render failed: {}",
            String::from_utf8_lossy(&out.stderr)
        );
    }

    let html = std::fs::read_to_string(dir.path().join("build/index.html")).unwrap();
    assert!(html.contains("<a href=\"#dfn-term\">term</a>"), "{html}");
    assert!(!dir.path().join("build/build").exists());
}

#[test]
fn render_directory_requires_out() {
    let out = dfnref_cmd("tree").args(["render", "spec"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Output Directory Required"));
}

#[test]
fn list_prints_definition_table() {
    let out = dfnref_cmd("basic").args(["list", "index.html", "--json"]).output().unwrap();
    assert!(out.status.success());
    let records = stdout_json(&out);
    let ids: Vec<&str> = records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"dfn-widget"), "{ids:?}");
    assert!(ids.contains(&"idl-def-widget"), "{ids:?}");
    assert!(ids.contains(&"dom-widget-name"), "{ids:?}");
}

#[test]
fn unknown_config_field_is_rejected() {
    let out = dfnref_cmd("badconfig").args(["check", "index.html"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("fuzzy_matching"));
}

#[test]
fn missing_input_is_runtime_error() {
    let out = dfnref_cmd("basic").args(["check", "nope.html"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("File Not Found"));
}

#[test]
fn info_json_lists_exit_codes() {
    let out = dfnref_cmd("basic").args(["info", "--json"]).output().unwrap();
    assert!(out.status.success());
    let info = stdout_json(&out);
    assert_eq!(info["exit_codes"].as_array().unwrap().len(), 3);
    assert_eq!(info["current_state"]["config_found"], true);
    assert_eq!(info["current_state"]["header_status"], "ED");
}

use std::path::Path;

use serde::Serialize;

use crate::config::{CONFIG_FILE, Config};

/// Output the comprehensive dfnref reference document.
pub fn run(json: bool) {
    let state = gather_state(Path::new("."));

    if json {
        print_json(&state);
    } else {
        print_markdown(&state);
    }
}

// ── State gathering ───────────────────────────────────────────────────

/// What the working directory's configuration looks like right now.
struct CurrentState {
    /// `.dfnref.toml` exists.
    config_found: bool,
    /// Load error, when the file exists but is rejected.
    config_problem: Option<String>,
    /// Number of `[external] terms`.
    external_terms: usize,
    /// `[header] spec_status`, when a header is configured.
    header_status: Option<String>,
}

/// Inspect the config in `root` without failing.
fn gather_state(root: &Path) -> CurrentState {
    let config_found = root.join(CONFIG_FILE).exists();
    return match Config::load(root) {
        Ok(config) => CurrentState {
            config_found,
            config_problem: None,
            external_terms: config.external.terms.len(),
            header_status: config.header.map(|h| return h.spec_status),
        },
        Err(e) => CurrentState {
            config_found,
            config_problem: Some(e.to_string()),
            external_terms: 0,
            header_status: None,
        },
    };
}

// ── Markdown output ───────────────────────────────────────────────────

/// Full reference as markdown on stdout.
fn print_markdown(state: &CurrentState) {
    let version = env!("CARGO_PKG_VERSION");
    print_markdown_header(version);
    print_markdown_state(state);
    println!();
    print_markdown_exit_codes();
}

/// Syntax, workflow and configuration sections.
fn print_markdown_header(version: &str) {
    print!(
        "\
# dfnref {version}

Definition and reference linking for HTML specification documents. Every
`<dfn>` becomes a link target, every bare `<a>` and shorthand reference is
resolved against them, and problems are reported as diagnostics.

## Definition Syntax

    <dfn>widget</dfn>                               plain term, id dfn-widget
    <dfn data-lt=\"widgets|gadget\">widget</dfn>      extra aliases
    <dfn data-dfn-for=\"Widget\">size</dfn>           scoped to Widget
    <dfn data-dfn-type=\"attribute\">size</dfn>       explicit type
    <dfn data-export>widget</dfn>                   exported (data-noexport to opt out)

## Reference Syntax

    <a>widget</a>                                   bare anchor, resolved
    <a data-link-for=\"Widget\">size</a>              scoped
    <a data-link-type=\"idl\">Widget</a>              type filter (dfn, idl, or a kind)
    <a data-external>fetch</a>                      may stay unresolved
    [=widget=]  [=Widget/size=]  [=widget|text=]    concept shorthand
    {{{{Widget}}}}  {{{{Widget/size}}}}  {{{{Widget/go()}}}}     IDL shorthand

## Workflow

    dfnref render <file> [-o <out>]     Render one document (stdout without -o)
    dfnref render <dir> -o <dir>        Render every .html document in a tree
    dfnref check <path>                 Diagnostics only (exit 0/1/2)
    dfnref list <file> [--json]         Print the definition table
    dfnref watch <path> -o <out>        Re-render on change
    dfnref info [--json]                This reference

## Configuration (.dfnref.toml)

    include = [\"spec/\"]                 # directory render: only these paths
    exclude = [\"spec/old/\"]             # skip these paths

    [resolve]
    case_insensitive = true             # plain terms: case-folded fallback
    singularize = true                  # plain terms: singular fallback

    [external]
    terms = [\"fetch\"]                   # keys allowed to stay unresolved

    [header]
    spec_status = \"ED\"                  # head block inserted after <body>
    short_name = \"foo\"
    editors = [{{ name = \"A. Editor\" }}]

## Current State

"
    );
}

/// Config status lines.
fn print_markdown_state(state: &CurrentState) {
    match (&state.config_problem, state.config_found) {
        (Some(problem), _) => println!("Config:   {CONFIG_FILE} (rejected: {problem})"),
        (None, true) => println!("Config:   {CONFIG_FILE} (found)"),
        (None, false) => println!("Config:   {CONFIG_FILE} (not found)"),
    }

    match &state.header_status {
        Some(status) => println!("Header:   {status}"),
        None => println!("Header:   (none)"),
    }
    println!("External: {} terms", state.external_terms);
}

/// Exit code table.
fn print_markdown_exit_codes() {
    print!(
        "\
## Exit Codes

| Code | Meaning |
|------|---------|
| 0    | Success / no error diagnostics |
| 1    | Error diagnostics found |
| 2    | Runtime error |
"
    );
}

// ── JSON output ───────────────────────────────────────────────────────

/// Top-level `info --json` document.
#[derive(Serialize)]
struct InfoJson {
    /// Current configuration state.
    current_state: StateJson,
    /// `data-dfn-type` spellings.
    definition_types: Vec<&'static str>,
    /// Exit code table.
    exit_codes: Vec<ExitCodeInfo>,
    /// `data-link-type` spellings beyond the definition types.
    link_types: Vec<&'static str>,
    /// Crate version.
    version: String,
}

/// One exit code.
#[derive(Serialize)]
struct ExitCodeInfo {
    /// Process exit code.
    code: u8,
    /// What it signals.
    meaning: String,
}

/// JSON form of `CurrentState`.
#[derive(Serialize)]
struct StateJson {
    /// `.dfnref.toml` exists.
    config_found: bool,
    /// Load error, when rejected.
    config_problem: Option<String>,
    /// Number of `[external] terms`.
    external_terms: usize,
    /// Configured header status.
    header_status: Option<String>,
}

/// Full reference as JSON on stdout.
fn print_json(state: &CurrentState) {
    let info = InfoJson {
        current_state: StateJson {
            config_found: state.config_found,
            config_problem: state.config_problem.clone(),
            external_terms: state.external_terms,
            header_status: state.header_status.clone(),
        },
        definition_types: vec![
            "dfn",
            "interface",
            "dictionary",
            "enum",
            "callback",
            "typedef",
            "namespace",
            "attribute",
            "method",
            "dict-member",
            "enum-value",
            "const",
        ],
        exit_codes: vec![
            ExitCodeInfo {
                code: 0,
                meaning: "Success / no error diagnostics".to_string(),
            },
            ExitCodeInfo {
                code: 1,
                meaning: "Error diagnostics found".to_string(),
            },
            ExitCodeInfo {
                code: 2,
                meaning: "Runtime error".to_string(),
            },
        ],
        link_types: vec!["dfn", "idl"],
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    // serde_json::to_string_pretty won't fail on this structure.
    let json = serde_json::to_string_pretty(&info).unwrap_or_default();
    println!("{json}");
}

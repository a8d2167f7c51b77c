//! One document transform: parse, collect, resolve, render.
//!
//! Every call builds its own table, so documents never see each other's
//! definitions. Collection finishes before resolution starts, which is what
//! lets a reference point at a definition further down the page.
use std::path::Path;
use std::time::SystemTime;

use crate::collector;
use crate::config::{Config, HeaderConfig};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::document;
use crate::error::Error;
use crate::header::{self, Date};
use crate::idl::{IdlIndex, IdlNamespace};
use crate::render::{self, Edit};
use crate::resolver;
use crate::table::ResolutionIndex;
use crate::types::Outcome;

/// Result of transforming one document.
#[derive(Debug)]
pub struct Transform {
    /// Collection, resolution and header diagnostics, in that order.
    pub diagnostics: Vec<Diagnostic>,
    /// The complete definition table.
    pub index: ResolutionIndex,
    /// One outcome per reference marker, document order.
    pub outcomes: Vec<Outcome>,
    /// The edited document.
    pub output: String,
}

impl Transform {
    /// Number of references that found exactly one definition.
    pub fn resolved_count(&self) -> usize {
        return self.outcomes.iter().filter(|o| return matches!(o, Outcome::Resolved { .. })).count();
    }
}

/// Read and transform the file at `path`.
///
/// The publish date comes from `[header] publish_date`, falling back to the
/// file's modification date.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if the file is missing, `Error::Io` if it
/// cannot be read, or any error from `transform`.
pub fn transform_file(path: &Path, config: &Config) -> Result<Transform, Error> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            return Error::FileNotFound {
                path: path.to_path_buf(),
            };
        }
        return Error::Io(e);
    })?;
    let modified = std::fs::metadata(path)?.modified().unwrap_or_else(|_| return SystemTime::now());
    let publish = publish_date(config.header.as_ref(), modified);
    return transform(path, source, config, publish);
}

/// Configured publish date, else the date of `fallback`.
pub fn publish_date(header: Option<&HeaderConfig>, fallback: SystemTime) -> Date {
    return header
        .and_then(|h| return h.publish_date.as_deref())
        .and_then(Date::parse)
        .unwrap_or_else(|| return Date::from_system_time(fallback));
}

/// Transform `source`. `path` names the document in errors and decides the grammar.
///
/// # Errors
///
/// Returns errors from `document::parse`. Problems inside the document are
/// diagnostics on the returned `Transform`, never errors.
pub fn transform(path: &Path, source: String, config: &Config, publish: Date) -> Result<Transform, Error> {
    let document = document::parse(path, source)?;
    let idl = IdlIndex::from_blocks(&document.source, &document.idl_blocks);

    let namespace: &dyn IdlNamespace = &idl;
    let collection = collector::collect(&document, namespace, idl.declarations());
    let (outcomes, resolution) = resolver::resolve_all(
        &document.references,
        &collection.index,
        &collection.dropped_scopes,
        &config.resolve_options(),
    );

    let mut edits = render::definition_edits(&document, &collection);
    edits.extend(render::reference_edits(&document, &outcomes, &collection.index));
    edits.extend(render::idl_edits(&document, &collection));

    let mut diagnostics = collection.diagnostics;
    diagnostics.extend(resolution);

    if let Some(header_config) = &config.header {
        for warning in &config.warnings {
            diagnostics.push(Diagnostic::new(DiagnosticKind::HeaderConfig, None, warning.clone()));
        }
        match document.body_start {
            Some(at) => {
                let block = header::render(header_config, document.title.as_deref(), publish);
                edits.push(Edit::insert(at, block));
            },
            None => diagnostics.push(Diagnostic::new(
                DiagnosticKind::HeaderConfig,
                None,
                "document has no <body>; the head block was not inserted",
            )),
        }
    }

    let output = render::apply_edits(&document.source, edits);
    return Ok(Transform {
        diagnostics,
        index: collection.index,
        outcomes,
        output,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str, config_text: &str) -> Transform {
        let config = Config::parse(Path::new(".dfnref.toml"), config_text).unwrap();
        let publish = Date::parse("2026-10-19").unwrap();
        return transform(Path::new("index.html"), html.to_string(), &config, publish).unwrap();
    }

    const HEADER: &str = "[header]\nspec_status = \"ED\"\nshort_name = \"foo\"\n\
                          ed_draft_uri = \"https://example.org/foo/\"\n\
                          editors = [{ name = \"A. Editor\" }]";

    #[test]
    fn forward_reference_resolves() {
        let out = run("<p><a>widget</a></p><p><dfn>widget</dfn></p>", "");
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert_eq!(out.resolved_count(), 1);
        assert_eq!(out.output, "<p><a href=\"#dfn-widget\">widget</a></p><p><dfn id=\"dfn-widget\">widget</dfn></p>");
    }

    #[test]
    fn sessions_are_isolated() {
        let first = run("<dfn>alpha</dfn>", "");
        let second = run("<a>alpha</a>", "");
        assert_eq!(first.index.records().len(), 1);
        assert!(second.index.records().is_empty());
        assert_eq!(second.diagnostics.first().unwrap().kind, DiagnosticKind::UnresolvedReference);
        assert_eq!(second.output, "<a>alpha</a>");
    }

    #[test]
    fn external_terms_stay_silent() {
        let out = run("<p>[=fetch=]</p>", "[external]\nterms = [\"fetch\"]");
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.output, "<p>fetch</p>");
    }

    #[test]
    fn head_block_follows_body() {
        let html = "<html><head><title>Foo API</title></head><body><p>x</p></body></html>";
        let out = run(html, HEADER);
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let head = out.output.find("<div class=\"head\">").unwrap();
        assert!(head > out.output.find("<body>").unwrap());
        assert!(out.output.contains("Foo API</h1>"));
        assert!(out.output.contains("19 October 2026"));
    }

    #[test]
    fn missing_body_is_a_warning() {
        let out = run("<dfn>alpha</dfn>", HEADER);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics.first().unwrap().kind, DiagnosticKind::HeaderConfig);
        assert!(!out.output.contains("class=\"head\""));
    }

    #[test]
    fn header_warnings_become_diagnostics() {
        let config = "[header]\nspec_status = \"ED\"\nshort_name = \"foo\"\neditors = [{ name = \"A\" }]";
        let out = run("<body></body>", config);
        assert_eq!(out.diagnostics.len(), 1);
        assert!(out.diagnostics.first().unwrap().message.contains("ed_draft_uri"));
    }

    #[test]
    fn configured_publish_date_wins() {
        let header = HeaderConfig {
            publish_date: Some("2024-02-29".to_string()),
            ..HeaderConfig::default()
        };
        let date = publish_date(Some(&header), SystemTime::UNIX_EPOCH);
        assert_eq!(date.compact(), "20240229");
        assert_eq!(publish_date(None, SystemTime::UNIX_EPOCH).compact(), "19700101");
    }
}

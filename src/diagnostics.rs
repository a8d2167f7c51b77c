//! Document diagnostics and their rendering.
//!
//! Diagnostics are collected, never thrown: a pass always completes and hands
//! back every problem it found. Runtime `Error`s are rendered here too.
use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::error::Error;
use crate::types::SourceLocation;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Severity of a diagnostic. Any error marks the build as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Fails the build.
    Error,
    /// Reported, build still succeeds.
    Warning,
}

/// What went wrong. Severity is fixed per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// A reference matched several equally-ranked definitions.
    AmbiguousReference,
    /// The same scoped key was defined twice.
    DuplicateDefinition,
    /// Header configuration is accepted but incomplete.
    HeaderConfig,
    /// A `data-lt` list contained an empty alias.
    MalformedAliasList,
    /// A `for` scope names nothing that is defined.
    MissingScopeOwner,
    /// `data-dfn-type` holds an unknown value.
    UnknownDefinitionType,
    /// `data-link-type` holds an unknown value.
    UnknownLinkType,
    /// A reference matched no definition.
    UnresolvedReference,
}

impl DiagnosticKind {
    /// Stable short code used in reports.
    pub const fn code(self) -> &'static str {
        return match self {
            Self::AmbiguousReference => "E_REF_AMBIGUOUS",
            Self::DuplicateDefinition => "E_DFN_DUP",
            Self::HeaderConfig => "W_HEADER_CONFIG",
            Self::MalformedAliasList => "E_DFN_ALIAS",
            Self::MissingScopeOwner => "W_DFN_FOR_MISSING",
            Self::UnknownDefinitionType => "E_DFN_TYPE",
            Self::UnknownLinkType => "E_REF_TYPE",
            Self::UnresolvedReference => "E_REF_UNRESOLVED",
        };
    }

    /// Severity of every diagnostic of this kind.
    pub const fn severity(self) -> Severity {
        return match self {
            Self::HeaderConfig | Self::MissingScopeOwner => Severity::Warning,
            _ => Severity::Error,
        };
    }

    /// Human heading for rendered reports.
    const fn title(self) -> &'static str {
        return match self {
            Self::AmbiguousReference => "Ambiguous Reference",
            Self::DuplicateDefinition => "Duplicate Definition",
            Self::HeaderConfig => "Header Configuration",
            Self::MalformedAliasList => "Malformed Alias List",
            Self::MissingScopeOwner => "Missing Scope Owner",
            Self::UnknownDefinitionType => "Unknown Definition Type",
            Self::UnknownLinkType => "Unknown Link Type",
            Self::UnresolvedReference => "Unresolved Reference",
        };
    }

    /// How to fix it, when there is a single obvious answer.
    const fn fix(self) -> Option<&'static str> {
        return match self {
            Self::AmbiguousReference => {
                Some("Qualify the reference with a scope (`[=Scope/term=]`, `{{Scope/member}}`, `data-link-for`) or a type (`data-link-type`).")
            },
            Self::DuplicateDefinition => {
                Some("Remove one definition, or give it a distinct `data-dfn-for` scope or `data-lt` alias.")
            },
            Self::MalformedAliasList => Some("Remove the empty entry from `data-lt`."),
            Self::UnresolvedReference => {
                Some("Define the term with `<dfn>`, fix the spelling, or mark the link `data-external`.")
            },
            Self::HeaderConfig
            | Self::MissingScopeOwner
            | Self::UnknownDefinitionType
            | Self::UnknownLinkType => None,
        };
    }
}

/// One reported problem, in pass order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: DiagnosticKind,
    /// Where it happened; `None` for document-level problems.
    pub location: Option<SourceLocation>,
    /// Human-readable description.
    pub message: String,
    /// Other locations involved, e.g. the first of two duplicate definitions.
    pub related: Vec<SourceLocation>,
    /// Derived from `kind`.
    pub severity: Severity,
}

impl Diagnostic {
    /// A diagnostic at `location`.
    pub fn new(kind: DiagnosticKind, location: Option<SourceLocation>, message: impl Into<String>) -> Self {
        return Self {
            kind,
            location,
            message: message.into(),
            related: Vec::new(),
            severity: kind.severity(),
        };
    }

    /// Attach another involved location.
    #[must_use]
    pub fn with_related(mut self, location: SourceLocation) -> Self {
        self.related.push(location);
        return self;
    }
}

/// Whether any diagnostic fails the build.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    return diagnostics.iter().any(|d| return d.severity == Severity::Error);
}

// ── Document diagnostics ──────────────────────────────────────────────

/// Print every diagnostic of one document to stderr, headings in bold.
pub fn print_diagnostics(file: &Path, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        print_markdown(&render_diagnostic(file, diagnostic));
    }
}

/// Render one diagnostic as a markdown block: what, where, how to fix.
pub fn render_diagnostic(file: &Path, diagnostic: &Diagnostic) -> String {
    let label = match diagnostic.severity {
        Severity::Error => "Error",
        Severity::Warning => "Warning",
    };
    let kind = diagnostic.kind;
    let mut out = format!("# {label}: {} ({})\n\n", kind.title(), kind.code());

    let _ = match diagnostic.location {
        Some(location) => writeln!(out, "`{}:{location}`: {}", file.display(), diagnostic.message),
        None => writeln!(out, "`{}`: {}", file.display(), diagnostic.message),
    };

    if !diagnostic.related.is_empty() {
        out.push_str("\n## See also\n\n");
        for related in &diagnostic.related {
            let _ = writeln!(out, "- {}:{related}", file.display());
        }
    }

    if let Some(fix) = kind.fix() {
        let _ = write!(out, "\n## Fix\n\n{fix}\n");
    }
    return out;
}

/// One-line summary, e.g. `2 errors, 1 warning`.
pub fn summarize(diagnostics: &[Diagnostic]) -> String {
    let errors = diagnostics.iter().filter(|d| return d.severity == Severity::Error).count();
    let warnings = diagnostics.len().saturating_sub(errors);
    return format!("{errors} {}, {warnings} {}", plural(errors, "error"), plural(warnings, "warning"));
}

/// `error` / `errors` by count.
fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        return word.to_string();
    }
    return format!("{word}s");
}

// ── Runtime errors ────────────────────────────────────────────────────

/// Render an error as markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    print_markdown(&render_error(e));
}

/// Render a runtime error as a structured markdown block.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::ConfigInvalid { path, problems } => {
            let mut out = format!("# Error: Invalid Config\n\n`{}` was rejected:\n\n", path.display());
            for problem in problems {
                let _ = writeln!(out, "- {problem}");
            }
            out
        },
        Error::FileNotFound { path } => format!("\
# Error: File Not Found

`{}` does not exist.
", path.display()),
        Error::FileTooLarge { file, size_bytes, max_bytes } => format!("\
# Error: File Too Large

`{}` is {size_bytes} bytes (max {max_bytes}).
", file.display()),
        Error::OutDirRequired { input } => format!("\
# Error: Output Directory Required

`{}` is a directory.

## Fix

    dfnref render {} --out <dir>
", input.display(), input.display()),
        Error::TomlDe(inner) => format!("\
# Error: Invalid TOML

{inner}

## Fix

Check `.dfnref.toml` against `dfnref info`.
"),
        Error::UnsupportedFile { path } => format!("\
# Error: Unsupported File

`{}` is not an `.html` or `.htm` document.
", path.display()),
        _ => format!("\
# Error

{e}
"),
    };
}

/// Print markdown to stderr, bolding heading lines.
fn print_markdown(md: &str) {
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: u32) -> Option<SourceLocation> {
        return Some(SourceLocation { column: 1, line });
    }

    #[test]
    fn severity_follows_kind() {
        let warning = Diagnostic::new(DiagnosticKind::MissingScopeOwner, at(1), "x");
        let error = Diagnostic::new(DiagnosticKind::DuplicateDefinition, at(2), "y");
        assert_eq!(warning.severity, Severity::Warning);
        assert!(!has_errors(&[warning.clone()]));
        assert!(has_errors(&[warning, error]));
    }

    #[test]
    fn rendered_block_names_both_locations() {
        let d = Diagnostic::new(DiagnosticKind::DuplicateDefinition, at(9), "`text` is defined twice")
            .with_related(SourceLocation { column: 3, line: 4 });
        let md = render_diagnostic(Path::new("index.html"), &d);
        assert!(md.starts_with("# Error: Duplicate Definition (E_DFN_DUP)"));
        assert!(md.contains("`index.html:9:1`"));
        assert!(md.contains("- index.html:4:3"));
        assert!(md.contains("## Fix"));
    }

    #[test]
    fn summary_pluralizes() {
        let d = Diagnostic::new(DiagnosticKind::UnresolvedReference, None, "x");
        assert_eq!(summarize(&[d]), "1 error, 0 warnings");
    }
}

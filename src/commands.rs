//! Core CLI commands for dfnref: render, check, list, info.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::Serialize;
use walkdir::WalkDir;

use crate::config::Config;
use crate::diagnostics::{self, Diagnostic};
use crate::error;
use crate::grammar;
use crate::pipeline::{self, Transform};

/// How diagnostics and summaries are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Markdown blocks on stderr.
    Human,
    /// One JSON array of file reports.
    Json,
}

/// What one document produced, as reported to the user.
#[derive(Debug, Serialize)]
struct FileReport {
    /// Number of definition records.
    definitions: usize,
    /// Every diagnostic of the document, pass order.
    diagnostics: Vec<Diagnostic>,
    /// Document path as given.
    file: PathBuf,
    /// Number of reference markers.
    references: usize,
    /// References that found exactly one definition.
    resolved: usize,
}

impl FileReport {
    /// Summarize a transform, taking its diagnostics.
    fn new(file: &Path, transform: &mut Transform) -> Self {
        return Self {
            definitions: transform.index.records().len(),
            diagnostics: std::mem::take(&mut transform.diagnostics),
            file: file.to_path_buf(),
            references: transform.outcomes.len(),
            resolved: transform.resolved_count(),
        };
    }
}

/// Report every diagnostic of a file set without writing anything.
///
/// Exits 1 when any document has an error diagnostic.
///
/// # Errors
///
/// Returns errors from config loading, file reading, or parsing.
pub fn check(input: &Path, format: Format) -> Result<ExitCode, error::Error> {
    let root = PathBuf::from(".");
    let config = Config::load(&root)?;

    let mut reports = Vec::new();
    for path in documents(&root, input, &config, None)? {
        let mut transform = pipeline::transform_file(&path, &config)?;
        reports.push(FileReport::new(&path, &mut transform));
    }

    return report(&reports, format, true);
}

/// Collect the documents `input` names: the file itself, or every HTML file
/// under a directory that the include/exclude filters let through. The
/// `skip` directory (a render's output) is never descended into.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if `input` does not exist.
fn documents(root: &Path, input: &Path, config: &Config, skip: Option<&Path>) -> Result<Vec<PathBuf>, error::Error> {
    if !input.exists() {
        return Err(error::Error::FileNotFound {
            path: input.to_path_buf(),
        });
    }
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let skip = skip.and_then(|dir| return std::fs::canonicalize(dir).ok());
    let outside_skip = |entry: &walkdir::DirEntry| {
        return skip.as_ref().is_none_or(|dir| {
            return std::fs::canonicalize(entry.path()).map_or(true, |path| return !path.starts_with(dir));
        });
    };

    let mut found = Vec::new();
    for entry in WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(outside_skip)
        .filter_map(Result::ok)
        .filter(|e| return e.file_type().is_file() && grammar::is_html_path(e.path()))
    {
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if config.should_render(&relative.to_string_lossy()) {
            found.push(path.to_path_buf());
        }
    }
    return Ok(found);
}

/// Output a comprehensive reference document for dfnref.
pub fn info(json: bool) {
    return crate::info::run(json);
}

/// Print the definition table of one document.
///
/// # Errors
///
/// Returns errors from config loading, file reading, parsing, or JSON output.
pub fn list(input: &Path, json: bool) -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    let config = Config::load(&root)?;
    let transform = pipeline::transform_file(input, &config)?;
    let records = transform.index.records();

    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else {
        for record in records {
            let mut line = format!("{:<12} {:<32} #{}", record.kind.as_str(), record.qualified_name(), record.id);
            if record.aliases.len() > 1 {
                let _ = write!(line, "  ({})", record.aliases.join(" | "));
            }
            println!("{line}");
        }
    }

    eprintln!(
        "list: {} definitions in {} ({})",
        records.len(),
        input.display(),
        diagnostics::summarize(&transform.diagnostics)
    );
    return Ok(());
}

/// Transform documents and write the results.
///
/// A file renders to `out`, or to stdout without one. A directory renders
/// every document into the same relative path under `out`, which is then
/// required. Exits 1 when any document has an error diagnostic; the output
/// is still written so the problems can be inspected in place.
///
/// # Errors
///
/// Returns `Error::OutDirRequired` for a directory without `out`, and errors
/// from config loading, parsing, or file I/O.
pub fn render(input: &Path, out: Option<&Path>, format: Format) -> Result<ExitCode, error::Error> {
    let root = PathBuf::from(".");
    let config = Config::load(&root)?;

    if !input.is_dir() {
        let mut transform = pipeline::transform_file(input, &config)?;
        let to_stdout = out.is_none();
        match out {
            Some(target) => write_output(target, &transform.output)?,
            None => print!("{}", transform.output),
        }
        let reports = [FileReport::new(input, &mut transform)];
        // Keep stdout for the document when it is written there.
        return report(&reports, format, !to_stdout);
    }

    let Some(out_dir) = out else {
        return Err(error::Error::OutDirRequired {
            input: input.to_path_buf(),
        });
    };

    let mut reports = Vec::new();
    for path in documents(&root, input, &config, Some(out_dir))? {
        let mut transform = pipeline::transform_file(&path, &config)?;
        let relative = path.strip_prefix(input).unwrap_or(&path);
        write_output(&out_dir.join(relative), &transform.output)?;
        reports.push(FileReport::new(&path, &mut transform));
    }
    eprintln!("render: {} documents", reports.len());

    return report(&reports, format, true);
}

/// Print reports and pick the exit code.
/// JSON goes to stdout when `json_to_stdout`, else to stderr.
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails.
fn report(reports: &[FileReport], format: Format, json_to_stdout: bool) -> Result<ExitCode, error::Error> {
    match format {
        Format::Human => {
            for r in reports {
                diagnostics::print_diagnostics(&r.file, &r.diagnostics);
                eprintln!(
                    "{}: {} definitions, {}/{} references resolved, {}",
                    r.file.display(),
                    r.definitions,
                    r.resolved,
                    r.references,
                    diagnostics::summarize(&r.diagnostics)
                );
            }
        },
        Format::Json => {
            let json = serde_json::to_string_pretty(reports)?;
            if json_to_stdout {
                println!("{json}");
            } else {
                eprintln!("{json}");
            }
        },
    }

    if reports.iter().any(|r| return diagnostics::has_errors(&r.diagnostics)) {
        return Ok(ExitCode::from(1));
    }
    return Ok(ExitCode::SUCCESS);
}

/// Write a rendered document, creating parent directories.
///
/// # Errors
///
/// Returns `Error::Io` if a directory or the file cannot be written.
pub fn write_output(target: &Path, output: &str) -> Result<(), error::Error> {
    if let Some(parent) = target.parent().filter(|p| return !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(target, output)?;
    eprintln!("render: wrote {}", target.display());
    return Ok(());
}

//! File watcher: renders on startup, then re-renders on source changes.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::commands::{self, Format};
use crate::diagnostics;
use crate::error;

/// Debounce delay between filesystem events and re-render.
const DEBOUNCE_MS: u64 = 100;

/// Create a filesystem watcher that sends events on the given channel.
/// Events touching only paths under `ignore` (the render output) are dropped.
///
/// # Errors
///
/// Returns `Error::WatchFailed` if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<()>,
    ignore: PathBuf,
) -> Result<notify::RecommendedWatcher, error::Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
            )
            && !event.paths.iter().all(|p| return p.starts_with(&ignore))
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| {
        return error::Error::WatchFailed {
            reason: format!("watcher setup failed: {e}"),
        };
    });
}

/// Entry point for the watch command.
///
/// Renders once, then watches the input (and the config next to it) and
/// re-renders after each burst of changes. Each render is a fresh session.
///
/// # Errors
///
/// Returns `Error::WatchFailed` if the watcher cannot be set up.
pub fn run(input: &Path, out: &Path, format: Format) -> Result<ExitCode, error::Error> {
    eprintln!("watch: initial render");
    let mut last_code = run_render(input, out, format);

    let ignore = std::fs::canonicalize(out).unwrap_or_else(|_| return out.to_path_buf());
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx, ignore)?;

    let (target, mode) = if input.is_dir() {
        (input.to_path_buf(), RecursiveMode::Recursive)
    } else {
        (watch_dir(input), RecursiveMode::NonRecursive)
    };
    watcher.watch(&target, mode).map_err(|e| {
        return error::Error::WatchFailed {
            reason: format!("cannot watch {}: {e}", target.display()),
        };
    })?;
    if target != Path::new(".") {
        let _ = watcher.watch(Path::new("."), RecursiveMode::NonRecursive);
    }

    eprintln!("watch: monitoring {}, press Ctrl+C to stop", target.display());

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        eprintln!("watch: change detected, re-rendering...");
        last_code = run_render(input, out, format);
    }

    return Ok(last_code);
}

/// Render once and print any runtime error. Returns the exit code from render.
fn run_render(input: &Path, out: &Path, format: Format) -> ExitCode {
    return match commands::render(input, Some(out), format) {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(2_u8)
        },
    };
}

/// Directory holding a watched file; `.` for a bare file name.
fn watch_dir(file: &Path) -> PathBuf {
    return match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
}

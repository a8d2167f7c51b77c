/// Crate-level error types for runtime failures.
///
/// Problems found *inside* a document (duplicate definitions, broken links)
/// are diagnostics, not errors; see `diagnostics`. These variants stop a run.
use std::path::PathBuf;

/// All errors in dfnref carry enough context to produce a useful report
/// without a debugger. Each variant names the file or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration parsed but failed validation.
    #[error("invalid config {}: {}", path.display(), problems.join("; "))]
    ConfigInvalid {
        /// Config file that was rejected.
        path: PathBuf,
        /// Every validation problem found, in field order.
        problems: Vec<String>,
    },

    /// An input document does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Input document exceeds the size limit.
    #[error("file too large ({size_bytes} bytes, max {max_bytes}): {}", file.display())]
    FileTooLarge {
        /// File that exceeded the size limit.
        file: PathBuf,
        /// Maximum allowed file size in bytes.
        max_bytes: u64,
        /// Actual file size in bytes.
        size_bytes: u64,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// A directory was given where an output directory is also required.
    #[error("rendering directory {} requires --out", input.display())]
    OutDirRequired {
        /// Input directory that was passed.
        input: PathBuf,
    },

    /// Tree-sitter failed to parse a document.
    #[error("parse failed: {}: {reason}", file.display())]
    ParseFailed {
        /// File that failed to parse.
        file: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// JSON serialization of a report failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped serde_json error.
        #[from]
        serde_json::Error,
    ),

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// Input file is not an HTML document.
    #[error("not an html document: {}", path.display())]
    UnsupportedFile {
        /// Offending input path.
        path: PathBuf,
    },

    /// The filesystem watcher could not be set up.
    #[error("watch failed: {reason}")]
    WatchFailed {
        /// Description of the watcher failure.
        reason: String,
    },
}

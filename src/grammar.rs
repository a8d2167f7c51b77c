/// Tree-sitter grammar resolution by file extension.
use std::path::Path;

use tree_sitter::Language;

use crate::error::Error;

/// Whether a path looks like an HTML document.
pub fn is_html_path(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");
    return matches!(ext.to_ascii_lowercase().as_str(), "html" | "htm");
}

/// Map a document path to its tree-sitter language.
///
/// # Errors
///
/// Returns `Error::UnsupportedFile` for anything but `.html` / `.htm`.
pub fn language_for_path(path: &Path) -> Result<Language, Error> {
    if !is_html_path(path) {
        return Err(Error::UnsupportedFile {
            path: path.to_path_buf(),
        });
    }
    return Ok(tree_sitter_html::LANGUAGE.into());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_html_extensions() {
        assert!(language_for_path(Path::new("spec/index.html")).is_ok());
        assert!(language_for_path(Path::new("INDEX.HTM")).is_ok());
        assert!(matches!(
            language_for_path(Path::new("notes.md")),
            Err(Error::UnsupportedFile { .. })
        ));
    }
}

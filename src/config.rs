use std::path::Path;

use serde::Deserialize;

use crate::error::Error;
use crate::header;
use crate::resolver::ResolveOptions;

/// Configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".dfnref.toml";

/// Project configuration loaded from `.dfnref.toml`.
/// Include/exclude patterns are path prefixes applied when rendering a directory.
#[derive(Debug, Default)]
pub struct Config {
    /// Path prefixes skipped during directory renders.
    exclude: Vec<String>,
    /// Keys allowed to stay unresolved.
    pub external: ExternalConfig,
    /// Head block settings; no head block when absent.
    pub header: Option<HeaderConfig>,
    /// Path prefixes scanned during directory renders.
    include: Vec<String>,
    /// Resolver fallback switches.
    pub resolve: ResolveConfig,
    /// Header problems that do not reject the file.
    pub warnings: Vec<String>,
}

/// Raw TOML structure for `.dfnref.toml`.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DfnrefToml {
    /// `exclude = [...]`
    #[serde(default)]
    exclude: Vec<String>,
    /// `[external]`
    #[serde(default)]
    external: ExternalConfig,
    /// `[header]`
    header: Option<HeaderConfig>,
    /// `include = [...]`
    #[serde(default)]
    include: Vec<String>,
    /// `[resolve]`
    #[serde(default)]
    resolve: ResolveConfig,
}

/// `[resolve]`: fallback tiers for plain terms.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolveConfig {
    /// Case-insensitive match as a last resort.
    #[serde(default = "enabled")]
    pub case_insensitive: bool,
    /// Singular forms (`widgets` → `widget`) as a last resort.
    #[serde(default = "enabled")]
    pub singularize: bool,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        return Self {
            case_insensitive: true,
            singularize: true,
        };
    }
}

/// `[external]`: references that are expected to point outside the document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalConfig {
    /// Reference keys that may stay unresolved.
    #[serde(default)]
    pub terms: Vec<String>,
}

/// `[header]`: inputs of the generated head block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderConfig {
    /// Other renditions of the document.
    #[serde(default)]
    pub alternate_formats: Vec<AlternateFormat>,
    /// Contributing authors.
    #[serde(default)]
    pub authors: Vec<Person>,
    /// End of the Candidate Recommendation review, `YYYY-MM-DD`.
    pub cr_end: Option<String>,
    /// Editor's Draft location.
    pub ed_draft_uri: Option<String>,
    /// Document editors; at least one.
    #[serde(default)]
    pub editors: Vec<Person>,
    /// Errata document.
    pub errata: Option<String>,
    /// Implementation report; required from CR on.
    pub implementation_report_uri: Option<String>,
    /// End of the last call review, `YYYY-MM-DD`.
    pub lc_end: Option<String>,
    /// Not meant for the Recommendation track.
    #[serde(default)]
    pub no_rec_track: bool,
    /// End of the Proposed Recommendation review, `YYYY-MM-DD`.
    pub pr_end: Option<String>,
    /// Status of the previous publication.
    pub previous_maturity: Option<String>,
    /// Date of the previous publication, `YYYY-MM-DD`.
    pub previous_publish_date: Option<String>,
    /// Publication date, `YYYY-MM-DD`; defaults to the input's modification date.
    pub publish_date: Option<String>,
    /// Name used in published URLs.
    pub short_name: Option<String>,
    /// Maturity or document type code, e.g. `ED`, `WD`, `REC`.
    pub spec_status: String,
    /// Second heading under the title.
    pub subtitle: Option<String>,
    /// Test suite location.
    pub test_suite_uri: Option<String>,
}

/// An editor or author.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Person {
    /// Affiliation.
    pub company: Option<String>,
    /// Affiliation home page.
    pub company_url: Option<String>,
    /// Email address.
    pub mailto: Option<String>,
    /// Display name; required.
    #[serde(default)]
    pub name: String,
    /// Short note, e.g. `until 2025`.
    pub note: Option<String>,
    /// Personal home page.
    pub url: Option<String>,
}

/// Another rendition of the document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlternateFormat {
    /// Link text; required.
    #[serde(default)]
    pub label: String,
    /// Language of the rendition.
    pub lang: Option<String>,
    /// MIME type of the rendition.
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
    /// Location; required.
    #[serde(default)]
    pub uri: String,
}

impl Config {
    /// Load config from `.dfnref.toml` in the given root directory.
    /// Returns a default that renders everything if the file doesn't exist.
    /// Returns an error if the file exists but is malformed or invalid; never
    /// silently falls back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed or has unknown fields,
    /// or `Error::ConfigInvalid` if the `[header]` section fails validation.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };
        return Self::parse(&path, &content);
    }

    /// Parse and validate config text. `path` is only used in errors.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` or `Error::ConfigInvalid`.
    pub fn parse(path: &Path, content: &str) -> Result<Self, Error> {
        let raw: DfnrefToml = toml::from_str(content)?;

        let mut warnings = Vec::new();
        if let Some(header) = &raw.header {
            let validation = header::validate(header);
            if !validation.errors.is_empty() {
                return Err(Error::ConfigInvalid {
                    path: path.to_path_buf(),
                    problems: validation.errors,
                });
            }
            warnings = validation.warnings;
        }

        return Ok(Self {
            exclude: raw.exclude,
            external: raw.external,
            header: raw.header,
            include: raw.include,
            resolve: raw.resolve,
            warnings,
        });
    }

    /// Resolver switches for one session.
    pub fn resolve_options(&self) -> ResolveOptions {
        return ResolveOptions {
            case_insensitive: self.resolve.case_insensitive,
            external_terms: self.external.terms.clone(),
            singularize: self.resolve.singularize,
        };
    }

    /// Check whether a document path should be rendered.
    ///
    /// A path is included if no include patterns are set (render everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_render(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }
}

/// Serde default for switches that are on unless turned off.
const fn enabled() -> bool {
    return true;
}

//! Document head block: title, maturity status, version links and people.
//!
//! Rendering assumes a configuration that passed `validate`; the checks run
//! once when `.dfnref.toml` is loaded.
use std::fmt::{self, Write as _};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{HeaderConfig, Person};
use crate::render::{escape_attr, escape_text};

/// Status code → status text.
const STATUS_TEXT: [(&str, &str); 28] = [
    ("BG-DRAFT", "Draft Business Group Specification"),
    ("BG-FINAL", "Final Business Group Specification"),
    ("CG-DRAFT", "Draft Community Group Specification"),
    ("CG-FINAL", "Final Community Group Specification"),
    ("CG-NOTE", "Co-ordination Group Note"),
    ("CR", "Candidate Recommendation"),
    ("ED", "Editor's Draft"),
    ("FPLC", "First Public and Last Call Working Draft"),
    ("FPWD", "First Public Working Draft"),
    ("FPWD-NOTE", "Working Group Note"),
    ("IG-NOTE", "Interest Group Note"),
    ("LC", "Last Call Working Draft"),
    ("LC-NOTE", "Working Draft"),
    ("Member-SUBM", "Member Submission"),
    ("MO", "Member-Only Document"),
    ("NOTE", "Note"),
    ("PER", "Proposed Edited Recommendation"),
    ("PR", "Proposed Recommendation"),
    ("REC", "Recommendation"),
    ("RSCND", "Rescinded Recommendation"),
    ("Team-SUBM", "Team Submission"),
    ("WD", "Working Draft"),
    ("WD-NOTE", "Working Draft"),
    ("WG-NOTE", "Working Group Note"),
    ("base", "Document"),
    ("draft-finding", "Draft TAG Finding"),
    ("finding", "TAG Finding"),
    ("unofficial", "Unofficial Draft"),
];

/// Statuses on the Recommendation track.
const REC_TRACK: [&str; 8] = ["FPWD", "WD", "FPLC", "LC", "CR", "PR", "PER", "REC"];

/// Statuses outside any track; no dated version URLs.
const NO_TRACK: [&str; 9] = [
    "MO",
    "unofficial",
    "base",
    "finding",
    "draft-finding",
    "CG-DRAFT",
    "CG-FINAL",
    "BG-DRAFT",
    "BG-FINAL",
];

/// Month names for human dates.
const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September", "October", "November",
    "December",
];

/// A calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    /// 1–31.
    pub day: u32,
    /// 1–12.
    pub month: u32,
    /// Four-digit year.
    pub year: i64,
}

impl Date {
    /// Parse `YYYY-MM-DD`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().splitn(3, '-');
        let year = parts.next().filter(|y| return y.len() == 4)?.parse::<i64>().ok()?;
        let month = parts.next().filter(|m| return m.len() == 2)?.parse::<u32>().ok()?;
        let day = parts.next().filter(|d| return d.len() == 2)?.parse::<u32>().ok()?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }
        return Some(Self { day, month, year });
    }

    /// UTC calendar date of a timestamp.
    pub fn from_system_time(time: SystemTime) -> Self {
        let secs = time.duration_since(UNIX_EPOCH).map_or(0, |d| return d.as_secs());
        let days = i64::try_from(secs / 86_400).unwrap_or(0);
        return civil_from_days(days);
    }

    /// `20261019`.
    pub fn compact(self) -> String {
        return format!("{:04}{:02}{:02}", self.year, self.month, self.day);
    }

    /// `19 October 2026`.
    pub fn human(self) -> String {
        let index = usize::try_from(self.month.saturating_sub(1)).unwrap_or(0);
        let month = MONTHS.get(index).copied().unwrap_or("January");
        return format!("{} {month} {}", self.day, self.year);
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day);
    }
}

/// Days since 1970-01-01 to a proleptic Gregorian date.
#[allow(clippy::arithmetic_side_effects, reason = "bounded calendar arithmetic on a day count")]
#[allow(clippy::integer_division, reason = "era and year-of-era computation is integer division")]
fn civil_from_days(days: i64) -> Date {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    return Date {
        day: u32::try_from(day).unwrap_or(1),
        month: u32::try_from(month).unwrap_or(1),
        year,
    };
}

/// Status text for a status code.
pub fn status_text(status: &str) -> Option<&'static str> {
    return STATUS_TEXT.iter().find(|(code, _)| return *code == status).map(|(_, text)| return *text);
}

/// Community and Business Group statuses.
fn is_cgbg(status: &str) -> bool {
    return matches!(status, "CG-DRAFT" | "CG-FINAL" | "BG-DRAFT" | "BG-FINAL");
}

/// `finding` or `draft-finding`.
fn is_tag_finding(status: &str) -> bool {
    return matches!(status, "finding" | "draft-finding");
}

/// Maturity segment of a dated URL.
fn maturity(status: &str) -> &str {
    return match status {
        "FPWD" | "LC" | "FPLC" | "WD-NOTE" => "WD",
        "FPWD-NOTE" | "IG-NOTE" | "WG-NOTE" => "NOTE",
        "LC-NOTE" => "LC",
        other => other,
    };
}

/// Problems found in a header configuration.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Validation {
    /// Reject the configuration.
    pub errors: Vec<String>,
    /// Reported on every run.
    pub warnings: Vec<String>,
}

/// Check a header configuration.
pub fn validate(header: &HeaderConfig) -> Validation {
    let mut v = Validation::default();
    let status = header.spec_status.as_str();
    if status_text(status).is_none() {
        v.errors.push(format!("[header] unknown spec_status `{status}`"));
    }
    if !is_cgbg(status) && header.short_name.as_deref().is_none_or(str::is_empty) {
        v.errors.push("[header] missing required `short_name`".to_string());
    }
    if header.editors.is_empty() {
        v.errors.push("[header] at least one editor is required".to_string());
    }
    if header.editors.iter().chain(&header.authors).any(|p| return p.name.trim().is_empty()) {
        v.errors.push("[header] every editor and author needs a `name`".to_string());
    }
    if header.previous_publish_date.is_some() && header.previous_maturity.is_none() && !is_tag_finding(status) {
        v.errors.push("[header] `previous_publish_date` is set, but not `previous_maturity`".to_string());
    }
    if matches!(status, "LC" | "FPLC") && header.lc_end.is_none() {
        v.errors.push(format!("[header] status is {status} but no `lc_end` is set"));
    }
    if status == "PR" && header.lc_end.is_none() {
        v.errors.push("[header] status is PR but no `lc_end` is set (end of the previous last call)".to_string());
    }
    if status == "CR" && header.cr_end.is_none() {
        v.errors.push("[header] status is CR but no `cr_end` is set".to_string());
    }
    if status == "PR" && header.pr_end.is_none() {
        v.errors.push("[header] status is PR but no `pr_end` is set".to_string());
    }
    let rec_track = !header.no_rec_track && REC_TRACK.contains(&status);
    let is_rec = rec_track && status == "REC";
    if (matches!(status, "CR" | "PR") || is_rec) && header.implementation_report_uri.is_none() {
        v.errors.push("[header] CR, PR and REC documents need an `implementation_report_uri`".to_string());
    }
    if header.alternate_formats.iter().any(|f| return f.uri.trim().is_empty() || f.label.trim().is_empty()) {
        v.errors.push("[header] every alternate format needs a `uri` and a `label`".to_string());
    }
    let dates = [
        ("publish_date", &header.publish_date),
        ("previous_publish_date", &header.previous_publish_date),
        ("cr_end", &header.cr_end),
        ("lc_end", &header.lc_end),
        ("pr_end", &header.pr_end),
    ];
    for (field, value) in dates {
        if let Some(value) = value
            && Date::parse(value).is_none()
        {
            v.errors.push(format!("[header] `{field}` must be YYYY-MM-DD, got `{value}`"));
        }
    }

    if status == "ED" && header.ed_draft_uri.is_none() {
        v.warnings.push("Editor's Drafts should set `ed_draft_uri`".to_string());
    }
    let first_on_track = matches!(status, "FPWD" | "FPLC" | "ED");
    let no_track = NO_TRACK.contains(&status);
    if !first_on_track && !no_track && !header.no_rec_track && header.previous_publish_date.is_none() {
        v.warnings.push(format!("document is on track ({status}) but has no previous version"));
    }
    return v;
}

/// Version URLs derived from the status.
#[derive(Debug, Default, PartialEq, Eq)]
struct Versions {
    /// Undated latest version.
    latest: Option<String>,
    /// Dated previous version.
    previous: Option<String>,
    /// Dated version of this publication.
    this: Option<String>,
}

/// Build the W3C URL scheme for this configuration.
fn versions(header: &HeaderConfig, publish: Date) -> Versions {
    let status = header.spec_status.as_str();
    let short = header.short_name.as_deref().unwrap_or("");
    let previous_date = header.previous_publish_date.as_deref().and_then(Date::parse);

    if is_tag_finding(status) {
        let latest = format!("https://www.w3.org/2001/tag/doc/{short}");
        return Versions {
            previous: previous_date.map(|d| return format!("{latest}-{d}")),
            this: Some(format!("{latest}-{publish}")),
            latest: Some(latest),
        };
    }
    if is_cgbg(status) {
        return Versions::default();
    }

    let space = match status {
        "Member-SUBM" => "Submission",
        "Team-SUBM" => "TeamSubmission",
        _ => "TR",
    };
    let this = if status == "ED" {
        header.ed_draft_uri.clone()
    } else {
        Some(format!(
            "https://www.w3.org/{space}/{}/{}-{short}-{}/",
            publish.year,
            maturity(status),
            publish.compact()
        ))
    };
    let previous = previous_date.map(|d| {
        let previous_maturity = maturity(header.previous_maturity.as_deref().unwrap_or(""));
        return format!("https://www.w3.org/TR/{}/{previous_maturity}-{short}-{}/", d.year, d.compact());
    });
    return Versions {
        latest: Some(format!("https://www.w3.org/{space}/{short}/")),
        previous,
        this,
    };
}

/// Render the head block.
pub fn render(header: &HeaderConfig, title: Option<&str>, publish: Date) -> String {
    let status = header.spec_status.as_str();
    let no_track = NO_TRACK.contains(&status);
    let versions = versions(header, publish);
    let title = title.filter(|t| return !t.is_empty()).unwrap_or("No Title");

    let mut out = String::from("\n<div class=\"head\">\n");
    let _ = writeln!(out, "  <h1 class=\"title p-name\" id=\"title\">{}</h1>", escape_text(title));
    if let Some(subtitle) = header.subtitle.as_deref().filter(|s| return !s.is_empty()) {
        let _ = writeln!(out, "  <h2 id=\"subtitle\">{}</h2>", escape_text(subtitle));
    }
    let prefix = if status == "unofficial" { "" } else { "W3C " };
    let _ = writeln!(
        out,
        "  <h2>{prefix}{} <time class=\"dt-published\" datetime=\"{publish}\">{}</time></h2>",
        status_text(status).unwrap_or("Document"),
        publish.human()
    );

    out.push_str("  <dl>\n");
    if !no_track || is_tag_finding(status) {
        link_entry(&mut out, "This version", versions.this.as_deref());
        link_entry(&mut out, "Latest published version", versions.latest.as_deref());
    }
    link_entry(&mut out, "Latest editor's draft", header.ed_draft_uri.as_deref());
    let show_previous = if is_tag_finding(status) {
        header.previous_publish_date.is_some()
    } else {
        !matches!(status, "FPWD" | "FPLC" | "ED") && !no_track
    };
    if show_previous {
        link_entry(&mut out, "Previous version", versions.previous.as_deref());
    }
    people_entry(&mut out, "Editor", &header.editors);
    people_entry(&mut out, "Author", &header.authors);
    link_entry(&mut out, "Test suite", header.test_suite_uri.as_deref());
    link_entry(&mut out, "Implementation report", header.implementation_report_uri.as_deref());
    out.push_str("  </dl>\n");

    if let Some(errata) = &header.errata {
        let _ = writeln!(
            out,
            "  <p>Please check the <a href=\"{}\"><strong>errata</strong></a> for any errors or issues reported since publication.</p>",
            escape_attr(errata)
        );
    }
    if !header.alternate_formats.is_empty() {
        let links: Vec<String> = header
            .alternate_formats
            .iter()
            .map(|f| {
                let mut extra = String::new();
                if let Some(lang) = &f.lang {
                    let _ = write!(extra, " hreflang=\"{}\"", escape_attr(lang));
                }
                if let Some(kind) = &f.mime_type {
                    let _ = write!(extra, " type=\"{}\"", escape_attr(kind));
                }
                return format!("<a rel=\"alternate\" href=\"{}\"{extra}>{}</a>", escape_attr(&f.uri), escape_text(&f.label));
            })
            .collect();
        let noun = if links.len() > 1 { "these non-normative formats" } else { "this non-normative format" };
        let _ = writeln!(out, "  <p>This document is also available in {noun}: {}.</p>", join_and(&links));
    }
    out.push_str("</div>\n");
    return out;
}

/// `<dt>label:</dt><dd><a href>uri</a></dd>`, skipped when `uri` is absent.
fn link_entry(out: &mut String, label: &str, uri: Option<&str>) {
    let Some(uri) = uri.filter(|u| return !u.is_empty()) else {
        return;
    };
    let uri_attr = escape_attr(uri);
    let _ = writeln!(out, "    <dt>{label}:</dt>\n    <dd><a href=\"{uri_attr}\">{}</a></dd>", escape_text(uri));
}

/// `Editor:` / `Editors:` followed by one `<dd>` per person.
fn people_entry(out: &mut String, label: &str, people: &[Person]) {
    if people.is_empty() {
        return;
    }
    let plural = if people.len() > 1 { "s" } else { "" };
    let _ = writeln!(out, "    <dt>{label}{plural}:</dt>");
    for person in people {
        let _ = writeln!(out, "    <dd class=\"p-author h-card vcard\">{}</dd>", person_html(person));
    }
}

/// Name (linked when `url` is set), company, email and note.
fn person_html(person: &Person) -> String {
    let name = escape_text(&person.name);
    let mut html = match &person.url {
        Some(url) => format!("<a class=\"u-url url p-name fn\" href=\"{}\">{name}</a>", escape_attr(url)),
        None => format!("<span class=\"p-name fn\">{name}</span>"),
    };
    if let Some(company) = &person.company {
        let company = escape_text(company);
        let _ = match &person.company_url {
            Some(url) => write!(html, ", <a class=\"p-org org h-org h-card\" href=\"{}\">{company}</a>", escape_attr(url)),
            None => write!(html, ", {company}"),
        };
    }
    if let Some(mail) = &person.mailto {
        let mail_attr = escape_attr(mail);
        let _ = write!(
            html,
            ", <span class=\"ed_mailto\"><a class=\"u-email email\" href=\"mailto:{mail_attr}\">{}</a></span>",
            escape_text(mail)
        );
    }
    if let Some(note) = &person.note {
        let _ = write!(html, " ({})", escape_text(note));
    }
    return html;
}

/// `a`, `a and b`, `a, b and c`.
fn join_and(items: &[String]) -> String {
    return match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlternateFormat;

    fn person(name: &str) -> Person {
        return Person {
            name: name.to_string(),
            ..Person::default()
        };
    }

    fn header(status: &str) -> HeaderConfig {
        return HeaderConfig {
            editors: vec![person("A. Editor")],
            short_name: Some("foo".to_string()),
            spec_status: status.to_string(),
            ..HeaderConfig::default()
        };
    }

    fn date() -> Date {
        return Date::parse("2026-10-19").unwrap();
    }

    #[test]
    fn dates() {
        assert_eq!(date().compact(), "20261019");
        assert_eq!(date().human(), "19 October 2026");
        assert_eq!(date().to_string(), "2026-10-19");
        assert!(Date::parse("2026-1-19").is_none());
        assert!(Date::parse("2026-13-01").is_none());
        assert_eq!(civil_from_days(0), Date { day: 1, month: 1, year: 1970 });
        assert_eq!(civil_from_days(20_745), Date { day: 19, month: 10, year: 2026 });
    }

    #[test]
    fn working_draft_urls() {
        let mut h = header("WD");
        h.previous_publish_date = Some("2025-03-01".to_string());
        h.previous_maturity = Some("FPWD".to_string());
        let html = render(&h, Some("My Spec"), date());
        assert!(html.contains("<h2>W3C Working Draft <time class=\"dt-published\" datetime=\"2026-10-19\">19 October 2026</time></h2>"));
        assert!(html.contains("https://www.w3.org/TR/2026/WD-foo-20261019/"));
        assert!(html.contains("https://www.w3.org/TR/foo/"));
        assert!(html.contains("https://www.w3.org/TR/2025/WD-foo-20250301/"));
        assert!(html.contains("<dt>Editor:</dt>"));
        assert!(validate(&h).errors.is_empty());
    }

    #[test]
    fn editors_draft_links_to_itself() {
        let mut h = header("ED");
        h.ed_draft_uri = Some("https://example.org/foo/".to_string());
        let html = render(&h, None, date());
        assert!(html.contains("<h1 class=\"title p-name\" id=\"title\">No Title</h1>"));
        assert!(html.contains("<dt>This version:</dt>\n    <dd><a href=\"https://example.org/foo/\">"));
        assert!(!html.contains("Previous version"));
        assert_eq!(validate(&h), Validation::default());
    }

    #[test]
    fn unofficial_has_no_prefix_and_no_versions() {
        let html = render(&header("unofficial"), Some("T"), date());
        assert!(html.contains("<h2>Unofficial Draft <time"));
        assert!(!html.contains("This version"));
    }

    #[test]
    fn submissions_and_findings() {
        let html = render(&header("Member-SUBM"), None, date());
        assert!(html.contains("https://www.w3.org/Submission/2026/Member-SUBM-foo-20261019/"));
        let html = render(&header("finding"), None, date());
        assert!(html.contains("https://www.w3.org/2001/tag/doc/foo-2026-10-19"));
    }

    #[test]
    fn validation_errors() {
        let mut h = header("CR");
        h.editors = vec![person(" ")];
        h.short_name = None;
        h.publish_date = Some("yesterday".to_string());
        h.alternate_formats = vec![AlternateFormat {
            uri: "x.ps".to_string(),
            ..AlternateFormat::default()
        }];
        let v = validate(&h);
        assert_eq!(v.errors.len(), 6, "{:?}", v.errors);
        assert!(validate(&header("XYZ")).errors.iter().any(|e| e.contains("unknown spec_status")));
    }

    #[test]
    fn validation_warnings() {
        assert_eq!(validate(&header("ED")).warnings.len(), 1);
        assert_eq!(validate(&header("WD")).warnings.len(), 1);
        assert!(validate(&header("FPWD")).warnings.is_empty());
        let mut cg = header("CG-DRAFT");
        cg.short_name = None;
        assert_eq!(validate(&cg), Validation::default());
    }

    #[test]
    fn people_and_alternates() {
        let mut h = header("FPWD");
        h.editors = vec![
            Person {
                company: Some("Example".to_string()),
                company_url: Some("https://example.org".to_string()),
                mailto: Some("a@example.org".to_string()),
                name: "A".to_string(),
                note: Some("former".to_string()),
                url: Some("https://a.example".to_string()),
            },
            person("B"),
        ];
        h.alternate_formats = vec![
            AlternateFormat {
                label: "PDF".to_string(),
                uri: "foo.pdf".to_string(),
                ..AlternateFormat::default()
            },
            AlternateFormat {
                label: "EPUB".to_string(),
                uri: "foo.epub".to_string(),
                ..AlternateFormat::default()
            },
        ];
        let html = render(&h, None, date());
        assert!(html.contains("<dt>Editors:</dt>"));
        assert!(html.contains("<a class=\"u-url url p-name fn\" href=\"https://a.example\">A</a>, <a class=\"p-org org h-org h-card\" href=\"https://example.org\">Example</a>"));
        assert!(html.contains("(former)"));
        assert!(html.contains("these non-normative formats: <a rel=\"alternate\" href=\"foo.pdf\">PDF</a> and <a rel=\"alternate\" href=\"foo.epub\">EPUB</a>."));
    }
}

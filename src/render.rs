//! Render adapter: turns collection and resolution results into byte edits
//! on the original source. Nothing upstream mutates the document.
use std::fmt::Write as _;
use std::ops::Range;

use crate::collector::Collection;
use crate::document::{Document, ReferenceMarker, ReferenceSite};
use crate::normalize;
use crate::table::ResolutionIndex;
use crate::types::{DefinitionKind, DefinitionRecord, Outcome, RenderStyle};

/// Replace `range` of the source with `text`. An empty range inserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Source bytes replaced.
    pub range: Range<usize>,
    /// Replacement text.
    pub text: String,
}

impl Edit {
    /// Insert `text` at `at`.
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        return Self {
            range: at..at,
            text: text.into(),
        };
    }

    /// Replace `range` with `text`.
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        return Self {
            range,
            text: text.into(),
        };
    }
}

/// Ids, rewritten `data-lt` and inferred IDL types on `<dfn>` markers.
pub fn definition_edits(document: &Document, collection: &Collection) -> Vec<Edit> {
    let mut edits = Vec::new();
    for (marker, result) in document.definitions.iter().zip(&collection.markers) {
        if let (Some(attr), Some(rewrite)) = (&marker.alias_attr, &result.alias_rewrite) {
            edits.push(Edit::replace(attr.range.clone(), format!("data-lt=\"{}\"", escape_attr(rewrite))));
        }
        let Some(record_id) = result.record else { continue };
        let record = collection.index.get(record_id);
        let mut added = String::new();
        if marker.explicit_id.is_none() {
            let _ = write!(added, " id=\"{}\"", escape_attr(&record.id));
        }
        if marker.kind_attr.is_none() && record.kind != DefinitionKind::Dfn {
            let _ = write!(added, " data-dfn-type=\"{}\"", record.kind);
        }
        if !added.is_empty() {
            edits.push(Edit::insert(marker.tag_end, added));
        }
    }
    return edits;
}

/// Links for every resolved reference; unresolved shorthand becomes plain text.
pub fn reference_edits(document: &Document, outcomes: &[Outcome], index: &ResolutionIndex) -> Vec<Edit> {
    let mut edits = Vec::new();
    for (marker, outcome) in document.references.iter().zip(outcomes) {
        let resolved = match outcome {
            Outcome::Resolved { matched, record } => Some((index.get(*record), matched.as_str())),
            Outcome::Ambiguous(_) | Outcome::Unresolved => None,
        };
        match (&marker.site, resolved) {
            (ReferenceSite::Anchor { plain_text, tag_end }, Some((record, matched))) => {
                edits.push(Edit::insert(*tag_end, format!(" href=\"#{}\"", escape_attr(&record.id))));
                if record.style == RenderStyle::Code
                    && let Some(range) = plain_text
                    && let Some(wrapped) = code_span(&document.source, range, matched)
                {
                    edits.push(Edit::insert(wrapped.start, "<code>"));
                    edits.push(Edit::insert(wrapped.end, "</code>"));
                }
            },
            (ReferenceSite::Anchor { .. }, None) => {},
            (ReferenceSite::Shorthand { range }, Some((record, matched))) => {
                edits.push(Edit::replace(range.clone(), shorthand_link(marker, record, matched)));
            },
            (ReferenceSite::Shorthand { range }, None) => {
                edits.push(Edit::replace(range.clone(), escape_text(&marker.text)));
            },
        }
    }
    return edits;
}

/// `<dfn>` around declared identifiers in IDL blocks, links around repeats.
pub fn idl_edits(document: &Document, collection: &Collection) -> Vec<Edit> {
    let mut edits = Vec::new();
    for site in &collection.idl_sites {
        let record = collection.index.get(site.target);
        let span = quoted_span(&document.source, &site.span, record.kind);
        let Some(raw) = document.source.get(span.clone()) else { continue };
        let text = if site.defines {
            let scope = record
                .scope
                .as_deref()
                .map(|s| return format!(" data-dfn-for=\"{}\"", escape_attr(s)))
                .unwrap_or_default();
            format!(
                "<dfn id=\"{}\" data-dfn-type=\"{}\"{scope}>{raw}</dfn>",
                escape_attr(&record.id),
                record.kind
            )
        } else {
            format!("<a href=\"#{}\">{raw}</a>", escape_attr(&record.id))
        };
        edits.push(Edit::replace(span, text));
    }
    return edits;
}

/// Enum values are wrapped together with their quotes so `""` stays clickable.
fn quoted_span(source: &str, span: &Range<usize>, kind: DefinitionKind) -> Range<usize> {
    if kind != DefinitionKind::EnumValue {
        return span.clone();
    }
    let start = span.start.saturating_sub(1);
    let end = span.end.saturating_add(1);
    let quoted = source.get(start..span.start) == Some("\"") && source.get(span.end..end) == Some("\"");
    if quoted {
        return start..end;
    }
    return span.clone();
}

/// `<a href="#id">display</a>` for a resolved shorthand.
fn shorthand_link(marker: &ReferenceMarker, record: &DefinitionRecord, matched: &str) -> String {
    let display = &marker.text;
    let inner = if record.style == RenderStyle::Code {
        match code_prefix_len(display, matched) {
            Some(len) => {
                let (code, rest) = display.split_at(len);
                format!("<code>{}</code>{}", escape_text(code), escape_text(rest))
            },
            None => escape_text(display),
        }
    } else {
        escape_text(display)
    };
    return format!("<a href=\"#{}\">{inner}</a>", escape_attr(&record.id));
}

/// Part of an anchor's trimmed content to wrap in `<code>`: all of it when
/// its text is the matched key, the leading match when it starts with it.
fn code_span(source: &str, range: &Range<usize>, matched: &str) -> Option<Range<usize>> {
    let raw = source.get(range.clone())?;
    let text = normalize::normalize(raw);
    if text.eq_ignore_ascii_case(matched) {
        return Some(range.clone());
    }
    let len = code_prefix_len(raw, matched)?;
    return Some(range.start..range.start.saturating_add(len));
}

/// Byte length of the leading `matched` in `text`, compared ASCII case-insensitively.
/// The match must end at a word boundary.
fn code_prefix_len(text: &str, matched: &str) -> Option<usize> {
    if matched.is_empty() {
        return None;
    }
    let prefix = text.get(..matched.len())?;
    if !prefix.eq_ignore_ascii_case(matched) {
        return None;
    }
    let rest = text.get(matched.len()..)?;
    if rest.starts_with(|c: char| return c.is_alphanumeric() || c == '_') {
        return None;
    }
    return Some(matched.len());
}

/// Apply edits to `source`. Edits are taken in position order; an edit that
/// overlaps one already taken is dropped. Insertions at the same offset keep
/// their given order.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| return (edit.range.start, edit.range.end));
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0_usize;
    for edit in edits {
        if edit.range.start < cursor || edit.range.end > source.len() {
            continue;
        }
        out.push_str(source.get(cursor..edit.range.start).unwrap_or(""));
        out.push_str(&edit.text);
        cursor = edit.range.end;
    }
    out.push_str(source.get(cursor..).unwrap_or(""));
    return out;
}

/// Escape text content.
pub fn escape_text(text: &str) -> String {
    return text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;");
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(text: &str) -> String {
    return escape_text(text).replace('"', "&quot;");
}

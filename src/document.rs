//! HTML host: parse a document and extract definition markers, reference
//! markers (anchors and shorthand), IDL blocks and the bits the header needs.
//!
//! Nothing here resolves anything. The markers carry the byte positions the
//! render adapter later edits.
use std::ops::Range;
use std::path::Path;

use regex::{Captures, Regex};
use tree_sitter::{Node, Parser, Tree};

use crate::error::Error;
use crate::grammar;
use crate::normalize;
use crate::types::SourceLocation;

/// Maximum document size (16 MiB).
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Byte offset → line/column lookup.
#[derive(Debug, Default)]
pub struct LineIndex {
    /// Byte offset of the first byte of every line.
    starts: Vec<usize>,
}

impl LineIndex {
    /// Index the line starts of `source`.
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                starts.push(i.saturating_add(1));
            }
        }
        return Self { starts };
    }

    /// One-based location of a byte offset.
    pub fn locate(&self, offset: usize) -> SourceLocation {
        let line = match self.starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next.saturating_sub(1),
        };
        let start = self.starts.get(line).copied().unwrap_or(0);
        return SourceLocation {
            column: u32::try_from(offset.saturating_sub(start).saturating_add(1)).unwrap_or(u32::MAX),
            line: u32::try_from(line.saturating_add(1)).unwrap_or(u32::MAX),
        };
    }
}

/// An attribute value and the byte range of the whole attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSite {
    /// `name="value"` range in the source.
    pub range: Range<usize>,
    /// Entity-decoded value.
    pub value: String,
}

/// A `<dfn>` element.
#[derive(Debug, Clone)]
pub struct DefinitionMarker {
    /// `data-lt`, when present.
    pub alias_attr: Option<AttrSite>,
    /// Inside `<code>`/`<pre>` or wholly wrapped in one `<code>`.
    pub code_styled: bool,
    /// An `id` the author wrote.
    pub explicit_id: Option<String>,
    /// `data-export` → `Some(true)`, `data-noexport` → `Some(false)`.
    pub export: Option<bool>,
    /// `data-dfn-type`, raw.
    pub kind_attr: Option<String>,
    /// Start of the element.
    pub location: SourceLocation,
    /// `data-dfn-for` on the element or the nearest ancestor.
    pub scope: Option<String>,
    /// Offset of the `>` closing the start tag; new attributes go here.
    pub tag_end: usize,
    /// Normalized text content.
    pub text: String,
}

/// Where a reference sits and how it may be rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceSite {
    /// An `<a>` without `href`.
    Anchor {
        /// Trimmed plain-text content range, when the content may be wrapped in `<code>`.
        plain_text: Option<Range<usize>>,
        /// Offset of the `>` closing the start tag.
        tag_end: usize,
    },
    /// `[=…=]` or `{{…}}` inside a text node; the whole match is replaced.
    Shorthand {
        /// Range of the shorthand including its brackets.
        range: Range<usize>,
    },
}

/// A reference marker.
#[derive(Debug, Clone)]
pub struct ReferenceMarker {
    /// `data-external` present.
    pub allow_external: bool,
    /// Key text: `data-lt`, the shorthand key, or the text content.
    pub key_text: String,
    /// Start of the marker.
    pub location: SourceLocation,
    /// Explicit scope.
    pub scope: Option<String>,
    /// How to rewrite it.
    pub site: ReferenceSite,
    /// Normalized rendered text.
    pub text: String,
    /// `data-link-type`, or `dfn` / `idl` implied by shorthand.
    pub type_attr: Option<String>,
}

/// Everything the transform needs from one parsed document.
#[derive(Debug, Default)]
pub struct Document {
    /// Offset right after the `<body …>` start tag.
    pub body_start: Option<usize>,
    /// Definition markers, document order.
    pub definitions: Vec<DefinitionMarker>,
    /// Inner ranges of `<pre class="idl">` blocks, document order.
    pub idl_blocks: Vec<Range<usize>>,
    /// Every `id` attribute value in the document.
    pub ids: Vec<String>,
    /// Line lookup for the source.
    pub lines: LineIndex,
    /// Reference markers, document order.
    pub references: Vec<ReferenceMarker>,
    /// The untouched source.
    pub source: String,
    /// Text of `<title>`.
    pub title: Option<String>,
}

/// Parse `source` and extract its markers.
///
/// # Errors
///
/// Returns `Error::UnsupportedFile` for non-HTML paths, `Error::FileTooLarge`
/// above the size limit, or `Error::ParseFailed` if tree-sitter fails.
pub fn parse(path: &Path, source: String) -> Result<Document, Error> {
    let source_len: u64 = source.len().try_into().unwrap_or(u64::MAX);
    if source_len > MAX_FILE_SIZE {
        return Err(Error::FileTooLarge {
            file: path.to_path_buf(),
            size_bytes: source_len,
            max_bytes: MAX_FILE_SIZE,
        });
    }

    let language = grammar::language_for_path(path)?;
    let mut parser = Parser::new();
    parser.set_language(&language).map_err(|e| {
        return Error::ParseFailed {
            file: path.to_path_buf(),
            reason: e.to_string(),
        };
    })?;
    let tree: Tree = parser.parse(&source, None).ok_or_else(|| {
        return Error::ParseFailed {
            file: path.to_path_buf(),
            reason: "tree-sitter returned None".to_string(),
        };
    })?;

    let mut document = Document {
        lines: LineIndex::new(&source),
        ..Document::default()
    };
    {
        let mut walker = Walker::new(&source, &mut document);
        walker.visit_children(tree.root_node(), &Context::default());
    }
    document.source = source;
    return Ok(document);
}

// ── Tree walk ──────────────────────────────────────────────────────────

/// Inherited state while descending.
#[derive(Debug, Clone, Default)]
struct Context {
    /// Nearest ancestor `data-dfn-for`.
    dfn_for: Option<String>,
    /// Inside `<code>` or `<pre>`.
    in_code: bool,
    /// Nearest ancestor `data-link-for`.
    link_for: Option<String>,
    /// Shorthand is not recognized here.
    no_shorthand: bool,
}

/// A parsed attribute.
struct Attr {
    /// Lower-cased name.
    name: String,
    /// Whole-attribute range.
    range: Range<usize>,
    /// Decoded value, empty for bare attributes.
    value: String,
}

/// Collects markers into a `Document`.
struct Walker<'a> {
    /// Output.
    document: &'a mut Document,
    /// Shorthand pattern.
    shorthand: Regex,
    /// Document source.
    source: &'a str,
    /// Tag pattern for text content.
    tags: Regex,
}

impl<'a> Walker<'a> {
    /// Compile the patterns used during the walk.
    ///
    /// # Panics
    ///
    /// Panics if a hardcoded regex is invalid (compile-time invariant).
    fn new(source: &'a str, document: &'a mut Document) -> Self {
        return Self {
            document,
            shorthand: Regex::new(r"\[=([^\[\]=]+?)=\]|\{\{([^{}]+?)\}\}").expect("valid regex"),
            source,
            tags: Regex::new(r"<\s*/?\s*([A-Za-z][A-Za-z0-9-]*)?[^>]*>").expect("valid regex"),
        };
    }

    /// Visit the children of `node`. Adjacent text and entity nodes form one
    /// run so shorthand may contain character references.
    fn visit_children(&mut self, node: Node<'_>, ctx: &Context) {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        let mut run: Option<Range<usize>> = None;
        for child in children {
            if matches!(child.kind(), "text" | "entity") {
                run = Some(match run {
                    Some(open) => open.start..child.end_byte(),
                    None => child.start_byte()..child.end_byte(),
                });
                continue;
            }
            if let Some(text) = run.take() {
                self.scan_shorthand(text, ctx);
            }
            // Script, style and comment content is never inspected.
            if child.kind() == "element" {
                self.visit_element(child, ctx);
            }
        }
        if let Some(text) = run {
            self.scan_shorthand(text, ctx);
        }
    }

    /// Handle one element and decide how to descend.
    fn visit_element(&mut self, node: Node<'_>, ctx: &Context) {
        let Some(start_tag) = first_child_of_kind(node, &["start_tag", "self_closing_tag"]) else {
            return;
        };
        let tag = tag_name(start_tag, self.source);
        let attrs = self.attributes(start_tag);
        for attr in attrs.iter().filter(|a| return a.name == "id" && !a.value.is_empty()) {
            self.document.ids.push(attr.value.clone());
        }

        let mut inner = ctx.clone();
        if let Some(value) = attr_value(&attrs, "data-dfn-for") {
            inner.dfn_for = Some(normalize::normalize(value));
        }
        if let Some(value) = attr_value(&attrs, "data-link-for") {
            inner.link_for = Some(normalize::normalize(value));
        }

        let inner_range = inner_range(node, start_tag);
        match tag.as_str() {
            "title" => {
                self.document.title = Some(self.text_content(&inner_range));
                return;
            },
            "body" => self.document.body_start = Some(start_tag.end_byte()),
            "pre" if attr_value(&attrs, "class").is_some_and(|c| return c.split_whitespace().any(|c| return c == "idl")) => {
                self.document.idl_blocks.push(inner_range);
                return;
            },
            "dfn" => {
                self.push_definition(node, start_tag, &attrs, &inner, &inner_range);
                return;
            },
            "a" if attr_value(&attrs, "href").is_none() => {
                self.push_anchor(node, start_tag, &attrs, &inner, &inner_range);
                return;
            },
            "a" => inner.no_shorthand = true,
            "code" | "pre" => {
                inner.in_code = true;
                inner.no_shorthand = true;
            },
            _ => {},
        }
        self.visit_children(node, &inner);
    }

    /// Record a `<dfn>`.
    fn push_definition(&mut self, node: Node<'_>, start_tag: Node<'_>, attrs: &[Attr], ctx: &Context, inner: &Range<usize>) {
        let alias_attr = attrs.iter().find(|a| return a.name == "data-lt").map(|a| {
            return AttrSite {
                range: a.range.clone(),
                value: a.value.clone(),
            };
        });
        let export = if has_attr(attrs, "data-noexport") {
            Some(false)
        } else if has_attr(attrs, "data-export") {
            Some(true)
        } else {
            None
        };

        self.document.definitions.push(DefinitionMarker {
            alias_attr,
            code_styled: ctx.in_code || is_wholly_code(node, self.source),
            explicit_id: attr_value(attrs, "id").filter(|v| return !v.is_empty()).map(String::from),
            export,
            kind_attr: attr_value(attrs, "data-dfn-type").map(String::from),
            location: self.document.lines.locate(node.start_byte()),
            scope: ctx.dfn_for.clone().filter(|s| return !s.is_empty()),
            tag_end: start_tag.end_byte().saturating_sub(1),
            text: self.text_content(inner),
        });
    }

    /// Record an `<a>` without `href`.
    fn push_anchor(&mut self, node: Node<'_>, start_tag: Node<'_>, attrs: &[Attr], ctx: &Context, inner: &Range<usize>) {
        let text = self.text_content(inner);
        let key_text = attr_value(attrs, "data-lt")
            .and_then(|lt| return normalize::parse_alias_list(lt).aliases.into_iter().next())
            .unwrap_or_else(|| return text.clone());
        let plain_text = if ctx.in_code || !is_plain_text(node) {
            None
        } else {
            trimmed_range(self.source, inner)
        };

        self.document.references.push(ReferenceMarker {
            allow_external: has_attr(attrs, "data-external"),
            key_text,
            location: self.document.lines.locate(node.start_byte()),
            scope: ctx.link_for.clone().filter(|s| return !s.is_empty()),
            site: ReferenceSite::Anchor {
                plain_text,
                tag_end: start_tag.end_byte().saturating_sub(1),
            },
            text,
            type_attr: attr_value(attrs, "data-link-type").map(String::from),
        });
    }

    /// Find `[=…=]` and `{{…}}` in a run of text.
    fn scan_shorthand(&mut self, run: Range<usize>, ctx: &Context) {
        if ctx.no_shorthand {
            return;
        }
        let Some(text) = self.source.get(run.clone()) else {
            return;
        };
        for cap in self.shorthand.captures_iter(text) {
            let Some(whole) = cap.get(0) else { continue };
            let range = run.start.saturating_add(whole.start())..run.start.saturating_add(whole.end());
            let location = self.document.lines.locate(range.start);
            let marker = if let Some(concept) = cap.get(1) {
                shorthand_marker(concept.as_str(), "dfn", range, location, ctx)
            } else if let Some(idl) = cap.get(2) {
                shorthand_marker(idl.as_str(), "idl", range, location, ctx)
            } else {
                continue;
            };
            self.document.references.push(marker);
        }
    }

    /// Attributes of a start tag, in order.
    fn attributes(&self, start_tag: Node<'_>) -> Vec<Attr> {
        let mut cursor = start_tag.walk();
        return start_tag
            .children(&mut cursor)
            .filter(|n| return n.kind() == "attribute")
            .filter_map(|attr| {
                let name = first_child_of_kind(attr, &["attribute_name"])?;
                let name = name.utf8_text(self.source.as_bytes()).ok()?.to_ascii_lowercase();
                let value = attribute_value(attr, self.source).map(|v| return decode_entities(&v)).unwrap_or_default();
                return Some(Attr {
                    name,
                    range: attr.start_byte()..attr.end_byte(),
                    value,
                });
            })
            .collect();
    }

    /// Tag-stripped, entity-decoded, whitespace-normalized text of a range.
    /// Inline tags join their neighbours; only `<br>` separates words.
    fn text_content(&self, range: &Range<usize>) -> String {
        let raw = self.source.get(range.clone()).unwrap_or("");
        let stripped = self.tags.replace_all(raw, |caps: &Captures<'_>| {
            let is_break = caps.get(1).is_some_and(|name| return name.as_str().eq_ignore_ascii_case("br"));
            return if is_break { " " } else { "" };
        });
        return normalize::normalize(&decode_entities(&stripped));
    }
}

/// Build a shorthand reference. `Scope/key` splits at the last `/` before any `(`;
/// concept shorthand also accepts `key|display`.
fn shorthand_marker(
    body: &str,
    link_type: &str,
    range: Range<usize>,
    location: SourceLocation,
    ctx: &Context,
) -> ReferenceMarker {
    let body = decode_entities(body);
    let (target, display) = match body.split_once('|') {
        Some((target, display)) if link_type == "dfn" => (target, Some(normalize::normalize(display))),
        _ => (body.as_str(), None),
    };
    let head_end = target.find('(').unwrap_or(target.len());
    let head = target.get(..head_end).unwrap_or(target);
    let (scope, key) = match head.rfind('/') {
        Some(slash) => (
            Some(normalize::normalize(target.get(..slash).unwrap_or(""))),
            normalize::normalize(target.get(slash.saturating_add(1)..).unwrap_or("")),
        ),
        None => (ctx.link_for.clone(), normalize::normalize(target)),
    };
    let key = if link_type == "idl" { normalize::normalize_signature(&key) } else { key };

    return ReferenceMarker {
        allow_external: false,
        text: display.filter(|d| return !d.is_empty()).unwrap_or_else(|| return key.clone()),
        key_text: key,
        location,
        scope: scope.filter(|s| return !s.is_empty()),
        site: ReferenceSite::Shorthand { range },
        type_attr: Some(link_type.to_string()),
    };
}

/// First direct child with one of `kinds`.
fn first_child_of_kind<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| return kinds.contains(&c.kind()));
    return found;
}

/// Lower-cased tag name of a start tag.
fn tag_name(start_tag: Node<'_>, source: &str) -> String {
    return first_child_of_kind(start_tag, &["tag_name"])
        .and_then(|n| return n.utf8_text(source.as_bytes()).ok())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
}

/// Raw value of an attribute node, quotes removed.
fn attribute_value(attr: Node<'_>, source: &str) -> Option<String> {
    if let Some(value) = first_child_of_kind(attr, &["attribute_value"]) {
        return value.utf8_text(source.as_bytes()).ok().map(String::from);
    }
    let quoted = first_child_of_kind(attr, &["quoted_attribute_value"])?;
    // `""` has no inner attribute_value node.
    return Some(
        first_child_of_kind(quoted, &["attribute_value"])
            .and_then(|v| return v.utf8_text(source.as_bytes()).ok())
            .unwrap_or("")
            .to_string(),
    );
}

/// Between the start tag and the end tag (or the element end when implicit).
fn inner_range(element: Node<'_>, start_tag: Node<'_>) -> Range<usize> {
    let start = start_tag.end_byte();
    let end = first_child_of_kind(element, &["end_tag"]).map_or_else(|| return element.end_byte(), |n| return n.start_byte());
    return start..end.max(start);
}

/// Content nodes of an element: everything but its tags and comments.
fn content_children(element: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = element.walk();
    return element
        .children(&mut cursor)
        .filter(|c| return !matches!(c.kind(), "start_tag" | "end_tag" | "self_closing_tag" | "comment"))
        .collect();
}

/// `<dfn><code>…</code></dfn>` with nothing else inside.
fn is_wholly_code(element: Node<'_>, source: &str) -> bool {
    let children = content_children(element);
    let [only] = children.as_slice() else {
        return false;
    };
    if only.kind() != "element" {
        return false;
    }
    return first_child_of_kind(*only, &["start_tag"]).is_some_and(|tag| return tag_name(tag, source) == "code");
}

/// Only text and entities inside, at least one of them.
fn is_plain_text(element: Node<'_>) -> bool {
    let children = content_children(element);
    return !children.is_empty() && children.iter().all(|c| return matches!(c.kind(), "text" | "entity"));
}

/// `range` without leading and trailing whitespace; `None` when blank.
fn trimmed_range(source: &str, range: &Range<usize>) -> Option<Range<usize>> {
    let raw = source.get(range.clone())?;
    let leading = raw.len().saturating_sub(raw.trim_start().len());
    let trailing = raw.len().saturating_sub(raw.trim_end().len());
    let start = range.start.saturating_add(leading);
    let end = range.end.saturating_sub(trailing);
    if start >= end {
        return None;
    }
    return Some(start..end);
}

/// Attribute value by lower-case name.
fn attr_value<'v>(attrs: &'v [Attr], name: &str) -> Option<&'v str> {
    return attrs.iter().find(|a| return a.name == name).map(|a| return a.value.as_str());
}

/// Whether a (possibly bare) attribute is present.
fn has_attr(attrs: &[Attr], name: &str) -> bool {
    return attrs.iter().any(|a| return a.name == name);
}

/// Decode the character references authors actually use in definitions.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(rest.get(..amp).unwrap_or(""));
        let tail = rest.get(amp..).unwrap_or("");
        let Some(semi) = tail.find(';').filter(|&s| return s <= 10) else {
            out.push('&');
            rest = tail.get(1..).unwrap_or("");
            continue;
        };
        let name = tail.get(1..semi).unwrap_or("");
        match decode_entity(name) {
            Some(c) => {
                out.push(c);
                rest = tail.get(semi.saturating_add(1)..).unwrap_or("");
            },
            None => {
                out.push('&');
                rest = tail.get(1..).unwrap_or("");
            },
        }
    }
    out.push_str(rest);
    return out;
}

/// One entity body (between `&` and `;`).
fn decode_entity(name: &str) -> Option<char> {
    if let Some(hex) = name.strip_prefix("#x").or_else(|| return name.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = name.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    return match name {
        "amp" => Some('&'),
        "apos" => Some('\''),
        "gt" => Some('>'),
        "lt" => Some('<'),
        "nbsp" => Some(' '),
        "quot" => Some('"'),
        _ => None,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Document {
        return parse(Path::new("test.html"), html.to_string()).unwrap();
    }

    #[test]
    fn locates_lines_and_columns() {
        let lines = LineIndex::new("ab\ncd\n");
        assert_eq!(lines.locate(0), SourceLocation { column: 1, line: 1 });
        assert_eq!(lines.locate(4), SourceLocation { column: 2, line: 2 });
        assert_eq!(lines.locate(3), SourceLocation { column: 1, line: 2 });
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(decode_entities("I&#39;m &amp; &lt;b&gt; &#x41;"), "I'm & <b> A");
        assert_eq!(decode_entities("a & b &unknown;"), "a & b &unknown;");
    }

    #[test]
    fn extracts_dfn_markers() {
        let d = doc("<section data-dfn-for=\"Foo\"><dfn id=\"x\" data-lt='a|b ' data-dfn-type=\"attribute\">bar</dfn></section>");
        let dfn = d.definitions.first().unwrap();
        assert_eq!(dfn.text, "bar");
        assert_eq!(dfn.scope.as_deref(), Some("Foo"));
        assert_eq!(dfn.kind_attr.as_deref(), Some("attribute"));
        assert_eq!(dfn.explicit_id.as_deref(), Some("x"));
        assert_eq!(dfn.alias_attr.as_ref().map(|a| return a.value.as_str()), Some("a|b "));
        assert_eq!(d.ids, ["x"]);
        assert_eq!(d.source.get(dfn.tag_end..=dfn.tag_end), Some(">"));
    }

    #[test]
    fn code_styling_of_definitions() {
        let d = doc(
            "<div><code><dfn>outerCode</dfn></code><pre><dfn>outerPre</dfn></pre><dfn><code>innerCode</code></dfn><dfn><code>partial</code> inner code</dfn></div>",
        );
        let styled: Vec<(String, bool)> = d.definitions.iter().map(|m| return (m.text.clone(), m.code_styled)).collect();
        assert_eq!(
            styled,
            [
                ("outerCode".to_string(), true),
                ("outerPre".to_string(), true),
                ("innerCode".to_string(), true),
                ("partial inner code".to_string(), false),
            ]
        );
    }

    #[test]
    fn anchors_and_shorthand() {
        let d = doc("<p>See <a data-lt=\"Test\">not wrapped</a>, [=Foo/bar=], {{ Foo/baz( x ) }} and <a href=\"#x\">[=no=]</a>.</p><pre>[=skip=]</pre>");
        let refs: Vec<(&str, Option<&str>, Option<&str>)> = d
            .references
            .iter()
            .map(|r| return (r.key_text.as_str(), r.scope.as_deref(), r.type_attr.as_deref()))
            .collect();
        assert_eq!(
            refs,
            [("Test", None, None), ("bar", Some("Foo"), Some("dfn")), ("baz(x)", Some("Foo"), Some("idl"))]
        );
        let anchor = d.references.first().unwrap();
        assert_eq!(anchor.text, "not wrapped");
        let ReferenceSite::Anchor { plain_text: Some(range), .. } = &anchor.site else {
            panic!("expected a plain-text anchor");
        };
        assert_eq!(d.source.get(range.clone()), Some("not wrapped"));
        let ReferenceSite::Shorthand { range } = &d.references.get(1).unwrap().site else {
            panic!("expected shorthand");
        };
        assert_eq!(d.source.get(range.clone()), Some("[=Foo/bar=]"));
    }

    #[test]
    fn display_text_of_concept_shorthand() {
        let d = doc("<p>[=widget|the widgets=]</p>");
        let r = d.references.first().unwrap();
        assert_eq!(r.key_text, "widget");
        assert_eq!(r.text, "the widgets");
    }

    #[test]
    fn idl_blocks_title_and_body() {
        let d = doc("<html><head><title>My  Spec</title></head><body><pre class=\"idl\">interface Foo {};</pre></body></html>");
        assert_eq!(d.title.as_deref(), Some("My Spec"));
        let block = d.idl_blocks.first().unwrap();
        assert_eq!(d.source.get(block.clone()), Some("interface Foo {};"));
        let body = d.body_start.unwrap();
        assert!(d.source.get(..body).unwrap().ends_with("<body>"));
    }

    #[test]
    fn rejects_non_html() {
        assert!(parse(Path::new("x.md"), String::new()).is_err());
    }
}

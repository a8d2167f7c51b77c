//! Definition collection.
//!
//! Walks every `<dfn>` marker in document order, derives scope, kind and
//! aliases, and fills the `ResolutionIndex`. Declarations found in IDL
//! blocks are added afterwards. The first definition of a key wins; later
//! ones are reported and keep only the aliases nobody claimed yet.
use std::collections::HashSet;
use std::ops::Range;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::document::{DefinitionMarker, Document};
use crate::idl::{IdlDeclaration, IdlNamespace};
use crate::normalize;
use crate::table::ResolutionIndex;
use crate::types::{DefinitionKind, DefinitionRecord, KindClass, Origin, RecordId, RenderStyle, SourceLocation};

/// What collection decided for one `<dfn>` marker.
#[derive(Debug, Clone, Default)]
pub struct MarkerResult {
    /// Normalized `data-lt` to write back. Only set when the marker had one.
    pub alias_rewrite: Option<String>,
    /// Record built for the marker; `None` when it had no usable alias.
    pub record: Option<RecordId>,
}

/// An identifier inside an IDL block and what it turns into.
#[derive(Debug, Clone)]
pub struct IdlSite {
    /// `true`: wrap in `<dfn>`. `false`: link to an earlier definition.
    pub defines: bool,
    /// Byte range of the identifier in the document.
    pub span: Range<usize>,
    /// Record defined or linked to.
    pub target: RecordId,
}

/// Result of the collection pass.
#[derive(Debug, Default)]
pub struct Collection {
    /// Collection diagnostics, in document order.
    pub diagnostics: Vec<Diagnostic>,
    /// `data-dfn-for` values that named no owner and were ignored.
    pub dropped_scopes: HashSet<String>,
    /// One entry per IDL declaration, source order.
    pub idl_sites: Vec<IdlSite>,
    /// The populated definition table.
    pub index: ResolutionIndex,
    /// One entry per definition marker, document order.
    pub markers: Vec<MarkerResult>,
}

/// A marker after alias, kind and scope derivation.
struct Prepared {
    /// Normalized aliases, canonical key first.
    aliases: Vec<String>,
    /// Definition kind.
    kind: DefinitionKind,
    /// Operation short forms.
    loose_aliases: Vec<String>,
    /// Owning scope after the owner check.
    scope: Option<String>,
}

/// Collect every definition of `document`.
///
/// `namespace` answers kind inference for code-styled markers; `declarations`
/// are the IDL block declarations added after the markers.
pub fn collect(document: &Document, namespace: &dyn IdlNamespace, declarations: &[IdlDeclaration]) -> Collection {
    let mut collection = Collection {
        index: ResolutionIndex::new(document.ids.iter().cloned()),
        ..Collection::default()
    };

    let mut prepared: Vec<Option<Prepared>> = Vec::with_capacity(document.definitions.len());
    for marker in &document.definitions {
        let (item, rewrite) = prepare(marker, namespace, &mut collection.diagnostics);
        prepared.push(item);
        collection.markers.push(MarkerResult {
            alias_rewrite: rewrite,
            record: None,
        });
    }

    collection.dropped_scopes =
        check_scope_owners(&document.definitions, &mut prepared, namespace, &mut collection.diagnostics);

    for (i, (marker, item)) in document.definitions.iter().zip(prepared).enumerate() {
        let Some(item) = item else { continue };
        let record = insert_marker(&mut collection, i, marker, item);
        if let Some(result) = collection.markers.get_mut(i) {
            result.record = Some(record);
        }
    }

    for (j, declaration) in declarations.iter().enumerate() {
        let location = document.lines.locate(declaration.span.start);
        let site = insert_declaration(&mut collection.index, j, declaration, location);
        collection.idl_sites.push(site);
    }
    return collection;
}

/// Derive aliases and kind of one marker. Returns `None` when the marker
/// has neither text nor aliases, plus the `data-lt` rewrite if any.
fn prepare(
    marker: &DefinitionMarker,
    namespace: &dyn IdlNamespace,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Option<Prepared>, Option<String>) {
    let mut aliases = Vec::new();
    if let Some(attr) = &marker.alias_attr {
        let list = normalize::parse_alias_list(&attr.value);
        if list.empty > 0 {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MalformedAliasList,
                Some(marker.location),
                format!("`data-lt=\"{}\"` contains {} empty alias(es); they were skipped", attr.value, list.empty),
            ));
        }
        aliases = list.aliases;
    }
    if !marker.text.is_empty() && !aliases.contains(&marker.text) {
        aliases.push(marker.text.clone());
    }
    let rewrite = marker.alias_attr.as_ref().map(|_| return aliases.join("|"));

    let Some(key) = aliases.first() else {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::MalformedAliasList,
            Some(marker.location),
            "definition has no text and no `data-lt` alias",
        ));
        return (None, rewrite);
    };

    let kind = derive_kind(marker, key, namespace, diagnostics);
    let mut loose_aliases = Vec::new();
    if kind == DefinitionKind::Method {
        aliases = aliases.iter().map(|a| return normalize::normalize_signature(a)).collect();
        if let Some(key) = aliases.first() {
            loose_aliases = method_short_forms(key);
        }
    }

    let prepared = Prepared {
        aliases,
        kind,
        loose_aliases,
        scope: marker.scope.clone(),
    };
    return (Some(prepared), rewrite);
}

/// Explicit `data-dfn-type`, else IDL kind for known code-styled names, else `Dfn`.
fn derive_kind(
    marker: &DefinitionMarker,
    key: &str,
    namespace: &dyn IdlNamespace,
    diagnostics: &mut Vec<Diagnostic>,
) -> DefinitionKind {
    let inferred = || {
        if !marker.code_styled {
            return DefinitionKind::Dfn;
        }
        let name = normalize::strip_signature(key);
        let qualified = match &marker.scope {
            Some(scope) => format!("{scope}/{name}"),
            None => name.to_string(),
        };
        return namespace.idl_type_of(&qualified).unwrap_or(DefinitionKind::Dfn);
    };

    let Some(raw) = &marker.kind_attr else {
        return inferred();
    };
    return match raw.parse::<DefinitionKind>() {
        Ok(kind) => kind,
        Err(bad) => {
            let kind = inferred();
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnknownDefinitionType,
                Some(marker.location),
                format!("unknown `data-dfn-type` value `{bad}` on `{key}`; treated as `{kind}`"),
            ));
            kind
        },
    };
}

/// `foo(a, b)` → `foo()`, `foo`; the key itself is never repeated.
fn method_short_forms(key: &str) -> Vec<String> {
    let name = normalize::strip_signature(key);
    return [format!("{name}()"), name.to_string()]
        .into_iter()
        .filter(|form| return form != key)
        .collect();
}

/// Drop scopes that name nothing: no global definition and no IDL name.
/// Returns the dropped scope names.
fn check_scope_owners(
    markers: &[DefinitionMarker],
    prepared: &mut [Option<Prepared>],
    namespace: &dyn IdlNamespace,
    diagnostics: &mut Vec<Diagnostic>,
) -> HashSet<String> {
    let global_keys: HashSet<String> = prepared
        .iter()
        .flatten()
        .filter(|p| return p.scope.is_none())
        .flat_map(|p| return p.aliases.iter().cloned())
        .collect();

    let mut dropped = HashSet::new();
    for (marker, item) in markers.iter().zip(prepared.iter_mut()) {
        let Some(item) = item else { continue };
        let Some(scope) = item.scope.take() else { continue };
        if global_keys.contains(&scope) || namespace.is_known_idl_name(&scope) {
            item.scope = Some(scope);
            continue;
        }
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::MissingScopeOwner,
            Some(marker.location),
            format!(
                "`{}` is defined for `{scope}`, but nothing defines `{scope}`; registered without a scope",
                item.aliases.first().map_or("", String::as_str)
            ),
        ));
        dropped.insert(scope);
    }
    return dropped;
}

/// Insert one prepared marker, reporting aliases an earlier definition owns.
fn insert_marker(collection: &mut Collection, origin: usize, marker: &DefinitionMarker, item: Prepared) -> RecordId {
    let index = &mut collection.index;
    let class = item.kind.class();
    let mut claimed = Vec::new();
    let mut taken = Vec::new();
    let mut related: Vec<SourceLocation> = Vec::new();
    for alias in &item.aliases {
        match index.claimant(item.scope.as_deref(), class, alias) {
            Some(owner) => {
                taken.push(format!("`{alias}`"));
                let location = index.get(owner).location;
                if !related.contains(&location) {
                    related.push(location);
                }
            },
            None => claimed.push(alias.clone()),
        }
    }

    if !taken.is_empty() {
        let scope = item.scope.as_deref().map(|s| return format!(" for `{s}`")).unwrap_or_default();
        let mut diagnostic = Diagnostic::new(
            DiagnosticKind::DuplicateDefinition,
            Some(marker.location),
            format!("{}{scope} already defined; the first definition wins", taken.join(", ")),
        );
        for location in related {
            diagnostic = diagnostic.with_related(location);
        }
        collection.diagnostics.push(diagnostic);
    }

    let key = item.aliases.first().map_or("", String::as_str);
    let id = match &marker.explicit_id {
        Some(explicit) => explicit.clone(),
        None => index.allocate_id(&base_id(item.kind, item.scope.as_deref(), key)),
    };
    let style = if marker.code_styled { RenderStyle::Code } else { RenderStyle::Prose };
    let record = DefinitionRecord {
        aliases: item.aliases,
        exported: marker.export.unwrap_or(class == KindClass::Idl),
        id,
        kind: item.kind,
        location: marker.location,
        loose_aliases: item.loose_aliases,
        origin: Origin::Marker(origin),
        scope: item.scope,
        style,
    };
    return index.insert(record, &claimed);
}

/// Add one IDL declaration, or link it to the definition that already owns its key.
fn insert_declaration(
    index: &mut ResolutionIndex,
    origin: usize,
    declaration: &IdlDeclaration,
    location: SourceLocation,
) -> IdlSite {
    let scope = declaration.scope.as_deref();
    let prose_owner = || {
        return declaration.loose_aliases.iter().find_map(|alias| {
            return index
                .claimant(scope, KindClass::Idl, alias)
                .filter(|owner| return matches!(index.get(*owner).origin, Origin::Marker(_)));
        });
    };
    // Repeated keys are overload or partial repeats; they link to the first.
    if let Some(owner) = index.claimant(scope, KindClass::Idl, &declaration.key).or_else(prose_owner) {
        return IdlSite {
            defines: false,
            span: declaration.span.clone(),
            target: owner,
        };
    }

    let id = index.allocate_id(&base_id(declaration.kind, scope, &declaration.key));
    let record = DefinitionRecord {
        aliases: vec![declaration.key.clone()],
        exported: true,
        id,
        kind: declaration.kind,
        location,
        loose_aliases: declaration.loose_aliases.clone(),
        origin: Origin::Idl(origin),
        scope: declaration.scope.clone(),
        style: RenderStyle::Code,
    };
    let target = index.insert(record, std::slice::from_ref(&declaration.key));
    return IdlSite {
        defines: true,
        span: declaration.span.clone(),
        target,
    };
}

/// Fragment id before collision suffixes: `dfn-…`, `idl-def-…` or `dom-<scope>-<name>`.
fn base_id(kind: DefinitionKind, scope: Option<&str>, key: &str) -> String {
    if kind == DefinitionKind::Dfn {
        return prefixed("dfn", &normalize::slugify(key));
    }
    if !kind.is_idl_member() {
        return prefixed("idl-def", &normalize::slugify(key));
    }
    let name = normalize::strip_signature(key);
    let name_slug = if name.is_empty() { "the-empty-string".to_string() } else { normalize::slugify(name) };
    return match scope {
        Some(scope) => prefixed(&prefixed("dom", &normalize::slugify(scope)), &name_slug),
        None => prefixed("dom", &name_slug),
    };
}

/// `prefix-slug`, or just `prefix` for an empty slug.
fn prefixed(prefix: &str, slug: &str) -> String {
    if slug.is_empty() {
        return prefix.to_string();
    }
    return format!("{prefix}-{slug}");
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::document;
    use crate::idl::IdlIndex;

    fn run(html: &str) -> (Document, Collection) {
        let doc = document::parse(Path::new("t.html"), html.to_string()).unwrap();
        let idl = IdlIndex::from_blocks(&doc.source, &doc.idl_blocks);
        let collection = collect(&doc, &idl, idl.declarations());
        return (doc, collection);
    }

    fn ids(collection: &Collection) -> Vec<&str> {
        return collection.index.records().iter().map(|r| return r.id.as_str()).collect();
    }

    fn codes(collection: &Collection) -> Vec<&str> {
        return collection.diagnostics.iter().map(|d| return d.kind.code()).collect();
    }

    #[test]
    fn plain_definition_gets_dfn_id() {
        let (_, c) = run("<p><dfn>text</dfn></p>");
        assert_eq!(ids(&c), ["dfn-text"]);
        assert!(c.diagnostics.is_empty());
        assert!(c.markers.first().unwrap().alias_rewrite.is_none());
    }

    #[test]
    fn alias_list_is_rewritten_and_text_appended() {
        let (_, c) = run("<dfn data-lt=\"text|text 1|text  2|text 3 \">text</dfn><dfn data-lt=\"I'm an lt\">test</dfn>");
        let rewrites: Vec<Option<&str>> = c.markers.iter().map(|m| return m.alias_rewrite.as_deref()).collect();
        assert_eq!(rewrites, [Some("text|text 1|text 2|text 3"), Some("I'm an lt|test")]);
        assert_eq!(ids(&c), ["dfn-text", "dfn-i-m-an-lt"]);
        assert_eq!(c.index.exact("text 2").len(), 1);
        assert_eq!(c.index.exact("test").len(), 1);
    }

    #[test]
    fn inline_markup_does_not_split_words() {
        let (_, c) = run("<dfn>foo<b>bar</b></dfn><dfn>line<br>break</dfn>");
        assert_eq!(ids(&c), ["dfn-foobar", "dfn-line-break"]);
        assert_eq!(c.index.exact("foobar").len(), 1);
        assert_eq!(c.index.exact("line break").len(), 1);
    }

    #[test]
    fn explicit_id_is_kept() {
        let (_, c) = run("<dfn id=\"my-term\">term</dfn><dfn>my term</dfn>");
        assert_eq!(ids(&c), ["my-term", "dfn-my-term"]);
    }

    #[test]
    fn generated_ids_avoid_existing_ones() {
        let (_, c) = run("<h2 id=\"dfn-text\">Text</h2><dfn>text</dfn><dfn data-dfn-for=\"text\">Text</dfn>");
        assert_eq!(ids(&c), ["dfn-text-1", "dfn-text-2"]);
    }

    #[test]
    fn duplicates_report_once_and_first_wins() {
        let (_, c) = run("<dfn>a</dfn>\n<dfn data-lt=\"a|b\">b</dfn>");
        assert_eq!(codes(&c), ["E_DFN_DUP"]);
        let d = c.diagnostics.first().unwrap();
        assert_eq!(d.related, [SourceLocation { column: 1, line: 1 }]);
        assert_eq!(d.location, Some(SourceLocation { column: 1, line: 2 }));
        let first = *c.index.exact("a").first().unwrap();
        assert_eq!(c.index.get(first).id, "dfn-a");
        assert_eq!(c.index.exact("a").len(), 1);
        assert_eq!(c.index.exact("b").len(), 1);
    }

    #[test]
    fn same_key_in_other_scope_or_class_is_not_a_duplicate() {
        let html = "<pre class=\"idl\">interface Foo { attribute DOMString bar; };</pre>\
                    <dfn data-dfn-for=\"Foo\">bar</dfn><dfn>bar</dfn>";
        let (_, c) = run(html);
        assert!(c.diagnostics.is_empty(), "{:?}", c.diagnostics);
        assert_eq!(ids(&c), ["dfn-bar", "dfn-bar-1", "idl-def-foo", "dom-foo-bar"]);
        assert!(c.idl_sites.iter().all(|s| return s.defines));
    }

    #[test]
    fn code_styled_idl_name_takes_idl_kind() {
        let html = "<pre class=\"idl\">interface Test {};</pre><p><dfn><code>Test</code></dfn></p>";
        let (_, c) = run(html);
        let record = c.index.records().first().unwrap();
        assert_eq!(record.kind, DefinitionKind::Interface);
        assert_eq!(record.id, "idl-def-test");
        assert_eq!(record.style, RenderStyle::Code);
        let site = c.idl_sites.first().unwrap();
        assert!(!site.defines);
        assert_eq!(site.target, RecordId(0));
    }

    #[test]
    fn prose_method_definition_owns_idl_overloads() {
        let html = "<pre class=\"idl\">interface X { undefined go(long a); undefined go(long a, long b); };</pre>\
                    <dfn data-dfn-for=\"X\" data-dfn-type=\"method\">go()</dfn>";
        let (_, c) = run(html);
        let targets: Vec<(bool, RecordId)> = c.idl_sites.iter().map(|s| return (s.defines, s.target)).collect();
        assert_eq!(targets, [(true, RecordId(1)), (false, RecordId(0)), (false, RecordId(0))]);
        assert_eq!(c.index.get(RecordId(0)).id, "dom-x-go");
    }

    #[test]
    fn member_ids_and_empty_enum_value() {
        let (_, c) = run("<pre class=\"idl\">enum Mode { \"\", \"fast\" };</pre>");
        assert_eq!(ids(&c), ["idl-def-mode", "dom-mode-the-empty-string", "dom-mode-fast"]);
    }

    #[test]
    fn missing_scope_owner_registers_globally() {
        let (_, c) = run("<dfn data-dfn-for=\"Nothing\">thing</dfn>");
        assert_eq!(codes(&c), ["W_DFN_FOR_MISSING"]);
        let record = c.index.records().first().unwrap();
        assert_eq!(record.scope, None);
        assert_eq!(c.index.claimant(None, KindClass::Concept, "thing"), Some(RecordId(0)));
        assert!(c.dropped_scopes.contains("Nothing"));
    }

    #[test]
    fn scope_owner_may_be_defined_later() {
        let (_, c) = run("<dfn data-dfn-for=\"request\">url</dfn><dfn>request</dfn>");
        assert!(c.diagnostics.is_empty());
        assert_eq!(c.index.records().first().unwrap().scope.as_deref(), Some("request"));
    }

    #[test]
    fn unknown_type_and_empty_aliases_are_errors() {
        let (_, c) = run("<dfn data-dfn-type=\"widget\">x</dfn><dfn data-lt=\"a||b\">b</dfn>");
        assert_eq!(codes(&c), ["E_DFN_TYPE", "E_DFN_ALIAS"]);
        assert_eq!(c.index.records().first().unwrap().kind, DefinitionKind::Dfn);
        assert_eq!(c.markers.get(1).unwrap().alias_rewrite.as_deref(), Some("a|b"));
    }

    #[test]
    fn export_defaults_follow_class() {
        let (_, c) = run("<dfn>a</dfn><dfn data-export>b</dfn><dfn data-dfn-type=\"interface\" data-noexport>C</dfn>");
        let exported: Vec<bool> = c.index.records().iter().map(|r| return r.exported).collect();
        assert_eq!(exported, [false, true, false]);
    }
}

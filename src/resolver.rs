//! Reference resolution against a complete `ResolutionIndex`.
//!
//! Tiers are tried in order and the first non-empty one wins:
//!
//! 1. requested scope (or global), requested type, exact key
//! 2. a scope was given: that scope, any type, exact key
//! 3. no scope was given: global, any type, exact key
//! 4. plain terms only: case-folded key, singular forms, folded singular forms
//!
//! One candidate resolves, several are ambiguous, none is unresolved.
use std::collections::HashSet;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::document::ReferenceMarker;
use crate::normalize;
use crate::table::ResolutionIndex;
use crate::types::{DefinitionKind, LinkType, Outcome, RecordId, ReferenceRequest};

/// Resolver switches taken from `[resolve]` and `[external]` in the config.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Try the case-folded key for plain terms.
    pub case_insensitive: bool,
    /// Keys that may stay unresolved without an error.
    pub external_terms: Vec<String>,
    /// Try singular forms for plain terms.
    pub singularize: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        return Self {
            case_insensitive: true,
            external_terms: Vec::new(),
            singularize: true,
        };
    }
}

/// Resolve every reference marker, in document order.
///
/// `dropped_scopes` are the definition scopes collection ignored for lack of
/// an owner; references naming them are looked up unscoped, like their
/// definitions were registered. Returns one outcome per marker plus the
/// diagnostics of the pass.
pub fn resolve_all(
    references: &[ReferenceMarker],
    index: &ResolutionIndex,
    dropped_scopes: &HashSet<String>,
    options: &ResolveOptions,
) -> (Vec<Outcome>, Vec<Diagnostic>) {
    let mut outcomes = Vec::with_capacity(references.len());
    let mut diagnostics = Vec::new();

    for marker in references {
        let request = request_for(marker, dropped_scopes, &mut diagnostics);
        let outcome = resolve(index, &request, options);
        match &outcome {
            Outcome::Ambiguous(candidates) => diagnostics.push(ambiguous(index, &request, candidates)),
            Outcome::Unresolved if !is_allowed_unresolved(&request, options) => {
                diagnostics.push(unresolved(&request));
            },
            Outcome::Resolved { .. } | Outcome::Unresolved => {},
        }
        outcomes.push(outcome);
    }
    return (outcomes, diagnostics);
}

/// Reduce a marker to a request. An unknown `data-link-type` is reported and
/// ignored; a scope in `dropped_scopes` is ignored silently.
pub fn request_for(
    marker: &ReferenceMarker,
    dropped_scopes: &HashSet<String>,
    diagnostics: &mut Vec<Diagnostic>,
) -> ReferenceRequest {
    let type_filter = marker.type_attr.as_deref().and_then(|raw| {
        return match raw.parse::<LinkType>() {
            Ok(filter) => Some(filter),
            Err(bad) => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnknownLinkType,
                    Some(marker.location),
                    format!("unknown `data-link-type` value `{bad}`; the type filter is ignored"),
                ));
                None
            },
        };
    });

    let key = if matches!(type_filter, Some(LinkType::Idl | LinkType::Exact(DefinitionKind::Method))) {
        normalize::normalize_signature(&marker.key_text)
    } else {
        normalize::normalize(&marker.key_text)
    };

    return ReferenceRequest {
        allow_external: marker.allow_external,
        key,
        location: marker.location,
        scope: marker.scope.clone().filter(|scope| return !dropped_scopes.contains(scope)),
        text: marker.text.clone(),
        type_filter,
    };
}

/// Resolve one request.
pub fn resolve(index: &ResolutionIndex, request: &ReferenceRequest, options: &ResolveOptions) -> Outcome {
    let scope = request.scope.as_deref();
    let key = request.key.as_str();

    let mut candidates = exact_tier(index, key, scope, request.type_filter);
    if candidates.is_empty() && request.type_filter.is_some() {
        // Same scope sequence with the type filter dropped.
        candidates = exact_tier(index, key, scope, None);
    }
    if !candidates.is_empty() {
        return outcome_of(candidates, key.to_string());
    }

    if request.type_filter.is_none_or(|filter| return filter == LinkType::Concept) {
        for (form, folded) in fallback_forms(key, options) {
            let candidates = concept_tier(index, &form, folded, scope);
            if let Some(&first) = candidates.first() {
                let matched = matched_alias(index, first, &form, folded);
                return outcome_of(candidates, matched);
            }
        }
    }
    return Outcome::Unresolved;
}

/// Records whose alias is exactly `key`, in `scope`, passing `filter`.
fn exact_tier(index: &ResolutionIndex, key: &str, scope: Option<&str>, filter: Option<LinkType>) -> Vec<RecordId> {
    return index
        .exact(key)
        .iter()
        .copied()
        .filter(|&id| {
            let record = index.get(id);
            return record.scope.as_deref() == scope && filter.is_none_or(|f| return f.accepts(record.kind));
        })
        .collect();
}

/// Plain-term records for one fallback form.
fn concept_tier(index: &ResolutionIndex, form: &str, folded: bool, scope: Option<&str>) -> Vec<RecordId> {
    let ids = if folded { index.folded(form) } else { index.exact(form) };
    return ids
        .iter()
        .copied()
        .filter(|&id| {
            let record = index.get(id);
            return record.scope.as_deref() == scope && record.kind == DefinitionKind::Dfn;
        })
        .collect();
}

/// Fallback forms in tier order; `true` marks a case-folded form.
fn fallback_forms(key: &str, options: &ResolveOptions) -> Vec<(String, bool)> {
    let mut forms = Vec::new();
    if options.case_insensitive {
        forms.push((normalize::fold_case(key), true));
    }
    if options.singularize {
        let singulars = normalize::singular_forms(key);
        forms.extend(singulars.iter().map(|s| return (s.clone(), false)));
        if options.case_insensitive {
            forms.extend(singulars.iter().map(|s| return (normalize::fold_case(s), true)));
        }
    }
    return forms;
}

/// The alias of `record` a fallback form hit, as written in the definition.
fn matched_alias(index: &ResolutionIndex, record: RecordId, form: &str, folded: bool) -> String {
    if !folded {
        return form.to_string();
    }
    return index
        .get(record)
        .aliases
        .iter()
        .find(|alias| return normalize::fold_case(alias) == form)
        .cloned()
        .unwrap_or_else(|| return form.to_string());
}

/// One candidate resolves; several are ambiguous.
fn outcome_of(candidates: Vec<RecordId>, matched: String) -> Outcome {
    return match candidates.as_slice() {
        [] => Outcome::Unresolved,
        [record] => Outcome::Resolved {
            matched,
            record: *record,
        },
        _ => Outcome::Ambiguous(candidates),
    };
}

/// `data-external` or a configured external term.
fn is_allowed_unresolved(request: &ReferenceRequest, options: &ResolveOptions) -> bool {
    return request.allow_external || options.external_terms.iter().any(|term| return *term == request.key);
}

/// `Scope/key` or `key`.
fn qualified(scope: Option<&str>, key: &str) -> String {
    return match scope {
        Some(scope) => format!("{scope}/{key}"),
        None => key.to_string(),
    };
}

/// Diagnostic for a reference with several candidates.
fn ambiguous(index: &ResolutionIndex, request: &ReferenceRequest, candidates: &[RecordId]) -> Diagnostic {
    let listed: Vec<String> = candidates
        .iter()
        .map(|&id| {
            let record = index.get(id);
            return format!("`{}` ({})", record.qualified_name(), record.kind);
        })
        .collect();
    let mut diagnostic = Diagnostic::new(
        DiagnosticKind::AmbiguousReference,
        Some(request.location),
        format!(
            "`{}` matches {} definitions: {}",
            qualified(request.scope.as_deref(), &request.key),
            candidates.len(),
            listed.join(", ")
        ),
    );
    for &id in candidates {
        diagnostic = diagnostic.with_related(index.get(id).location);
    }
    return diagnostic;
}

/// Diagnostic for a reference nothing matched.
fn unresolved(request: &ReferenceRequest) -> Diagnostic {
    let filter = match request.type_filter {
        Some(LinkType::Concept) => " of type `dfn`".to_string(),
        Some(LinkType::Idl) => " of an IDL type".to_string(),
        Some(LinkType::Exact(kind)) => format!(" of type `{kind}`"),
        None => String::new(),
    };
    let shown = if request.text == request.key {
        String::new()
    } else {
        format!(" (shown as \"{}\")", request.text)
    };
    return Diagnostic::new(
        DiagnosticKind::UnresolvedReference,
        Some(request.location),
        format!(
            "no definition{filter} matches `{}`{shown}",
            qualified(request.scope.as_deref(), &request.key)
        ),
    );
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::collector::{self, Collection};
    use crate::document::{self, Document};
    use crate::idl::IdlIndex;

    fn setup(html: &str) -> (Document, Collection) {
        let doc = document::parse(Path::new("t.html"), html.to_string()).unwrap();
        let idl = IdlIndex::from_blocks(&doc.source, &doc.idl_blocks);
        let collection = collector::collect(&doc, &idl, idl.declarations());
        return (doc, collection);
    }

    fn run_with(html: &str, options: &ResolveOptions) -> (Vec<Option<String>>, Vec<&'static str>) {
        let (doc, collection) = setup(html);
        let (outcomes, diagnostics) = resolve_all(&doc.references, &collection.index, &collection.dropped_scopes, options);
        let targets = outcomes
            .iter()
            .map(|o| {
                return match o {
                    Outcome::Resolved { record, .. } => Some(collection.index.get(*record).id.clone()),
                    Outcome::Ambiguous(_) | Outcome::Unresolved => None,
                };
            })
            .collect();
        return (targets, diagnostics.iter().map(|d| return d.kind.code()).collect());
    }

    fn run(html: &str) -> (Vec<Option<String>>, Vec<&'static str>) {
        return run_with(html, &ResolveOptions::default());
    }

    fn some(id: &str) -> Option<String> {
        return Some(id.to_string());
    }

    #[test]
    fn exact_match_including_forward_reference() {
        let (targets, codes) = run("<p><a>text</a></p><p><dfn>text</dfn> and <a>text</a></p>");
        assert_eq!(targets, [some("dfn-text"), some("dfn-text")]);
        assert!(codes.is_empty());
    }

    #[test]
    fn scoped_concept_and_idl_member_are_distinct() {
        let html = "<pre class=\"idl\">interface Foo { attribute DOMString bar; };</pre>\
                    <dfn data-dfn-for=\"Foo\">bar</dfn><dfn>bar</dfn>\
                    <p>[=Foo/bar=] {{Foo/bar}} [=bar=]</p>";
        let (targets, codes) = run(html);
        assert_eq!(targets, [some("dfn-bar"), some("dom-foo-bar"), some("dfn-bar-1")]);
        assert!(codes.is_empty());
    }

    #[test]
    fn references_into_an_ownerless_scope_resolve_unscoped() {
        let html = "<dfn data-dfn-for=\"Nothing\">thing</dfn><p>[=Nothing/thing=] <a data-link-for=\"Nothing\">thing</a></p>";
        let (targets, codes) = run(html);
        assert_eq!(targets, [some("dfn-thing"), some("dfn-thing")]);
        assert!(codes.is_empty(), "{codes:?}");
    }

    #[test]
    fn definition_with_inline_markup_resolves_joined_text() {
        let (targets, codes) = run("<dfn>foo<b>bar</b></dfn><p>[=foobar=] <a>foo<i>bar</i></a></p>");
        assert_eq!(targets, [some("dfn-foobar"), some("dfn-foobar")]);
        assert!(codes.is_empty(), "{codes:?}");
    }

    #[test]
    fn unresolved_message_shows_display_text() {
        let (doc, collection) = setup("<p>[=gamma|the gammas=] [=delta=]</p>");
        let (_, diagnostics) =
            resolve_all(&doc.references, &collection.index, &collection.dropped_scopes, &ResolveOptions::default());
        let messages: Vec<&str> = diagnostics.iter().map(|d| return d.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "no definition matches `gamma` (shown as \"the gammas\")",
                "no definition matches `delta`"
            ]
        );
    }

    #[test]
    fn scope_given_falls_back_to_any_type() {
        let html = "<div data-dfn-for=\"Foo\"><dfn>baz</dfn></div><dfn data-dfn-type=\"interface\">Foo</dfn>\
                    <a data-link-for=\"Foo\" data-link-type=\"attribute\">baz</a>";
        let (targets, codes) = run(html);
        assert_eq!(targets, [some("dfn-baz")]);
        assert!(codes.is_empty());
    }

    #[test]
    fn global_scope_is_not_searched_for_scoped_requests() {
        let (targets, codes) = run("<dfn>thing</dfn><dfn>Owner</dfn><a data-link-for=\"Owner\">thing</a>");
        assert_eq!(targets, [None]);
        assert_eq!(codes, ["E_REF_UNRESOLVED"]);
    }

    #[test]
    fn overloads_through_short_form_are_ambiguous() {
        let html = "<pre class=\"idl\">interface X { undefined go(long a); undefined go(long a, long b); };</pre>\
                    <p>{{X/go()}} {{X/go(a, b)}}</p>";
        let (targets, codes) = run(html);
        assert_eq!(targets, [None, some("dom-x-go-1")]);
        assert_eq!(codes, ["E_REF_AMBIGUOUS"]);
    }

    #[test]
    fn case_and_plural_fallbacks_for_plain_terms() {
        let html = "<dfn>widget</dfn><dfn>Policy</dfn><p><a>Widget</a> <a>widgets</a> <a>policies</a></p>";
        let (targets, codes) = run(html);
        assert_eq!(targets, [some("dfn-widget"), some("dfn-widget"), some("dfn-policy")]);
        assert!(codes.is_empty());

        let strict = ResolveOptions {
            case_insensitive: false,
            singularize: false,
            ..ResolveOptions::default()
        };
        let (targets, codes) = run_with(html, &strict);
        assert_eq!(targets, [None, None, None]);
        assert_eq!(codes.len(), 3);
    }

    #[test]
    fn fallbacks_skip_idl_definitions() {
        let (targets, codes) = run("<pre class=\"idl\">interface Thing {};</pre><p><a>thing</a> <a>Things</a></p>");
        assert_eq!(targets, [None, None]);
        assert_eq!(codes, ["E_REF_UNRESOLVED", "E_REF_UNRESOLVED"]);
    }

    #[test]
    fn folded_match_reports_the_written_alias() {
        let (doc, collection) = setup("<dfn>Event Loop</dfn><a>event loops</a>");
        let (outcomes, _) = resolve_all(&doc.references, &collection.index, &collection.dropped_scopes, &ResolveOptions::default());
        assert_eq!(
            outcomes,
            [Outcome::Resolved {
                matched: "Event Loop".to_string(),
                record: RecordId(0),
            }]
        );
    }

    #[test]
    fn external_references_stay_quiet() {
        let html = "<p><a data-external>fetch</a> <a>xhr</a> <a>missing</a></p>";
        let options = ResolveOptions {
            external_terms: vec!["xhr".to_string()],
            ..ResolveOptions::default()
        };
        let (targets, codes) = run_with(html, &options);
        assert_eq!(targets, [None, None, None]);
        assert_eq!(codes, ["E_REF_UNRESOLVED"]);
    }

    #[test]
    fn unknown_link_type_is_reported_and_ignored() {
        let (targets, codes) = run("<dfn>term</dfn><a data-link-type=\"bogus\">term</a>");
        assert_eq!(targets, [some("dfn-term")]);
        assert_eq!(codes, ["E_REF_TYPE"]);
    }

    #[test]
    fn same_kind_in_both_classes_is_ambiguous_without_filter() {
        let html = "<pre class=\"idl\">interface Node {};</pre><dfn>Node</dfn><p><a>Node</a> {{Node}} [=Node=]</p>";
        let (targets, codes) = run(html);
        assert_eq!(targets, [None, some("idl-def-node"), some("dfn-node")]);
        assert_eq!(codes, ["E_REF_AMBIGUOUS"]);
    }

    #[test]
    fn resolution_is_deterministic() {
        let html = "<dfn>a</dfn><dfn>a</dfn><a>a</a><a>b</a>";
        assert_eq!(run(html), run(html));
    }
}

/// Core domain types: definition kinds, records, reference requests, outcomes.
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// One-based line and column of a marker in its source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SourceLocation {
    /// One-based column, counted in bytes.
    pub column: u32,
    /// One-based line number.
    pub line: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}:{}", self.line, self.column);
    }
}

/// Closed set of definition types. Marker spelling is the `data-dfn-type` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefinitionKind {
    /// IDL attribute member.
    Attribute,
    /// IDL callback function.
    Callback,
    /// IDL constant member.
    Const,
    /// Plain prose term.
    Dfn,
    /// IDL dictionary member.
    DictMember,
    /// IDL dictionary.
    Dictionary,
    /// IDL enumeration.
    Enum,
    /// A single string value of an IDL enumeration.
    EnumValue,
    /// IDL interface, interface mixin or callback interface.
    Interface,
    /// IDL operation.
    Method,
    /// IDL namespace.
    Namespace,
    /// IDL typedef.
    Typedef,
}

impl DefinitionKind {
    /// Attribute spelling, as accepted by `FromStr`.
    pub const fn as_str(self) -> &'static str {
        return match self {
            Self::Attribute => "attribute",
            Self::Callback => "callback",
            Self::Const => "const",
            Self::Dfn => "dfn",
            Self::DictMember => "dict-member",
            Self::Dictionary => "dictionary",
            Self::Enum => "enum",
            Self::EnumValue => "enum-value",
            Self::Interface => "interface",
            Self::Method => "method",
            Self::Namespace => "namespace",
            Self::Typedef => "typedef",
        };
    }

    /// The uniqueness class this kind belongs to.
    pub const fn class(self) -> KindClass {
        return match self {
            Self::Dfn => KindClass::Concept,
            _ => KindClass::Idl,
        };
    }

    /// Top-level IDL kinds own a scope; members live inside one.
    pub const fn is_idl_member(self) -> bool {
        return matches!(self, Self::Attribute | Self::Const | Self::DictMember | Self::EnumValue | Self::Method);
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.as_str());
    }
}

impl FromStr for DefinitionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s.trim() {
            "attribute" => Ok(Self::Attribute),
            "callback" => Ok(Self::Callback),
            "const" => Ok(Self::Const),
            "dfn" => Ok(Self::Dfn),
            "dict-member" => Ok(Self::DictMember),
            "dictionary" => Ok(Self::Dictionary),
            "enum" => Ok(Self::Enum),
            "enum-value" => Ok(Self::EnumValue),
            "interface" => Ok(Self::Interface),
            "method" => Ok(Self::Method),
            "namespace" => Ok(Self::Namespace),
            "typedef" => Ok(Self::Typedef),
            other => Err(other.to_string()),
        };
    }
}

/// Kinds sharing a class collide when they share scope and key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KindClass {
    /// Plain prose terms.
    Concept,
    /// Every IDL kind.
    Idl,
}

/// How a reference to a definition is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStyle {
    /// References are wrapped in `<code>`.
    Code,
    /// References stay plain text.
    Prose,
}

/// Where a definition record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "source", content = "index")]
pub enum Origin {
    /// Index into the document's IDL declarations.
    Idl(usize),
    /// Index into the document's `<dfn>` markers.
    Marker(usize),
}

/// Index of a record inside a `ResolutionIndex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordId(pub usize);

/// One collected definition. Created during collection, read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct DefinitionRecord {
    /// Every normalized alias, in declaration order. The first is the canonical key.
    pub aliases: Vec<String>,
    /// Participates in cross-document export.
    pub exported: bool,
    /// Fragment id references link to.
    pub id: String,
    /// Definition type.
    pub kind: DefinitionKind,
    /// Where the source marker sits.
    pub location: SourceLocation,
    /// Method short forms (`foo()`, `foo`); indexed but not uniqueness-checked.
    pub loose_aliases: Vec<String>,
    /// The marker or IDL declaration this record was built from.
    pub origin: Origin,
    /// Owning scope (`for`), `None` for global.
    pub scope: Option<String>,
    /// Code or prose rendering for references.
    pub style: RenderStyle,
}

impl DefinitionRecord {
    /// The canonical lookup key.
    pub fn key(&self) -> &str {
        return self.aliases.first().map_or("", String::as_str);
    }

    /// `Scope/key` or `key`, for messages.
    pub fn qualified_name(&self) -> String {
        return match &self.scope {
            Some(scope) => format!("{scope}/{}", self.key()),
            None => self.key().to_string(),
        };
    }
}

/// Type filter a reference may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// `dfn`: plain terms only.
    Concept,
    /// One exact IDL kind.
    Exact(DefinitionKind),
    /// `idl`: any IDL kind.
    Idl,
}

impl LinkType {
    /// Whether a record of `kind` passes this filter.
    pub fn accepts(self, kind: DefinitionKind) -> bool {
        return match self {
            Self::Concept => kind == DefinitionKind::Dfn,
            Self::Exact(exact) => kind == exact,
            Self::Idl => kind.class() == KindClass::Idl,
        };
    }
}

impl FromStr for LinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s.trim() {
            "dfn" => Ok(Self::Concept),
            "idl" => Ok(Self::Idl),
            other => other.parse::<DefinitionKind>().map(Self::Exact),
        };
    }
}

/// A reference marker reduced to what the resolver needs.
#[derive(Debug, Clone)]
pub struct ReferenceRequest {
    /// Unresolved results are acceptable for this reference.
    pub allow_external: bool,
    /// Canonical lookup key.
    pub key: String,
    /// Where the reference sits.
    pub location: SourceLocation,
    /// Explicit scope filter.
    pub scope: Option<String>,
    /// Rendered text of the reference.
    pub text: String,
    /// Explicit type filter.
    pub type_filter: Option<LinkType>,
}

/// Terminal result of resolving one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Several equally-ranked candidates.
    Ambiguous(Vec<RecordId>),
    /// No candidate in any tier.
    Unresolved,
    /// Exactly one candidate.
    Resolved {
        /// The key form that hit the record, as it appears in the index.
        matched: String,
        /// The definition linked to.
        record: RecordId,
    },
}

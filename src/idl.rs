//! IDL namespace collaborator.
//!
//! The resolver only needs to know which names an IDL block declares and
//! what kind each one is. `IdlIndex` gathers that from `<pre class="idl">`
//! blocks with a token walk: top-level definitions, interface and namespace
//! members, dictionary members and enum values. Types, defaults and
//! extended attributes are skipped, not validated.
use std::collections::HashMap;
use std::ops::Range;

use regex::Regex;

use crate::normalize;
use crate::types::DefinitionKind;

/// Read-only view of the names declared in a document's IDL.
pub trait IdlNamespace {
    /// Whether `name` (`Name` or `Scope/member`) is declared.
    fn is_known_idl_name(&self, name: &str) -> bool;

    /// Kind of a declared name, `None` when unknown.
    fn idl_type_of(&self, name: &str) -> Option<DefinitionKind>;
}

/// One declared identifier inside an IDL block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdlDeclaration {
    /// Canonical key: the name, `name(args)` for operations, the bare string for enum values.
    pub key: String,
    /// Declaration kind.
    pub kind: DefinitionKind,
    /// Short forms of an operation key.
    pub loose_aliases: Vec<String>,
    /// Owning definition for members.
    pub scope: Option<String>,
    /// Byte range of the identifier in the document source.
    pub span: Range<usize>,
}

/// Every declaration of a document plus a qualified-name → kind map.
#[derive(Debug, Default)]
pub struct IdlIndex {
    /// Declarations in source order.
    declarations: Vec<IdlDeclaration>,
    /// `Name` or `Scope/member` → kind. Partial definitions register their name here only.
    kinds: HashMap<String, DefinitionKind>,
}

impl IdlIndex {
    /// Scan every block of a document; `blocks` are byte ranges into `source`.
    pub fn from_blocks(source: &str, blocks: &[Range<usize>]) -> Self {
        let mut index = Self::default();
        for block in blocks {
            index.add_block(source.get(block.clone()).unwrap_or(""), block.start);
        }
        return index;
    }

    /// Scan one block's inner text; `base` is the block's byte offset in the document.
    pub fn add_block(&mut self, text: &str, base: usize) {
        let scanner = BlockScanner::new(text, base);
        let (declarations, partial_names) = scanner.scan();
        for (name, kind) in partial_names {
            self.kinds.entry(name).or_insert(kind);
        }
        for declaration in declarations {
            let name = normalize::strip_signature(&declaration.key).to_string();
            let qualified = match &declaration.scope {
                Some(scope) => format!("{scope}/{name}"),
                None => name,
            };
            self.kinds.entry(qualified).or_insert(declaration.kind);
            self.declarations.push(declaration);
        }
    }

    /// Declarations in source order.
    pub fn declarations(&self) -> &[IdlDeclaration] {
        return &self.declarations;
    }
}

impl IdlNamespace for IdlIndex {
    fn is_known_idl_name(&self, name: &str) -> bool {
        return self.kinds.contains_key(name);
    }

    fn idl_type_of(&self, name: &str) -> Option<DefinitionKind> {
        return self.kinds.get(name).copied();
    }
}

// ── Block scanning ─────────────────────────────────────────────────────

/// A lexical token of a sanitized block.
#[derive(Debug, Clone)]
struct Token {
    /// Byte range inside the block text.
    range: Range<usize>,
    /// Token text.
    text: String,
}

impl Token {
    /// Identifiers start with a letter or underscore.
    fn is_ident(&self) -> bool {
        return self.text.starts_with(|c: char| return c.is_ascii_alphabetic() || c == '_');
    }

    /// String literals keep their quotes in `text`.
    fn is_string(&self) -> bool {
        return self.text.starts_with('"');
    }
}

/// Keywords that may precede an operation's return type.
const OPERATION_SPECIALS: [&str; 6] = ["static", "getter", "setter", "deleter", "stringifier", "legacycaller"];

/// Walks the tokens of one block.
struct BlockScanner {
    /// Offset of the block in the document.
    base: usize,
    /// Read position into `tokens`.
    pos: usize,
    /// All tokens of the block.
    tokens: Vec<Token>,
}

impl BlockScanner {
    /// Tokenize `text` after blanking markup, entities, comments and extended attributes.
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded token regex is invalid (compile-time invariant).
    fn new(text: &str, base: usize) -> Self {
        let pattern = Regex::new(r#""[^"]*"|[A-Za-z_][A-Za-z0-9_]*|-?[0-9][0-9A-Za-z.]*|\S"#)
            .expect("valid regex");
        let clean = sanitize(text);
        let tokens = pattern
            .find_iter(&clean)
            .map(|m| return Token { range: m.range(), text: m.as_str().to_string() })
            .collect();
        return Self { base, pos: 0, tokens };
    }

    /// Produce declarations plus names only seen in `partial` definitions.
    fn scan(mut self) -> (Vec<IdlDeclaration>, Vec<(String, DefinitionKind)>) {
        let mut out = Vec::new();
        let mut partials = Vec::new();

        while let Some(token) = self.next() {
            let partial = token.text == "partial";
            let keyword = if partial {
                match self.next() {
                    Some(t) => t,
                    None => break,
                }
            } else {
                token
            };

            match keyword.text.as_str() {
                "interface" | "namespace" => {
                    let kind = if keyword.text == "namespace" {
                        DefinitionKind::Namespace
                    } else {
                        DefinitionKind::Interface
                    };
                    self.skip_if("mixin");
                    self.definition_with_members(kind, partial, &mut out, &mut partials);
                },
                "callback" => {
                    if self.skip_if("interface") {
                        self.definition_with_members(DefinitionKind::Interface, partial, &mut out, &mut partials);
                    } else if let Some(name) = self.next_ident() {
                        out.push(self.declare(&name, DefinitionKind::Callback, None));
                        self.skip_statement();
                    }
                },
                "dictionary" => {
                    self.definition_with_members(DefinitionKind::Dictionary, partial, &mut out, &mut partials);
                },
                "enum" => {
                    let Some(name) = self.next_ident() else { continue };
                    out.push(self.declare(&name, DefinitionKind::Enum, None));
                    self.enum_values(&name.text, &mut out);
                },
                "typedef" => {
                    let statement = self.take_statement();
                    if let Some(name) = statement.iter().rev().find(|t| return t.is_ident()) {
                        out.push(self.declare(name, DefinitionKind::Typedef, None));
                    }
                },
                _ => {},
            }
        }
        return (out, partials);
    }

    /// `Name (: Parent)? { members };` for interfaces, namespaces and dictionaries.
    fn definition_with_members(
        &mut self,
        kind: DefinitionKind,
        partial: bool,
        out: &mut Vec<IdlDeclaration>,
        partials: &mut Vec<(String, DefinitionKind)>,
    ) {
        let Some(name) = self.next_ident() else { return };
        if partial {
            partials.push((name.text.clone(), kind));
        } else {
            out.push(self.declare(&name, kind, None));
        }

        // Skip inheritance up to the body.
        while let Some(token) = self.next() {
            if token.text == "{" {
                break;
            }
            if token.text == ";" {
                return;
            }
        }

        loop {
            let statement = self.take_statement();
            if statement.is_empty() {
                break;
            }
            let declaration = if kind == DefinitionKind::Dictionary {
                self.dictionary_member(&statement, &name.text)
            } else {
                self.interface_member(&statement, &name.text)
            };
            if let Some(declaration) = declaration {
                out.push(declaration);
            }
            if self.peek_is("}") {
                self.pos = self.pos.saturating_add(1);
                self.skip_if(";");
                break;
            }
        }
    }

    /// Classify one interface or namespace member statement.
    fn interface_member(&self, statement: &[Token], scope: &str) -> Option<IdlDeclaration> {
        let first = statement.first()?;
        if first.text == "const" {
            let eq = statement.iter().position(|t| return t.text == "=")?;
            let name = statement.get(..eq)?.iter().rev().find(|t| return t.is_ident())?;
            return Some(self.declare(name, DefinitionKind::Const, Some(scope)));
        }

        if statement.iter().any(|t| return t.text == "attribute") {
            let name = statement.iter().rev().find(|t| return t.is_ident())?;
            return Some(self.declare(name, DefinitionKind::Attribute, Some(scope)));
        }

        let open = top_level_position(statement, "(")?;
        let prefix: Vec<&Token> = statement
            .get(..open)?
            .iter()
            .filter(|t| return t.is_ident() && !OPERATION_SPECIALS.contains(&t.text.as_str()))
            .collect();
        let name = *prefix.last()?;
        let is_constructor = name.text == "constructor" && prefix.len() == 1;
        if prefix.len() < 2 && !is_constructor {
            // Unnamed special operation such as `getter DOMString (unsigned long index)`.
            return None;
        }

        let args = argument_names(statement.get(open.saturating_add(1)..)?);
        let mut declaration = self.declare(name, DefinitionKind::Method, Some(scope));
        declaration.key = format!("{}({})", name.text, args.join(", "));
        declaration.loose_aliases = vec![format!("{}()", name.text), name.text.clone()];
        if declaration.key == format!("{}()", name.text) {
            declaration.loose_aliases.remove(0);
        }
        return Some(declaration);
    }

    /// `required? type name (= default)?`
    fn dictionary_member(&self, statement: &[Token], scope: &str) -> Option<IdlDeclaration> {
        let end = statement.iter().position(|t| return t.text == "=").unwrap_or(statement.len());
        let name = statement.get(..end)?.iter().rev().find(|t| return t.is_ident())?;
        return Some(self.declare(name, DefinitionKind::DictMember, Some(scope)));
    }

    /// String literals up to the closing brace.
    fn enum_values(&mut self, scope: &str, out: &mut Vec<IdlDeclaration>) {
        if !self.skip_if("{") {
            return;
        }
        while let Some(token) = self.next() {
            if token.text == "}" {
                self.skip_if(";");
                return;
            }
            if !token.is_string() {
                continue;
            }
            let inner = token.range.start.saturating_add(1)..token.range.end.saturating_sub(1);
            let value = token.text.trim_matches('"').to_string();
            out.push(IdlDeclaration {
                key: value,
                kind: DefinitionKind::EnumValue,
                loose_aliases: Vec::new(),
                scope: Some(scope.to_string()),
                span: self.absolute(inner),
            });
        }
    }

    /// Build a declaration for an identifier token.
    fn declare(&self, name: &Token, kind: DefinitionKind, scope: Option<&str>) -> IdlDeclaration {
        return IdlDeclaration {
            key: name.text.clone(),
            kind,
            loose_aliases: Vec::new(),
            scope: scope.map(String::from),
            span: self.absolute(name.range.clone()),
        };
    }

    /// Shift a block-relative range into the document.
    fn absolute(&self, range: Range<usize>) -> Range<usize> {
        return self.base.saturating_add(range.start)..self.base.saturating_add(range.end);
    }

    /// Tokens up to the next `;` at nesting depth zero, consuming the `;`.
    /// Stops before an unbalanced `}` so the caller sees the end of a body.
    fn take_statement(&mut self) -> Vec<Token> {
        let mut statement = Vec::new();
        let mut depth = 0_u32;
        while let Some(token) = self.tokens.get(self.pos).cloned() {
            match token.text.as_str() {
                "}" if depth == 0 => return statement,
                ";" if depth == 0 => {
                    self.pos = self.pos.saturating_add(1);
                    return statement;
                },
                "(" | "<" | "{" => depth = depth.saturating_add(1),
                ")" | ">" | "}" => depth = depth.saturating_sub(1),
                _ => {},
            }
            self.pos = self.pos.saturating_add(1);
            statement.push(token);
        }
        return statement;
    }

    /// Discard the rest of the current statement.
    fn skip_statement(&mut self) {
        let _ = self.take_statement();
    }

    /// Next token, advancing.
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos = self.pos.saturating_add(1);
        return Some(token);
    }

    /// Next token when it is an identifier.
    fn next_ident(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?;
        if !token.is_ident() {
            return None;
        }
        return self.next();
    }

    /// Whether the next token is `text`.
    fn peek_is(&self, text: &str) -> bool {
        return self.tokens.get(self.pos).is_some_and(|t| return t.text == text);
    }

    /// Consume the next token when it is `text`.
    fn skip_if(&mut self, text: &str) -> bool {
        if self.peek_is(text) {
            self.pos = self.pos.saturating_add(1);
            return true;
        }
        return false;
    }
}

/// Position of `text` outside any `<…>` generic.
fn top_level_position(tokens: &[Token], text: &str) -> Option<usize> {
    let mut depth = 0_u32;
    for (i, token) in tokens.iter().enumerate() {
        match token.text.as_str() {
            t if t == text && depth == 0 => return Some(i),
            "<" => depth = depth.saturating_add(1),
            ">" => depth = depth.saturating_sub(1),
            _ => {},
        }
    }
    return None;
}

/// Argument names of an operation, given the tokens after its `(`.
fn argument_names(tokens: &[Token]) -> Vec<String> {
    let mut names = Vec::new();
    let mut depth = 0_u32;
    let mut current: Option<&Token> = None;
    let mut in_default = false;

    for token in tokens {
        match token.text.as_str() {
            "(" | "<" | "[" | "{" => depth = depth.saturating_add(1),
            ")" if depth == 0 => break,
            ")" | ">" | "]" | "}" => depth = depth.saturating_sub(1),
            "," if depth == 0 => {
                if let Some(name) = current.take() {
                    names.push(name.text.clone());
                }
                in_default = false;
            },
            "=" if depth == 0 => in_default = true,
            _ if depth == 0 && !in_default && token.is_ident() => current = Some(token),
            _ => {},
        }
    }
    if let Some(name) = current {
        names.push(name.text.clone());
    }
    return names;
}

/// Blank everything that is not IDL while keeping byte offsets: HTML tags,
/// comments and `[extended attributes]` become spaces; `&lt;`/`&gt;` become
/// `<`/`>` padded with spaces.
fn sanitize(text: &str) -> String {
    let mut bytes = text.as_bytes().to_vec();
    blank_between(&mut bytes, b"<", b">");
    for (entity, replacement) in [(&b"&lt;"[..], b'<'), (&b"&gt;"[..], b'>'), (&b"&quot;"[..], b'"'), (&b"&amp;"[..], b'&')] {
        replace_entity(&mut bytes, entity, replacement);
    }
    blank_between(&mut bytes, b"/*", b"*/");
    blank_between(&mut bytes, b"//", b"\n");
    blank_brackets(&mut bytes);
    return String::from_utf8_lossy(&bytes).into_owned();
}

/// Overwrite every `open … close` run (inclusive) with spaces, keeping newlines.
fn blank_between(bytes: &mut [u8], open: &[u8], close: &[u8]) {
    let mut i = 0_usize;
    while i < bytes.len() {
        if !bytes.get(i..).is_some_and(|rest| return rest.starts_with(open)) {
            i = i.saturating_add(1);
            continue;
        }
        let mut end = i.saturating_add(open.len());
        while end < bytes.len() && !bytes.get(end..).is_some_and(|rest| return rest.starts_with(close)) {
            end = end.saturating_add(1);
        }
        // Line comments keep their newline.
        let stop = if close == b"\n" { end } else { end.saturating_add(close.len()).min(bytes.len()) };
        for byte in bytes.iter_mut().take(stop).skip(i) {
            if *byte != b'\n' {
                *byte = b' ';
            }
        }
        i = stop.max(i.saturating_add(1));
    }
}

/// Replace an entity with one byte followed by padding spaces.
fn replace_entity(bytes: &mut [u8], entity: &[u8], replacement: u8) {
    let mut i = 0_usize;
    while i < bytes.len() {
        if bytes.get(i..).is_some_and(|rest| return rest.starts_with(entity)) {
            for (offset, byte) in bytes.iter_mut().skip(i).take(entity.len()).enumerate() {
                *byte = if offset == 0 { replacement } else { b' ' };
            }
            i = i.saturating_add(entity.len());
        } else {
            i = i.saturating_add(1);
        }
    }
}

/// Blank `[ … ]` runs, honoring nesting.
fn blank_brackets(bytes: &mut [u8]) {
    let mut depth = 0_u32;
    for byte in bytes.iter_mut() {
        match *byte {
            b'[' => {
                depth = depth.saturating_add(1);
                *byte = b' ';
            },
            b']' if depth > 0 => {
                depth = depth.saturating_sub(1);
                *byte = b' ';
            },
            b'\n' => {},
            _ if depth > 0 => *byte = b' ',
            _ => {},
        }
    }
}

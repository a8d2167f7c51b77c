//! Canonical lookup keys: whitespace, case, plural forms, alias lists and id slugs.
//!
//! Everything here is pure. Keys are case-sensitive; case folding and
//! singular forms only feed the plain-term fallback tier of the resolver.

/// Trim and collapse internal whitespace runs to a single space.
pub fn normalize(text: &str) -> String {
    return text.split_whitespace().collect::<Vec<_>>().join(" ");
}

/// Lower-cased key for the case-insensitive fallback.
pub fn fold_case(key: &str) -> String {
    return key.to_lowercase();
}

/// Candidate singular forms of a plural key, most specific first.
/// `ies` → `y`, then `es` → ``, then `s` → ``. Never yields an empty key.
pub fn singular_forms(key: &str) -> Vec<String> {
    let mut forms: Vec<String> = Vec::new();
    let rules: [(&str, &str); 3] = [("ies", "y"), ("es", ""), ("s", "")];
    for (suffix, replacement) in rules {
        let Some(stem) = key.strip_suffix(suffix) else {
            continue;
        };
        if stem.is_empty() || stem.ends_with(' ') {
            continue;
        }
        let form = format!("{stem}{replacement}");
        if !forms.contains(&form) {
            forms.push(form);
        }
    }
    return forms;
}

/// Outcome of splitting a `data-lt` value.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AliasList {
    /// Normalized, de-duplicated aliases in written order.
    pub aliases: Vec<String>,
    /// Number of aliases that were empty after normalization.
    pub empty: usize,
}

/// Split a pipe-delimited alias list, normalizing each alias independently.
pub fn parse_alias_list(raw: &str) -> AliasList {
    let mut list = AliasList::default();
    for part in raw.split('|') {
        let alias = normalize(part);
        if alias.is_empty() {
            list.empty = list.empty.saturating_add(1);
            continue;
        }
        if !list.aliases.contains(&alias) {
            list.aliases.push(alias);
        }
    }
    return list;
}

/// Canonicalize an operation key: `foo( a,b )` → `foo(a, b)`.
/// Keys without a trailing argument list are returned normalized but otherwise unchanged.
pub fn normalize_signature(key: &str) -> String {
    let key = normalize(key);
    let Some(open) = key.find('(') else {
        return key;
    };
    if !key.ends_with(')') {
        return key;
    }
    let name = key.get(..open).unwrap_or("").trim_end();
    let inner = key.get(open.saturating_add(1)..key.len().saturating_sub(1)).unwrap_or("");
    let args: Vec<String> = inner
        .split(',')
        .map(normalize)
        .filter(|arg| return !arg.is_empty())
        .collect();
    return format!("{name}({})", args.join(", "));
}

/// The bare operation name of a signature key: `foo(a, b)` → `foo`.
pub fn strip_signature(key: &str) -> &str {
    return match key.find('(') {
        Some(open) => key.get(..open).unwrap_or(key).trim_end(),
        None => key,
    };
}

/// Convert text to a fragment-id slug.
/// Lowercase, non-alphanumeric runs to single hyphens, trimmed edges.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut result = String::with_capacity(lowered.len());
    let mut prev_hyphen = true; // Start true to trim leading hyphens.

    for c in lowered.chars() {
        if c.is_alphanumeric() {
            result.push(c);
            prev_hyphen = false;
            continue;
        }
        if prev_hyphen {
            continue;
        }
        result.push('-');
        prev_hyphen = true;
    }

    if result.ends_with('-') {
        result.pop();
    }
    return result;
}

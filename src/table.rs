//! The definition table: unique (scope, kind class, key) buckets plus the
//! key → records index the resolver searches.
use std::collections::{HashMap, HashSet};

use crate::normalize;
use crate::types::{DefinitionRecord, KindClass, RecordId};

/// Uniqueness bucket of one alias.
type BucketKey = (Option<String>, KindClass, String);

/// Every definition of one document and the lookup structures over them.
/// Vectors keep insertion order so lookups are deterministic.
#[derive(Debug, Default)]
pub struct ResolutionIndex {
    /// Alias bucket → the record that claimed it first.
    buckets: HashMap<BucketKey, RecordId>,
    /// Case-folded key → plain-term records.
    by_folded: HashMap<String, Vec<RecordId>>,
    /// Exact key → records, including loose method aliases.
    by_key: HashMap<String, Vec<RecordId>>,
    /// Records in insertion order; `RecordId` indexes this.
    records: Vec<DefinitionRecord>,
    /// Fragment ids already present in, or generated for, the document.
    used_ids: HashSet<String>,
}

impl ResolutionIndex {
    /// An empty table that will never generate one of `existing_ids`.
    pub fn new(existing_ids: impl IntoIterator<Item = String>) -> Self {
        return Self {
            used_ids: existing_ids.into_iter().collect(),
            ..Self::default()
        };
    }

    /// The record that already owns `alias` in this bucket, if any.
    pub fn claimant(&self, scope: Option<&str>, class: KindClass, alias: &str) -> Option<RecordId> {
        let bucket = (scope.map(String::from), class, alias.to_string());
        return self.buckets.get(&bucket).copied();
    }

    /// Add a record. Only `claimed` aliases (already checked with `claimant`)
    /// and the record's loose aliases become searchable.
    pub fn insert(&mut self, record: DefinitionRecord, claimed: &[String]) -> RecordId {
        let id = RecordId(self.records.len());
        let class = record.kind.class();

        for alias in claimed {
            self.buckets.insert((record.scope.clone(), class, alias.clone()), id);
            push_unique(self.by_key.entry(alias.clone()).or_default(), id);
            if class == KindClass::Concept {
                push_unique(self.by_folded.entry(normalize::fold_case(alias)).or_default(), id);
            }
        }
        for alias in &record.loose_aliases {
            push_unique(self.by_key.entry(alias.clone()).or_default(), id);
        }

        self.used_ids.insert(record.id.clone());
        self.records.push(record);
        return id;
    }

    /// Reserve `base`, or `base-1`, `base-2`, … when taken.
    pub fn allocate_id(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut suffix = 0_u32;
        while self.used_ids.contains(&candidate) {
            suffix = suffix.saturating_add(1);
            candidate = format!("{base}-{suffix}");
        }
        self.used_ids.insert(candidate.clone());
        return candidate;
    }

    /// Records whose claimed or loose aliases equal `key`.
    pub fn exact(&self, key: &str) -> &[RecordId] {
        return self.by_key.get(key).map_or(&[], Vec::as_slice);
    }

    /// Plain-term records whose folded alias equals `folded`.
    pub fn folded(&self, folded: &str) -> &[RecordId] {
        return self.by_folded.get(folded).map_or(&[], Vec::as_slice);
    }

    /// Look up a record.
    ///
    /// # Panics
    ///
    /// Panics on an id from another table.
    #[allow(clippy::indexing_slicing, reason = "RecordId is only minted by insert on this table")]
    pub fn get(&self, id: RecordId) -> &DefinitionRecord {
        return &self.records[id.0];
    }

    /// All records, insertion order.
    pub fn records(&self) -> &[DefinitionRecord] {
        return &self.records;
    }
}

/// Append `id` unless the key already lists it.
fn push_unique(ids: &mut Vec<RecordId>, id: RecordId) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DefinitionKind, Origin, RenderStyle, SourceLocation};

    fn record(key: &str, scope: Option<&str>, kind: DefinitionKind, id: &str) -> DefinitionRecord {
        return DefinitionRecord {
            aliases: vec![key.to_string()],
            exported: false,
            id: id.to_string(),
            kind,
            location: SourceLocation { column: 1, line: 1 },
            loose_aliases: Vec::new(),
            origin: Origin::Marker(0),
            scope: scope.map(String::from),
            style: RenderStyle::Prose,
        };
    }

    #[test]
    fn buckets_separate_scope_and_class() {
        let mut table = ResolutionIndex::new([]);
        let first = table.insert(record("bar", None, DefinitionKind::Dfn, "dfn-bar"), &["bar".into()]);
        assert_eq!(table.claimant(None, KindClass::Concept, "bar"), Some(first));
        assert_eq!(table.claimant(Some("Foo"), KindClass::Concept, "bar"), None);
        assert_eq!(table.claimant(None, KindClass::Idl, "bar"), None);
    }

    #[test]
    fn ids_get_numeric_suffixes() {
        let mut table = ResolutionIndex::new(["dfn-x".to_string()]);
        assert_eq!(table.allocate_id("dfn-x"), "dfn-x-1");
        assert_eq!(table.allocate_id("dfn-x"), "dfn-x-2");
        assert_eq!(table.allocate_id("dfn-y"), "dfn-y");
    }

    #[test]
    fn folded_index_is_concept_only() {
        let mut table = ResolutionIndex::new([]);
        table.insert(record("Widget", None, DefinitionKind::Dfn, "a"), &["Widget".into()]);
        table.insert(record("Thing", None, DefinitionKind::Interface, "b"), &["Thing".into()]);
        assert_eq!(table.folded("widget").len(), 1);
        assert!(table.folded("thing").is_empty());
        assert_eq!(table.exact("Thing").len(), 1);
    }

    #[test]
    fn loose_aliases_are_shared() {
        let mut table = ResolutionIndex::new([]);
        let mut one = record("foo(a)", Some("X"), DefinitionKind::Method, "m1");
        one.loose_aliases = vec!["foo()".into(), "foo".into()];
        let mut two = record("foo(a, b)", Some("X"), DefinitionKind::Method, "m2");
        two.loose_aliases = vec!["foo()".into(), "foo".into()];
        table.insert(one, &["foo(a)".into()]);
        table.insert(two, &["foo(a, b)".into()]);
        assert_eq!(table.exact("foo()").len(), 2);
        assert_eq!(table.exact("foo(a, b)").len(), 1);
    }
}

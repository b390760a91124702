//! Key-based diffs between two tables.
//!
//! Both tables are bucketed by the key fields each of them has. Buckets with
//! the same number of rows on both sides are compared row by row, field by
//! field. Buckets whose sizes differ, or that exist on only one side, are
//! reported as cardinality mismatches without any field comparison.

mod report;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use datatable_error::Result;
use tracing::debug;

use crate::config::EngineConfig;
use crate::hash::GroupKey;
use crate::row::Row;
use crate::table::Table;
use crate::value::Value;

/// Values of one field on both sides of a diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub from: Value,
    pub to: Value,
}

/// Outcome of comparing one key between the two sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    key: GroupKey,
    from_rows: Option<Vec<Row>>,
    to_rows: Option<Vec<Row>>,
    changes: BTreeMap<String, FieldChange>,
}

impl DiffResult {
    /// Compare the rows found for `key` on each side.
    ///
    /// Field changes are only computed when there's exactly one row on each
    /// side. Fields missing from one row compare as null.
    pub fn new(key: GroupKey, from_rows: Option<Vec<Row>>, to_rows: Option<Vec<Row>>) -> Self {
        let mut changes = BTreeMap::new();
        if let (Some([from]), Some([to])) = (from_rows.as_deref(), to_rows.as_deref()) {
            let fields: BTreeSet<&str> = from.headers().chain(to.headers()).collect();
            for field in fields {
                let (f, t) = (from.get_or_null(field), to.get_or_null(field));
                if f != t {
                    changes.insert(
                        field.to_string(),
                        FieldChange {
                            from: f.clone(),
                            to: t.clone(),
                        },
                    );
                }
            }
        }

        DiffResult {
            key,
            from_rows,
            to_rows,
            changes,
        }
    }

    pub fn key(&self) -> &[Value] {
        &self.key
    }

    pub fn from_rows(&self) -> Option<&[Row]> {
        self.from_rows.as_deref()
    }

    pub fn to_rows(&self) -> Option<&[Row]> {
        self.to_rows.as_deref()
    }

    pub fn from_count(&self) -> usize {
        self.from_rows.as_ref().map(Vec::len).unwrap_or(0)
    }

    pub fn to_count(&self) -> usize {
        self.to_rows.as_ref().map(Vec::len).unwrap_or(0)
    }

    /// Fields that differ, keyed by field name.
    pub fn changes(&self) -> &BTreeMap<String, FieldChange> {
        &self.changes
    }

    pub fn change(&self, field: &str) -> Option<&FieldChange> {
        self.changes.get(field)
    }

    /// True when a side is missing or the sides hold different numbers of
    /// rows.
    pub fn is_cardinality_mismatch(&self) -> bool {
        match (&self.from_rows, &self.to_rows) {
            (Some(from), Some(to)) => from.len() != to.len(),
            _ => true,
        }
    }

    /// Whether this result reports anything at all.
    pub fn is_significant(&self) -> bool {
        !self.changes.is_empty() || self.is_cardinality_mismatch()
    }

    /// Forget any change to `field`.
    pub fn ignore_field(&mut self, field: &str) {
        self.changes.remove(field);
    }

    /// Drop the change to `field` if `expected(from, to)` says it is expected.
    pub fn check_remove<F>(&mut self, field: &str, expected: F)
    where
        F: Fn(&Value, &Value) -> bool,
    {
        if let Some(change) = self.changes.get(field) {
            if expected(&change.from, &change.to) {
                self.changes.remove(field);
            }
        }
    }

    /// Drop the changes to all of `fields` at once if `expected` accepts the
    /// from and to values of those fields taken together.
    ///
    /// Only applies when every one of the fields changed. Each row passed to
    /// the predicate holds the values of `fields` for its side.
    pub fn check_remove_multi_field<S, F>(&mut self, fields: &[S], expected: F)
    where
        S: AsRef<str>,
        F: Fn(&Row, &Row) -> bool,
    {
        if fields.is_empty() || !fields.iter().all(|f| self.changes.contains_key(f.as_ref())) {
            return;
        }

        let mut from = Row::with_capacity(fields.len());
        let mut to = Row::with_capacity(fields.len());
        for field in fields {
            let field = field.as_ref();
            if let Some(change) = self.changes.get(field) {
                from.insert(field, change.from.clone());
                to.insert(field, change.to.clone());
            }
        }

        if expected(&from, &to) {
            for field in fields {
                self.changes.remove(field.as_ref());
            }
        }
    }
}

impl fmt::Display for DiffResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, v) in self.key.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        if self.is_cardinality_mismatch() {
            return write!(f, "\tFrom: {}\tTo: {}", self.from_count(), self.to_count());
        }
        for (field, change) in &self.changes {
            write!(f, "\t{field}: {} -> {}", change.from, change.to)?;
        }
        Ok(())
    }
}

/// Significant diff results ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    key_fields: Vec<String>,
    results: BTreeMap<GroupKey, Vec<DiffResult>>,
}

impl ResultSet {
    pub fn new<I, S>(key_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ResultSet {
            key_fields: key_fields.into_iter().map(Into::into).collect(),
            results: BTreeMap::new(),
        }
    }

    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    /// Add a result. Results that report nothing are discarded.
    pub fn push(&mut self, result: DiffResult) {
        if result.is_significant() {
            self.results
                .entry(result.key.clone())
                .or_default()
                .push(result);
        }
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of distinct keys with at least one result.
    pub fn key_count(&self) -> usize {
        self.results.len()
    }

    /// Results in key order.
    pub fn iter(&self) -> impl Iterator<Item = &DiffResult> + '_ {
        self.results.values().flatten()
    }

    pub fn keys(&self) -> impl Iterator<Item = &[Value]> + '_ {
        self.results.keys().map(|k| k.as_slice())
    }

    pub fn get(&self, key: &[Value]) -> Option<&[DiffResult]> {
        self.results.get(key).map(Vec::as_slice)
    }

    pub fn remove(&mut self, key: &[Value]) -> Option<Vec<DiffResult>> {
        self.results.remove(key)
    }

    /// Result set holding only the results accepted by `predicate`.
    pub fn filter<F>(&self, predicate: F) -> ResultSet
    where
        F: Fn(&DiffResult) -> bool,
    {
        let mut out = ResultSet {
            key_fields: self.key_fields.clone(),
            results: BTreeMap::new(),
        };
        for result in self.iter().filter(|r| predicate(*r)) {
            out.push(result.clone());
        }
        out
    }

    /// Forget changes to `field` in every result.
    pub fn ignore_field(&mut self, field: &str) {
        self.update(|r| r.ignore_field(field));
    }

    /// Drop expected changes to `field` from every result.
    pub fn check_remove<F>(&mut self, field: &str, expected: F)
    where
        F: Fn(&Value, &Value) -> bool,
    {
        self.update(|r| r.check_remove(field, &expected));
    }

    /// Drop expected changes to a combination of fields from every result.
    pub fn check_remove_multi_field<S, F>(&mut self, fields: &[S], expected: F)
    where
        S: AsRef<str>,
        F: Fn(&Row, &Row) -> bool,
    {
        self.update(|r| r.check_remove_multi_field(fields, &expected));
    }

    /// Apply `f` to every result, then drop results left reporting nothing.
    fn update<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut DiffResult),
    {
        self.results.retain(|_, results| {
            for result in results.iter_mut() {
                f(result);
            }
            results.retain(DiffResult::is_significant);
            !results.is_empty()
        });
    }

    /// Sorted names of every field with a change in any result.
    pub fn changed_fields(&self) -> Vec<String> {
        let fields: BTreeSet<&String> = self.iter().flat_map(|r| r.changes.keys()).collect();
        fields.into_iter().cloned().collect()
    }

    /// The from side rows of every result, in key order.
    pub fn original_from_rows(&self) -> Table {
        Table::from_rows(self.iter().filter_map(|r| r.from_rows()).flatten().cloned())
    }

    /// The to side rows of every result, in key order.
    pub fn original_to_rows(&self) -> Table {
        Table::from_rows(self.iter().filter_map(|r| r.to_rows()).flatten().cloned())
    }

    pub fn summary(&self) -> String {
        let mismatches = self.iter().filter(|r| r.is_cardinality_mismatch()).count();
        format!(
            "{} results in {} buckets ({} cardinality mismatches, {} changed fields)",
            self.len(),
            self.key_count(),
            mismatches,
            self.changed_fields().len(),
        )
    }

    /// Render the full report using the display settings from `config`.
    pub fn format_with_config(&self, config: &EngineConfig) -> Result<String> {
        report::render(self, config)
    }
}

impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let out = self
            .format_with_config(&EngineConfig::default())
            .map_err(|_| fmt::Error)?;
        write!(f, "{out}")
    }
}

/// Diff two tables keyed on `key_fields`.
///
/// Each table is bucketed by the key fields it actually has, so key fields
/// missing from one side are tolerated.
pub fn diff<S: AsRef<str>>(from: &Table, to: &Table, key_fields: &[S]) -> Result<ResultSet> {
    let from_fields: Vec<&str> = key_fields
        .iter()
        .map(|f| f.as_ref())
        .filter(|f| from.has_header(f))
        .collect();
    let to_fields: Vec<&str> = key_fields
        .iter()
        .map(|f| f.as_ref())
        .filter(|f| to.has_header(f))
        .collect();

    let mut from_buckets = from.bucket(&from_fields)?;
    let mut to_buckets = to.bucket(&to_fields)?;

    let keys: BTreeSet<GroupKey> = from_buckets
        .keys()
        .chain(to_buckets.keys())
        .cloned()
        .collect();

    let mut results = ResultSet::new(key_fields.iter().map(|f| f.as_ref()));
    for key in keys {
        let from_rows = from_buckets.swap_remove(&key).map(Table::into_rows);
        let to_rows = to_buckets.swap_remove(&key).map(Table::into_rows);

        match (from_rows, to_rows) {
            (Some(from_rows), Some(to_rows)) if from_rows.len() == to_rows.len() => {
                for (f, t) in from_rows.into_iter().zip(to_rows) {
                    results.push(DiffResult::new(key.clone(), Some(vec![f]), Some(vec![t])));
                }
            }
            (from_rows, to_rows) => {
                results.push(DiffResult::new(key, from_rows, to_rows));
            }
        }
    }

    debug!(
        from = from.len(),
        to = to.len(),
        results = results.len(),
        buckets = results.key_count(),
        "diffed tables"
    );

    Ok(results)
}

impl Table {
    /// Diff this table against `other` keyed on `key_fields`.
    ///
    /// See [`diff`].
    pub fn diff<S: AsRef<str>>(&self, other: &Table, key_fields: &[S]) -> Result<ResultSet> {
        diff(self, other, key_fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{row, table};

    fn key(values: &[i64]) -> GroupKey {
        values.iter().map(|v| Value::from(*v)).collect()
    }

    #[test]
    fn identical_tables_diff_empty() {
        let t = table!(["id", "v"]; [1, "a"], [2, "b"]);
        let results = diff(&t, &t, &["id"]).unwrap();
        assert!(results.is_empty());
        assert_eq!("No results to compare", results.to_string());
    }

    #[test]
    fn field_changes_and_missing_sides() {
        let from = table!(["id", "v", "w"]; [1, "a", 1], [2, "b", 2], [3, "c", 3]);
        let to = table!(["id", "v", "w"]; [1, "a", 1], [2, "B", 2], [4, "d", 4]);

        let results = diff(&from, &to, &["id"]).unwrap();
        assert_eq!(3, results.len());
        assert_eq!(
            vec![key(&[2]), key(&[3]), key(&[4])],
            results.keys().map(|k| k.to_vec()).collect::<Vec<_>>()
        );

        let changed = &results.get(&key(&[2])).unwrap()[0];
        assert!(!changed.is_cardinality_mismatch());
        assert_eq!(
            Some(&FieldChange {
                from: "b".into(),
                to: "B".into()
            }),
            changed.change("v")
        );
        assert_eq!(1, changed.changes().len());

        let removed = &results.get(&key(&[3])).unwrap()[0];
        assert!(removed.is_cardinality_mismatch());
        assert_eq!((1, 0), (removed.from_count(), removed.to_count()));
        assert!(removed.changes().is_empty());

        assert_eq!(vec!["v".to_string()], results.changed_fields());
    }

    #[test]
    fn bucket_size_mismatch_skips_field_diff() {
        let from = table!(["id", "v"]; [1, "a"], [1, "b"]);
        let to = table!(["id", "v"]; [1, "z"]);
        let results = diff(&from, &to, &["id"]).unwrap();
        let r = &results.get(&key(&[1])).unwrap()[0];
        assert!(r.is_cardinality_mismatch());
        assert!(r.changes().is_empty());
        assert_eq!((2, 1), (r.from_count(), r.to_count()));
    }

    #[test]
    fn equal_sized_buckets_compare_pairwise() {
        let from = table!(["id", "v"]; [1, "a"], [1, "b"]);
        let to = table!(["id", "v"]; [1, "a"], [1, "c"]);
        let results = diff(&from, &to, &["id"]).unwrap();
        assert_eq!(1, results.len());
        assert_eq!(
            Some(&FieldChange {
                from: "b".into(),
                to: "c".into()
            }),
            results.iter().next().unwrap().change("v")
        );
    }

    #[test]
    fn key_fields_missing_from_one_side() {
        let from = table!(["id", "v"]; [1, "a"]);
        let to = table!(["v"]; ["a"]);
        let results = diff(&from, &to, &["id"]).unwrap();
        // Keys [1] and [] never line up.
        assert_eq!(2, results.len());
        assert!(results.iter().all(DiffResult::is_cardinality_mismatch));
    }

    #[test]
    fn check_remove_suppresses_expected_changes() {
        let from = table!(["id", "name", "n"]; [1, "Alice", 1], [2, "Bob", 2]);
        let to = table!(["id", "name", "n"]; [1, "ALICE", 1], [2, "Rob", 2]);
        let mut results = diff(&from, &to, &["id"]).unwrap();
        assert_eq!(2, results.len());

        results.check_remove("name", |f, t| {
            matches!((f.as_str(), t.as_str()), (Some(f), Some(t)) if f.eq_ignore_ascii_case(t))
        });
        assert_eq!(1, results.len());
        assert!(results.get(&key(&[1])).is_none());
        assert!(results.get(&key(&[2])).is_some());

        results.ignore_field("name");
        assert!(results.is_empty());
    }

    #[test]
    fn check_remove_multi_field_on_moved_amounts() {
        let from = table!(["id", "a", "b", "c"]; [1, 10, 5, "x"], [2, 10, 5, "x"]);
        let to = table!(["id", "a", "b", "c"]; [1, 7, 8, "x"], [2, 7, 9, "y"]);
        let mut results = diff(&from, &to, &["id"]).unwrap();

        let total = |r: &Row| {
            r.get_or_null("a")
                .checked_add(r.get_or_null("b"))
                .unwrap_or(Value::Null)
        };
        results.check_remove_multi_field(&["a", "b"], |f, t| total(f) == total(t));

        // Key 1 moved 3 from a to b, key 2 changed the total and c.
        assert!(results.get(&key(&[1])).is_none());
        let r = &results.get(&key(&[2])).unwrap()[0];
        assert_eq!(
            vec!["a", "b", "c"],
            r.changes().keys().map(|k| k.as_str()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn original_rows_and_filter() {
        let from = table!(["id", "v"]; [1, "a"], [2, "b"], [3, "c"]);
        let to = table!(["id", "v"]; [1, "x"], [3, "c"]);
        let results = diff(&from, &to, &["id"]).unwrap();

        assert_eq!(table!(["id", "v"]; [1, "a"], [2, "b"]), results.original_from_rows());
        assert_eq!(table!(["id", "v"]; [1, "x"]), results.original_to_rows());

        let mismatches = results.filter(DiffResult::is_cardinality_mismatch);
        assert_eq!(1, mismatches.len());
        assert_eq!(key(&[2]), mismatches.keys().next().unwrap().to_vec());
    }

    #[test]
    fn remove_by_key() {
        let from = table!(["id", "v"]; [1, "a"], [2, "b"]);
        let to = table!(["id", "v"]; [1, "x"], [2, "y"]);
        let mut results = diff(&from, &to, &["id"]).unwrap();
        let removed = results.remove(&key(&[1])).unwrap();
        assert_eq!(Some(&row! { "id" => 1, "v" => "a" }), removed[0].from_rows().unwrap().first());
        assert_eq!(1, results.key_count());
    }

    #[test]
    fn summary_counts() {
        let from = table!(["id", "v"]; [1, "a"], [2, "b"]);
        let to = table!(["id", "v"]; [1, "x"]);
        let results = diff(&from, &to, &["id"]).unwrap();
        assert_eq!(
            "2 results in 2 buckets (1 cardinality mismatches, 1 changed fields)",
            results.summary()
        );
    }
}

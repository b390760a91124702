//! Multi-level grouping index over rows.
//!
//! A hierarchy maps the values of its first key header to child nodes. Each
//! child is either another hierarchy over the remaining key headers or, at the
//! last key header, a leaf holding the rows' leaf header values. Every path
//! from the root to a leaf is exactly as long as the key header list.
//!
//! Keys are kept in value order at every level, so flattening and display are
//! deterministic.

mod diff;
mod subset;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use datatable_error::{DataTableError, Result, internal};
use tracing::trace;

pub use self::diff::{RESULTS_FIELD, diff_tables};
pub use self::subset::{BranchPredicate, KeyCriterion};
use crate::aggregate::{Aggregations, aggregate_leaf};
use crate::criterion::ColumnMutation;
use crate::format::fixed_width::render_cells;
use crate::format::{FormatOptions, Formatter};
use crate::row::Row;
use crate::table::Table;
use crate::value::Value;

/// Rows at the bottom of a hierarchy path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaf {
    rows: Vec<Row>,
}

impl Leaf {
    pub fn new(rows: Vec<Row>) -> Self {
        Leaf { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Leaf rows for which the predicate returns true.
    pub fn filter<F>(&self, predicate: F) -> Leaf
    where
        F: Fn(&Row) -> bool,
    {
        Leaf {
            rows: self.rows.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }

    pub fn project(&self, headers: &BTreeSet<String>) -> Leaf {
        Leaf {
            rows: self
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .filter(|(h, _)| headers.contains(*h))
                        .map(|(h, v)| (h, v.clone()))
                        .collect()
                })
                .collect(),
        }
    }

    /// Every pairing of a row from this leaf with a row from `other`, merged.
    pub fn merge(&self, other: &Leaf) -> Leaf {
        Leaf {
            rows: self
                .rows
                .iter()
                .flat_map(|left| other.rows.iter().map(move |right| left.merge(right)))
                .collect(),
        }
    }

    pub fn merge_in_place(&mut self, other: &Leaf) {
        *self = self.merge(other);
    }

    fn rename_headers(&mut self, renames: &BTreeMap<String, String>) {
        for row in &mut self.rows {
            for (from, to) in renames {
                row.rename(from, to.as_str());
            }
        }
    }
}

/// A child of a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Branch(Hierarchy),
    Leaf(Leaf),
}

impl Node {
    /// Total number of leaf rows below this node.
    pub fn len(&self) -> usize {
        match self {
            Node::Branch(h) => h.len(),
            Node::Leaf(l) => l.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_branch(&self) -> Option<&Hierarchy> {
        match self {
            Node::Branch(h) => Some(h),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Node::Leaf(l) => Some(l),
            Node::Branch(_) => None,
        }
    }

    fn merge_in_place(&mut self, other: &Node) -> Result<()> {
        match (self, other) {
            (Node::Branch(left), Node::Branch(right)) => left.merge_in_place(right),
            (Node::Leaf(left), Node::Leaf(right)) => {
                left.merge_in_place(right);
                Ok(())
            }
            _ => Err(internal!("hierarchy depths differ at the same key")),
        }
    }

    /// Give every level below this node the same leaf headers, filling leaf
    /// rows with nulls where they lack one.
    fn conform(&mut self, headers: &BTreeSet<String>) {
        match self {
            Node::Branch(h) => {
                h.leaf_headers = headers.clone();
                for child in h.children.values_mut() {
                    child.conform(headers);
                }
            }
            Node::Leaf(leaf) => {
                for row in &mut leaf.rows {
                    for header in headers {
                        if !row.contains(header) {
                            row.insert(header.as_str(), Value::Null);
                        }
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    key_headers: Vec<String>,
    leaf_headers: BTreeSet<String>,
    children: BTreeMap<Value, Node>,
}

impl Hierarchy {
    /// Create an empty hierarchy.
    ///
    /// Key headers define the depth and must be non-empty and unique. Leaf
    /// headers are the fields kept in leaf rows.
    pub fn new<K, L, S1, S2>(key_headers: K, leaf_headers: L) -> Result<Self>
    where
        K: IntoIterator<Item = S1>,
        L: IntoIterator<Item = S2>,
        S1: Into<String>,
        S2: Into<String>,
    {
        let key_headers: Vec<String> = key_headers.into_iter().map(Into::into).collect();
        if key_headers.is_empty() {
            return Err(DataTableError::InvalidKeyPath(
                "hierarchy needs at least one key header".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for key in &key_headers {
            if !seen.insert(key.as_str()) {
                return Err(DataTableError::InvalidKeyPath(format!(
                    "key header '{key}' repeated"
                )));
            }
        }

        Ok(Hierarchy {
            key_headers,
            leaf_headers: leaf_headers.into_iter().map(Into::into).collect(),
            children: BTreeMap::new(),
        })
    }

    /// Hierarchy holding a single row. Leaf headers default to the row's
    /// non-key headers.
    pub fn from_row<S: AsRef<str>>(row: &Row, keys: &[S], leaves: Option<&[S]>) -> Result<Self> {
        let mut h = Self::with_default_leaves(row.headers(), keys, leaves)?;
        h.add_values(row)?;
        Ok(h)
    }

    /// Index every row of a table. Leaf headers default to the table's
    /// non-key headers.
    pub fn from_table<S: AsRef<str>>(table: &Table, keys: &[S], leaves: Option<&[S]>) -> Result<Self> {
        let mut h = Self::with_default_leaves(table.headers(), keys, leaves)?;
        for row in table.rows() {
            h.add_values(row)?;
        }
        trace!(rows = table.len(), keys = ?h.key_headers, "indexed table");
        Ok(h)
    }

    fn with_default_leaves<'a, S: AsRef<str>>(
        headers: impl Iterator<Item = &'a str>,
        keys: &[S],
        leaves: Option<&[S]>,
    ) -> Result<Self> {
        let keys: Vec<&str> = keys.iter().map(|k| k.as_ref()).collect();
        match leaves {
            Some(leaves) => Self::new(keys, leaves.iter().map(|l| l.as_ref())),
            None => {
                let leaves: Vec<&str> = headers.filter(|h| !keys.contains(h)).collect();
                Self::new(keys, leaves)
            }
        }
    }

    /// Same shape as `self` with no children.
    fn empty_like(&self) -> Hierarchy {
        Hierarchy {
            key_headers: self.key_headers.clone(),
            leaf_headers: self.leaf_headers.clone(),
            children: BTreeMap::new(),
        }
    }

    /// Add a row, creating nodes along its key path as needed.
    ///
    /// Every key header must be present in the row. Missing leaf headers are
    /// stored as null.
    pub fn add_values(&mut self, row: &Row) -> Result<()> {
        let path = row.key(&self.key_headers)?;
        let leaf_row: Row = self
            .leaf_headers
            .iter()
            .map(|h| (h.as_str(), row.get_or_null(h).clone()))
            .collect();
        self.insert_path(&path, leaf_row)
    }

    fn insert_path(&mut self, path: &[Value], leaf_row: Row) -> Result<()> {
        let Some((key, rest)) = path.split_first() else {
            return Err(internal!("empty key path"));
        };

        if rest.is_empty() {
            let node = self
                .children
                .entry(key.clone())
                .or_insert_with(|| Node::Leaf(Leaf::default()));
            return match node {
                Node::Leaf(leaf) => {
                    leaf.rows.push(leaf_row);
                    Ok(())
                }
                Node::Branch(_) => Err(internal!("branch found at leaf depth")),
            };
        }

        let child_keys = &self.key_headers[1..];
        let leaf_headers = &self.leaf_headers;
        let node = self.children.entry(key.clone()).or_insert_with(|| {
            Node::Branch(Hierarchy {
                key_headers: child_keys.to_vec(),
                leaf_headers: leaf_headers.clone(),
                children: BTreeMap::new(),
            })
        });
        match node {
            Node::Branch(h) => h.insert_path(rest, leaf_row),
            Node::Leaf(_) => Err(internal!("leaf found above leaf depth")),
        }
    }

    pub fn key_headers(&self) -> &[String] {
        &self.key_headers
    }

    pub fn leaf_headers(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.leaf_headers.iter().map(|h| h.as_str())
    }

    /// Number of key levels.
    pub fn depth(&self) -> usize {
        self.key_headers.len()
    }

    /// Keys at this level, in value order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &Value> + '_ {
        self.children.keys()
    }

    pub fn get(&self, key: &Value) -> Option<&Node> {
        self.children.get(key)
    }

    /// Walk down one key per level.
    pub fn get_path(&self, path: &[Value]) -> Option<&Node> {
        let (key, rest) = path.split_first()?;
        let node = self.children.get(key)?;
        if rest.is_empty() {
            return Some(node);
        }
        node.as_branch()?.get_path(rest)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.children.contains_key(key)
    }

    /// Remove the node for a key at this level.
    pub fn remove(&mut self, key: &Value) -> Option<Node> {
        self.children.remove(key)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&Value, &Node)> + '_ {
        self.children.iter()
    }

    /// Total number of leaf rows.
    pub fn len(&self) -> usize {
        self.children.values().map(Node::len).sum()
    }

    /// Returns true if there are no keys at this level.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of leaf rows under each key at this level.
    pub fn size_of_groups(&self) -> BTreeMap<Value, usize> {
        self.children
            .iter()
            .map(|(k, node)| (k.clone(), node.len()))
            .collect()
    }

    /// Recursively merge `other` into a copy of this hierarchy.
    ///
    /// Keys present on both sides are merged, leaves by pairing every row on
    /// one side with every row on the other. Keys present on one side are
    /// copied.
    pub fn merge(&self, other: &Hierarchy) -> Result<Hierarchy> {
        let mut out = self.clone();
        out.merge_in_place(other)?;
        Ok(out)
    }

    pub fn merge_in_place(&mut self, other: &Hierarchy) -> Result<()> {
        if self.key_headers != other.key_headers {
            return Err(DataTableError::IncompatibleHierarchyMerge {
                left: self.key_headers.clone(),
                right: other.key_headers.clone(),
            });
        }

        self.leaf_headers.extend(other.leaf_headers.iter().cloned());
        for (key, node) in &other.children {
            match self.children.get_mut(key) {
                Some(existing) => existing.merge_in_place(node)?,
                None => {
                    self.children.insert(key.clone(), node.clone());
                }
            }
        }

        let headers = self.leaf_headers.clone();
        for child in self.children.values_mut() {
            child.conform(&headers);
        }
        Ok(())
    }

    /// Collapse every leaf into a single row of aggregate values.
    ///
    /// The output has the same keys with the aggregate names as leaf headers.
    /// Aggregates over a key header use the key value directly where they can
    /// (see `AggregateMethod::fixed_by_key`). With no aggregates the keys are
    /// kept and every leaf row becomes an empty row.
    pub fn aggregate(&self, aggregations: &Aggregations) -> Result<Hierarchy> {
        self.aggregate_with_key(aggregations, &Row::new())
    }

    fn aggregate_with_key(&self, aggregations: &Aggregations, parent: &Row) -> Result<Hierarchy> {
        let mut out = Hierarchy {
            key_headers: self.key_headers.clone(),
            leaf_headers: aggregations.names().map(|n| n.to_string()).collect(),
            children: BTreeMap::new(),
        };

        for (key, node) in &self.children {
            let mut key_row = parent.clone();
            key_row.insert(self.key_headers[0].as_str(), key.clone());

            let child = match node {
                Node::Branch(h) => Node::Branch(h.aggregate_with_key(aggregations, &key_row)?),
                Node::Leaf(leaf) if aggregations.is_empty() => {
                    if leaf.is_empty() {
                        continue;
                    }
                    Node::Leaf(leaf.project(&BTreeSet::new()))
                }
                Node::Leaf(leaf) => match aggregate_leaf(aggregations, &key_row, &leaf.rows)? {
                    Some(row) => Node::Leaf(Leaf::new(vec![row])),
                    None => continue,
                },
            };
            out.children.insert(key.clone(), child);
        }

        Ok(out)
    }

    /// Flatten into rows, depth first in key order. Each row is a leaf row
    /// plus the values of every key on its path.
    pub fn rows(&self) -> Vec<Row> {
        let mut out = Vec::with_capacity(self.len());
        self.collect_rows(&Row::new(), &mut out);
        out
    }

    fn collect_rows(&self, parent: &Row, out: &mut Vec<Row>) {
        for (key, node) in &self.children {
            let mut key_row = parent.clone();
            key_row.insert(self.key_headers[0].as_str(), key.clone());
            match node {
                Node::Branch(h) => h.collect_rows(&key_row, out),
                Node::Leaf(leaf) => out.extend(leaf.rows.iter().map(|row| row.merge(&key_row))),
            }
        }
    }

    /// Flatten into a table with key and leaf headers.
    pub fn to_table(&self) -> Table {
        let headers = self
            .key_headers
            .iter()
            .chain(&self.leaf_headers)
            .cloned()
            .collect();
        Table::from_parts(headers, self.rows())
    }

    /// Rebuild with different key headers. Leaf headers default to every
    /// current header that isn't one of the new keys.
    pub fn reindex<S: AsRef<str>>(&self, keys: &[S], leaves: Option<&[S]>) -> Result<Hierarchy> {
        let current: Vec<&str> = self
            .key_headers
            .iter()
            .chain(&self.leaf_headers)
            .map(|h| h.as_str())
            .collect();
        let mut out = Self::with_default_leaves(current.into_iter(), keys, leaves)?;
        for row in self.rows() {
            out.add_values(&row)?;
        }
        Ok(out)
    }

    /// Add or overwrite leaf columns, applying mutations in order to every
    /// flattened row.
    pub fn extend<I, S>(&self, mutations: I) -> Result<Hierarchy>
    where
        I: IntoIterator<Item = (S, ColumnMutation)>,
        S: Into<String>,
    {
        let mutations: Vec<(String, ColumnMutation)> = mutations
            .into_iter()
            .map(|(h, m)| (h.into(), m))
            .collect();

        let mut out = self.empty_like();
        out.leaf_headers
            .extend(mutations.iter().map(|(h, _)| h.clone()));

        for mut row in self.rows() {
            for (header, mutation) in &mutations {
                let value = mutation.apply(&row)?;
                row.insert(header.as_str(), value);
            }
            out.add_values(&row)?;
        }
        Ok(out)
    }

    /// Keep only the given leaf headers. Unknown headers are ignored.
    pub fn project<I, S>(&self, leaf_headers: I) -> Hierarchy
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let headers: BTreeSet<String> = leaf_headers
            .into_iter()
            .filter(|h| self.leaf_headers.contains(h.as_ref()))
            .map(|h| h.as_ref().to_string())
            .collect();
        self.project_inner(&headers)
    }

    fn project_inner(&self, headers: &BTreeSet<String>) -> Hierarchy {
        Hierarchy {
            key_headers: self.key_headers.clone(),
            leaf_headers: headers.clone(),
            children: self
                .children
                .iter()
                .map(|(k, node)| {
                    let node = match node {
                        Node::Branch(h) => Node::Branch(h.project_inner(headers)),
                        Node::Leaf(l) => Node::Leaf(l.project(headers)),
                    };
                    (k.clone(), node)
                })
                .collect(),
        }
    }

    /// Rename key and leaf headers in place.
    pub fn rename_headers<I, S1, S2>(&mut self, renames: I)
    where
        I: IntoIterator<Item = (S1, S2)>,
        S1: Into<String>,
        S2: Into<String>,
    {
        let renames: BTreeMap<String, String> = renames
            .into_iter()
            .map(|(from, to)| (from.into(), to.into()))
            .collect();
        self.rename_inner(&renames);
    }

    pub fn renamed<I, S1, S2>(&self, renames: I) -> Hierarchy
    where
        I: IntoIterator<Item = (S1, S2)>,
        S1: Into<String>,
        S2: Into<String>,
    {
        let mut out = self.clone();
        out.rename_headers(renames);
        out
    }

    fn rename_inner(&mut self, renames: &BTreeMap<String, String>) {
        let rename = |h: &String| renames.get(h).unwrap_or(h).clone();
        self.key_headers = self.key_headers.iter().map(rename).collect();
        self.leaf_headers = self.leaf_headers.iter().map(rename).collect();
        for node in self.children.values_mut() {
            match node {
                Node::Branch(h) => h.rename_inner(renames),
                Node::Leaf(l) => l.rename_headers(renames),
            }
        }
    }

    /// Render as fixed-width text. Key columns come first, in key order,
    /// followed by the sorted leaf headers. A key is only printed on the first
    /// line of its subtree.
    pub fn to_fixed_width(&self, options: &FormatOptions) -> Result<String> {
        let formatter = Formatter::new(options.clone());
        let headers: Vec<&str> = self
            .key_headers
            .iter()
            .chain(&self.leaf_headers)
            .map(|h| h.as_str())
            .collect();

        let mut lines = Vec::with_capacity(self.len());
        self.collect_lines(&formatter, &mut Vec::new(), &mut lines);
        render_cells(&headers, &lines)
    }

    fn collect_lines(
        &self,
        formatter: &Formatter,
        prefix: &mut Vec<String>,
        lines: &mut Vec<Vec<String>>,
    ) {
        for (key, node) in &self.children {
            prefix.push(formatter.format_value(key).to_string());
            match node {
                Node::Branch(h) => h.collect_lines(formatter, prefix, lines),
                Node::Leaf(leaf) => {
                    for row in &leaf.rows {
                        let mut line = prefix.clone();
                        line.extend(
                            self.leaf_headers
                                .iter()
                                .map(|h| formatter.format_value(row.get_or_null(h)).to_string()),
                        );
                        lines.push(line);
                        // Only the first line of a subtree shows its keys.
                        for cell in prefix.iter_mut() {
                            cell.clear();
                        }
                    }
                }
            }
            prefix.pop();
        }
    }
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let out = self
            .to_fixed_width(&FormatOptions::new())
            .map_err(|_| fmt::Error)?;
        write!(f, "{out}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Count, Sum};
    use crate::table;

    fn sample() -> Table {
        table!(["a", "b", "c"];
            [10023, 25.3, 52],
            [10023, 25.3, 156],
            [10023, 4.125, 48],
            [10023, 65.8, 52],
            [10024, 2.8, 23],
            [10024, 2.8, 31],
        )
    }

    #[test]
    fn structure_from_table() {
        let h = sample().index(&["a", "b"], None).unwrap();
        assert_eq!(2, h.depth());
        assert_eq!(6, h.len());
        assert_eq!(vec![&Value::from(10023), &Value::from(10024)], h.keys().collect::<Vec<_>>());

        let node = h
            .get_path(&[Value::from(10023), Value::from(25.3)])
            .unwrap();
        assert_eq!(2, node.len());
        assert!(node.as_leaf().is_some());

        let sizes = h.size_of_groups();
        assert_eq!(Some(&4), sizes.get(&Value::from(10023)));
        assert_eq!(Some(&2), sizes.get(&Value::from(10024)));
    }

    #[test]
    fn invalid_key_headers() {
        assert!(matches!(
            Hierarchy::new(Vec::<String>::new(), ["x"]),
            Err(DataTableError::InvalidKeyPath(_))
        ));
        assert!(matches!(
            Hierarchy::new(["a", "a"], ["x"]),
            Err(DataTableError::InvalidKeyPath(_))
        ));
    }

    #[test]
    fn missing_key_field() {
        let mut h = Hierarchy::new(["a"], ["b"]).unwrap();
        let err = h.add_values(&crate::row! { "b" => 1 }).unwrap_err();
        assert!(matches!(err, DataTableError::MissingField(_)));
    }

    #[test]
    fn flatten_round_trip() {
        let t = sample();
        let h = t.index(&["b"], None).unwrap();
        let flat = h.to_table();
        assert_eq!(t.sorted(&["b", "a", "c"]).unwrap(), flat.sorted(&["b", "a", "c"]).unwrap());
        // Keys come out in value order.
        let bs: Vec<_> = flat.column("b").unwrap().values().cloned().collect();
        let mut sorted = bs.clone();
        sorted.sort();
        assert_eq!(sorted, bs);
    }

    #[test]
    fn merge_unions_and_pairs_leaves() {
        let left = table!(["k", "x"]; [1, "a"], [2, "b"]).index(&["k"], None).unwrap();
        let right = table!(["k", "y"]; [2, "c"], [3, "d"]).index(&["k"], None).unwrap();

        let merged = left.merge(&right).unwrap();
        assert_eq!(vec!["x", "y"], merged.leaf_headers().collect::<Vec<_>>());
        assert_eq!(
            table!(["k", "x", "y"];
                [1, "a", Value::Null],
                [2, "b", "c"],
                [3, Value::Null, "d"],
            ),
            merged.to_table()
        );

        let mut in_place = left.clone();
        in_place.merge_in_place(&right).unwrap();
        assert_eq!(merged, in_place);
    }

    #[test]
    fn merge_rejects_different_keys() {
        let left = sample().index(&["a"], None).unwrap();
        let right = sample().index(&["b"], None).unwrap();
        assert!(matches!(
            left.merge(&right),
            Err(DataTableError::IncompatibleHierarchyMerge { .. })
        ));
    }

    #[test]
    fn aggregate_collapses_leaves() {
        let h = sample().index(&["a"], None).unwrap();
        let aggs = Aggregations::new()
            .with("n", Count)
            .with("total", Sum::new("c"))
            .with("a_sum", Sum::new("a"));
        let out = h.aggregate(&aggs).unwrap();

        assert_eq!(
            table!(["a", "a_sum", "n", "total"];
                [10023, 40092, 4, 308],
                [10024, 20048, 2, 54],
            ),
            out.to_table()
        );
    }

    #[test]
    fn weighted_average_of_key_respects_weights() {
        use crate::aggregate::WeightedAverage;

        let t = table!(["k", "w"]; [1, 2], [1, 3], [2, 0], [2, 0]);
        let h = t.index(&["k"], None).unwrap();
        let out = h
            .aggregate(&Aggregations::new().with("avg", WeightedAverage::new("k", "w")))
            .unwrap();
        assert_eq!(
            table!(["k", "avg"]; [1, 1], [2, Value::Null]),
            out.to_table()
        );
    }

    #[test]
    fn aggregate_without_aggregates_keeps_paths() {
        let h = sample().index(&["a", "b"], None).unwrap();
        let out = h.aggregate(&Aggregations::new()).unwrap();
        // One empty row per input row, same as reindexing with no leaves.
        assert_eq!(6, out.len());
        assert_eq!(0, out.leaf_headers().len());
        assert_eq!(out, h.reindex(&["a", "b"], Some(&[][..])).unwrap());
    }

    #[test]
    fn reindex_swaps_levels() {
        let h = sample().index(&["a", "b"], None).unwrap();
        let r = h.reindex(&["c"], None).unwrap();
        assert_eq!(vec!["a", "b"], r.leaf_headers().collect::<Vec<_>>());
        assert_eq!(
            vec![23, 31, 48, 52, 156],
            r.keys().filter_map(|k| k.as_i64()).collect::<Vec<_>>()
        );
        assert_eq!(Some(&2), r.size_of_groups().get(&Value::from(52)));
    }

    #[test]
    fn extend_project_rename() {
        let h = table!(["k", "v"]; [1, 10], [2, 20]).index(&["k"], None).unwrap();
        let h = h
            .extend([("double", ColumnMutation::try_row_fn(|row| {
                row.get_or_null("v").checked_mul(&Value::from(2))
            }))])
            .unwrap();
        assert_eq!(vec!["double", "v"], h.leaf_headers().collect::<Vec<_>>());

        let h = h.project(["double", "nope"]);
        let h = h.renamed([("k", "key"), ("double", "twice")]);
        assert_eq!(
            table!(["key", "twice"]; [1, 20], [2, 40]),
            h.to_table()
        );
    }

    #[test]
    fn extend_error_propagates() {
        let h = table!(["k", "v"]; [1, 10], [2, "x"]).index(&["k"], None).unwrap();
        let err = h
            .extend([("neg", ColumnMutation::try_row_fn(|row| {
                Value::from(0).checked_sub(row.get_or_null("v"))
            }))])
            .unwrap_err();
        assert!(matches!(err, DataTableError::TypeMismatch(_)), "{err}");
    }

    #[test]
    fn display_blanks_repeated_keys() {
        let h = table!(["a", "b", "c"]; [1, "x", 5], [1, "x", 6], [2, "y", 7])
            .index(&["a", "b"], None)
            .unwrap();
        let expected = "\
a b c
1 x 5
    6
2 y 7";
        assert_eq!(expected, h.to_string());
    }
}

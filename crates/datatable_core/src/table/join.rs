use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use datatable_error::{DataTableError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::Table;
use crate::config::EngineConfig;
use crate::hash::{KeyMap, KeySet, new_key_map, new_key_set};
use crate::row::Row;
use crate::value::Value;

/// Which unmatched rows a join keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    #[default]
    Left,
    Right,
    Full,
}

impl JoinType {
    pub const fn new(include_unmatched_left: bool, include_unmatched_right: bool) -> Self {
        match (include_unmatched_left, include_unmatched_right) {
            (false, false) => JoinType::Inner,
            (true, false) => JoinType::Left,
            (false, true) => JoinType::Right,
            (true, true) => JoinType::Full,
        }
    }

    /// If unmatched rows from the left (self) side are emitted.
    pub const fn include_unmatched_left(&self) -> bool {
        matches!(self, JoinType::Left | JoinType::Full)
    }

    /// If unmatched rows from the right (other) side are emitted.
    pub const fn include_unmatched_right(&self) -> bool {
        matches!(self, JoinType::Right | JoinType::Full)
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner => write!(f, "INNER"),
            Self::Left => write!(f, "LEFT"),
            Self::Right => write!(f, "RIGHT"),
            Self::Full => write!(f, "FULL"),
        }
    }
}

impl FromStr for JoinType {
    type Err = DataTableError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace(['_', '-'], " ");
        let normalized = normalized
            .strip_suffix(" OUTER")
            .unwrap_or(&normalized);
        match normalized {
            "INNER" => Ok(JoinType::Inner),
            "LEFT" => Ok(JoinType::Left),
            "RIGHT" => Ok(JoinType::Right),
            "FULL" => Ok(JoinType::Full),
            _ => Err(DataTableError::InvalidJoinSpecification(format!(
                "unknown join type: {s}"
            ))),
        }
    }
}

/// Parameters for `Table::join`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinOptions {
    /// Pairs of (self field, other field). `None` joins on shared headers.
    pub keys: Option<Vec<(String, String)>>,
    /// Prefix added to other's non-key headers in the output.
    pub other_prefix: String,
    pub join_type: JoinType,
}

impl JoinOptions {
    /// Natural join on shared headers.
    pub fn natural(join_type: JoinType) -> Self {
        JoinOptions {
            keys: None,
            other_prefix: String::new(),
            join_type,
        }
    }

    /// Join on explicit (self field, other field) pairs.
    pub fn on<I, L, R>(keys: I, join_type: JoinType) -> Self
    where
        I: IntoIterator<Item = (L, R)>,
        L: Into<String>,
        R: Into<String>,
    {
        JoinOptions {
            keys: Some(
                keys.into_iter()
                    .map(|(l, r)| (l.into(), r.into()))
                    .collect(),
            ),
            other_prefix: String::new(),
            join_type,
        }
    }

    /// Natural join using the configured default join type.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::natural(config.default_join_type)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.other_prefix = prefix.into();
        self
    }

    pub fn with_join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = join_type;
        self
    }
}

/// Resolve the key mapping, validating explicit mappings.
fn resolve_keys(
    left_headers: &BTreeSet<String>,
    right_headers: &BTreeSet<String>,
    keys: Option<&[(String, String)]>,
) -> Result<Vec<(String, String)>> {
    let Some(keys) = keys else {
        return Ok(left_headers
            .intersection(right_headers)
            .map(|h| (h.clone(), h.clone()))
            .collect());
    };

    let mut left_seen = BTreeSet::new();
    let mut right_seen = BTreeSet::new();
    for (left, right) in keys {
        if left.is_empty() || right.is_empty() {
            return Err(DataTableError::InvalidJoinSpecification(
                "join fields cannot be empty".to_string(),
            ));
        }
        if !left_seen.insert(left.as_str()) {
            return Err(DataTableError::InvalidJoinSpecification(format!(
                "field '{left}' mapped more than once"
            )));
        }
        if !right_seen.insert(right.as_str()) {
            return Err(DataTableError::InvalidJoinSpecification(format!(
                "other field '{right}' mapped more than once"
            )));
        }
        if !left_headers.is_empty() && !left_headers.contains(left) {
            return Err(DataTableError::missing_field(left.as_str()));
        }
        if !right_headers.is_empty() && !right_headers.contains(right) {
            return Err(DataTableError::missing_field(right.as_str()));
        }
    }

    Ok(keys.to_vec())
}

/// Hash join state: an index over the right side plus the set of keys seen on
/// the left side.
///
/// Left rows are probed one at a time so the same state drives both table and
/// stream joins.
#[derive(Debug)]
pub(crate) struct HashJoiner<'a> {
    right: &'a Table,
    left_keys: Vec<String>,
    right_keys: Vec<String>,
    /// (right header, output header) for right's non-key fields.
    payload: Vec<(String, String)>,
    /// Left headers that aren't keys, nulled for unmatched right rows.
    left_non_keys: Vec<String>,
    output_headers: BTreeSet<String>,
    join_type: JoinType,
    index: KeyMap<Vec<usize>>,
    seen: KeySet,
}

impl<'a> HashJoiner<'a> {
    pub(crate) fn try_new(
        left_headers: &BTreeSet<String>,
        right: &'a Table,
        opts: &JoinOptions,
    ) -> Result<Self> {
        let keys = resolve_keys(left_headers, &right.headers, opts.keys.as_deref())?;
        let (left_keys, right_keys): (Vec<_>, Vec<_>) = keys.into_iter().unzip();

        let payload: Vec<(String, String)> = right
            .headers
            .iter()
            .filter(|h| !right_keys.contains(*h))
            .map(|h| (h.clone(), format!("{}{h}", opts.other_prefix)))
            .collect();
        let left_non_keys: Vec<String> = left_headers
            .iter()
            .filter(|h| !left_keys.contains(*h))
            .cloned()
            .collect();

        let mut output_headers = left_headers.clone();
        output_headers.extend(left_keys.iter().cloned());
        output_headers.extend(payload.iter().map(|(_, out)| out.clone()));

        let mut index = new_key_map::<Vec<usize>>();
        for (idx, row) in right.rows.iter().enumerate() {
            index.entry(row.key(&right_keys)?).or_default().push(idx);
        }

        debug!(
            join_type = %opts.join_type,
            ?left_keys,
            ?right_keys,
            buckets = index.len(),
            "built join index"
        );

        Ok(HashJoiner {
            right,
            left_keys,
            right_keys,
            payload,
            left_non_keys,
            output_headers,
            join_type: opts.join_type,
            index,
            seen: new_key_set(),
        })
    }

    pub(crate) fn output_headers(&self) -> &BTreeSet<String> {
        &self.output_headers
    }

    /// Forget probed keys so the index can drive another pass over the left
    /// side.
    pub(crate) fn reset(&mut self) {
        self.seen.clear();
    }

    /// Join a single left row, pushing any output rows.
    pub(crate) fn probe(&mut self, row: &Row, out: &mut Vec<Row>) -> Result<()> {
        let key = row.key(&self.left_keys)?;
        match self.index.get(&key) {
            Some(matches) => {
                for &idx in matches {
                    let right = &self.right.rows[idx];
                    let mut joined = row.clone();
                    for (header, out_header) in &self.payload {
                        joined.insert(out_header.as_str(), right.get_or_null(header).clone());
                    }
                    out.push(joined);
                }
            }
            None if self.join_type.include_unmatched_left() => {
                let mut joined = row.clone();
                for (_, out_header) in &self.payload {
                    joined.insert(out_header.as_str(), Value::Null);
                }
                out.push(joined);
            }
            None => trace!(?key, "dropping unmatched left row"),
        }
        self.seen.insert(key);
        Ok(())
    }

    /// Emit right rows whose keys were never seen on the left, if the join
    /// type asks for them.
    pub(crate) fn finish(&self, out: &mut Vec<Row>) {
        if !self.join_type.include_unmatched_right() {
            return;
        }
        for right in &self.right.rows {
            let key = right.key_or_null(&self.right_keys);
            if self.seen.contains(&key) {
                continue;
            }
            let mut joined = Row::with_capacity(self.output_headers.len());
            for (left_key, value) in self.left_keys.iter().zip(key) {
                joined.insert(left_key.as_str(), value);
            }
            for (header, out_header) in &self.payload {
                joined.insert(out_header.as_str(), right.get_or_null(header).clone());
            }
            for header in &self.left_non_keys {
                if !joined.contains(header) {
                    joined.insert(header.as_str(), Value::Null);
                }
            }
            out.push(joined);
        }
    }
}

impl Table {
    /// Hash join against `other`.
    ///
    /// Matched rows carry self's fields plus other's non-key fields (with the
    /// configured prefix). Unmatched rows from either side are kept according
    /// to the join type; right side rows come last with their keys renamed to
    /// self's key fields.
    ///
    /// When a non-key header of other (after prefixing) is also a header of
    /// self, other's value wins in every output row. It is null for left rows
    /// without a match. Set a prefix to keep both.
    pub fn join(&self, other: &Table, opts: &JoinOptions) -> Result<Table> {
        let mut joiner = HashJoiner::try_new(&self.headers, other, opts)?;

        let mut rows = Vec::new();
        for row in &self.rows {
            joiner.probe(row, &mut rows)?;
        }
        joiner.finish(&mut rows);

        debug!(
            left = self.rows.len(),
            right = other.rows.len(),
            output = rows.len(),
            "joined tables"
        );

        if rows.is_empty() && (self.rows.is_empty() || other.rows.is_empty()) {
            // Degenerate joins with nothing to emit produce the canonical empty
            // table.
            return Ok(Table::new());
        }

        Ok(Table::from_parts(joiner.output_headers().clone(), rows))
    }
}

//! Lazy, single pass tables.
//!
//! A `TableStream` pairs a declared set of headers with a `RowSource`.
//! Operations that work one row at a time (filter, extend, project, joins
//! against a materialized table, ...) are layered on top of the source and
//! only run once the stream is consumed. Sorting, bucketing and aggregation
//! need every row up front and only exist on `Table`. `materialize` is the
//! conversion between the two.
//!
//! Whether a stream can be consumed more than once depends on its source.
//! Streams over tables and over replayable factories can be reopened and
//! produce the same rows each time. Streams over plain iterators can only be
//! opened once; opening them again fails with `StreamConsumed`.

use std::collections::BTreeSet;
use std::fmt;

use ahash::RandomState;
use datatable_error::{DataTableError, Result};
use hashbrown::hash_map::Entry;
use hashbrown::{HashMap, HashSet};
use tracing::{debug, trace};

use crate::criterion::{ColumnMutation, FilterCriterion};
use crate::hash::{GroupKey, HASH_RANDOM_STATE, new_key_map, new_key_set};
use crate::row::Row;
use crate::table::{HashJoiner, JoinOptions, Table};
use crate::value::Value;

/// Rows produced by an opened source. Errors raised while producing a row
/// (user functions, missing join keys) are yielded in place of that row.
pub type RowIter<'a> = Box<dyn Iterator<Item = Result<Row>> + 'a>;

/// Where a stream's rows come from.
pub trait RowSource {
    /// Start producing rows.
    ///
    /// Replayable sources produce the same rows on every call. Other sources
    /// error with `StreamConsumed` after the first call.
    fn open(&mut self) -> Result<RowIter<'_>>;

    fn is_replayable(&self) -> bool;
}

/// A lazy row to row operation layered over a source.
///
/// `adapt` is called every time the underlying source is opened, so any
/// per-pass state (seen keys, last values) must be created inside it.
pub trait RowAdapter {
    fn adapt<'s>(&'s mut self, rows: RowIter<'s>) -> Result<RowIter<'s>>;

    /// If this adapter can be applied more than once.
    fn is_replayable(&self) -> bool {
        true
    }
}

/// Source over an iterator that can only be consumed once.
pub struct OnceSource<'a> {
    rows: Option<RowIter<'a>>,
}

impl<'a> OnceSource<'a> {
    pub fn new<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Row>,
        I::IntoIter: 'a,
    {
        OnceSource {
            rows: Some(Box::new(rows.into_iter().map(Ok))),
        }
    }

    /// Source over rows that may fail to be produced.
    pub fn fallible<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Result<Row>>,
        I::IntoIter: 'a,
    {
        OnceSource {
            rows: Some(Box::new(rows.into_iter())),
        }
    }
}

impl RowSource for OnceSource<'_> {
    fn open(&mut self) -> Result<RowIter<'_>> {
        let rows = self.rows.take().ok_or(DataTableError::StreamConsumed)?;
        Ok(rows)
    }

    fn is_replayable(&self) -> bool {
        false
    }
}

/// Replayable source over borrowed rows.
#[derive(Debug, Clone, Copy)]
pub struct BorrowedRows<'a>(pub &'a [Row]);

impl RowSource for BorrowedRows<'_> {
    fn open(&mut self) -> Result<RowIter<'_>> {
        Ok(Box::new(self.0.iter().cloned().map(Ok)))
    }

    fn is_replayable(&self) -> bool {
        true
    }
}

/// Replayable source over owned rows.
#[derive(Debug, Clone, Default)]
pub struct OwnedRows(pub Vec<Row>);

impl RowSource for OwnedRows {
    fn open(&mut self) -> Result<RowIter<'_>> {
        Ok(Box::new(self.0.iter().cloned().map(Ok)))
    }

    fn is_replayable(&self) -> bool {
        true
    }
}

/// Replayable source that calls a factory for a fresh iterator on every open.
pub struct ReplayableSource<'a> {
    factory: Box<dyn FnMut() -> RowIter<'a> + 'a>,
}

impl<'a> ReplayableSource<'a> {
    pub fn new<F, I>(mut factory: F) -> Self
    where
        F: FnMut() -> I + 'a,
        I: IntoIterator<Item = Row>,
        I::IntoIter: 'a,
    {
        ReplayableSource {
            factory: Box::new(move || -> RowIter<'a> {
                Box::new(factory().into_iter().map(Ok))
            }),
        }
    }
}

impl RowSource for ReplayableSource<'_> {
    fn open(&mut self) -> Result<RowIter<'_>> {
        Ok((self.factory)())
    }

    fn is_replayable(&self) -> bool {
        true
    }
}

/// A source with an adapter applied on every open.
struct Adapted<'a> {
    input: Box<dyn RowSource + 'a>,
    adapter: Box<dyn RowAdapter + 'a>,
}

impl RowSource for Adapted<'_> {
    fn open(&mut self) -> Result<RowIter<'_>> {
        let rows = self.input.open()?;
        self.adapter.adapt(rows)
    }

    fn is_replayable(&self) -> bool {
        self.input.is_replayable() && self.adapter.is_replayable()
    }
}

/// Applies a function to every row. Returning `None` drops the row.
struct MapRows<F> {
    f: F,
}

impl<F> RowAdapter for MapRows<F>
where
    F: FnMut(Row) -> Result<Option<Row>>,
{
    fn adapt<'s>(&'s mut self, rows: RowIter<'s>) -> Result<RowIter<'s>> {
        let f = &mut self.f;
        Ok(Box::new(rows.filter_map(move |row| match row {
            Ok(row) => f(row).transpose(),
            Err(e) => Some(Err(e)),
        })))
    }
}

/// Drops repeated rows. Without headers, rows are compared by every field
/// they carry.
struct Distinct {
    headers: Option<Vec<String>>,
}

impl RowAdapter for Distinct {
    fn adapt<'s>(&'s mut self, rows: RowIter<'s>) -> Result<RowIter<'s>> {
        match &self.headers {
            Some(headers) => {
                let mut seen = new_key_set();
                Ok(Box::new(rows.filter(move |row| match row {
                    Ok(row) => seen.insert(row.key_or_null(headers)),
                    Err(_) => true,
                })))
            }
            None => {
                let mut seen: HashSet<Row, RandomState> =
                    HashSet::with_hasher(HASH_RANDOM_STATE);
                Ok(Box::new(rows.filter(move |row| match row {
                    Ok(row) => seen.insert(row.clone()),
                    Err(_) => true,
                })))
            }
        }
    }
}

/// Emits a row once its key has been seen twice. The first row for a key is
/// held back until its second occurrence.
struct Duplicates {
    fields: Vec<String>,
}

impl RowAdapter for Duplicates {
    fn adapt<'s>(&'s mut self, rows: RowIter<'s>) -> Result<RowIter<'s>> {
        let fields = &self.fields;
        let mut held = new_key_map::<Option<Row>>();
        Ok(Box::new(rows.flat_map(move |row| {
            let row = match row {
                Ok(row) => row,
                Err(e) => return vec![Err(e)],
            };
            match held.entry(row.key_or_null(fields)) {
                Entry::Vacant(ent) => {
                    ent.insert(Some(row));
                    Vec::new()
                }
                Entry::Occupied(mut ent) => match ent.get_mut().take() {
                    Some(first) => vec![Ok(first), Ok(row)],
                    None => vec![Ok(row)],
                },
            }
        })))
    }
}

/// Forward-fills blanks. Without fields, every field a row carries is
/// filled.
struct FillDown {
    fields: Option<Vec<String>>,
}

impl RowAdapter for FillDown {
    fn adapt<'s>(&'s mut self, rows: RowIter<'s>) -> Result<RowIter<'s>> {
        let fields = &self.fields;
        let mut last: HashMap<String, Value, RandomState> =
            HashMap::with_hasher(HASH_RANDOM_STATE);
        Ok(Box::new(rows.map(move |row| {
            let mut row = row?;
            let names: Vec<String> = match fields {
                Some(fields) => fields.clone(),
                None => row.headers().map(|h| h.to_string()).collect(),
            };
            for field in names {
                let Some(value) = row.get_mut(&field) else {
                    continue;
                };
                if value.is_blank() {
                    if let Some(prev) = last.get(&field) {
                        *value = prev.clone();
                    }
                } else {
                    last.insert(field, value.clone());
                }
            }
            Ok(row)
        })))
    }
}

/// Drops the first structurally equal row for each row to remove.
struct RemoveRows {
    rows: Vec<Row>,
}

impl RowAdapter for RemoveRows {
    fn adapt<'s>(&'s mut self, rows: RowIter<'s>) -> Result<RowIter<'s>> {
        let mut pending: HashMap<&Row, usize, RandomState> =
            HashMap::with_hasher(HASH_RANDOM_STATE);
        for row in &self.rows {
            *pending.entry(row).or_insert(0) += 1;
        }
        Ok(Box::new(rows.filter(move |row| {
            let Ok(row) = row else {
                return true;
            };
            match pending.get_mut(row) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    false
                }
                _ => true,
            }
        })))
    }
}

/// Appends another source's rows, optionally filling missing headers with
/// nulls.
struct Chain<'a> {
    other: Box<dyn RowSource + 'a>,
    fill: Option<BTreeSet<String>>,
}

impl RowAdapter for Chain<'_> {
    fn adapt<'s>(&'s mut self, rows: RowIter<'s>) -> Result<RowIter<'s>> {
        let other = self.other.open()?;
        let rows = rows.chain(other);
        match &self.fill {
            None => Ok(Box::new(rows)),
            Some(headers) => Ok(Box::new(rows.map(move |row| {
                let mut row = row?;
                fill_nulls(&mut row, headers);
                Ok(row)
            }))),
        }
    }

    fn is_replayable(&self) -> bool {
        self.other.is_replayable()
    }
}

struct Join<'a> {
    joiner: HashJoiner<'a>,
}

impl RowAdapter for Join<'_> {
    fn adapt<'s>(&'s mut self, rows: RowIter<'s>) -> Result<RowIter<'s>> {
        self.joiner.reset();
        Ok(Box::new(JoinRows {
            joiner: &mut self.joiner,
            input: rows,
            pending: Vec::new().into_iter(),
            finished: false,
        }))
    }
}

/// Probes each input row against the join index, then emits unmatched right
/// rows once the input is exhausted.
struct JoinRows<'s, 'a> {
    joiner: &'s mut HashJoiner<'a>,
    input: RowIter<'s>,
    pending: std::vec::IntoIter<Row>,
    finished: bool,
}

impl Iterator for JoinRows<'_, '_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.next() {
                return Some(Ok(row));
            }
            if self.finished {
                return None;
            }

            let mut out = Vec::new();
            match self.input.next() {
                Some(Ok(row)) => {
                    if let Err(e) = self.joiner.probe(&row, &mut out) {
                        return Some(Err(e));
                    }
                }
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    self.joiner.finish(&mut out);
                    self.finished = true;
                }
            }
            self.pending = out.into_iter();
        }
    }
}

fn fill_nulls(row: &mut Row, headers: &BTreeSet<String>) {
    if row.len() == headers.len() {
        return;
    }
    for header in headers {
        if !row.contains(header) {
            row.insert(header.as_str(), Value::Null);
        }
    }
}

/// A table whose rows are produced lazily.
pub struct TableStream<'a> {
    headers: BTreeSet<String>,
    source: Box<dyn RowSource + 'a>,
}

impl<'a> TableStream<'a> {
    pub fn new<I, S, R>(headers: I, source: R) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        R: RowSource + 'a,
    {
        TableStream {
            headers: headers.into_iter().map(Into::into).collect(),
            source: Box::new(source),
        }
    }

    /// Stream over an iterator that can be consumed once.
    pub fn from_rows<I, S, R>(headers: I, rows: R) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        R: IntoIterator<Item = Row>,
        R::IntoIter: 'a,
    {
        Self::new(headers, OnceSource::new(rows))
    }

    /// Stream over an iterator, taking headers from the first row.
    ///
    /// Only the first row is pulled up front.
    pub fn infer_headers<R>(rows: R) -> Self
    where
        R: IntoIterator<Item = Row>,
        R::IntoIter: 'a,
    {
        let mut rows = rows.into_iter().peekable();
        let headers: Vec<String> = match rows.peek() {
            Some(first) => first.headers().map(|h| h.to_string()).collect(),
            None => Vec::new(),
        };
        Self::new(headers, OnceSource::new(rows))
    }

    /// Stream that can be reopened, calling `factory` for each pass.
    pub fn replayable<I, S, F, R>(headers: I, factory: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnMut() -> R + 'a,
        R: IntoIterator<Item = Row>,
        R::IntoIter: 'a,
    {
        Self::new(headers, ReplayableSource::new(factory))
    }

    pub fn from_table(table: &'a Table) -> Self {
        TableStream {
            headers: table.headers.clone(),
            source: Box::new(BorrowedRows(&table.rows)),
        }
    }

    pub fn headers(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.headers.iter().map(|h| h.as_str())
    }

    pub fn header_names(&self) -> Vec<String> {
        self.headers.iter().cloned().collect()
    }

    pub fn has_header(&self, header: &str) -> bool {
        self.headers.contains(header)
    }

    /// If the stream can be consumed more than once.
    pub fn is_replayable(&self) -> bool {
        self.source.is_replayable()
    }

    /// Open the stream.
    pub fn rows(&mut self) -> Result<RowIter<'_>> {
        trace!(replayable = self.source.is_replayable(), "opening stream");
        self.source.open()
    }

    /// Layer a custom adapter over this stream. Output rows are expected to
    /// hold `headers`.
    pub fn with_adapter<I, S, A>(self, headers: I, adapter: A) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        A: RowAdapter + 'a,
    {
        let headers = headers.into_iter().map(Into::into).collect();
        self.adapted(headers, adapter)
    }

    fn adapted<A>(self, headers: BTreeSet<String>, adapter: A) -> Self
    where
        A: RowAdapter + 'a,
    {
        TableStream {
            headers,
            source: Box::new(Adapted {
                input: self.source,
                adapter: Box::new(adapter),
            }),
        }
    }

    fn map_rows<F>(self, headers: BTreeSet<String>, f: F) -> Self
    where
        F: FnMut(Row) -> Result<Option<Row>> + 'a,
    {
        self.adapted(headers, MapRows { f })
    }

    /// Fields must be declared headers. Streams with undeclared headers skip
    /// the check.
    fn check_headers<S: AsRef<str>>(&self, fields: &[S]) -> Result<()> {
        if self.headers.is_empty() {
            return Ok(());
        }
        for field in fields {
            if !self.has_header(field.as_ref()) {
                return Err(DataTableError::missing_field(field.as_ref()));
            }
        }
        Ok(())
    }

    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&Row) -> bool + 'a,
    {
        let headers = self.headers.clone();
        self.map_rows(headers, move |row| Ok(predicate(&row).then_some(row)))
    }

    /// Like `filter` with a predicate that can fail. Errors surface while the
    /// stream is consumed.
    pub fn try_filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&Row) -> Result<bool> + 'a,
    {
        let headers = self.headers.clone();
        self.map_rows(headers, move |row| Ok(predicate(&row)?.then_some(row)))
    }

    /// Rows whose values equal every field in `exact`.
    pub fn filter_eq(self, exact: Row) -> Self {
        self.filter(move |row| exact.iter().all(|(h, v)| row.get_or_null(h) == v))
    }

    /// Rows matching every (header, criterion) pair.
    pub fn filter_by<S>(self, criteria: Vec<(S, FilterCriterion)>) -> Result<Self>
    where
        S: AsRef<str> + 'a,
    {
        for (header, criterion) in &criteria {
            self.check_headers(&[header.as_ref()])?;
            if let FilterCriterion::SameColumn(other) = criterion {
                self.check_headers(&[other.as_str()])?;
            }
        }
        Ok(self.try_filter(move |row| FilterCriterion::matches_all(&criteria, row)))
    }

    /// Replace every row with the output of `f`. Output rows are expected to
    /// hold `headers`; materializing fills any that are missing with nulls.
    pub fn transform<I, S, F>(self, headers: I, mut f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnMut(Row) -> Result<Row> + 'a,
    {
        let headers = headers.into_iter().map(Into::into).collect();
        self.map_rows(headers, move |row| f(row).map(Some))
    }

    /// Add or overwrite columns, applying mutations in order.
    pub fn extend<I, S>(self, mutations: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnMutation)>,
        S: Into<String>,
    {
        let mutations: Vec<(String, ColumnMutation)> = mutations
            .into_iter()
            .map(|(h, m)| (h.into(), m))
            .collect();
        let mut headers = self.headers.clone();
        headers.extend(mutations.iter().map(|(h, _)| h.clone()));

        self.map_rows(headers, move |mut row| {
            for (header, mutation) in &mutations {
                let value = mutation.apply(&row)?;
                row.insert(header.as_str(), value);
            }
            Ok(Some(row))
        })
    }

    /// Overwrite an existing column.
    pub fn set(self, header: &str, mutation: ColumnMutation) -> Result<Self> {
        self.check_headers(&[header])?;
        Ok(self.extend([(header.to_string(), mutation)]))
    }

    /// Drop columns. Unknown headers are ignored.
    pub fn exclude<I, S>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let drop: Vec<String> = headers
            .into_iter()
            .map(|h| h.as_ref().to_string())
            .collect();
        let keep = self
            .headers
            .iter()
            .filter(|h| !drop.contains(h))
            .cloned()
            .collect();

        self.map_rows(keep, move |mut row| {
            for header in &drop {
                row.remove(header);
            }
            Ok(Some(row))
        })
    }

    /// Keep only the given columns. Unknown headers are ignored.
    pub fn project<I, S>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let requested: BTreeSet<String> = headers
            .into_iter()
            .map(|h| h.as_ref().to_string())
            .collect();
        let keep: BTreeSet<String> = if self.headers.is_empty() {
            requested
        } else {
            self.headers.intersection(&requested).cloned().collect()
        };
        let fields: Vec<String> = keep.iter().cloned().collect();

        self.map_rows(keep, move |row| Ok(Some(row.project(&fields))))
    }

    pub fn rename_column(self, old: &str, new: &str) -> Result<Self> {
        if !self.has_header(old) {
            return Err(DataTableError::missing_field(old));
        }
        if old != new && self.has_header(new) {
            return Err(DataTableError::SchemaMismatch {
                expected: vec![format!("header '{new}' not already present")],
                found: self.header_names(),
            });
        }
        let mut headers = self.headers.clone();
        headers.remove(old);
        headers.insert(new.to_string());

        let (old, new) = (old.to_string(), new.to_string());
        Ok(self.map_rows(headers, move |mut row| {
            row.rename(&old, new.as_str());
            Ok(Some(row))
        }))
    }

    /// Append another stream's rows.
    ///
    /// Headers must match unless one of the streams declares none.
    pub fn append(self, other: TableStream<'a>) -> Result<Self> {
        let headers = if other.headers.is_empty() {
            self.headers.clone()
        } else if self.headers.is_empty() || self.headers == other.headers {
            other.headers.clone()
        } else {
            return Err(DataTableError::SchemaMismatch {
                expected: self.header_names(),
                found: other.header_names(),
            });
        };
        Ok(self.adapted(
            headers,
            Chain {
                other: other.source,
                fill: None,
            },
        ))
    }

    /// Append another stream's rows, filling headers missing on either side
    /// with nulls.
    pub fn augment(self, other: TableStream<'a>) -> Self {
        let headers: BTreeSet<String> = self.headers.union(&other.headers).cloned().collect();
        self.adapted(
            headers.clone(),
            Chain {
                other: other.source,
                fill: Some(headers),
            },
        )
    }

    /// Remove the first structurally equal row for each of `rows`.
    pub fn remove<I>(self, rows: I) -> Self
    where
        I: IntoIterator<Item = Row>,
    {
        let headers = self.headers.clone();
        self.adapted(
            headers,
            RemoveRows {
                rows: rows.into_iter().collect(),
            },
        )
    }

    /// Drop rows already seen, keeping the first occurrence.
    ///
    /// Streams without declared headers compare whole rows.
    pub fn distinct(self) -> Self {
        let headers = self.headers.clone();
        let key = (!headers.is_empty()).then(|| self.header_names());
        self.adapted(headers, Distinct { headers: key })
    }

    /// Rows whose values for `fields` occur more than once.
    ///
    /// Rows are emitted as soon as their key is known to repeat, so the first
    /// row for a key is emitted right before the second.
    pub fn duplicates<S: AsRef<str>>(self, fields: &[S]) -> Result<Self> {
        self.check_headers(fields)?;
        let headers = self.headers.clone();
        let fields = fields.iter().map(|f| f.as_ref().to_string()).collect();
        Ok(self.adapted(headers, Duplicates { fields }))
    }

    /// Forward-fill blank cells per field. An empty list fills every column,
    /// or every field of each row when the stream has no declared headers.
    pub fn fill_down_blanks<S: AsRef<str>>(self, fields: &[S]) -> Result<Self> {
        self.check_headers(fields)?;
        let headers = self.headers.clone();
        let fields = if !fields.is_empty() {
            Some(fields.iter().map(|f| f.as_ref().to_string()).collect())
        } else if !headers.is_empty() {
            Some(self.header_names())
        } else {
            None
        };
        Ok(self.adapted(headers, FillDown { fields }))
    }

    /// Hash join against a materialized table.
    ///
    /// Rows are probed as they're produced. Unmatched rows from `other` are
    /// emitted after the stream is exhausted when the join type asks for
    /// them.
    pub fn join(self, other: &'a Table, opts: &JoinOptions) -> Result<Self> {
        let joiner = HashJoiner::try_new(&self.headers, other, opts)?;
        let headers = joiner.output_headers().clone();
        Ok(self.adapted(headers, Join { joiner }))
    }

    /// Consume the stream into a table.
    pub fn materialize(&mut self) -> Result<Table> {
        let rows = self.source.open()?.collect::<Result<Vec<_>>>()?;
        debug!(rows = rows.len(), "materialized stream");
        Ok(Table::from_parts(self.headers.clone(), rows))
    }

    /// Fold every row into an accumulator.
    pub fn reduce<T, F>(&mut self, init: T, mut f: F) -> Result<T>
    where
        F: FnMut(T, Row) -> Result<T>,
    {
        let mut acc = init;
        for row in self.source.open()? {
            acc = f(acc, row?)?;
        }
        Ok(acc)
    }

    /// The first row, if any. Only pulls a single row from the source.
    pub fn first(&mut self) -> Result<Option<Row>> {
        self.source.open()?.next().transpose()
    }

    /// Hand the rows to a sink.
    ///
    /// The sink sees rows up to the first error, which is then returned in
    /// place of the sink's output.
    pub fn pipe<F, T>(&mut self, sink: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Iterator<Item = Row>) -> T,
    {
        let mut error = None;
        let out = {
            let mut rows = self.source.open()?.map_while(|row| match row {
                Ok(row) => Some(row),
                Err(e) => {
                    error = Some(e);
                    None
                }
            });
            sink(&mut rows)
        };
        match error {
            Some(e) => Err(e),
            None => Ok(out),
        }
    }

    /// Key tuples for `fields` of every row, in order.
    pub fn keys<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<Vec<GroupKey>> {
        self.check_headers(fields)?;
        self.reduce(Vec::new(), |mut keys, row| {
            keys.push(row.key_or_null(fields));
            Ok(keys)
        })
    }
}

impl<'a> From<Table> for TableStream<'a> {
    fn from(table: Table) -> Self {
        TableStream {
            headers: table.headers,
            source: Box::new(OwnedRows(table.rows)),
        }
    }
}

impl fmt::Debug for TableStream<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableStream")
            .field("headers", &self.headers)
            .field("replayable", &self.is_replayable())
            .finish_non_exhaustive()
    }
}

//! Materialized tables.
//!
//! A table is a set of headers plus an ordered collection of rows where every
//! row holds exactly the table's headers. Missing values are stored as null.
//!
//! Mutating operations work in place. Most of them also have a copying
//! variant (`sorted`, `appended`, ...) built on `copy_and_apply`.

mod aggregate;
mod bucket;
mod join;
mod pivot;
mod sort;

use std::collections::BTreeSet;
use std::fmt;

use datatable_error::{DataTableError, Result};
use tracing::trace;

pub use self::bucket::BucketRuns;
pub(crate) use self::join::HashJoiner;
pub use self::join::{JoinOptions, JoinType};
pub use self::pivot::PivotRowId;
use crate::column::{Column, ColumnMut};
use crate::config::EngineConfig;
use crate::criterion::{ColumnMutation, FilterCriterion};
use crate::format::FormatOptions;
use crate::format::fixed_width::fixed_width;
use crate::hierarchy::Hierarchy;
use crate::row::Row;
use crate::stream::TableStream;
use crate::value::Value;

/// Input shapes a table can be built from.
#[derive(Debug, Clone)]
pub enum TableSource {
    /// Rows, possibly with differing headers.
    Rows(Vec<Row>),
    /// A header row followed by positional value rows of the same length.
    HeaderRows {
        headers: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    /// A structural copy of another table.
    Table(Table),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub(crate) headers: BTreeSet<String>,
    pub(crate) rows: Vec<Row>,
}

impl Table {
    /// Create the canonical empty table: no headers and no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with headers but no rows.
    pub fn with_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create a table from rows.
    ///
    /// The table's headers are the union of all row headers. Rows missing a
    /// header get a null value for it.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Row>,
    {
        Self::from_parts(BTreeSet::new(), rows.into_iter().collect())
    }

    /// Create a table from a header row and positional value rows.
    pub fn from_header_rows(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut out = Table::with_headers(headers.iter().cloned());
        out.rows.reserve(rows.len());

        for values in rows {
            if values.len() != headers.len() {
                return Err(DataTableError::SchemaMismatch {
                    expected: headers.clone(),
                    found: (0..values.len()).map(|idx| format!("#{idx}")).collect(),
                });
            }
            out.rows
                .push(headers.iter().cloned().zip(values).collect::<Row>());
        }

        Ok(out)
    }

    pub fn from_source(source: TableSource) -> Result<Self> {
        match source {
            TableSource::Rows(rows) => Ok(Self::from_rows(rows)),
            TableSource::HeaderRows { headers, rows } => Self::from_header_rows(headers, rows),
            TableSource::Table(table) => Ok(table),
        }
    }

    /// Build a table from a raw input using a caller supplied parser.
    pub fn parse<R, F>(raw: R, parse: F) -> Result<Self>
    where
        F: FnOnce(R) -> Result<TableSource>,
    {
        Self::from_source(parse(raw)?)
    }

    /// Concatenate any number of tables, reconciling headers as `augment`
    /// does.
    pub fn concat<'a, I>(tables: I) -> Self
    where
        I: IntoIterator<Item = &'a Table>,
    {
        let mut out = Table::new();
        for table in tables {
            out.augment(table);
        }
        out
    }

    /// Assemble a table, adding null values (and headers) where rows and
    /// headers disagree.
    pub fn from_parts(mut headers: BTreeSet<String>, mut rows: Vec<Row>) -> Self {
        for row in &rows {
            for h in row.headers() {
                if !headers.contains(h) {
                    headers.insert(h.to_string());
                }
            }
        }
        for row in &mut rows {
            if row.len() != headers.len() {
                for h in &headers {
                    if !row.contains(h) {
                        row.insert(h.as_str(), Value::Null);
                    }
                }
            }
        }
        Table { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Headers in sorted order.
    pub fn headers(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.headers.iter().map(|h| h.as_str())
    }

    pub fn header_names(&self) -> Vec<String> {
        self.headers.iter().cloned().collect()
    }

    pub fn has_header(&self, header: &str) -> bool {
        self.headers.contains(header)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> + '_ {
        self.rows.iter_mut()
    }

    pub fn row(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// New table holding the rows at the given indices. Out of range indices
    /// are skipped.
    pub fn select(&self, indices: impl IntoIterator<Item = usize>) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: indices
                .into_iter()
                .filter_map(|idx| self.rows.get(idx).cloned())
                .collect(),
        }
    }

    pub fn column<'a>(&'a self, header: &'a str) -> Result<Column<'a>> {
        Column::try_new(self, header)
    }

    pub fn column_mut(&mut self, header: &str) -> Result<ColumnMut<'_>> {
        ColumnMut::try_new(self, header)
    }

    /// All columns in header order.
    pub fn columns(&self) -> Vec<Column<'_>> {
        self.headers
            .iter()
            .filter_map(|h| Column::try_new(self, h).ok())
            .collect()
    }

    /// Borrow the table as a stream. Streams over a table can be replayed.
    pub fn stream(&self) -> TableStream<'_> {
        TableStream::from_table(self)
    }

    /// Clone this table and apply a mutating operation to the clone.
    pub fn copy_and_apply<F>(&self, op: F) -> Result<Table>
    where
        F: FnOnce(&mut Table) -> Result<()>,
    {
        let mut out = self.clone();
        op(&mut out)?;
        Ok(out)
    }

    fn check_headers<S: AsRef<str>>(&self, fields: &[S]) -> Result<()> {
        for field in fields {
            if !self.has_header(field.as_ref()) {
                return Err(DataTableError::missing_field(field.as_ref()));
            }
        }
        Ok(())
    }

    fn check_row_headers(&self, row: &Row) -> Result<()> {
        if row.len() != self.headers.len() || !row.headers().all(|h| self.has_header(h)) {
            return Err(DataTableError::SchemaMismatch {
                expected: self.header_names(),
                found: row.headers().map(|h| h.to_string()).collect(),
            });
        }
        Ok(())
    }

    /// Rows for which the predicate returns true.
    pub fn filter<F>(&self, predicate: F) -> Table
    where
        F: Fn(&Row) -> bool,
    {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }

    /// Like `filter` with a predicate that can fail. The first error is
    /// returned as is.
    pub fn try_filter<F>(&self, predicate: F) -> Result<Table>
    where
        F: Fn(&Row) -> Result<bool>,
    {
        let mut rows = Vec::new();
        for row in &self.rows {
            if predicate(row)? {
                rows.push(row.clone());
            }
        }
        Ok(Table {
            headers: self.headers.clone(),
            rows,
        })
    }

    /// Rows whose values equal every field in `exact`.
    pub fn filter_eq(&self, exact: &Row) -> Table {
        self.filter(|row| exact.iter().all(|(h, v)| row.get_or_null(h) == v))
    }

    /// Rows matching every (header, criterion) pair.
    pub fn filter_by<S: AsRef<str>>(&self, criteria: &[(S, FilterCriterion)]) -> Result<Table> {
        if !self.headers.is_empty() {
            for (header, criterion) in criteria {
                self.check_headers(&[header.as_ref()])?;
                if let FilterCriterion::SameColumn(other) = criterion {
                    self.check_headers(&[other.as_str()])?;
                }
            }
        }
        self.try_filter(|row| FilterCriterion::matches_all(criteria, row))
    }

    /// Append another table's rows.
    ///
    /// Headers must be identical unless one of the tables has no headers, in
    /// which case the other table's headers are adopted.
    pub fn append(&mut self, other: &Table) -> Result<()> {
        if other.headers.is_empty() && other.rows.is_empty() {
            return Ok(());
        }
        if self.headers.is_empty() && self.rows.is_empty() {
            self.headers = other.headers.clone();
        } else if self.headers != other.headers {
            return Err(DataTableError::SchemaMismatch {
                expected: self.header_names(),
                found: other.header_names(),
            });
        }
        self.rows.extend(other.rows.iter().cloned());
        Ok(())
    }

    pub fn appended(&self, other: &Table) -> Result<Table> {
        self.copy_and_apply(|t| t.append(other))
    }

    /// Append rows, each of which must have exactly this table's headers.
    pub fn append_rows<I>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = Row>,
    {
        for row in rows {
            self.push_row(row)?;
        }
        Ok(())
    }

    /// Append a single row, see `append_rows`.
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if self.headers.is_empty() && self.rows.is_empty() {
            self.headers = row.headers().map(|h| h.to_string()).collect();
        } else {
            self.check_row_headers(&row)?;
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append another table's rows, first adding null columns to either side
    /// for headers it's missing.
    pub fn augment(&mut self, other: &Table) {
        let missing_here: Vec<String> = other
            .headers
            .difference(&self.headers)
            .cloned()
            .collect();
        for header in missing_here {
            for row in &mut self.rows {
                row.insert(header.as_str(), Value::Null);
            }
            self.headers.insert(header);
        }

        for row in &other.rows {
            let mut row = row.clone();
            if row.len() != self.headers.len() {
                for h in &self.headers {
                    if !row.contains(h) {
                        row.insert(h.as_str(), Value::Null);
                    }
                }
            }
            self.rows.push(row);
        }
    }

    pub fn augmented(&self, other: &Table) -> Table {
        let mut out = self.clone();
        out.augment(other);
        out
    }

    /// Remove the first structurally equal row for each of `other`'s rows.
    pub fn remove(&mut self, other: &Table) {
        for row in &other.rows {
            self.remove_row(row);
        }
    }

    /// Remove the first row equal to `row`. Returns whether a row was removed.
    pub fn remove_row(&mut self, row: &Row) -> bool {
        match self.rows.iter().position(|r| r == row) {
            Some(idx) => {
                self.rows.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn removed(&self, other: &Table) -> Table {
        let mut out = self.clone();
        out.remove(other);
        out
    }

    /// Add or overwrite columns.
    ///
    /// Mutations are applied in order, so row functions see the columns set
    /// by earlier mutations. The first error from a row function is returned
    /// as is, and the column it was computing is left unset.
    pub fn extend<I, S>(&mut self, mutations: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, ColumnMutation)>,
        S: Into<String>,
    {
        for (header, mutation) in mutations {
            let header = header.into();
            let values = self
                .rows
                .iter()
                .map(|row| mutation.apply(row))
                .collect::<Result<Vec<_>>>()?;
            for (row, value) in self.rows.iter_mut().zip(values) {
                row.insert(header.as_str(), value);
            }
            self.headers.insert(header);
        }
        Ok(())
    }

    pub fn extended<I, S>(&self, mutations: I) -> Result<Table>
    where
        I: IntoIterator<Item = (S, ColumnMutation)>,
        S: Into<String>,
    {
        let mut out = self.clone();
        out.extend(mutations)?;
        Ok(out)
    }

    /// Merge the output of `f` into every row.
    ///
    /// Fields produced for some rows but not others are null where missing.
    /// If `f` fails the table is left unchanged and the error returned.
    pub fn extend_with<F>(&mut self, f: F) -> Result<()>
    where
        F: Fn(&Row) -> Result<Row>,
    {
        let additions = self.rows.iter().map(&f).collect::<Result<Vec<_>>>()?;
        for (row, addition) in self.rows.iter_mut().zip(&additions) {
            row.merge_in_place(addition);
        }
        let headers = std::mem::take(&mut self.headers);
        *self = Table::from_parts(headers, std::mem::take(&mut self.rows));
        Ok(())
    }

    /// Drop columns. Unknown headers are ignored.
    pub fn exclude<I, S>(&mut self, headers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for header in headers {
            let header = header.as_ref();
            if self.headers.remove(header) {
                for row in &mut self.rows {
                    row.remove(header);
                }
            }
        }
    }

    pub fn excluded<I, S>(&self, headers: I) -> Table
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = self.clone();
        out.exclude(headers);
        out
    }

    /// Drop columns for which the predicate returns true.
    pub fn exclude_where<F>(&mut self, predicate: F)
    where
        F: Fn(&Column<'_>) -> bool,
    {
        let matched: Vec<String> = self
            .columns()
            .into_iter()
            .filter(|c| predicate(c))
            .map(|c| c.header().to_string())
            .collect();
        self.exclude(matched);
    }

    /// Keep only the given columns. Unknown headers are ignored.
    pub fn project<I, S>(&mut self, headers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keep: BTreeSet<&str> = headers
            .into_iter()
            .filter_map(|h| self.headers.get(h.as_ref()).map(|h| h.as_str()))
            .collect();
        let drop: Vec<String> = self
            .headers
            .iter()
            .filter(|h| !keep.contains(h.as_str()))
            .cloned()
            .collect();
        self.exclude(drop);
    }

    pub fn projected<I, S>(&self, headers: I) -> Table
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = self.clone();
        out.project(headers);
        out
    }

    /// Keep only columns for which the predicate returns true.
    pub fn project_where<F>(&mut self, predicate: F)
    where
        F: Fn(&Column<'_>) -> bool,
    {
        self.exclude_where(|c| !predicate(c));
    }

    /// Drop columns whose values are all blank.
    pub fn remove_blank_columns(&mut self) {
        self.exclude_where(crate::column::empty_columns);
    }

    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<()> {
        self.check_headers(&[old])?;
        if old == new {
            return Ok(());
        }
        if self.headers.contains(new) {
            return Err(DataTableError::SchemaMismatch {
                expected: vec![format!("header '{new}' not already present")],
                found: self.header_names(),
            });
        }
        trace!(%old, %new, "renaming column");
        self.headers.remove(old);
        self.headers.insert(new.to_string());
        for row in &mut self.rows {
            row.rename(old, new);
        }
        Ok(())
    }

    pub fn renamed(&self, old: &str, new: &str) -> Result<Table> {
        self.copy_and_apply(|t| t.rename_column(old, new))
    }

    /// Forward-fill blank cells for each field independently. An empty list
    /// of fields fills every column.
    pub fn fill_down_blanks<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        let fields: Vec<String> = if fields.is_empty() {
            self.header_names()
        } else {
            self.check_headers(fields)?;
            fields.iter().map(|f| f.as_ref().to_string()).collect()
        };
        for field in fields {
            self.column_mut(&field)?.fill_down_blanks();
        }
        Ok(())
    }

    pub fn filled_down<S: AsRef<str>>(&self, fields: &[S]) -> Result<Table> {
        self.copy_and_apply(|t| t.fill_down_blanks(fields))
    }

    /// Index the rows into a hierarchy. Leaf headers default to every header
    /// that isn't a key.
    pub fn index<S: AsRef<str>>(&self, keys: &[S], leaves: Option<&[S]>) -> Result<Hierarchy> {
        Hierarchy::from_table(self, keys, leaves)
    }

    /// Hand the rows to a sink, returning whatever it produces.
    pub fn pipe<F, T>(&self, sink: F) -> T
    where
        F: FnOnce(&mut dyn Iterator<Item = &Row>) -> T,
    {
        sink(&mut self.rows.iter())
    }

    /// Render as fixed-width text using the config's null and empty string
    /// display values.
    pub fn to_fixed_width(&self, config: &EngineConfig) -> Result<String> {
        fixed_width(self.headers(), &self.rows, &config.format_options())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let out = fixed_width(self.headers(), &self.rows, &FormatOptions::new())
            .map_err(|_| fmt::Error)?;
        write!(f, "{out}")
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl FromIterator<Row> for Table {
    fn from_iter<T: IntoIterator<Item = Row>>(iter: T) -> Self {
        Table::from_rows(iter)
    }
}

/// Construct a table from a header list and positional value rows.
///
/// Rows shorter than the header list get nulls for the missing trailing
/// values.
///
/// ```
/// use datatable_core::table;
///
/// let t = table!(["id", "name"]; [1, "a"], [2, "b"]);
/// assert_eq!(2, t.len());
/// ```
#[macro_export]
macro_rules! table {
    ([$($header:expr),* $(,)?] $(; $([$($value:expr),* $(,)?]),* $(,)?)?) => {{
        let headers: ::std::vec::Vec<::std::string::String> =
            ::std::vec![$(::std::string::String::from($header)),*];
        let rows: ::std::vec::Vec<::std::vec::Vec<$crate::value::Value>> =
            ::std::vec![$($(::std::vec![$($crate::value::Value::from($value)),*]),*)?];
        $crate::table::Table::from_parts(
            headers.iter().cloned().collect(),
            rows.into_iter()
                .map(|values| headers.iter().cloned().zip(values).collect::<$crate::row::Row>())
                .collect(),
        )
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::none_columns;
    use crate::row;

    fn sample() -> Table {
        table!(["id", "name", "team"]; [1, "a", "x"], [2, "b", "y"], [3, "c", "x"])
    }

    #[test]
    fn schema_invariant_from_rows() {
        let t = Table::from_rows([row! { "a" => 1 }, row! { "b" => 2 }]);
        assert_eq!(vec!["a", "b"], t.headers().collect::<Vec<_>>());
        for row in &t {
            assert_eq!(2, row.len());
        }
        assert_eq!(&Value::Null, t.rows()[0].get_or_null("b"));
    }

    #[test]
    fn header_rows_length_mismatch() {
        let err = Table::from_header_rows(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![1.into()]],
        )
        .unwrap_err();
        assert!(matches!(err, DataTableError::SchemaMismatch { .. }));
    }

    #[test]
    fn table_macro_pads_short_rows() {
        let t = table!(["a", "b"]; [1]);
        assert_eq!(Some(&Value::Null), t.rows()[0].get("b"));
    }

    #[test]
    fn parse_with_custom_parser() {
        let t = Table::parse("a,b\n1,2\n3,4", |raw: &str| {
            let mut lines = raw.lines();
            let headers: Vec<String> = lines
                .next()
                .unwrap_or_default()
                .split(',')
                .map(|s| s.to_string())
                .collect();
            let rows = lines
                .map(|l| l.split(',').map(Value::from).collect())
                .collect();
            Ok(TableSource::HeaderRows { headers, rows })
        })
        .unwrap();
        assert_eq!(2, t.len());
        assert_eq!(Some(&Value::from("3")), t.rows()[1].get("a"));
    }

    #[test]
    fn filter_leaves_receiver_untouched() {
        let t = sample();
        let out = t.filter(|r| r.get_or_null("team") == &Value::from("x"));
        assert_eq!(2, out.len());
        assert_eq!(3, t.len());

        let out = t.filter_eq(&row! { "team" => "y" });
        assert_eq!(1, out.len());
    }

    #[test]
    fn try_filter_propagates() {
        let t = sample();
        let err = t
            .try_filter(|r| r.value("missing").map(|v| v.is_null()))
            .unwrap_err();
        assert!(matches!(err, DataTableError::MissingField(_)));
    }

    #[test]
    fn filter_by_criteria() {
        let t = sample();
        let out = t
            .filter_by(&[
                ("team", FilterCriterion::literal("x")),
                ("id", FilterCriterion::predicate(|v| v > &Value::from(1))),
            ])
            .unwrap();
        assert_eq!(1, out.len());
        assert_eq!(Some(&Value::from("c")), out.rows()[0].get("name"));

        assert!(t.filter_by(&[("nope", FilterCriterion::NullCheck)]).is_err());
    }

    #[test]
    fn append_requires_same_headers() {
        let mut t = sample();
        let other = table!(["id", "name"]; [4, "d"]);
        assert!(matches!(
            t.append(&other).unwrap_err(),
            DataTableError::SchemaMismatch { .. }
        ));

        let mut empty = Table::new();
        empty.append(&other).unwrap();
        assert_eq!(other, empty);

        t.append(&Table::new()).unwrap();
        assert_eq!(3, t.len());
    }

    #[test]
    fn push_row_checks_headers() {
        let mut t = sample();
        assert!(t.push_row(row! { "id" => 4 }).is_err());
        t.push_row(row! { "id" => 4, "name" => "d", "team" => "z" })
            .unwrap();
        assert_eq!(4, t.len());
    }

    #[test]
    fn augment_reconciles() {
        let mut t = sample();
        let other = table!(["id", "extra"]; [9, true]);
        t.augment(&other);
        assert_eq!(vec!["extra", "id", "name", "team"], t.headers().collect::<Vec<_>>());
        assert_eq!(4, t.len());
        for row in &t {
            assert_eq!(4, row.len());
        }
        assert_eq!(&Value::Null, t.rows()[3].get_or_null("name"));
    }

    #[test]
    fn remove_first_match_only() {
        let mut t = table!(["a"]; [1], [1], [2]);
        t.remove(&table!(["a"]; [1]));
        assert_eq!(table!(["a"]; [1], [2]), t);
    }

    #[test]
    fn extend_sequential() {
        let mut t = table!(["a"]; [1], [2]);
        t.extend([
            ("b", ColumnMutation::constant(10)),
            (
                "c",
                ColumnMutation::try_row_fn(|r| r.get_or_null("a").checked_add(r.get_or_null("b"))),
            ),
        ])
        .unwrap();
        assert_eq!(table!(["a", "b", "c"]; [1, 10, 11], [2, 10, 12]), t);
    }

    #[test]
    fn extend_propagates_row_fn_error() {
        let mut t = table!(["a"]; [1], ["two"]);
        let err = t
            .extend([(
                "b",
                ColumnMutation::try_row_fn(|r| r.get_or_null("a").checked_mul(&Value::from(2))),
            )])
            .unwrap_err();
        assert!(matches!(err, DataTableError::TypeMismatch(_)), "{err}");
        // Column isn't half written.
        assert_eq!(table!(["a"]; [1], ["two"]), t);

        let external = t
            .extended([(
                "b",
                ColumnMutation::try_row_fn(|_| Err(DataTableError::external(std::fmt::Error))),
            )])
            .unwrap_err();
        assert!(matches!(external, DataTableError::External(_)), "{external}");
    }

    #[test]
    fn extend_with_row_fn() {
        let mut t = table!(["a"]; [1], [2]);
        t.extend_with(|r| {
            Ok(if r.get_or_null("a") == &Value::from(1) {
                row! { "b" => "one" }
            } else {
                row! { "c" => "other" }
            })
        })
        .unwrap();
        assert_eq!(
            table!(["a", "b", "c"]; [1, "one", Value::Null], [2, Value::Null, "other"]),
            t
        );
    }

    #[test]
    fn exclude_project_complementary() {
        let t = sample();
        assert_eq!(t.excluded(["team"]), t.projected(["id", "name", "missing"]));
    }

    #[test]
    fn exclude_where_predicate() {
        let mut t = table!(["a", "b"]; [1, Value::Null], [2, Value::Null]);
        t.exclude_where(none_columns);
        assert_eq!(vec!["a"], t.headers().collect::<Vec<_>>());

        let mut t = table!(["a", "b"]; [1, ""], [0, Value::Null]);
        t.remove_blank_columns();
        assert_eq!(vec!["a"], t.headers().collect::<Vec<_>>());
    }

    #[test]
    fn rename() {
        let t = sample();
        let out = t.renamed("name", "label").unwrap();
        assert!(out.has_header("label"));
        assert!(!out.has_header("name"));
        assert_eq!(Some(&Value::from("a")), out.rows()[0].get("label"));
        assert!(t.renamed("missing", "x").is_err());
        assert_eq!(t, t.renamed("name", "name").unwrap());
    }

    #[test]
    fn rename_onto_existing_header_rejected() {
        let mut t = sample();
        let before = t.clone();
        let err = t.rename_column("name", "team").unwrap_err();
        assert!(matches!(err, DataTableError::SchemaMismatch { .. }), "{err}");
        assert_eq!(before, t);
    }

    #[test]
    fn fill_down_all_fields() {
        let t = table!(["a", "b"]; [1, "x"], [Value::Null, ""], [0, "y"]);
        let out = t.filled_down::<&str>(&[]).unwrap();
        assert_eq!(table!(["a", "b"]; [1, "x"], [1, "x"], [1, "y"]), out);
    }

    #[test]
    fn concat_many() {
        let a = table!(["a"]; [1]);
        let b = table!(["b"]; [2]);
        let out = Table::concat([&a, &b, &Table::new()]);
        assert_eq!(2, out.len());
        assert_eq!(vec!["a", "b"], out.headers().collect::<Vec<_>>());
    }

    #[test]
    fn display_fixed_width() {
        let t = table!(["name", "id"]; [Value::Null, 10]);
        assert_eq!("id name\n10 NULL", t.to_string());

        let mut config = EngineConfig::default();
        config.null_display = "-".to_string();
        assert_eq!("id name\n10 -", t.to_fixed_width(&config).unwrap());
    }

    #[test]
    fn pipe_hands_rows() {
        let t = sample();
        let count = t.pipe(|rows| rows.count());
        assert_eq!(3, count);
    }

    #[test]
    fn select_rows() {
        let t = sample();
        let out = t.select([2, 0, 10]);
        assert_eq!(2, out.len());
        assert_eq!(Some(&Value::from(3)), out.rows()[0].get("id"));
    }
}

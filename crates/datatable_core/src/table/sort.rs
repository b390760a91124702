use std::cmp::Ordering;

use datatable_error::Result;

use super::Table;
use crate::hash::{new_key_map, new_key_set};
use crate::row::Row;

/// Compare two rows on a list of fields. Missing fields compare as null,
/// which sorts first.
pub(crate) fn compare_rows<S: AsRef<str>>(a: &Row, b: &Row, fields: &[S]) -> Ordering {
    for field in fields {
        let field = field.as_ref();
        match a.get_or_null(field).cmp(b.get_or_null(field)) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }
    Ordering::Equal
}

impl Table {
    /// Stable sort by the given fields, nulls first.
    ///
    /// Sorting by no fields sorts by every header in header order.
    pub fn sort<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        if self.rows.is_empty() {
            return Ok(());
        }
        if fields.is_empty() {
            let all = self.header_names();
            self.rows.sort_by(|a, b| compare_rows(a, b, &all));
            return Ok(());
        }
        self.check_headers(fields)?;
        self.rows.sort_by(|a, b| compare_rows(a, b, fields));
        Ok(())
    }

    pub fn sorted<S: AsRef<str>>(&self, fields: &[S]) -> Result<Table> {
        self.copy_and_apply(|t| t.sort(fields))
    }

    /// Stable sort with a caller supplied comparator.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&Row, &Row) -> Ordering,
    {
        self.rows.sort_by(compare);
    }

    /// Rows with duplicates removed, keeping the first occurrence.
    pub fn distinct(&self) -> Table {
        let headers = self.header_names();
        let mut seen = new_key_set();
        Table {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| seen.insert(row.key_or_null(&headers)))
                .cloned()
                .collect(),
        }
    }

    /// Rows whose values for `fields` occur more than once, in original
    /// order.
    pub fn duplicates<S: AsRef<str>>(&self, fields: &[S]) -> Result<Table> {
        if self.rows.is_empty() {
            return Ok(Table::with_headers(self.headers.iter().cloned()));
        }
        self.check_headers(fields)?;

        let mut counts = new_key_map::<usize>();
        for row in &self.rows {
            *counts.entry(row.key_or_null(fields)).or_insert(0) += 1;
        }

        Ok(self.filter(|row| {
            counts
                .get(&row.key_or_null(fields))
                .is_some_and(|count| *count > 1)
        }))
    }

    /// First row when sorted by `fields`, or `None` for a table without rows.
    pub fn min_row<S: AsRef<str>>(&self, fields: &[S]) -> Result<Option<Row>> {
        Ok(self.sorted(fields)?.rows.into_iter().next())
    }

    /// Last row when sorted by `fields`, or `None` for a table without rows.
    pub fn max_row<S: AsRef<str>>(&self, fields: &[S]) -> Result<Option<Row>> {
        let mut rows = self.sorted(fields)?.rows;
        Ok(rows.pop())
    }
}

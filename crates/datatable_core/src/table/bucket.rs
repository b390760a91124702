use std::collections::BTreeSet;
use std::iter::Peekable;

use datatable_error::Result;

use super::Table;
use crate::hash::{GroupKey, OrderedKeyMap, new_key_set, new_ordered_key_map};
use crate::row::Row;

impl Table {
    /// Group rows by their values for `fields`.
    ///
    /// Buckets are returned in first-seen order and keep the relative order of
    /// their rows.
    pub fn bucket<S: AsRef<str>>(&self, fields: &[S]) -> Result<OrderedKeyMap<Table>> {
        let mut buckets = new_ordered_key_map::<Table>();
        if self.rows.is_empty() {
            return Ok(buckets);
        }
        self.check_headers(fields)?;

        for row in &self.rows {
            buckets
                .entry(row.key_or_null(fields))
                .or_insert_with(|| Table::with_headers(self.headers.iter().cloned()))
                .rows
                .push(row.clone());
        }

        Ok(buckets)
    }

    /// Iterate over buckets in key order.
    ///
    /// Rows are sorted up front, then each contiguous run of equal keys is
    /// yielded as one bucket. Avoids building a hash map of all buckets.
    pub fn iter_bucket<S: AsRef<str>>(&self, fields: &[S]) -> Result<BucketRuns> {
        let fields: Vec<String> = fields.iter().map(|f| f.as_ref().to_string()).collect();
        let sorted = if self.rows.is_empty() {
            Vec::new()
        } else {
            self.check_headers(&fields)?;
            self.sorted(&fields)?.rows
        };

        Ok(BucketRuns {
            headers: self.headers.clone(),
            fields,
            rows: sorted.into_iter().peekable(),
        })
    }

    /// Number of rows in each bucket, in first-seen order.
    pub fn size_of_buckets<S: AsRef<str>>(&self, fields: &[S]) -> Result<OrderedKeyMap<usize>> {
        let mut sizes = new_ordered_key_map::<usize>();
        if self.rows.is_empty() {
            return Ok(sizes);
        }
        self.check_headers(fields)?;

        for row in &self.rows {
            *sizes.entry(row.key_or_null(fields)).or_insert(0) += 1;
        }
        Ok(sizes)
    }

    /// Rows belonging to buckets for which the predicate returns true.
    pub fn filter_bucket<S, F>(&self, fields: &[S], predicate: F) -> Result<Table>
    where
        S: AsRef<str>,
        F: Fn(&Table) -> bool,
    {
        let mut keep = new_key_set();
        for (key, bucket) in self.bucket(fields)? {
            if predicate(&bucket) {
                keep.insert(key);
            }
        }
        Ok(self.filter(|row| keep.contains(&row.key_or_null(fields))))
    }
}

/// Iterator over contiguous runs of a sorted table, see `Table::iter_bucket`.
#[derive(Debug)]
pub struct BucketRuns {
    headers: BTreeSet<String>,
    fields: Vec<String>,
    rows: Peekable<std::vec::IntoIter<Row>>,
}

impl Iterator for BucketRuns {
    type Item = (GroupKey, Table);

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rows.next()?;
        let key = first.key_or_null(&self.fields);

        let mut bucket = Table {
            headers: self.headers.clone(),
            rows: vec![first],
        };
        while let Some(row) = self
            .rows
            .next_if(|row| row.key_or_null(&self.fields) == key)
        {
            bucket.rows.push(row);
        }

        Some((key, bucket))
    }
}

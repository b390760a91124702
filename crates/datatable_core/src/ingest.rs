//! Loading query results from a database cursor.
//!
//! The cursor itself (connection, query, driver types) lives outside the
//! engine. It only has to describe its columns and hand over positional rows
//! of values for each result set.

use std::fmt;
use std::sync::Arc;

use datatable_error::{DataTableError, Result};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::hash::HASH_RANDOM_STATE;
use crate::hierarchy::Hierarchy;
use crate::row::Row;
use crate::table::Table;
use crate::value::Value;

/// Metadata for one column of a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Driver specific type code, if the driver reports one.
    pub type_code: Option<u32>,
    /// Declared size or precision of the column.
    pub size: Option<usize>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        ColumnDescriptor {
            name: name.into(),
            type_code: None,
            size: None,
        }
    }

    pub fn with_type(mut self, type_code: u32, size: Option<usize>) -> Self {
        self.type_code = Some(type_code);
        self.size = size;
        self
    }
}

/// A cursor positioned on a query's results.
pub trait Cursor {
    /// Columns of the current result set. `None` if the current result set
    /// doesn't produce rows.
    fn description(&self) -> Option<&[ColumnDescriptor]>;

    /// Fetch every remaining row of the current result set.
    fn fetch_all(&mut self) -> Result<Vec<Vec<Value>>>;

    /// Move to the next result set, returning false if there is none.
    fn next_set(&mut self) -> Result<bool>;
}

/// Function rewriting a single value.
pub type ValueScrub = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Chooses a scrub for a column from its descriptor.
pub type ScrubFactory = Arc<dyn Fn(&ColumnDescriptor) -> Option<ValueScrub> + Send + Sync>;

/// One ingested result set.
#[derive(Debug, Clone, PartialEq)]
pub enum Ingested {
    Table(Table),
    Hierarchy(Hierarchy),
}

impl Ingested {
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Ingested::Table(t) => Some(t),
            Ingested::Hierarchy(_) => None,
        }
    }

    pub fn as_hierarchy(&self) -> Option<&Hierarchy> {
        match self {
            Ingested::Hierarchy(h) => Some(h),
            Ingested::Table(_) => None,
        }
    }

    pub fn into_table(self) -> Table {
        match self {
            Ingested::Table(t) => t,
            Ingested::Hierarchy(h) => h.to_table(),
        }
    }
}

/// Reads cursor result sets into tables or hierarchies.
#[derive(Clone)]
pub struct CursorIngest {
    scrub: Option<ScrubFactory>,
    custom_scrub: IndexMap<String, ValueScrub, ahash::RandomState>,
    index: Option<Vec<String>>,
}

impl CursorIngest {
    pub fn new() -> Self {
        CursorIngest {
            scrub: None,
            custom_scrub: IndexMap::with_hasher(HASH_RANDOM_STATE),
            index: None,
        }
    }

    /// Set the factory consulted once per column. The returned scrub runs on
    /// every value of that column, nulls included. Errors are returned to the
    /// caller.
    pub fn with_scrub<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ColumnDescriptor) -> Option<ValueScrub> + Send + Sync + 'static,
    {
        self.scrub = Some(Arc::new(factory));
        self
    }

    /// Convert non-null values of `header` with `scrub`. Values it fails on
    /// are kept as they came from the cursor.
    pub fn with_custom_scrub<F>(mut self, header: impl Into<String>, scrub: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.custom_scrub.insert(header.into(), Arc::new(scrub));
        self
    }

    /// Produce hierarchies keyed on `keys` instead of tables. Every other
    /// column becomes a leaf field.
    pub fn indexed<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Read the current result set.
    ///
    /// A result set without a description gives an empty table.
    pub fn read<C: Cursor + ?Sized>(&self, cursor: &mut C) -> Result<Ingested> {
        Ok(self
            .read_current(cursor)?
            .unwrap_or_else(|| Ingested::Table(Table::new())))
    }

    /// Read the current and all following result sets.
    ///
    /// Later result sets without a description are skipped.
    pub fn read_all<C: Cursor + ?Sized>(&self, cursor: &mut C) -> Result<Vec<Ingested>> {
        let mut results = vec![self.read(cursor)?];
        while cursor.next_set()? {
            if let Some(result) = self.read_current(cursor)? {
                results.push(result);
            }
        }
        debug!(result_sets = results.len(), "read cursor results");
        Ok(results)
    }

    fn read_current<C: Cursor + ?Sized>(&self, cursor: &mut C) -> Result<Option<Ingested>> {
        let Some(description) = cursor.description() else {
            return Ok(None);
        };
        let description = description.to_vec();
        let raw = cursor.fetch_all()?;

        let mut rows = zip_headers(&description, raw)?;
        self.apply_scrubs(&description, &mut rows)?;

        let headers: Vec<String> = description.iter().map(|d| d.name.clone()).collect();
        let table = Table::from_parts(headers.iter().cloned().collect(), rows);
        debug!(columns = headers.len(), rows = table.len(), "ingested result set");

        match &self.index {
            Some(keys) => {
                let leaves: Vec<String> = table
                    .headers()
                    .filter(|h| !keys.iter().any(|k| k == *h))
                    .map(|h| h.to_string())
                    .collect();
                let hierarchy =
                    Hierarchy::from_table(&table, keys.as_slice(), Some(leaves.as_slice()))?;
                Ok(Some(Ingested::Hierarchy(hierarchy)))
            }
            None => Ok(Some(Ingested::Table(table))),
        }
    }

    fn apply_scrubs(&self, description: &[ColumnDescriptor], rows: &mut [Row]) -> Result<()> {
        if let Some(factory) = &self.scrub {
            let mut seen = Vec::with_capacity(description.len());
            for desc in description {
                // Duplicate columns were already collapsed into the first.
                if seen.contains(&desc.name.as_str()) {
                    continue;
                }
                seen.push(desc.name.as_str());

                let Some(scrub) = factory(desc) else {
                    continue;
                };
                for row in rows.iter_mut() {
                    if let Some(value) = row.get_mut(&desc.name) {
                        *value = scrub(value)?;
                    }
                }
            }
        }

        for (header, scrub) in &self.custom_scrub {
            for row in rows.iter_mut() {
                let Some(value) = row.get_mut(header) else {
                    continue;
                };
                if value.is_null() {
                    continue;
                }
                match scrub(value) {
                    Ok(scrubbed) => *value = scrubbed,
                    Err(e) => debug!(%header, %e, "custom scrub failed, keeping original value"),
                }
            }
        }

        Ok(())
    }
}

impl Default for CursorIngest {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CursorIngest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorIngest")
            .field("scrub", &self.scrub.as_ref().map(|_| ".."))
            .field("custom_scrub", &self.custom_scrub.keys().collect::<Vec<_>>())
            .field("index", &self.index)
            .finish()
    }
}

/// Turn positional rows into rows keyed by column name.
///
/// When several columns share a name the first non-null value wins.
/// Conflicting non-blank values in later columns are reported once per name.
fn zip_headers(description: &[ColumnDescriptor], raw: Vec<Vec<Value>>) -> Result<Vec<Row>> {
    let mut conflicts: IndexMap<&str, usize, ahash::RandomState> =
        IndexMap::with_hasher(HASH_RANDOM_STATE);
    let mut rows = Vec::with_capacity(raw.len());

    for values in raw {
        if values.len() != description.len() {
            return Err(DataTableError::SchemaMismatch {
                expected: description.iter().map(|d| d.name.clone()).collect(),
                found: (0..values.len()).map(|idx| format!("#{idx}")).collect(),
            });
        }

        let mut row = Row::with_capacity(description.len());
        for (desc, value) in description.iter().zip(values) {
            match row.get_mut(&desc.name) {
                None => {
                    row.insert(desc.name.as_str(), value);
                }
                Some(existing) if existing.is_null() => *existing = value,
                Some(existing) => {
                    if !value.is_blank() && value != *existing {
                        *conflicts.entry(desc.name.as_str()).or_default() += 1;
                    }
                }
            }
        }
        rows.push(row);
    }

    for (name, count) in conflicts {
        warn!(
            column = name,
            rows = count,
            "query returned multiple columns with the same name and conflicting data, keeping the first"
        );
    }

    Ok(rows)
}

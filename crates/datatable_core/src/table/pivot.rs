use std::fmt;
use std::sync::Arc;

use datatable_error::{DataTableError, Result};

use super::Table;
use crate::config::EngineConfig;
use crate::row::Row;
use crate::value::Value;

/// How output columns are named when pivoting.
#[derive(Clone, Default)]
pub enum PivotRowId {
    /// Zero padded row numbers with the configured prefix, e.g. `Row0`..`Row9`
    /// for ten rows and `Row00`..`Row10` for eleven.
    #[default]
    Default,
    /// Use the text of a column's value.
    Column(String),
    /// Compute a name from the row and its index.
    Function(Arc<dyn Fn(&Row, usize) -> String + Send + Sync>),
}

impl PivotRowId {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Row, usize) -> String + Send + Sync + 'static,
    {
        PivotRowId::Function(Arc::new(f))
    }
}

impl fmt::Debug for PivotRowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "Default"),
            Self::Column(c) => f.debug_tuple("Column").field(c).finish(),
            Self::Function(_) => write!(f, "Function(..)"),
        }
    }
}

impl Table {
    /// Transpose the table using the default config.
    pub fn pivot(&self, row_id: &PivotRowId) -> Result<Table> {
        self.pivot_with_config(row_id, &EngineConfig::default())
    }

    /// Transpose the table.
    ///
    /// The output has one row per header, with the header name stored in the
    /// configured field column (`Field` by default), and one column per input
    /// row named by `row_id`.
    pub fn pivot_with_config(&self, row_id: &PivotRowId, config: &EngineConfig) -> Result<Table> {
        if let PivotRowId::Column(header) = row_id {
            if !self.rows.is_empty() {
                self.check_headers(&[header.as_str()])?;
            }
        }

        let width = self.rows.len().to_string().len();
        let ids: Vec<String> = self
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| match row_id {
                PivotRowId::Default => format!("{}{idx:0width$}", config.pivot_row_prefix),
                PivotRowId::Column(header) => row.get_or_null(header).to_text(),
                PivotRowId::Function(f) => f(row, idx),
            })
            .collect();

        let field_header = config.pivot_field_header.as_str();
        let mut seen = std::collections::BTreeSet::new();
        for id in &ids {
            if id == field_header || !seen.insert(id.as_str()) {
                return Err(DataTableError::SchemaMismatch {
                    expected: vec![format!("unique row ids other than '{field_header}'")],
                    found: vec![id.clone()],
                });
            }
        }

        let rows = self
            .headers
            .iter()
            .map(|header| {
                let mut out: Row = ids
                    .iter()
                    .zip(&self.rows)
                    .map(|(id, row)| (id.as_str(), row.get_or_null(header).clone()))
                    .collect();
                out.insert(field_header, Value::from(header));
                out
            })
            .collect();

        let mut headers: std::collections::BTreeSet<String> = ids.into_iter().collect();
        headers.insert(field_header.to_string());

        Ok(Table::from_parts(headers, rows))
    }
}

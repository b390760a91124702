use std::fmt;
use std::sync::Arc;

use datatable_error::Result;

use crate::hash::{ValueSet, new_value_set};
use crate::row::Row;
use crate::value::Value;

/// User predicate over a single value. Errors are returned to the caller
/// unchanged.
pub type ValuePredicate = Arc<dyn Fn(&Value) -> Result<bool> + Send + Sync>;
pub type RowFunction = Arc<dyn Fn(&Row) -> Result<Value> + Send + Sync>;

/// Test applied to the value of a single column.
#[derive(Clone)]
pub enum FilterCriterion {
    /// Matches null values.
    NullCheck,
    /// Matches when the value equals the same row's value for another column.
    SameColumn(String),
    /// Matches values contained in the set.
    ValueSet(ValueSet),
    /// Matches values for which the predicate returns true.
    Predicate(ValuePredicate),
    /// Matches values equal to the literal.
    Literal(Value),
}

impl FilterCriterion {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        FilterCriterion::Predicate(Arc::new(move |v: &Value| -> Result<bool> { Ok(f(v)) }))
    }

    pub fn try_predicate<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<bool> + Send + Sync + 'static,
    {
        FilterCriterion::Predicate(Arc::new(f))
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        FilterCriterion::Literal(value.into())
    }

    pub fn same_column(header: impl Into<String>) -> Self {
        FilterCriterion::SameColumn(header.into())
    }

    pub fn value_set<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut set = new_value_set();
        set.extend(values.into_iter().map(Into::into));
        FilterCriterion::ValueSet(set)
    }

    /// Check the criterion against `row`'s value for `header`.
    ///
    /// Missing fields are treated as null.
    pub fn matches(&self, row: &Row, header: &str) -> Result<bool> {
        let value = row.get_or_null(header);
        Ok(match self {
            FilterCriterion::NullCheck => value.is_null(),
            FilterCriterion::SameColumn(other) => value == row.get_or_null(other),
            FilterCriterion::ValueSet(set) => set.contains(value),
            FilterCriterion::Predicate(f) => f(value)?,
            FilterCriterion::Literal(lit) => value == lit,
        })
    }

    /// True if the row matches every (header, criterion) pair.
    pub fn matches_all<S: AsRef<str>>(
        criteria: &[(S, FilterCriterion)],
        row: &Row,
    ) -> Result<bool> {
        for (header, criterion) in criteria {
            if !criterion.matches(row, header.as_ref())? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Debug for FilterCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullCheck => write!(f, "NullCheck"),
            Self::SameColumn(h) => f.debug_tuple("SameColumn").field(h).finish(),
            Self::ValueSet(set) => f.debug_tuple("ValueSet").field(set).finish(),
            Self::Predicate(_) => write!(f, "Predicate(..)"),
            Self::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
        }
    }
}

impl From<Value> for FilterCriterion {
    fn from(value: Value) -> Self {
        FilterCriterion::Literal(value)
    }
}

/// New content for a column.
#[derive(Clone)]
pub enum ColumnMutation {
    /// Every row gets the same value.
    Constant(Value),
    /// Value computed from the row being updated.
    RowFunction(RowFunction),
}

impl ColumnMutation {
    pub fn constant(value: impl Into<Value>) -> Self {
        ColumnMutation::Constant(value.into())
    }

    pub fn row_fn<F>(f: F) -> Self
    where
        F: Fn(&Row) -> Value + Send + Sync + 'static,
    {
        ColumnMutation::RowFunction(Arc::new(move |row: &Row| -> Result<Value> { Ok(f(row)) }))
    }

    /// Row function that can fail. Its errors propagate out of whichever
    /// operation applies the mutation.
    pub fn try_row_fn<F>(f: F) -> Self
    where
        F: Fn(&Row) -> Result<Value> + Send + Sync + 'static,
    {
        ColumnMutation::RowFunction(Arc::new(f))
    }

    pub fn apply(&self, row: &Row) -> Result<Value> {
        match self {
            ColumnMutation::Constant(v) => Ok(v.clone()),
            ColumnMutation::RowFunction(f) => f(row),
        }
    }
}

impl fmt::Debug for ColumnMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Self::RowFunction(_) => write!(f, "RowFunction(..)"),
        }
    }
}

impl From<Value> for ColumnMutation {
    fn from(value: Value) -> Self {
        ColumnMutation::Constant(value)
    }
}

//! Three-phase streaming aggregates shared by table and hierarchy grouping.
//!
//! For every group the first row seeds a state with `initialize`, every later
//! row is folded in with `accumulate`, and `finalize` turns the state into the
//! output value. Only the state is kept per group, never the group's rows.

pub mod builtin;

use std::any::Any;
use std::fmt;

use datatable_error::{Result, internal};

pub use self::builtin::*;
use crate::row::Row;
use crate::value::Value;

/// A streaming reducer computing one value per group.
///
/// Implement this for custom aggregates and register them with
/// `Aggregations::with`.
pub trait AggregateMethod: fmt::Debug + Send + Sync {
    type State: fmt::Debug + 'static;

    /// Create the state from the first row of a group.
    fn initialize(&self, row: &Row) -> Result<Self::State>;

    /// Fold a subsequent row of the group into the state.
    fn accumulate(&self, row: &Row, state: &mut Self::State) -> Result<()>;

    /// Produce the output value.
    fn finalize(&self, state: Self::State) -> Result<Value>;

    /// Output for a hierarchy leaf when it can be derived directly from the
    /// ancestor key values (`key`) and the number of rows in the leaf.
    ///
    /// Returning `None` runs the normal three-phase computation.
    fn fixed_by_key(&self, key: &Row, row_count: usize) -> Option<Value> {
        let _ = (key, row_count);
        None
    }
}

/// Object safe version of `AggregateMethod` with the state erased.
pub(crate) trait ErasedAggregate: fmt::Debug + Send + Sync {
    fn initialize(&self, row: &Row) -> Result<Box<dyn Any>>;
    fn accumulate(&self, row: &Row, state: &mut dyn Any) -> Result<()>;
    fn finalize(&self, state: Box<dyn Any>) -> Result<Value>;
    fn fixed_by_key(&self, key: &Row, row_count: usize) -> Option<Value>;
}

impl<A> ErasedAggregate for A
where
    A: AggregateMethod,
{
    fn initialize(&self, row: &Row) -> Result<Box<dyn Any>> {
        let state = AggregateMethod::initialize(self, row)?;
        Ok(Box::new(state))
    }

    fn accumulate(&self, row: &Row, state: &mut dyn Any) -> Result<()> {
        let state = state
            .downcast_mut::<A::State>()
            .ok_or_else(|| internal!("aggregate state has wrong type for {self:?}"))?;
        AggregateMethod::accumulate(self, row, state)
    }

    fn finalize(&self, state: Box<dyn Any>) -> Result<Value> {
        let state = state
            .downcast::<A::State>()
            .map_err(|_| internal!("aggregate state has wrong type for {self:?}"))?;
        AggregateMethod::finalize(self, *state)
    }

    fn fixed_by_key(&self, key: &Row, row_count: usize) -> Option<Value> {
        AggregateMethod::fixed_by_key(self, key, row_count)
    }
}

/// Ordered mapping from output field to aggregate.
#[derive(Debug, Default)]
pub struct Aggregations {
    fields: Vec<(String, Box<dyn ErasedAggregate>)>,
}

impl Aggregations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an aggregate, replacing any existing aggregate for the same output
    /// field.
    pub fn with<A>(mut self, output: impl Into<String>, method: A) -> Self
    where
        A: AggregateMethod + 'static,
    {
        self.push(output, method);
        self
    }

    pub fn push<A>(&mut self, output: impl Into<String>, method: A)
    where
        A: AggregateMethod + 'static,
    {
        let output = output.into();
        let method: Box<dyn ErasedAggregate> = Box::new(method);
        match self.fields.iter_mut().find(|(name, _)| *name == output) {
            Some(existing) => existing.1 = method,
            None => self.fields.push((output, method)),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &dyn ErasedAggregate)> + '_ {
        self.fields
            .iter()
            .map(|(name, agg)| (name.as_str(), agg.as_ref()))
    }
}

/// Running states for every aggregate of one group.
#[derive(Debug)]
pub(crate) struct GroupAccumulator<'a> {
    aggregations: &'a Aggregations,
    states: Vec<Box<dyn Any>>,
}

impl<'a> GroupAccumulator<'a> {
    pub(crate) fn try_new(aggregations: &'a Aggregations, first: &Row) -> Result<Self> {
        let states = aggregations
            .iter()
            .map(|(_, agg)| agg.initialize(first))
            .collect::<Result<Vec<_>>>()?;
        Ok(GroupAccumulator {
            aggregations,
            states,
        })
    }

    pub(crate) fn accumulate(&mut self, row: &Row) -> Result<()> {
        for ((_, agg), state) in self.aggregations.iter().zip(&mut self.states) {
            agg.accumulate(row, state.as_mut())?;
        }
        Ok(())
    }

    /// Finalize into `out`, keyed by output field.
    pub(crate) fn finalize_into(self, out: &mut Row) -> Result<()> {
        for ((name, agg), state) in self.aggregations.iter().zip(self.states) {
            out.insert(name, agg.finalize(state)?);
        }
        Ok(())
    }
}

/// Collapse the rows of a hierarchy leaf into a single row.
///
/// `key` holds the values of every ancestor key. Aggregates whose output is
/// fixed by those values skip the rows, the rest see each row merged with
/// the key. Returns `None` for a leaf without rows.
pub(crate) fn aggregate_leaf(
    aggregations: &Aggregations,
    key: &Row,
    rows: &[Row],
) -> Result<Option<Row>> {
    if rows.is_empty() {
        return Ok(None);
    }

    let mut merged: Option<Vec<Row>> = None;
    let mut out = Row::with_capacity(aggregations.len());
    for (name, agg) in aggregations.iter() {
        if let Some(value) = agg.fixed_by_key(key, rows.len()) {
            out.insert(name, value);
            continue;
        }

        let merged = merged.get_or_insert_with(|| rows.iter().map(|r| r.merge(key)).collect());
        let Some((first, rest)) = merged.split_first() else {
            return Err(internal!("leaf rows disappeared while aggregating"));
        };
        let mut state = agg.initialize(first)?;
        for row in rest {
            agg.accumulate(row, state.as_mut())?;
        }
        out.insert(name, agg.finalize(state)?);
    }

    Ok(Some(out))
}

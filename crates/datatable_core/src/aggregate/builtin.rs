//! Built-in aggregates.
//!
//! Numeric aggregates skip null values. Each aggregate also knows how to
//! produce its output directly when its field is fixed by a hierarchy key.

use std::collections::BTreeSet;
use std::fmt;

use datatable_error::Result;

use super::AggregateMethod;
use crate::hash::{ValueSet, new_value_set};
use crate::row::Row;
use crate::value::Value;

/// First value of the field in the group.
#[derive(Debug, Clone)]
pub struct First {
    field: String,
}

impl First {
    pub fn new(field: impl Into<String>) -> Self {
        First {
            field: field.into(),
        }
    }
}

impl AggregateMethod for First {
    type State = Value;

    fn initialize(&self, row: &Row) -> Result<Self::State> {
        Ok(row.value(&self.field)?.clone())
    }

    fn accumulate(&self, _row: &Row, _state: &mut Self::State) -> Result<()> {
        Ok(())
    }

    fn finalize(&self, state: Self::State) -> Result<Value> {
        Ok(state)
    }

    fn fixed_by_key(&self, key: &Row, _row_count: usize) -> Option<Value> {
        key.get(&self.field).cloned()
    }
}

/// First non-blank value of the field in the group.
#[derive(Debug, Clone)]
pub struct FirstNonBlank {
    field: String,
}

impl FirstNonBlank {
    pub fn new(field: impl Into<String>) -> Self {
        FirstNonBlank {
            field: field.into(),
        }
    }
}

impl AggregateMethod for FirstNonBlank {
    type State = Value;

    fn initialize(&self, row: &Row) -> Result<Self::State> {
        Ok(row.value(&self.field)?.clone())
    }

    fn accumulate(&self, row: &Row, state: &mut Self::State) -> Result<()> {
        let value = row.value(&self.field)?;
        if state.is_blank() {
            *state = value.clone();
        }
        Ok(())
    }

    fn finalize(&self, state: Self::State) -> Result<Value> {
        Ok(state)
    }

    fn fixed_by_key(&self, key: &Row, _row_count: usize) -> Option<Value> {
        key.get(&self.field).cloned()
    }
}

/// Sum of the field. A group of only nulls sums to 0.
#[derive(Debug, Clone)]
pub struct Sum {
    field: String,
}

impl Sum {
    pub fn new(field: impl Into<String>) -> Self {
        Sum {
            field: field.into(),
        }
    }
}

impl AggregateMethod for Sum {
    type State = Value;

    fn initialize(&self, row: &Row) -> Result<Self::State> {
        let value = row.value(&self.field)?;
        if value.is_null() {
            Ok(Value::Int(0))
        } else {
            Ok(value.clone())
        }
    }

    fn accumulate(&self, row: &Row, state: &mut Self::State) -> Result<()> {
        let value = row.value(&self.field)?;
        if !value.is_null() {
            *state = state.checked_add(value)?;
        }
        Ok(())
    }

    fn finalize(&self, state: Self::State) -> Result<Value> {
        Ok(state)
    }

    fn fixed_by_key(&self, key: &Row, row_count: usize) -> Option<Value> {
        key.get(&self.field)?
            .checked_mul(&Value::from(row_count))
            .ok()
    }
}

/// Number of rows in the group.
#[derive(Debug, Clone, Copy, Default)]
pub struct Count;

impl AggregateMethod for Count {
    type State = usize;

    fn initialize(&self, _row: &Row) -> Result<Self::State> {
        Ok(1)
    }

    fn accumulate(&self, _row: &Row, state: &mut Self::State) -> Result<()> {
        *state += 1;
        Ok(())
    }

    fn finalize(&self, state: Self::State) -> Result<Value> {
        Ok(Value::from(state))
    }
}

/// Number of distinct values of the field.
#[derive(Debug, Clone)]
pub struct CountDistinct {
    field: String,
}

impl CountDistinct {
    pub fn new(field: impl Into<String>) -> Self {
        CountDistinct {
            field: field.into(),
        }
    }
}

impl AggregateMethod for CountDistinct {
    type State = ValueSet;

    fn initialize(&self, row: &Row) -> Result<Self::State> {
        let mut set = new_value_set();
        set.insert(row.value(&self.field)?.clone());
        Ok(set)
    }

    fn accumulate(&self, row: &Row, state: &mut Self::State) -> Result<()> {
        let value = row.value(&self.field)?;
        if !state.contains(value) {
            state.insert(value.clone());
        }
        Ok(())
    }

    fn finalize(&self, state: Self::State) -> Result<Value> {
        Ok(Value::from(state.len()))
    }

    fn fixed_by_key(&self, key: &Row, _row_count: usize) -> Option<Value> {
        key.contains(&self.field).then_some(Value::Int(1))
    }
}

/// Sorted list of the field's distinct values.
#[derive(Debug, Clone)]
pub struct DistinctValues {
    field: String,
}

impl DistinctValues {
    pub fn new(field: impl Into<String>) -> Self {
        DistinctValues {
            field: field.into(),
        }
    }
}

impl AggregateMethod for DistinctValues {
    type State = BTreeSet<Value>;

    fn initialize(&self, row: &Row) -> Result<Self::State> {
        Ok(BTreeSet::from([row.value(&self.field)?.clone()]))
    }

    fn accumulate(&self, row: &Row, state: &mut Self::State) -> Result<()> {
        state.insert(row.value(&self.field)?.clone());
        Ok(())
    }

    fn finalize(&self, state: Self::State) -> Result<Value> {
        Ok(Value::List(state.into_iter().collect()))
    }

    fn fixed_by_key(&self, key: &Row, _row_count: usize) -> Option<Value> {
        key.get(&self.field).map(|v| Value::List(vec![v.clone()]))
    }
}

/// List of every value of the field, in row order.
#[derive(Debug, Clone)]
pub struct AllValues {
    field: String,
}

impl AllValues {
    pub fn new(field: impl Into<String>) -> Self {
        AllValues {
            field: field.into(),
        }
    }
}

impl AggregateMethod for AllValues {
    type State = Vec<Value>;

    fn initialize(&self, row: &Row) -> Result<Self::State> {
        Ok(vec![row.value(&self.field)?.clone()])
    }

    fn accumulate(&self, row: &Row, state: &mut Self::State) -> Result<()> {
        state.push(row.value(&self.field)?.clone());
        Ok(())
    }

    fn finalize(&self, state: Self::State) -> Result<Value> {
        Ok(Value::List(state))
    }

    fn fixed_by_key(&self, key: &Row, row_count: usize) -> Option<Value> {
        key.get(&self.field)
            .map(|v| Value::List(vec![v.clone(); row_count]))
    }
}

/// Text of every value joined by a separator. Leading blank values are
/// dropped.
#[derive(Debug, Clone)]
pub struct Concat {
    field: String,
    separator: String,
}

impl Concat {
    pub fn new(field: impl Into<String>, separator: impl Into<String>) -> Self {
        Concat {
            field: field.into(),
            separator: separator.into(),
        }
    }

    fn push(&self, state: &mut String, value: &Value) {
        let text = value.to_text();
        if state.is_empty() {
            *state = text;
        } else {
            state.push_str(&self.separator);
            state.push_str(&text);
        }
    }
}

impl AggregateMethod for Concat {
    type State = String;

    fn initialize(&self, row: &Row) -> Result<Self::State> {
        Ok(row.value(&self.field)?.to_text())
    }

    fn accumulate(&self, row: &Row, state: &mut Self::State) -> Result<()> {
        self.push(state, row.value(&self.field)?);
        Ok(())
    }

    fn finalize(&self, state: Self::State) -> Result<Value> {
        Ok(Value::Text(state))
    }

    fn fixed_by_key(&self, key: &Row, row_count: usize) -> Option<Value> {
        let value = key.get(&self.field)?;
        let mut state = String::new();
        for _ in 0..row_count {
            self.push(&mut state, value);
        }
        Some(Value::Text(state))
    }
}

/// Text of the distinct values, sorted and joined by a separator.
#[derive(Debug, Clone)]
pub struct ConcatDistinct {
    field: String,
    separator: String,
}

impl ConcatDistinct {
    pub fn new(field: impl Into<String>, separator: impl Into<String>) -> Self {
        ConcatDistinct {
            field: field.into(),
            separator: separator.into(),
        }
    }
}

impl AggregateMethod for ConcatDistinct {
    type State = BTreeSet<String>;

    fn initialize(&self, row: &Row) -> Result<Self::State> {
        Ok(BTreeSet::from([row.value(&self.field)?.to_text()]))
    }

    fn accumulate(&self, row: &Row, state: &mut Self::State) -> Result<()> {
        state.insert(row.value(&self.field)?.to_text());
        Ok(())
    }

    fn finalize(&self, state: Self::State) -> Result<Value> {
        let parts: Vec<String> = state.into_iter().collect();
        Ok(Value::Text(parts.join(&self.separator)))
    }

    fn fixed_by_key(&self, key: &Row, _row_count: usize) -> Option<Value> {
        key.get(&self.field).map(|v| Value::Text(v.to_text()))
    }
}

/// The same value for every group.
#[derive(Debug, Clone)]
pub struct Constant {
    value: Value,
}

impl Constant {
    pub fn new(value: impl Into<Value>) -> Self {
        Constant {
            value: value.into(),
        }
    }
}

impl AggregateMethod for Constant {
    type State = ();

    fn initialize(&self, _row: &Row) -> Result<Self::State> {
        Ok(())
    }

    fn accumulate(&self, _row: &Row, _state: &mut Self::State) -> Result<()> {
        Ok(())
    }

    fn finalize(&self, _state: Self::State) -> Result<Value> {
        Ok(self.value.clone())
    }

    fn fixed_by_key(&self, _key: &Row, _row_count: usize) -> Option<Value> {
        Some(self.value.clone())
    }
}

/// Running (sum, count) over non-null values.
#[derive(Debug, Clone, PartialEq)]
pub struct SumCount {
    sum: Value,
    count: i64,
}

impl SumCount {
    fn add(&mut self, value: &Value) -> Result<()> {
        if !value.is_null() {
            self.sum = self.sum.checked_add(value)?;
            self.count += 1;
        }
        Ok(())
    }
}

/// Mean of the non-null values. Null if there are none.
#[derive(Debug, Clone)]
pub struct Average {
    field: String,
}

impl Average {
    pub fn new(field: impl Into<String>) -> Self {
        Average {
            field: field.into(),
        }
    }
}

impl AggregateMethod for Average {
    type State = SumCount;

    fn initialize(&self, row: &Row) -> Result<Self::State> {
        let mut state = SumCount {
            sum: Value::Int(0),
            count: 0,
        };
        state.add(row.value(&self.field)?)?;
        Ok(state)
    }

    fn accumulate(&self, row: &Row, state: &mut Self::State) -> Result<()> {
        state.add(row.value(&self.field)?)
    }

    fn finalize(&self, state: Self::State) -> Result<Value> {
        if state.count == 0 {
            return Ok(Value::Null);
        }
        state.sum.checked_div(&Value::Int(state.count))
    }

    fn fixed_by_key(&self, key: &Row, _row_count: usize) -> Option<Value> {
        key.get(&self.field).cloned()
    }
}

/// Running (weighted sum, total weight), plus the averaged value while every
/// row has had the same one.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSum {
    weighted: Value,
    total_weight: Value,
    uniform: Option<Value>,
    mixed: bool,
}

/// Mean of one field weighted by another. Rows where either is null are
/// skipped. Null when the total weight is zero.
///
/// A field holding one value throughout (e.g. a hierarchy key) averages to
/// exactly that value, so there is no separate key shortcut.
#[derive(Debug, Clone)]
pub struct WeightedAverage {
    value_field: String,
    weight_field: String,
}

impl WeightedAverage {
    pub fn new(value_field: impl Into<String>, weight_field: impl Into<String>) -> Self {
        WeightedAverage {
            value_field: value_field.into(),
            weight_field: weight_field.into(),
        }
    }

    fn add(&self, row: &Row, state: &mut WeightedSum) -> Result<()> {
        let value = row.value(&self.value_field)?;
        let weight = row.value(&self.weight_field)?;
        if value.is_null() || weight.is_null() {
            return Ok(());
        }
        state.weighted = state.weighted.checked_add(&value.checked_mul(weight)?)?;
        state.total_weight = state.total_weight.checked_add(weight)?;
        match &state.uniform {
            None if !state.mixed => state.uniform = Some(value.clone()),
            Some(seen) if seen != value => {
                state.uniform = None;
                state.mixed = true;
            }
            _ => (),
        }
        Ok(())
    }
}

impl AggregateMethod for WeightedAverage {
    type State = WeightedSum;

    fn initialize(&self, row: &Row) -> Result<Self::State> {
        let mut state = WeightedSum {
            weighted: Value::Int(0),
            total_weight: Value::Int(0),
            uniform: None,
            mixed: false,
        };
        self.add(row, &mut state)?;
        Ok(state)
    }

    fn accumulate(&self, row: &Row, state: &mut Self::State) -> Result<()> {
        self.add(row, state)
    }

    fn finalize(&self, state: Self::State) -> Result<Value> {
        if state.total_weight.is_blank() {
            return Ok(Value::Null);
        }
        match state.uniform {
            Some(value) => Ok(value),
            None => state.weighted.checked_div(&state.total_weight),
        }
    }
}

fn keep_extreme(state: &mut Option<Value>, value: &Value, want: std::cmp::Ordering) {
    if value.is_null() {
        return;
    }
    match state {
        Some(current) if value.cmp(current) != want => (),
        _ => *state = Some(value.clone()),
    }
}

/// Smallest non-null value.
#[derive(Debug, Clone)]
pub struct Min {
    field: String,
}

impl Min {
    pub fn new(field: impl Into<String>) -> Self {
        Min {
            field: field.into(),
        }
    }
}

impl AggregateMethod for Min {
    type State = Option<Value>;

    fn initialize(&self, row: &Row) -> Result<Self::State> {
        let mut state = None;
        keep_extreme(&mut state, row.value(&self.field)?, std::cmp::Ordering::Less);
        Ok(state)
    }

    fn accumulate(&self, row: &Row, state: &mut Self::State) -> Result<()> {
        keep_extreme(state, row.value(&self.field)?, std::cmp::Ordering::Less);
        Ok(())
    }

    fn finalize(&self, state: Self::State) -> Result<Value> {
        Ok(state.unwrap_or_default())
    }

    fn fixed_by_key(&self, key: &Row, _row_count: usize) -> Option<Value> {
        key.get(&self.field).cloned()
    }
}

/// Largest non-null value.
#[derive(Debug, Clone)]
pub struct Max {
    field: String,
}

impl Max {
    pub fn new(field: impl Into<String>) -> Self {
        Max {
            field: field.into(),
        }
    }
}

impl AggregateMethod for Max {
    type State = Option<Value>;

    fn initialize(&self, row: &Row) -> Result<Self::State> {
        let mut state = None;
        keep_extreme(&mut state, row.value(&self.field)?, std::cmp::Ordering::Greater);
        Ok(state)
    }

    fn accumulate(&self, row: &Row, state: &mut Self::State) -> Result<()> {
        keep_extreme(state, row.value(&self.field)?, std::cmp::Ordering::Greater);
        Ok(())
    }

    fn finalize(&self, state: Self::State) -> Result<Value> {
        Ok(state.unwrap_or_default())
    }

    fn fixed_by_key(&self, key: &Row, _row_count: usize) -> Option<Value> {
        key.get(&self.field).cloned()
    }
}

/// Max minus min of the non-null values. Null if there are none.
#[derive(Debug, Clone)]
pub struct Span {
    field: String,
}

impl Span {
    pub fn new(field: impl Into<String>) -> Self {
        Span {
            field: field.into(),
        }
    }

    fn add(&self, row: &Row, state: &mut (Option<Value>, Option<Value>)) -> Result<()> {
        let value = row.value(&self.field)?;
        keep_extreme(&mut state.0, value, std::cmp::Ordering::Less);
        keep_extreme(&mut state.1, value, std::cmp::Ordering::Greater);
        Ok(())
    }
}

impl AggregateMethod for Span {
    type State = (Option<Value>, Option<Value>);

    fn initialize(&self, row: &Row) -> Result<Self::State> {
        let mut state = (None, None);
        self.add(row, &mut state)?;
        Ok(state)
    }

    fn accumulate(&self, row: &Row, state: &mut Self::State) -> Result<()> {
        self.add(row, state)
    }

    fn finalize(&self, state: Self::State) -> Result<Value> {
        match state {
            (Some(min), Some(max)) => max.checked_sub(&min),
            _ => Ok(Value::Null),
        }
    }

    fn fixed_by_key(&self, key: &Row, _row_count: usize) -> Option<Value> {
        key.contains(&self.field).then_some(Value::Int(0))
    }
}

/// Aggregate built from a plain fold function.
///
/// The accumulator starts as null and the function is called for every row,
/// including the first.
pub struct FoldAggregate<F> {
    fold: F,
}

impl<F> FoldAggregate<F>
where
    F: Fn(&Row, Value) -> Result<Value> + Send + Sync,
{
    pub fn new(fold: F) -> Self {
        FoldAggregate { fold }
    }
}

impl<F> fmt::Debug for FoldAggregate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FoldAggregate").finish_non_exhaustive()
    }
}

impl<F> AggregateMethod for FoldAggregate<F>
where
    F: Fn(&Row, Value) -> Result<Value> + Send + Sync,
{
    type State = Value;

    fn initialize(&self, row: &Row) -> Result<Self::State> {
        (self.fold)(row, Value::Null)
    }

    fn accumulate(&self, row: &Row, state: &mut Self::State) -> Result<()> {
        let acc = std::mem::take(state);
        *state = (self.fold)(row, acc)?;
        Ok(())
    }

    fn finalize(&self, state: Self::State) -> Result<Value> {
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use datatable_error::DataTableError;

    use super::*;
    use crate::row;

    fn run<A: AggregateMethod>(agg: &A, rows: &[Row]) -> Result<Value> {
        let mut state = agg.initialize(&rows[0])?;
        for row in &rows[1..] {
            agg.accumulate(row, &mut state)?;
        }
        agg.finalize(state)
    }

    fn amounts() -> Vec<Row> {
        vec![
            row! { "a" => 4, "w" => 1, "s" => "x" },
            row! { "a" => Value::Null, "w" => 5, "s" => "" },
            row! { "a" => 2, "w" => 3, "s" => "y" },
            row! { "a" => 4, "w" => 0, "s" => "x" },
        ]
    }

    #[test]
    fn firsts() {
        let rows = amounts();
        assert_eq!(Value::from(4), run(&First::new("a"), &rows).unwrap());

        let rows = vec![row! { "s" => "" }, row! { "s" => "b" }, row! { "s" => "c" }];
        assert_eq!(Value::from("b"), run(&FirstNonBlank::new("s"), &rows).unwrap());
    }

    #[test]
    fn numeric() {
        let rows = amounts();
        assert_eq!(Value::from(10), run(&Sum::new("a"), &rows).unwrap());
        assert_eq!(Value::from(4), run(&Count, &rows).unwrap());
        assert_eq!(
            Value::from(10.0 / 3.0),
            run(&Average::new("a"), &rows).unwrap()
        );
        assert_eq!(Value::from(2), run(&Min::new("a"), &rows).unwrap());
        assert_eq!(Value::from(4), run(&Max::new("a"), &rows).unwrap());
        assert_eq!(Value::from(2), run(&Span::new("a"), &rows).unwrap());
        // (4*1 + 2*3 + 4*0) / (1 + 3 + 0)
        assert_eq!(
            Value::from(2.5),
            run(&WeightedAverage::new("a", "w"), &rows).unwrap()
        );
    }

    #[test]
    fn weighted_average_zero_weight_and_constant_value() {
        let avg = WeightedAverage::new("a", "w");
        let zero = vec![row! { "a" => 3, "w" => 0 }, row! { "a" => 5, "w" => 0 }];
        assert_eq!(Value::Null, run(&avg, &zero).unwrap());

        let constant = vec![row! { "a" => 3, "w" => 2 }, row! { "a" => 3, "w" => 5 }];
        assert_eq!(Value::Int(3), run(&avg, &constant).unwrap());

        let constant_zero = vec![row! { "a" => 3, "w" => 0 }];
        assert_eq!(Value::Null, run(&avg, &constant_zero).unwrap());
        assert_eq!(None, avg.fixed_by_key(&row! { "a" => 3 }, 1));
    }

    #[test]
    fn all_nulls() {
        let rows = vec![row! { "a" => Value::Null }];
        assert_eq!(Value::from(0), run(&Sum::new("a"), &rows).unwrap());
        assert_eq!(Value::Null, run(&Average::new("a"), &rows).unwrap());
        assert_eq!(Value::Null, run(&Min::new("a"), &rows).unwrap());
        assert_eq!(Value::Null, run(&Span::new("a"), &rows).unwrap());
    }

    #[test]
    fn sets_and_lists() {
        let rows = amounts();
        assert_eq!(Value::from(3), run(&CountDistinct::new("a"), &rows).unwrap());
        assert_eq!(
            Value::List(vec![Value::Null, 2.into(), 4.into()]),
            run(&DistinctValues::new("a"), &rows).unwrap()
        );
        assert_eq!(
            Value::List(vec![4.into(), Value::Null, 2.into(), 4.into()]),
            run(&AllValues::new("a"), &rows).unwrap()
        );
    }

    #[test]
    fn concatenation() {
        let rows = amounts();
        assert_eq!(Value::from("x,,y,x"), run(&Concat::new("s", ","), &rows).unwrap());
        assert_eq!(
            Value::from(",x,y"),
            run(&ConcatDistinct::new("s", ","), &rows).unwrap()
        );
        assert_eq!(Value::from(7), run(&Constant::new(7), &rows).unwrap());
    }

    #[test]
    fn type_mismatch() {
        let rows = vec![row! { "a" => 1 }, row! { "a" => "x" }];
        let err = run(&Sum::new("a"), &rows).unwrap_err();
        assert!(matches!(err, DataTableError::TypeMismatch(_)));
    }

    #[test]
    fn fold() {
        let longest = FoldAggregate::new(|row: &Row, acc: Value| {
            let text = row.value("s")?.to_text();
            Ok(match acc {
                Value::Text(cur) if cur.len() >= text.len() => Value::Text(cur),
                _ => Value::Text(text),
            })
        });
        let rows = vec![row! { "s" => "ab" }, row! { "s" => "abc" }, row! { "s" => "a" }];
        assert_eq!(Value::from("abc"), run(&longest, &rows).unwrap());
    }

    #[test]
    fn fixed_by_key() {
        let key = row! { "a" => 3 };
        assert_eq!(Some(Value::from(12)), Sum::new("a").fixed_by_key(&key, 4));
        assert_eq!(Some(Value::from(1)), CountDistinct::new("a").fixed_by_key(&key, 4));
        assert_eq!(Some(Value::from(0)), Span::new("a").fixed_by_key(&key, 4));
        assert_eq!(
            Some(Value::List(vec![3.into(), 3.into()])),
            AllValues::new("a").fixed_by_key(&key, 2)
        );
        assert_eq!(Some(Value::from("3;3")), Concat::new("a", ";").fixed_by_key(&key, 2));
        assert_eq!(None, Sum::new("b").fixed_by_key(&key, 4));
        assert_eq!(None, Count.fixed_by_key(&key, 4));
    }
}

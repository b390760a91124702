use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use datatable_error::{DataTableError, Result};
use serde::{Deserialize, Serialize};

use crate::format::{FormatOptions, Formatter};
use crate::row::Row;

/// A single cell value.
///
/// Values of different types are totally ordered by (type rank, value) so that
/// sorting and grouping never fail on heterogeneous columns. Integers and
/// floats share a rank and compare numerically with each other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value. Sorts before everything else.
    #[default]
    Null,

    /// True or false value.
    Boolean(bool),

    /// Signed 64bit int.
    Int(i64),

    /// 64bit float.
    Float(f64),

    /// Utf-8 text.
    Text(String),

    /// Ordered list of values (e.g. the output of `DistinctValues`).
    List(Vec<Value>),

    /// A nested row.
    Record(Row),
}

/// Shared null used when a reference to a missing value is needed.
pub(crate) static NULL: Value = Value::Null;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Sub => write!(f, "subtract"),
            Self::Mul => write!(f, "multiply"),
            Self::Div => write!(f, "divide"),
        }
    }
}

impl Value {
    const fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Text(_) => 3,
            Value::List(_) => 4,
            Value::Record(_) => 5,
        }
    }

    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for "falsy" values: null, false, zero, empty text and
    /// empty composites.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Text(s) => s.is_empty(),
            Value::List(l) => l.is_empty(),
            Value::Record(r) => r.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Text form of the value used when concatenating or naming things.
    ///
    /// Text is returned without quoting and null becomes the empty string.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn checked_add(&self, other: &Value) -> Result<Value> {
        self.arith(other, ArithOp::Add)
    }

    pub fn checked_sub(&self, other: &Value) -> Result<Value> {
        self.arith(other, ArithOp::Sub)
    }

    pub fn checked_mul(&self, other: &Value) -> Result<Value> {
        self.arith(other, ArithOp::Mul)
    }

    /// Divide, always producing a float for numeric inputs.
    pub fn checked_div(&self, other: &Value) -> Result<Value> {
        self.arith(other, ArithOp::Div)
    }

    fn arith(&self, other: &Value, op: ArithOp) -> Result<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => {
                let out = match op {
                    ArithOp::Add => a.checked_add(*b),
                    ArithOp::Sub => a.checked_sub(*b),
                    ArithOp::Mul => a.checked_mul(*b),
                    ArithOp::Div => return Ok(Value::Float(*a as f64 / *b as f64)),
                };
                out.map(Value::Int).ok_or_else(|| {
                    DataTableError::type_mismatch(format!("integer overflow: {a} {op} {b}"))
                })
            }
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                // Both are numeric, at least one is a float.
                let a = self.as_f64().unwrap_or_default();
                let b = other.as_f64().unwrap_or_default();
                let out = match op {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                    ArithOp::Div => a / b,
                };
                Ok(Value::Float(out))
            }
            (Value::Text(a), Value::Text(b)) if op == ArithOp::Add => {
                Ok(Value::Text(format!("{a}{b}")))
            }
            _ => Err(DataTableError::type_mismatch(format!(
                "cannot {op} {} and {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }
}

/// Returns the float as an integer if it represents one exactly.
fn float_as_exact_int(f: f64) -> Option<i64> {
    // 2^63 as f64, exact.
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if f.fract() == 0.0 && (-BOUND..BOUND).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

fn cmp_floats(a: f64, b: f64) -> Ordering {
    // Keeps 0.0 and -0.0 equal, otherwise a total order with NaNs at the
    // ends.
    if a == b {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

fn cmp_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() {
        return if f.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    let floor = f.floor();
    match float_as_exact_int(floor) {
        Some(fi) => match i.cmp(&fi) {
            Ordering::Equal if floor != f => Ordering::Less,
            ord => ord,
        },
        None if f > 0.0 => Ordering::Less,
        None => Ordering::Greater,
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Int(a), Value::Float(b)) => cmp_int_float(*a, *b),
            (Value::Float(a), Value::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (Value::Float(a), Value::Float(b)) => cmp_floats(*a, *b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::Record(a), Value::Record(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => (),
            Value::Boolean(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => match float_as_exact_int(*f) {
                // Must agree with ints that compare equal.
                Some(i) => i.hash(state),
                None => f.to_bits().hash(state),
            },
            Value::Text(s) => s.hash(state),
            Value::List(l) => l.hash(state),
            Value::Record(r) => r.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const OPTS: FormatOptions = FormatOptions::new();
        write!(f, "{}", Formatter::new(OPTS).format_value(self))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Text(value.clone())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<Row> for Value {
    fn from(value: Row) -> Self {
        Value::Record(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Value::Null,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(values) => {
                Value::List(values.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Record(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::hash::new_value_set;

    #[test]
    fn mixed_types_sort_by_rank() {
        let mut values = vec![
            Value::from("b"),
            Value::from(3),
            Value::Null,
            Value::from(true),
            Value::from(1.5),
            Value::List(vec![]),
            Value::from("a"),
        ];
        values.sort();

        let expected = vec![
            Value::Null,
            Value::from(true),
            Value::from(1.5),
            Value::from(3),
            Value::from("a"),
            Value::from("b"),
            Value::List(vec![]),
        ];
        assert_eq!(expected, values);
    }

    #[test]
    fn int_and_float_compare_numerically() {
        assert_eq!(Value::from(2), Value::from(2.0));
        assert!(Value::from(2) < Value::from(2.5));
        assert!(Value::from(3) > Value::from(2.5));
        assert!(Value::from(-3) < Value::from(-2.5));
        assert!(Value::from(i64::MAX) < Value::from(f64::INFINITY));
        assert!(Value::from(i64::MIN) > Value::from(f64::NEG_INFINITY));
    }

    #[test]
    fn equal_numbers_hash_the_same() {
        let mut set = new_value_set();
        set.insert(Value::from(4));
        assert!(set.contains(&Value::from(4.0)));
        assert!(!set.contains(&Value::from(4.5)));
    }

    #[test]
    fn zero_and_negative_zero_are_equal() {
        assert_eq!(Value::from(0.0), Value::from(-0.0));
        assert_eq!(Value::from(0), Value::from(-0.0));
    }

    #[test]
    fn nan_is_ordered() {
        let set: BTreeSet<Value> = [Value::from(f64::NAN), Value::from(1.0), Value::from(f64::NAN)]
            .into_iter()
            .collect();
        assert_eq!(2, set.len());
    }

    #[test]
    fn blank_values() {
        assert!(Value::Null.is_blank());
        assert!(Value::from("").is_blank());
        assert!(Value::from(0).is_blank());
        assert!(Value::from(false).is_blank());
        assert!(!Value::from("x").is_blank());
        assert!(!Value::from(-1).is_blank());
    }

    #[test]
    fn arithmetic() {
        assert_eq!(Value::from(5), Value::from(2).checked_add(&Value::from(3)).unwrap());
        assert_eq!(Value::from(5.5), Value::from(2).checked_add(&Value::from(3.5)).unwrap());
        assert_eq!(Value::from(2.5), Value::from(5).checked_div(&Value::from(2)).unwrap());
        assert_eq!(Value::from("ab"), Value::from("a").checked_add(&Value::from("b")).unwrap());

        let err = Value::from("a").checked_add(&Value::from(1)).unwrap_err();
        assert!(matches!(err, DataTableError::TypeMismatch(_)));

        let err = Value::from(i64::MAX).checked_add(&Value::from(1)).unwrap_err();
        assert!(matches!(err, DataTableError::TypeMismatch(_)));
    }

    #[test]
    fn from_json() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"a": 1, "b": [true, null], "c": 1.5}"#).unwrap();
        let value = Value::from(json);
        let Value::Record(row) = value else {
            panic!("expected record")
        };
        assert_eq!(Some(&Value::from(1)), row.get("a"));
        assert_eq!(
            Some(&Value::List(vec![Value::from(true), Value::Null])),
            row.get("b")
        );
        assert_eq!(Some(&Value::from(1.5)), row.get("c"));
    }

    #[test]
    fn display() {
        assert_eq!("NULL", Value::Null.to_string());
        assert_eq!("1.5", Value::from(1.5).to_string());
        assert_eq!("2.0", Value::from(2.0).to_string());
        assert_eq!("abc", Value::from("abc").to_string());
        assert_eq!("[1, a]", Value::List(vec![1.into(), "a".into()]).to_string());
        assert_eq!("", Value::Null.to_text());
    }
}

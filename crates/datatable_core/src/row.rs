use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use datatable_error::{DataTableError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::hash::GroupKey;
use crate::value::{NULL, Value};

/// A mapping from field name to value.
///
/// Field order is remembered for display but ignored for equality, hashing
/// and ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: IndexMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Row {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get a field's value, erroring if the field doesn't exist.
    pub fn value(&self, field: &str) -> Result<&Value> {
        self.fields
            .get(field)
            .ok_or_else(|| DataTableError::missing_field(field))
    }

    /// Get a field's value, treating missing fields as null.
    pub fn get_or_null(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&NULL)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    /// Set a field, returning the previous value if there was one.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Remove a field, keeping the order of the remaining fields.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(field)
    }

    /// Rename a field in place. Does nothing if `from` doesn't exist.
    pub fn rename(&mut self, from: &str, to: impl Into<String>) {
        if let Some((idx, _, value)) = self.fields.shift_remove_full(from) {
            let (new_idx, replaced) = self.fields.insert_full(to.into(), value);
            if replaced.is_none() {
                self.fields.move_index(new_idx, idx);
            }
        }
    }

    pub fn headers(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &Value> + '_ {
        self.fields.values()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns a new row with the fields of `other` layered on top of this
    /// one. Fields in `other` win on conflict.
    pub fn merge(&self, other: &Row) -> Row {
        let mut out = self.clone();
        out.merge_in_place(other);
        out
    }

    pub fn merge_in_place(&mut self, other: &Row) {
        for (k, v) in &other.fields {
            self.fields.insert(k.clone(), v.clone());
        }
    }

    /// Returns a row containing only the requested fields that exist in this
    /// row.
    pub fn project<S: AsRef<str>>(&self, fields: &[S]) -> Row {
        let mut out = Row::with_capacity(fields.len());
        for field in fields {
            if let Some(v) = self.fields.get(field.as_ref()) {
                out.fields.insert(field.as_ref().to_string(), v.clone());
            }
        }
        out
    }

    /// Extract the values for `fields` in order.
    ///
    /// Errors if any of the fields is missing.
    pub fn key<S: AsRef<str>>(&self, fields: &[S]) -> Result<GroupKey> {
        fields
            .iter()
            .map(|f| self.value(f.as_ref()).cloned())
            .collect()
    }

    /// Extract the values for `fields` in order, using null for missing
    /// fields.
    pub fn key_or_null<S: AsRef<str>>(&self, fields: &[S]) -> GroupKey {
        fields
            .iter()
            .map(|f| self.get_or_null(f.as_ref()).clone())
            .collect()
    }

    /// Fields sorted by name, used for order insensitive comparisons.
    fn sorted_fields(&self) -> Vec<(&String, &Value)> {
        let mut fields: Vec<_> = self.fields.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        fields
    }
}

impl Hash for Row {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fields.len().hash(state);
        for (k, v) in self.sorted_fields() {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl Ord for Row {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sorted_fields().cmp(&other.sorted_fields())
    }
}

impl PartialOrd for Row {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Row {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K, V> Extend<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.fields.insert(k.into(), v.into());
        }
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Construct a row from `field => value` pairs.
///
/// ```
/// use datatable_core::row;
///
/// let row = row! { "id" => 1, "name" => "a" };
/// assert_eq!(2, row.len());
/// ```
#[macro_export]
macro_rules! row {
    () => {
        $crate::row::Row::new()
    };
    ($($field:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::row::Row::new();
        $( row.insert($field, $value); )+
        row
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::new_key_set;

    #[test]
    fn equality_ignores_field_order() {
        let a = row! { "a" => 1, "b" => 2 };
        let b = row! { "b" => 2, "a" => 1 };
        assert_eq!(a, b);
        assert_eq!(Ordering::Equal, a.cmp(&b));

        let mut set = new_key_set();
        set.insert(vec![Value::Record(a)]);
        assert!(set.contains(&vec![Value::Record(b)]));
    }

    #[test]
    fn merge_other_wins() {
        let a = row! { "a" => 1, "b" => 2 };
        let b = row! { "b" => 3, "c" => 4 };
        let merged = a.merge(&b);
        assert_eq!(row! { "a" => 1, "b" => 3, "c" => 4 }, merged);
    }

    #[test]
    fn missing_field_errors() {
        let row = row! { "a" => 1 };
        let err = row.value("b").unwrap_err();
        assert!(matches!(err, DataTableError::MissingField(f) if f == "b"));
        assert_eq!(&Value::Null, row.get_or_null("b"));
    }

    #[test]
    fn key_extraction() {
        let row = row! { "a" => 1, "b" => "x" };
        assert_eq!(vec![Value::from("x"), Value::from(1)], row.key(&["b", "a"]).unwrap());
        assert!(row.key(&["c"]).is_err());
        assert_eq!(vec![Value::Null], row.key_or_null(&["c"]));
    }

    #[test]
    fn rename_keeps_position() {
        let mut row = row! { "a" => 1, "b" => 2, "c" => 3 };
        row.rename("b", "z");
        assert_eq!(vec!["a", "z", "c"], row.headers().collect::<Vec<_>>());
        assert_eq!(Some(&Value::from(2)), row.get("z"));

        row.rename("missing", "y");
        assert_eq!(3, row.len());
    }

    #[test]
    fn project_skips_missing() {
        let row = row! { "a" => 1, "b" => 2 };
        assert_eq!(row! { "b" => 2 }, row.project(&["b", "c"]));
    }
}

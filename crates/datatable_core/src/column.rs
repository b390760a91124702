use std::collections::BTreeSet;

use datatable_error::{DataTableError, Result};

use crate::criterion::{ColumnMutation, FilterCriterion};
use crate::hash::{OrderedValueMap, new_ordered_value_map};
use crate::table::Table;
use crate::value::{NULL, Value};

/// Read-only view of one header's values across a table's rows.
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    table: &'a Table,
    header: &'a str,
}

impl<'a> Column<'a> {
    /// Create a view, erroring if the table doesn't have the header.
    pub(crate) fn try_new(table: &'a Table, header: &'a str) -> Result<Self> {
        if !table.has_header(header) {
            return Err(DataTableError::missing_field(header));
        }
        Ok(Column { table, header })
    }

    pub fn header(&self) -> &'a str {
        self.header
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &'a Value> + 'a {
        let header = self.header;
        self.table
            .rows()
            .iter()
            .map(move |row| row.get(header).unwrap_or(&NULL))
    }

    pub fn get(&self, idx: usize) -> Option<&'a Value> {
        self.table.rows().get(idx).map(|row| row.get_or_null(self.header))
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.values().any(|v| v == value)
    }

    /// Returns the rows whose value for this column matches the criterion.
    pub fn filter(&self, criterion: &FilterCriterion) -> Result<Table> {
        if let FilterCriterion::SameColumn(other) = criterion {
            if !self.table.has_header(other) {
                return Err(DataTableError::missing_field(other.as_str()));
            }
        }
        self.table
            .try_filter(|row| criterion.matches(row, self.header))
    }

    /// Number of rows per distinct value, in first-seen order.
    pub fn size_of_groups(&self) -> OrderedValueMap<usize> {
        let mut groups = new_ordered_value_map();
        for value in self.values() {
            *groups.entry(value.clone()).or_insert(0) += 1;
        }
        groups
    }

    /// Distinct values, sorted.
    pub fn distinct_values(&self) -> Vec<Value> {
        self.values()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Criterion matching any value in this column. Useful for filtering one
    /// table by the contents of another.
    pub fn to_criterion(&self) -> FilterCriterion {
        FilterCriterion::value_set(self.values().cloned())
    }
}

/// Mutable handle to one column of a table.
///
/// Changes are applied directly to the owning table.
#[derive(Debug)]
pub struct ColumnMut<'a> {
    table: &'a mut Table,
    header: String,
}

impl<'a> ColumnMut<'a> {
    pub(crate) fn try_new(table: &'a mut Table, header: &str) -> Result<Self> {
        if !table.has_header(header) {
            return Err(DataTableError::missing_field(header));
        }
        Ok(ColumnMut {
            table,
            header: header.to_string(),
        })
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn as_column(&self) -> Column<'_> {
        Column {
            table: &*self.table,
            header: &self.header,
        }
    }

    /// Overwrite every value in the column. Nothing is written if the
    /// mutation fails for any row.
    pub fn set(&mut self, mutation: &ColumnMutation) -> Result<()> {
        let values = self
            .table
            .rows()
            .iter()
            .map(|row| mutation.apply(row))
            .collect::<Result<Vec<_>>>()?;
        for (row, value) in self.table.rows_mut().zip(values) {
            row.insert(self.header.as_str(), value);
        }
        Ok(())
    }

    /// Forward-fill blank values with the nearest preceding non-blank value.
    pub fn fill_down_blanks(&mut self) {
        let mut last: Option<Value> = None;
        for row in self.table.rows_mut() {
            let Some(value) = row.get_mut(&self.header) else {
                continue;
            };
            if value.is_blank() {
                if let Some(last) = &last {
                    *value = last.clone();
                }
            } else {
                last = Some(value.clone());
            }
        }
    }

    /// Sort the owning table by this column.
    pub fn sort(&mut self) -> Result<()> {
        self.table.sort(&[self.header.as_str()])
    }
}

/// True if every value in the column is null.
pub fn none_columns(column: &Column<'_>) -> bool {
    column.values().all(|v| v.is_null())
}

/// True if every value in the column is blank.
pub fn empty_columns(column: &Column<'_>) -> bool {
    column.values().all(|v| v.is_blank())
}

/// True if at least one value in the column is not blank.
pub fn has_value_columns(column: &Column<'_>) -> bool {
    !empty_columns(column)
}

/// True if the column holds exactly one distinct value.
pub fn single_value_columns(column: &Column<'_>) -> bool {
    let mut values = column.values();
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn people() -> Table {
        Table::from_rows([
            row! { "name" => "a", "team" => "x", "boss" => "a" },
            row! { "name" => "b", "team" => "", "boss" => "a" },
            row! { "name" => "c", "team" => Value::Null, "boss" => "c" },
            row! { "name" => "d", "team" => "y", "boss" => "a" },
        ])
    }

    #[test]
    fn missing_column() {
        let table = people();
        assert!(matches!(
            table.column("nope").unwrap_err(),
            DataTableError::MissingField(_)
        ));
    }

    #[test]
    fn values_and_groups() {
        let table = people();
        let boss = table.column("boss").unwrap();
        assert_eq!(4, boss.len());
        assert!(boss.contains(&Value::from("c")));
        assert_eq!(Some(&Value::from("a")), boss.get(1));

        let groups = boss.size_of_groups();
        assert_eq!(Some(&3), groups.get(&Value::from("a")));
        assert_eq!(Some(&1), groups.get(&Value::from("c")));
        assert_eq!(
            vec![&Value::from("a"), &Value::from("c")],
            groups.keys().collect::<Vec<_>>()
        );
        assert_eq!(vec![Value::from("a"), Value::from("c")], boss.distinct_values());
    }

    #[test]
    fn filter_same_column() {
        let table = people();
        let out = table
            .column("name")
            .unwrap()
            .filter(&FilterCriterion::same_column("boss"))
            .unwrap();
        assert_eq!(2, out.len());

        let err = table
            .column("name")
            .unwrap()
            .filter(&FilterCriterion::same_column("missing"))
            .unwrap_err();
        assert!(matches!(err, DataTableError::MissingField(_)));
    }

    #[test]
    fn fill_down() {
        let mut table = people();
        table.column_mut("team").unwrap().fill_down_blanks();
        let teams: Vec<_> = table.column("team").unwrap().values().cloned().collect();
        assert_eq!(
            vec![Value::from("x"), Value::from("x"), Value::from("x"), Value::from("y")],
            teams
        );
    }

    #[test]
    fn set_through_handle_is_visible() {
        let mut table = people();
        table
            .column_mut("team")
            .unwrap()
            .set(&ColumnMutation::row_fn(|r| r.get_or_null("name").clone()))
            .unwrap();
        assert!(table.rows().iter().all(|r| r.get("team") == r.get("name")));
    }

    #[test]
    fn failed_set_leaves_column_untouched() {
        let mut table = people();
        let before = table.clone();
        let err = table
            .column_mut("team")
            .unwrap()
            .set(&ColumnMutation::try_row_fn(|r| {
                r.get_or_null("name").checked_sub(&Value::from(1))
            }))
            .unwrap_err();
        assert!(matches!(err, DataTableError::TypeMismatch(_)), "{err}");
        assert_eq!(before, table);
    }

    #[test]
    fn predicates() {
        let table = Table::from_rows([
            row! { "n" => Value::Null, "e" => "", "s" => 1, "v" => 1 },
            row! { "n" => Value::Null, "e" => 0, "s" => 1, "v" => 2 },
        ]);
        let check = |h: &str, f: fn(&Column<'_>) -> bool| f(&table.column(h).unwrap());

        assert!(check("n", none_columns));
        assert!(!check("e", none_columns));
        assert!(check("e", empty_columns));
        assert!(check("v", has_value_columns));
        assert!(check("s", single_value_columns));
        assert!(!check("v", single_value_columns));
    }
}

use datatable_error::Result;
use hashbrown::hash_map::Entry;
use tracing::debug;

use super::Table;
use crate::aggregate::{Aggregations, GroupAccumulator};
use crate::hash::new_key_map;
use crate::row::Row;

impl Table {
    /// Group rows by `group_by` and compute each aggregate per group.
    ///
    /// Output rows hold the group fields plus one field per aggregate, sorted
    /// by group key. With no aggregates this is the distinct set of group
    /// values in first-seen order.
    pub fn aggregate<S: AsRef<str>>(&self, group_by: &[S], aggregations: &Aggregations) -> Result<Table> {
        if aggregations.is_empty() {
            return Ok(self.projected(group_by).distinct());
        }
        if !self.rows.is_empty() {
            self.check_headers(group_by)?;
        }

        let mut groups = new_key_map::<GroupAccumulator>();
        for row in &self.rows {
            match groups.entry(row.key(group_by)?) {
                Entry::Occupied(mut ent) => ent.get_mut().accumulate(row)?,
                Entry::Vacant(ent) => {
                    ent.insert(GroupAccumulator::try_new(aggregations, row)?);
                }
            }
        }

        let mut groups: Vec<_> = groups.into_iter().collect();
        groups.sort_by(|a, b| a.0.cmp(&b.0));

        debug!(rows = self.rows.len(), groups = groups.len(), "aggregated table");

        let mut headers: std::collections::BTreeSet<String> =
            group_by.iter().map(|f| f.as_ref().to_string()).collect();
        headers.extend(aggregations.names().map(|n| n.to_string()));

        let mut rows = Vec::with_capacity(groups.len());
        for (key, acc) in groups {
            let mut row: Row = group_by
                .iter()
                .map(|f| f.as_ref())
                .zip(key)
                .collect();
            acc.finalize_into(&mut row)?;
            rows.push(row);
        }

        Ok(Table::from_parts(headers, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Count, Sum};
    use crate::table;
    use crate::value::Value;

    #[test]
    fn sum_and_count_sorted_by_key() {
        let t = table!(["dept", "amount"]; ["B", 7], ["A", 10], ["A", 5]);
        let aggs = Aggregations::new()
            .with("total", Sum::new("amount"))
            .with("n", Count);
        let out = t.aggregate(&["dept"], &aggs).unwrap();
        assert_eq!(
            table!(["dept", "total", "n"]; ["A", 15, 2], ["B", 7, 1]),
            out
        );
    }

    #[test]
    fn no_aggregates_is_distinct_projection() {
        let t = table!(["dept", "amount"]; ["B", 7], ["A", 10], ["A", 5]);
        let out = t.aggregate(&["dept"], &Aggregations::new()).unwrap();
        assert_eq!(table!(["dept"]; ["B"], ["A"]), out);
    }

    #[test]
    fn counts_conserve_rows() {
        let t = table!(["k"]; [1], [2], [1], [Value::Null], [1]);
        let out = t
            .aggregate(&["k"], &Aggregations::new().with("n", Count))
            .unwrap();
        let total: i64 = out
            .column("n")
            .unwrap()
            .values()
            .filter_map(|v| v.as_i64())
            .sum();
        assert_eq!(t.len() as i64, total);
        assert_eq!(Some(&Value::Null), out.rows()[0].get("k"));
    }

    #[test]
    fn empty_table() {
        let t = Table::with_headers(["k", "v"]);
        let out = t
            .aggregate(&["k"], &Aggregations::new().with("n", Count))
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(vec!["k", "n"], out.headers().collect::<Vec<_>>());
    }

    #[test]
    fn missing_group_field() {
        let t = table!(["k"]; [1]);
        assert!(
            t.aggregate(&["nope"], &Aggregations::new().with("n", Count))
                .is_err()
        );
    }
}

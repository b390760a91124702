use datatable_error::Result;
use tracing::debug;

use super::{Hierarchy, Node};
use crate::criterion::ColumnMutation;
use crate::table::Table;
use crate::value::Value;

/// Field tagging which side of a diff a row came from.
pub const RESULTS_FIELD: &str = "_results";

const FROM: &str = "From";
const TO: &str = "To";

/// Diff two tables as a hierarchy.
///
/// Rows are tagged with `_results` = `From` or `To`, then indexed by the
/// bucket fields present in either table followed by `_results`. Branches
/// where the `From` and `To` leaves are identical are pruned. Returns `None`
/// when nothing differs.
pub fn diff_tables<S: AsRef<str>>(from: &Table, to: &Table, buckets: &[S]) -> Result<Option<Hierarchy>> {
    let tagged_from = from.extended([(RESULTS_FIELD, ColumnMutation::constant(FROM))])?;
    let tagged_to = to.extended([(RESULTS_FIELD, ColumnMutation::constant(TO))])?;
    let combined = tagged_from.augmented(&tagged_to);

    let mut keys: Vec<&str> = buckets
        .iter()
        .map(|b| b.as_ref())
        .filter(|b| combined.has_header(b))
        .collect();
    keys.push(RESULTS_FIELD);

    let indexed = Hierarchy::from_table(&combined, &keys, None)?;
    let scrubbed = scrub(indexed).filter(|h| !h.is_empty());

    debug!(
        from = from.len(),
        to = to.len(),
        differing = scrubbed.as_ref().map(Hierarchy::len).unwrap_or(0),
        "diffed tables as hierarchy"
    );

    Ok(scrubbed)
}

fn scrub(h: Hierarchy) -> Option<Hierarchy> {
    if h.key_headers.len() == 1 {
        let from = h.get(&Value::from(FROM));
        let to = h.get(&Value::from(TO));
        return match (from, to) {
            (Some(from), Some(to)) if from == to => None,
            _ => Some(h),
        };
    }

    let mut out = h.empty_like();
    for (key, node) in h.children {
        let Node::Branch(child) = node else {
            continue;
        };
        if let Some(child) = scrub(child) {
            if !child.is_empty() {
                out.children.insert(key, Node::Branch(child));
            }
        }
    }
    Some(out)
}

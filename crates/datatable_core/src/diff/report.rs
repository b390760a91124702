use std::collections::BTreeSet;

use datatable_error::Result;

use super::{DiffResult, ResultSet};
use crate::config::EngineConfig;
use crate::format::Formatter;
use crate::format::fixed_width::render_cells;

/// Render a result set as a plain text report.
///
/// Cardinality mismatches come first with their row counts, followed by a
/// table of from/to values for every changed field of the comparable
/// results. Key columns are right aligned, everything else left aligned.
pub(super) fn render(results: &ResultSet, config: &EngineConfig) -> Result<String> {
    if results.is_empty() {
        return Ok("No results to compare".to_string());
    }

    let formatter = Formatter::new(config.format_options());
    let key_cells = |r: &DiffResult| -> Vec<String> {
        r.key()
            .iter()
            .map(|v| formatter.format_value(v).to_string())
            .collect()
    };

    let mut widths: Vec<usize> = results
        .key_fields()
        .iter()
        .map(|f| f.chars().count())
        .collect();
    for result in results.iter() {
        for (width, cell) in widths.iter_mut().zip(key_cells(result)) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let key_header = format_keys(results.key_fields(), &widths);

    let mut lines = Vec::new();

    let (mismatches, common): (Vec<&DiffResult>, Vec<&DiffResult>) =
        results.iter().partition(|r| r.is_cardinality_mismatch());

    if !mismatches.is_empty() {
        lines.push("Buckets don't match number of rows:".to_string());
        lines.push(format!("{key_header} From Rows    To Rows"));
        let count_width = config.diff_count_width;
        for result in mismatches {
            let line = format!(
                "{} {:<count_width$} {:<count_width$}",
                format_keys(&key_cells(result), &widths),
                result.from_count(),
                result.to_count(),
            );
            lines.push(line.trim_end().to_string());
        }
    }

    if common.is_empty() {
        lines.push("No inline differences".to_string());
        return Ok(lines.join("\n"));
    }

    lines.push("Changes in common buckets:".to_string());

    let fields: BTreeSet<&str> = common
        .iter()
        .flat_map(|r| r.changes().keys().map(|k| k.as_str()))
        .collect();

    // Each field gets two columns, the field name heads the "from" column.
    let mut headers = Vec::with_capacity(fields.len() * 2 + 1);
    headers.push(key_header);
    for field in &fields {
        headers.push(field.to_string());
        headers.push(String::new());
    }

    let cells: Vec<Vec<String>> = common
        .iter()
        .map(|result| {
            let mut line = Vec::with_capacity(headers.len());
            line.push(format_keys(&key_cells(result), &widths));
            for field in &fields {
                match result.change(field) {
                    Some(change) => {
                        line.push(formatter.format_value(&change.from).to_string());
                        line.push(formatter.format_value(&change.to).to_string());
                    }
                    None => {
                        line.push(String::new());
                        line.push(String::new());
                    }
                }
            }
            line
        })
        .collect();

    lines.push(render_cells(&headers, &cells)?);

    Ok(lines.join("\n"))
}

fn format_keys<S: AsRef<str>>(keys: &[S], widths: &[usize]) -> String {
    let keys: Vec<String> = keys
        .iter()
        .zip(widths)
        .map(|(k, width)| format!("{:>width$}", k.as_ref()))
        .collect();
    format!("{} |", keys.join(", "))
}

use std::fmt::Write as _;

use datatable_error::Result;

use crate::format::{FormatOptions, Formatter};
use crate::row::Row;

/// Render rows as fixed-width text.
///
/// Columns are the given headers in sorted order, each padded to the widest
/// of its header and values and separated by a single space. The first line
/// holds the headers. Trailing whitespace is trimmed from every line.
pub fn fixed_width<'a, H, I>(headers: H, rows: I, options: &FormatOptions) -> Result<String>
where
    H: IntoIterator<Item = &'a str>,
    I: IntoIterator<Item = &'a Row>,
{
    let formatter = Formatter::new(options.clone());

    let mut headers: Vec<&str> = headers.into_iter().collect();
    headers.sort_unstable();
    headers.dedup();

    let cells: Vec<Vec<String>> = rows
        .into_iter()
        .map(|row| {
            headers
                .iter()
                .map(|h| formatter.format_value(row.get_or_null(h)).to_string())
                .collect()
        })
        .collect();

    render_cells(&headers, &cells)
}

/// Render pre-formatted cells under the given headers, in the given order.
///
/// Lines shorter than the header list leave the trailing columns empty.
pub(crate) fn render_cells<S: AsRef<str>>(headers: &[S], lines: &[Vec<String>]) -> Result<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.as_ref().chars().count()).collect();
    for line in lines {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut buf = String::new();
    write_line(&mut buf, headers.iter().map(|h| h.as_ref()), &widths)?;
    for line in lines {
        buf.push('\n');
        write_line(&mut buf, line.iter().map(|s| s.as_str()), &widths)?;
    }

    Ok(buf)
}

fn write_line<'a>(
    buf: &mut String,
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize],
) -> Result<()> {
    let start = buf.len();
    for (idx, (cell, width)) in cells.zip(widths).enumerate() {
        if idx > 0 {
            buf.push(' ');
        }
        let width = *width;
        write!(buf, "{cell:<width$}")?;
    }
    let trimmed = buf[start..].trim_end().len();
    buf.truncate(start + trimmed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::value::Value;

    #[test]
    fn aligned_columns() {
        let rows = [
            row! { "name" => "alice", "id" => 1 },
            row! { "name" => "bo", "id" => 22, "note" => Value::Null },
        ];
        let out = fixed_width(["name", "id", "note"], &rows, &FormatOptions::new()).unwrap();

        let expected = "\
id name  note
1  alice NULL
22 bo    NULL";
        assert_eq!(expected, out);
    }

    #[test]
    fn headers_only() {
        let out = fixed_width(["b", "a"], [], &FormatOptions::new()).unwrap();
        assert_eq!("a b", out);
    }
}

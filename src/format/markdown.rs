use crate::error::DoltMiddlewareError;
use crate::results::ResultSet;

use super::row_fields;

/// Render a GitHub-style pipe table: header, `---` separator, one line per row.
///
/// Pipes inside values are escaped and line breaks become `<br>` so every row
/// stays on one line. NULL renders as an empty cell. A result with no columns
/// renders as the empty string.
///
/// # Errors
/// Returns `MissingColumn` if a row lacks a declared column.
pub fn to_markdown(result_set: &ResultSet) -> Result<String, DoltMiddlewareError> {
    let columns = result_set.column_names();
    if columns.is_empty() {
        return Ok(String::new());
    }

    let mut out = String::new();
    write_line(&mut out, columns.iter().map(|c| escape_cell(c)));
    write_line(&mut out, columns.iter().map(|_| "---".to_string()));
    for row in &result_set.results {
        let fields = row_fields(columns, row)?;
        write_line(&mut out, fields.iter().map(|f| escape_cell(f)));
    }
    Ok(out)
}

fn write_line(out: &mut String, cells: impl Iterator<Item = String>) {
    out.push('|');
    for cell in cells {
        out.push(' ');
        out.push_str(&cell);
        out.push_str(" |");
    }
    out.push('\n');
}

fn escape_cell(value: &str) -> String {
    value
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace(['\n', '\r'], "<br>")
}

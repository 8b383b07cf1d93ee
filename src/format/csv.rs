use crate::error::DoltMiddlewareError;
use crate::results::ResultSet;

use super::row_fields;

/// Render a header line plus one line per row, `\n`-terminated.
///
/// Fields containing a comma, quote, CR or LF, or starting with a space, are
/// double-quoted with embedded quotes doubled. NULL is an empty field. A
/// result with no columns renders as the empty string.
///
/// # Errors
/// Returns `MissingColumn` if a row lacks a declared column.
pub fn to_csv(result_set: &ResultSet) -> Result<String, DoltMiddlewareError> {
    let columns = result_set.column_names();
    if columns.is_empty() {
        return Ok(String::new());
    }
    let mut out = String::new();
    write_record(&mut out, columns.iter().map(String::as_str));
    for row in &result_set.results {
        let fields = row_fields(columns, row)?;
        write_record(&mut out, fields.iter().map(String::as_str));
    }
    Ok(out)
}

fn write_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_field(out, field);
    }
    out.push('\n');
}

fn write_field(out: &mut String, field: &str) {
    if !needs_quotes(field) {
        out.push_str(field);
        return;
    }
    out.push('"');
    for ch in field.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

fn needs_quotes(field: &str) -> bool {
    field.starts_with(' ')
        || field.starts_with('\t')
        || field.contains([',', '"', '\r', '\n'])
}

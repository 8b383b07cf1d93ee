//! Allow-list validation for names interpolated into structural SQL.
//!
//! Database, branch and table names cannot be bound as parameters in `USE`,
//! `DESCRIBE` or the text-protocol `CALL DOLT_*` statements, so every name goes
//! through one of these validators before it is spliced into SQL text.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::DoltMiddlewareError;

static DATABASE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_$-]{0,63}$").expect("valid regex"));

static TABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_$-]{0,63}$").expect("valid regex"));

static BRANCH_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_./-]{0,254}$").expect("valid regex"));

static REVISION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_./~^-]{0,254}$").expect("valid regex"));

/// Validate a database name.
///
/// # Errors
/// Returns `InvalidIdentifier` if the name falls outside `[A-Za-z0-9_$-]`, is
/// empty, or exceeds 64 characters.
pub fn validate_database_name(name: &str) -> Result<&str, DoltMiddlewareError> {
    check("database", name, &DATABASE_NAME)
}

/// Validate a table name.
///
/// # Errors
/// Returns `InvalidIdentifier` under the same grammar as database names.
pub fn validate_table_name(name: &str) -> Result<&str, DoltMiddlewareError> {
    check("table", name, &TABLE_NAME)
}

/// Validate a branch name (ref-like: letters, digits, `_ . / -`).
///
/// # Errors
/// Returns `InvalidIdentifier` for names outside the grammar, names containing
/// `..` or `//`, and names ending in `/`, `.` or `.lock`.
pub fn validate_branch_name(name: &str) -> Result<&str, DoltMiddlewareError> {
    check("branch", name, &BRANCH_NAME)?;
    if name.contains("..")
        || name.contains("//")
        || name.ends_with('/')
        || name.ends_with('.')
        || name.ends_with(".lock")
    {
        return Err(invalid("branch", name));
    }
    Ok(name)
}

/// Validate a revision: a branch name, commit hash, tag, or ancestry spec such
/// as `HEAD~2` or `main^`. `WORKING` and `STAGED` pass as plain names.
///
/// # Errors
/// Returns `InvalidIdentifier` for anything outside `[A-Za-z0-9_./~^-]`.
pub fn validate_revision(revision: &str) -> Result<&str, DoltMiddlewareError> {
    check("revision", revision, &REVISION)?;
    if revision.contains("..") {
        return Err(invalid("revision", revision));
    }
    Ok(revision)
}

/// Backtick-quote an identifier that has already passed validation.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Single-quoted SQL string literal with `\` and `'` escaped.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("''"),
            '\0' => out.push_str("\\0"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

fn check<'a>(kind: &'static str, name: &'a str, re: &Regex) -> Result<&'a str, DoltMiddlewareError> {
    if re.is_match(name) {
        Ok(name)
    } else {
        Err(invalid(kind, name))
    }
}

fn invalid(kind: &'static str, name: &str) -> DoltMiddlewareError {
    DoltMiddlewareError::InvalidIdentifier {
        kind,
        value: name.to_string(),
    }
}

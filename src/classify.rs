//! Read/write classification of caller-supplied statements.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::DoltMiddlewareError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Read,
    Write,
}

impl StatementKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Read => "read",
            StatementKind::Write => "write",
        }
    }
}

/// Decides whether a statement only reads.
pub trait StatementClassifier: Send + Sync {
    /// # Errors
    /// Returns an error if the statement cannot be classified.
    fn classify(&self, sql: &str) -> Result<StatementKind, DoltMiddlewareError>;
}

static LEADING_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\s+|--[^\n]*(?:\n|$)|#[^\n]*(?:\n|$)|(?s:/\*.*?\*/)|\()*").expect("valid regex")
});

static FIRST_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+").expect("valid regex"));

/// Classifies by the first keyword after comments, whitespace and parentheses.
///
/// `SELECT`, `SHOW`, `DESCRIBE`/`DESC`, `EXPLAIN`, `WITH`, `VALUES` and `TABLE`
/// are reads; anything else is a write. `SELECT ... INTO` and CTEs that modify
/// data are not detected.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl StatementClassifier for KeywordClassifier {
    fn classify(&self, sql: &str) -> Result<StatementKind, DoltMiddlewareError> {
        let rest = match LEADING_NOISE.find(sql) {
            Some(m) => &sql[m.end()..],
            None => sql,
        };
        let word = FIRST_WORD
            .find(rest)
            .map(|m| m.as_str().to_ascii_uppercase())
            .ok_or_else(|| {
                DoltMiddlewareError::invalid_argument("query", "contains no SQL statement")
            })?;
        Ok(match word.as_str() {
            "SELECT" | "SHOW" | "DESCRIBE" | "DESC" | "EXPLAIN" | "WITH" | "VALUES" | "TABLE" => {
                StatementKind::Read
            }
            _ => StatementKind::Write,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_and_writes() {
        let c = KeywordClassifier;
        assert_eq!(c.classify("SELECT 1;").unwrap(), StatementKind::Read);
        assert_eq!(c.classify("  show tables").unwrap(), StatementKind::Read);
        assert_eq!(
            c.classify("-- note\n/* block */ (select * from t)").unwrap(),
            StatementKind::Read
        );
        assert_eq!(c.classify("INSERT INTO t VALUES (1)").unwrap(), StatementKind::Write);
        assert_eq!(c.classify("CALL DOLT_COMMIT('-m', 'x')").unwrap(), StatementKind::Write);
        assert!(c.classify("   -- only a comment").is_err());
    }
}

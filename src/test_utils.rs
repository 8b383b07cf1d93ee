//! In-memory scripted sessions for exercising transaction discipline without a
//! running Dolt server.
//!
//! Statements are recorded per session together with the database and branch
//! the session was positioned on when the statement ran. Non-control statements
//! are buffered until `COMMIT`, so [`ScriptedConnector::committed`] shows exactly
//! what a real server would have persisted.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::DoltMiddlewareError;
use crate::results::ResultSet;
use crate::session::{Connector, Session};

/// One statement as seen by a scripted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executed {
    pub session: usize,
    pub database: Option<String>,
    pub branch: Option<String>,
    pub sql: String,
}

#[derive(Default)]
struct ScriptState {
    executed: Vec<Executed>,
    committed: Vec<String>,
    sessions_opened: usize,
    sessions_closed: usize,
    databases: Option<HashSet<String>>,
    branches: Option<HashSet<String>>,
    failures: Vec<(String, String)>,
    responses: Vec<(String, ResultSet)>,
    delays: Vec<(String, Duration)>,
    connect_error: Option<String>,
    ping_error: Option<String>,
}

/// Connector handing out [`ScriptedSession`]s that share one script and log.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Only these databases exist; `USE` of any other fails.
    pub fn with_databases(&self, names: &[&str]) -> &Self {
        self.lock().databases = Some(names.iter().map(|n| (*n).to_string()).collect());
        self
    }

    /// Only these branches exist; checkout of any other fails.
    pub fn with_branches(&self, names: &[&str]) -> &Self {
        self.lock().branches = Some(names.iter().map(|n| (*n).to_string()).collect());
        self
    }

    /// Any statement containing `pattern` fails with `message`.
    pub fn fail_on(&self, pattern: &str, message: &str) -> &Self {
        self.lock()
            .failures
            .push((pattern.to_string(), message.to_string()));
        self
    }

    /// Queries containing `pattern` return `result`.
    pub fn respond(&self, pattern: &str, result: ResultSet) -> &Self {
        self.lock().responses.push((pattern.to_string(), result));
        self
    }

    /// Statements containing `pattern` take `delay` before completing.
    pub fn delay(&self, pattern: &str, delay: Duration) -> &Self {
        self.lock().delays.push((pattern.to_string(), delay));
        self
    }

    pub fn fail_connect(&self, message: &str) -> &Self {
        self.lock().connect_error = Some(message.to_string());
        self
    }

    pub fn fail_ping(&self, message: &str) -> &Self {
        self.lock().ping_error = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn executed(&self) -> Vec<Executed> {
        self.lock().executed.clone()
    }

    #[must_use]
    pub fn statements(&self) -> Vec<String> {
        self.lock().executed.iter().map(|e| e.sql.clone()).collect()
    }

    /// Number of executed statements equal to `sql`.
    #[must_use]
    pub fn count(&self, sql: &str) -> usize {
        self.lock().executed.iter().filter(|e| e.sql == sql).count()
    }

    /// Non-control statements made durable by a `COMMIT`.
    #[must_use]
    pub fn committed(&self) -> Vec<String> {
        self.lock().committed.clone()
    }

    #[must_use]
    pub fn sessions_opened(&self) -> usize {
        self.lock().sessions_opened
    }

    #[must_use]
    pub fn sessions_closed(&self) -> usize {
        self.lock().sessions_closed
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self) -> Result<Box<dyn Session>, DoltMiddlewareError> {
        let mut state = self.lock();
        if let Some(message) = &state.connect_error {
            return Err(DoltMiddlewareError::ConnectionError(message.clone()));
        }
        state.sessions_opened += 1;
        Ok(Box::new(ScriptedSession {
            id: state.sessions_opened,
            state: Arc::clone(&self.state),
            database: None,
            branch: None,
            pending: Vec::new(),
        }))
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// A session driven by a [`ScriptedConnector`] script.
pub struct ScriptedSession {
    id: usize,
    state: Arc<Mutex<ScriptState>>,
    database: Option<String>,
    branch: Option<String>,
    pending: Vec<String>,
}

impl ScriptedSession {
    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(&mut self, sql: &str) -> Result<Option<ResultSet>, DoltMiddlewareError> {
        let delay = self
            .lock()
            .delays
            .iter()
            .find(|(p, _)| sql.contains(p.as_str()))
            .map(|(_, d)| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.executed.push(Executed {
            session: self.id,
            database: self.database.clone(),
            branch: self.branch.clone(),
            sql: sql.to_string(),
        });

        if let Some((_, message)) = state.failures.iter().find(|(p, _)| sql.contains(p.as_str())) {
            return Err(DoltMiddlewareError::ExecutionError(message.clone()));
        }

        let trimmed = sql.trim().trim_end_matches(';').trim();
        let upper = trimmed.to_ascii_uppercase();
        if upper == "START TRANSACTION" || upper == "BEGIN" {
            self.pending.clear();
        } else if upper == "COMMIT" {
            state.committed.append(&mut self.pending);
        } else if upper == "ROLLBACK" {
            self.pending.clear();
        } else if let Some(name) = upper.strip_prefix("USE ").map(|_| unquote(&trimmed[4..])) {
            if state.databases.as_ref().is_some_and(|dbs| !dbs.contains(&name)) {
                return Err(DoltMiddlewareError::ExecutionError(format!(
                    "database not found: {name}"
                )));
            }
            self.database = Some(name);
            self.branch = None;
        } else if upper.starts_with("CALL DOLT_CHECKOUT(") {
            let name = unquote(&trimmed["CALL DOLT_CHECKOUT(".len()..trimmed.len() - 1]);
            if state.branches.as_ref().is_some_and(|bs| !bs.contains(&name)) {
                return Err(DoltMiddlewareError::ExecutionError(format!(
                    "branch not found: {name}"
                )));
            }
            self.branch = Some(name);
        } else {
            self.pending.push(sql.to_string());
        }

        Ok(state
            .responses
            .iter()
            .find(|(p, _)| sql.contains(p.as_str()))
            .map(|(_, rs)| rs.clone()))
    }
}

/// Read CSV text back into records: quoted fields, doubled quotes, embedded
/// newlines and a trailing record without a final `\n`.
#[must_use]
pub fn parse_csv(input: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(ch),
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            '\r' => {}
            _ => field.push(ch),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

fn unquote(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '`' || c == '\'')
        .to_string()
}

#[async_trait]
impl Session for ScriptedSession {
    async fn execute(&mut self, sql: &str) -> Result<u64, DoltMiddlewareError> {
        self.run(sql).await.map(|rs| rs.map_or(0, |rs| rs.rows_affected as u64))
    }

    async fn query(&mut self, sql: &str) -> Result<ResultSet, DoltMiddlewareError> {
        self.run(sql).await.map(Option::unwrap_or_default)
    }

    async fn ping(&mut self) -> Result<(), DoltMiddlewareError> {
        match &self.lock().ping_error {
            Some(message) => Err(DoltMiddlewareError::ConnectionError(message.clone())),
            None => Ok(()),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), DoltMiddlewareError> {
        self.lock().sessions_closed += 1;
        Ok(())
    }
}

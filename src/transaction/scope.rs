use crate::error::DoltMiddlewareError;
use crate::identifier::{quote_identifier, quote_literal, validate_branch_name, validate_database_name};

/// A session-positioning statement run before any caller statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStep {
    UseDatabase(String),
    CheckoutBranch(String),
}

impl BootstrapStep {
    /// SQL text for this step, built from a validated name.
    ///
    /// # Errors
    /// Returns `InvalidIdentifier` if the name fails validation.
    pub fn sql(&self) -> Result<String, DoltMiddlewareError> {
        match self {
            BootstrapStep::UseDatabase(db) => {
                Ok(format!("USE {};", quote_identifier(validate_database_name(db)?)))
            }
            BootstrapStep::CheckoutBranch(branch) => Ok(format!(
                "CALL DOLT_CHECKOUT({});",
                quote_literal(validate_branch_name(branch)?)
            )),
        }
    }
}

/// Where a scoped transaction is positioned before caller statements run.
///
/// The database step always precedes the branch step regardless of how the scope
/// was assembled: a checkout resolves against the current database's branch
/// namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    database: Option<String>,
    branch: Option<String>,
}

impl Scope {
    /// No bootstrap; the connection's defaults apply.
    #[must_use]
    pub fn plain() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_branch(branch: impl Into<String>) -> Self {
        Self::plain().branch(branch)
    }

    #[must_use]
    pub fn on_database(database: impl Into<String>) -> Self {
        Self::plain().database(database)
    }

    #[must_use]
    pub fn on_database_branch(database: impl Into<String>, branch: impl Into<String>) -> Self {
        Self::plain().database(database).branch(branch)
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    #[must_use]
    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    #[must_use]
    pub fn database_name(&self) -> Option<&str> {
        self.database.as_deref()
    }

    #[must_use]
    pub fn branch_name(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Bootstrap steps in execution order.
    ///
    /// # Errors
    /// Returns `NoDatabaseNameDefined` for an empty database step and
    /// `InvalidIdentifier` for an empty or malformed name.
    pub fn steps(&self) -> Result<Vec<BootstrapStep>, DoltMiddlewareError> {
        let mut steps = Vec::with_capacity(2);
        if let Some(db) = &self.database {
            if db.trim().is_empty() {
                return Err(DoltMiddlewareError::NoDatabaseNameDefined);
            }
            validate_database_name(db)?;
            steps.push(BootstrapStep::UseDatabase(db.clone()));
        }
        if let Some(branch) = &self.branch {
            validate_branch_name(branch)?;
            steps.push(BootstrapStep::CheckoutBranch(branch.clone()));
        }
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_always_precedes_branch() {
        let scope = Scope::plain().branch("dev").database("foo");
        assert_eq!(
            scope.steps().unwrap(),
            vec![
                BootstrapStep::UseDatabase("foo".into()),
                BootstrapStep::CheckoutBranch("dev".into()),
            ]
        );
    }

    #[test]
    fn step_sql() {
        assert_eq!(
            BootstrapStep::UseDatabase("foo".into()).sql().unwrap(),
            "USE `foo`;"
        );
        assert_eq!(
            BootstrapStep::CheckoutBranch("feature/x".into()).sql().unwrap(),
            "CALL DOLT_CHECKOUT('feature/x');"
        );
    }

    #[test]
    fn helper_shapes() {
        assert!(Scope::plain().steps().unwrap().is_empty());
        assert_eq!(Scope::on_branch("b").steps().unwrap().len(), 1);
        assert_eq!(Scope::on_database("d").steps().unwrap().len(), 1);
        assert_eq!(Scope::on_database_branch("d", "b").steps().unwrap().len(), 2);
    }

    #[test]
    fn rejects_bad_names_before_any_sql() {
        assert!(matches!(
            Scope::on_database("").steps(),
            Err(DoltMiddlewareError::NoDatabaseNameDefined)
        ));
        assert!(matches!(
            Scope::on_database_branch("ok", "x'); DROP TABLE t; --").steps(),
            Err(DoltMiddlewareError::InvalidIdentifier { kind: "branch", .. })
        ));
    }
}

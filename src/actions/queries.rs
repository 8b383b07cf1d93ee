use crate::args::ArgMap;
use crate::classify::StatementKind;
use crate::context::RequestContext;
use crate::error::DoltMiddlewareError;

use super::{DoltActions, scope_from_args};

const QUERY_ARG: &str = "query";

impl DoltActions {
    /// Run a caller-supplied read-only statement on `database` (and `branch` if
    /// given). The transaction is always rolled back.
    ///
    /// # Errors
    /// Returns `UnexpectedStatementKind` for a mutating statement, otherwise
    /// argument, bootstrap, or statement errors.
    pub async fn query(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = scope_from_args(args, false)?;
        let sql = args.require_string(QUERY_ARG)?;
        self.expect_kind(&sql, StatementKind::Read)?;
        self.read(ctx, scope, sql, args.result_format()?).await
    }

    /// Run a caller-supplied mutating statement on `database` (and `branch` if
    /// given) and commit it; a failing statement is rolled back.
    ///
    /// # Errors
    /// Returns `UnexpectedStatementKind` for a read-only statement, otherwise
    /// argument, bootstrap, statement, or commit errors.
    pub async fn exec(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = scope_from_args(args, false)?;
        let sql = args.require_string(QUERY_ARG)?;
        self.expect_kind(&sql, StatementKind::Write)?;
        self.write(ctx, scope, vec![sql]).await?;
        Ok("successfully executed write".to_string())
    }

    fn expect_kind(&self, sql: &str, expected: StatementKind) -> Result<(), DoltMiddlewareError> {
        if self.classifier.classify(sql)? == expected {
            Ok(())
        } else {
            Err(DoltMiddlewareError::UnexpectedStatementKind {
                expected: expected.as_str(),
                sql: sql.to_string(),
            })
        }
    }
}

use crate::args::ArgMap;
use crate::context::RequestContext;
use crate::error::DoltMiddlewareError;
use crate::identifier::validate_revision;

use super::{DoltActions, call_procedure, scope_from_args};

impl DoltActions {
    /// Rows of `dolt_log` for `database`/`branch`.
    ///
    /// # Errors
    /// Returns argument, bootstrap, or statement errors.
    pub async fn list_dolt_commits(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = scope_from_args(args, true)?;
        self.read(ctx, scope, "SELECT * FROM dolt_log;".into(), args.result_format()?)
            .await
    }

    /// Commit staged changes on `branch` with `message`; `add_all` stages every
    /// table first.
    ///
    /// # Errors
    /// Returns argument, bootstrap, or statement errors.
    pub async fn create_dolt_commit(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = scope_from_args(args, true)?;
        let message = args.require_string("message")?;
        let flag = if args.optional_bool("add_all")? { "-Am" } else { "-m" };

        self.write(ctx, scope, vec![call_procedure("DOLT_COMMIT", &[flag, &message])])
            .await?;
        Ok("successfully committed changes".to_string())
    }

    /// Hard-reset the working set of `branch`, to `revision` when given.
    ///
    /// # Errors
    /// Returns argument, identifier, bootstrap, or statement errors.
    pub async fn dolt_reset_hard(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = scope_from_args(args, true)?;
        let revision = args.optional_string("revision")?;
        let mut call_args = vec!["--hard"];
        if let Some(revision) = revision.as_deref() {
            call_args.push(validate_revision(revision)?);
        }

        self.write(ctx, scope, vec![call_procedure("DOLT_RESET", &call_args)])
            .await?;
        Ok("successfully reset working set".to_string())
    }
}

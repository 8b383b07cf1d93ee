use crate::args::ArgMap;
use crate::context::RequestContext;
use crate::error::DoltMiddlewareError;
use crate::identifier::validate_branch_name;
use crate::transaction::Scope;

use super::{DATABASE_ARG, DoltActions, call_procedure};

impl DoltActions {
    /// `SELECT active_branch()` inside `database`.
    ///
    /// # Errors
    /// Returns argument, bootstrap, or statement errors.
    pub async fn select_active_branch(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = Scope::on_database(args.require_string(DATABASE_ARG)?);
        self.read(ctx, scope, "SELECT active_branch();".into(), args.result_format()?)
            .await
    }

    /// Rows of `dolt_branches` inside `database`.
    ///
    /// # Errors
    /// Returns argument, bootstrap, or statement errors.
    pub async fn list_dolt_branches(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = Scope::on_database(args.require_string(DATABASE_ARG)?);
        self.read(ctx, scope, "SELECT * FROM dolt_branches;".into(), args.result_format()?)
            .await
    }

    /// Create `new_branch`, copied from `original_branch` when given (otherwise
    /// from the current head). `force` overwrites an existing branch.
    ///
    /// # Errors
    /// Returns argument, identifier, bootstrap, or statement errors.
    pub async fn create_dolt_branch(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = Scope::on_database(args.require_string(DATABASE_ARG)?);
        let new_branch = args.require_string("new_branch")?;
        validate_branch_name(&new_branch)?;
        let original = args.optional_string("original_branch")?;
        let force = args.optional_bool("force")?;

        let mut call_args: Vec<&str> = Vec::with_capacity(4);
        if force {
            call_args.push("-f");
        }
        if let Some(original) = original.as_deref() {
            validate_branch_name(original)?;
            call_args.extend(["-c", original]);
        }
        call_args.push(&new_branch);

        self.write(ctx, scope, vec![call_procedure("DOLT_BRANCH", &call_args)])
            .await?;
        tracing::info!(branch = %new_branch, "branch created");
        Ok(format!("successfully created branch: {new_branch}"))
    }

    /// Delete `branch`; `force` deletes even if unmerged.
    ///
    /// # Errors
    /// Returns argument, identifier, bootstrap, or statement errors.
    pub async fn delete_dolt_branch(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = Scope::on_database(args.require_string(DATABASE_ARG)?);
        let branch = args.require_string("branch")?;
        validate_branch_name(&branch)?;
        let flag = if args.optional_bool("force")? { "-D" } else { "-d" };

        self.write(ctx, scope, vec![call_procedure("DOLT_BRANCH", &[flag, &branch])])
            .await?;
        tracing::info!(branch = %branch, "branch deleted");
        Ok(format!("successfully deleted branch: {branch}"))
    }
}

use crate::args::ArgMap;
use crate::context::RequestContext;
use crate::error::DoltMiddlewareError;
use crate::identifier::validate_table_name;

use super::{DoltActions, call_procedure, scope_from_args};

const TABLE_ARG: &str = "table";

impl DoltActions {
    /// # Errors
    /// Returns argument, identifier, bootstrap, or statement errors.
    pub async fn stage_table_for_dolt_commit(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = scope_from_args(args, true)?;
        let table = args.require_string(TABLE_ARG)?;
        validate_table_name(&table)?;
        self.write(ctx, scope, vec![call_procedure("DOLT_ADD", &[&table])])
            .await?;
        Ok(format!("successfully staged table: {table}"))
    }

    /// # Errors
    /// Returns argument, bootstrap, or statement errors.
    pub async fn stage_all_tables_for_dolt_commit(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = scope_from_args(args, true)?;
        self.write(ctx, scope, vec![call_procedure("DOLT_ADD", &["-A"])])
            .await?;
        Ok("successfully staged all tables".to_string())
    }

    /// # Errors
    /// Returns argument, identifier, bootstrap, or statement errors.
    pub async fn unstage_table(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = scope_from_args(args, true)?;
        let table = args.require_string(TABLE_ARG)?;
        validate_table_name(&table)?;
        self.write(ctx, scope, vec![call_procedure("DOLT_RESET", &[&table])])
            .await?;
        Ok(format!("successfully unstaged table: {table}"))
    }

    /// # Errors
    /// Returns argument, bootstrap, or statement errors.
    pub async fn unstage_all_tables(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = scope_from_args(args, true)?;
        self.write(ctx, scope, vec![call_procedure("DOLT_RESET", &[])])
            .await?;
        Ok("successfully unstaged all tables".to_string())
    }
}

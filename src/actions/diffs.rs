use crate::args::ArgMap;
use crate::context::RequestContext;
use crate::error::DoltMiddlewareError;
use crate::identifier::{quote_literal, validate_revision, validate_table_name};

use super::{DoltActions, scope_from_args};

impl DoltActions {
    /// Rows of `dolt_status`: tables changed in the working set and whether each
    /// is staged.
    ///
    /// # Errors
    /// Returns argument, bootstrap, or statement errors.
    pub async fn list_dolt_diff_changes_in_working_set(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = scope_from_args(args, true)?;
        self.read(ctx, scope, "SELECT * FROM dolt_status;".into(), args.result_format()?)
            .await
    }

    /// Row-level diff of `table` between `from_revision` (default `HEAD`) and
    /// `to_revision` (default `WORKING`).
    ///
    /// # Errors
    /// Returns argument, identifier, bootstrap, or statement errors.
    pub async fn list_dolt_diff_changes_by_table_name(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = scope_from_args(args, true)?;
        let table = args.require_string("table")?;
        let from = args
            .optional_string("from_revision")?
            .unwrap_or_else(|| "HEAD".to_string());
        let to = args
            .optional_string("to_revision")?
            .unwrap_or_else(|| "WORKING".to_string());
        let sql = format!(
            "SELECT * FROM DOLT_DIFF({}, {}, {});",
            quote_literal(validate_revision(&from)?),
            quote_literal(validate_revision(&to)?),
            quote_literal(validate_table_name(&table)?),
        );
        self.read(ctx, scope, sql, args.result_format()?).await
    }
}

use crate::args::ArgMap;
use crate::context::RequestContext;
use crate::error::DoltMiddlewareError;
use crate::identifier::{quote_identifier, validate_table_name};

use super::{DoltActions, scope_from_args};

impl DoltActions {
    /// # Errors
    /// Returns argument, bootstrap, or statement errors.
    pub async fn show_tables(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = scope_from_args(args, false)?;
        self.read(ctx, scope, "SHOW TABLES;".into(), args.result_format()?)
            .await
    }

    /// # Errors
    /// Returns argument, identifier, bootstrap, or statement errors.
    pub async fn describe_table(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let scope = scope_from_args(args, false)?;
        let table = args.require_string("table")?;
        let sql = format!("DESCRIBE {};", quote_identifier(validate_table_name(&table)?));
        self.read(ctx, scope, sql, args.result_format()?).await
    }
}

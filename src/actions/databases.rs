use crate::args::ArgMap;
use crate::context::RequestContext;
use crate::error::DoltMiddlewareError;
use crate::identifier::{quote_identifier, validate_database_name};
use crate::transaction::Scope;

use super::{DATABASE_ARG, DoltActions};

impl DoltActions {
    /// `SHOW DATABASES` on a pooled session.
    ///
    /// # Errors
    /// Returns argument, pool, or statement errors.
    pub async fn list_databases(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let format = args.result_format()?;
        self.database.query(ctx, "SHOW DATABASES;", format).await
    }

    /// # Errors
    /// Returns argument, identifier, connection, or statement errors.
    pub async fn create_database(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let name = args.require_string(DATABASE_ARG)?;
        let sql = format!("CREATE DATABASE {};", quote_identifier(validate_database_name(&name)?));
        self.write(ctx, Scope::plain(), vec![sql]).await?;
        tracing::info!(database = %name, "database created");
        Ok(format!("successfully created database: {name}"))
    }

    /// # Errors
    /// Returns argument, identifier, connection, or statement errors.
    pub async fn drop_database(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let name = args.require_string(DATABASE_ARG)?;
        let sql = format!("DROP DATABASE {};", quote_identifier(validate_database_name(&name)?));
        self.write(ctx, Scope::plain(), vec![sql]).await?;
        tracing::info!(database = %name, "database dropped");
        Ok(format!("successfully dropped database: {name}"))
    }
}

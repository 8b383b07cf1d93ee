use crate::args::ArgMap;
use crate::context::RequestContext;
use crate::error::DoltMiddlewareError;
use crate::identifier::validate_branch_name;
use crate::transaction::Scope;

use super::{DATABASE_ARG, DoltActions, call_procedure};

impl DoltActions {
    /// Merge `source_branch` into `destination_branch`.
    ///
    /// The transaction is checked out on the destination, so the merge commit (or
    /// conflict) lands there; a conflicting merge fails at commit and is rolled
    /// back.
    ///
    /// # Errors
    /// Returns argument, identifier, bootstrap, statement, or commit errors.
    pub async fn merge_dolt_branch(
        &self,
        ctx: &RequestContext,
        args: &ArgMap,
    ) -> Result<String, DoltMiddlewareError> {
        let source = args.require_string("source_branch")?;
        let destination = args.require_string("destination_branch")?;
        validate_branch_name(&source)?;
        let scope = Scope::on_database_branch(args.require_string(DATABASE_ARG)?, &destination);

        self.write(ctx, scope, vec![call_procedure("DOLT_MERGE", &[&source])])
            .await?;
        tracing::info!(source = %source, destination = %destination, "branches merged");
        Ok(format!("successfully merged {source} into {destination}"))
    }
}

use std::future::Future;
use std::pin::Pin;

use crate::context::RequestContext;
use crate::error::DoltMiddlewareError;

use super::ScopedTransaction;

/// Boxed future borrowing a transaction, returned by the closures passed to
/// [`with_transaction`] and [`with_read_only_transaction`].
pub type TxFuture<'t, T> = Pin<Box<dyn Future<Output = Result<T, DoltMiddlewareError>> + Send + 't>>;

/// Finish `tx` according to `result`: commit on `Ok`, roll back on `Err`.
///
/// On `Err` the rollback outcome is only logged and the original error is
/// returned. Consumes the transaction, so it cannot be finished twice.
///
/// # Errors
/// Returns the original error, or the commit error when `result` was `Ok`.
pub async fn commit_or_rollback_on_error<T>(
    ctx: &RequestContext,
    mut tx: ScopedTransaction,
    result: Result<T, DoltMiddlewareError>,
) -> Result<T, DoltMiddlewareError> {
    match result {
        Ok(value) => {
            tx.commit(ctx).await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rb) = tx.rollback(ctx).await {
                tracing::warn!(error = %rb, original = %err, "rollback failed");
            }
            Err(err)
        }
    }
}

/// Run `body` inside `tx`, then commit or roll back depending on its outcome.
///
/// ```rust,no_run
/// use dolt_middleware::prelude::*;
///
/// # async fn example(config: DoltConfig) -> Result<(), DoltMiddlewareError> {
/// let ctx = RequestContext::new();
/// let tx = ScopedTransaction::begin_on_database_branch(&ctx, &config, "shop", "main").await?;
/// let inner = ctx.clone();
/// with_transaction(&ctx, tx, move |tx| {
///     Box::pin(async move {
///         tx.exec(&inner, "INSERT INTO orders (id) VALUES (1)").await?;
///         tx.exec(&inner, "CALL DOLT_COMMIT('-Am', 'add order')").await
///     })
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// Returns the body's error (after rollback) or the commit error.
pub async fn with_transaction<T, F>(
    ctx: &RequestContext,
    mut tx: ScopedTransaction,
    body: F,
) -> Result<T, DoltMiddlewareError>
where
    F: for<'t> FnOnce(&'t mut ScopedTransaction) -> TxFuture<'t, T>,
{
    let result = body(&mut tx).await;
    commit_or_rollback_on_error(ctx, tx, result).await
}

/// Run `body` inside `tx` and always roll back afterwards, releasing the
/// connection whether or not the read succeeded.
///
/// # Errors
/// Returns the body's error; rollback failures are logged only.
pub async fn with_read_only_transaction<T, F>(
    ctx: &RequestContext,
    mut tx: ScopedTransaction,
    body: F,
) -> Result<T, DoltMiddlewareError>
where
    F: for<'t> FnOnce(&'t mut ScopedTransaction) -> TxFuture<'t, T>,
{
    let result = body(&mut tx).await;
    if let Err(rb) = tx.rollback(ctx).await {
        tracing::warn!(error = %rb, "rollback after read failed");
    }
    result
}

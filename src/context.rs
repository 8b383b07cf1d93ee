use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::DoltMiddlewareError;

/// Upper bound for cleanup work (rollback, close) that must not inherit the
/// caller's cancellation.
pub const CLEANUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Cancellation and deadline for one request.
///
/// Cloning shares the cancellation token, so cancelling any clone aborts every
/// round-trip started through [`run`](Self::run) on any of them.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context tied to an existing token (for example a per-connection token owned
    /// by the protocol layer).
    #[must_use]
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Set a deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// A fresh context for cleanup: not cancelled by this one, bounded by
    /// [`CLEANUP_TIMEOUT`].
    #[must_use]
    pub fn detached_for_cleanup(&self) -> Self {
        Self::new().with_timeout(CLEANUP_TIMEOUT)
    }

    /// Drive `fut` unless the context is cancelled or its deadline passes first.
    ///
    /// # Errors
    /// Returns `Cancelled(op)` or `TimedOut(op)` when aborted, otherwise whatever
    /// `fut` returns.
    pub async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T, DoltMiddlewareError>
    where
        F: Future<Output = Result<T, DoltMiddlewareError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(DoltMiddlewareError::Cancelled(op));
        }
        let timed = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .map_err(|_| DoltMiddlewareError::TimedOut(op))?,
                None => fut.await,
            }
        };
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(DoltMiddlewareError::Cancelled(op)),
            result = timed => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_result() {
        let ctx = RequestContext::new();
        let v = ctx.run("op", async { Ok::<_, DoltMiddlewareError>(7) }).await.unwrap();
        assert_eq!(v, 7);
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let err = ctx
            .run("query", async { Ok::<_, DoltMiddlewareError>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, DoltMiddlewareError::Cancelled("query")));
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight() {
        let ctx = RequestContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let err = ctx
            .run("exec", async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, DoltMiddlewareError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DoltMiddlewareError::Cancelled("exec")));
    }

    #[tokio::test]
    async fn deadline_times_out() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));
        let err = ctx
            .run("ping", async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, DoltMiddlewareError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DoltMiddlewareError::TimedOut("ping")));
    }

    #[test]
    fn cleanup_context_is_independent() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let cleanup = ctx.detached_for_cleanup();
        assert!(!cleanup.is_cancelled());
        assert!(cleanup.deadline().is_some());
    }
}

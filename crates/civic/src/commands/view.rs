//! Cancellation scope for a view's in-flight requests.
//!
//! Each view owns a `ViewScope`. Requests started through it resolve to
//! `CivicError::Cancelled` once the scope is cancelled or dropped, so a
//! closed view never applies a late response.

use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::errors::{CivicError, CivicResult};

pub struct ViewScope {
    name: String,
    token: CancellationToken,
}

impl ViewScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: CancellationToken::new(),
        }
    }

    /// A nested scope, cancelled with this one.
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: self.token.child_token(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Token for work spawned outside [`ViewScope::run`].
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel the scope when the process receives Ctrl-C.
    ///
    /// The listener ends with the scope.
    pub fn cancel_on_ctrl_c(&self) {
        let token = self.token.clone();
        let name = self.name.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                signal = tokio::signal::ctrl_c() => {
                    if signal.is_ok() {
                        tracing::debug!(view = %name, "interrupted");
                        token.cancel();
                    }
                }
            }
        });
    }

    /// Await `fut` unless the scope is cancelled first.
    pub async fn run<T, F>(&self, fut: F) -> CivicResult<T>
    where
        F: Future<Output = CivicResult<T>>,
    {
        if self.token.is_cancelled() {
            return Err(CivicError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                tracing::debug!(view = %self.name, "request cancelled");
                Err(CivicError::Cancelled)
            }
            result = fut => result,
        }
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_returns_result_when_not_cancelled() {
        let scope = ViewScope::new("dashboard");
        let result = scope.run(async { Ok::<_, CivicError>(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_cancelled_scope_short_circuits() {
        let scope = ViewScope::new("dashboard");
        scope.cancel();
        let result = scope.run(async { Ok::<_, CivicError>(7) }).await;
        assert_eq!(result, Err(CivicError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_request() {
        let scope = ViewScope::new("manage-issues");
        let token = scope.token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let result: CivicResult<()> = scope
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await;
        assert_eq!(result, Err(CivicError::Cancelled));
    }

    #[test]
    fn test_drop_cancels_token_and_children() {
        let scope = ViewScope::new("parent");
        let child = scope.child("child");
        let token = scope.token();

        drop(scope);

        assert!(token.is_cancelled());
        assert!(child.is_cancelled());
    }
}

//! Retry behavior for transient failures.

use courier_core::{
    BoxError, Cancelled, CancellationToken, Described, Next, PipelineBehavior, Request, TypeKey,
};
use std::time::Duration;
use tracing::debug;

/// A behavior that re-runs the inner chain until it succeeds.
///
/// Runs at most `attempts` times, sleeping `backoff` between attempts. The
/// last failure is returned unchanged. Stops early with [`Cancelled`] once
/// the token fires.
#[derive(Debug, Clone, Copy)]
pub struct RetryBehavior {
    attempts: usize,
    backoff: Duration,
}

impl RetryBehavior {
    /// Create a new retry behavior. `attempts` is clamped to at least one.
    pub fn new(attempts: usize, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Maximum number of runs.
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

impl Described for RetryBehavior {
    fn type_key() -> TypeKey {
        TypeKey::named(concat!(module_path!(), "::RetryBehavior"))
    }
}

impl<R: Request> PipelineBehavior<R> for RetryBehavior {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        cancel: CancellationToken,
    ) -> Result<R::Response, BoxError> {
        let mut attempt = 1;
        loop {
            match next.run(cancel.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) if attempt >= self.attempts => return Err(error),
                Err(error) => {
                    debug!(attempt, %error, "attempt failed; retrying");
                }
            }
            if cancel.is_cancelled() {
                return Err(Box::new(Cancelled));
            }
            if !self.backoff.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.backoff) => {}
                    _ = cancel.cancelled() => return Err(Box::new(Cancelled)),
                }
            }
            attempt += 1;
        }
    }
}

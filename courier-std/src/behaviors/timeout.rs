//! Timeout behavior for time-limited execution.

use courier_core::{
    BoxError, CancellationToken, Described, Next, PipelineBehavior, Request, TypeKey,
};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

/// Error returned when the wrapped chain does not finish in time.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("request timed out after {0:?}")]
pub struct TimeoutElapsed(pub Duration);

/// A behavior that fails requests whose inner chain runs too long.
///
/// On expiry the token handed to the inner chain is cancelled, so
/// cooperative handlers can stop their work.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutBehavior {
    duration: Duration,
}

impl TimeoutBehavior {
    /// Create a new timeout behavior.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// The configured limit.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Described for TimeoutBehavior {
    fn type_key() -> TypeKey {
        TypeKey::named(concat!(module_path!(), "::TimeoutBehavior"))
    }
}

impl<R: Request> PipelineBehavior<R> for TimeoutBehavior {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        cancel: CancellationToken,
    ) -> Result<R::Response, BoxError> {
        let inner = cancel.child_token();
        match timeout(self.duration, next.run(inner.clone())).await {
            Ok(result) => result,
            Err(_) => {
                inner.cancel();
                Err(Box::new(TimeoutElapsed(self.duration)))
            }
        }
    }
}

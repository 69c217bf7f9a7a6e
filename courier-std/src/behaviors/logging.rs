//! Logging behavior for request observation.

use courier_core::{
    BoxError, CancellationToken, Described, Next, PipelineBehavior, Request, TypeKey,
};
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};

/// A behavior that records every request it wraps.
///
/// Opens an `info` span named `request` carrying the request and response
/// types, then logs the outcome and elapsed time inside it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingBehavior;

impl Described for LoggingBehavior {
    fn type_key() -> TypeKey {
        TypeKey::named(concat!(module_path!(), "::LoggingBehavior"))
    }
}

impl<R: Request> PipelineBehavior<R> for LoggingBehavior {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        cancel: CancellationToken,
    ) -> Result<R::Response, BoxError> {
        let span = info_span!(
            "request",
            request = %R::type_key(),
            response = %<R::Response as Described>::type_key(),
        );
        async move {
            let started = Instant::now();
            let result = next.run(cancel).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => info!(elapsed_ms, "request handled"),
                Err(error) => warn!(elapsed_ms, %error, "request failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

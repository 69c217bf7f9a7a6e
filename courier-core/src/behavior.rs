//! # Pipeline Behaviors
//!
//! Cross-cutting logic (logging, validation, retries, timeouts) wrapped
//! around a request handler. A behavior receives the request, a [`Next`]
//! continuation and the cancellation token, and decides whether and when to
//! run the rest of the chain: it may skip it, run it once, run it repeatedly,
//! or transform its result.
//!
//! # Chain Layout
//!
//! A chain is an ordered slice of behaviors, outermost first, terminated by
//! the handler. [`Next::run`] pops the head of the slice and hands the tail to
//! it as its own continuation; an empty slice runs the handler.

use crate::{error::BoxError, handler::DynRequestHandler, message::Request};
use futures::future::BoxFuture;
use std::{future::Future, sync::Arc};
use tokio_util::sync::CancellationToken;

/// Wraps the handling of requests of type `R`.
///
/// Open behaviors (one type serving every request) are written as a blanket
/// implementation:
///
/// ```rust,ignore
/// struct Audit;
///
/// impl<R: Request> PipelineBehavior<R> for Audit {
///     async fn handle(&self, request: &R, next: Next<'_, R>, cancel: CancellationToken)
///         -> Result<R::Response, BoxError>
///     {
///         let response = next.run(cancel).await?;
///         record(R::type_key());
///         Ok(response)
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a pipeline behavior for `{R}`",
    label = "missing `PipelineBehavior<{R}>` implementation"
)]
pub trait PipelineBehavior<R: Request>: Send + Sync + 'static {
    /// Handles `request`, usually by running `next` at some point.
    fn handle(
        &self,
        request: &R,
        next: Next<'_, R>,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<R::Response, BoxError>> + Send;
}

/// Object-safe version of [`PipelineBehavior`].
pub trait DynPipelineBehavior<R: Request>: Send + Sync + 'static {
    /// Handles `request` (dynamic dispatch version).
    fn handle_dyn<'a>(
        &'a self,
        request: &'a R,
        next: Next<'a, R>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<R::Response, BoxError>>;
}

impl<R: Request, T: PipelineBehavior<R>> DynPipelineBehavior<R> for T {
    fn handle_dyn<'a>(
        &'a self,
        request: &'a R,
        next: Next<'a, R>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<R::Response, BoxError>> {
        Box::pin(self.handle(request, next, cancel))
    }
}

/// The remainder of a behavior chain.
///
/// `Next` is `Copy`: a behavior may run it any number of times.
pub struct Next<'a, R: Request> {
    behaviors: &'a [Arc<dyn DynPipelineBehavior<R>>],
    handler: &'a dyn DynRequestHandler<R>,
    request: &'a R,
}

impl<'a, R: Request> Next<'a, R> {
    /// A chain over `behaviors` (outermost first) ending in `handler`.
    pub fn new(
        behaviors: &'a [Arc<dyn DynPipelineBehavior<R>>],
        handler: &'a dyn DynRequestHandler<R>,
        request: &'a R,
    ) -> Self {
        Self {
            behaviors,
            handler,
            request,
        }
    }

    /// Number of behaviors left before the handler.
    pub fn remaining(&self) -> usize {
        self.behaviors.len()
    }

    /// Runs the rest of the chain.
    pub fn run(self, cancel: CancellationToken) -> BoxFuture<'a, Result<R::Response, BoxError>> {
        match self.behaviors.split_first() {
            Some((outer, rest)) => {
                let next = Next {
                    behaviors: rest,
                    handler: self.handler,
                    request: self.request,
                };
                outer.handle_dyn(self.request, next, cancel)
            }
            None => self.handler.handle_dyn(self.request, cancel),
        }
    }
}

impl<R: Request> Clone for Next<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Request> Copy for Next<'_, R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        handler::RequestHandler,
        key::{Described, TypeKey},
    };
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    struct Echo(&'static str);
    impl Described for Echo {
        fn type_key() -> TypeKey {
            TypeKey::named("tests::Echo")
        }
    }
    impl Request for Echo {
        type Response = String;
    }

    struct EchoHandler {
        calls: AtomicUsize,
    }

    impl RequestHandler<Echo> for EchoHandler {
        async fn handle(
            &self,
            request: &Echo,
            _cancel: CancellationToken,
        ) -> Result<String, BoxError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                Err("first call fails".into())
            } else {
                Ok(request.0.to_string())
            }
        }
    }

    struct Marker {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl PipelineBehavior<Echo> for Marker {
        async fn handle(
            &self,
            _request: &Echo,
            next: Next<'_, Echo>,
            cancel: CancellationToken,
        ) -> Result<String, BoxError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("before {}", self.name));
            let result = next.run(cancel).await;
            self.log
                .lock()
                .unwrap()
                .push(format!("after {}", self.name));
            result
        }
    }

    struct RetryOnce;

    impl PipelineBehavior<Echo> for RetryOnce {
        async fn handle(
            &self,
            _request: &Echo,
            next: Next<'_, Echo>,
            cancel: CancellationToken,
        ) -> Result<String, BoxError> {
            match next.run(cancel.clone()).await {
                Ok(response) => Ok(response),
                Err(_) => next.run(cancel).await,
            }
        }
    }

    struct ShortCircuit;

    impl PipelineBehavior<Echo> for ShortCircuit {
        async fn handle(
            &self,
            _request: &Echo,
            _next: Next<'_, Echo>,
            _cancel: CancellationToken,
        ) -> Result<String, BoxError> {
            Ok("cached".to_string())
        }
    }

    #[tokio::test]
    async fn test_chain_runs_outermost_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let behaviors: Vec<Arc<dyn DynPipelineBehavior<Echo>>> = vec![
            Arc::new(Marker {
                name: "outer",
                log: log.clone(),
            }),
            Arc::new(RetryOnce),
            Arc::new(Marker {
                name: "inner",
                log: log.clone(),
            }),
        ];
        let handler = EchoHandler {
            calls: AtomicUsize::new(0),
        };
        let request = Echo("hi");

        let response = Next::new(&behaviors, &handler, &request)
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response, "hi");
        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "before outer",
                "before inner",
                "after inner",
                "before inner",
                "after inner",
                "after outer",
            ]
        );
    }

    #[tokio::test]
    async fn test_behavior_may_skip_handler() {
        let behaviors: Vec<Arc<dyn DynPipelineBehavior<Echo>>> = vec![Arc::new(ShortCircuit)];
        let handler = EchoHandler {
            calls: AtomicUsize::new(0),
        };
        let request = Echo("hi");
        let next = Next::new(&behaviors, &handler, &request);
        assert_eq!(next.remaining(), 1);

        let response = next.run(CancellationToken::new()).await.unwrap();
        assert_eq!(response, "cached");
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }
}

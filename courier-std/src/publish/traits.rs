use courier_core::{BoxError, CancellationToken, PublishError};
use futures::future::BoxFuture;
use std::future::Future;

/// Runs one resolved notification handler against the notification being
/// published.
pub type HandlerExecutor<'a> =
    Box<dyn FnOnce(CancellationToken) -> BoxFuture<'a, Result<(), BoxError>> + Send + 'a>;

/// Strategy for running the handlers of one notification.
///
/// The mediator resolves every handler first and hands the strategy a list
/// of executors in registration order; the strategy decides how to run them
/// and how to report failures.
pub trait NotificationPublisher: Send + Sync + 'static {
    /// Runs `executors`, passing each a clone of `cancel`.
    fn publish<'a>(
        &'a self,
        executors: Vec<HandlerExecutor<'a>>,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), PublishError>> + Send + 'a;
}

/// Object-safe version of [`NotificationPublisher`].
pub trait DynNotificationPublisher: Send + Sync + 'static {
    /// Runs `executors` (dynamic dispatch version).
    fn publish_dyn<'a>(
        &'a self,
        executors: Vec<HandlerExecutor<'a>>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<(), PublishError>>;
}

impl<T: NotificationPublisher> DynNotificationPublisher for T {
    fn publish_dyn<'a>(
        &'a self,
        executors: Vec<HandlerExecutor<'a>>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<(), PublishError>> {
        Box::pin(self.publish(executors, cancel))
    }
}

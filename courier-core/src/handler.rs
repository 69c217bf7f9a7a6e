//! # Handlers
//!
//! The terminal point of every dispatch. A handler receives a borrowed
//! message and the call's cancellation token.
//!
//! Each handler trait uses native `async fn` for zero-cost static dispatch.
//! Registries and locators store handlers as trait objects through the
//! object-safe `Dyn*` twins, which every handler implements automatically.
//!
//! # Cancellation
//!
//! Cancellation is cooperative. Handlers receive a [`CancellationToken`] and
//! are expected to check it before or during long work; the dispatcher never
//! aborts a running handler.

use crate::{
    error::BoxError,
    message::{Command, Notification, Request},
};
use futures::future::BoxFuture;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Answers a request of type `R`.
///
/// # Example
///
/// ```rust,ignore
/// struct GetUserHandler { db: Db }
///
/// impl RequestHandler<GetUser> for GetUserHandler {
///     async fn handle(&self, request: &GetUser, _cancel: CancellationToken) -> Result<Option<User>, BoxError> {
///         Ok(self.db.find(request.id).await?)
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle requests of type `{R}`",
    label = "missing `RequestHandler<{R}>` implementation",
    note = "Request handlers must implement `handle` for the request type `{R}`."
)]
pub trait RequestHandler<R: Request>: Send + Sync + 'static {
    /// Produces the response for `request`.
    fn handle(
        &self,
        request: &R,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<R::Response, BoxError>> + Send;
}

/// Object-safe version of [`RequestHandler`].
pub trait DynRequestHandler<R: Request>: Send + Sync + 'static {
    /// Produces the response for `request` (dynamic dispatch version).
    fn handle_dyn<'a>(
        &'a self,
        request: &'a R,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<R::Response, BoxError>>;
}

impl<R: Request, T: RequestHandler<R>> DynRequestHandler<R> for T {
    fn handle_dyn<'a>(
        &'a self,
        request: &'a R,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<R::Response, BoxError>> {
        Box::pin(self.handle(request, cancel))
    }
}

/// Handles a fire-and-forget command of type `C`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle commands of type `{C}`",
    label = "missing `CommandHandler<{C}>` implementation"
)]
pub trait CommandHandler<C: Command>: Send + Sync + 'static {
    /// Executes `command`.
    fn handle(
        &self,
        command: &C,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Object-safe version of [`CommandHandler`].
pub trait DynCommandHandler<C: Command>: Send + Sync + 'static {
    /// Executes `command` (dynamic dispatch version).
    fn handle_dyn<'a>(
        &'a self,
        command: &'a C,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>>;
}

impl<C: Command, T: CommandHandler<C>> DynCommandHandler<C> for T {
    fn handle_dyn<'a>(
        &'a self,
        command: &'a C,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(self.handle(command, cancel))
    }
}

/// Observes notifications of type `N`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot observe notifications of type `{N}`",
    label = "missing `NotificationHandler<{N}>` implementation"
)]
pub trait NotificationHandler<N: Notification>: Send + Sync + 'static {
    /// Reacts to `notification`.
    fn handle(
        &self,
        notification: &N,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Object-safe version of [`NotificationHandler`].
pub trait DynNotificationHandler<N: Notification>: Send + Sync + 'static {
    /// Reacts to `notification` (dynamic dispatch version).
    fn handle_dyn<'a>(
        &'a self,
        notification: &'a N,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>>;
}

impl<N: Notification, T: NotificationHandler<N>> DynNotificationHandler<N> for T {
    fn handle_dyn<'a>(
        &'a self,
        notification: &'a N,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(self.handle(notification, cancel))
    }
}

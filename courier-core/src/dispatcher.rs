//! Dispatch entry points exposed to the host.
//!
//! [`Sender`] covers the one-handler paths (requests and commands);
//! [`Publisher`] covers broadcast notifications. Hosts that only publish can
//! depend on `Publisher` alone.

use crate::{
    error::{DispatchError, PublishError},
    message::{Command, Notification, Request},
};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Sends requests and commands to their single responsible handler.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot send requests",
    label = "missing `Sender` implementation"
)]
pub trait Sender: Send + Sync {
    /// Sends `request` through its behavior chain and returns the response.
    fn send<R: Request>(
        &self,
        request: R,
    ) -> impl Future<Output = Result<R::Response, DispatchError>> + Send;

    /// Like [`Sender::send`], threading `cancel` through the chain.
    fn send_with_cancel<R: Request>(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<R::Response, DispatchError>> + Send;

    /// Hands `command` to its handler. Commands have no behavior chain.
    fn dispatch<C: Command>(
        &self,
        command: C,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;

    /// Like [`Sender::dispatch`], passing `cancel` to the handler.
    fn dispatch_with_cancel<C: Command>(
        &self,
        command: C,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

/// Broadcasts notifications to every registered observer.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot publish notifications",
    label = "missing `Publisher` implementation"
)]
pub trait Publisher: Send + Sync {
    /// Publishes `notification`. Zero observers is not an error.
    fn publish<N: Notification>(
        &self,
        notification: N,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;

    /// Like [`Publisher::publish`], passing `cancel` to every handler.
    fn publish_with_cancel<N: Notification>(
        &self,
        notification: N,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;
}

//! Service location boundary.
//!
//! Courier decides *which* implementation serves a message; it never creates
//! instances. The host supplies a [`ServiceLocator`] that turns an
//! implementation [`TypeKey`] into a typed instance. Lifetimes, constructor
//! injection and scoping all live on the host's side of this trait.
//!
//! The methods are generic over the message type, so a locator can hand out
//! open behaviors (a single type implementing [`PipelineBehavior`] for every
//! request) without knowing the request set in advance.
//!
//! [`PipelineBehavior`]: crate::PipelineBehavior

use crate::{
    behavior::DynPipelineBehavior,
    handler::{DynCommandHandler, DynNotificationHandler, DynRequestHandler},
    key::TypeKey,
    message::{Command, Notification, Request},
};
use std::sync::Arc;

/// Resolves handler and behavior instances from their implementation key.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `ServiceLocator`",
    label = "missing `ServiceLocator` implementation",
    note = "Implement `ServiceLocator` or use `courier_std::ServiceCollection`."
)]
pub trait ServiceLocator: Send + Sync + 'static {
    /// Resolves the request handler registered as `implementation`.
    fn request_handler<R: Request>(
        &self,
        implementation: &TypeKey,
    ) -> Option<Arc<dyn DynRequestHandler<R>>>;

    /// Resolves the command handler registered as `implementation`.
    fn command_handler<C: Command>(
        &self,
        implementation: &TypeKey,
    ) -> Option<Arc<dyn DynCommandHandler<C>>>;

    /// Resolves the notification handler registered as `implementation`.
    fn notification_handler<N: Notification>(
        &self,
        implementation: &TypeKey,
    ) -> Option<Arc<dyn DynNotificationHandler<N>>>;

    /// Resolves the pipeline behavior registered as `implementation`.
    fn behavior<R: Request>(
        &self,
        implementation: &TypeKey,
    ) -> Option<Arc<dyn DynPipelineBehavior<R>>>;
}

impl<L: ServiceLocator> ServiceLocator for Arc<L> {
    fn request_handler<R: Request>(
        &self,
        implementation: &TypeKey,
    ) -> Option<Arc<dyn DynRequestHandler<R>>> {
        (**self).request_handler(implementation)
    }

    fn command_handler<C: Command>(
        &self,
        implementation: &TypeKey,
    ) -> Option<Arc<dyn DynCommandHandler<C>>> {
        (**self).command_handler(implementation)
    }

    fn notification_handler<N: Notification>(
        &self,
        implementation: &TypeKey,
    ) -> Option<Arc<dyn DynNotificationHandler<N>>> {
        (**self).notification_handler(implementation)
    }

    fn behavior<R: Request>(
        &self,
        implementation: &TypeKey,
    ) -> Option<Arc<dyn DynPipelineBehavior<R>>> {
        (**self).behavior(implementation)
    }
}

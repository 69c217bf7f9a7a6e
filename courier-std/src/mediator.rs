//! # Mediator
//!
//! The dispatcher hosts call into. A [`Mediator`] pairs a frozen
//! [`Registry`] with the host's [`ServiceLocator`]: the registry decides which
//! implementation serves a message, the locator supplies the instance.
//!
//! - [`Sender::send`] looks up the exact request signature, resolves the
//!   handler and every behavior, and runs the chain outermost first.
//! - [`Sender::dispatch`] hands a command straight to its handler.
//! - [`Publisher::publish`] resolves every observer and hands them to the
//!   configured [`DynNotificationPublisher`].
//!
//! The mediator is cheap to clone when the locator is; the registry is shared.

use crate::{
    config::Configuration,
    publish::{DynNotificationPublisher, HandlerExecutor, PublishStrategy},
    registry::Registry,
};
use courier_core::{
    BoxError, CancellationToken, Command, DispatchError, DynNotificationHandler, MessageSignature,
    Next, Notification, PublishError, Publisher, RegistrationError, Request, Sender,
    ServiceLocator,
};
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, trace};

/// Dispatches messages through a registry and a service locator.
#[derive(Clone)]
pub struct Mediator<L> {
    registry: Arc<Registry>,
    locator: L,
    publisher: Arc<dyn DynNotificationPublisher>,
    require_notification_handlers: bool,
}

impl<L: ServiceLocator> Mediator<L> {
    /// A mediator over an existing registry, publishing sequentially.
    pub fn new(registry: Arc<Registry>, locator: L) -> Self {
        Self {
            registry,
            locator,
            publisher: PublishStrategy::Sequential.publisher(),
            require_notification_handlers: false,
        }
    }

    /// Builds the registry described by `config` and a mediator using its
    /// notification settings.
    pub fn build(config: &Configuration, locator: L) -> Result<Self, RegistrationError> {
        let registry = Registry::build(config)?;
        Ok(Self::new(Arc::new(registry), locator)
            .with_publisher(config.publisher())
            .require_notification_handlers(config.requires_notification_handlers()))
    }

    /// Uses `publisher` for notifications.
    pub fn with_publisher(mut self, publisher: Arc<dyn DynNotificationPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Make publishing a notification nobody observes an error.
    pub fn require_notification_handlers(mut self, require: bool) -> Self {
        self.require_notification_handlers = require;
        self
    }

    /// The registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The service locator.
    pub fn locator(&self) -> &L {
        &self.locator
    }
}

impl<L: ServiceLocator> Sender for Mediator<L> {
    async fn send<R: Request>(&self, request: R) -> Result<R::Response, DispatchError> {
        self.send_with_cancel(request, CancellationToken::new())
            .await
    }

    async fn send_with_cancel<R: Request>(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> Result<R::Response, DispatchError> {
        let signature = MessageSignature::request::<R>();
        let Some(entry) = self.registry.request(&signature) else {
            return Err(DispatchError::NoHandler(signature));
        };

        let implementation = &entry.handler().implementation;
        let handler = self
            .locator
            .request_handler::<R>(implementation)
            .ok_or_else(|| DispatchError::Unresolved {
                implementation: implementation.clone(),
                signature: signature.clone(),
            })?;

        let mut behaviors = Vec::with_capacity(entry.behaviors().len());
        for descriptor in entry.behaviors() {
            let behavior = self
                .locator
                .behavior::<R>(&descriptor.implementation)
                .ok_or_else(|| DispatchError::Unresolved {
                    implementation: descriptor.implementation.clone(),
                    signature: signature.clone(),
                })?;
            behaviors.push(behavior);
        }

        trace!(%signature, behaviors = behaviors.len(), "sending request");
        Next::new(&behaviors, handler.as_ref(), &request)
            .run(cancel)
            .await
            .map_err(DispatchError::Handler)
    }

    async fn dispatch<C: Command>(&self, command: C) -> Result<(), DispatchError> {
        self.dispatch_with_cancel(command, CancellationToken::new())
            .await
    }

    async fn dispatch_with_cancel<C: Command>(
        &self,
        command: C,
        cancel: CancellationToken,
    ) -> Result<(), DispatchError> {
        let signature = MessageSignature::command::<C>();
        let Some(descriptor) = self.registry.command(&signature) else {
            return Err(DispatchError::NoHandler(signature));
        };
        let handler = self
            .locator
            .command_handler::<C>(&descriptor.implementation)
            .ok_or_else(|| DispatchError::Unresolved {
                implementation: descriptor.implementation.clone(),
                signature: signature.clone(),
            })?;

        trace!(%signature, "dispatching command");
        handler
            .handle_dyn(&command, cancel)
            .await
            .map_err(DispatchError::Handler)
    }
}

impl<L: ServiceLocator> Publisher for Mediator<L> {
    async fn publish<N: Notification>(&self, notification: N) -> Result<(), PublishError> {
        self.publish_with_cancel(notification, CancellationToken::new())
            .await
    }

    async fn publish_with_cancel<N: Notification>(
        &self,
        notification: N,
        cancel: CancellationToken,
    ) -> Result<(), PublishError> {
        let key = N::type_key();
        let implementations = self.registry.notification_handlers(&key);
        if implementations.is_empty() {
            if self.require_notification_handlers {
                return Err(PublishError::NoHandlers(key));
            }
            debug!(notification = %key, "no handlers for notification");
            return Ok(());
        }

        let mut handlers = Vec::with_capacity(implementations.len());
        for implementation in implementations {
            let handler = self
                .locator
                .notification_handler::<N>(implementation)
                .ok_or_else(|| PublishError::Unresolved {
                    implementation: implementation.clone(),
                    notification: key.clone(),
                })?;
            handlers.push(handler);
        }

        trace!(notification = %key, handlers = handlers.len(), "publishing notification");
        let executors = handlers
            .into_iter()
            .map(|handler| executor(handler, &notification))
            .collect();
        self.publisher.publish_dyn(executors, cancel).await
    }
}

fn executor<'a, N: Notification>(
    handler: Arc<dyn DynNotificationHandler<N>>,
    notification: &'a N,
) -> HandlerExecutor<'a> {
    Box::new(
        move |cancel: CancellationToken| -> BoxFuture<'a, Result<(), BoxError>> {
            Box::pin(async move { handler.handle_dyn(notification, cancel).await })
        },
    )
}

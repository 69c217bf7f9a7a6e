//! Reference service locator.
//!
//! [`ServiceCollection`] is a small container for hosts without their own
//! dependency injection: it maps an implementation key to a factory for one
//! message type and hands out typed instances on request.
//!
//! Registrations are closed: a blanket behavior such as
//! `impl<R: Request> PipelineBehavior<R> for Audit` is registered once per
//! request type it should wrap. Hosts that need open resolution implement
//! [`ServiceLocator`] themselves.
//!
//! # Example
//!
//! ```rust,ignore
//! let services = ServiceCollection::new()
//!     .add_request_handler::<GetUser, _>(|| GetUserHandler::new(db.clone()))
//!     .with_lifetime(Lifetime::Singleton)
//!     .add_behavior::<GetUser, _>(|| LoggingBehavior);
//! ```

use courier_core::{
    Command, CommandHandler, Described, DynCommandHandler, DynNotificationHandler,
    DynPipelineBehavior, DynRequestHandler, Notification, NotificationHandler, PipelineBehavior,
    Request, RequestHandler, ServiceLocator, TypeKey,
};
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::{Arc, OnceLock},
};
use tracing::trace;

/// How long a resolved instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// A new instance for every resolution.
    #[default]
    Transient,
    /// One instance, created on first resolution and shared afterwards.
    Singleton,
}

type Erased = Arc<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn() -> Erased + Send + Sync>;

enum Provider {
    Transient(Factory),
    Singleton(Factory, OnceLock<Erased>),
}

impl Provider {
    fn get(&self) -> Erased {
        match self {
            Provider::Transient(factory) => factory(),
            Provider::Singleton(factory, instance) => instance.get_or_init(|| factory()).clone(),
        }
    }
}

/// A map from (implementation, service type) to instance factories.
pub struct ServiceCollection {
    lifetime: Lifetime,
    providers: HashMap<(TypeKey, TypeId), Provider>,
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceCollection {
    /// An empty collection registering transient services.
    pub fn new() -> Self {
        Self {
            lifetime: Lifetime::Transient,
            providers: HashMap::new(),
        }
    }

    /// Lifetime used by subsequent registrations.
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Registers `H` as the request handler for `R` under `H`'s key.
    pub fn add_request_handler<R, H>(self, factory: impl Fn() -> H + Send + Sync + 'static) -> Self
    where
        R: Request,
        H: RequestHandler<R> + Described,
    {
        self.insert::<Arc<dyn DynRequestHandler<R>>>(H::type_key(), move || {
            Arc::new(factory()) as Arc<dyn DynRequestHandler<R>>
        })
    }

    /// Registers `H` as the command handler for `C` under `H`'s key.
    pub fn add_command_handler<C, H>(self, factory: impl Fn() -> H + Send + Sync + 'static) -> Self
    where
        C: Command,
        H: CommandHandler<C> + Described,
    {
        self.insert::<Arc<dyn DynCommandHandler<C>>>(H::type_key(), move || {
            Arc::new(factory()) as Arc<dyn DynCommandHandler<C>>
        })
    }

    /// Registers `H` as a notification handler for `N` under `H`'s key.
    pub fn add_notification_handler<N, H>(
        self,
        factory: impl Fn() -> H + Send + Sync + 'static,
    ) -> Self
    where
        N: Notification,
        H: NotificationHandler<N> + Described,
    {
        self.insert::<Arc<dyn DynNotificationHandler<N>>>(H::type_key(), move || {
            Arc::new(factory()) as Arc<dyn DynNotificationHandler<N>>
        })
    }

    /// Registers `B` as a behavior for `R` under `B`'s key.
    pub fn add_behavior<R, B>(self, factory: impl Fn() -> B + Send + Sync + 'static) -> Self
    where
        R: Request,
        B: PipelineBehavior<R> + Described,
    {
        self.insert::<Arc<dyn DynPipelineBehavior<R>>>(B::type_key(), move || {
            Arc::new(factory()) as Arc<dyn DynPipelineBehavior<R>>
        })
    }

    fn insert<S: Send + Sync + 'static>(
        mut self,
        implementation: TypeKey,
        factory: impl Fn() -> S + Send + Sync + 'static,
    ) -> Self {
        let factory: Factory = Arc::new(move || Arc::new(factory()) as Erased);
        let provider = match self.lifetime {
            Lifetime::Transient => Provider::Transient(factory),
            Lifetime::Singleton => Provider::Singleton(factory, OnceLock::new()),
        };
        self.providers
            .insert((implementation, TypeId::of::<S>()), provider);
        self
    }

    fn resolve<S: Clone + Send + Sync + 'static>(&self, implementation: &TypeKey) -> Option<S> {
        let provider = self
            .providers
            .get(&(implementation.clone(), TypeId::of::<S>()))?;
        let resolved = provider.get().downcast_ref::<S>().cloned();
        trace!(%implementation, found = resolved.is_some(), "resolved service");
        resolved
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl ServiceLocator for ServiceCollection {
    fn request_handler<R: Request>(
        &self,
        implementation: &TypeKey,
    ) -> Option<Arc<dyn DynRequestHandler<R>>> {
        self.resolve(implementation)
    }

    fn command_handler<C: Command>(
        &self,
        implementation: &TypeKey,
    ) -> Option<Arc<dyn DynCommandHandler<C>>> {
        self.resolve(implementation)
    }

    fn notification_handler<N: Notification>(
        &self,
        implementation: &TypeKey,
    ) -> Option<Arc<dyn DynNotificationHandler<N>>> {
        self.resolve(implementation)
    }

    fn behavior<R: Request>(
        &self,
        implementation: &TypeKey,
    ) -> Option<Arc<dyn DynPipelineBehavior<R>>> {
        self.resolve(implementation)
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("lifetime", &self.lifetime)
            .field("registrations", &self.providers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{BoxError, CancellationToken};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CREATED: AtomicUsize = AtomicUsize::new(0);

    struct Ping;
    impl Described for Ping {
        fn type_key() -> TypeKey {
            TypeKey::named("tests::Ping")
        }
    }
    impl Request for Ping {
        type Response = u32;
    }

    struct PingHandler;
    impl Described for PingHandler {
        fn type_key() -> TypeKey {
            TypeKey::named("tests::PingHandler")
        }
    }
    impl RequestHandler<Ping> for PingHandler {
        async fn handle(
            &self,
            _request: &Ping,
            _cancel: CancellationToken,
        ) -> Result<u32, BoxError> {
            Ok(7)
        }
    }

    fn counted() -> PingHandler {
        CREATED.fetch_add(1, Ordering::SeqCst);
        PingHandler
    }

    #[tokio::test]
    async fn test_resolves_registered_handler() {
        let services = ServiceCollection::new().add_request_handler::<Ping, _>(|| PingHandler);
        let handler = services
            .request_handler::<Ping>(&PingHandler::type_key())
            .unwrap();
        let response = handler
            .handle_dyn(&Ping, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response, 7);
        assert!(
            ServiceLocator::request_handler::<Ping>(&services, &TypeKey::named("tests::Other"))
                .is_none()
        );
        assert!(
            ServiceLocator::behavior::<Ping>(&services, &PingHandler::type_key()).is_none()
        );
    }

    #[test]
    fn test_singleton_created_once() {
        let before = CREATED.load(Ordering::SeqCst);
        let services = ServiceCollection::new()
            .with_lifetime(Lifetime::Singleton)
            .add_request_handler::<Ping, _>(counted);
        let key = PingHandler::type_key();
        let first = ServiceLocator::request_handler::<Ping>(&services, &key).unwrap();
        let second = ServiceLocator::request_handler::<Ping>(&services, &key).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(CREATED.load(Ordering::SeqCst) - before, 1);
    }
}

//! Registry configuration.
//!
//! [`Configuration`] collects everything a registry build needs: the units to
//! scan, an inclusion predicate, the resource guards, the ordered behavior
//! list, and the notification strategy the mediator uses afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! let config = Configuration::new()
//!     .unit(app_unit())
//!     .notification_strategy(PublishStrategy::Concurrent)
//!     .registration_timeout(Duration::from_secs(5))
//!     .max_specialization_product(64)
//!     .add_open_behavior::<LoggingBehavior>(100)
//!     .allow_open_generic_handlers(true);
//!
//! let mediator = Mediator::build(&config, services)?;
//! ```

use crate::{
    publish::{DynNotificationPublisher, PublishStrategy},
    services::Lifetime,
    specialize::Limits,
    unit::Unit,
};
use courier_core::{Described, Request, ShapeInstance, ShapeKind, Slot, TypeKey};
use std::{collections::BTreeMap, fmt, sync::Arc, time::Duration};

/// Predicate deciding which scanned types may become implementations.
pub type TypeFilter = Arc<dyn Fn(&TypeKey) -> bool + Send + Sync>;

/// A behavior added through configuration rather than discovered in a unit.
#[derive(Debug, Clone)]
pub struct BehaviorRegistration {
    implementation: TypeKey,
    shape: ShapeInstance,
    order: i32,
    constraints: BTreeMap<usize, Vec<TypeKey>>,
}

impl BehaviorRegistration {
    /// A behavior `implementation` wrapping requests matching `shape`.
    ///
    /// # Panics
    ///
    /// Panics if `shape` is not a pipeline behavior shape.
    pub fn new(implementation: TypeKey, shape: ShapeInstance, order: i32) -> Self {
        assert_eq!(
            shape.kind(),
            ShapeKind::PipelineBehavior,
            "behavior registrations take a pipeline behavior shape"
        );
        Self {
            implementation,
            shape,
            order,
            constraints: BTreeMap::new(),
        }
    }

    /// `B` wrapping exactly the request `R`.
    pub fn closed<B: Described, R: Request>(order: i32) -> Self {
        Self::new(
            B::type_key(),
            ShapeInstance::behavior::<R, R::Response>(),
            order,
        )
    }

    /// `B` wrapping every request.
    pub fn open<B: Described>(order: i32) -> Self {
        Self::new(
            B::type_key(),
            ShapeInstance::behavior::<Slot<0>, Slot<1>>(),
            order,
        )
    }

    /// Requires slot `slot` to be bound to a type carrying `capability`.
    pub fn constrain(mut self, slot: usize, capability: TypeKey) -> Self {
        self.constraints.entry(slot).or_default().push(capability);
        self
    }

    /// Key of the behavior type.
    pub fn implementation(&self) -> &TypeKey {
        &self.implementation
    }

    /// The wrapped shape; may contain slots.
    pub fn shape(&self) -> &ShapeInstance {
        &self.shape
    }

    /// Execution order. Higher runs further out.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Constraints on one slot.
    pub fn slot_constraints(&self, slot: usize) -> &[TypeKey] {
        self.constraints.get(&slot).map_or(&[], Vec::as_slice)
    }

    /// Constraints on every slot.
    pub fn constraints(&self) -> &BTreeMap<usize, Vec<TypeKey>> {
        &self.constraints
    }
}

/// Builder for registry and mediator settings.
#[derive(Clone)]
pub struct Configuration {
    units: Vec<Unit>,
    type_filter: Option<TypeFilter>,
    notification_strategy: PublishStrategy,
    notification_publisher: Option<Arc<dyn DynNotificationPublisher>>,
    lifetime: Lifetime,
    registration_timeout: Option<Duration>,
    limits: Limits,
    behaviors: Vec<BehaviorRegistration>,
    allow_open_generic_handlers: bool,
    require_notification_handlers: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl Configuration {
    /// Default settings: no units, every type included, sequential publish,
    /// transient lifetime, no timeout, no limits, closed handlers only.
    pub fn new() -> Self {
        Self {
            units: Vec::new(),
            type_filter: None,
            notification_strategy: PublishStrategy::Sequential,
            notification_publisher: None,
            lifetime: Lifetime::Transient,
            registration_timeout: None,
            limits: Limits::default(),
            behaviors: Vec::new(),
            allow_open_generic_handlers: false,
            require_notification_handlers: false,
        }
    }

    /// Adds a unit to scan.
    pub fn unit(mut self, unit: Unit) -> Self {
        self.units.push(unit);
        self
    }

    /// Adds several units to scan.
    pub fn units(mut self, units: impl IntoIterator<Item = Unit>) -> Self {
        self.units.extend(units);
        self
    }

    /// Only types accepted by `filter` become implementations.
    pub fn type_filter(
        mut self,
        filter: impl Fn(&TypeKey) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.type_filter = Some(Arc::new(filter));
        self
    }

    /// Selects a built-in notification strategy.
    pub fn notification_strategy(mut self, strategy: PublishStrategy) -> Self {
        self.notification_strategy = strategy;
        self.notification_publisher = None;
        self
    }

    /// Uses a custom notification publisher.
    pub fn notification_publisher(mut self, publisher: Arc<dyn DynNotificationPublisher>) -> Self {
        self.notification_publisher = Some(publisher);
        self
    }

    /// Lifetime hint for hosts; Courier itself never creates instances.
    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Bounds the registry build. `Duration::ZERO` fails immediately.
    pub fn registration_timeout(mut self, timeout: Duration) -> Self {
        self.registration_timeout = Some(timeout);
        self
    }

    /// Replaces all specialization limits.
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Maximum slots per open implementation; `0` is unbounded.
    pub fn max_generic_slots(mut self, max: usize) -> Self {
        self.limits.max_generic_slots = max;
        self
    }

    /// Maximum candidates per slot; `0` is unbounded.
    pub fn max_candidates_per_slot(mut self, max: usize) -> Self {
        self.limits.max_candidates_per_slot = max;
        self
    }

    /// Maximum specializations per open implementation; `0` is unbounded.
    pub fn max_specialization_product(mut self, max: usize) -> Self {
        self.limits.max_specialization_product = max;
        self
    }

    /// Appends a behavior registration. Duplicates are kept.
    pub fn behavior(mut self, registration: BehaviorRegistration) -> Self {
        self.behaviors.push(registration);
        self
    }

    /// Appends behavior `B` for request `R`.
    pub fn add_behavior<B: Described, R: Request>(self, order: i32) -> Self {
        self.behavior(BehaviorRegistration::closed::<B, R>(order))
    }

    /// Appends behavior `B` for every request.
    pub fn add_open_behavior<B: Described>(self, order: i32) -> Self {
        self.behavior(BehaviorRegistration::open::<B>(order))
    }

    /// Specialize open handlers other than catch-all notification handlers.
    pub fn allow_open_generic_handlers(mut self, allow: bool) -> Self {
        self.allow_open_generic_handlers = allow;
        self
    }

    /// Make publishing a notification nobody observes an error.
    pub fn require_notification_handlers(mut self, require: bool) -> Self {
        self.require_notification_handlers = require;
        self
    }

    /// Units to scan, in order.
    pub fn configured_units(&self) -> &[Unit] {
        &self.units
    }

    /// Whether `key` passes the inclusion predicate.
    pub fn includes(&self, key: &TypeKey) -> bool {
        self.type_filter.as_ref().is_none_or(|filter| filter(key))
    }

    /// The configured notification strategy.
    pub fn configured_strategy(&self) -> PublishStrategy {
        self.notification_strategy
    }

    /// The notification publisher to use.
    pub fn publisher(&self) -> Arc<dyn DynNotificationPublisher> {
        match &self.notification_publisher {
            Some(publisher) => publisher.clone(),
            None => self.notification_strategy.publisher(),
        }
    }

    /// The configured lifetime hint.
    pub fn configured_lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// The registration timeout; `None` is unbounded.
    pub fn configured_timeout(&self) -> Option<Duration> {
        self.registration_timeout
    }

    /// The specialization limits.
    pub fn configured_limits(&self) -> Limits {
        self.limits
    }

    /// Configured behaviors, in registration order.
    pub fn configured_behaviors(&self) -> &[BehaviorRegistration] {
        &self.behaviors
    }

    /// Whether open handlers are specialized.
    pub fn allows_open_generic_handlers(&self) -> bool {
        self.allow_open_generic_handlers
    }

    /// Whether publishing requires at least one handler.
    pub fn requires_notification_handlers(&self) -> bool {
        self.require_notification_handlers
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units: Vec<&str> = self.units.iter().map(Unit::name).collect();
        f.debug_struct("Configuration")
            .field("units", &units)
            .field("type_filter", &self.type_filter.is_some())
            .field("notification_strategy", &self.notification_strategy)
            .field("custom_publisher", &self.notification_publisher.is_some())
            .field("lifetime", &self.lifetime)
            .field("registration_timeout", &self.registration_timeout)
            .field("limits", &self.limits)
            .field("behaviors", &self.behaviors)
            .field(
                "allow_open_generic_handlers",
                &self.allow_open_generic_handlers,
            )
            .field(
                "require_notification_handlers",
                &self.require_notification_handlers,
            )
            .finish()
    }
}

//! # Registry
//!
//! The frozen lookup table the mediator reads at call time:
//!
//! - request signature to one handler plus its behaviors, sorted outermost
//!   first;
//! - command signature to one handler;
//! - notification signature to every handler, in registration order, plus
//!   catch-all handlers matched by capability at publish time.
//!
//! A registry is built once from a [`Configuration`] and never mutated
//! afterwards, so it is shared as `Arc<Registry>` and read without locks.

use crate::{
    catalog::{Catalog, Implementation, ScanOptions, complete_binding, satisfies},
    config::Configuration,
    specialize::{BuildBudget, Specializer},
};
use courier_core::{
    CancellationToken, MessageSignature, RegistrationError, ShapeInstance, ShapeKind, TypeKey,
};
use std::collections::{BTreeMap, HashMap, HashSet, hash_map::Entry};
use tracing::{debug, info};

/// A registered handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerDescriptor {
    /// Key the service locator resolves the instance from.
    pub implementation: TypeKey,
    /// The handler shape.
    pub shape: ShapeKind,
    /// The signature served.
    pub signature: MessageSignature,
}

/// A behavior applied to one request signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehaviorDescriptor {
    /// Key the service locator resolves the instance from.
    pub implementation: TypeKey,
    /// Declared order; higher runs further out.
    pub order: i32,
    /// Registration order, used to break ties.
    pub sequence: usize,
    /// The wrapped request signature.
    pub signature: MessageSignature,
}

/// Everything needed to send one request signature.
#[derive(Debug, Clone)]
pub struct RequestEntry {
    handler: HandlerDescriptor,
    behaviors: Vec<BehaviorDescriptor>,
}

impl RequestEntry {
    /// The handler.
    pub fn handler(&self) -> &HandlerDescriptor {
        &self.handler
    }

    /// Behaviors in execution order, outermost first.
    pub fn behaviors(&self) -> &[BehaviorDescriptor] {
        &self.behaviors
    }
}

/// An open notification handler applied to every notification satisfying
/// its slot constraints.
#[derive(Debug, Clone)]
struct CatchAll {
    implementation: TypeKey,
    constraints: Vec<TypeKey>,
}

/// A behavior candidate, discovered or configured.
struct BehaviorSource {
    implementation: TypeKey,
    shape: ShapeInstance,
    order: i32,
    constraints: BTreeMap<usize, Vec<TypeKey>>,
}

/// Frozen signature-to-handler table.
#[derive(Debug, Default)]
pub struct Registry {
    requests: HashMap<MessageSignature, RequestEntry>,
    commands: HashMap<MessageSignature, HandlerDescriptor>,
    notifications: HashMap<MessageSignature, Vec<HandlerDescriptor>>,
    catch_alls: Vec<CatchAll>,
    capabilities: HashMap<TypeKey, HashSet<TypeKey>>,
}

impl Registry {
    /// Builds the registry described by `config`.
    pub fn build(config: &Configuration) -> Result<Self, RegistrationError> {
        Self::build_with_cancel(config, CancellationToken::new())
    }

    /// Like [`Registry::build`], stopping with
    /// [`RegistrationError::Cancelled`] once `cancel` fires.
    pub fn build_with_cancel(
        config: &Configuration,
        cancel: CancellationToken,
    ) -> Result<Self, RegistrationError> {
        if config.configured_units().is_empty() {
            return Err(RegistrationError::NoUnits);
        }
        let budget = BuildBudget::new(config.configured_timeout(), cancel);
        budget.check()?;

        let filter = |key: &TypeKey| config.includes(key);
        let options = ScanOptions {
            filter: &filter,
            allow_open_generic_handlers: config.allows_open_generic_handlers(),
        };
        let catalog = Catalog::scan(config.configured_units(), &options, &budget)?;
        let specializer = Specializer::new(&catalog, config.configured_limits(), &budget);

        let mut registry = Registry::default();
        let mut handlers: Vec<HandlerDescriptor> = Vec::new();

        for kind in [ShapeKind::RequestHandler, ShapeKind::CommandHandler] {
            // Types declaring the shape themselves win over inherited ones.
            let closed = catalog.implementations(kind);
            let direct = closed.iter().filter(|i| i.is_direct());
            let inherited = closed.iter().filter(|i| !i.is_direct());
            handlers.extend(direct.chain(inherited).filter_map(closed_descriptor));
        }
        handlers.extend(
            catalog
                .implementations(ShapeKind::NotificationHandler)
                .iter()
                .filter_map(closed_descriptor),
        );

        for kind in [
            ShapeKind::RequestHandler,
            ShapeKind::CommandHandler,
            ShapeKind::NotificationHandler,
        ] {
            for open in catalog.open_implementations(kind) {
                if open.is_catch_all() {
                    debug!(
                        implementation = %open.key(),
                        "registered catch-all notification handler"
                    );
                    registry.catch_alls.push(CatchAll {
                        implementation: open.key().clone(),
                        constraints: open.slot_constraints(0).to_vec(),
                    });
                    continue;
                }
                for specialization in specializer.specialize(open)? {
                    handlers.push(HandlerDescriptor {
                        implementation: specialization.implementation,
                        shape: kind,
                        signature: specialization.signature,
                    });
                }
            }
        }

        for handler in handlers {
            budget.check()?;
            registry.insert(handler);
        }

        let behaviors = behavior_sources(&catalog, config);
        registry.attach_behaviors(&behaviors, catalog.capability_table(), &budget)?;
        registry.capabilities = catalog.capability_table().clone();

        info!(
            requests = registry.requests.len(),
            commands = registry.commands.len(),
            notifications = registry.notifications.len(),
            catch_alls = registry.catch_alls.len(),
            behaviors = behaviors.len(),
            "registry built"
        );
        Ok(registry)
    }

    fn insert(&mut self, handler: HandlerDescriptor) {
        match handler.signature.handler_shape() {
            ShapeKind::RequestHandler => match self.requests.entry(handler.signature.clone()) {
                Entry::Occupied(existing) => debug!(
                    ignored = %handler.implementation,
                    kept = %existing.get().handler.implementation,
                    signature = %handler.signature,
                    "duplicate request handler ignored"
                ),
                Entry::Vacant(slot) => {
                    debug!(
                        implementation = %handler.implementation,
                        signature = %handler.signature,
                        "registered handler"
                    );
                    slot.insert(RequestEntry {
                        handler,
                        behaviors: Vec::new(),
                    });
                }
            },
            ShapeKind::CommandHandler => match self.commands.entry(handler.signature.clone()) {
                Entry::Occupied(existing) => debug!(
                    ignored = %handler.implementation,
                    kept = %existing.get().implementation,
                    signature = %handler.signature,
                    "duplicate command handler ignored"
                ),
                Entry::Vacant(slot) => {
                    debug!(
                        implementation = %handler.implementation,
                        signature = %handler.signature,
                        "registered handler"
                    );
                    slot.insert(handler);
                }
            },
            ShapeKind::NotificationHandler | ShapeKind::PipelineBehavior => {
                debug!(
                    implementation = %handler.implementation,
                    signature = %handler.signature,
                    "registered handler"
                );
                self.notifications
                    .entry(handler.signature.clone())
                    .or_default()
                    .push(handler);
            }
        }
    }

    /// Wraps every request entry in the behaviors that apply to it.
    fn attach_behaviors(
        &mut self,
        sources: &[BehaviorSource],
        capabilities: &HashMap<TypeKey, HashSet<TypeKey>>,
        budget: &BuildBudget,
    ) -> Result<(), RegistrationError> {
        for (signature, entry) in &mut self.requests {
            budget.check()?;
            entry.behaviors = applicable_behaviors(sources, signature, capabilities);
        }
        Ok(())
    }

    /// The entry for a request signature.
    pub fn request(&self, signature: &MessageSignature) -> Option<&RequestEntry> {
        self.requests.get(signature)
    }

    /// The handler for a command signature.
    pub fn command(&self, signature: &MessageSignature) -> Option<&HandlerDescriptor> {
        self.commands.get(signature)
    }

    /// Implementations observing `notification`: registered handlers in
    /// registration order, then matching catch-all handlers.
    pub fn notification_handlers(&self, notification: &TypeKey) -> Vec<&TypeKey> {
        let signature = MessageSignature::Notification {
            notification: notification.clone(),
        };
        let registered = self
            .notifications
            .get(&signature)
            .into_iter()
            .flatten()
            .map(|handler| &handler.implementation);
        let catch_alls = self
            .catch_alls
            .iter()
            .filter(|catch_all| satisfies(&self.capabilities, notification, &catch_all.constraints))
            .map(|catch_all| &catch_all.implementation);
        registered.chain(catch_alls).collect()
    }

    /// Every registered request entry.
    pub fn requests(&self) -> impl Iterator<Item = &RequestEntry> {
        self.requests.values()
    }

    /// Every registered command handler.
    pub fn commands(&self) -> impl Iterator<Item = &HandlerDescriptor> {
        self.commands.values()
    }

    /// Every registered notification handler (catch-alls excluded).
    pub fn notifications(&self) -> impl Iterator<Item = &HandlerDescriptor> {
        self.notifications.values().flatten()
    }

    /// Number of catch-all notification handlers.
    pub fn catch_all_count(&self) -> usize {
        self.catch_alls.len()
    }
}

fn closed_descriptor(implementation: &Implementation) -> Option<HandlerDescriptor> {
    Some(HandlerDescriptor {
        implementation: implementation.key().clone(),
        shape: implementation.shape().kind(),
        signature: implementation.shape().signature()?,
    })
}

/// Discovered behaviors in scan order, then configured ones in list order.
fn behavior_sources(catalog: &Catalog, config: &Configuration) -> Vec<BehaviorSource> {
    let mut discovered: Vec<&Implementation> = catalog
        .implementations(ShapeKind::PipelineBehavior)
        .iter()
        .chain(catalog.open_implementations(ShapeKind::PipelineBehavior))
        .collect();
    discovered.sort_by_key(|implementation| implementation.position());

    let discovered = discovered.into_iter().map(|implementation| BehaviorSource {
        implementation: implementation.key().clone(),
        shape: implementation.shape().clone(),
        order: implementation.order(),
        constraints: implementation.constraints().clone(),
    });
    let configured = config
        .configured_behaviors()
        .iter()
        .map(|registration| BehaviorSource {
            implementation: registration.implementation().clone(),
            shape: registration.shape().clone(),
            order: registration.order(),
            constraints: registration.constraints().clone(),
        });
    discovered.chain(configured).collect()
}

/// Behaviors wrapping `signature`, outermost first.
///
/// Higher orders run further out; equal orders keep registration order.
fn applicable_behaviors(
    sources: &[BehaviorSource],
    signature: &MessageSignature,
    capabilities: &HashMap<TypeKey, HashSet<TypeKey>>,
) -> Vec<BehaviorDescriptor> {
    let MessageSignature::Request { request, response } = signature else {
        return Vec::new();
    };
    let target = TypeKey::generic("", [request.clone(), response.clone()]);

    let mut behaviors: Vec<BehaviorDescriptor> = sources
        .iter()
        .enumerate()
        .filter_map(|(sequence, source)| {
            let pattern = TypeKey::generic("", source.shape.args().iter().cloned());
            let binding = pattern.unify(&target)?;
            for (slot, constraints) in &source.constraints {
                let bound = binding.get(*slot).and_then(Option::as_ref);
                match bound {
                    Some(bound) if satisfies(capabilities, bound, constraints) => {}
                    None if constraints.is_empty() => {}
                    _ => return None,
                }
            }
            let implementation = source
                .implementation
                .substitute(&complete_binding(binding))
                .filter(|implementation| !implementation.is_open())?;
            Some(BehaviorDescriptor {
                implementation,
                order: source.order,
                sequence,
                signature: signature.clone(),
            })
        })
        .collect();
    behaviors.sort_by(|a, b| b.order.cmp(&a.order).then(a.sequence.cmp(&b.sequence)));
    behaviors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::BehaviorRegistration,
        unit::{TypeDef, Unit},
    };
    use courier_core::Slot;
    use std::time::Duration;

    fn key(path: &'static str) -> TypeKey {
        TypeKey::named(path)
    }

    fn ping() -> MessageSignature {
        MessageSignature::Request {
            request: key("tests::Ping"),
            response: key("tests::Pong"),
        }
    }

    fn request_handler(
        name: &'static str,
        request: &'static str,
        response: &'static str,
    ) -> TypeDef {
        TypeDef::new(key(name)).implements(ShapeInstance::new(
            ShapeKind::RequestHandler,
            vec![key(request), key(response)],
        ))
    }

    fn pipeline(request: &'static str, response: &'static str) -> ShapeInstance {
        ShapeInstance::new(
            ShapeKind::PipelineBehavior,
            vec![key(request), key(response)],
        )
    }

    fn ping_unit() -> Unit {
        Unit::new("app").with(request_handler("tests::PingHandler", "tests::Ping", "tests::Pong"))
    }

    #[test]
    fn test_no_units() {
        let error = Registry::build(&Configuration::new()).unwrap_err();
        assert!(matches!(error, RegistrationError::NoUnits));
    }

    #[test]
    fn test_zero_timeout() {
        let config = Configuration::new()
            .unit(ping_unit())
            .registration_timeout(Duration::ZERO);
        let error = Registry::build(&config).unwrap_err();
        assert!(matches!(error, RegistrationError::TimedOut(_)));
    }

    #[test]
    fn test_maximum_timeout_is_unbounded() {
        let config = Configuration::new()
            .unit(ping_unit())
            .registration_timeout(Duration::MAX);
        let registry = Registry::build(&config).unwrap();
        assert!(registry.request(&ping()).is_some());
    }

    #[test]
    fn test_cancelled_build() {
        let config = Configuration::new().unit(ping_unit());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let error = Registry::build_with_cancel(&config, cancel).unwrap_err();
        assert!(matches!(error, RegistrationError::Cancelled));
    }

    #[test]
    fn test_behavior_assignment_checks_budget() {
        let mut registry = Registry::build(&Configuration::new().unit(ping_unit())).unwrap();
        let sources = [BehaviorSource {
            implementation: key("tests::Wrapper"),
            shape: pipeline("tests::Ping", "tests::Pong"),
            order: 0,
            constraints: BTreeMap::new(),
        }];
        let capabilities = HashMap::new();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let budget = BuildBudget::new(None, cancel);
        let error = registry
            .attach_behaviors(&sources, &capabilities, &budget)
            .unwrap_err();
        assert!(matches!(error, RegistrationError::Cancelled));

        let budget = BuildBudget::unbounded();
        registry
            .attach_behaviors(&sources, &capabilities, &budget)
            .unwrap();
        assert_eq!(registry.request(&ping()).unwrap().behaviors().len(), 1);
    }

    #[test]
    fn test_signature_includes_response() {
        let unit = Unit::new("app")
            .with(request_handler("tests::PongHandler", "tests::Ping", "tests::Pong"))
            .with(request_handler("tests::EchoHandler", "tests::Ping", "tests::Echo"));
        let registry = Registry::build(&Configuration::new().unit(unit)).unwrap();

        assert_eq!(
            registry.request(&ping()).unwrap().handler().implementation,
            key("tests::PongHandler")
        );
        let echo = MessageSignature::Request {
            request: key("tests::Ping"),
            response: key("tests::Echo"),
        };
        assert_eq!(
            registry.request(&echo).unwrap().handler().implementation,
            key("tests::EchoHandler")
        );
    }

    #[test]
    fn test_direct_declaration_preferred_then_first_wins() {
        let unit = Unit::new("app")
            .with(request_handler("tests::Base", "tests::Ping", "tests::Pong").mark_abstract())
            .with(TypeDef::new(key("tests::Inherited")).extends(key("tests::Base")))
            .with(request_handler("tests::First", "tests::Ping", "tests::Pong"))
            .with(request_handler("tests::Second", "tests::Ping", "tests::Pong"));
        let registry = Registry::build(&Configuration::new().unit(unit)).unwrap();
        assert_eq!(
            registry.request(&ping()).unwrap().handler().implementation,
            key("tests::First")
        );
        assert_eq!(registry.requests().count(), 1);
    }

    #[test]
    fn test_behavior_order_and_ties() {
        let open = || ShapeInstance::behavior::<Slot<0>, Slot<1>>();
        let discovered = TypeDef::new(key("tests::Discovered"))
            .implements(open())
            .order(5);
        let never = BehaviorRegistration::new(key("tests::Never"), open(), 1)
            .constrain(0, key("tests::Marker"));
        let config = Configuration::new()
            .unit(ping_unit().with(discovered))
            .behavior(never)
            .behavior(BehaviorRegistration::new(
                key("tests::Inner"),
                pipeline("tests::Ping", "tests::Pong"),
                1,
            ))
            .behavior(BehaviorRegistration::new(key("tests::Outer"), open(), 10))
            .behavior(BehaviorRegistration::new(key("tests::Tied"), open(), 5))
            .behavior(BehaviorRegistration::new(
                key("tests::Elsewhere"),
                pipeline("tests::Other", "tests::Pong"),
                50,
            ));
        let registry = Registry::build(&config).unwrap();
        let order: Vec<_> = registry
            .request(&ping())
            .unwrap()
            .behaviors()
            .iter()
            .map(|behavior| behavior.implementation.clone())
            .collect();
        assert_eq!(
            order,
            vec![
                key("tests::Outer"),
                key("tests::Discovered"),
                key("tests::Tied"),
                key("tests::Inner"),
            ]
        );
    }

    #[test]
    fn test_catch_all_matches_by_capability() {
        let audited = key("tests::Audited");
        let open = || ShapeInstance::notification::<Slot<0>>();
        let deleted = ShapeInstance::new(
            ShapeKind::NotificationHandler,
            vec![key("tests::Deleted")],
        );
        let audit_log = TypeDef::new(key("tests::AuditLog"))
            .implements(open())
            .constrain(0, audited.clone());
        let unit = Unit::new("app")
            .with(audit_log)
            .with(TypeDef::new(key("tests::Tracer")).implements(open()))
            .with(TypeDef::new(key("tests::Deleted")).capability(audited))
            .with(TypeDef::new(key("tests::DeletedHandler")).implements(deleted));
        let registry = Registry::build(&Configuration::new().unit(unit)).unwrap();

        assert_eq!(registry.catch_all_count(), 2);
        assert_eq!(
            registry.notification_handlers(&key("tests::Deleted")),
            vec![
                &key("tests::DeletedHandler"),
                &key("tests::AuditLog"),
                &key("tests::Tracer"),
            ]
        );
        assert_eq!(
            registry.notification_handlers(&key("tests::Unknown")),
            vec![&key("tests::Tracer")]
        );
    }
}

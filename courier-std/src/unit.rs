//! # Loadable Units
//!
//! A [`Unit`] is a named, ordered list of [`TypeDef`]s: the declarations the
//! catalog scans. A `TypeDef` states everything the registry needs to know
//! about one type: which shapes it implements, which marker capabilities it
//! carries, its base type, the constraints on its generic slots, and (for
//! message types) what kind of message it is.
//!
//! # Example
//!
//! ```rust,ignore
//! let unit = Unit::new("app")
//!     .with(TypeDef::request::<GetUser>())
//!     .with(TypeDef::request_handler::<GetUserHandler, GetUser>())
//!     .with(
//!         TypeDef::of::<Greeter<Slot<0>>>()
//!             .implements(ShapeInstance::request::<Envelope<Slot<0>>, Reply<Slot<0>>>())
//!             .constrain(0, TypeKey::of_trait::<dyn Greetable>()),
//!     );
//! ```

use courier_core::{Command, Described, Notification, Request, ShapeInstance, Slot, TypeKey};
use std::{borrow::Cow, collections::BTreeMap};

/// What kind of message a type is, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageDecl {
    /// A request answered with the given response term.
    ///
    /// The term may mention the slots of the declaring type, so
    /// `Envelope<$0>` can answer with `Reply<$0>`.
    Request {
        /// Response term.
        response: TypeKey,
    },
    /// A fire-and-forget request.
    Command,
    /// A broadcast notification.
    Notification,
}

/// Declaration of one type inside a [`Unit`].
#[derive(Debug, Clone)]
pub struct TypeDef {
    key: TypeKey,
    shapes: Vec<ShapeInstance>,
    capabilities: Vec<TypeKey>,
    constraints: BTreeMap<usize, Vec<TypeKey>>,
    base: Option<TypeKey>,
    is_abstract: bool,
    message: Option<MessageDecl>,
    order: Option<i32>,
}

impl TypeDef {
    /// A bare declaration for `key`.
    pub fn new(key: TypeKey) -> Self {
        Self {
            key,
            shapes: Vec::new(),
            capabilities: Vec::new(),
            constraints: BTreeMap::new(),
            base: None,
            is_abstract: false,
            message: None,
            order: None,
        }
    }

    /// A bare declaration for `T`.
    pub fn of<T: Described>() -> Self {
        Self::new(T::type_key())
    }

    /// Declares request type `R` and its response.
    pub fn request<R: Request>() -> Self {
        Self::of::<R>().responds_with(<R::Response as Described>::type_key())
    }

    /// Declares command type `C`.
    pub fn command<C: Command>() -> Self {
        let mut def = Self::of::<C>();
        def.message = Some(MessageDecl::Command);
        def
    }

    /// Declares notification type `N`.
    pub fn notification<N: Notification>() -> Self {
        let mut def = Self::of::<N>();
        def.message = Some(MessageDecl::Notification);
        def
    }

    /// `H` handles request `R`.
    pub fn request_handler<H: Described, R: Request>() -> Self {
        Self::of::<H>().implements(ShapeInstance::request::<R, R::Response>())
    }

    /// `H` handles command `C`.
    pub fn command_handler<H: Described, C: Described>() -> Self {
        Self::of::<H>().implements(ShapeInstance::command::<C>())
    }

    /// `H` observes notification `N`.
    pub fn notification_handler<H: Described, N: Described>() -> Self {
        Self::of::<H>().implements(ShapeInstance::notification::<N>())
    }

    /// `H` observes every notification (a catch-all handler).
    pub fn catch_all_handler<H: Described>() -> Self {
        Self::of::<H>().implements(ShapeInstance::notification::<Slot<0>>())
    }

    /// `B` wraps every request (an open behavior).
    pub fn open_behavior<B: Described>() -> Self {
        Self::of::<B>().implements(ShapeInstance::behavior::<Slot<0>, Slot<1>>())
    }

    /// Adds an implemented shape.
    pub fn implements(mut self, shape: ShapeInstance) -> Self {
        if !self.shapes.contains(&shape) {
            self.shapes.push(shape);
        }
        self
    }

    /// Adds a marker capability, usually `TypeKey::of_trait::<dyn Marker>()`.
    pub fn capability(mut self, capability: TypeKey) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    /// Requires slot `slot` to be filled by a type carrying `capability`.
    pub fn constrain(mut self, slot: usize, capability: TypeKey) -> Self {
        let constraints = self.constraints.entry(slot).or_default();
        if !constraints.contains(&capability) {
            constraints.push(capability);
        }
        self
    }

    /// Sets the base type this type inherits shapes and capabilities from.
    pub fn extends(mut self, base: TypeKey) -> Self {
        self.base = Some(base);
        self
    }

    /// Marks the type abstract: never an implementation or a candidate itself.
    pub fn mark_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Declares the type as a request answered with `response`.
    pub fn responds_with(mut self, response: TypeKey) -> Self {
        self.message = Some(MessageDecl::Request { response });
        self
    }

    /// Execution order when the type is used as a behavior.
    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// The declared key.
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Shapes declared on this type itself (not inherited).
    pub fn shapes(&self) -> &[ShapeInstance] {
        &self.shapes
    }

    /// Capabilities declared on this type itself.
    pub fn capabilities(&self) -> &[TypeKey] {
        &self.capabilities
    }

    /// Constraints on every slot.
    pub fn constraints(&self) -> &BTreeMap<usize, Vec<TypeKey>> {
        &self.constraints
    }

    /// Constraints on one slot.
    pub fn slot_constraints(&self, slot: usize) -> &[TypeKey] {
        self.constraints.get(&slot).map_or(&[], Vec::as_slice)
    }

    /// The base type, if any.
    pub fn base(&self) -> Option<&TypeKey> {
        self.base.as_ref()
    }

    /// Whether the type is abstract.
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// The message declaration, if the type is a message.
    pub fn message(&self) -> Option<&MessageDecl> {
        self.message.as_ref()
    }

    /// The declared behavior order; `0` when unset.
    pub fn behavior_order(&self) -> i32 {
        self.order.unwrap_or(0)
    }
}

/// A named collection of type declarations.
#[derive(Debug, Clone)]
pub struct Unit {
    name: Cow<'static, str>,
    types: Vec<TypeDef>,
}

impl Unit {
    /// An empty unit.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
        }
    }

    /// Appends a declaration.
    pub fn with(mut self, def: TypeDef) -> Self {
        self.types.push(def);
        self
    }

    /// Appends a declaration in place.
    pub fn push(&mut self, def: TypeDef) {
        self.types.push(def);
    }

    /// The unit name; units are deduplicated by it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declarations in order.
    pub fn types(&self) -> &[TypeDef] {
        &self.types
    }
}

/// A declaration submitted from anywhere in the binary via `inventory`.
///
/// ```rust,ignore
/// fn greeter() -> TypeDef {
///     TypeDef::request_handler::<GreetHandler, Greet>()
/// }
///
/// inventory::submit! { UnitEntry::new("app", greeter) }
///
/// let unit = Unit::collected("app");
/// ```
#[cfg(feature = "inventory")]
pub struct UnitEntry {
    /// Unit the declaration belongs to.
    pub unit: &'static str,
    /// Produces the declaration.
    pub define: fn() -> TypeDef,
}

#[cfg(feature = "inventory")]
impl UnitEntry {
    /// Creates an entry.
    pub const fn new(unit: &'static str, define: fn() -> TypeDef) -> Self {
        Self { unit, define }
    }
}

#[cfg(feature = "inventory")]
inventory::collect!(UnitEntry);

#[cfg(feature = "inventory")]
impl Unit {
    /// Gathers every [`UnitEntry`] submitted for `name`.
    ///
    /// `inventory` does not define an iteration order across object files,
    /// so the declarations are sorted by key to keep builds reproducible.
    pub fn collected(name: &'static str) -> Self {
        let mut types: Vec<TypeDef> = inventory::iter::<UnitEntry>
            .into_iter()
            .filter(|entry| entry.unit == name)
            .map(|entry| (entry.define)())
            .collect();
        types.sort_by(|a, b| a.key.cmp(&b.key));
        Self {
            name: Cow::Borrowed(name),
            types,
        }
    }
}

//! Message signatures and capability shapes.
//!
//! A [`MessageSignature`] is the registry key a message is dispatched under.
//! A [`ShapeKind`] names one of the four contracts a type can implement, and a
//! [`ShapeInstance`] is that contract applied to concrete or open arguments.

use crate::{
    key::{Described, TypeKey},
    message::{Command, Notification, Request},
};
use std::fmt;

/// The contract a handler or behavior type implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    /// Handles a request and returns its response (request, response).
    RequestHandler,
    /// Handles a fire-and-forget request (request).
    CommandHandler,
    /// Observes a notification (notification).
    NotificationHandler,
    /// Wraps request handling (request, response).
    PipelineBehavior,
}

impl ShapeKind {
    /// Every shape, in the order the catalog scans them.
    pub const ALL: [ShapeKind; 4] = [
        ShapeKind::RequestHandler,
        ShapeKind::CommandHandler,
        ShapeKind::NotificationHandler,
        ShapeKind::PipelineBehavior,
    ];

    /// Number of type arguments the shape takes.
    pub const fn arity(self) -> usize {
        match self {
            ShapeKind::RequestHandler | ShapeKind::PipelineBehavior => 2,
            ShapeKind::CommandHandler | ShapeKind::NotificationHandler => 1,
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            ShapeKind::RequestHandler => "request handler",
            ShapeKind::CommandHandler => "command handler",
            ShapeKind::NotificationHandler => "notification handler",
            ShapeKind::PipelineBehavior => "pipeline behavior",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies what kind of message is dispatched and with which types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageSignature {
    /// A request and the response it produces.
    Request {
        /// Request type.
        request: TypeKey,
        /// Response type.
        response: TypeKey,
    },
    /// A fire-and-forget request.
    Command {
        /// Command type.
        request: TypeKey,
    },
    /// A broadcast notification.
    Notification {
        /// Notification type.
        notification: TypeKey,
    },
}

impl MessageSignature {
    /// Signature of request type `R`.
    pub fn request<R: Request>() -> Self {
        Self::Request {
            request: R::type_key(),
            response: <R::Response as Described>::type_key(),
        }
    }

    /// Signature of command type `C`.
    pub fn command<C: Command>() -> Self {
        Self::Command {
            request: C::type_key(),
        }
    }

    /// Signature of notification type `N`.
    pub fn notification<N: Notification>() -> Self {
        Self::Notification {
            notification: N::type_key(),
        }
    }

    /// The message type.
    pub fn message(&self) -> &TypeKey {
        match self {
            Self::Request { request, .. } | Self::Command { request } => request,
            Self::Notification { notification } => notification,
        }
    }

    /// The response type, for requests.
    pub fn response(&self) -> Option<&TypeKey> {
        match self {
            Self::Request { response, .. } => Some(response),
            _ => None,
        }
    }

    /// The handler shape serving this signature.
    pub fn handler_shape(&self) -> ShapeKind {
        match self {
            Self::Request { .. } => ShapeKind::RequestHandler,
            Self::Command { .. } => ShapeKind::CommandHandler,
            Self::Notification { .. } => ShapeKind::NotificationHandler,
        }
    }
}

impl fmt::Display for MessageSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request { request, response } => write!(f, "request {request} -> {response}"),
            Self::Command { request } => write!(f, "command {request}"),
            Self::Notification { notification } => write!(f, "notification {notification}"),
        }
    }
}

/// A shape applied to type arguments, some of which may be slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeInstance {
    kind: ShapeKind,
    args: Vec<TypeKey>,
}

impl ShapeInstance {
    /// Creates a shape instance.
    ///
    /// # Panics
    ///
    /// Panics if `args` does not match the arity of `kind`.
    pub fn new(kind: ShapeKind, args: Vec<TypeKey>) -> Self {
        assert_eq!(
            args.len(),
            kind.arity(),
            "{kind} takes {} type arguments",
            kind.arity()
        );
        Self { kind, args }
    }

    /// `RequestHandler<R, S>`.
    pub fn request<R: Described, S: Described>() -> Self {
        Self::new(
            ShapeKind::RequestHandler,
            vec![R::type_key(), S::type_key()],
        )
    }

    /// `CommandHandler<C>`.
    pub fn command<C: Described>() -> Self {
        Self::new(ShapeKind::CommandHandler, vec![C::type_key()])
    }

    /// `NotificationHandler<N>`.
    pub fn notification<N: Described>() -> Self {
        Self::new(ShapeKind::NotificationHandler, vec![N::type_key()])
    }

    /// `PipelineBehavior<R, S>`.
    pub fn behavior<R: Described, S: Described>() -> Self {
        Self::new(
            ShapeKind::PipelineBehavior,
            vec![R::type_key(), S::type_key()],
        )
    }

    /// The shape kind.
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// The type arguments.
    pub fn args(&self) -> &[TypeKey] {
        &self.args
    }

    /// The message argument (always the first).
    pub fn message(&self) -> &TypeKey {
        &self.args[0]
    }

    /// The response argument, for two-argument shapes.
    pub fn response(&self) -> Option<&TypeKey> {
        self.args.get(1)
    }

    /// Returns `true` if any argument contains a slot.
    pub fn is_open(&self) -> bool {
        self.args.iter().any(TypeKey::is_open)
    }

    /// The signature this closed instance serves; `None` while open.
    ///
    /// Behaviors report the request signature they wrap.
    pub fn signature(&self) -> Option<MessageSignature> {
        if self.is_open() {
            return None;
        }
        let message = self.args[0].clone();
        Some(match self.kind {
            ShapeKind::RequestHandler | ShapeKind::PipelineBehavior => MessageSignature::Request {
                request: message,
                response: self.args[1].clone(),
            },
            ShapeKind::CommandHandler => MessageSignature::Command { request: message },
            ShapeKind::NotificationHandler => MessageSignature::Notification {
                notification: message,
            },
        })
    }

    /// Substitutes a binding into every argument.
    pub fn substitute(&self, binding: &[TypeKey]) -> Option<ShapeInstance> {
        let args = self
            .args
            .iter()
            .map(|arg| arg.substitute(binding))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            kind: self.kind,
            args,
        })
    }
}

impl fmt::Display for ShapeInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<", self.kind)?;
        for (index, arg) in self.args.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(">")
    }
}

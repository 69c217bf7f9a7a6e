//! # courier-core
//!
//! Core traits and type identities for the Courier in-process mediator.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! libraries that define messages, handlers or behaviors without pulling in
//! the registry and dispatcher from `courier-std`.
//!
//! # Building Blocks
//!
//! ## Identity ([`TypeKey`], [`Described`])
//!
//! Every message, handler and behavior describes itself as a structured
//! [`TypeKey`]. Open (still generic) definitions use [`Slot<N>`] placeholders,
//! so specialization is plain substitution over keys.
//!
//! ## Messages ([`Request`], [`Command`], [`Notification`])
//!
//! The message's type is the only routing information a caller provides.
//!
//! ## Handlers ([`RequestHandler`], [`CommandHandler`], [`NotificationHandler`])
//!
//! The terminal point of a dispatch. Each comes with an object-safe `Dyn*`
//! twin used for storage.
//!
//! ## Behaviors ([`PipelineBehavior`], [`Next`])
//!
//! Cross-cutting logic wrapped around request handlers in a declared order.
//!
//! ## Boundary ([`ServiceLocator`], [`Sender`], [`Publisher`])
//!
//! The host provides instances through a locator and calls in through the
//! sender/publisher entry points.
//!
//! # Error Types
//!
//! - [`CourierError`] - Top-level error type
//! - [`RegistrationError`] - Registry build errors
//! - [`DispatchError`] - Request/command dispatch errors
//! - [`PublishError`] - Notification publish errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod behavior;
mod dispatcher;
mod error;
mod handler;
mod key;
mod locator;
mod message;
mod signature;

// Re-exports
pub use behavior::{DynPipelineBehavior, Next, PipelineBehavior};
pub use dispatcher::{Publisher, Sender};
pub use error::{
    BoxError, Cancelled, CourierError, DispatchError, PublishError, RegistrationError,
};
pub use handler::{
    CommandHandler, DynCommandHandler, DynNotificationHandler, DynRequestHandler,
    NotificationHandler, RequestHandler,
};
pub use key::{Described, Slot, TypeKey};
pub use locator::ServiceLocator;
pub use message::{Command, Notification, Request};
pub use signature::{MessageSignature, ShapeInstance, ShapeKind};
pub use tokio_util::sync::CancellationToken;

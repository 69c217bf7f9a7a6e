//! Message traits.
//!
//! A message's Rust type is its only routing information: callers never name
//! the handler. Three kinds exist:
//!
//! - [`Request`]: answered by exactly one handler with a [`Request::Response`]
//! - [`Command`]: a fire-and-forget request handled by exactly one handler
//! - [`Notification`]: broadcast to zero or more handlers

use crate::key::Described;

/// A request answered by exactly one handler.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Described)]
/// struct GetUser { id: u64 }
///
/// impl Request for GetUser {
///     type Response = Option<User>;
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Request`",
    label = "missing `Request` implementation",
    note = "Requests must name their response type: `impl Request for {Self} {{ type Response = ...; }}`."
)]
pub trait Request: Described + Send + Sync {
    /// The value the handler produces.
    type Response: Described + Send;
}

/// A fire-and-forget request handled by exactly one handler.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Command`",
    label = "missing `Command` implementation"
)]
pub trait Command: Described + Send + Sync {}

/// A broadcast message observed by zero or more handlers.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Notification`",
    label = "missing `Notification` implementation"
)]
pub trait Notification: Described + Send + Sync {}

//! Error types for Courier.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`CourierError`] - Top-level error type for all Courier operations
//! - [`RegistrationError`] - Errors while building the registry
//! - [`DispatchError`] - Errors while sending a request or command
//! - [`PublishError`] - Errors while publishing a notification
//!
//! Handler and behavior failures travel as [`BoxError`] and are surfaced
//! unchanged through the transparent `Handler` variants.

use crate::{key::TypeKey, signature::MessageSignature};
use std::time::Duration;
use thiserror::Error;

/// A boxed error type for handler and behavior failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Courier operations.
#[derive(Error, Debug)]
pub enum CourierError {
    /// Building the registry failed.
    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// Sending a request or command failed.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Publishing a notification failed.
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),
}

/// Errors that abort the registry build.
///
/// None of these are recoverable for the configuration that produced them:
/// no registry exists until a build succeeds.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// The configuration supplied no units to scan.
    #[error("no units to scan; supply at least one unit containing handlers")]
    NoUnits,

    /// An open implementation has more slots than allowed.
    #[error(
        "cannot specialize {implementation} for {message}: {slots} generic slots exceed the maximum of {max}"
    )]
    TooManySlots {
        /// The open implementation.
        implementation: TypeKey,
        /// The open message type it handles.
        message: TypeKey,
        /// Slots declared.
        slots: usize,
        /// Configured maximum.
        max: usize,
    },

    /// One slot has more candidate types than allowed.
    #[error(
        "cannot specialize {implementation} for {message}: slot ${slot} has {candidates} candidate types, exceeding the maximum of {max}"
    )]
    TooManyCandidates {
        /// The open implementation.
        implementation: TypeKey,
        /// The open message type it handles.
        message: TypeKey,
        /// Offending slot.
        slot: usize,
        /// Candidates found for that slot.
        candidates: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The Cartesian product of candidates is larger than allowed.
    #[error(
        "cannot specialize {implementation} for {message}: the number of specializations exceeds the maximum of {max}"
    )]
    ProductTooLarge {
        /// The open implementation.
        implementation: TypeKey,
        /// The open message type it handles.
        message: TypeKey,
        /// Configured maximum.
        max: usize,
    },

    /// The build did not finish within the registration timeout.
    #[error("handler registration timed out after {0:?}")]
    TimedOut(Duration),

    /// The build was cancelled by its caller.
    #[error("handler registration was cancelled")]
    Cancelled,
}

/// Errors local to a single `send` or `dispatch` call.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No handler is registered for the signature.
    #[error("no handler registered for {0}")]
    NoHandler(MessageSignature),

    /// The service locator could not provide a registered implementation.
    #[error("service locator cannot provide {implementation} for {signature}")]
    Unresolved {
        /// Implementation the registry selected.
        implementation: TypeKey,
        /// Signature being dispatched.
        signature: MessageSignature,
    },

    /// A handler or behavior failed.
    #[error(transparent)]
    Handler(BoxError),
}

/// Errors local to a single `publish` call.
#[derive(Error, Debug)]
pub enum PublishError {
    /// No handler is registered and the configuration requires one.
    #[error("no handler registered for notification {0}")]
    NoHandlers(TypeKey),

    /// The service locator could not provide a registered implementation.
    #[error("service locator cannot provide {implementation} for notification {notification}")]
    Unresolved {
        /// Implementation the registry selected.
        implementation: TypeKey,
        /// Notification being published.
        notification: TypeKey,
    },

    /// A single handler failed.
    #[error(transparent)]
    Handler(BoxError),

    /// Several handlers failed during a concurrent publish.
    #[error("{} notification handlers failed", .0.len())]
    Aggregate(Vec<BoxError>),
}

impl PublishError {
    /// Every handler failure carried by this error.
    pub fn failures(&self) -> Vec<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            PublishError::Handler(error) => vec![&**error],
            PublishError::Aggregate(errors) => errors.iter().map(|error| &**error).collect(),
            _ => Vec::new(),
        }
    }
}

/// Returned by handlers and behaviors that stop because their token fired.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("operation was cancelled")]
pub struct Cancelled;

impl From<BoxError> for DispatchError {
    fn from(err: BoxError) -> Self {
        DispatchError::Handler(err)
    }
}

impl From<BoxError> for PublishError {
    fn from(err: BoxError) -> Self {
        PublishError::Handler(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_is_transparent() {
        let error = DispatchError::from(BoxError::from("boom"));
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn test_aggregate_lists_failures() {
        let error = PublishError::Aggregate(vec!["a".into(), "b".into()]);
        assert_eq!(error.to_string(), "2 notification handlers failed");
        let messages: Vec<String> = error.failures().iter().map(|e| e.to_string()).collect();
        assert_eq!(messages, vec!["a", "b"]);
    }

    #[test]
    fn test_guard_breach_names_offender() {
        let error = RegistrationError::ProductTooLarge {
            implementation: TypeKey::generic("app::Greeter", [TypeKey::Slot(0)]),
            message: TypeKey::generic("app::Envelope", [TypeKey::Slot(0)]),
            max: 4,
        };
        let message = error.to_string();
        assert!(message.contains("app::Greeter<$0>"));
        assert!(message.contains("app::Envelope<$0>"));
        assert!(message.contains("maximum of 4"));
    }

    #[test]
    fn test_umbrella_conversion() {
        let error: CourierError = RegistrationError::NoUnits.into();
        assert!(matches!(
            error,
            CourierError::Registration(RegistrationError::NoUnits)
        ));
    }
}

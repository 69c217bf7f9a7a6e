//! Testing utilities for Courier.
//!
//! Ready-made behaviors and handlers that write to a shared [`EventLog`], so
//! tests can assert on the order in which a pipeline or a publish ran.
//!
//! # Example
//!
//! ```rust,ignore
//! let log = EventLog::new();
//! let services = ServiceCollection::new()
//!     .add_behavior::<GetUser, _>({ let log = log.clone(); move || RecordingBehavior::<10>::new(log.clone()) })
//!     .add_behavior::<GetUser, _>({ let log = log.clone(); move || RecordingBehavior::<1>::new(log.clone()) });
//!
//! mediator.send(GetUser(7)).await?;
//! assert_eq!(log.entries(), ["b10", "b1", "a1", "a10"]);
//! ```

use courier_core::{
    BoxError, CancellationToken, Command, CommandHandler, Described, Next, Notification,
    NotificationHandler, PipelineBehavior, Request, TypeKey,
};
use std::sync::{Arc, Mutex, PoisonError};

/// A shared, append-only list of strings.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry`.
    pub fn push(&self, entry: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    /// Snapshot of every entry so far.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing was logged.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// An open behavior that logs `b{ID}` before and `a{ID}` after the inner chain.
#[derive(Debug, Clone)]
pub struct RecordingBehavior<const ID: i32> {
    log: EventLog,
}

impl<const ID: i32> RecordingBehavior<ID> {
    /// A behavior writing to `log`.
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl<const ID: i32> Described for RecordingBehavior<ID> {
    fn type_key() -> TypeKey {
        TypeKey::generic(
            concat!(module_path!(), "::RecordingBehavior"),
            [TypeKey::named(ID.to_string())],
        )
    }
}

impl<R: Request, const ID: i32> PipelineBehavior<R> for RecordingBehavior<ID> {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        cancel: CancellationToken,
    ) -> Result<R::Response, BoxError> {
        self.log.push(format!("b{ID}"));
        let result = next.run(cancel).await;
        self.log.push(format!("a{ID}"));
        result
    }
}

/// A notification handler that logs `n{ID}` for every notification.
#[derive(Debug, Clone)]
pub struct RecordingNotificationHandler<const ID: i32> {
    log: EventLog,
}

impl<const ID: i32> RecordingNotificationHandler<ID> {
    /// A handler writing to `log`.
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl<const ID: i32> Described for RecordingNotificationHandler<ID> {
    fn type_key() -> TypeKey {
        TypeKey::generic(
            concat!(module_path!(), "::RecordingNotificationHandler"),
            [TypeKey::named(ID.to_string())],
        )
    }
}

impl<N: Notification, const ID: i32> NotificationHandler<N> for RecordingNotificationHandler<ID> {
    async fn handle(&self, _notification: &N, _cancel: CancellationToken) -> Result<(), BoxError> {
        self.log.push(format!("n{ID}"));
        Ok(())
    }
}

/// A handler that always fails with `message`.
#[derive(Debug, Clone, Copy)]
pub struct FailingHandler {
    message: &'static str,
}

impl FailingHandler {
    /// A handler failing with `message`.
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

impl Described for FailingHandler {
    fn type_key() -> TypeKey {
        TypeKey::named(concat!(module_path!(), "::FailingHandler"))
    }
}

impl<N: Notification> NotificationHandler<N> for FailingHandler {
    async fn handle(&self, _notification: &N, _cancel: CancellationToken) -> Result<(), BoxError> {
        Err(self.message.into())
    }
}

impl<C: Command> CommandHandler<C> for FailingHandler {
    async fn handle(&self, _command: &C, _cancel: CancellationToken) -> Result<(), BoxError> {
        Err(self.message.into())
    }
}

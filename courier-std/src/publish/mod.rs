//! # Notification Publishing
//!
//! How the handlers of one notification are run.
//!
//! - [`SequentialPublisher`]: one at a time, stop at the first failure
//! - [`ConcurrentPublisher`]: all at once, report every failure
//!
//! Hosts pick one through [`PublishStrategy`] or plug their own
//! [`NotificationPublisher`].

pub(crate) mod concurrent;
pub(crate) mod sequential;
pub(crate) mod traits;

use std::sync::Arc;

pub use concurrent::ConcurrentPublisher;
pub use sequential::SequentialPublisher;
pub use traits::{DynNotificationPublisher, HandlerExecutor, NotificationPublisher};

/// Built-in notification strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishStrategy {
    /// Run handlers one at a time; the first failure aborts the rest.
    #[default]
    Sequential,
    /// Run all handlers concurrently and collect every failure.
    Concurrent,
}

impl PublishStrategy {
    /// The publisher implementing this strategy.
    pub fn publisher(self) -> Arc<dyn DynNotificationPublisher> {
        match self {
            PublishStrategy::Sequential => Arc::new(SequentialPublisher),
            PublishStrategy::Concurrent => Arc::new(ConcurrentPublisher),
        }
    }
}

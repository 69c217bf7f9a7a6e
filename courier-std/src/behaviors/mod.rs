//! Standard pipeline behaviors.
//!
//! Every behavior here is open: one blanket implementation serves every
//! request type. Register them through
//! [`Configuration::add_open_behavior`](crate::config::Configuration::add_open_behavior)
//! and supply instances through the locator.

mod logging;
mod retry;
mod timeout;

pub use logging::LoggingBehavior;
pub use retry::RetryBehavior;
pub use timeout::{TimeoutBehavior, TimeoutElapsed};

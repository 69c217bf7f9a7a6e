//! # courier - In-Process Mediator
//!
//! `courier` routes requests, commands and notifications to handlers that are
//! discovered up front and frozen into a [`Registry`]. Requests run through an
//! ordered chain of pipeline behaviors; notifications fan out to every
//! observer through a sequential or concurrent publisher.
//!
//! Open generic implementations (`Validate<T>` handling `Check<T>`) are
//! declared with slots and closed over every qualifying type at build time,
//! under explicit guards and an optional timeout.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! #[derive(Described, Request)]
//! #[request(response = String)]
//! struct Greet(String);
//!
//! #[derive(Described)]
//! struct GreetHandler;
//!
//! impl RequestHandler<Greet> for GreetHandler {
//!     async fn handle(
//!         &self,
//!         request: &Greet,
//!         _cancel: CancellationToken,
//!     ) -> Result<String, BoxError> {
//!         Ok(format!("hello, {}", request.0))
//!     }
//! }
//!
//! let unit = Unit::new("app")
//!     .with(TypeDef::request::<Greet>())
//!     .with(TypeDef::request_handler::<GreetHandler, Greet>());
//! let config = Configuration::new()
//!     .unit(unit)
//!     .add_open_behavior::<LoggingBehavior>(0);
//! let services = ServiceCollection::new()
//!     .add_request_handler::<Greet, _>(|| GreetHandler)
//!     .add_behavior::<Greet, _>(|| LoggingBehavior);
//!
//! let mediator = Mediator::build(&config, services)?;
//! assert_eq!(mediator.send(Greet("ann".into())).await?, "hello, ann");
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Identity
pub use courier_core::{Described, MessageSignature, ShapeInstance, ShapeKind, Slot, TypeKey};

// Messages
pub use courier_core::{Command, Notification, Request};

// Handlers
pub use courier_core::{
    CommandHandler, DynCommandHandler, DynNotificationHandler, DynRequestHandler,
    NotificationHandler, RequestHandler,
};

// Behaviors
pub use courier_core::{DynPipelineBehavior, Next, PipelineBehavior};

// Dispatch
pub use courier_core::{CancellationToken, Publisher, Sender, ServiceLocator};

// Errors
pub use courier_core::{
    BoxError, Cancelled, CourierError, DispatchError, PublishError, RegistrationError,
};

pub use courier_std::{
    catalog::{Catalog, Implementation},
    config::{BehaviorRegistration, Configuration, TypeFilter},
    mediator::Mediator,
    registry::{BehaviorDescriptor, HandlerDescriptor, Registry, RequestEntry},
    services::{Lifetime, ServiceCollection},
    specialize::{BuildBudget, Limits, Specialization, Specializer},
    unit::{MessageDecl, TypeDef, Unit},
};

#[cfg(feature = "inventory")]
pub use courier_std::unit::UnitEntry;

/// Notification publishing strategies.
pub mod publish {
    pub use courier_std::publish::{
        ConcurrentPublisher, DynNotificationPublisher, HandlerExecutor, NotificationPublisher,
        PublishStrategy, SequentialPublisher,
    };
}

/// Standard pipeline behaviors.
pub mod behaviors {
    pub use courier_std::behaviors::{
        LoggingBehavior, RetryBehavior, TimeoutBehavior, TimeoutElapsed,
    };
}

/// Testing utilities.
pub mod testing {
    pub use courier_std::testing::{
        EventLog, FailingHandler, RecordingBehavior, RecordingNotificationHandler,
    };
}

/// Prelude module - common imports for Courier.
///
/// # Usage
///
/// ```rust,ignore
/// use courier::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoxError, CancellationToken, Command, CommandHandler, Configuration, Described,
        DispatchError, Mediator, Next, Notification, NotificationHandler, PipelineBehavior,
        PublishError, Publisher, Request, RequestHandler, Sender, ServiceCollection, TypeDef,
        TypeKey, Unit,
        behaviors::LoggingBehavior,
        publish::PublishStrategy,
    };
}

#[cfg(feature = "macros")]
pub use courier_macros::{Command, Described, Notification, Request};

#[cfg(feature = "inventory")]
pub use inventory;

#![allow(dead_code)]

use courier::{
    BoxError, CancellationToken, Command, CommandHandler, Described, DynCommandHandler,
    DynNotificationHandler, DynPipelineBehavior, DynRequestHandler, Notification,
    Request, RequestHandler, ServiceCollection, ServiceLocator, TypeDef,
    TypeKey,
    behaviors::LoggingBehavior,
    testing::{EventLog, RecordingBehavior},
};
use std::{marker::PhantomData, sync::Arc};

// ============================================================================
// Marker capabilities
// ============================================================================

/// Types whose changes are audited.
pub trait Audited {}

/// Types a `Validate<T>` handler can check.
pub trait Checked {}

pub fn audited() -> TypeKey {
    TypeKey::of_trait::<dyn Audited>()
}

pub fn checked() -> TypeKey {
    TypeKey::of_trait::<dyn Checked>()
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Described, Debug, Clone, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
}

#[derive(Described, Request, Debug)]
#[request(response = User)]
pub struct GetUser(pub u64);

#[derive(Described, Request, Debug)]
#[request(response = String)]
pub struct GetName(pub u64);

#[derive(Described, Command, Debug)]
pub struct DeleteUser(pub u64);

#[derive(Described, Notification, Debug)]
pub struct UserCreated(pub u64);

#[derive(Described, Notification, Debug)]
pub struct UserDeleted(pub u64);

/// An open request: `Check<T>` asks whether `T` passes validation.
#[derive(Described, Request)]
#[request(response = bool)]
pub struct Check<T>(pub PhantomData<fn() -> T>);

impl<T> Check<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

#[derive(Described)]
pub struct Alpha;
#[derive(Described)]
pub struct Beta;
#[derive(Described)]
pub struct Gamma;
#[derive(Described)]
pub struct Delta;
#[derive(Described)]
pub struct Epsilon;

// ============================================================================
// Handlers
// ============================================================================

#[derive(Described, Clone)]
pub struct GetUserHandler {
    pub log: EventLog,
}

impl RequestHandler<GetUser> for GetUserHandler {
    async fn handle(
        &self,
        request: &GetUser,
        _cancel: CancellationToken,
    ) -> Result<User, BoxError> {
        self.log.push("handler");
        Ok(User {
            id: request.0,
            name: format!("user-{}", request.0),
        })
    }
}

#[derive(Described, Clone, Copy)]
pub struct GetNameHandler;

impl RequestHandler<GetName> for GetNameHandler {
    async fn handle(
        &self,
        request: &GetName,
        _cancel: CancellationToken,
    ) -> Result<String, BoxError> {
        Ok(format!("name-{}", request.0))
    }
}

#[derive(Described, Clone)]
pub struct DeleteUserHandler {
    pub log: EventLog,
}

impl CommandHandler<DeleteUser> for DeleteUserHandler {
    async fn handle(
        &self,
        command: &DeleteUser,
        _cancel: CancellationToken,
    ) -> Result<(), BoxError> {
        self.log.push(format!("deleted {}", command.0));
        Ok(())
    }
}

/// Validates any `T`; only closed over checked types.
#[derive(Described)]
pub struct Validate<T>(pub PhantomData<fn() -> T>);

impl<T> Validate<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Described + Send + Sync> RequestHandler<Check<T>> for Validate<T> {
    async fn handle(
        &self,
        _request: &Check<T>,
        _cancel: CancellationToken,
    ) -> Result<bool, BoxError> {
        Ok(true)
    }
}

// ============================================================================
// Declarations
// ============================================================================

pub fn user_types() -> Vec<TypeDef> {
    vec![
        TypeDef::of::<User>().capability(audited()),
        TypeDef::request::<GetUser>(),
        TypeDef::request::<GetName>(),
        TypeDef::command::<DeleteUser>(),
        TypeDef::notification::<UserCreated>().capability(audited()),
        TypeDef::notification::<UserDeleted>(),
        TypeDef::request_handler::<GetUserHandler, GetUser>(),
        TypeDef::request_handler::<GetNameHandler, GetName>(),
        TypeDef::command_handler::<DeleteUserHandler, DeleteUser>(),
    ]
}

pub fn services(log: &EventLog) -> ServiceCollection {
    let handler_log = log.clone();
    let command_log = log.clone();
    ServiceCollection::new()
        .add_request_handler::<GetUser, _>(move || GetUserHandler {
            log: handler_log.clone(),
        })
        .add_request_handler::<GetName, _>(|| GetNameHandler)
        .add_command_handler::<DeleteUser, _>(move || DeleteUserHandler {
            log: command_log.clone(),
        })
}

// ============================================================================
// Locators
// ============================================================================

/// Resolves handlers from an inner collection and serves the open
/// behaviors `LoggingBehavior` and `RecordingBehavior<0>` for every request,
/// without per-request registrations.
pub struct OpenBehaviorLocator {
    pub inner: ServiceCollection,
    pub log: EventLog,
}

impl ServiceLocator for OpenBehaviorLocator {
    fn request_handler<R: Request>(
        &self,
        implementation: &TypeKey,
    ) -> Option<Arc<dyn DynRequestHandler<R>>> {
        self.inner.request_handler(implementation)
    }

    fn command_handler<C: Command>(
        &self,
        implementation: &TypeKey,
    ) -> Option<Arc<dyn DynCommandHandler<C>>> {
        self.inner.command_handler(implementation)
    }

    fn notification_handler<N: Notification>(
        &self,
        implementation: &TypeKey,
    ) -> Option<Arc<dyn DynNotificationHandler<N>>> {
        self.inner.notification_handler(implementation)
    }

    fn behavior<R: Request>(
        &self,
        implementation: &TypeKey,
    ) -> Option<Arc<dyn DynPipelineBehavior<R>>> {
        if *implementation == LoggingBehavior::type_key() {
            Some(Arc::new(LoggingBehavior))
        } else if *implementation == RecordingBehavior::<0>::type_key() {
            Some(Arc::new(RecordingBehavior::<0>::new(self.log.clone())))
        } else {
            self.inner.behavior(implementation)
        }
    }
}

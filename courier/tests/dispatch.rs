//! Request and command dispatch through a built mediator.

mod common;

use common::{
    DeleteUser, DeleteUserHandler, GetName, GetUser, GetUserHandler, User, services, user_types,
};
use courier::{
    BoxError, CancellationToken, Configuration, Described, DispatchError, Mediator,
    MessageSignature, RequestHandler, Sender, ServiceCollection, ShapeInstance, TypeDef, TypeKey,
    Unit, testing::EventLog,
};
use futures::future::join_all;
use std::sync::Arc;

fn app_unit() -> Unit {
    user_types()
        .into_iter()
        .fold(Unit::new("app"), |unit, def| unit.with(def))
}

#[tokio::test]
async fn test_send_request() {
    let log = EventLog::new();
    let config = Configuration::new().unit(app_unit());
    let mediator = Mediator::build(&config, services(&log)).unwrap();

    let user = mediator.send(GetUser(7)).await.unwrap();
    assert_eq!(
        user,
        User {
            id: 7,
            name: "user-7".into(),
        }
    );
    assert_eq!(mediator.send(GetName(3)).await.unwrap(), "name-3");
    assert_eq!(log.entries(), ["handler"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sends_share_one_mediator() {
    let log = EventLog::new();
    let config = Configuration::new().unit(app_unit());
    let mediator = Arc::new(Mediator::build(&config, services(&log)).unwrap());

    let tasks = (0..64).map(|id| {
        let mediator = Arc::clone(&mediator);
        tokio::spawn(async move { mediator.send(GetUser(id)).await })
    });
    for (id, result) in join_all(tasks).await.into_iter().enumerate() {
        let user = result.unwrap().unwrap();
        assert_eq!(user.id, id as u64);
        assert_eq!(user.name, format!("user-{id}"));
    }
    assert_eq!(log.len(), 64);
    assert!(log.entries().iter().all(|entry| entry == "handler"));
}

#[tokio::test]
async fn test_dispatch_command() {
    let log = EventLog::new();
    let config = Configuration::new().unit(app_unit());
    let mediator = Mediator::build(&config, services(&log)).unwrap();

    mediator.dispatch(DeleteUser(4)).await.unwrap();
    assert_eq!(log.entries(), ["deleted 4"]);
}

#[tokio::test]
async fn test_signature_must_match_response() {
    // The handler is declared for `GetUser -> String`, so a `GetUser -> User`
    // send finds nothing.
    let unit = Unit::new("app").with(
        TypeDef::of::<GetUserHandler>().implements(ShapeInstance::request::<GetUser, String>()),
    );
    let config = Configuration::new().unit(unit);
    let mediator = Mediator::build(&config, ServiceCollection::new()).unwrap();

    let wrong = MessageSignature::Request {
        request: GetUser::type_key(),
        response: String::type_key(),
    };
    assert!(mediator.registry().request(&wrong).is_some());

    let error = mediator.send(GetUser(1)).await.unwrap_err();
    match error {
        DispatchError::NoHandler(signature) => {
            assert_eq!(signature, MessageSignature::request::<GetUser>());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unregistered_command() {
    let config = Configuration::new().unit(Unit::new("empty"));
    let mediator = Mediator::build(&config, ServiceCollection::new()).unwrap();
    let error = mediator.dispatch(DeleteUser(1)).await.unwrap_err();
    assert!(matches!(error, DispatchError::NoHandler(_)));
}

#[tokio::test]
async fn test_locator_without_instance() {
    let config = Configuration::new().unit(app_unit());
    let mediator = Mediator::build(&config, ServiceCollection::new()).unwrap();

    let error = mediator.send(GetUser(1)).await.unwrap_err();
    match error {
        DispatchError::Unresolved { implementation, .. } => {
            assert_eq!(implementation, GetUserHandler::type_key());
        }
        other => panic!("unexpected error: {other}"),
    }

    let error = mediator.dispatch(DeleteUser(1)).await.unwrap_err();
    assert!(matches!(
        error,
        DispatchError::Unresolved { implementation, .. }
            if implementation == DeleteUserHandler::type_key()
    ));
}

#[derive(Described)]
struct BaseUserHandler;

#[derive(Described)]
struct InheritingUserHandler;

#[derive(Described)]
struct SecondUserHandler;

struct Fixed(&'static str);

impl RequestHandler<GetUser> for Fixed {
    async fn handle(
        &self,
        request: &GetUser,
        _cancel: CancellationToken,
    ) -> Result<User, BoxError> {
        Ok(User {
            id: request.0,
            name: self.0.to_string(),
        })
    }
}

#[tokio::test]
async fn test_direct_handler_beats_inherited() {
    // The inheriting handler is scanned first but only gets the shape
    // through its base, so the direct declaration wins.
    let unit = Unit::new("app")
        .with(TypeDef::request_handler::<BaseUserHandler, GetUser>().mark_abstract())
        .with(TypeDef::of::<InheritingUserHandler>().extends(BaseUserHandler::type_key()))
        .with(TypeDef::request_handler::<SecondUserHandler, GetUser>());
    let config = Configuration::new().unit(unit);
    let mediator = Mediator::build(&config, keyed_services()).unwrap();
    let entry = mediator
        .registry()
        .request(&MessageSignature::request::<GetUser>())
        .unwrap();
    let implementation = &entry.handler().implementation;
    assert_eq!(*implementation, SecondUserHandler::type_key());
    assert_eq!(mediator.send(GetUser(2)).await.unwrap().name, "second");
}

#[tokio::test]
async fn test_first_direct_handler_wins() {
    let unit = Unit::new("app")
        .with(TypeDef::request_handler::<SecondUserHandler, GetUser>())
        .with(TypeDef::request_handler::<InheritingUserHandler, GetUser>());
    let config = Configuration::new().unit(unit);
    let mediator = Mediator::build(&config, keyed_services()).unwrap();
    assert_eq!(mediator.send(GetUser(2)).await.unwrap().name, "second");
}

fn keyed_services() -> ServiceCollection {
    ServiceCollection::new()
        .add_request_handler::<GetUser, _>(|| InheritingUserHandler)
        .add_request_handler::<GetUser, _>(|| SecondUserHandler)
}

impl RequestHandler<GetUser> for InheritingUserHandler {
    async fn handle(&self, request: &GetUser, cancel: CancellationToken) -> Result<User, BoxError> {
        Fixed("inheriting").handle(request, cancel).await
    }
}

impl RequestHandler<GetUser> for SecondUserHandler {
    async fn handle(&self, request: &GetUser, cancel: CancellationToken) -> Result<User, BoxError> {
        Fixed("second").handle(request, cancel).await
    }
}

#[derive(Described)]
#[described(path = "app::Renamed")]
struct Renamed;

#[test]
fn test_type_keys_follow_module_path() {
    assert_eq!(
        GetUser::type_key(),
        TypeKey::named(concat!(module_path!(), "::common::GetUser"))
    );
    assert_eq!(Renamed::type_key(), TypeKey::named("app::Renamed"));
    assert_eq!(
        common::Check::<common::Alpha>::type_key().args(),
        [common::Alpha::type_key()]
    );
}

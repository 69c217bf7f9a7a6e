//! Units assembled from declarations submitted across the binary.
#![cfg(feature = "inventory")]

mod common;

use common::{GetName, GetNameHandler};
use courier::{
    Configuration, Mediator, Sender, ServiceCollection, TypeDef, Unit, UnitEntry, inventory,
};

fn get_name() -> TypeDef {
    TypeDef::request::<GetName>()
}

fn get_name_handler() -> TypeDef {
    TypeDef::request_handler::<GetNameHandler, GetName>()
}

inventory::submit! { UnitEntry::new("collected", get_name) }
inventory::submit! { UnitEntry::new("collected", get_name_handler) }

#[tokio::test]
async fn test_collected_unit() {
    let unit = Unit::collected("collected");
    assert_eq!(unit.types().len(), 2);

    let config = Configuration::new().unit(unit);
    let services = ServiceCollection::new().add_request_handler::<GetName, _>(|| GetNameHandler);
    let mediator = Mediator::build(&config, services).unwrap();
    assert_eq!(mediator.send(GetName(9)).await.unwrap(), "name-9");
}

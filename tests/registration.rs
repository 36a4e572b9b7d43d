mod common;

use common::{book_definition, book_service};
use crud_sdk::{resolve_name, AppError, Capability, ConfigError, Invocation, Reply, ServiceDefinition, ServiceRegistry};
use std::future::{ready, Ready};

fn noop(_: Invocation) -> Ready<Result<Reply, AppError>> {
    ready(Ok(Reply::NoContent))
}

#[test]
fn declared_names_resolve_to_the_same_service() {
    for declared in ["IBookAppService", "BookAppService", "BookService", "Book", "book"] {
        assert_eq!(resolve_name(declared), "book", "{declared}");
        assert_eq!(resolve_name(&resolve_name(declared)), "book");
    }
}

#[test]
fn two_services_resolving_to_one_name_fail_the_build() {
    let err = ServiceRegistry::new()
        .register(book_definition(book_service().0))
        .register(ServiceDefinition::new("BookService").custom_method("GetFeatured", false, noop))
        .build()
        .err()
        .expect("duplicate service names must not build");
    assert_eq!(
        err,
        ConfigError::DuplicateService {
            name: "book".into(),
            first: "IBookAppService".into(),
            second: "BookService".into(),
        }
    );
}

#[test]
fn two_methods_on_one_route_are_a_registration_conflict() {
    let definition = book_definition(book_service().0)
        .custom_method("GetItems", false, noop)
        .custom_method("FindItems", false, noop);
    let err = ServiceRegistry::new().register(definition).build().err().expect("conflict");
    assert_eq!(
        err,
        ConfigError::RegistrationConflict {
            verb: "GET".into(),
            path: "/book/items".into(),
            first: "book.getItems".into(),
            second: "book.findItems".into(),
        }
    );
}

#[test]
fn same_segment_under_different_verbs_is_fine() {
    let definition = ServiceDefinition::new("IBookAppService")
        .custom_method("GetCover", true, noop)
        .custom_method("UpdateCover", true, noop)
        .custom_method("DeleteCover", true, noop);
    let app = ServiceRegistry::new().register(definition).build().unwrap();
    assert_eq!(app.route_table.len(), 3);
}

#[test]
fn custom_method_shadowing_a_crud_method_is_rejected() {
    let definition = book_definition(book_service().0).custom_method("CreateAsync", false, noop);
    let err = ServiceRegistry::new().register(definition).build().err().expect("duplicate");
    assert_eq!(
        err,
        ConfigError::DuplicateMethod {
            service: "book".into(),
            method: "create".into(),
        }
    );
}

#[test]
fn unusable_service_names_are_rejected() {
    let err = ServiceRegistry::new()
        .register(ServiceDefinition::new("  "))
        .build()
        .err()
        .expect("invalid");
    assert!(matches!(err, ConfigError::InvalidServiceName(_)));
}

#[test]
fn a_service_with_no_methods_builds_with_no_routes() {
    let app = ServiceRegistry::new()
        .register(ServiceDefinition::new("IEmptyAppService"))
        .register(ServiceDefinition::crud(book_service().0, &[Capability::Get]))
        .build()
        .unwrap();
    assert_eq!(app.route_table.len(), 1);
    assert_eq!(app.descriptors[0].service_name, "empty");
    assert!(app.descriptors[0].methods.is_empty());
}

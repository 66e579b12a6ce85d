use ferrous_inject::{DiError, Injectable, Injector, ModuleRegistry, ModuleSpec};
use std::sync::Arc;

fn no_deps() -> Vec<String> {
    Vec::new()
}

fn registry_with_dep() -> ModuleRegistry {
    let registry = ModuleRegistry::new();
    registry.define("base", no_deps()).value("dep", 3u8);
    registry
}

#[test]
fn test_bare_function_rejected_in_strict_mode() {
    let registry = registry_with_dep();
    registry.define("app", ["base"]).factory(
        "svc",
        Injectable::from_source("function (dep) {}", |args| Ok(*args.get::<u8>(0)? + 1)),
    );

    let injector = Injector::new(&registry, ["app"], true).unwrap();
    match injector.get("svc") {
        Err(DiError::StrictModeViolation { name }) => assert_eq!(name, "svc"),
        other => panic!("expected strict-mode failure, got {:?}", other.map(|_| ())),
    }
    let err = injector.get("svc").unwrap_err();
    assert_eq!(
        err.to_string(),
        "[$injector:strictdi] svc is not using explicit annotation and cannot be invoked in strict mode"
    );
}

#[test]
fn test_array_form_accepted_in_strict_mode() {
    let registry = registry_with_dep();
    registry.define("app", ["base"]).factory(
        "svc",
        Injectable::annotated(["dep"], |args| Ok(*args.get::<u8>(0)? + 1)),
    );

    let injector = Injector::new(&registry, ["app"], true).unwrap();
    assert_eq!(*injector.get_as::<u8>("svc").unwrap(), 4);
}

#[test]
fn test_attached_annotation_accepted_in_strict_mode() {
    let registry = registry_with_dep();
    registry.define("app", ["base"]).factory(
        "svc",
        Injectable::from_source("function (d) {}", |args| Ok(*args.get::<u8>(0)? * 2))
            .with_inject(["dep"]),
    );

    let injector = Injector::new(&registry, ["app"], true).unwrap();
    assert_eq!(*injector.get_as::<u8>("svc").unwrap(), 6);
}

#[test]
fn test_reflection_used_when_not_strict() {
    let registry = registry_with_dep();
    registry.define("app", ["base"]).value("other", 10u8).factory(
        "svc",
        Injectable::from_source("function (dep, /* unused, */ _other_) {}", |args| {
            Ok(*args.named::<u8>("dep")? + *args.named::<u8>("other")?)
        }),
    );

    let injector = Injector::new(&registry, ["app"], false).unwrap();
    assert!(!injector.strict_di());
    assert_eq!(*injector.get_as::<u8>("svc").unwrap(), 13);
}

#[test]
fn test_strict_config_block_fails_module_load() {
    let registry = ModuleRegistry::new();
    registry
        .define("app", no_deps())
        .config(Injectable::from_source("function ($provide) {}", |_| Ok(())));

    let err = Injector::new(&registry, ["app"], true).unwrap_err();
    assert_eq!(err.code(), "modulerr");
    match err.root_cause() {
        DiError::StrictModeViolation { name } => assert_eq!(name, "function($provide)"),
        other => panic!("unexpected {}", other),
    }
}

#[test]
fn test_injector_annotate_honours_strict_flag() {
    let unit = Injectable::from_source("(a, b) => a", |_| Ok(()));

    let lenient = Injector::new(&ModuleRegistry::new(), Vec::<ModuleSpec>::new(), false).unwrap();
    assert_eq!(lenient.annotate(&unit).unwrap(), ["a", "b"]);

    let strict = Injector::new(&ModuleRegistry::new(), Vec::<ModuleSpec>::new(), true).unwrap();
    assert!(strict.annotate(&unit).is_err());
    assert_eq!(
        strict.annotate(&Injectable::annotated(["x"], |_| Ok(()))).unwrap(),
        ["x"]
    );
}

#[test]
fn test_service_constructor_follows_strict_flag() {
    struct Repo {
        dep: Arc<u8>,
    }

    let registry = registry_with_dep();
    registry.define("app", ["base"]).service(
        "repo",
        Injectable::from_source("function Repo(dep) {}", |args| Ok(Repo { dep: args.get(0)? })),
    );

    let lenient = Injector::new(&registry, ["app"], false).unwrap();
    assert_eq!(*lenient.get_as::<Repo>("repo").unwrap().dep, 3);

    let strict = Injector::new(&registry, ["app"], true).unwrap();
    assert_eq!(strict.get("repo").unwrap_err().code(), "strictdi");
}

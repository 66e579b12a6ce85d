use ferrous_inject::{DiError, Injectable, Injector, ModuleRegistry};
use parking_lot::Mutex;
use std::sync::Arc;

struct Handler(Box<dyn Fn(&mut Vec<&'static str>) + Send + Sync>);

fn no_deps() -> Vec<String> {
    Vec::new()
}

fn wrapping(label: &'static str) -> Injectable {
    Injectable::annotated(["$delegate"], move |args| {
        let inner: Arc<Handler> = args.get(0)?;
        Ok(Handler(Box::new(move |log: &mut Vec<&'static str>| {
            log.push(label);
            (inner.0)(log)
        })))
    })
}

#[test]
fn test_last_registered_decorator_is_outermost() {
    let registry = ModuleRegistry::new();
    registry
        .define("app", no_deps())
        .factory(
            "handler",
            Injectable::annotated(no_deps(), |_| {
                Ok(Handler(Box::new(|log: &mut Vec<&'static str>| log.push("base"))))
            }),
        )
        .decorator("handler", wrapping("D1"))
        .decorator("handler", wrapping("D2"));

    let injector = Injector::new(&registry, ["app"], true).unwrap();
    let handler = injector.get_as::<Handler>("handler").unwrap();
    let mut log = Vec::new();
    (handler.0)(&mut log);
    assert_eq!(log, ["D2", "D1", "base"]);
}

#[test]
fn test_decorator_dependencies_resolve_on_first_use() {
    let registry = ModuleRegistry::new();
    registry
        .define("greetings", no_deps())
        .value("greeting", String::from("hello"))
        .decorator(
            "greeting",
            Injectable::annotated(["$delegate", "punctuation"], |args| {
                let base: Arc<String> = args.get(0)?;
                let mark: Arc<&str> = args.get(1)?;
                Ok(format!("{}{}", base, mark))
            }),
        );
    registry.define("app", ["greetings"]).value("punctuation", "!");

    let injector = Injector::new(&registry, ["app"], true).unwrap();
    assert_eq!(*injector.get_as::<String>("greeting").unwrap(), "hello!");
}

#[test]
fn test_decorators_across_modules_chain_in_load_order() {
    let registry = ModuleRegistry::new();
    registry
        .define("base", no_deps())
        .value("name", String::from("svc"));
    registry.define("first", ["base"]).decorator(
        "name",
        Injectable::annotated(["$delegate"], |args| Ok(format!("{}+first", args.get::<String>(0)?))),
    );
    registry.define("second", ["first"]).decorator(
        "name",
        Injectable::annotated(["$delegate"], |args| Ok(format!("{}+second", args.get::<String>(0)?))),
    );

    let injector = Injector::new(&registry, ["second"], true).unwrap();
    assert_eq!(*injector.get_as::<String>("name").unwrap(), "svc+first+second");
}

#[test]
fn test_decorator_via_provide_in_config_block() {
    let registry = ModuleRegistry::new();
    registry
        .define("app", no_deps())
        .value("count", 1u32)
        .config(Injectable::annotated(["$provide"], |args| {
            let provide: Arc<ferrous_inject::Provide> = args.get(0)?;
            provide.decorator(
                "count",
                Injectable::annotated(["$delegate"], |args| Ok(*args.get::<u32>(0)? * 10)),
            )
        }));

    let injector = Injector::new(&registry, ["app"], true).unwrap();
    assert_eq!(*injector.get_as::<u32>("count").unwrap(), 10);
}

#[test]
fn test_constants_cannot_be_decorated() {
    let registry = ModuleRegistry::new();
    registry
        .define("app", no_deps())
        .constant("limit", 5u8)
        .decorator("limit", Injectable::annotated(["$delegate"], |_| Ok(6u8)));

    let err = Injector::new(&registry, ["app"], true).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        DiError::ConstantCannotBeDecorated { name } if name == "limit"
    ));
}

#[test]
fn test_decorating_unknown_service_fails() {
    let registry = ModuleRegistry::new();
    registry
        .define("app", no_deps())
        .decorator("ghost", Injectable::annotated(["$delegate"], |_| Ok(())));

    let err = Injector::new(&registry, ["app"], true).unwrap_err();
    assert_eq!(err.root_cause().code(), "unpr");
    assert!(err.to_string().ends_with("Unknown provider: ghostProvider"));
}

fn append(suffix: &'static str) -> Injectable {
    Injectable::annotated(["$delegate"], move |args| {
        Ok(format!("{}{}", args.get::<String>(0)?, suffix))
    })
}

#[test]
fn test_decorator_batch_is_all_or_nothing() {
    let registry = ModuleRegistry::new();
    let codes: Arc<Mutex<Vec<&'static str>>> = Arc::default();
    let seen = codes.clone();
    registry
        .define("app", no_deps())
        .value("known", String::from("v"))
        .constant("fixed", String::from("c"))
        .config(Injectable::annotated(["$provide"], move |args| {
            let provide: Arc<ferrous_inject::Provide> = args.get(0)?;
            for target in ["missing", "fixed"] {
                let err = provide
                    .decorators([("known", append("+dec")), (target, append("+x"))])
                    .unwrap_err();
                seen.lock().push(err.code());
            }
            Ok(())
        }));

    let injector = Injector::new(&registry, ["app"], true).unwrap();
    assert_eq!(*codes.lock(), ["unpr", "noconstdec"]);
    assert_eq!(*injector.get_as::<String>("known").unwrap(), "v");
}

#[test]
fn test_decorator_rejects_reserved_names() {
    let registry = ModuleRegistry::new();
    registry
        .define("app", no_deps())
        .decorator("hasOwnProperty", append("+x"));

    let err = Injector::new(&registry, ["app"], true).unwrap_err();
    assert_eq!(err.root_cause().code(), "badname");
}

#[test]
fn test_decorated_value_is_cached() {
    let registry = ModuleRegistry::new();
    registry
        .define("app", no_deps())
        .factory("list", Injectable::annotated(no_deps(), |_| Ok(vec![1u8])))
        .decorator(
            "list",
            Injectable::annotated(["$delegate"], |args| {
                let mut list = args.get::<Vec<u8>>(0)?.as_ref().clone();
                list.push(2);
                Ok(list)
            }),
        );

    let injector = Injector::new(&registry, ["app"], true).unwrap();
    let a = injector.get_as::<Vec<u8>>("list").unwrap();
    let b = injector.get_as::<Vec<u8>>("list").unwrap();
    assert_eq!(*a, [1, 2]);
    assert!(Arc::ptr_eq(&a, &b));
}

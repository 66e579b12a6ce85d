use ferrous_inject::{
    downcast, BlockKind, DiError, Injectable, Injector, ModuleRegistry, ModuleSpec, Provide, Provider,
};
use parking_lot::Mutex;
use std::sync::Arc;

type Log = Arc<Mutex<Vec<String>>>;

fn no_deps() -> Vec<String> {
    Vec::new()
}

fn record(log: &Log, entry: &str) -> Injectable {
    let log = log.clone();
    let entry = entry.to_string();
    Injectable::annotated(no_deps(), move |_| {
        log.lock().push(entry.clone());
        Ok(())
    })
}

#[test]
fn test_modules_load_once_requires_first() {
    let registry = ModuleRegistry::new();
    let log: Log = Arc::default();
    registry.define("a", no_deps()).config(record(&log, "a"));
    registry.define("b", no_deps()).config(record(&log, "b"));
    registry.define("c", ["a", "b"]).config(record(&log, "c"));

    let injector = Injector::new(&registry, ["c", "c"], true).unwrap();
    assert_eq!(*log.lock(), ["a", "b", "c"]);
    assert_eq!(injector.module_names(), ["c", "a", "b"]);
}

#[test]
fn test_diamond_dependencies_are_deduplicated() {
    let registry = ModuleRegistry::new();
    let log: Log = Arc::default();
    registry.define("base", no_deps()).config(record(&log, "base"));
    registry.define("left", ["base"]).config(record(&log, "left"));
    registry.define("right", ["base"]).config(record(&log, "right"));
    registry.define("top", ["left", "right"]).config(record(&log, "top"));

    Injector::new(&registry, ["top"], true).unwrap();
    assert_eq!(*log.lock(), ["base", "left", "right", "top"]);
}

#[test]
fn test_run_blocks_follow_every_config_block() {
    let registry = ModuleRegistry::new();
    let log: Log = Arc::default();
    registry
        .define("a", no_deps())
        .run(record(&log, "run a"))
        .config(record(&log, "config a"));
    registry
        .define("b", ["a"])
        .run(record(&log, "run b"))
        .config(record(&log, "config b"));
    registry
        .define("c", no_deps())
        .config(record(&log, "config c"))
        .run(record(&log, "run c"));

    Injector::new(&registry, ["b", "c"], true).unwrap();
    assert_eq!(
        *log.lock(),
        ["config a", "config b", "config c", "run a", "run b", "run c"]
    );
}

#[test]
fn test_constant_visible_to_later_config_blocks() {
    let registry = ModuleRegistry::new();
    let seen: Log = Arc::default();
    let sink = seen.clone();
    registry
        .define("x", no_deps())
        .factory("lazy", Injectable::annotated(no_deps(), |_| Ok(1u8)))
        .constant("apiUrl", String::from("https://api"));
    registry.define("y", no_deps()).config(Injectable::annotated(
        ["apiUrl", "$injector"],
        move |args| {
            let url: Arc<String> = args.get(0)?;
            let providers: Arc<Injector> = args.get(1)?;
            assert!(providers.has("lazyProvider"));
            assert!(providers.get("lazy").is_err(), "services are not built during config");
            sink.lock().push(url.to_string());
            Ok(())
        },
    ));

    let injector = Injector::new(&registry, ["x", "y"], true).unwrap();
    assert_eq!(*seen.lock(), ["https://api"]);
    assert_eq!(*injector.get_as::<String>("apiUrl").unwrap(), "https://api");
}

#[test]
fn test_late_extension() {
    let registry = ModuleRegistry::new();
    let log: Log = Arc::default();
    registry.define("app", no_deps()).config(record(&log, "app"));
    registry
        .define("lazy", ["app"])
        .factory("svc", Injectable::annotated(no_deps(), |_| Ok("ready")))
        .config(record(&log, "config lazy"))
        .run(record(&log, "run lazy"));

    let injector = Injector::new(&registry, ["app"], true).unwrap();
    assert_eq!(injector.get("svc").unwrap_err().code(), "unpr");

    injector.load_new_modules(["lazy"]).unwrap();
    assert_eq!(*injector.get_as::<&str>("svc").unwrap(), "ready");
    assert_eq!(*log.lock(), ["app", "config lazy", "run lazy"]);
    assert!(injector.modules().contains_key("lazy"));

    injector.load_new_modules(["lazy", "app"]).unwrap();
    assert_eq!(log.lock().len(), 3);
}

#[test]
fn test_load_new_modules_runs_after_whole_batch() {
    let registry = ModuleRegistry::new();
    let log: Log = Arc::default();
    registry
        .define("one", no_deps())
        .config(record(&log, "config one"))
        .run(record(&log, "run one"));
    registry
        .define("two", no_deps())
        .config(record(&log, "config two"))
        .run(record(&log, "run two"));

    let injector = Injector::new(&registry, Vec::<ModuleSpec>::new(), true).unwrap();
    injector.load_new_modules(["one", "two"]).unwrap();
    assert_eq!(*log.lock(), ["config one", "config two", "run one", "run two"]);
}

#[test]
fn test_unknown_module_is_wrapped() {
    let registry = ModuleRegistry::new();
    registry.define("app", ["ghost"]);

    let err = Injector::new(&registry, ["app"], true).unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("[$injector:modulerr] Failed to instantiate module app due to:\n"));
    assert!(text.contains("Failed to instantiate module ghost due to:"));
    assert!(text.contains("Module 'ghost' is not available!"));
    assert_eq!(err.root_cause().code(), "nomod");
}

#[test]
fn test_block_failure_names_the_module() {
    let registry = ModuleRegistry::new();
    registry
        .define("app", no_deps())
        .config(Injectable::annotated(no_deps(), |_| -> Result<(), DiError> {
            Err(DiError::custom("boom"))
        }));

    let err = Injector::new(&registry, ["app"], true).unwrap_err();
    assert_eq!(
        err.to_string(),
        "[$injector:modulerr] Failed to instantiate module app due to:\n[$injector:custom] boom"
    );
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_run_block_failure_names_the_module() {
    let registry = ModuleRegistry::new();
    registry
        .define("app", no_deps())
        .run(Injectable::annotated(["missing"], |_| Ok(())));

    let err = Injector::new(&registry, ["app"], true).unwrap_err();
    match &err {
        DiError::ModuleInstantiation { module, source } => {
            assert_eq!(module, "app");
            assert!(source.to_string().contains("Unknown provider: missingProvider <- missing"));
        }
        other => panic!("expected modulerr, got {}", other),
    }
}

#[test]
fn test_ad_hoc_blocks_and_nested_lists() {
    let registry = ModuleRegistry::new();
    let log: Log = Arc::default();
    registry.define("named", no_deps()).config(record(&log, "named"));

    let sink = log.clone();
    let configure = Injectable::annotated(["$provide"], move |args| {
        let provide: Arc<Provide> = args.get(0)?;
        provide.value("fromBlock", 7u32)?;
        sink.lock().push("block".into());
        let sink = sink.clone();
        Ok(Injectable::annotated(["fromBlock"], move |args| {
            sink.lock().push(format!("run {}", args.get::<u32>(0)?));
            Ok(())
        }))
    });

    let specs = ModuleSpec::List(vec![
        ModuleSpec::from("named"),
        ModuleSpec::from(vec![ModuleSpec::Block(configure)]),
    ]);
    Injector::new(&registry, [specs], true).unwrap();
    assert_eq!(*log.lock(), ["named", "block", "run 7"]);
}

#[test]
fn test_ad_hoc_blocks_always_run() {
    let log: Log = Arc::default();
    let block = record(&log, "tick");
    Injector::new(&ModuleRegistry::new(), [block.clone(), block], true).unwrap();
    assert_eq!(log.lock().len(), 2);
}

#[test]
fn test_on_provider_reaches_registered_provider() {
    #[derive(Default)]
    struct RouterProvider {
        routes: Mutex<Vec<String>>,
    }
    impl Provider for RouterProvider {
        fn recipe(&self) -> Option<Injectable> {
            Some(Injectable::annotated(no_deps(), |args| {
                Ok(args.this::<RouterProvider>()?.routes.lock().clone())
            }))
        }
    }

    let registry = ModuleRegistry::new();
    registry
        .define("routing", no_deps())
        .provider("router", RouterProvider::default());
    registry
        .define("app", ["routing"])
        .on_provider("routerProvider", |object| {
            downcast::<RouterProvider>("routerProvider", object)?
                .routes
                .lock()
                .push("/home".into());
            Ok(())
        });

    let injector = Injector::new(&registry, ["app"], true).unwrap();
    assert_eq!(*injector.get_as::<Vec<String>>("router").unwrap(), ["/home"]);
}

#[test]
fn test_redefinition_resets_blocks() {
    let registry = ModuleRegistry::new();
    registry.define("app", no_deps()).value("old", 1u8);
    registry.define("app", no_deps()).value("new", 2u8);

    let injector = Injector::new(&registry, ["app"], true).unwrap();
    assert!(injector.has("new"));
    assert!(!injector.has("old"));
}

#[test]
fn test_loaded_modules_are_introspectable() {
    let registry = ModuleRegistry::new();
    registry
        .define("core", no_deps())
        .info(serde_json::json!({ "version": "2.1" }))
        .constant("c", 1u8)
        .value("v", 2u8)
        .run(Injectable::annotated(no_deps(), |_| Ok(())));
    registry.define("app", ["core"]);

    let injector = Injector::new(&registry, ["app"], true).unwrap();
    let modules = injector.modules();
    assert_eq!(modules.len(), 2);

    let core = &modules["core"];
    assert_eq!(core.info_value()["version"], "2.1");
    assert_eq!(core.requires(), Vec::<String>::new());
    assert_eq!(
        core.queue_kinds(),
        [BlockKind::Constant, BlockKind::Value, BlockKind::Run]
    );
    assert_eq!(modules["app"].requires(), ["core"]);
}

#[test]
fn test_modules_snapshot_shares_module_handles() {
    let registry = ModuleRegistry::new();
    registry.define("core", no_deps());
    registry.define("extra", no_deps());

    let injector = Injector::new(&registry, ["core"], true).unwrap();
    let before = injector.modules();
    injector.load_new_modules(["extra"]).unwrap();

    assert!(!before.contains_key("extra"));
    assert!(injector.modules().contains_key("extra"));

    registry
        .module("core")
        .unwrap()
        .info(serde_json::json!({ "owner": "platform" }));
    assert_eq!(before["core"].info_value()["owner"], "platform");
}

#[test]
fn test_module_lookup() {
    let registry = ModuleRegistry::new();
    assert!(matches!(registry.module("nope"), Err(DiError::ModuleNotFound { .. })));
    registry.define("zeta", no_deps());
    registry.define("alpha", no_deps());
    assert_eq!(registry.names(), ["alpha", "zeta"]);
    assert!(registry.contains("alpha"));
}

/// Property-based tests for resolution and annotation
///
/// Random acyclic graphs must resolve with every service built exactly once
/// and after all of its dependencies; generated signatures must reflect to
/// the parameter names they were built from.

use ferrous_inject::annotate::reflect_parameters;
use ferrous_inject::{Injectable, Injector, ModuleRegistry};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;

const MAX_NODES: usize = 10;

fn node(i: usize) -> String {
    format!("s{}", i)
}

/// Node `i` depends on every `j < i` whose bit is set in `edges[i]`.
fn dependencies(edges: &[Vec<bool>], i: usize) -> Vec<String> {
    (0..i).filter(|&j| edges[i][j]).map(node).collect()
}

fn graph_registry(edges: &[Vec<bool>], order: &Arc<Mutex<Vec<usize>>>) -> ModuleRegistry {
    let registry = ModuleRegistry::new();
    let module = registry.define("graph", Vec::<String>::new());
    for i in 0..edges.len() {
        let order = order.clone();
        module.factory(
            &node(i),
            Injectable::annotated(dependencies(edges, i), move |_| {
                order.lock().push(i);
                Ok(i)
            }),
        );
    }
    registry
}

proptest! {
    #[test]
    fn every_service_is_built_once_after_its_dependencies(
        edges in prop::collection::vec(prop::collection::vec(any::<bool>(), MAX_NODES), 1..=MAX_NODES),
        start in 0usize..MAX_NODES,
    ) {
        let order = Arc::new(Mutex::new(Vec::new()));
        let registry = graph_registry(&edges, &order);
        let injector = Injector::new(&registry, ["graph"], true).unwrap();

        let n = edges.len();
        let first = start % n;
        injector.get(&node(first)).unwrap();
        for i in (0..n).rev() {
            injector.get(&node(i)).unwrap();
        }

        let order = order.lock().clone();
        prop_assert_eq!(order.len(), n);
        for i in 0..n {
            let built_at = order.iter().position(|&x| x == i).unwrap();
            prop_assert_eq!(order.iter().filter(|&&x| x == i).count(), 1);
            for dep in (0..i).filter(|&j| edges[i][j]) {
                let dep_at = order.iter().position(|&x| x == dep).unwrap();
                prop_assert!(dep_at < built_at, "s{} built before its dependency s{}", i, dep);
            }
        }
    }
}

proptest! {
    #[test]
    fn repeated_gets_return_the_same_instance(
        value in "\\PC{0,40}",
        repeats in 2usize..8,
    ) {
        let registry = ModuleRegistry::new();
        registry.define("app", Vec::<String>::new()).value("v", value.clone());
        let injector = Injector::new(&registry, ["app"], true).unwrap();

        let first = injector.get_as::<String>("v").unwrap();
        prop_assert_eq!(first.as_str(), value.as_str());
        for _ in 0..repeats {
            prop_assert!(Arc::ptr_eq(&first, &injector.get_as::<String>("v").unwrap()));
        }
    }
}

proptest! {
    #[test]
    fn reflection_recovers_generated_parameter_names(
        names in prop::collection::vec("[a-zA-Z$][a-zA-Z0-9$]{0,8}", 0..6),
        commented in any::<bool>(),
    ) {
        let separator = if commented { ", /* skip, me */ " } else { ", " };
        let function = format!("function ({}) {{ return 1; }}", names.join(separator));
        prop_assert_eq!(reflect_parameters(&function), names.clone());

        let arrow = format!("({}) => 1", names.join(separator));
        prop_assert_eq!(reflect_parameters(&arrow), names.clone());

        let escaped: Vec<String> = names.iter().map(|n| format!("_{}_", n)).collect();
        let wrapped = format!("function ({}) {{}}", escaped.join(", "));
        prop_assert_eq!(reflect_parameters(&wrapped), names);
    }
}

proptest! {
    #[test]
    fn unknown_names_never_poison_the_cache(missing in "[a-z]{1,8}") {
        let registry = ModuleRegistry::new();
        let dep = format!("{}Missing", missing);
        registry
            .define("app", Vec::<String>::new())
            .factory("top", Injectable::annotated([dep.clone()], |_| Ok(())));
        registry.define("fix", Vec::<String>::new()).value(&dep, 0u8);
        let injector = Injector::new(&registry, ["app"], true).unwrap();

        let err = injector.get("top").unwrap_err();
        let expected = format!("Unknown provider: {}Provider <- {} <- top", dep, dep);
        prop_assert!(err.to_string().contains(&expected));

        injector.load_new_modules(["fix"]).unwrap();
        prop_assert!(injector.get("top").is_ok());
    }
}

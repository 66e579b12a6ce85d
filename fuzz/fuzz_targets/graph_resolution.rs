#![no_main]

use ferrous_inject::{DiError, Injectable, Injector, ModuleRegistry};
use libfuzzer_sys::fuzz_target;

const MAX_NODES: usize = 16;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // Byte 0 picks the node count, each later byte one edge (from, to).
    // Edges may point anywhere, so cycles and missing nodes both occur.
    let nodes = (data[0] as usize % MAX_NODES) + 1;
    let mut deps: Vec<Vec<String>> = vec![Vec::new(); nodes];
    for byte in &data[1..] {
        let from = (*byte >> 4) as usize % nodes;
        let to = (*byte & 0x0f) as usize;
        deps[from].push(format!("n{}", to));
    }

    let registry = ModuleRegistry::new();
    let module = registry.define("graph", Vec::<String>::new());
    for (i, names) in deps.iter().enumerate() {
        module.factory(&format!("n{}", i), Injectable::annotated(names.clone(), |_| Ok(())));
    }
    let injector = Injector::new(&registry, ["graph"], true).unwrap();

    for i in 0..nodes {
        let name = format!("n{}", i);
        match injector.get(&name) {
            Ok(first) => {
                let again = injector.get(&name).unwrap();
                assert!(std::sync::Arc::ptr_eq(&first, &again));
            }
            Err(DiError::CircularDependency { .. }) | Err(DiError::UnknownProvider { .. }) => {
                // Failures must be repeatable, never turned into a cycle by a stale entry
                let again = injector.get(&name).unwrap_err();
                assert!(matches!(
                    again,
                    DiError::CircularDependency { .. } | DiError::UnknownProvider { .. }
                ));
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
});

use ferrous_inject::{
    downcast, DiError, DiResult, Injectable, Injector, InjectorBuilder, InjectorConfig,
    ModuleRegistry, Provider,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

// ===== Domain Types =====

#[derive(Debug, Clone)]
struct User {
    id: String,
    name: String,
}

struct UserRepository {
    users: HashMap<String, User>,
}

impl UserRepository {
    fn find(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }
}

struct Logger {
    prefix: String,
}

impl Logger {
    fn log(&self, message: &str) {
        println!("{} {}", self.prefix, message);
    }
}

// ===== Providers =====

/// Collects routes during configuration; the router service is the frozen table.
#[derive(Default)]
struct RouterProvider {
    routes: Mutex<Vec<(String, String)>>,
}

impl RouterProvider {
    fn when(&self, path: &str, handler: &str) {
        self.routes.lock().push((path.to_string(), handler.to_string()));
    }
}

struct Router {
    routes: Vec<(String, String)>,
}

impl Router {
    fn handler_for(&self, path: &str) -> Option<&str> {
        self.routes
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, h)| h.as_str())
    }
}

impl Provider for RouterProvider {
    fn recipe(&self) -> Option<Injectable> {
        Some(Injectable::annotated(Vec::<String>::new(), |args| {
            let this: Arc<RouterProvider> = args.this()?;
            let routes = this.routes.lock().clone();
            Ok(Router { routes })
        }))
    }
}

// ===== Modules =====

fn declare_modules(registry: &ModuleRegistry) {
    registry
        .define("core", Vec::<String>::new())
        .constant("appName", "modular-app")
        .factory(
            "logger",
            Injectable::annotated(["appName"], |args| {
                Ok(Logger {
                    prefix: format!("[{}]", args.get::<&str>(0)?),
                })
            }),
        );

    registry
        .define("routing", ["core"])
        .provider("router", RouterProvider::default());

    registry
        .define("users", ["core"])
        .factory(
            "userRepository",
            Injectable::annotated(Vec::<String>::new(), |_| {
                let mut users = HashMap::new();
                for (id, name) in [("1", "Alice"), ("2", "Bob")] {
                    users.insert(id.to_string(), User { id: id.into(), name: name.into() });
                }
                Ok(UserRepository { users })
            }),
        )
        .decorator(
            "logger",
            Injectable::annotated(["$delegate"], |args| {
                let base: Arc<Logger> = args.get(0)?;
                Ok(Logger {
                    prefix: format!("{}[users]", base.prefix),
                })
            }),
        );

    registry
        .define("app", ["routing", "users"])
        .on_provider("routerProvider", |object| {
            let router = downcast::<RouterProvider>("routerProvider", object)?;
            router.when("/users/1", "showUser");
            router.when("/health", "health");
            Ok(())
        })
        .run(Injectable::annotated(["logger", "router"], |args| {
            let logger: Arc<Logger> = args.get(0)?;
            let router: Arc<Router> = args.get(1)?;
            logger.log(&format!("{} routes registered", router.routes.len()));
            Ok(())
        }));

    registry
        .define("admin", ["users"])
        .service(
            "adminReport",
            Injectable::annotated(["userRepository"], |args| {
                let repo: Arc<UserRepository> = args.get(0)?;
                let mut names: Vec<&str> = repo.users.values().map(|u| u.name.as_str()).collect();
                names.sort();
                Ok(names.join(", "))
            }),
        );
}

fn handle(injector: &Injector, path: &str) -> DiResult<String> {
    let router = injector.get_as::<Router>("router")?;
    let logger = injector.get_as::<Logger>("logger")?;
    let handler = router
        .handler_for(path)
        .ok_or_else(|| DiError::custom(format!("no route for {}", path)))?;
    logger.log(&format!("{} -> {}", path, handler));

    match handler {
        "showUser" => {
            let repo = injector.get_as::<UserRepository>("userRepository")?;
            let user = repo
                .find("1")
                .ok_or_else(|| DiError::custom("user 1 missing"))?;
            Ok(format!("user {}: {}", user.id, user.name))
        }
        _ => Ok("ok".to_string()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::from_default_env().add_directive("ferrous_inject=debug".parse()?);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let registry = ModuleRegistry::new();
    declare_modules(&registry);

    let config = InjectorConfig::from_env()?.with_trace_resolution(true);
    let injector = InjectorBuilder::new(&registry)
        .module("app")
        .config(config)
        .strict_di(true)
        .build()?;

    println!("loaded modules: {:?}", injector.module_names());
    for path in ["/users/1", "/health", "/missing"] {
        match handle(&injector, path) {
            Ok(body) => println!("{} => {}", path, body),
            Err(err) => println!("{} => error: {}", path, err),
        }
    }

    // Modules can be added to a running injector.
    injector.load_new_modules(["admin"])?;
    println!("admin report: {}", injector.get_as::<String>("adminReport")?);

    // The registration API is not reachable at run time.
    if let Err(err) = injector.get("$provide") {
        println!("expected failure: {}", err);
    }
    Ok(())
}

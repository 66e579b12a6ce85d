//! # ferrous-inject
//!
//! Name-keyed dependency injection with a configuration phase, a run phase
//! and declarative modules.
//!
//! ## Features
//!
//! - **Two scopes**: providers are configured first, services are built later from their `$get` recipes
//! - **Modules**: named bundles of registrations with dependency edges, loaded once per injector
//! - **Lazy singletons**: every service is constructed at most once, on first request
//! - **Decorators**: wrap an existing service, receiving the previous value as `$delegate`
//! - **Strict mode**: reject callables whose dependencies would have to be inferred from their signature
//! - **Readable failures**: cycles and missing providers report the full dependency chain
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_inject::{Injectable, Injector, ModuleRegistry};
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let registry = ModuleRegistry::new();
//! registry
//!     .define("data", Vec::<String>::new())
//!     .constant("dbUrl", String::from("postgres://localhost"))
//!     .factory("db", Injectable::annotated(["dbUrl"], |args| {
//!         Ok(Database { url: args.get::<String>(0)?.to_string() })
//!     }));
//! registry
//!     .define("users", ["data"])
//!     .service("userService", Injectable::annotated(["db"], |args| {
//!         Ok(UserService { db: args.get(0)? })
//!     }));
//!
//! let injector = Injector::new(&registry, ["users"], true).unwrap();
//! let users = injector.get_as::<UserService>("userService").unwrap();
//! assert_eq!(users.db.url, "postgres://localhost");
//! ```
//!
//! ## Phases
//!
//! Loading a module first walks its `requires`, then applies its
//! registrations and config blocks against the *provider* scope, where each
//! service's provider object is reachable as `"<name>Provider"` and the
//! registration API as `$provide`. Once every module of the batch is
//! configured, run blocks execute against the *instance* scope.
//!
//! ```rust
//! use ferrous_inject::{Injectable, Injector, ModuleRegistry, RecipeProvider};
//! use std::sync::Arc;
//!
//! let registry = ModuleRegistry::new();
//! registry
//!     .define("app", Vec::<String>::new())
//!     .value("greeting", "hello")
//!     .config(Injectable::annotated(["greetingProvider"], |args| {
//!         let _provider: Arc<RecipeProvider> = args.get(0)?;
//!         Ok(())
//!     }))
//!     .run(Injectable::annotated(["greeting"], |args| {
//!         assert_eq!(*args.get::<&str>(0)?, "hello");
//!         Ok(())
//!     }));
//!
//! Injector::new(&registry, ["app"], false).unwrap();
//! ```
//!
//! ## Annotation
//!
//! Dependencies are named explicitly with [`Injectable::annotated`] or
//! [`Injectable::with_inject`], or inferred from a declared signature given
//! to [`Injectable::from_source`]. Inference is refused in strict mode.
//!
//! ```rust
//! use ferrous_inject::{DiError, Injectable, Injector, ModuleRegistry, ModuleSpec};
//!
//! let injector = Injector::new(&ModuleRegistry::new(), Vec::<ModuleSpec>::new(), true).unwrap();
//! let unit = Injectable::from_source("function (a, b) {}", |_| Ok(())).named("sum");
//! assert!(matches!(injector.invoke(&unit, None, None), Err(DiError::StrictModeViolation { .. })));
//! ```

pub mod annotate;
pub mod config;
pub mod error;
pub mod injectable;
pub mod injector;
pub mod key;
pub mod module;
pub mod observer;
pub mod provider;

mod internal;
mod registration;

pub use config::InjectorConfig;
pub use error::{DiError, DiResult};
pub use injectable::{downcast, instance, Args, InjectFn, Injectable, Instance, Locals};
pub use injector::{Injector, InjectorBuilder, InjectorScope};
pub use module::{BlockKind, Module, ModuleRegistry, ModuleSpec};
pub use observer::{MetricsObserver, ResolutionObserver, TracingObserver};
pub use provider::{Provide, Provider, RecipeProvider};

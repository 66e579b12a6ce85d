//! Providers: configuration-time objects that know how to build a service.
//!
//! A provider is any type exposing a `$get` recipe through [`Provider::recipe`]
//! plus whatever configuration methods it wants. Config blocks reach a
//! provider by requesting `"<name>Provider"` and downcasting to its concrete
//! type; the service itself is built lazily from the recipe on first request.

use crate::injectable::Injectable;

mod provide;

pub use provide::Provide;

/// A configuration-time object with a `$get` recipe.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Injectable, Injector, ModuleRegistry, Provider};
/// use parking_lot::Mutex;
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct GreeterProvider {
///     salutation: Mutex<String>,
/// }
///
/// impl GreeterProvider {
///     fn set_salutation(&self, s: &str) {
///         *self.salutation.lock() = s.to_string();
///     }
/// }
///
/// impl Provider for GreeterProvider {
///     fn recipe(&self) -> Option<Injectable> {
///         Some(Injectable::annotated(Vec::<String>::new(), |args| {
///             let this: Arc<GreeterProvider> = args.this()?;
///             let greeting = format!("{}, world", this.salutation.lock());
///             Ok(greeting)
///         }))
///     }
/// }
///
/// let registry = ModuleRegistry::new();
/// registry
///     .define("app", Vec::<String>::new())
///     .provider("greeter", GreeterProvider::default())
///     .config(Injectable::annotated(["greeterProvider"], |args| {
///         args.get::<GreeterProvider>(0)?.set_salutation("Hello");
///         Ok(())
///     }));
///
/// let injector = Injector::new(&registry, ["app"], true).unwrap();
/// let greeting = injector.get_as::<String>("greeter").unwrap();
/// assert_eq!(*greeting, "Hello, world");
/// ```
pub trait Provider: Send + Sync + 'static {
    /// The `$get` recipe, or `None` when this object cannot build anything.
    ///
    /// A missing recipe is reported as
    /// [`DiError::UndefinedProviderGet`](crate::DiError::UndefinedProviderGet)
    /// when the service is first requested, not at registration.
    fn recipe(&self) -> Option<Injectable>;
}

/// Provider backing `factory`, `service` and `value` registrations.
#[derive(Clone, Debug)]
pub struct RecipeProvider {
    recipe: Injectable,
}

impl RecipeProvider {
    pub fn new(recipe: Injectable) -> Self {
        Self { recipe }
    }
}

impl Provider for RecipeProvider {
    fn recipe(&self) -> Option<Injectable> {
        Some(self.recipe.clone())
    }
}

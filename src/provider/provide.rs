//! The `$provide` registration API.

use std::any::{type_name, Any};
use std::sync::Arc;

use tracing::debug;

use crate::error::{DiError, DiResult};
use crate::injectable::{Injectable, Instance};
use crate::injector::Injector;
use crate::key::{provider_key, validate_service_name, INJECTOR};
use crate::provider::{Provider, RecipeProvider};
use crate::registration::ProviderRecord;

/// Registration API handed to config blocks as `$provide`.
///
/// Only reachable through the provider scope: requesting `$provide` from the
/// instance injector fails with `UnknownProvider`.
///
/// ```rust
/// use ferrous_inject::{Injectable, Injector, ModuleRegistry, Provide};
/// use std::sync::Arc;
///
/// let registry = ModuleRegistry::new();
/// let injector = Injector::new(&registry, [Injectable::annotated(["$provide"], |args| {
///     let provide: Arc<Provide> = args.get(0)?;
///     provide.value("answer", 42u32)?;
///     Ok(())
/// })], false).unwrap();
///
/// assert_eq!(*injector.get_as::<u32>("answer").unwrap(), 42);
/// ```
#[derive(Clone)]
pub struct Provide {
    injector: Injector,
}

impl Provide {
    pub(crate) fn new(injector: Injector) -> Self {
        Self {
            injector: injector.provider_injector(),
        }
    }

    /// Registers a provider object.
    pub fn provider<P: Provider>(&self, name: &str, provider: P) -> DiResult<Arc<P>> {
        self.provider_arc(name, Arc::new(provider))
    }

    /// Registers a shared provider object.
    pub fn provider_arc<P: Provider>(&self, name: &str, provider: Arc<P>) -> DiResult<Arc<P>> {
        validate_service_name(name)?;
        let object: Instance = provider.clone();
        let dynamic: Arc<dyn Provider> = provider.clone();
        self.insert(name, ProviderRecord::new(object, Some(dynamic)), "provider");
        Ok(provider)
    }

    /// Registers a provider built by `constructor`, invoked against the
    /// provider scope. The constructor must produce a `P`.
    pub fn provider_ctor<P: Provider>(&self, name: &str, constructor: &Injectable) -> DiResult<Arc<P>> {
        validate_service_name(name)?;
        let built = self
            .injector
            .instantiate_named(constructor, None, Some(&provider_key(name)))?;
        let provider = built.downcast::<P>().map_err(|_| DiError::TypeMismatch {
            name: provider_key(name),
            expected: type_name::<P>(),
        })?;
        self.provider_arc(name, provider)
    }

    /// Registers `recipe` as the `$get` of a new provider.
    pub fn factory(&self, name: &str, recipe: Injectable) -> DiResult<Arc<RecipeProvider>> {
        validate_service_name(name)?;
        let provider = Arc::new(RecipeProvider::new(recipe));
        let object: Instance = provider.clone();
        let dynamic: Arc<dyn Provider> = provider.clone();
        self.insert(name, ProviderRecord::new(object, Some(dynamic)), "factory");
        Ok(provider)
    }

    /// Registers a service built by instantiating `constructor`.
    pub fn service(&self, name: &str, constructor: Injectable) -> DiResult<Arc<RecipeProvider>> {
        let service = name.to_string();
        self.factory(
            name,
            Injectable::annotated_raw([INJECTOR], move |args| {
                let injector: Arc<Injector> = args.get(0)?;
                injector
                    .instantiate_named(&constructor, None, Some(&service))
                    .map(Some)
            }),
        )
    }

    /// Registers a fixed value returned as is.
    pub fn value<T: Any + Send + Sync>(&self, name: &str, value: T) -> DiResult<Arc<RecipeProvider>> {
        self.value_instance(name, Arc::new(value))
    }

    /// Registers an already wrapped value.
    pub fn value_instance(&self, name: &str, value: Instance) -> DiResult<Arc<RecipeProvider>> {
        self.factory(
            name,
            Injectable::annotated_raw(Vec::<String>::new(), move |_| Ok(Some(value.clone()))),
        )
    }

    /// Registers a constant, visible immediately in both scopes.
    pub fn constant<T: Any + Send + Sync>(&self, name: &str, value: T) -> DiResult<()> {
        self.constant_instance(name, Arc::new(value))
    }

    /// Registers an already wrapped constant.
    pub fn constant_instance(&self, name: &str, value: Instance) -> DiResult<()> {
        validate_service_name(name)?;
        let inner = self.injector.inner();
        inner.providers.insert_constant(name.to_string(), value.clone());
        inner.instances.set_ready(name, value);
        debug!(service = name, kind = "constant", "registered");
        Ok(())
    }

    /// Stacks `decorator` on the existing provider of `name`.
    ///
    /// The decorator receives the previous value as `$delegate`; its other
    /// dependencies are resolved when the service is first requested.
    pub fn decorator(&self, name: &str, decorator: Injectable) -> DiResult<()> {
        self.check_decoratable(name)?;
        self.push_decorator(name, decorator)
    }

    /// Batch form of [`Provide::factory`].
    pub fn factories<I, S>(&self, entries: I) -> DiResult<()>
    where
        I: IntoIterator<Item = (S, Injectable)>,
        S: Into<String>,
    {
        for (name, recipe) in validated(entries)? {
            self.factory(&name, recipe)?;
        }
        Ok(())
    }

    /// Batch form of [`Provide::service`].
    pub fn services<I, S>(&self, entries: I) -> DiResult<()>
    where
        I: IntoIterator<Item = (S, Injectable)>,
        S: Into<String>,
    {
        for (name, constructor) in validated(entries)? {
            self.service(&name, constructor)?;
        }
        Ok(())
    }

    /// Batch form of [`Provide::value_instance`].
    pub fn values<I, S>(&self, entries: I) -> DiResult<()>
    where
        I: IntoIterator<Item = (S, Instance)>,
        S: Into<String>,
    {
        for (name, value) in validated(entries)? {
            self.value_instance(&name, value)?;
        }
        Ok(())
    }

    /// Batch form of [`Provide::constant_instance`].
    pub fn constants<I, S>(&self, entries: I) -> DiResult<()>
    where
        I: IntoIterator<Item = (S, Instance)>,
        S: Into<String>,
    {
        for (name, value) in validated(entries)? {
            self.constant_instance(&name, value)?;
        }
        Ok(())
    }

    /// Batch form of [`Provide::decorator`].
    pub fn decorators<I, S>(&self, entries: I) -> DiResult<()>
    where
        I: IntoIterator<Item = (S, Injectable)>,
        S: Into<String>,
    {
        let entries = validated(entries)?;
        for (name, _) in &entries {
            self.check_decoratable(name)?;
        }
        for (name, decorator) in entries {
            self.push_decorator(&name, decorator)?;
        }
        Ok(())
    }

    /// Fails unless `name` is a valid, non-constant name with a provider.
    fn check_decoratable(&self, name: &str) -> DiResult<()> {
        validate_service_name(name)?;
        let providers = &self.injector.inner().providers;
        if providers.is_constant(name) {
            return Err(DiError::ConstantCannotBeDecorated {
                name: name.to_string(),
            });
        }
        let key = provider_key(name);
        if providers.record(&key).is_none() {
            return Err(self.injector.unknown_provider(&key, None));
        }
        Ok(())
    }

    fn push_decorator(&self, name: &str, decorator: Injectable) -> DiResult<()> {
        let key = provider_key(name);
        if !self.injector.inner().providers.push_decorator(&key, decorator) {
            return Err(self.injector.unknown_provider(&key, None));
        }
        debug!(service = name, "decorated");
        Ok(())
    }

    fn insert(&self, name: &str, record: ProviderRecord, kind: &'static str) {
        self.injector
            .inner()
            .providers
            .insert_provider(provider_key(name), record);
        debug!(service = name, kind, "registered");
    }
}

/// Collects a batch, rejecting it whole if any name is reserved.
fn validated<I, S, V>(entries: I) -> DiResult<Vec<(String, V)>>
where
    I: IntoIterator<Item = (S, V)>,
    S: Into<String>,
{
    let entries: Vec<(String, V)> = entries
        .into_iter()
        .map(|(name, value)| (name.into(), value))
        .collect();
    for (name, _) in &entries {
        validate_service_name(name)?;
    }
    Ok(entries)
}

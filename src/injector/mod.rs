//! The injector: two lookup scopes over one pair of caches.
//!
//! The provider scope sees provider objects (`"<name>Provider"`), constants,
//! `$provide` and itself; it is what config blocks run against. The instance
//! scope sees services by plain name and `$injector`, and constructs services
//! on first request. Both scopes share the caches; the dependency path is
//! kept per thread.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::annotate::annotate;
use crate::config::InjectorConfig;
use crate::error::{DiError, DiResult};
use crate::injectable::{downcast, instance, Args, Injectable, Instance, Locals};
use crate::internal::{with_path, PathGuard};
use crate::key::{provider_key, DELEGATE, INJECTOR, PROVIDE};
use crate::module::{Module, ModuleRegistry, ModuleSpec};
use crate::observer::Observers;
use crate::provider::Provide;
use crate::registration::{Claim, InstanceCache, InstanceSlot, Map, ProviderCache, ProviderRecord};

mod builder;
mod loader;

pub use builder::InjectorBuilder;

/// Which of the two lookup scopes an [`Injector`] handle resolves in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectorScope {
    /// Configuration phase: provider objects, constants, `$provide`
    Provider,
    /// Run phase: services by plain name
    Instance,
}

#[derive(Default)]
pub(crate) struct LoadedModules {
    order: Vec<String>,
    modules: Map<String, Module>,
}

pub(crate) struct InjectorInner {
    pub(crate) config: InjectorConfig,
    pub(crate) registry: ModuleRegistry,
    pub(crate) providers: ProviderCache,
    pub(crate) instances: InstanceCache,
    pub(crate) loaded: Mutex<LoadedModules>,
    pub(crate) observers: Observers,
}

impl InjectorInner {
    pub(crate) fn is_loaded(&self, name: &str) -> bool {
        self.loaded.lock().modules.contains_key(name)
    }

    pub(crate) fn mark_loaded(&self, name: &str, module: Module) {
        let mut loaded = self.loaded.lock();
        loaded.order.push(name.to_string());
        loaded.modules.insert(name.to_string(), module);
    }
}

/// Handle to an injector in one of its two scopes.
///
/// Cloning is cheap and yields a handle to the same caches. The instance
/// handle is what [`Injector::new`] and [`InjectorBuilder::build`] return;
/// config blocks receive the provider handle as `$injector`.
///
/// Services are singletons per injector: each is constructed at most once,
/// on first request, and a failed construction caches nothing. A thread that
/// requests a service while another thread is constructing it blocks until
/// that construction settles.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Injectable, Injector, ModuleRegistry};
/// use std::sync::Arc;
///
/// struct Clock;
/// struct Greeter { clock: Arc<Clock> }
///
/// let registry = ModuleRegistry::new();
/// registry
///     .define("app", Vec::<String>::new())
///     .factory("clock", Injectable::annotated(Vec::<String>::new(), |_| Ok(Clock)))
///     .service("greeter", Injectable::annotated(["clock"], |args| {
///         Ok(Greeter { clock: args.get(0)? })
///     }));
///
/// let injector = Injector::new(&registry, ["app"], true).unwrap();
/// let a = injector.get_as::<Greeter>("greeter").unwrap();
/// let b = injector.get_as::<Greeter>("greeter").unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// assert!(Arc::ptr_eq(&a.clock, &injector.get_as::<Clock>("clock").unwrap()));
/// ```
#[derive(Clone)]
pub struct Injector {
    inner: Arc<InjectorInner>,
    scope: InjectorScope,
}

impl Injector {
    /// Builds an injector, loading `modules` and running their run blocks.
    pub fn new<I, M>(registry: &ModuleRegistry, modules: I, strict_di: bool) -> DiResult<Injector>
    where
        I: IntoIterator<Item = M>,
        M: Into<ModuleSpec>,
    {
        InjectorBuilder::new(registry)
            .modules(modules)
            .strict_di(strict_di)
            .build()
    }

    /// Starts an [`InjectorBuilder`].
    pub fn builder(registry: &ModuleRegistry) -> InjectorBuilder {
        InjectorBuilder::new(registry)
    }

    pub(crate) fn from_parts(
        config: InjectorConfig,
        registry: ModuleRegistry,
        observers: Observers,
    ) -> Self {
        Self {
            inner: Arc::new(InjectorInner {
                config,
                registry,
                providers: ProviderCache::new(),
                instances: InstanceCache::new(),
                loaded: Mutex::new(LoadedModules::default()),
                observers,
            }),
            scope: InjectorScope::Instance,
        }
    }

    #[inline]
    pub(crate) fn inner(&self) -> &InjectorInner {
        &self.inner
    }

    pub(crate) fn provider_injector(&self) -> Injector {
        self.with_scope(InjectorScope::Provider)
    }

    pub(crate) fn instance_injector(&self) -> Injector {
        self.with_scope(InjectorScope::Instance)
    }

    fn with_scope(&self, scope: InjectorScope) -> Injector {
        Injector {
            inner: self.inner.clone(),
            scope,
        }
    }

    pub(crate) fn provide(&self) -> Provide {
        Provide::new(self.clone())
    }

    /// The scope this handle resolves in.
    pub fn scope(&self) -> InjectorScope {
        self.scope
    }

    /// Whether reflection-based annotation is disabled.
    pub fn strict_di(&self) -> bool {
        self.inner.config.strict_di
    }

    /// Settings this injector was built with.
    pub fn config(&self) -> &InjectorConfig {
        &self.inner.config
    }

    /// Resolves `name` in this handle's scope.
    pub fn get(&self, name: &str) -> DiResult<Instance> {
        self.get_with_caller(name, None)
    }

    /// Resolves `name`, naming `caller` at the end of unknown-provider chains.
    ///
    /// ```rust
    /// use ferrous_inject::{Injector, ModuleRegistry, ModuleSpec};
    ///
    /// let injector = Injector::new(&ModuleRegistry::new(), Vec::<ModuleSpec>::new(), false).unwrap();
    /// let err = injector.get_with_caller("auth", Some("LoginCtrl")).unwrap_err();
    /// assert!(err.to_string().ends_with("Unknown provider: authProvider <- auth <- LoginCtrl"));
    /// ```
    pub fn get_with_caller(&self, name: &str, caller: Option<&str>) -> DiResult<Instance> {
        match self.scope {
            InjectorScope::Provider => self.get_provider_scope(name, caller),
            InjectorScope::Instance => self.get_instance_scope(name, caller),
        }
    }

    /// Resolves `name` and downcasts it to `T`.
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> DiResult<Arc<T>> {
        let value = self.get(name)?;
        downcast(name, &value)
    }

    /// True if `name` can be resolved in this scope, without constructing it.
    pub fn has(&self, name: &str) -> bool {
        if name == INJECTOR {
            return true;
        }
        let inner = &self.inner;
        match self.scope {
            InjectorScope::Provider => {
                name == PROVIDE
                    || inner.providers.contains(name)
                    || inner.providers.contains(&provider_key(name))
            }
            InjectorScope::Instance => {
                inner.providers.contains(&provider_key(name))
                    || matches!(inner.instances.get(name), Some(InstanceSlot::Ready(_)))
            }
        }
    }

    /// Dependency names of `unit` under this injector's strict setting.
    pub fn annotate(&self, unit: &Injectable) -> DiResult<Vec<String>> {
        annotate(unit, self.strict_di(), None)
    }

    /// Calls `unit` with its dependencies resolved.
    ///
    /// Each dependency is taken from `locals` on an exact name match, else
    /// resolved in this scope. `this` is passed through as the receiver.
    pub fn invoke(
        &self,
        unit: &Injectable,
        this: Option<&Instance>,
        locals: Option<&Locals>,
    ) -> DiResult<Option<Instance>> {
        self.invoke_named(unit, this, locals, None)
    }

    /// [`Injector::invoke`] on behalf of `name`, which labels strict-mode
    /// failures and is the caller of every dependency lookup.
    pub fn invoke_named(
        &self,
        unit: &Injectable,
        this: Option<&Instance>,
        locals: Option<&Locals>,
        name: Option<&str>,
    ) -> DiResult<Option<Instance>> {
        let deps = annotate(unit, self.strict_di(), name)?;
        let func = unit.callable(name.unwrap_or("fn"))?;

        let mut values = Vec::with_capacity(deps.len());
        for dep in &deps {
            let value = match locals.and_then(|l| l.get(dep)) {
                Some(local) => local.clone(),
                None => self.get_with_caller(dep, name)?,
            };
            values.push(value);
        }
        func.call(&Args::new(&deps, values, this))
    }

    /// Constructs a fresh value from `unit`; unlike services it is not cached.
    ///
    /// ```rust
    /// use ferrous_inject::{instance, Injectable, Injector, Locals, ModuleRegistry, ModuleSpec};
    ///
    /// struct Point { x: i32, y: i32 }
    ///
    /// let injector = Injector::new(&ModuleRegistry::new(), Vec::<ModuleSpec>::new(), true).unwrap();
    /// let ctor = Injectable::annotated(["x", "y"], |args| {
    ///     Ok(Point { x: *args.get::<i32>(0)?, y: *args.get::<i32>(1)? })
    /// });
    ///
    /// let mut locals = Locals::new();
    /// locals.insert("x".into(), instance(3i32));
    /// locals.insert("y".into(), instance(4i32));
    /// let p = injector.instantiate(&ctor, Some(&locals)).unwrap();
    /// let p = p.downcast_ref::<Point>().unwrap();
    /// assert_eq!((p.x, p.y), (3, 4));
    /// ```
    pub fn instantiate(&self, unit: &Injectable, locals: Option<&Locals>) -> DiResult<Instance> {
        self.instantiate_named(unit, locals, None)
    }

    /// [`Injector::instantiate`] on behalf of `name`.
    pub fn instantiate_named(
        &self,
        unit: &Injectable,
        locals: Option<&Locals>,
        name: Option<&str>,
    ) -> DiResult<Instance> {
        self.invoke_named(unit, None, locals, name)?
            .ok_or_else(|| DiError::UndefinedProviderGet {
                name: name
                    .map(str::to_string)
                    .unwrap_or_else(|| unit.display_name()),
                reason: "constructor must produce an instance.",
            })
    }

    /// Loads more modules into this injector.
    ///
    /// Modules already loaded are skipped. Every new config block of the
    /// batch runs before any of its run blocks.
    pub fn load_new_modules<I, M>(&self, modules: I) -> DiResult<()>
    where
        I: IntoIterator<Item = M>,
        M: Into<ModuleSpec>,
    {
        let specs: Vec<ModuleSpec> = modules.into_iter().map(Into::into).collect();
        let run_blocks = loader::load_modules(&self.provider_injector(), &specs)?;
        loader::run_blocks(&self.instance_injector(), run_blocks)
    }

    /// Snapshot of every module loaded into this injector so far, by name,
    /// including modules reached through `requires`.
    ///
    /// The map is copied under the lock; modules loaded afterwards appear in
    /// the next call. The `Module` handles themselves are shared, not copied.
    pub fn modules(&self) -> Map<String, Module> {
        self.inner.loaded.lock().modules.clone()
    }

    /// Names of the loaded modules, in load order.
    pub fn module_names(&self) -> Vec<String> {
        self.inner.loaded.lock().order.clone()
    }

    /// Human-readable dump of loaded modules, providers and cached instances.
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Injector Debug ===\n");
        s.push_str(&format!("Strict DI: {}\n", self.strict_di()));
        s.push_str("Modules:\n");
        for name in self.module_names() {
            s.push_str(&format!("  {}\n", name));
        }
        s.push_str("Providers:\n");
        for key in self.inner.providers.keys() {
            let kind = if self.inner.providers.is_constant(&key) {
                "constant"
            } else {
                "provider"
            };
            s.push_str(&format!("  {}: {}\n", key, kind));
        }
        s.push_str("Instances:\n");
        for name in self.inner.instances.ready_names() {
            s.push_str(&format!("  {}\n", name));
        }
        s
    }

    pub(crate) fn unknown_provider(&self, key: &str, caller: Option<&str>) -> DiError {
        DiError::UnknownProvider {
            chain: with_path(self.path_owner(), |path| path.unknown_chain(key, caller)),
        }
    }

    /// Identity of the shared state, keying this thread's dependency path.
    fn path_owner(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    fn get_provider_scope(&self, name: &str, caller: Option<&str>) -> DiResult<Instance> {
        match name {
            INJECTOR => Ok(instance(self.provider_injector())),
            PROVIDE => Ok(instance(self.provide())),
            _ => self
                .inner
                .providers
                .object(name)
                .ok_or_else(|| self.unknown_provider(name, caller)),
        }
    }

    fn get_instance_scope(&self, name: &str, caller: Option<&str>) -> DiResult<Instance> {
        if name == INJECTOR {
            return Ok(instance(self.instance_injector()));
        }
        if let Some(InstanceSlot::Ready(value)) = self.inner.instances.get(name) {
            return Ok(value);
        }
        self.construct(name, caller)
    }

    fn construct(&self, name: &str, caller: Option<&str>) -> DiResult<Instance> {
        let inner = &self.inner;
        let _guard = PathGuard::enter(self.path_owner(), name, caller, inner.config.max_depth)?;

        let key = provider_key(name);
        let record = inner
            .providers
            .record(&key)
            .ok_or_else(|| self.unknown_provider(&key, caller))?;

        match inner.instances.claim(name) {
            Claim::Claimed => {}
            Claim::Ready(value) => return Ok(value),
            Claim::Reentered => {
                return Err(DiError::CircularDependency {
                    chain: with_path(self.path_owner(), |path| path.cycle_chain(name)),
                })
            }
        }
        inner.observers.resolving(name);
        trace!(service = name, "constructing");
        let started = Instant::now();

        match self.run_recipe(name, &record) {
            Ok(value) => {
                inner.instances.set_ready(name, value.clone());
                inner.observers.resolved(name, started.elapsed());
                debug!(service = name, "instantiated");
                Ok(value)
            }
            Err(err) => {
                inner.instances.clear_instantiating(name);
                inner.observers.failed(name, &err);
                Err(err)
            }
        }
    }

    fn run_recipe(&self, name: &str, record: &ProviderRecord) -> DiResult<Instance> {
        let missing_get = || DiError::UndefinedProviderGet {
            name: name.to_string(),
            reason: "must define $get factory method.",
        };
        let recipe = record
            .provider
            .as_ref()
            .and_then(|p| p.recipe())
            .ok_or_else(missing_get)?;

        let mut value = match &recipe {
            Injectable::Value(value) => value.clone(),
            _ => self
                .invoke_named(&recipe, Some(&record.object), None, Some(name))?
                .ok_or_else(|| DiError::UndefinedProviderGet {
                    name: name.to_string(),
                    reason: "must return a value from $get factory method.",
                })?,
        };

        for decorator in &record.decorators {
            let mut locals = Locals::new();
            locals.insert(DELEGATE.to_string(), value);
            value = self
                .invoke_named(decorator, Some(&record.object), Some(&locals), Some(name))?
                .ok_or_else(|| DiError::UndefinedProviderGet {
                    name: name.to_string(),
                    reason: "must return a value from its decorator.",
                })?;
        }
        Ok(value)
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("scope", &self.scope)
            .field("strict_di", &self.strict_di())
            .field("modules", &self.module_names())
            .finish()
    }
}

impl PartialEq for Injector {
    /// Two handles are equal when they share caches and scope.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) && self.scope == other.scope
    }
}

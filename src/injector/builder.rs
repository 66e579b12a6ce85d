use std::sync::Arc;

use tracing::debug;

use crate::config::InjectorConfig;
use crate::error::DiResult;
use crate::module::{ModuleRegistry, ModuleSpec};
use crate::observer::{Observers, ResolutionObserver, TracingObserver};

use super::{loader, Injector};

/// Collects modules and settings, then builds an [`Injector`].
///
/// ```rust
/// use ferrous_inject::{InjectorBuilder, InjectorConfig, ModuleRegistry};
///
/// let registry = ModuleRegistry::new();
/// registry.define("core", Vec::<String>::new()).constant("version", "1.0");
/// registry.define("app", ["core"]);
///
/// let injector = InjectorBuilder::new(&registry)
///     .module("app")
///     .config(InjectorConfig::default().with_max_depth(32))
///     .strict_di(true)
///     .build()
///     .unwrap();
///
/// assert!(injector.strict_di());
/// assert_eq!(injector.module_names(), ["app", "core"]);
/// assert_eq!(*injector.get_as::<&str>("version").unwrap(), "1.0");
/// ```
pub struct InjectorBuilder {
    registry: ModuleRegistry,
    specs: Vec<ModuleSpec>,
    config: InjectorConfig,
    strict_di: Option<bool>,
    observers: Observers,
}

impl InjectorBuilder {
    pub fn new(registry: &ModuleRegistry) -> Self {
        Self {
            registry: registry.clone(),
            specs: Vec::new(),
            config: InjectorConfig::default(),
            strict_di: None,
            observers: Observers::default(),
        }
    }

    /// Appends one module spec.
    pub fn module(mut self, spec: impl Into<ModuleSpec>) -> Self {
        self.specs.push(spec.into());
        self
    }

    /// Appends several module specs, in order.
    pub fn modules<I, M>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<ModuleSpec>,
    {
        self.specs.extend(specs.into_iter().map(Into::into));
        self
    }

    /// Overrides the strict flag of the configuration, whenever it is set.
    pub fn strict_di(mut self, strict_di: bool) -> Self {
        self.strict_di = Some(strict_di);
        self
    }

    pub fn config(mut self, config: InjectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ResolutionObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    /// Loads every module, then runs the collected run blocks.
    ///
    /// Fails with the first module-instantiation error; the partly built
    /// injector is dropped.
    pub fn build(self) -> DiResult<Injector> {
        let mut config = self.config;
        if let Some(strict_di) = self.strict_di {
            config.strict_di = strict_di;
        }
        let mut observers = self.observers;
        if config.trace_resolution {
            observers.add(Arc::new(TracingObserver::new()));
        }
        debug!(
            strict_di = config.strict_di,
            max_depth = config.max_depth,
            observers = observers.len(),
            "building injector"
        );

        let injector = Injector::from_parts(config, self.registry, observers);
        let run_blocks = loader::load_modules(&injector.provider_injector(), &self.specs)?;
        loader::run_blocks(&injector, run_blocks)?;
        Ok(injector)
    }
}

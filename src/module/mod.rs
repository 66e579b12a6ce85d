//! Module declarations.
//!
//! A [`Module`] is a named bundle of deferred blocks: registrations and
//! config blocks run against the provider scope while the module loads, run
//! blocks run against the instance scope once every module of the batch has
//! been configured. Modules live in a [`ModuleRegistry`] and are independent
//! of any injector; the same module can be loaded into many injectors.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{DiError, DiResult};
use crate::injectable::{Injectable, Instance};
use crate::injector::Injector;
use crate::provider::Provider;

mod registry;
mod spec;

pub use registry::ModuleRegistry;
pub use spec::ModuleSpec;

/// What a queued block does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Provider,
    Factory,
    Service,
    Value,
    Constant,
    Decorator,
    Config,
    /// A call against an arbitrary named provider object
    ProviderCall,
    Run,
}

type ApplyFn = dyn Fn(&Injector) -> DiResult<()> + Send + Sync;

/// A provider-registration block, applied against the provider scope.
#[derive(Clone)]
pub(crate) struct QueuedBlock {
    pub(crate) kind: BlockKind,
    pub(crate) target: Option<String>,
    apply: Arc<ApplyFn>,
}

impl QueuedBlock {
    fn new<F>(kind: BlockKind, target: Option<&str>, apply: F) -> Self
    where
        F: Fn(&Injector) -> DiResult<()> + Send + Sync + 'static,
    {
        Self {
            kind,
            target: target.map(str::to_string),
            apply: Arc::new(apply),
        }
    }

    pub(crate) fn apply(&self, injector: &Injector) -> DiResult<()> {
        (self.apply)(injector)
    }
}

struct ModuleData {
    name: String,
    requires: Vec<String>,
    invoke_queue: Vec<QueuedBlock>,
    constants: usize,
    config_blocks: Vec<QueuedBlock>,
    run_blocks: Vec<Injectable>,
    info: Value,
}

/// Blocks of a module copied out for one load.
pub(crate) struct ModuleSnapshot {
    pub(crate) requires: Vec<String>,
    pub(crate) blocks: Vec<QueuedBlock>,
    pub(crate) run_blocks: Vec<Injectable>,
}

/// Handle to a declared module.
///
/// Builder methods queue work and return `&Self` so declarations chain.
/// Nothing runs until the module is loaded into an injector; failures are
/// then reported as module-instantiation errors naming this module.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Injectable, Injector, ModuleRegistry};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// struct Repo { url: String }
///
/// let registry = ModuleRegistry::new();
/// registry
///     .define("data", Vec::<String>::new())
///     .value("config", Config { url: "postgres://localhost".into() })
///     .factory("repo", Injectable::annotated(["config"], |args| {
///         let config: Arc<Config> = args.get(0)?;
///         Ok(Repo { url: config.url.clone() })
///     }));
/// registry.define("app", ["data"]);
///
/// let injector = Injector::new(&registry, ["app"], true).unwrap();
/// assert_eq!(injector.get_as::<Repo>("repo").unwrap().url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct Module {
    data: Arc<Mutex<ModuleData>>,
}

impl Module {
    pub(crate) fn new(name: &str, requires: Vec<String>) -> Self {
        Self {
            data: Arc::new(Mutex::new(ModuleData {
                name: name.to_string(),
                requires,
                invoke_queue: Vec::new(),
                constants: 0,
                config_blocks: Vec::new(),
                run_blocks: Vec::new(),
                info: Value::Null,
            })),
        }
    }

    /// Module name.
    pub fn name(&self) -> String {
        self.data.lock().name.clone()
    }

    /// Names of the modules loaded before this one.
    pub fn requires(&self) -> Vec<String> {
        self.data.lock().requires.clone()
    }

    /// Metadata attached with [`Module::info`].
    pub fn info_value(&self) -> Value {
        self.data.lock().info.clone()
    }

    /// Kinds of every queued block in execution order, run blocks last.
    pub fn queue_kinds(&self) -> Vec<BlockKind> {
        let data = self.data.lock();
        data.invoke_queue
            .iter()
            .chain(data.config_blocks.iter())
            .map(|b| b.kind)
            .chain(data.run_blocks.iter().map(|_| BlockKind::Run))
            .collect()
    }

    /// Attaches free-form metadata.
    pub fn info(&self, info: Value) -> &Self {
        self.data.lock().info = info;
        self
    }

    /// Queues a provider object registration.
    pub fn provider<P: Provider>(&self, name: &str, provider: P) -> &Self {
        self.provider_arc(name, Arc::new(provider))
    }

    /// Queues a registration of a shared provider object.
    pub fn provider_arc<P: Provider>(&self, name: &str, provider: Arc<P>) -> &Self {
        let service = name.to_string();
        self.enqueue(QueuedBlock::new(BlockKind::Provider, Some(name), move |injector| {
            injector.provide().provider_arc(&service, provider.clone()).map(|_| ())
        }))
    }

    /// Queues a provider built by `constructor` in each injector.
    pub fn provider_ctor<P: Provider>(&self, name: &str, constructor: Injectable) -> &Self {
        let service = name.to_string();
        self.enqueue(QueuedBlock::new(BlockKind::Provider, Some(name), move |injector| {
            injector
                .provide()
                .provider_ctor::<P>(&service, &constructor)
                .map(|_| ())
        }))
    }

    /// Queues a factory registration.
    pub fn factory(&self, name: &str, recipe: Injectable) -> &Self {
        let service = name.to_string();
        self.enqueue(QueuedBlock::new(BlockKind::Factory, Some(name), move |injector| {
            injector.provide().factory(&service, recipe.clone()).map(|_| ())
        }))
    }

    /// Queues a service (constructor) registration.
    pub fn service(&self, name: &str, constructor: Injectable) -> &Self {
        let service = name.to_string();
        self.enqueue(QueuedBlock::new(BlockKind::Service, Some(name), move |injector| {
            injector
                .provide()
                .service(&service, constructor.clone())
                .map(|_| ())
        }))
    }

    /// Queues a value registration.
    pub fn value<T: Any + Send + Sync>(&self, name: &str, value: T) -> &Self {
        self.value_instance(name, Arc::new(value))
    }

    /// Queues a registration of an already wrapped value.
    pub fn value_instance(&self, name: &str, value: Instance) -> &Self {
        let service = name.to_string();
        self.enqueue(QueuedBlock::new(BlockKind::Value, Some(name), move |injector| {
            injector
                .provide()
                .value_instance(&service, value.clone())
                .map(|_| ())
        }))
    }

    /// Queues a constant ahead of every other registration of this module.
    pub fn constant<T: Any + Send + Sync>(&self, name: &str, value: T) -> &Self {
        self.constant_instance(name, Arc::new(value))
    }

    /// Wrapped-value form of [`Module::constant`].
    pub fn constant_instance(&self, name: &str, value: Instance) -> &Self {
        let service = name.to_string();
        let block = QueuedBlock::new(BlockKind::Constant, Some(name), move |injector| {
            injector.provide().constant_instance(&service, value.clone())
        });
        let mut data = self.data.lock();
        let at = data.constants;
        data.invoke_queue.insert(at, block);
        data.constants += 1;
        drop(data);
        self
    }

    /// Queues a decorator; it runs with the config blocks so it sees every
    /// provider registered by this module.
    pub fn decorator(&self, name: &str, decorator: Injectable) -> &Self {
        let service = name.to_string();
        self.enqueue_config(QueuedBlock::new(BlockKind::Decorator, Some(name), move |injector| {
            injector.provide().decorator(&service, decorator.clone())
        }))
    }

    /// Queues a config block, invoked against the provider scope.
    pub fn config(&self, block: Injectable) -> &Self {
        self.enqueue_config(QueuedBlock::new(BlockKind::Config, None, move |injector| {
            injector.invoke(&block, None, None).map(|_| ())
        }))
    }

    pub(crate) fn prepend_config(&self, block: Injectable) {
        let queued = QueuedBlock::new(BlockKind::Config, None, move |injector| {
            injector.invoke(&block, None, None).map(|_| ())
        });
        self.data.lock().config_blocks.insert(0, queued);
    }

    /// Queues a call against the provider-scope object `provider`, e.g.
    /// `"routeProvider"`.
    ///
    /// This is the hook for registration helpers owned by other providers
    /// (controllers, directives, routes). A provider registered by an
    /// earlier block of the same module is already visible.
    pub fn on_provider<F>(&self, provider: &str, f: F) -> &Self
    where
        F: Fn(&Instance) -> DiResult<()> + Send + Sync + 'static,
    {
        let key = provider.to_string();
        self.enqueue(QueuedBlock::new(BlockKind::ProviderCall, Some(provider), move |injector| {
            let object = injector.get(&key)?;
            f(&object)
        }))
    }

    /// Queues a run block, invoked against the instance scope after every
    /// module of the batch is configured.
    pub fn run(&self, block: Injectable) -> &Self {
        self.data.lock().run_blocks.push(block);
        self
    }

    fn enqueue(&self, block: QueuedBlock) -> &Self {
        self.data.lock().invoke_queue.push(block);
        self
    }

    fn enqueue_config(&self, block: QueuedBlock) -> &Self {
        self.data.lock().config_blocks.push(block);
        self
    }

    pub(crate) fn snapshot(&self) -> ModuleSnapshot {
        let data = self.data.lock();
        ModuleSnapshot {
            requires: data.requires.clone(),
            blocks: data
                .invoke_queue
                .iter()
                .chain(data.config_blocks.iter())
                .cloned()
                .collect(),
            run_blocks: data.run_blocks.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn same_as(&self, other: &Module) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.lock();
        f.debug_struct("Module")
            .field("name", &data.name)
            .field("requires", &data.requires)
            .field("blocks", &(data.invoke_queue.len() + data.config_blocks.len()))
            .field("run_blocks", &data.run_blocks.len())
            .finish()
    }
}

/// Wraps a module-level failure with the module's identity.
pub(crate) fn module_error(module: &str, error: DiError) -> DiError {
    DiError::wrap_module(module, error)
}

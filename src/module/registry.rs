//! Name-keyed store of module declarations.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{DiError, DiResult};
use crate::injectable::Injectable;
use crate::registration::Map;

use super::Module;

static GLOBAL: Lazy<ModuleRegistry> = Lazy::new(ModuleRegistry::new);

/// Module declarations, shared by every injector built from this registry.
///
/// Cloning is cheap; clones see the same declarations.
///
/// ```rust
/// use ferrous_inject::{DiError, ModuleRegistry};
///
/// let registry = ModuleRegistry::new();
/// registry.define("core", Vec::<String>::new()).value("answer", 42u8);
///
/// assert!(registry.contains("core"));
/// assert_eq!(registry.module("core").unwrap().name(), "core");
/// assert!(matches!(registry.module("nope"), Err(DiError::ModuleNotFound { .. })));
/// ```
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: Arc<Mutex<Map<String, Module>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static ModuleRegistry {
        &GLOBAL
    }

    /// Creates `name`, replacing any earlier declaration of it.
    ///
    /// Injectors that already loaded the old declaration keep it.
    pub fn define<I, S>(&self, name: &str, requires: I) -> Module
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let requires: Vec<String> = requires.into_iter().map(Into::into).collect();
        debug!(module = name, requires = ?requires, "module defined");
        let module = Module::new(name, requires);
        let replaced = self
            .modules
            .lock()
            .insert(name.to_string(), module.clone());
        if replaced.is_some() {
            debug!(module = name, "module redefined");
        }
        module
    }

    /// [`ModuleRegistry::define`] with an initial config block.
    pub fn define_with_config<I, S>(&self, name: &str, requires: I, config: Injectable) -> Module
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let module = self.define(name, requires);
        module.prepend_config(config);
        module
    }

    /// Looks up a declared module.
    pub fn module(&self, name: &str) -> DiResult<Module> {
        self.modules
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| DiError::ModuleNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.lock().contains_key(name)
    }

    /// Declared module names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.names())
            .finish()
    }
}

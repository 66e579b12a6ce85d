use crate::injectable::Injectable;

/// One entry of the module list handed to an injector.
#[derive(Clone, Debug)]
pub enum ModuleSpec {
    /// A module declared in the registry
    Named(String),
    /// An ad-hoc block invoked against the provider scope; never deduplicated
    Block(Injectable),
    /// Nested specs, loaded in order
    List(Vec<ModuleSpec>),
}

impl From<&str> for ModuleSpec {
    fn from(name: &str) -> Self {
        ModuleSpec::Named(name.to_string())
    }
}

impl From<String> for ModuleSpec {
    fn from(name: String) -> Self {
        ModuleSpec::Named(name)
    }
}

impl From<&String> for ModuleSpec {
    fn from(name: &String) -> Self {
        ModuleSpec::Named(name.clone())
    }
}

impl From<Injectable> for ModuleSpec {
    fn from(block: Injectable) -> Self {
        ModuleSpec::Block(block)
    }
}

impl<T: Into<ModuleSpec>> From<Vec<T>> for ModuleSpec {
    fn from(specs: Vec<T>) -> Self {
        ModuleSpec::List(specs.into_iter().map(Into::into).collect())
    }
}

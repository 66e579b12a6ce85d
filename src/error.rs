//! Error types for the injector.

use thiserror::Error;

/// Injector errors
///
/// Every failure raised by registration, resolution, invocation or module
/// loading. Messages start with a stable lookup key (`[$injector:<code>]`)
/// followed by a single human-readable line that embeds the dependency chain
/// where one exists.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{DiError, Injector, ModuleRegistry, ModuleSpec};
///
/// let registry = ModuleRegistry::new();
/// let injector = Injector::new(&registry, Vec::<ModuleSpec>::new(), false).unwrap();
/// match injector.get("missing") {
///     Err(err @ DiError::UnknownProvider { .. }) => {
///         assert_eq!(err.code(), "unpr");
///         assert!(err.to_string().contains("Unknown provider: missingProvider <- missing"));
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// No provider registered for a requested name (chain is innermost first)
    #[error("[$injector:unpr] Unknown provider: {chain}")]
    UnknownProvider { chain: String },

    /// A name was requested while already being constructed
    #[error("[$injector:cdep] Circular dependency found: {chain}")]
    CircularDependency { chain: String },

    /// A provider has no `$get` recipe, or its recipe produced nothing
    #[error("[$injector:undef] Provider '{name}' {reason}")]
    UndefinedProviderGet { name: String, reason: &'static str },

    /// A value expected to be callable is not
    #[error("[$injector:areq] Argument '{name}' is not a function, got {got}")]
    NotAFunction { name: String, got: &'static str },

    /// Registration under a reserved name
    #[error("[$injector:badname] {name} is not a valid service name")]
    InvalidServiceName { name: String },

    /// Reflection-based annotation attempted in strict mode
    #[error("[$injector:strictdi] {name} is not using explicit annotation and cannot be invoked in strict mode")]
    StrictModeViolation { name: String },

    /// A module name was requested but never declared
    #[error("[$injector:nomod] Module '{name}' is not available! You either misspelled the module name or forgot to load it. If registering a module ensure that you specify the dependencies as the second argument.")]
    ModuleNotFound { name: String },

    /// A block of a module failed while loading
    #[error("[$injector:modulerr] Failed to instantiate module {module} due to:\n{source}")]
    ModuleInstantiation {
        module: String,
        #[source]
        source: Box<DiError>,
    },

    /// Decorators cannot target constants
    #[error("[$injector:noconstdec] Cannot decorate constant '{name}'")]
    ConstantCannotBeDecorated { name: String },

    /// A resolved value has a different concrete type than requested
    #[error("[$injector:typemis] Type mismatch for '{name}': expected {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    /// Maximum resolution depth exceeded
    #[error("[$injector:depth] Max resolution depth {0} exceeded")]
    DepthExceeded(usize),

    /// Failure raised by a user factory, constructor or block
    #[error("[$injector:custom] {0}")]
    Custom(String),
}

impl DiError {
    /// Builds a [`DiError::Custom`] from any displayable message.
    pub fn custom(message: impl std::fmt::Display) -> Self {
        DiError::Custom(message.to_string())
    }

    /// Stable documentation key for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            DiError::UnknownProvider { .. } => "unpr",
            DiError::CircularDependency { .. } => "cdep",
            DiError::UndefinedProviderGet { .. } => "undef",
            DiError::NotAFunction { .. } => "areq",
            DiError::InvalidServiceName { .. } => "badname",
            DiError::StrictModeViolation { .. } => "strictdi",
            DiError::ModuleNotFound { .. } => "nomod",
            DiError::ModuleInstantiation { .. } => "modulerr",
            DiError::ConstantCannotBeDecorated { .. } => "noconstdec",
            DiError::TypeMismatch { .. } => "typemis",
            DiError::DepthExceeded(_) => "depth",
            DiError::Custom(_) => "custom",
        }
    }

    /// Innermost error behind any number of module-instantiation wrappers.
    ///
    /// ```rust
    /// use ferrous_inject::DiError;
    ///
    /// let inner = DiError::ModuleNotFound { name: "dep".into() };
    /// let wrapped = DiError::ModuleInstantiation {
    ///     module: "app".into(),
    ///     source: Box::new(DiError::ModuleInstantiation {
    ///         module: "dep".into(),
    ///         source: Box::new(inner),
    ///     }),
    /// };
    /// assert_eq!(wrapped.root_cause().code(), "nomod");
    /// ```
    pub fn root_cause(&self) -> &DiError {
        let mut current = self;
        while let DiError::ModuleInstantiation { source, .. } = current {
            current = source;
        }
        current
    }

    pub(crate) fn wrap_module(module: impl Into<String>, source: DiError) -> Self {
        DiError::ModuleInstantiation {
            module: module.into(),
            source: Box::new(source),
        }
    }
}

/// Result type for injector operations
///
/// A convenience alias for `Result<T, DiError>` used throughout the crate.
pub type DiResult<T> = Result<T, DiError>;

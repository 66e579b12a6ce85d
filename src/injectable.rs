//! Constructible units and the arguments they are called with.
//!
//! An [`Injectable`] is anything the injector can call after resolving its
//! dependencies: a callable ([`InjectFn`]), the two-part
//! `[...names, callable]` form, or a plain value that is rejected when called.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{DiError, DiResult};

/// Type-erased shared value produced by the injector.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Pre-resolved named values handed to an invocation.
pub type Locals = HashMap<String, Instance>;

type Body = dyn Fn(&Args<'_>) -> DiResult<Option<Instance>> + Send + Sync;

/// Wraps a value into an [`Instance`].
///
/// ```rust
/// use ferrous_inject::{instance, Instance};
///
/// let v: Instance = instance(42u32);
/// assert_eq!(*v.downcast_ref::<u32>().unwrap(), 42);
/// ```
pub fn instance<T: Any + Send + Sync>(value: T) -> Instance {
    Arc::new(value)
}

/// Downcasts an [`Instance`] to a concrete shared type.
pub fn downcast<T: Any + Send + Sync>(name: &str, value: &Instance) -> DiResult<Arc<T>> {
    Arc::clone(value)
        .downcast::<T>()
        .map_err(|_| DiError::TypeMismatch {
            name: name.to_string(),
            expected: type_name::<T>(),
        })
}

/// Resolved arguments of one invocation.
///
/// Values are positional in the order the callable declared its
/// dependencies. `this` is the optional call receiver (the provider object
/// when a `$get` recipe runs).
pub struct Args<'a> {
    names: &'a [String],
    values: Vec<Instance>,
    this: Option<&'a Instance>,
}

impl<'a> Args<'a> {
    pub(crate) fn new(names: &'a [String], values: Vec<Instance>, this: Option<&'a Instance>) -> Self {
        Self { names, values, this }
    }

    /// Number of resolved arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the callable declared no dependencies.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Declared dependency names, in argument order.
    pub fn names(&self) -> &[String] {
        self.names
    }

    /// The untyped value at `index`.
    pub fn raw(&self, index: usize) -> DiResult<&Instance> {
        self.values.get(index).ok_or_else(|| {
            DiError::custom(format!(
                "argument {} requested but only {} were injected",
                index,
                self.values.len()
            ))
        })
    }

    /// The value at `index`, downcast to `T`.
    ///
    /// ```rust
    /// use ferrous_inject::{Injectable, Injector, ModuleRegistry};
    /// use std::sync::Arc;
    ///
    /// let registry = ModuleRegistry::new();
    /// registry.define("app", Vec::<String>::new()).value("port", 8080u16);
    /// let injector = Injector::new(&registry, ["app"], false).unwrap();
    ///
    /// let unit = Injectable::annotated(["port"], |args| {
    ///     let port: Arc<u16> = args.get(0)?;
    ///     Ok(format!("listening on {}", port))
    /// });
    /// let out = injector.invoke(&unit, None, None).unwrap().unwrap();
    /// assert_eq!(out.downcast_ref::<String>().unwrap(), "listening on 8080");
    /// ```
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> DiResult<Arc<T>> {
        let value = self.raw(index)?;
        let name = self.names.get(index).map(String::as_str).unwrap_or("?");
        downcast(name, value)
    }

    /// The value injected under `name`, downcast to `T`.
    pub fn named<T: Any + Send + Sync>(&self, name: &str) -> DiResult<Arc<T>> {
        let index = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| DiError::custom(format!("'{}' is not an injected argument", name)))?;
        self.get(index)
    }

    /// The call receiver, downcast to `T`.
    pub fn this<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
        let this = self
            .this
            .ok_or_else(|| DiError::custom("invocation has no receiver"))?;
        downcast("this", this)
    }

    /// The untyped call receiver, if any.
    pub fn this_raw(&self) -> Option<&Instance> {
        self.this
    }
}

/// A callable unit with optional annotation metadata.
#[derive(Clone)]
pub struct InjectFn {
    body: Arc<Body>,
    name: Option<String>,
    source: Option<String>,
    inject: Option<Vec<String>>,
    reflected: Arc<OnceCell<Vec<String>>>,
}

impl InjectFn {
    fn new(body: Arc<Body>) -> Self {
        Self {
            body,
            name: None,
            source: None,
            inject: None,
            reflected: Arc::new(OnceCell::new()),
        }
    }

    /// Diagnostic name, if one was attached.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Declared source signature used for reflection.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Attached annotation, if any.
    pub fn inject(&self) -> Option<&[String]> {
        self.inject.as_deref()
    }

    pub(crate) fn reflected(&self) -> &OnceCell<Vec<String>> {
        &self.reflected
    }

    pub(crate) fn call(&self, args: &Args<'_>) -> DiResult<Option<Instance>> {
        (self.body)(args)
    }

    /// Name used in strict-mode diagnostics.
    pub(crate) fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match &self.source {
            Some(source) => {
                let params = crate::annotate::parameter_text(source).unwrap_or_default();
                format!("function({})", params.split_whitespace().collect::<Vec<_>>().join(" "))
            }
            None => "fn".to_string(),
        }
    }
}

impl fmt::Debug for InjectFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectFn")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("inject", &self.inject)
            .finish()
    }
}

/// Anything the injector can be asked to call.
#[derive(Clone)]
pub enum Injectable {
    /// A callable, bare or with an attached annotation
    Fn(InjectFn),
    /// The two-part form: dependency names followed by the callable
    Array {
        deps: Vec<String>,
        target: Box<Injectable>,
    },
    /// A plain value; calling it fails with [`DiError::NotAFunction`]
    Value(Instance),
}

fn typed_body<T, F>(f: F) -> Arc<Body>
where
    T: Any + Send + Sync,
    F: Fn(&Args<'_>) -> DiResult<T> + Send + Sync + 'static,
{
    Arc::new(move |args: &Args<'_>| f(args).map(|v| Some(Arc::new(v) as Instance)))
}

fn collect_names<I, S>(deps: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    deps.into_iter().map(Into::into).collect()
}

impl Injectable {
    /// A bare callable with no declared source.
    ///
    /// Reflection sees no parameters; strict mode rejects it unless an
    /// annotation is attached with [`Injectable::with_inject`].
    pub fn func<T, F>(f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Args<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        Injectable::Fn(InjectFn::new(typed_body(f)))
    }

    /// A bare callable whose body returns an optional untyped value.
    pub fn raw<F>(f: F) -> Self
    where
        F: Fn(&Args<'_>) -> DiResult<Option<Instance>> + Send + Sync + 'static,
    {
        Injectable::Fn(InjectFn::new(Arc::new(f)))
    }

    /// A bare callable whose dependencies are inferred from `source`.
    ///
    /// `source` is the callable's declared signature, e.g.
    /// `"function (config, _http_) {}"` or `"(a, b) => a + b"`.
    ///
    /// ```rust
    /// use ferrous_inject::Injectable;
    ///
    /// let unit = Injectable::from_source("function (config, _http_)", |_| Ok(()));
    /// assert_eq!(unit.annotate(false).unwrap(), vec!["config", "http"]);
    /// assert!(unit.annotate(true).is_err());
    /// ```
    pub fn from_source<T, F>(source: impl Into<String>, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Args<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        let mut func = InjectFn::new(typed_body(f));
        func.source = Some(source.into());
        Injectable::Fn(func)
    }

    /// Untyped variant of [`Injectable::from_source`].
    pub fn from_source_raw<F>(source: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Args<'_>) -> DiResult<Option<Instance>> + Send + Sync + 'static,
    {
        let mut func = InjectFn::new(Arc::new(f));
        func.source = Some(source.into());
        Injectable::Fn(func)
    }

    /// The two-part form: `deps` followed by a typed callable.
    pub fn annotated<I, S, T, F>(deps: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        T: Any + Send + Sync,
        F: Fn(&Args<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        Injectable::array(deps, Injectable::Fn(InjectFn::new(typed_body(f))))
    }

    /// The two-part form with an untyped, possibly empty result.
    pub fn annotated_raw<I, S, F>(deps: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Args<'_>) -> DiResult<Option<Instance>> + Send + Sync + 'static,
    {
        Injectable::array(deps, Injectable::raw(f))
    }

    /// The two-part form around an arbitrary target.
    pub fn array<I, S>(deps: I, target: Injectable) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Injectable::Array {
            deps: collect_names(deps),
            target: Box::new(target),
        }
    }

    /// A non-callable value.
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Injectable::Value(Arc::new(value))
    }

    /// Attaches an explicit annotation to a callable.
    ///
    /// Attached annotations are trusted even in strict mode. Has no effect on
    /// the array and value forms.
    pub fn with_inject<I, S>(self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self {
            Injectable::Fn(mut func) => {
                func.inject = Some(collect_names(deps));
                Injectable::Fn(func)
            }
            other => other,
        }
    }

    /// Attaches a diagnostic name to the callable.
    pub fn named(self, name: impl Into<String>) -> Self {
        match self {
            Injectable::Fn(mut func) => {
                func.name = Some(name.into());
                Injectable::Fn(func)
            }
            Injectable::Array { deps, target } => Injectable::Array {
                deps,
                target: Box::new(target.named(name)),
            },
            other => other,
        }
    }

    /// Dependency names of this unit; see [`crate::annotate::annotate`].
    pub fn annotate(&self, strict: bool) -> DiResult<Vec<String>> {
        crate::annotate::annotate(self, strict, None)
    }

    /// Short description of the shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Injectable::Fn(_) => "function",
            Injectable::Array { .. } => "array",
            Injectable::Value(_) => "value",
        }
    }

    /// Best available diagnostic name.
    pub fn display_name(&self) -> String {
        match self {
            Injectable::Fn(func) => func.display_name(),
            Injectable::Array { target, .. } => target.display_name(),
            Injectable::Value(_) => "value".to_string(),
        }
    }

    /// The callable behind this unit.
    pub(crate) fn callable(&self, name: &str) -> DiResult<&InjectFn> {
        match self {
            Injectable::Fn(func) => Ok(func),
            Injectable::Array { target, .. } => match target.as_ref() {
                Injectable::Fn(func) => Ok(func),
                other => Err(DiError::NotAFunction {
                    name: name.to_string(),
                    got: other.kind(),
                }),
            },
            Injectable::Value(_) => Err(DiError::NotAFunction {
                name: name.to_string(),
                got: "value",
            }),
        }
    }
}

impl fmt::Debug for Injectable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Injectable::Fn(func) => f.debug_tuple("Fn").field(func).finish(),
            Injectable::Array { deps, target } => f
                .debug_struct("Array")
                .field("deps", deps)
                .field("target", target)
                .finish(),
            Injectable::Value(_) => f.write_str("Value(..)"),
        }
    }
}

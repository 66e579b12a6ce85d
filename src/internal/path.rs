//! Active resolution path used for cycle detection and error provenance.
//!
//! Each thread keeps its own path per injector, keyed by the address of the
//! injector's shared state, so concurrent resolutions never see each other's
//! in-flight names.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::{DiError, DiResult};

thread_local! {
    static ACTIVE_PATHS: RefCell<HashMap<usize, DependencyPath>> = RefCell::new(HashMap::new());
}

/// Names currently being resolved, outermost first.
#[derive(Debug, Default)]
pub(crate) struct DependencyPath {
    names: Vec<String>,
    root_caller: Option<String>,
}

impl DependencyPath {
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// `name <- innermost <- ... <- outermost`
    pub(crate) fn cycle_chain(&self, name: &str) -> String {
        std::iter::once(name)
            .chain(self.names.iter().rev().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" <- ")
    }

    /// `key <- innermost <- ... <- outermost [<- caller]`
    ///
    /// The caller suffix is the one given to the outermost call, or `caller`
    /// itself when nothing is in flight yet.
    pub(crate) fn unknown_chain(&self, key: &str, caller: Option<&str>) -> String {
        let suffix = if self.names.is_empty() {
            caller
        } else {
            self.root_caller.as_deref()
        };
        std::iter::once(key)
            .chain(self.names.iter().rev().map(String::as_str))
            .chain(suffix.filter(|c| !c.is_empty()))
            .collect::<Vec<_>>()
            .join(" <- ")
    }

    fn push(&mut self, name: &str, caller: Option<&str>) {
        if self.names.is_empty() {
            self.root_caller = caller.map(str::to_string);
        }
        self.names.push(name.to_string());
    }

    fn pop(&mut self, name: &str) {
        let last = self.names.pop();
        debug_assert_eq!(last.as_deref(), Some(name));
        if self.names.is_empty() {
            self.root_caller = None;
        }
    }
}

/// Runs `f` against the calling thread's path for `owner`.
pub(crate) fn with_path<R>(owner: usize, f: impl FnOnce(&DependencyPath) -> R) -> R {
    ACTIVE_PATHS.with(|paths| match paths.borrow().get(&owner) {
        Some(path) => f(path),
        None => f(&DependencyPath::default()),
    })
}

/// Keeps `name` on the calling thread's path for the guard's lifetime.
///
/// Entering fails before anything is pushed when `name` is already in flight
/// or when the path is `max_depth` long.
pub(crate) struct PathGuard {
    owner: usize,
    name: String,
}

impl PathGuard {
    pub(crate) fn enter(
        owner: usize,
        name: &str,
        caller: Option<&str>,
        max_depth: usize,
    ) -> DiResult<Self> {
        ACTIVE_PATHS.with(|paths| {
            let mut paths = paths.borrow_mut();
            let active = paths.entry(owner).or_default();
            if active.contains(name) {
                return Err(DiError::CircularDependency {
                    chain: active.cycle_chain(name),
                });
            }
            if active.names.len() >= max_depth {
                return Err(DiError::DepthExceeded(active.names.len()));
            }
            active.push(name, caller);
            Ok(())
        })?;
        Ok(Self {
            owner,
            name: name.to_string(),
        })
    }
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        ACTIVE_PATHS.with(|paths| {
            let mut paths = paths.borrow_mut();
            if let Some(active) = paths.get_mut(&self.owner) {
                active.pop(&self.name);
                if active.names.is_empty() {
                    paths.remove(&self.owner);
                }
            }
        });
    }
}

//! Resolution observers.
//!
//! Observers are told when the instance scope starts constructing a service,
//! when it finishes, and when it fails. Cached hits are not reported.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::error::DiError;

/// Hook into service construction.
///
/// Calls are made synchronously on the resolving thread, while the service
/// is on the dependency path; keep implementations cheap.
///
/// ```rust
/// use ferrous_inject::{DiError, Injectable, InjectorBuilder, ModuleRegistry, ResolutionObserver};
/// use parking_lot::Mutex;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<String>>);
///
/// impl ResolutionObserver for Recorder {
///     fn resolving(&self, name: &str) {
///         self.0.lock().push(format!("start {}", name));
///     }
///     fn resolved(&self, name: &str, _: Duration) {
///         self.0.lock().push(format!("done {}", name));
///     }
///     fn failed(&self, _: &str, _: &DiError) {}
/// }
///
/// let registry = ModuleRegistry::new();
/// registry
///     .define("app", Vec::<String>::new())
///     .value("a", 1u8)
///     .factory("b", Injectable::annotated(["a"], |_| Ok(2u8)));
///
/// let recorder = Arc::new(Recorder::default());
/// let injector = InjectorBuilder::new(&registry)
///     .module("app")
///     .observer(recorder.clone())
///     .build()
///     .unwrap();
/// injector.get("b").unwrap();
/// assert_eq!(*recorder.0.lock(), ["start b", "start a", "done a", "done b"]);
/// ```
pub trait ResolutionObserver: Send + Sync {
    /// Construction of `name` is starting.
    fn resolving(&self, name: &str);

    /// `name` was constructed and cached.
    fn resolved(&self, name: &str, duration: Duration);

    /// Construction of `name` failed; nothing was cached.
    fn failed(&self, name: &str, error: &DiError);
}

/// Registered observers of one injector.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn ResolutionObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn ResolutionObserver>) {
        self.observers.push(observer);
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    #[inline]
    pub(crate) fn resolving(&self, name: &str) {
        for observer in &self.observers {
            observer.resolving(name);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, name: &str, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(name, duration);
        }
    }

    #[inline]
    pub(crate) fn failed(&self, name: &str, error: &DiError) {
        for observer in &self.observers {
            observer.failed(name, error);
        }
    }
}

/// Forwards resolution events to `tracing`.
///
/// Starts and completions are emitted at `trace`/`debug`, failures at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl ResolutionObserver for TracingObserver {
    fn resolving(&self, name: &str) {
        trace!(service = name, "resolving");
    }

    fn resolved(&self, name: &str, duration: Duration) {
        debug!(service = name, elapsed_us = duration.as_micros() as u64, "resolved");
    }

    fn failed(&self, name: &str, error: &DiError) {
        warn!(service = name, code = error.code(), error = %error, "resolution failed");
    }
}

/// Counts constructions and failures.
#[derive(Debug, Default)]
pub struct MetricsObserver {
    resolution_count: AtomicU64,
    failure_count: AtomicU64,
    total_resolution_nanos: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of services constructed.
    pub fn resolution_count(&self) -> u64 {
        self.resolution_count.load(Ordering::Relaxed)
    }

    /// Number of failed constructions.
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Time spent constructing, nested constructions included.
    pub fn total_resolution_time(&self) -> Duration {
        Duration::from_nanos(self.total_resolution_nanos.load(Ordering::Relaxed))
    }

    /// Mean construction time, `None` before the first construction.
    pub fn average_resolution_time(&self) -> Option<Duration> {
        let count = self.resolution_count();
        if count == 0 {
            return None;
        }
        let total = self.total_resolution_nanos.load(Ordering::Relaxed);
        Some(Duration::from_nanos(total / count))
    }

    pub fn reset(&self) {
        self.resolution_count.store(0, Ordering::Relaxed);
        self.failure_count.store(0, Ordering::Relaxed);
        self.total_resolution_nanos.store(0, Ordering::Relaxed);
    }
}

impl ResolutionObserver for MetricsObserver {
    fn resolving(&self, _name: &str) {}

    fn resolved(&self, _name: &str, duration: Duration) {
        self.resolution_count.fetch_add(1, Ordering::Relaxed);
        self.total_resolution_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn failed(&self, _name: &str, _error: &DiError) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }
}

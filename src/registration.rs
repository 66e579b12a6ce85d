//! Provider and instance caches owned by one injector.

use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};

use crate::injectable::{Injectable, Instance};
use crate::provider::Provider;

#[cfg(feature = "ahash")]
pub(crate) type Map<K, V> = ahash::AHashMap<K, V>;
#[cfg(not(feature = "ahash"))]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V>;

/// A registered provider together with the decorators stacked on it.
#[derive(Clone)]
pub(crate) struct ProviderRecord {
    /// What `"<name>Provider"` resolves to in the provider scope
    pub(crate) object: Instance,
    /// `None` when the registered object does not expose a `$get` recipe
    pub(crate) provider: Option<Arc<dyn Provider>>,
    /// Applied in registration order, each wrapping the previous result
    pub(crate) decorators: Vec<Injectable>,
}

impl ProviderRecord {
    pub(crate) fn new(object: Instance, provider: Option<Arc<dyn Provider>>) -> Self {
        Self {
            object,
            provider,
            decorators: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub(crate) enum ProviderSlot {
    Constant(Instance),
    Provider(ProviderRecord),
}

/// Provider-scope table keyed by provider key (or plain name for constants).
#[derive(Default)]
pub(crate) struct ProviderCache {
    entries: Mutex<Map<String, ProviderSlot>>,
}

impl ProviderCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_provider(&self, key: String, record: ProviderRecord) {
        self.entries.lock().insert(key, ProviderSlot::Provider(record));
    }

    pub(crate) fn insert_constant(&self, name: String, value: Instance) {
        self.entries.lock().insert(name, ProviderSlot::Constant(value));
    }

    /// Value visible under `key` in the provider scope.
    pub(crate) fn object(&self, key: &str) -> Option<Instance> {
        match self.entries.lock().get(key)? {
            ProviderSlot::Constant(value) => Some(value.clone()),
            ProviderSlot::Provider(record) => Some(record.object.clone()),
        }
    }

    pub(crate) fn record(&self, key: &str) -> Option<ProviderRecord> {
        match self.entries.lock().get(key)? {
            ProviderSlot::Provider(record) => Some(record.clone()),
            ProviderSlot::Constant(_) => None,
        }
    }

    pub(crate) fn is_constant(&self, name: &str) -> bool {
        matches!(self.entries.lock().get(name), Some(ProviderSlot::Constant(_)))
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Appends a decorator to the provider under `key`; false if absent.
    pub(crate) fn push_decorator(&self, key: &str, decorator: Injectable) -> bool {
        match self.entries.lock().get_mut(key) {
            Some(ProviderSlot::Provider(record)) => {
                record.decorators.push(decorator);
                true
            }
            _ => false,
        }
    }

    #[cfg(any(test, feature = "diagnostics"))]
    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[derive(Clone)]
pub(crate) enum InstanceSlot {
    /// Sentinel held by the thread constructing the service
    Instantiating(ThreadId),
    Ready(Instance),
}

/// Outcome of [`InstanceCache::claim`].
pub(crate) enum Claim {
    /// Another thread finished the service while this one waited
    Ready(Instance),
    /// The calling thread already holds the sentinel
    Reentered,
    /// The calling thread now holds the sentinel and must construct
    Claimed,
}

/// Instance-scope singletons keyed by plain service name.
#[derive(Default)]
pub(crate) struct InstanceCache {
    entries: Mutex<Map<String, InstanceSlot>>,
    settled: Condvar,
}

impl InstanceCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, name: &str) -> Option<InstanceSlot> {
        self.entries.lock().get(name).cloned()
    }

    /// Takes the construction sentinel for `name`.
    ///
    /// Blocks while another thread holds it. If that construction fails the
    /// sentinel is released and the caller claims it in turn.
    pub(crate) fn claim(&self, name: &str) -> Claim {
        let me = thread::current().id();
        let mut entries = self.entries.lock();
        loop {
            match entries.get(name) {
                Some(InstanceSlot::Ready(value)) => return Claim::Ready(value.clone()),
                Some(InstanceSlot::Instantiating(owner)) if *owner == me => return Claim::Reentered,
                Some(InstanceSlot::Instantiating(_)) => self.settled.wait(&mut entries),
                None => {
                    entries.insert(name.to_string(), InstanceSlot::Instantiating(me));
                    return Claim::Claimed;
                }
            }
        }
    }

    pub(crate) fn set_ready(&self, name: &str, value: Instance) {
        self.entries
            .lock()
            .insert(name.to_string(), InstanceSlot::Ready(value));
        self.settled.notify_all();
    }

    /// Drops the sentinel left by a failed construction.
    pub(crate) fn clear_instantiating(&self, name: &str) {
        let mut entries = self.entries.lock();
        if matches!(entries.get(name), Some(InstanceSlot::Instantiating(_))) {
            entries.remove(name);
        }
        drop(entries);
        self.settled.notify_all();
    }

    #[cfg(any(test, feature = "diagnostics"))]
    pub(crate) fn ready_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .lock()
            .iter()
            .filter(|(_, slot)| matches!(slot, InstanceSlot::Ready(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

//! Provider registry.
//!
//! Maps provider names to their adapter and observer list. The registry is an
//! explicit object shared through `Arc`; there is no process-wide instance.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::adapter::ProviderAdapter;
use super::error::RegistryError;
use super::notification::SharedNotification;
use super::observer::Observer;
use super::request::WebhookRequest;

/// A registered adapter and the observers interested in it.
struct AdapterEntry {
    adapter: Arc<dyn ProviderAdapter>,
    observers: Vec<Observer>,
}

/// Snapshot of the entry that claimed a request.
///
/// Taken under the read lock and used after it is released, so observers
/// may subscribe further observers without deadlocking.
#[derive(Clone)]
pub(crate) struct Route {
    pub(crate) provider: String,
    pub(crate) adapter: Arc<dyn ProviderAdapter>,
    pub(crate) observers: Vec<Observer>,
}

/// Result of matching a request against every registered adapter.
pub(crate) struct RouteMatch {
    pub(crate) route: Option<Route>,
    /// Providers whose predicate also matched but lost to `route`.
    pub(crate) shadowed: Vec<String>,
}

/// Registry of provider adapters and their observers.
///
/// Adapters are normally registered before the server starts; observers may
/// be added at any time, including while requests are being dispatched.
/// Providers are kept in name order, which is also the order in which
/// predicates are evaluated.
#[derive(Default)]
pub struct Registry {
    entries: RwLock<BTreeMap<String, AdapterEntry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `adapter` under `name`.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateProvider`] if `name` is taken; the
    /// existing registration is left untouched.
    pub fn register<A>(&self, name: impl Into<String>, adapter: A) -> Result<(), RegistryError>
    where
        A: ProviderAdapter + 'static,
    {
        self.register_shared(name, Arc::new(adapter))
    }

    /// Registers an adapter that is already shared.
    pub fn register_shared(
        &self,
        name: impl Into<String>,
        adapter: Arc<dyn ProviderAdapter>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let mut entries = self.write();

        if entries.contains_key(&name) {
            return Err(RegistryError::DuplicateProvider(name));
        }

        tracing::debug!(provider = %name, spec = %adapter.match_spec(), "Provider registered");
        entries.insert(
            name,
            AdapterEntry {
                adapter,
                observers: Vec::new(),
            },
        );

        Ok(())
    }

    /// Adds `observer` to every registered provider.
    ///
    /// Providers registered afterwards do not receive it.
    pub fn subscribe(&self, observer: impl Into<Observer>) {
        let observer = observer.into();
        let mut entries = self.write();

        if entries.is_empty() {
            tracing::warn!("Observer subscribed before any provider was registered");
        }

        for entry in entries.values_mut() {
            entry.observers.push(observer.clone());
        }
    }

    /// Adds `observer` to the provider registered under `name` only.
    ///
    /// # Errors
    /// Returns [`RegistryError::UnknownProvider`] if `name` is not registered.
    pub fn subscribe_to(&self, name: &str, observer: impl Into<Observer>) -> Result<(), RegistryError> {
        let mut entries = self.write();
        let entry = entries
            .get_mut(name)
            .ok_or_else(|| RegistryError::UnknownProvider(name.to_string()))?;
        entry.observers.push(observer.into());
        Ok(())
    }

    /// Closure form of [`subscribe`](Registry::subscribe).
    pub fn subscribe_fn<F>(&self, f: F)
    where
        F: Fn(&str, &SharedNotification) + Send + Sync + 'static,
    {
        self.subscribe(Observer::func(f));
    }

    /// Closure form of [`subscribe_to`](Registry::subscribe_to).
    pub fn subscribe_fn_to<F>(&self, name: &str, f: F) -> Result<(), RegistryError>
    where
        F: Fn(&str, &SharedNotification) + Send + Sync + 'static,
    {
        self.subscribe_to(name, Observer::func(f))
    }

    /// Registered provider names in evaluation order.
    pub fn providers(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Number of observers attached to `name`, if registered.
    pub fn observer_count(&self, name: &str) -> Option<usize> {
        self.read().get(name).map(|entry| entry.observers.len())
    }

    /// Finds the first provider, in name order, whose adapter claims `request`.
    pub(crate) fn route(&self, request: &WebhookRequest) -> RouteMatch {
        let entries = self.read();
        let mut route = None;
        let mut shadowed = Vec::new();

        for (name, entry) in entries.iter() {
            if !entry.adapter.recognize(request) {
                continue;
            }

            if route.is_none() {
                route = Some(Route {
                    provider: name.clone(),
                    adapter: Arc::clone(&entry.adapter),
                    observers: entry.observers.clone(),
                });
            } else {
                shadowed.push(name.clone());
            }
        }

        RouteMatch { route, shadowed }
    }

    // Writers never leave an entry half-updated; poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, AdapterEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, AdapterEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("providers", &self.providers())
            .finish()
    }
}

//! Lazy, memoized access to the plugin registry.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;

use super::{discovery::PluginDiscovery, error::PluginError, registry::PluginRegistry};

/// Builds the [`PluginRegistry`] on first use and hands out the same snapshot
/// afterwards.
///
/// Readers load the current snapshot without locking. Builds are serialized,
/// and a failed build is not cached, so a misconfigured registry keeps
/// failing until the configuration is corrected and the cache invalidated.
pub struct RegistryCache {
    discovery: Arc<dyn PluginDiscovery>,
    locations: Vec<String>,
    current: ArcSwapOption<PluginRegistry>,
    build_lock: Mutex<()>,
}

impl RegistryCache {
    /// Creates an empty cache. Nothing is discovered until [`get`](Self::get).
    pub fn new(discovery: Arc<dyn PluginDiscovery>, locations: Vec<String>) -> Self {
        Self {
            discovery,
            locations,
            current: ArcSwapOption::empty(),
            build_lock: Mutex::new(()),
        }
    }

    /// The locations walked after the built-ins.
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Returns the registry, building it if this is the first call.
    pub fn get(&self) -> Result<Arc<PluginRegistry>, PluginError> {
        if let Some(registry) = self.current.load_full() {
            return Ok(registry);
        }

        let _guard = self
            .build_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(registry) = self.current.load_full() {
            return Ok(registry);
        }

        tracing::debug!(locations = ?self.locations, "Building plugin registry.");
        let registry = Arc::new(PluginRegistry::build(self.discovery.as_ref(), &self.locations)?);
        self.current.store(Some(Arc::clone(&registry)));
        Ok(registry)
    }

    /// Drops the cached registry; the next [`get`](Self::get) rebuilds it.
    /// Only call this while no run is using the registry.
    pub fn invalidate(&self) {
        tracing::info!("Plugin registry invalidated.");
        self.current.store(None);
    }

    /// Whether a registry is currently cached.
    pub fn is_built(&self) -> bool {
        self.current.load().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        plugins::discovery::{MockPluginDiscovery, StaticDiscovery},
        test_helpers::noop_validator_registration,
    };

    #[test]
    fn test_registry_is_built_once() {
        let mut discovery = MockPluginDiscovery::new();
        discovery
            .expect_discover()
            .times(1)
            .returning(|_| Ok(vec![noop_validator_registration("always_pass", "custom")]));
        let cache = RegistryCache::new(Arc::new(discovery), vec!["custom".to_string()]);

        let first = cache.get().unwrap();
        let second = cache.get().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.names(crate::plugins::PluginKind::Validator).len(), 3);
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let mut discovery = MockPluginDiscovery::new();
        discovery
            .expect_discover()
            .times(2)
            .returning(|_| Ok(vec![]));
        let cache = RegistryCache::new(Arc::new(discovery), vec!["custom".to_string()]);

        let first = cache.get().unwrap();
        cache.invalidate();
        assert!(!cache.is_built());
        let second = cache.get().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let discovery = StaticDiscovery::new()
            .with(noop_validator_registration("dup", "a"))
            .with(noop_validator_registration("dup", "b"));
        let cache = RegistryCache::new(Arc::new(discovery), vec!["a".into(), "b".into()]);

        assert!(matches!(cache.get(), Err(PluginError::DuplicateRegistration { .. })));
        assert!(!cache.is_built());
        assert!(matches!(cache.get(), Err(PluginError::DuplicateRegistration { .. })));
    }

    #[test]
    fn test_concurrent_readers_share_one_build() {
        let mut discovery = MockPluginDiscovery::new();
        discovery
            .expect_discover()
            .times(1)
            .returning(|_| Ok(vec![]));
        let cache = Arc::new(RegistryCache::new(Arc::new(discovery), vec!["custom".into()]));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get().map(|_| ()))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
    }
}

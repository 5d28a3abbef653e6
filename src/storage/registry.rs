//! Backend registry.
//!
//! Maps each backend type tag to a constructor and caches one live backend
//! per descriptor.

use crate::core::{Error, Result};
use crate::storage::backend::StorageBackend;
use crate::storage::backends::{ElasticsearchBackend, LocalBackend, NullBackend, ObjectStoreBackend};
use crate::storage::descriptor::{BackendDescriptor, BackendKind, BackendType, DescriptorId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Builds a backend for a descriptor.
pub type BackendConstructor =
    Arc<dyn Fn(&BackendDescriptor) -> Result<Arc<dyn StorageBackend>> + Send + Sync>;

/// Registry of backend constructors and live instances.
pub struct BackendRegistry {
    /// Constructors keyed by type tag
    constructors: HashMap<BackendType, BackendConstructor>,
    /// Live backends keyed by descriptor
    instances: RwLock<HashMap<DescriptorId, Arc<dyn StorageBackend>>>,
}

impl BackendRegistry {
    /// Create a registry with no constructors.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry with every built-in backend registered.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        for backend_type in BackendType::ALL {
            match backend_type.kind() {
                BackendKind::Local => {
                    registry.register(backend_type, |_| {
                        Ok(Arc::new(LocalBackend::new()) as Arc<dyn StorageBackend>)
                    });
                }
                BackendKind::Null => {
                    registry.register(backend_type, |_| {
                        Ok(Arc::new(NullBackend) as Arc<dyn StorageBackend>)
                    });
                }
                BackendKind::SearchEngine => {
                    registry.register(backend_type, |d| {
                        Ok(Arc::new(ElasticsearchBackend::from_descriptor(d)?) as Arc<dyn StorageBackend>)
                    });
                }
                BackendKind::ObjectStore => {
                    registry.register(backend_type, |d| {
                        Ok(Arc::new(ObjectStoreBackend::from_descriptor(d)?) as Arc<dyn StorageBackend>)
                    });
                }
            }
        }
        registry
    }

    /// Register (or replace) the constructor for a type.
    pub fn register<F>(&mut self, backend_type: BackendType, constructor: F)
    where
        F: Fn(&BackendDescriptor) -> Result<Arc<dyn StorageBackend>> + Send + Sync + 'static,
    {
        self.constructors.insert(backend_type, Arc::new(constructor));
    }

    /// Whether a constructor exists for a type.
    pub fn supports(&self, backend_type: BackendType) -> bool {
        self.constructors.contains_key(&backend_type)
    }

    /// Bind an already-built backend to a descriptor.
    pub fn attach(&self, id: &DescriptorId, backend: Arc<dyn StorageBackend>) -> Result<()> {
        let mut instances = self.instances.write().map_err(|_| Error::poisoned("backend instances"))?;
        instances.insert(id.clone(), backend);
        Ok(())
    }

    /// Get the live backend for a descriptor, constructing it on first use.
    pub fn resolve(&self, descriptor: &BackendDescriptor) -> Result<Arc<dyn StorageBackend>> {
        {
            let instances = self.instances.read().map_err(|_| Error::poisoned("backend instances"))?;
            if let Some(backend) = instances.get(&descriptor.id) {
                return Ok(backend.clone());
            }
        }

        let constructor = self.constructors.get(&descriptor.backend_type).ok_or_else(|| {
            Error::Config(format!("No backend registered for type {}", descriptor.backend_type))
        })?;
        let built = constructor(descriptor)?;

        let mut instances = self.instances.write().map_err(|_| Error::poisoned("backend instances"))?;
        Ok(instances
            .entry(descriptor.id.clone())
            .or_insert(built)
            .clone())
    }

    /// Drop the live backend of a descriptor (after delete or settings change).
    pub fn evict(&self, id: &DescriptorId) -> Result<bool> {
        let mut instances = self.instances.write().map_err(|_| Error::poisoned("backend instances"))?;
        Ok(instances.remove(id).is_some())
    }

    /// Number of live backends.
    pub fn live_count(&self) -> usize {
        self.instances.read().map(|i| i.len()).unwrap_or(0)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::descriptor::StorageFamily;

    #[test]
    fn test_builtin_supports_all_types() {
        let registry = BackendRegistry::with_builtin();
        for backend_type in BackendType::ALL {
            assert!(registry.supports(backend_type), "{} missing", backend_type);
        }
    }

    #[test]
    fn test_resolve_caches_instance() {
        let registry = BackendRegistry::with_builtin();
        let d = BackendDescriptor::new("default", BackendType::Server, StorageFamily::Command);

        let first = registry.resolve(&d).unwrap();
        let second = registry.resolve(&d).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.live_count(), 1);

        assert!(registry.evict(&d.id).unwrap());
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_resolve_by_type() {
        let registry = BackendRegistry::with_builtin();
        let es = BackendDescriptor::new("es", BackendType::Elasticsearch, StorageFamily::Command);
        assert_eq!(registry.resolve(&es).unwrap().backend_type(), BackendType::Elasticsearch);

        let cos = BackendDescriptor::new("cos", BackendType::Cos, StorageFamily::Replay);
        assert_eq!(registry.resolve(&cos).unwrap().backend_type(), BackendType::Cos);
    }

    #[test]
    fn test_resolve_config_error_not_cached() {
        let registry = BackendRegistry::with_builtin();
        let d = BackendDescriptor::new("es", BackendType::Elasticsearch, StorageFamily::Command)
            .with_meta("index", "");
        assert!(registry.resolve(&d).is_err());
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_unregistered_type() {
        let registry = BackendRegistry::empty();
        let d = BackendDescriptor::new("default", BackendType::Server, StorageFamily::Command);
        assert!(matches!(registry.resolve(&d), Err(Error::Config(_))));
    }

    #[test]
    fn test_attach_overrides_constructor() {
        let registry = BackendRegistry::empty();
        let d = BackendDescriptor::new("local", BackendType::Server, StorageFamily::Command);
        registry.attach(&d.id, Arc::new(LocalBackend::new())).unwrap();
        assert!(registry.resolve(&d).is_ok());
    }
}

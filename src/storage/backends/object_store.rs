//! Object store backend.
//!
//! One implementation for every S3-like service (s3, oss, azure, swift, ceph,
//! cos, obs); records are stored as objects keyed by day and session.

use crate::core::{Error, Result};
use crate::storage::backend::{ResultWindow, StorageBackend};
use crate::storage::config::{from_meta, ObjectStoreConfig};
use crate::storage::descriptor::{BackendDescriptor, BackendKind, BackendType};
use crate::storage::filter::CommandFilter;
use crate::storage::record::CommandRecord;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Backend archiving records into a bucket.
pub struct ObjectStoreBackend {
    backend_type: BackendType,
    config: ObjectStoreConfig,
    objects: RwLock<BTreeMap<String, CommandRecord>>,
    reachable: AtomicBool,
}

impl ObjectStoreBackend {
    /// Create a new object store backend.
    pub fn new(backend_type: BackendType, config: ObjectStoreConfig) -> Result<Self> {
        if backend_type.kind() != BackendKind::ObjectStore {
            return Err(Error::Config(format!(
                "{} is not an object store type",
                backend_type
            )));
        }
        config.validate()?;
        Ok(Self {
            backend_type,
            config,
            objects: RwLock::new(BTreeMap::new()),
            reachable: AtomicBool::new(true),
        })
    }

    /// Build from a descriptor's settings.
    pub fn from_descriptor(descriptor: &BackendDescriptor) -> Result<Self> {
        Self::new(descriptor.backend_type, from_meta(descriptor)?)
    }

    /// Get bucket name.
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    /// Simulate the endpoint going down or coming back.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Keys currently stored, in order.
    pub fn keys(&self) -> Result<Vec<String>> {
        let objects = self.objects.read().map_err(|_| Error::poisoned("objects"))?;
        Ok(objects.keys().cloned().collect())
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::ProbeFailed(format!(
                "Endpoint unreachable: {}",
                self.config.endpoint
            )))
        }
    }
}

#[async_trait]
impl StorageBackend for ObjectStoreBackend {
    async fn record(&self, record: CommandRecord) -> Result<()> {
        self.ensure_reachable()?;
        if !self.config.has_credentials() {
            return Err(Error::Persistence(format!(
                "Access denied to bucket {}",
                self.config.bucket
            )));
        }
        let mut objects = self.objects.write().map_err(|_| Error::poisoned("objects"))?;
        objects.insert(record.object_key(), record);
        Ok(())
    }

    async fn query(&self, filter: &CommandFilter, limit: usize) -> Result<Vec<CommandRecord>> {
        self.ensure_reachable()?;
        let objects = self.objects.read().map_err(|_| Error::poisoned("objects"))?;
        Ok(objects
            .values()
            .filter(|r| filter.matches(r))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &CommandFilter, _window: ResultWindow) -> Result<u64> {
        self.ensure_reachable()?;
        let objects = self.objects.read().map_err(|_| Error::poisoned("objects"))?;
        Ok(objects.values().filter(|r| filter.matches(r)).count() as u64)
    }

    fn backend_type(&self) -> BackendType {
        self.backend_type
    }

    async fn health_check(&self) -> Result<bool> {
        self.ensure_reachable()?;
        Ok(self.config.has_credentials())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_credentials() -> ObjectStoreConfig {
        ObjectStoreConfig {
            endpoint: "https://s3.internal".to_string(),
            access_key: "AK".to_string(),
            secret_key: "SK".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_non_object_type() {
        let result = ObjectStoreBackend::new(BackendType::Elasticsearch, with_credentials());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_record_and_count() {
        let backend = ObjectStoreBackend::new(BackendType::S3, with_credentials()).unwrap();
        backend.record(CommandRecord::new("org-a", "s-1", "ls")).await.unwrap();
        backend.record(CommandRecord::new("org-b", "s-2", "ls")).await.unwrap();

        let mut filter = CommandFilter::new();
        filter.org_id = Some(crate::core::OrgId::new("org-a"));
        assert_eq!(backend.count(&filter, ResultWindow::Default).await.unwrap(), 1);
        assert_eq!(backend.keys().unwrap().len(), 2);
        assert_eq!(backend.backend_type(), BackendType::S3);
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let backend = ObjectStoreBackend::new(BackendType::Oss, ObjectStoreConfig::default()).unwrap();
        assert!(!backend.health_check().await.unwrap());
        assert!(backend.record(CommandRecord::new("org-a", "s-1", "ls")).await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable() {
        let backend = ObjectStoreBackend::new(BackendType::Azure, with_credentials()).unwrap();
        backend.set_reachable(false);
        assert!(matches!(backend.health_check().await, Err(Error::ProbeFailed(_))));
    }
}

//! Storage operations exposed to the boundary layer.

use crate::config::ProbeConfig;
use crate::core::{Result, Scope};
use crate::storage::count::CountStrategy;
use crate::storage::descriptor::{BackendDescriptor, DescriptorId, StorageFamily};
use crate::storage::filter::FilterParams;
use crate::storage::guard::{DeleteOutcome, DeletionGuard};
use crate::storage::probe::{ConnectivityProbe, ConnectivityReport};
use crate::storage::record::CommandRecord;
use crate::storage::registry::BackendRegistry;
use crate::storage::store::DescriptorStore;
use crate::storage::tree::{TreeBuilder, TreeNode};
use crate::storage::validity::ValidityChecker;
use std::sync::Arc;
use tracing::info;

/// Facade over descriptors, backends and the policies around them.
pub struct StorageService {
    store: Arc<DescriptorStore>,
    registry: Arc<BackendRegistry>,
    guard: DeletionGuard,
    tree: TreeBuilder,
    probe: ConnectivityProbe,
}

impl StorageService {
    /// Create a service.
    pub fn new(
        store: Arc<DescriptorStore>,
        registry: Arc<BackendRegistry>,
        guard: DeletionGuard,
        config: &ProbeConfig,
    ) -> Self {
        let checker = ValidityChecker::new(registry.clone(), config.probe_timeout());
        let counter = CountStrategy::new(registry.clone(), config.count_timeout());
        Self {
            store,
            registry,
            guard,
            tree: TreeBuilder::new(checker.clone(), counter),
            probe: ConnectivityProbe::new(checker),
        }
    }

    /// Descriptor store.
    pub fn store(&self) -> &Arc<DescriptorStore> {
        &self.store
    }

    /// Backend registry.
    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    /// Add a descriptor.
    pub fn create_descriptor(&self, descriptor: BackendDescriptor) -> Result<BackendDescriptor> {
        let created = self.store.create(descriptor)?;
        info!(storage = %created.label(), family = %created.family, "storage created");
        Ok(created)
    }

    /// Descriptors a user may pick in a family.
    pub fn list_descriptors(&self, family: StorageFamily) -> Result<Vec<BackendDescriptor>> {
        self.store.list_selectable(family)
    }

    /// Replace a descriptor's settings; the live backend is rebuilt on next use.
    pub fn update_settings(
        &self,
        id: &DescriptorId,
        meta: serde_json::Map<String, serde_json::Value>,
    ) -> Result<BackendDescriptor> {
        let updated = self.store.update_meta(id, meta)?;
        self.registry.evict(id)?;
        Ok(updated)
    }

    /// Store a command record through a descriptor's backend.
    pub async fn record(&self, id: &DescriptorId, record: CommandRecord) -> Result<()> {
        let descriptor = self.store.get(id)?;
        self.registry.resolve(&descriptor)?.record(record).await
    }

    /// Tree of a family's storages with per-storage record counts.
    pub async fn tree(
        &self,
        scope: &Scope,
        family: StorageFamily,
        params: &FilterParams,
    ) -> Result<Vec<TreeNode>> {
        let descriptors = self.store.list(family)?;
        self.tree.build(scope, family, &descriptors, params).await
    }

    /// Connectivity test of one storage.
    pub async fn test_connective(&self, id: &DescriptorId) -> Result<ConnectivityReport> {
        let descriptor = self.store.get(id)?;
        Ok(self.probe.probe(&descriptor).await)
    }

    /// Delete a storage unless it is protected or in use.
    pub fn delete_descriptor(&self, id: &DescriptorId) -> Result<DeleteOutcome> {
        let outcome = self.store.remove_guarded(id, &self.guard)?;
        match &outcome {
            DeleteOutcome::Deleted => {
                self.registry.evict(id)?;
                info!(storage = %id, "storage deleted");
            }
            DeleteOutcome::Refused(reason) => {
                info!(storage = %id, %reason, "storage deletion refused");
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use crate::storage::backends::ElasticsearchBackend;
    use crate::storage::config::EsConfig;
    use crate::storage::descriptor::BackendType;
    use crate::storage::guard::{RefusalReason, StorageAssignments};
    use crate::storage::probe::TEST_FAILURE;

    fn service(assignments: Arc<StorageAssignments>) -> StorageService {
        let store = Arc::new(DescriptorStore::new());
        let config = ProbeConfig {
            probe_timeout_ms: 100,
            count_timeout_ms: 100,
        };
        StorageService::new(
            store,
            Arc::new(BackendRegistry::with_builtin()),
            DeletionGuard::new().with_lookup(assignments),
            &config,
        )
    }

    #[tokio::test]
    async fn test_default_plus_failing_search_engine() {
        let service = service(Arc::new(StorageAssignments::new()));
        let local = service
            .create_descriptor(
                BackendDescriptor::new("default", BackendType::Server, StorageFamily::Command)
                    .with_id("1")
                    .as_default(),
            )
            .unwrap();
        let es = service
            .create_descriptor(
                BackendDescriptor::new("es", BackendType::Elasticsearch, StorageFamily::Command)
                    .with_id("2"),
            )
            .unwrap();

        let dead = Arc::new(ElasticsearchBackend::new(EsConfig::default()).unwrap());
        dead.set_reachable(false);
        service.registry().attach(&es.id, dead).unwrap();

        service
            .record(&local.id, CommandRecord::new("org-a", "s-1", "whoami"))
            .await
            .unwrap();

        let nodes = service
            .tree(&Scope::Root, StorageFamily::Command, &FilterParams::new())
            .await
            .unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].id, "1");
        assert_eq!(nodes[0].valid, Some(true));
        assert!(nodes[0].name.ends_with("(1)"));
        assert_eq!(nodes[1].id, "2");
        assert_eq!(nodes[1].valid, Some(false));
        assert!(nodes[2].is_root());

        assert_eq!(
            service.delete_descriptor(&local.id).unwrap(),
            DeleteOutcome::Refused(RefusalReason::ProtectedDefault)
        );
        assert_eq!(service.delete_descriptor(&es.id).unwrap(), DeleteOutcome::Deleted);
        assert!(service.store().get(&es.id).is_err());
        assert_eq!(service.registry().live_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_in_use() {
        let assignments = Arc::new(StorageAssignments::new());
        let service = service(assignments.clone());
        let es = service
            .create_descriptor(BackendDescriptor::new(
                "es",
                BackendType::Elasticsearch,
                StorageFamily::Command,
            ))
            .unwrap();

        assignments.assign("org-default", StorageFamily::Command, "es").unwrap();
        assert_eq!(
            service.delete_descriptor(&es.id).unwrap(),
            DeleteOutcome::Refused(RefusalReason::InUse)
        );

        assignments.release("org-default", StorageFamily::Command).unwrap();
        assert_eq!(service.delete_descriptor(&es.id).unwrap(), DeleteOutcome::Deleted);
    }

    #[tokio::test]
    async fn test_test_connective() {
        let service = service(Arc::new(StorageAssignments::new()));
        let es = service
            .create_descriptor(BackendDescriptor::new(
                "es",
                BackendType::Elasticsearch,
                StorageFamily::Command,
            ))
            .unwrap();
        assert!(service.test_connective(&es.id).await.unwrap().is_valid);

        let mut meta = serde_json::Map::new();
        meta.insert("hosts".to_string(), serde_json::json!([]));
        service.update_settings(&es.id, meta).unwrap();

        let report = service.test_connective(&es.id).await.unwrap();
        assert!(!report.is_valid);
        assert!(report.msg.starts_with(TEST_FAILURE));
    }

    #[tokio::test]
    async fn test_unknown_descriptor() {
        let service = service(Arc::new(StorageAssignments::new()));
        let missing = DescriptorId::new("missing");
        assert!(matches!(service.test_connective(&missing).await, Err(Error::NotFound(_))));
        assert!(matches!(service.delete_descriptor(&missing), Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_bad_filter_surfaces() {
        let service = service(Arc::new(StorageAssignments::new()));
        let mut params = FilterParams::new();
        params.insert("risk_level".to_string(), "severe".to_string());
        let result = service.tree(&Scope::Root, StorageFamily::Command, &params).await;
        assert!(matches!(result, Err(Error::InvalidFilter { .. })));
    }

    #[tokio::test]
    async fn test_replay_tree_with_system_defaults() {
        let store = Arc::new(DescriptorStore::with_system_defaults().unwrap());
        let service = StorageService::new(
            store,
            Arc::new(BackendRegistry::with_builtin()),
            DeletionGuard::new(),
            &ProbeConfig::default(),
        );
        service
            .create_descriptor(
                BackendDescriptor::new("archive", BackendType::S3, StorageFamily::Replay)
                    .with_meta("access_key", "AK")
                    .with_meta("secret_key", "SK"),
            )
            .unwrap();

        let nodes = service
            .tree(&Scope::Root, StorageFamily::Replay, &FilterParams::new())
            .await
            .unwrap();
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["default(server)(0)", "archive(s3)(0)", "Replay storages"]);
        assert_eq!(service.list_descriptors(StorageFamily::Replay).unwrap().len(), 2);
    }
}

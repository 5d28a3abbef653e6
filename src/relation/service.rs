//! Relation operations exposed to the boundary layer.

use crate::core::{Result, Scope};
use crate::relation::aggregator::RelationChangeAggregator;
use crate::relation::row::{NewRelation, RelationFamily};
use crate::relation::store::{RelationStore, RelationView};
use crate::relation::subscriber::SubscriberRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Result of a bulk attach.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachOutcome {
    /// Rows persisted
    pub rows_created: usize,
    /// Change events emitted
    pub events_emitted: usize,
}

/// Relation service.
pub struct RelationService {
    store: Arc<RelationStore>,
    aggregator: RelationChangeAggregator,
}

impl RelationService {
    /// Create a service.
    pub fn new(store: Arc<RelationStore>, subscribers: Arc<SubscriberRegistry>) -> Self {
        Self {
            store,
            aggregator: RelationChangeAggregator::new(subscribers),
        }
    }

    /// Relation store.
    pub fn store(&self) -> &Arc<RelationStore> {
        &self.store
    }

    /// Subscriber registry.
    pub fn subscribers(&self) -> &Arc<SubscriberRegistry> {
        self.aggregator.subscribers()
    }

    /// Persist rows, then notify subscribers once per parent.
    pub fn attach_rows(
        &self,
        scope: &Scope,
        family: RelationFamily,
        relations: Vec<NewRelation>,
    ) -> Result<AttachOutcome> {
        let rows = self.store.bulk_create(scope, family, relations)?;
        let events = self.aggregator.emit_changes(&rows);
        info!(%family, rows = rows.len(), events, "relations attached");
        Ok(AttachOutcome {
            rows_created: rows.len(),
            events_emitted: events,
        })
    }

    /// Attach every child to every parent.
    pub fn attach(
        &self,
        scope: &Scope,
        family: RelationFamily,
        parent_ids: &[String],
        child_ids: &[String],
    ) -> Result<AttachOutcome> {
        let relations = parent_ids
            .iter()
            .flat_map(|parent| {
                child_ids
                    .iter()
                    .map(move |child| NewRelation::new(parent, child))
            })
            .collect();
        self.attach_rows(scope, family, relations)
    }

    /// Rows of a family visible to `scope`.
    pub fn list(&self, scope: &Scope, family: RelationFamily) -> Result<Vec<RelationView>> {
        self.store.list(scope, family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::row::CredentialProfile;
    use crate::relation::subscriber::tests::Recorder;
    use std::collections::BTreeSet;

    fn service() -> (RelationService, Arc<Recorder>) {
        let store = Arc::new(RelationStore::new());
        for (id, org) in [("A", "org-a"), ("B", "org-a"), ("C", "org-b")] {
            store
                .register_profile(CredentialProfile::new(id, org, id, "root"))
                .unwrap();
        }
        let subscribers = Arc::new(SubscriberRegistry::new());
        let recorder = Recorder::new("perms");
        subscribers.subscribe(recorder.clone()).unwrap();
        (RelationService::new(store, subscribers), recorder)
    }

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_attach_rows_emits_per_parent() {
        let (service, recorder) = service();
        let outcome = service
            .attach_rows(
                &Scope::Root,
                RelationFamily::SystemUserAsset,
                vec![
                    NewRelation::new("A", "1"),
                    NewRelation::new("A", "2"),
                    NewRelation::new("A", "1"),
                    NewRelation::new("B", "3"),
                ],
            )
            .unwrap();
        assert_eq!(
            outcome,
            AttachOutcome {
                rows_created: 4,
                events_emitted: 2
            }
        );

        let events = recorder.received();
        assert_eq!(events[0].parent, "A");
        assert_eq!(events[0].child_ids, ids(&["1", "2"]));
        assert_eq!(events[1].parent, "B");
        assert_eq!(events[1].child_ids, ids(&["3"]));
    }

    #[test]
    fn test_failed_persistence_emits_nothing() {
        let (service, recorder) = service();
        let result = service.attach_rows(
            &Scope::org("org-a"),
            RelationFamily::SystemUserAsset,
            vec![NewRelation::new("A", "1"), NewRelation::new("C", "2")],
        );
        assert!(result.is_err());
        assert!(recorder.received().is_empty());
        assert!(service.store().is_empty());
    }

    #[test]
    fn test_attach_cross_product() {
        let (service, recorder) = service();
        let parents = vec!["A".to_string(), "B".to_string()];
        let children = vec!["n-1".to_string(), "n-2".to_string()];
        let outcome = service
            .attach(&Scope::org("org-a"), RelationFamily::SystemUserNode, &parents, &children)
            .unwrap();
        assert_eq!(outcome.rows_created, 4);
        assert_eq!(outcome.events_emitted, 2);
        assert!(recorder
            .received()
            .iter()
            .all(|e| e.child_ids == ids(&["n-1", "n-2"])));

        let listed = service.list(&Scope::org("org-a"), RelationFamily::SystemUserNode).unwrap();
        assert_eq!(listed.len(), 4);
        assert_eq!(listed[0].parent_display, "A(root)");
    }

    #[test]
    fn test_empty_attach() {
        let (service, recorder) = service();
        let outcome = service
            .attach(&Scope::Root, RelationFamily::SystemUserUser, &[], &[])
            .unwrap();
        assert_eq!(outcome.rows_created, 0);
        assert_eq!(outcome.events_emitted, 0);
        assert!(recorder.received().is_empty());
    }
}

//! Bulk-attach change aggregation.
//!
//! A bulk attach produces many rows; subscribers get one `post_add` event
//! per parent with that parent's children collapsed into a set.

use crate::relation::event::ChangeEvent;
use crate::relation::row::{RelationFamily, RelationRow};
use crate::relation::subscriber::SubscriberRegistry;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Group rows into one event per (family, parent), in first-seen order.
pub fn group_rows(rows: &[RelationRow]) -> Vec<ChangeEvent> {
    let mut order: Vec<(RelationFamily, &str)> = Vec::new();
    let mut groups: HashMap<(RelationFamily, &str), BTreeSet<String>> = HashMap::new();

    for row in rows {
        let key = (row.family, row.parent_id.as_str());
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                BTreeSet::new()
            })
            .insert(row.child_id.clone());
    }

    order
        .into_iter()
        .filter_map(|key| {
            groups
                .remove(&key)
                .map(|children| ChangeEvent::post_add(key.0, key.1, children))
        })
        .collect()
}

/// Emits change events for freshly persisted rows.
#[derive(Clone)]
pub struct RelationChangeAggregator {
    subscribers: Arc<SubscriberRegistry>,
}

impl RelationChangeAggregator {
    /// Create an aggregator delivering to `subscribers`.
    pub fn new(subscribers: Arc<SubscriberRegistry>) -> Self {
        Self { subscribers }
    }

    /// Subscribers events are delivered to.
    pub fn subscribers(&self) -> &Arc<SubscriberRegistry> {
        &self.subscribers
    }

    /// Emit one event per distinct parent. Returns the number of events.
    pub fn emit_changes(&self, rows: &[RelationRow]) -> usize {
        let events = group_rows(rows);
        for event in &events {
            debug!(
                sender = %event.sender,
                parent = %event.parent,
                children = event.child_ids.len(),
                "relation changed, notifying subscribers"
            );
            let report = self.subscribers.notify(event);
            if !report.failed.is_empty() {
                info!(parent = %event.parent, failed = ?report.failed, "relation event partially delivered");
            }
        }
        events.len()
    }
}

//! Relation change events.

use crate::relation::row::{ChildKind, RelationFamily};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What happened to the relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    /// Children were attached
    PostAdd,
}

/// One parent's share of a bulk attach.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Relation table that changed
    pub sender: RelationFamily,
    /// Profile ID
    pub parent: String,
    /// Action
    pub action: ChangeAction,
    /// Whether the change was made from the child side
    pub reverse: bool,
    /// Kind of the attached objects
    pub child_kind: ChildKind,
    /// Attached object IDs, deduplicated
    pub child_ids: BTreeSet<String>,
}

impl ChangeEvent {
    /// Attach event for one parent.
    pub fn post_add(sender: RelationFamily, parent: &str, child_ids: BTreeSet<String>) -> Self {
        Self {
            sender,
            parent: parent.to_string(),
            action: ChangeAction::PostAdd,
            reverse: false,
            child_kind: sender.child_kind(),
            child_ids,
        }
    }
}

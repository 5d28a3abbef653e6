//! Storage tree view.
//!
//! Flat list of nodes linked by `id`/`pId`, shaped for a tree widget: one
//! node per storage under a synthetic root.

use crate::core::{Result, Scope};
use crate::storage::count::CountStrategy;
use crate::storage::descriptor::{BackendDescriptor, StorageFamily};
use crate::storage::filter::{CommandFilter, FilterParams};
use crate::storage::validity::ValidityChecker;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// ID of the synthetic root node.
pub const ROOT_ID: &str = "root";
/// Marker appended to storages that failed their probe.
pub const INVALID_MARKER: &str = "Invalid";

/// A node of the storage tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Descriptor ID, or `root`
    pub id: String,
    /// Display name (includes count or invalid marker)
    pub name: String,
    /// Tooltip title
    pub title: String,
    /// Parent node ID; empty for the root
    #[serde(rename = "pId")]
    pub p_id: String,
    /// Whether the node has children
    pub is_parent: bool,
    /// Expanded by default
    pub open: bool,
    /// Probe outcome; absent on the root
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub valid: Option<bool>,
}

impl TreeNode {
    fn storage(descriptor: &BackendDescriptor, name: String, valid: bool) -> Self {
        Self {
            id: descriptor.id.to_string(),
            name,
            title: descriptor.label(),
            p_id: ROOT_ID.to_string(),
            is_parent: false,
            open: false,
            valid: Some(valid),
        }
    }

    /// Node of a usable storage, showing its record count.
    pub fn valid(descriptor: &BackendDescriptor, count: u64) -> Self {
        Self::storage(descriptor, format!("{}({})", descriptor.label(), count), true)
    }

    /// Node of a storage that failed its probe.
    pub fn invalid(descriptor: &BackendDescriptor) -> Self {
        Self::storage(
            descriptor,
            format!("{} *{}", descriptor.label(), INVALID_MARKER),
            false,
        )
    }

    /// The synthetic root.
    pub fn root(family: StorageFamily) -> Self {
        Self {
            id: ROOT_ID.to_string(),
            name: family.root_label().to_string(),
            title: family.root_label().to_string(),
            p_id: String::new(),
            is_parent: true,
            open: true,
            valid: None,
        }
    }

    /// Whether this is the synthetic root.
    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }
}

/// Builds the storage tree.
#[derive(Clone)]
pub struct TreeBuilder {
    checker: ValidityChecker,
    counter: CountStrategy,
}

impl TreeBuilder {
    /// Create a tree builder.
    pub fn new(checker: ValidityChecker, counter: CountStrategy) -> Self {
        Self { checker, counter }
    }

    /// Build the tree for the descriptors of `family`.
    ///
    /// Returns valid nodes, then invalid nodes, then the root. A malformed
    /// filter fails the whole build before any backend is contacted.
    pub async fn build(
        &self,
        scope: &Scope,
        family: StorageFamily,
        descriptors: &[BackendDescriptor],
        params: &FilterParams,
    ) -> Result<Vec<TreeNode>> {
        let filter = CommandFilter::from_params(params)?.scoped(scope);

        let evaluations = descriptors
            .iter()
            .filter(|d| d.family == family && !d.is_null())
            .map(|d| self.evaluate(d, &filter));
        let outcomes = join_all(evaluations).await;

        let mut valid = Vec::new();
        let mut invalid = Vec::new();
        for (descriptor, count) in outcomes {
            match count {
                Some(count) => valid.push(TreeNode::valid(descriptor, count)),
                None => invalid.push(TreeNode::invalid(descriptor)),
            }
        }
        debug!(
            %family,
            valid = valid.len(),
            invalid = invalid.len(),
            "built storage tree"
        );

        let mut nodes = valid;
        nodes.extend(invalid);
        nodes.push(TreeNode::root(family));
        Ok(nodes)
    }

    /// Probe, then count only if the probe passed.
    async fn evaluate<'a>(
        &self,
        descriptor: &'a BackendDescriptor,
        filter: &CommandFilter,
    ) -> (&'a BackendDescriptor, Option<u64>) {
        if !self.checker.is_valid(descriptor).await {
            return (descriptor, None);
        }
        match self.counter.count(descriptor, filter).await {
            Ok(count) => (descriptor, Some(count)),
            Err(e) => {
                warn!(storage = %descriptor.label(), error = %e, "count failed, marking storage invalid");
                (descriptor, None)
            }
        }
    }
}

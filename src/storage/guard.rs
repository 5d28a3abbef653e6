//! Deletion policy for backend descriptors.
//!
//! System backends are never deletable; other backends are deletable only
//! while no consumer selects them.

use crate::core::Error;
use crate::storage::descriptor::{BackendDescriptor, StorageFamily};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Why a deletion was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefusalReason {
    /// Null sentinel, family default, or local server storage
    ProtectedDefault,
    /// Selected by at least one active consumer
    InUse,
}

impl RefusalReason {
    /// Reason code for the boundary layer.
    pub fn code(&self) -> &'static str {
        match self {
            RefusalReason::ProtectedDefault => "protected-default",
            RefusalReason::InUse => "in-use",
        }
    }

    /// User-facing message.
    pub fn message(&self) -> &'static str {
        match self {
            RefusalReason::ProtectedDefault => "Deleting the default storage is not allowed",
            RefusalReason::InUse => "Cannot delete storage that is being used",
        }
    }
}

impl std::fmt::Display for RefusalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Result of a delete request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum DeleteOutcome {
    /// Descriptor removed
    Deleted,
    /// Descriptor kept
    Refused(RefusalReason),
}

impl DeleteOutcome {
    /// Turn a refusal into [`Error::DeletionRefused`].
    pub fn into_result(self) -> crate::core::Result<()> {
        match self {
            DeleteOutcome::Deleted => Ok(()),
            DeleteOutcome::Refused(reason) => Err(Error::DeletionRefused(reason)),
        }
    }
}

/// Answers whether some subsystem currently selects a descriptor.
pub trait UsageLookup: Send + Sync {
    /// Whether `descriptor` is referenced by an active consumer.
    fn is_referenced(&self, descriptor: &BackendDescriptor) -> bool;
}

/// Deletion policy.
#[derive(Clone, Default)]
pub struct DeletionGuard {
    lookups: Vec<Arc<dyn UsageLookup>>,
}

impl DeletionGuard {
    /// Create a guard with no usage lookups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a usage lookup.
    pub fn with_lookup(mut self, lookup: Arc<dyn UsageLookup>) -> Self {
        self.lookups.push(lookup);
        self
    }

    /// Check the rules in order; the first failing rule decides.
    pub fn check(&self, descriptor: &BackendDescriptor) -> Result<(), RefusalReason> {
        if descriptor.is_protected() {
            debug!(storage = %descriptor.label(), "refusing to delete protected storage");
            return Err(RefusalReason::ProtectedDefault);
        }
        if self.lookups.iter().any(|l| l.is_referenced(descriptor)) {
            debug!(storage = %descriptor.label(), "refusing to delete storage in use");
            return Err(RefusalReason::InUse);
        }
        Ok(())
    }

    /// Whether the descriptor may be deleted.
    pub fn may_delete(&self, descriptor: &BackendDescriptor) -> bool {
        self.check(descriptor).is_ok()
    }
}

/// A consumer's selection of a storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Consumer name (terminal, organization policy, ...)
    pub consumer: String,
    /// Family of the selected storage
    pub family: StorageFamily,
    /// Selected storage name
    pub storage: String,
    /// Inactive consumers (e.g. deleted terminals) do not hold references
    pub active: bool,
}

/// Storage selections of terminals and organization policies.
///
/// Storages are referenced by name within their family.
#[derive(Default)]
pub struct StorageAssignments {
    entries: RwLock<Vec<Assignment>>,
}

impl StorageAssignments {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `storage` for `consumer`, replacing its previous choice in that family.
    pub fn assign(&self, consumer: &str, family: StorageFamily, storage: &str) -> crate::core::Result<()> {
        let mut entries = self.entries.write().map_err(|_| Error::poisoned("storage assignments"))?;
        entries.retain(|a| !(a.consumer == consumer && a.family == family));
        entries.push(Assignment {
            consumer: consumer.to_string(),
            family,
            storage: storage.to_string(),
            active: true,
        });
        Ok(())
    }

    /// Drop a consumer's selection in a family.
    pub fn release(&self, consumer: &str, family: StorageFamily) -> crate::core::Result<()> {
        let mut entries = self.entries.write().map_err(|_| Error::poisoned("storage assignments"))?;
        entries.retain(|a| !(a.consumer == consumer && a.family == family));
        Ok(())
    }

    /// Mark every selection of a consumer inactive.
    pub fn deactivate(&self, consumer: &str) -> crate::core::Result<()> {
        let mut entries = self.entries.write().map_err(|_| Error::poisoned("storage assignments"))?;
        entries
            .iter_mut()
            .filter(|a| a.consumer == consumer)
            .for_each(|a| a.active = false);
        Ok(())
    }

    /// Active consumers selecting the descriptor.
    pub fn consumers_of(&self, descriptor: &BackendDescriptor) -> Vec<String> {
        match self.entries.read() {
            Ok(entries) => entries
                .iter()
                .filter(|a| a.active && a.family == descriptor.family && a.storage == descriptor.name)
                .map(|a| a.consumer.clone())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl UsageLookup for StorageAssignments {
    fn is_referenced(&self, descriptor: &BackendDescriptor) -> bool {
        match self.entries.read() {
            Ok(entries) => entries.iter().any(|a| {
                a.active && a.family == descriptor.family && a.storage == descriptor.name
            }),
            // Unknown usage: keep the storage.
            Err(_) => true,
        }
    }
}

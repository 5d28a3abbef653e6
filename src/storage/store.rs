//! Descriptor persistence.
//!
//! In-process store holding every backend descriptor, enforcing the family
//! invariants (unique names, one default, supported types).

use crate::core::{Error, Result};
use crate::storage::descriptor::{BackendDescriptor, BackendType, DescriptorId, StorageFamily};
use crate::storage::guard::{DeleteOutcome, DeletionGuard};
use std::sync::RwLock;

/// Store of backend descriptors, in creation order.
#[derive(Default)]
pub struct DescriptorStore {
    descriptors: RwLock<Vec<BackendDescriptor>>,
}

impl DescriptorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the system `default` and `null` storages of both families.
    pub fn with_system_defaults() -> Result<Self> {
        let store = Self::new();
        for family in [StorageFamily::Command, StorageFamily::Replay] {
            store.create(
                BackendDescriptor::new("default", BackendType::Server, family)
                    .as_default()
                    .with_comment("Store in the bastion's own database"),
            )?;
            store.create(
                BackendDescriptor::new("null", BackendType::Null, family)
                    .with_comment("Do not store anything"),
            )?;
        }
        Ok(store)
    }

    /// Add a descriptor.
    pub fn create(&self, descriptor: BackendDescriptor) -> Result<BackendDescriptor> {
        if descriptor.name.trim().is_empty() {
            return Err(Error::Config("Storage name is required".to_string()));
        }
        if !descriptor.family.supports(descriptor.backend_type) {
            return Err(Error::Config(format!(
                "{} storage cannot use type {}",
                descriptor.family, descriptor.backend_type
            )));
        }
        if descriptor.is_default && descriptor.is_null() {
            return Err(Error::Config("The null storage cannot be the default".to_string()));
        }

        let mut descriptors = self.descriptors.write().map_err(|_| Error::poisoned("descriptors"))?;
        // IDs are unique across families.
        if descriptors.iter().any(|d| d.id == descriptor.id) {
            return Err(Error::Conflict(format!("Storage id {} already exists", descriptor.id)));
        }
        for existing in descriptors.iter().filter(|d| d.family == descriptor.family) {
            if existing.name == descriptor.name {
                return Err(Error::Conflict(format!(
                    "{} storage named {} already exists",
                    descriptor.family, descriptor.name
                )));
            }
            if descriptor.is_default && existing.is_default {
                return Err(Error::Conflict(format!(
                    "{} family already has a default storage: {}",
                    descriptor.family, existing.name
                )));
            }
        }

        descriptors.push(descriptor.clone());
        Ok(descriptor)
    }

    /// Get a descriptor by ID.
    pub fn get(&self, id: &DescriptorId) -> Result<BackendDescriptor> {
        let descriptors = self.descriptors.read().map_err(|_| Error::poisoned("descriptors"))?;
        descriptors
            .iter()
            .find(|d| &d.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Storage {}", id)))
    }

    /// Every descriptor of a family.
    pub fn list(&self, family: StorageFamily) -> Result<Vec<BackendDescriptor>> {
        let descriptors = self.descriptors.read().map_err(|_| Error::poisoned("descriptors"))?;
        Ok(descriptors.iter().filter(|d| d.family == family).cloned().collect())
    }

    /// Descriptors a user may pick, i.e. everything but the null sentinel.
    pub fn list_selectable(&self, family: StorageFamily) -> Result<Vec<BackendDescriptor>> {
        Ok(self
            .list(family)?
            .into_iter()
            .filter(|d| !d.is_null())
            .collect())
    }

    /// The default descriptor of a family.
    pub fn default_for(&self, family: StorageFamily) -> Result<Option<BackendDescriptor>> {
        Ok(self.list(family)?.into_iter().find(|d| d.is_default))
    }

    /// Make a descriptor its family's default, clearing the previous one.
    pub fn set_default(&self, id: &DescriptorId) -> Result<()> {
        let mut descriptors = self.descriptors.write().map_err(|_| Error::poisoned("descriptors"))?;
        let target = descriptors
            .iter()
            .find(|d| &d.id == id)
            .ok_or_else(|| Error::NotFound(format!("Storage {}", id)))?;
        if target.is_null() {
            return Err(Error::Config("The null storage cannot be the default".to_string()));
        }
        let family = target.family;

        for d in descriptors.iter_mut().filter(|d| d.family == family) {
            d.is_default = &d.id == id;
        }
        Ok(())
    }

    /// Replace a descriptor's backend settings.
    pub fn update_meta(
        &self,
        id: &DescriptorId,
        meta: serde_json::Map<String, serde_json::Value>,
    ) -> Result<BackendDescriptor> {
        let mut descriptors = self.descriptors.write().map_err(|_| Error::poisoned("descriptors"))?;
        let descriptor = descriptors
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| Error::NotFound(format!("Storage {}", id)))?;
        descriptor.meta = meta;
        Ok(descriptor.clone())
    }

    /// Remove a descriptor if the guard allows it.
    ///
    /// The check and the removal happen under one write lock, so concurrent
    /// store operations cannot interleave. Usage lookups are not locked.
    pub fn remove_guarded(&self, id: &DescriptorId, guard: &DeletionGuard) -> Result<DeleteOutcome> {
        let mut descriptors = self.descriptors.write().map_err(|_| Error::poisoned("descriptors"))?;
        let index = descriptors
            .iter()
            .position(|d| &d.id == id)
            .ok_or_else(|| Error::NotFound(format!("Storage {}", id)))?;

        if let Err(reason) = guard.check(&descriptors[index]) {
            return Ok(DeleteOutcome::Refused(reason));
        }
        descriptors.remove(index);
        Ok(DeleteOutcome::Deleted)
    }
}

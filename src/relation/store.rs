//! In-memory relation persistence.

use crate::core::{Error, Result, Scope};
use crate::relation::row::{
    ChildKind, ChildObject, CredentialProfile, NewRelation, RelationFamily, RelationRow,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Relation row with display forms of both sides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationView {
    /// The row
    #[serde(flatten)]
    pub row: RelationRow,
    /// Parent as `name(username)`
    pub parent_display: String,
    /// Child display form, when the child is known
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub child_display: Option<String>,
}

/// Relation store.
#[derive(Default)]
pub struct RelationStore {
    profiles: RwLock<HashMap<String, CredentialProfile>>,
    children: RwLock<HashMap<(ChildKind, String), String>>,
    rows: RwLock<Vec<RelationRow>>,
}

impl RelationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a credential profile.
    pub fn register_profile(&self, profile: CredentialProfile) -> Result<()> {
        let mut profiles = self.profiles.write().map_err(|_| Error::poisoned("profiles"))?;
        if profiles.contains_key(&profile.id) {
            return Err(Error::Conflict(format!("Profile {} already exists", profile.id)));
        }
        profiles.insert(profile.id.clone(), profile);
        Ok(())
    }

    /// Record an asset, node or user for display in listings. Re-registering
    /// replaces the previous display form.
    pub fn register_child(&self, child: ChildObject) -> Result<()> {
        let mut children = self.children.write().map_err(|_| Error::poisoned("children"))?;
        children.insert((child.kind(), child.id().to_string()), child.display());
        Ok(())
    }

    /// Persist a batch. Either every row is stored or none is.
    pub fn bulk_create(
        &self,
        scope: &Scope,
        family: RelationFamily,
        relations: Vec<NewRelation>,
    ) -> Result<Vec<RelationRow>> {
        let profiles = self.profiles.read().map_err(|_| Error::poisoned("profiles"))?;
        for relation in &relations {
            if relation.child_id.is_empty() {
                return Err(Error::Persistence(format!(
                    "Relation of {} has no {}",
                    relation.parent_id,
                    family.child_kind()
                )));
            }
            match profiles.get(&relation.parent_id) {
                Some(profile) if scope.includes(&profile.org_id) => {}
                _ => return Err(Error::NotFound(format!("Profile {}", relation.parent_id))),
            }
        }

        let created: Vec<RelationRow> = relations
            .into_iter()
            .map(|relation| RelationRow::new(family, relation))
            .collect();
        let mut rows = self.rows.write().map_err(|_| Error::poisoned("relations"))?;
        rows.extend(created.iter().cloned());
        Ok(created)
    }

    /// Rows of a family visible to `scope`, with display forms.
    pub fn list(&self, scope: &Scope, family: RelationFamily) -> Result<Vec<RelationView>> {
        let profiles = self.profiles.read().map_err(|_| Error::poisoned("profiles"))?;
        let children = self.children.read().map_err(|_| Error::poisoned("children"))?;
        let rows = self.rows.read().map_err(|_| Error::poisoned("relations"))?;
        let kind = family.child_kind();
        Ok(rows
            .iter()
            .filter(|row| row.family == family)
            .filter_map(|row| {
                let profile = profiles.get(&row.parent_id)?;
                scope.includes(&profile.org_id).then(|| RelationView {
                    row: row.clone(),
                    parent_display: profile.display(),
                    child_display: children.get(&(kind, row.child_id.clone())).cloned(),
                })
            })
            .collect())
    }

    /// Number of stored rows across families.
    pub fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

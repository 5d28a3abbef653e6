//! Relation rows between credential profiles and the objects they apply to.

use crate::core::{generate_id, now, OrgId, Timestamp};
use serde::{Deserialize, Serialize};

/// Kind of object on the child side of a relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildKind {
    /// Managed host
    Asset,
    /// Asset tree node
    Node,
    /// Bastion user
    User,
}

impl std::fmt::Display for ChildKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChildKind::Asset => write!(f, "asset"),
            ChildKind::Node => write!(f, "node"),
            ChildKind::User => write!(f, "user"),
        }
    }
}

/// Relation table a row belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationFamily {
    /// Profile to asset
    SystemUserAsset,
    /// Profile to node
    SystemUserNode,
    /// Profile to user
    SystemUserUser,
}

impl RelationFamily {
    /// Child kind, fixed per family.
    pub fn child_kind(&self) -> ChildKind {
        match self {
            RelationFamily::SystemUserAsset => ChildKind::Asset,
            RelationFamily::SystemUserNode => ChildKind::Node,
            RelationFamily::SystemUserUser => ChildKind::User,
        }
    }

    /// Sender name carried by change events.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationFamily::SystemUserAsset => "system_user_asset",
            RelationFamily::SystemUserNode => "system_user_node",
            RelationFamily::SystemUserUser => "system_user_user",
        }
    }
}

impl std::fmt::Display for RelationFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parent side of every relation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialProfile {
    /// Profile ID
    pub id: String,
    /// Owning organization
    pub org_id: OrgId,
    /// Profile name
    pub name: String,
    /// Login username
    pub username: String,
}

impl CredentialProfile {
    /// Create a profile.
    pub fn new(id: &str, org_id: &str, name: &str, username: &str) -> Self {
        Self {
            id: id.to_string(),
            org_id: OrgId::new(org_id),
            name: name.to_string(),
            username: username.to_string(),
        }
    }

    /// Display form, `name(username)`.
    pub fn display(&self) -> String {
        format!("{}({})", self.name, self.username)
    }
}

/// Child side of a relation, as shown in listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChildObject {
    /// Managed host
    Asset {
        /// Asset ID
        id: String,
        /// Hostname
        hostname: String,
        /// Address
        ip: String,
    },
    /// Asset tree node
    Node {
        /// Node ID
        id: String,
        /// Tree key, e.g. `1:3:7`
        key: String,
    },
    /// Bastion user
    User {
        /// User ID
        id: String,
        /// Full name
        name: String,
        /// Login username
        username: String,
    },
}

impl ChildObject {
    /// Kind of object.
    pub fn kind(&self) -> ChildKind {
        match self {
            ChildObject::Asset { .. } => ChildKind::Asset,
            ChildObject::Node { .. } => ChildKind::Node,
            ChildObject::User { .. } => ChildKind::User,
        }
    }

    /// Object ID.
    pub fn id(&self) -> &str {
        match self {
            ChildObject::Asset { id, .. } | ChildObject::Node { id, .. } | ChildObject::User { id, .. } => id,
        }
    }

    /// Display form: `hostname(ip)` for assets, the tree key for nodes,
    /// `name(username)` for users.
    pub fn display(&self) -> String {
        match self {
            ChildObject::Asset { hostname, ip, .. } => format!("{}({})", hostname, ip),
            ChildObject::Node { key, .. } => key.clone(),
            ChildObject::User { name, username, .. } => format!("{}({})", name, username),
        }
    }
}

/// Relation to be created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRelation {
    /// Profile ID
    pub parent_id: String,
    /// Asset, node or user ID
    pub child_id: String,
}

impl NewRelation {
    /// Create a pending relation.
    pub fn new(parent_id: &str, child_id: &str) -> Self {
        Self {
            parent_id: parent_id.to_string(),
            child_id: child_id.to_string(),
        }
    }
}

/// Persisted relation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRow {
    /// Row ID
    pub id: String,
    /// Relation table
    pub family: RelationFamily,
    /// Profile ID
    pub parent_id: String,
    /// Asset, node or user ID
    pub child_id: String,
    /// Creation time
    pub created_at: Timestamp,
}

impl RelationRow {
    /// Materialize a pending relation.
    pub fn new(family: RelationFamily, relation: NewRelation) -> Self {
        Self {
            id: generate_id(),
            family,
            parent_id: relation.parent_id,
            child_id: relation.child_id,
            created_at: now(),
        }
    }
}

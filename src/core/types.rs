//! Common types used across bastion-audit modules.

use serde::{Deserialize, Serialize};

/// Timestamp wrapper for consistent serialization.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Get current UTC timestamp.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// Generate a fresh opaque identifier.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Organization identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrgId(pub String);

impl OrgId {
    /// Create an organization ID.
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Get the ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrgId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visibility scope of a request.
///
/// Passed explicitly to every entry point that filters by tenant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Sees every organization
    Root,
    /// Sees a single organization
    Org(OrgId),
}

impl Scope {
    /// Scope limited to one organization.
    pub fn org(id: &str) -> Self {
        Scope::Org(OrgId::new(id))
    }

    /// Whether this is the root scope.
    pub fn is_root(&self) -> bool {
        matches!(self, Scope::Root)
    }

    /// Whether data owned by `org` is visible from this scope.
    pub fn includes(&self, org: &OrgId) -> bool {
        match self {
            Scope::Root => true,
            Scope::Org(id) => id == org,
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Root
    }
}

//! Backend descriptors.
//!
//! A descriptor is a named, typed storage configuration. The type tag decides
//! which backend implementation, health probe and count semantics apply.

use crate::core::{generate_id, now, Timestamp};
use serde::{Deserialize, Serialize};

/// Unique descriptor identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DescriptorId(pub String);

impl DescriptorId {
    /// Create a descriptor ID.
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Generate a unique ID.
    pub fn generate() -> Self {
        Self(generate_id())
    }

    /// Get the ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backend type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// Local database of the bastion itself
    Server,
    /// Sentinel that discards everything
    Null,
    /// Elasticsearch-compatible search engine
    #[serde(rename = "es")]
    Elasticsearch,
    /// Amazon S3 or compatible
    S3,
    /// Alibaba OSS
    Oss,
    /// Azure blob storage
    Azure,
    /// OpenStack Swift
    Swift,
    /// Ceph radosgw
    Ceph,
    /// Tencent COS
    Cos,
    /// Huawei OBS
    Obs,
}

/// Broad category of a backend type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Local,
    Null,
    SearchEngine,
    ObjectStore,
}

impl BackendType {
    /// Every known backend type.
    pub const ALL: [BackendType; 10] = [
        BackendType::Server,
        BackendType::Null,
        BackendType::Elasticsearch,
        BackendType::S3,
        BackendType::Oss,
        BackendType::Azure,
        BackendType::Swift,
        BackendType::Ceph,
        BackendType::Cos,
        BackendType::Obs,
    ];

    /// Category of this backend type.
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendType::Server => BackendKind::Local,
            BackendType::Null => BackendKind::Null,
            BackendType::Elasticsearch => BackendKind::SearchEngine,
            BackendType::S3
            | BackendType::Oss
            | BackendType::Azure
            | BackendType::Swift
            | BackendType::Ceph
            | BackendType::Cos
            | BackendType::Obs => BackendKind::ObjectStore,
        }
    }

    /// Short tag used in display names and serialized forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::Server => "server",
            BackendType::Null => "null",
            BackendType::Elasticsearch => "es",
            BackendType::S3 => "s3",
            BackendType::Oss => "oss",
            BackendType::Azure => "azure",
            BackendType::Swift => "swift",
            BackendType::Ceph => "ceph",
            BackendType::Cos => "cos",
            BackendType::Obs => "obs",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BackendType {
    type Err = crate::core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| crate::core::Error::Config(format!("Unknown backend type: {}", s)))
    }
}

/// Storage family: what a descriptor stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageFamily {
    /// Session command logs
    Command,
    /// Session replay recordings
    Replay,
}

impl StorageFamily {
    /// Whether a backend type may be configured in this family.
    pub fn supports(&self, backend_type: BackendType) -> bool {
        match self {
            StorageFamily::Command => matches!(
                backend_type.kind(),
                BackendKind::Local | BackendKind::Null | BackendKind::SearchEngine
            ),
            StorageFamily::Replay => matches!(
                backend_type.kind(),
                BackendKind::Local | BackendKind::Null | BackendKind::ObjectStore
            ),
        }
    }

    /// Label of the synthetic tree root.
    pub fn root_label(&self) -> &'static str {
        match self {
            StorageFamily::Command => "Command storages",
            StorageFamily::Replay => "Replay storages",
        }
    }
}

impl std::fmt::Display for StorageFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageFamily::Command => write!(f, "command"),
            StorageFamily::Replay => write!(f, "replay"),
        }
    }
}

/// A named storage configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Unique ID, generated when absent
    #[serde(default = "DescriptorId::generate")]
    pub id: DescriptorId,
    /// Display name, unique within the family
    pub name: String,
    /// Backend type tag
    #[serde(rename = "type")]
    pub backend_type: BackendType,
    /// Family this descriptor belongs to
    pub family: StorageFamily,
    /// Backend-specific settings
    #[serde(default)]
    pub meta: serde_json::Map<String, serde_json::Value>,
    /// System-provided fallback of its family
    #[serde(default)]
    pub is_default: bool,
    /// Free-form comment
    #[serde(default)]
    pub comment: String,
    /// Creation time
    #[serde(default = "now")]
    pub created_at: Timestamp,
}

impl BackendDescriptor {
    /// Create a new descriptor with empty settings.
    pub fn new(name: &str, backend_type: BackendType, family: StorageFamily) -> Self {
        Self {
            id: DescriptorId::generate(),
            name: name.to_string(),
            backend_type,
            family,
            meta: serde_json::Map::new(),
            is_default: false,
            comment: String::new(),
            created_at: now(),
        }
    }

    /// Use a fixed ID.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = DescriptorId::new(id);
        self
    }

    /// Add a setting.
    pub fn with_meta(mut self, key: &str, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.meta.insert(key.to_string(), v);
        }
        self
    }

    /// Mark as the family default.
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Set comment.
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_string();
        self
    }

    /// Whether this is the disabled sentinel.
    pub fn is_null(&self) -> bool {
        self.backend_type == BackendType::Null
    }

    /// Whether the descriptor is a system backend that must never be removed.
    pub fn is_protected(&self) -> bool {
        self.is_null() || self.is_default || self.backend_type == BackendType::Server
    }

    /// `name(type)` label used in listings.
    pub fn label(&self) -> String {
        format!("{}({})", self.name, self.backend_type)
    }
}

//! Backend-specific settings.
//!
//! Parsed from a descriptor's `meta` object when the backend is constructed.

use crate::core::{Error, Result};
use crate::storage::descriptor::BackendDescriptor;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Default result window of Elasticsearch-compatible engines.
pub const DEFAULT_MAX_RESULT_WINDOW: u64 = 10_000;

/// Parse a typed config out of a descriptor's settings.
pub fn from_meta<T: DeserializeOwned>(descriptor: &BackendDescriptor) -> Result<T> {
    serde_json::from_value(serde_json::Value::Object(descriptor.meta.clone())).map_err(|e| {
        Error::Config(format!(
            "Invalid settings for storage {}: {}",
            descriptor.label(),
            e
        ))
    })
}

/// Search engine backend configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EsConfig {
    /// Node URLs
    pub hosts: Vec<String>,
    /// Index holding command documents
    pub index: String,
    /// Engine's result window cap
    pub max_result_window: u64,
    /// Skip TLS certificate verification
    pub ignore_verify_certs: bool,
}

impl Default for EsConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["http://localhost:9200".to_string()],
            index: "jumpserver".to_string(),
            max_result_window: DEFAULT_MAX_RESULT_WINDOW,
            ignore_verify_certs: false,
        }
    }
}

impl EsConfig {
    /// Reject settings no engine could ever accept.
    pub fn validate(&self) -> Result<()> {
        if self.hosts.is_empty() {
            return Err(Error::Config("At least one host is required".to_string()));
        }
        if let Some(bad) = self
            .hosts
            .iter()
            .find(|h| !(h.starts_with("http://") || h.starts_with("https://")))
        {
            return Err(Error::Config(format!("Host must be an http(s) URL: {}", bad)));
        }
        if self.index.is_empty() {
            return Err(Error::Config("Index name is required".to_string()));
        }
        if self.max_result_window == 0 {
            return Err(Error::Config("max_result_window must be positive".to_string()));
        }
        Ok(())
    }
}

/// Object store backend configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStoreConfig {
    /// Service endpoint
    pub endpoint: String,
    /// Bucket or container
    pub bucket: String,
    /// Region
    pub region: String,
    /// Access key ID
    pub access_key: String,
    /// Secret access key
    pub secret_key: String,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            bucket: "jumpserver".to_string(),
            region: "us-east-1".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
        }
    }
}

impl ObjectStoreConfig {
    /// Reject settings no store could ever accept.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(Error::Config("Bucket is required".to_string()));
        }
        Ok(())
    }

    /// Whether both halves of the credential pair are present.
    pub fn has_credentials(&self) -> bool {
        !self.access_key.is_empty() && !self.secret_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::descriptor::{BackendType, StorageFamily};

    #[test]
    fn test_es_defaults() {
        let config = EsConfig::default();
        assert_eq!(config.max_result_window, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_es_from_meta_partial() {
        let d = BackendDescriptor::new("es", BackendType::Elasticsearch, StorageFamily::Command)
            .with_meta("hosts", vec!["https://es.internal:9200"])
            .with_meta("index", "commands");
        let config: EsConfig = from_meta(&d).unwrap();
        assert_eq!(config.index, "commands");
        assert_eq!(config.max_result_window, DEFAULT_MAX_RESULT_WINDOW);
    }

    #[test]
    fn test_es_validation() {
        let config = EsConfig {
            hosts: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EsConfig {
            hosts: vec!["es.internal:9200".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_meta_type() {
        let d = BackendDescriptor::new("es", BackendType::Elasticsearch, StorageFamily::Command)
            .with_meta("max_result_window", "lots");
        let result: Result<EsConfig> = from_meta(&d);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_object_store_credentials() {
        let config = ObjectStoreConfig::default();
        assert!(!config.has_credentials());

        let config = ObjectStoreConfig {
            access_key: "AK".to_string(),
            secret_key: "SK".to_string(),
            ..Default::default()
        };
        assert!(config.has_credentials());
        assert!(config.validate().is_ok());
    }
}

//! On-demand connectivity test for a single storage.

use crate::storage::descriptor::BackendDescriptor;
use crate::storage::validity::ValidityChecker;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{error, warn};

/// Message of a successful test.
pub const TEST_SUCCESSFUL: &str = "Test successful";
/// Prefix of every failed test message.
pub const TEST_FAILURE: &str = "Test failure";

/// Outcome of a connectivity test.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityReport {
    /// Whether the storage is usable
    pub is_valid: bool,
    /// Human-readable outcome
    pub msg: String,
}

impl ConnectivityReport {
    fn success() -> Self {
        Self {
            is_valid: true,
            msg: TEST_SUCCESSFUL.to_string(),
        }
    }

    fn failure(cause: &str) -> Self {
        Self {
            is_valid: false,
            msg: format!("{}: {}", TEST_FAILURE, cause),
        }
    }
}

/// Read-only diagnostic wrapping [`ValidityChecker`].
#[derive(Clone)]
pub struct ConnectivityProbe {
    checker: ValidityChecker,
}

impl ConnectivityProbe {
    /// Create a probe.
    pub fn new(checker: ValidityChecker) -> Self {
        Self { checker }
    }

    /// Test a storage. Never fails and never panics past this call; a
    /// failed test reports its cause.
    pub async fn probe(&self, descriptor: &BackendDescriptor) -> ConnectivityReport {
        match AssertUnwindSafe(self.checker.check(descriptor))
            .catch_unwind()
            .await
        {
            Ok(Ok(true)) => ConnectivityReport::success(),
            Ok(Ok(false)) => ConnectivityReport::failure("Account invalid"),
            Ok(Err(e)) => {
                warn!(storage = %descriptor.label(), error = %e, "storage test failed");
                ConnectivityReport::failure(&e.to_string())
            }
            Err(payload) => {
                let cause = panic_message(payload.as_ref());
                error!(storage = %descriptor.label(), cause = %cause, "storage probe panicked");
                ConnectivityReport::failure(&cause)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown error".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Result;
    use crate::storage::backend::{ResultWindow, StorageBackend};
    use crate::storage::backends::ElasticsearchBackend;
    use crate::storage::config::EsConfig;
    use crate::storage::descriptor::{BackendType, StorageFamily};
    use crate::storage::filter::CommandFilter;
    use crate::storage::record::CommandRecord;
    use crate::storage::registry::BackendRegistry;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    /// Backend whose probe blows up.
    struct Exploding;

    #[async_trait]
    impl StorageBackend for Exploding {
        async fn record(&self, _record: CommandRecord) -> Result<()> {
            Ok(())
        }

        async fn query(&self, _filter: &CommandFilter, _limit: usize) -> Result<Vec<CommandRecord>> {
            Ok(Vec::new())
        }

        async fn count(&self, _filter: &CommandFilter, _window: ResultWindow) -> Result<u64> {
            Ok(0)
        }

        fn backend_type(&self) -> BackendType {
            BackendType::Elasticsearch
        }

        async fn health_check(&self) -> Result<bool> {
            panic!("tls handshake aborted");
        }
    }

    fn probe(registry: BackendRegistry) -> ConnectivityProbe {
        ConnectivityProbe::new(ValidityChecker::new(
            Arc::new(registry),
            Duration::from_millis(100),
        ))
    }

    #[tokio::test]
    async fn test_success() {
        let probe = probe(BackendRegistry::with_builtin());
        let es = BackendDescriptor::new("es", BackendType::Elasticsearch, StorageFamily::Command);
        let report = probe.probe(&es).await;
        assert!(report.is_valid);
        assert_eq!(report.msg, TEST_SUCCESSFUL);
    }

    #[tokio::test]
    async fn test_invalid_credentials() {
        let probe = probe(BackendRegistry::with_builtin());
        let oss = BackendDescriptor::new("oss", BackendType::Oss, StorageFamily::Replay);
        let report = probe.probe(&oss).await;
        assert!(!report.is_valid);
        assert_eq!(report.msg, "Test failure: Account invalid");
    }

    #[tokio::test]
    async fn test_failure_reports_cause() {
        let registry = BackendRegistry::with_builtin();
        let es = BackendDescriptor::new("es", BackendType::Elasticsearch, StorageFamily::Command);
        let backend = Arc::new(ElasticsearchBackend::new(EsConfig::default()).unwrap());
        backend.set_reachable(false);
        registry.attach(&es.id, backend).unwrap();

        let report = probe(registry).probe(&es).await;
        assert!(!report.is_valid);
        assert!(report.msg.starts_with("Test failure: "));
        assert!(report.msg.contains("Connection refused"));
        assert!(!report.msg.contains("Account invalid"));
    }

    #[tokio::test]
    async fn test_bad_settings_report_cause() {
        let probe = probe(BackendRegistry::with_builtin());
        let es = BackendDescriptor::new("es", BackendType::Elasticsearch, StorageFamily::Command)
            .with_meta("hosts", Vec::<String>::new());
        let report = probe.probe(&es).await;
        assert!(!report.is_valid);
        assert!(report.msg.contains("At least one host is required"));
    }

    #[tokio::test]
    async fn test_panicking_probe_is_contained() {
        let mut registry = BackendRegistry::empty();
        registry.register(BackendType::Elasticsearch, |_| {
            Ok(Arc::new(Exploding) as Arc<dyn StorageBackend>)
        });
        let probe = probe(registry);
        let es = BackendDescriptor::new("es", BackendType::Elasticsearch, StorageFamily::Command);

        let report = probe.probe(&es).await;
        assert!(!report.is_valid);
        assert!(report.msg.starts_with(TEST_FAILURE));
        assert!(report.msg.contains("tls handshake aborted"));
    }

    #[tokio::test]
    async fn test_idempotent() {
        let probe = probe(BackendRegistry::with_builtin());
        let es = BackendDescriptor::new("es", BackendType::Elasticsearch, StorageFamily::Command);
        assert_eq!(probe.probe(&es).await, probe.probe(&es).await);
    }

    #[test]
    fn test_report_serialization() {
        let json = serde_json::to_value(ConnectivityReport::success()).unwrap();
        assert_eq!(json["is_valid"], true);
        assert_eq!(json["msg"], "Test successful");
    }
}

//! Backend validity checks.
//!
//! `is_valid` never fails: construction errors, probe errors, rejected
//! credentials and timeouts all read as "invalid".

use crate::core::{Error, Result};
use crate::storage::descriptor::{BackendDescriptor, BackendKind};
use crate::storage::registry::BackendRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Health probe dispatching on the descriptor's type.
#[derive(Clone)]
pub struct ValidityChecker {
    registry: Arc<BackendRegistry>,
    timeout: Duration,
}

impl ValidityChecker {
    /// Create a checker with a per-probe timeout.
    pub fn new(registry: Arc<BackendRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Whether the backend behind `descriptor` is usable right now.
    pub async fn is_valid(&self, descriptor: &BackendDescriptor) -> bool {
        match self.check(descriptor).await {
            Ok(true) => true,
            Ok(false) => {
                warn!(storage = %descriptor.label(), "storage rejected credentials");
                false
            }
            Err(e) => {
                warn!(storage = %descriptor.label(), error = %e, "storage probe failed");
                false
            }
        }
    }

    /// Run the probe, reporting why it failed.
    pub async fn check(&self, descriptor: &BackendDescriptor) -> Result<bool> {
        match descriptor.backend_type.kind() {
            BackendKind::Local | BackendKind::Null => Ok(true),
            BackendKind::SearchEngine | BackendKind::ObjectStore => {
                let backend = self.registry.resolve(descriptor)?;
                debug!(storage = %descriptor.label(), "probing storage");
                tokio::time::timeout(self.timeout, backend.health_check())
                    .await
                    .map_err(|_| {
                        Error::Timeout(format!(
                            "No answer from {} within {:?}",
                            descriptor.label(),
                            self.timeout
                        ))
                    })?
            }
        }
    }
}

//! Count strategy.
//!
//! Search engines silently cap totals at their result window, so counts
//! against them always disable the cap.

use crate::core::{Error, Result};
use crate::storage::backend::ResultWindow;
use crate::storage::descriptor::{BackendDescriptor, BackendKind, BackendType};
use crate::storage::filter::CommandFilter;
use crate::storage::registry::BackendRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Window to request when counting through a backend type.
pub fn window_for(backend_type: BackendType) -> ResultWindow {
    match backend_type.kind() {
        BackendKind::SearchEngine => ResultWindow::Unbounded,
        BackendKind::Local | BackendKind::Null | BackendKind::ObjectStore => ResultWindow::Default,
    }
}

/// Row counter dispatching on the descriptor's type.
#[derive(Clone)]
pub struct CountStrategy {
    registry: Arc<BackendRegistry>,
    timeout: Duration,
}

impl CountStrategy {
    /// Create a counter with a per-count timeout.
    pub fn new(registry: Arc<BackendRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Count records matching `filter` stored through `descriptor`.
    pub async fn count(&self, descriptor: &BackendDescriptor, filter: &CommandFilter) -> Result<u64> {
        let backend = self.registry.resolve(descriptor)?;
        let window = window_for(descriptor.backend_type);
        let count = tokio::time::timeout(self.timeout, backend.count(filter, window))
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "Count on {} exceeded {:?}",
                    descriptor.label(),
                    self.timeout
                ))
            })??;
        debug!(storage = %descriptor.label(), count, ?window, "counted records");
        Ok(count)
    }
}

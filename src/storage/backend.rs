//! StorageBackend trait definition.
//!
//! Core trait that all storage backends must implement.

use crate::core::Result;
use crate::storage::descriptor::BackendType;
use crate::storage::filter::CommandFilter;
use crate::storage::record::CommandRecord;
use async_trait::async_trait;

/// How a count interacts with an engine's result window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultWindow {
    /// Let the engine apply its default cap
    Default,
    /// Disable the cap and report the exact total
    Unbounded,
}

/// Core trait for storage backends.
///
/// One instance serves one descriptor.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store a command record.
    async fn record(&self, record: CommandRecord) -> Result<()>;

    /// Query records matching a filter, up to `limit`.
    async fn query(&self, filter: &CommandFilter, limit: usize) -> Result<Vec<CommandRecord>>;

    /// Count records matching a filter.
    ///
    /// Backends without a result window ignore `window`.
    async fn count(&self, filter: &CommandFilter, window: ResultWindow) -> Result<u64>;

    /// Get the backend type.
    fn backend_type(&self) -> BackendType;

    /// Health check for the backend.
    ///
    /// `Ok(false)` means reachable but unusable (e.g. rejected credentials).
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

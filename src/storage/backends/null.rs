//! Null backend: command logging disabled.

use crate::core::Result;
use crate::storage::backend::{ResultWindow, StorageBackend};
use crate::storage::descriptor::BackendType;
use crate::storage::filter::CommandFilter;
use crate::storage::record::CommandRecord;
use async_trait::async_trait;

/// Discards every write and reports nothing.
#[derive(Default)]
pub struct NullBackend;

#[async_trait]
impl StorageBackend for NullBackend {
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
        BackendType::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_discards() {
        let backend = NullBackend;
        backend.record(CommandRecord::new("org-a", "s-1", "ls")).await.unwrap();
        assert_eq!(backend.count(&CommandFilter::new(), ResultWindow::Unbounded).await.unwrap(), 0);
        assert!(backend.query(&CommandFilter::new(), 10).await.unwrap().is_empty());
    }
}

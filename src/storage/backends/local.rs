//! Local database backend.
//!
//! The bastion's own store; always available.

use crate::core::{Error, Result};
use crate::storage::backend::{ResultWindow, StorageBackend};
use crate::storage::descriptor::BackendType;
use crate::storage::filter::CommandFilter;
use crate::storage::record::CommandRecord;
use async_trait::async_trait;
use std::sync::RwLock;

/// Backend writing to the bastion's own database.
#[derive(Default)]
pub struct LocalBackend {
    records: RwLock<Vec<CommandRecord>>,
}

impl LocalBackend {
    /// Create an empty local backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    async fn record(&self, record: CommandRecord) -> Result<()> {
        let mut records = self.records.write().map_err(|_| Error::poisoned("local records"))?;
        records.push(record);
        Ok(())
    }

    async fn query(&self, filter: &CommandFilter, limit: usize) -> Result<Vec<CommandRecord>> {
        let records = self.records.read().map_err(|_| Error::poisoned("local records"))?;
        Ok(records
            .iter()
            .filter(|r| filter.matches(r))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &CommandFilter, _window: ResultWindow) -> Result<u64> {
        let records = self.records.read().map_err(|_| Error::poisoned("local records"))?;
        Ok(records.iter().filter(|r| filter.matches(r)).count() as u64)
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Server
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_and_count() {
        let backend = LocalBackend::new();
        backend.record(CommandRecord::new("org-a", "s-1", "ls").by_user("alice")).await.unwrap();
        backend.record(CommandRecord::new("org-a", "s-1", "pwd").by_user("bob")).await.unwrap();

        let all = backend.count(&CommandFilter::new(), ResultWindow::Default).await.unwrap();
        assert_eq!(all, 2);

        let alice = CommandFilter::new().by_user("alice");
        assert_eq!(backend.count(&alice, ResultWindow::Default).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_query_limit() {
        let backend = LocalBackend::new();
        for i in 0..5 {
            backend
                .record(CommandRecord::new("org-a", "s-1", &format!("echo {}", i)))
                .await
                .unwrap();
        }
        let results = backend.query(&CommandFilter::new(), 3).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].input, "echo 0");
    }

    #[tokio::test]
    async fn test_health_check() {
        let backend = LocalBackend::new();
        assert!(backend.health_check().await.unwrap());
        assert_eq!(backend.backend_type(), BackendType::Server);
    }
}

//! Search engine backend.
//!
//! Models an Elasticsearch-compatible index. Totals are capped at the index's
//! `max_result_window` unless the caller asks for an exact count.

use crate::core::{Error, Result};
use crate::storage::backend::{ResultWindow, StorageBackend};
use crate::storage::config::{from_meta, EsConfig};
use crate::storage::descriptor::{BackendDescriptor, BackendType};
use crate::storage::filter::CommandFilter;
use crate::storage::record::CommandRecord;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Backend indexing commands into a search engine.
pub struct ElasticsearchBackend {
    config: EsConfig,
    documents: RwLock<Vec<CommandRecord>>,
    reachable: AtomicBool,
}

impl ElasticsearchBackend {
    /// Create a new search engine backend.
    pub fn new(config: EsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            documents: RwLock::new(Vec::new()),
            reachable: AtomicBool::new(true),
        })
    }

    /// Build from a descriptor's settings.
    pub fn from_descriptor(descriptor: &BackendDescriptor) -> Result<Self> {
        Self::new(from_meta(descriptor)?)
    }

    /// Get index name.
    pub fn index(&self) -> &str {
        &self.config.index
    }

    /// Get the result window cap.
    pub fn max_result_window(&self) -> u64 {
        self.config.max_result_window
    }

    /// Simulate the cluster going down or coming back.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::ProbeFailed(format!(
                "Connection refused: {}",
                self.config.hosts.join(",")
            )))
        }
    }
}

#[async_trait]
impl StorageBackend for ElasticsearchBackend {
    async fn record(&self, record: CommandRecord) -> Result<()> {
        self.ensure_reachable()?;
        let mut documents = self.documents.write().map_err(|_| Error::poisoned("es documents"))?;
        documents.push(record);
        Ok(())
    }

    async fn query(&self, filter: &CommandFilter, limit: usize) -> Result<Vec<CommandRecord>> {
        self.ensure_reachable()?;
        // Deep pages beyond the window are rejected by the engine.
        let window = usize::try_from(self.config.max_result_window).unwrap_or(usize::MAX);
        let documents = self.documents.read().map_err(|_| Error::poisoned("es documents"))?;
        Ok(documents
            .iter()
            .filter(|r| filter.matches(r))
            .take(limit.min(window))
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &CommandFilter, window: ResultWindow) -> Result<u64> {
        self.ensure_reachable()?;
        let documents = self.documents.read().map_err(|_| Error::poisoned("es documents"))?;
        let total = documents.iter().filter(|r| filter.matches(r)).count() as u64;
        Ok(match window {
            ResultWindow::Default => total.min(self.config.max_result_window),
            ResultWindow::Unbounded => total,
        })
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Elasticsearch
    }

    async fn health_check(&self) -> Result<bool> {
        self.ensure_reachable()?;
        Ok(true)
    }
}

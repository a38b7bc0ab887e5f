//! In-memory index sink, used by tests and dry runs

use async_trait::async_trait;
use tokio::sync::RwLock;
use umls_core::{IndexDocument, IndexSink, Result};

/// Index sink that keeps every batch in memory
#[derive(Default)]
pub struct MemoryIndexSink {
    batches: RwLock<Vec<Vec<IndexDocument>>>,
    flushed: RwLock<bool>,
}

impl MemoryIndexSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All documents received, in arrival order
    pub async fn documents(&self) -> Vec<IndexDocument> {
        self.batches.read().await.iter().flatten().cloned().collect()
    }

    pub async fn batch_sizes(&self) -> Vec<usize> {
        self.batches.read().await.iter().map(Vec::len).collect()
    }

    pub async fn is_flushed(&self) -> bool {
        *self.flushed.read().await
    }
}

#[async_trait]
impl IndexSink for MemoryIndexSink {
    async fn index_batch(&self, documents: &[IndexDocument]) -> Result<()> {
        self.batches.write().await.push(documents.to_vec());
        *self.flushed.write().await = false;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        *self.flushed.write().await = true;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

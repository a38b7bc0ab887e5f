//! UMLS Graph - Concept relation graph loading
//!
//! Loads the relation table into a graph store with merge semantics.
//! Each batch first merges the endpoint concepts, then the edges, so an
//! edge never points at a missing node.

use std::collections::BTreeSet;
use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};
use umls_core::{CanonicalRelation, DatabaseConfig, GraphSink, Result, UmlsError};
use umls_parser::parse_relation_line;

pub mod memory;
pub mod surrealdb_store;

pub use memory::MemoryGraphStore;
pub use surrealdb_store::SurrealDbStore;

/// Counts of one load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphLoadStats {
    /// Relations merged
    pub relations: usize,
    /// Node merges issued (a concept shared by two batches counts twice)
    pub node_merges: usize,
    /// Batches sent
    pub batches: usize,
    /// Relation-table lines that could not be decoded
    pub skipped_lines: usize,
}

/// Batches relations into a graph sink
#[derive(Debug, Clone)]
pub struct GraphLoader {
    batch_size: usize,
}

impl GraphLoader {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
        }
    }

    /// Load relations already in memory
    pub async fn load<I>(&self, sink: &dyn GraphSink, relations: I) -> Result<GraphLoadStats>
    where
        I: IntoIterator<Item = CanonicalRelation>,
    {
        let mut stats = GraphLoadStats::default();
        let mut batch = Vec::with_capacity(self.batch_size);

        for relation in relations {
            batch.push(relation);
            if batch.len() >= self.batch_size {
                self.send(sink, &mut batch, &mut stats).await?;
            }
        }
        self.send(sink, &mut batch, &mut stats).await?;

        tracing::info!(
            "Merged {} relations into {} in {} batches",
            stats.relations,
            sink.name(),
            stats.batches
        );
        Ok(stats)
    }

    /// Read a relation table from disk and load it
    pub async fn load_table(
        &self,
        sink: &dyn GraphSink,
        path: impl AsRef<Path>,
    ) -> Result<GraphLoadStats> {
        let path = path.as_ref();
        let io_err = |source| UmlsError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = tokio::fs::File::open(path).await.map_err(io_err)?;
        let mut lines = BufReader::new(file).lines();

        let mut relations = Vec::new();
        let mut skipped = 0;
        while let Some(line) = lines.next_line().await.map_err(io_err)? {
            match parse_relation_line(&line) {
                Some(relation) => relations.push(relation),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::warn!("Skipped {} malformed relation-table lines", skipped);
        }

        let mut stats = self.load(sink, relations).await?;
        stats.skipped_lines = skipped;
        Ok(stats)
    }

    async fn send(
        &self,
        sink: &dyn GraphSink,
        batch: &mut Vec<CanonicalRelation>,
        stats: &mut GraphLoadStats,
    ) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let nodes: Vec<String> = batch
            .iter()
            .flat_map(|r| [r.source_cui.clone(), r.target_cui.clone()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        sink.merge_concepts(&nodes).await?;
        sink.merge_relations(batch.as_slice()).await?;

        stats.node_merges += nodes.len();
        stats.relations += batch.len();
        stats.batches += 1;
        batch.clear();

        tracing::debug!("Batch {} merged", stats.batches);
        Ok(())
    }
}

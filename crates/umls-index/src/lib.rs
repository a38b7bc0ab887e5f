//! UMLS Index - Autocompletion index loading
//!
//! Turns concept-table records into search documents (one per unique
//! term) and feeds them to an [`IndexSink`] in fixed-size batches.
//!
//! Author: hephaex@gmail.com

use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};
use umls_core::{AggregatedConcept, IndexConfig, IndexDocument, IndexSink, Result, UmlsError};
use umls_parser::parse_concept_line;

pub mod bulk;
pub mod memory;

pub use bulk::BulkFileSink;
pub use memory::MemoryIndexSink;

// ============================================================================
// Documents
// ============================================================================

/// Exact-match key of a term: hyphens read as spaces, lowercased
pub fn exact_key(term: &str) -> String {
    term.replace('-', " ").trim().to_lowercase()
}

/// Build the index documents of one concept record.
///
/// Terms whose exact key is empty are skipped.
pub fn documents_for(concept: &AggregatedConcept, votes: u32) -> Vec<IndexDocument> {
    concept
        .terms
        .iter()
        .filter_map(|term| {
            let exact = exact_key(term);
            if exact.is_empty() {
                return None;
            }
            Some(IndexDocument {
                cui: concept.cui.clone(),
                pref: concept.preferred.clone(),
                str: term.clone(),
                exact,
                lang: concept.language.clone(),
                source: concept.source.clone(),
                types: concept.type_groups.clone(),
                votes,
            })
        })
        .collect()
}

// ============================================================================
// Loader
// ============================================================================

/// Counts of one load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Concept records read
    pub concepts: usize,
    /// Documents handed to the sink
    pub documents: usize,
    /// Batches sent
    pub batches: usize,
    /// Concept-table lines that could not be decoded
    pub skipped_lines: usize,
}

/// Batches documents into an index sink
#[derive(Debug, Clone)]
pub struct IndexLoader {
    batch_size: usize,
    votes: u32,
}

impl IndexLoader {
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            votes: config.votes,
        }
    }

    /// Load concept records already in memory
    pub async fn load<I>(&self, sink: &dyn IndexSink, concepts: I) -> Result<LoadStats>
    where
        I: IntoIterator<Item = AggregatedConcept>,
    {
        let mut batcher = Batcher::new(self.batch_size);
        for concept in concepts {
            batcher.push(sink, documents_for(&concept, self.votes)).await?;
        }
        batcher.finish(sink).await
    }

    /// Stream a concept table from disk into the sink
    pub async fn load_table(&self, sink: &dyn IndexSink, path: impl AsRef<Path>) -> Result<LoadStats> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(UmlsError::MissingConceptTable {
                path: path.to_path_buf(),
            });
        }

        let io_err = |source| UmlsError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = tokio::fs::File::open(path).await.map_err(io_err)?;
        let mut lines = BufReader::new(file).lines();

        tracing::info!("Indexing {} into {}", path.display(), sink.name());

        let mut batcher = Batcher::new(self.batch_size);
        while let Some(line) = lines.next_line().await.map_err(io_err)? {
            match parse_concept_line(&line) {
                Some(concept) => {
                    batcher.push(sink, documents_for(&concept, self.votes)).await?;
                }
                None => batcher.stats.skipped_lines += 1,
            }
        }

        let stats = batcher.finish(sink).await?;
        if stats.skipped_lines > 0 {
            tracing::warn!("Skipped {} malformed concept-table lines", stats.skipped_lines);
        }
        Ok(stats)
    }
}

/// Pending batch plus running counts
struct Batcher {
    size: usize,
    pending: Vec<IndexDocument>,
    stats: LoadStats,
}

impl Batcher {
    fn new(size: usize) -> Self {
        Self {
            size,
            pending: Vec::with_capacity(size),
            stats: LoadStats::default(),
        }
    }

    async fn push(&mut self, sink: &dyn IndexSink, documents: Vec<IndexDocument>) -> Result<()> {
        self.stats.concepts += 1;
        for document in documents {
            self.pending.push(document);
            if self.pending.len() >= self.size {
                self.send(sink).await?;
            }
        }
        Ok(())
    }

    async fn send(&mut self, sink: &dyn IndexSink) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        sink.index_batch(&self.pending).await?;
        self.stats.documents += self.pending.len();
        self.stats.batches += 1;
        self.pending.clear();
        Ok(())
    }

    async fn finish(mut self, sink: &dyn IndexSink) -> Result<LoadStats> {
        self.send(sink).await?;
        sink.flush().await?;

        tracing::info!(
            "Indexed {} documents from {} concepts in {} batches",
            self.stats.documents,
            self.stats.concepts,
            self.stats.batches
        );
        Ok(self.stats)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn concept(cui: &str, terms: &[&str]) -> AggregatedConcept {
        AggregatedConcept {
            cui: cui.to_string(),
            language: "ENG".to_string(),
            source: "SNOMEDCT_US".to_string(),
            type_groups: vec!["DISO".to_string()],
            preferred: terms[0].to_string(),
            terms: terms.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn loader(batch_size: usize) -> IndexLoader {
        IndexLoader::new(&IndexConfig {
            batch_size,
            ..IndexConfig::default()
        })
    }

    #[test]
    fn test_exact_key() {
        assert_eq!(exact_key("Non-Hodgkin Lymphoma"), "non hodgkin lymphoma");
        assert_eq!(exact_key("Headache"), "headache");
        assert_eq!(exact_key("-"), "");
    }

    #[test]
    fn test_documents_for() {
        let docs = documents_for(&concept("C0001", &["Headache", "Cephalgia", "--"]), 10);

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].cui, "C0001");
        assert_eq!(docs[0].pref, "Headache");
        assert_eq!(docs[1].str, "Cephalgia");
        assert_eq!(docs[1].exact, "cephalgia");
        assert_eq!(docs[1].types, vec!["DISO"]);
        assert_eq!(docs[1].votes, 10);
    }

    #[tokio::test]
    async fn test_load_batches() {
        let sink = MemoryIndexSink::new();
        let concepts = vec![
            concept("C0001", &["Headache", "Cephalgia"]),
            concept("C0002", &["Migraine"]),
            concept("C0003", &["Fever", "Pyrexia"]),
        ];

        let stats = loader(2).load(&sink, concepts).await.unwrap();

        assert_eq!(
            stats,
            LoadStats {
                concepts: 3,
                documents: 5,
                batches: 3,
                skipped_lines: 0,
            }
        );
        assert_eq!(sink.batch_sizes().await, vec![2, 2, 1]);
        assert!(sink.is_flushed().await);
    }

    #[tokio::test]
    async fn test_load_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("concepts.txt");
        std::fs::write(
            &path,
            "C0001\tENG\tSNOMEDCT_US\tDISO\tHeadache\tHeadache|Cephalgia\nbroken line\n",
        )
        .unwrap();

        let sink = MemoryIndexSink::new();
        let stats = loader(50).load_table(&sink, &path).await.unwrap();

        assert_eq!(stats.documents, 2);
        assert_eq!(stats.skipped_lines, 1);
        let docs = sink.documents().await;
        assert_eq!(docs[1].exact, "cephalgia");
    }

    #[tokio::test]
    async fn test_load_table_missing() {
        let dir = tempfile::tempdir().unwrap();
        let sink = MemoryIndexSink::new();

        let err = loader(50)
            .load_table(&sink, dir.path().join("concepts.txt"))
            .await
            .unwrap_err();

        assert!(matches!(err, UmlsError::MissingConceptTable { .. }));
        assert!(sink.documents().await.is_empty());
    }
}

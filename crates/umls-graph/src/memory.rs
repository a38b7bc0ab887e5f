//! In-memory graph store
//!
//! Set-backed merge semantics, used by tests and `umls graph --dry-run`.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use umls_core::{CanonicalRelation, GraphSink, Result, UmlsError};

/// Graph store keeping nodes and edges in memory
#[derive(Default)]
pub struct MemoryGraphStore {
    nodes: RwLock<HashSet<String>>,
    edges: RwLock<HashSet<CanonicalRelation>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn node_count(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn edge_count(&self) -> usize {
        self.edges.read().await.len()
    }

    pub async fn contains(&self, relation: &CanonicalRelation) -> bool {
        self.edges.read().await.contains(relation)
    }
}

#[async_trait]
impl GraphSink for MemoryGraphStore {
    async fn merge_concepts(&self, cuis: &[String]) -> Result<()> {
        let mut nodes = self.nodes.write().await;
        nodes.extend(cuis.iter().cloned());
        Ok(())
    }

    async fn merge_relations(&self, relations: &[CanonicalRelation]) -> Result<()> {
        let nodes = self.nodes.read().await;
        if let Some(dangling) = relations
            .iter()
            .find(|r| !nodes.contains(&r.source_cui) || !nodes.contains(&r.target_cui))
        {
            return Err(UmlsError::Sink(format!(
                "Edge {dangling} references a concept that was never merged"
            )));
        }
        drop(nodes);

        self.edges.write().await.extend(relations.iter().cloned());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umls_core::RelationKind;

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let store = MemoryGraphStore::new();
        let cuis = vec!["C1".to_string(), "C2".to_string()];
        let edge = CanonicalRelation::new("C1", RelationKind::Child, "C2");

        store.merge_concepts(&cuis).await.unwrap();
        store.merge_concepts(&cuis).await.unwrap();
        store.merge_relations(&[edge.clone()]).await.unwrap();
        store.merge_relations(&[edge.clone()]).await.unwrap();

        assert_eq!(store.node_count().await, 2);
        assert_eq!(store.edge_count().await, 1);
        assert!(store.contains(&edge).await);
    }

    #[tokio::test]
    async fn test_edge_kinds_are_distinct() {
        let store = MemoryGraphStore::new();
        store
            .merge_concepts(&["C1".to_string(), "C2".to_string()])
            .await
            .unwrap();
        store
            .merge_relations(&[
                CanonicalRelation::new("C1", RelationKind::Child, "C2"),
                CanonicalRelation::new("C1", RelationKind::Sibling, "C2"),
            ])
            .await
            .unwrap();

        assert_eq!(store.edge_count().await, 2);
    }

    #[tokio::test]
    async fn test_dangling_edge_rejected() {
        let store = MemoryGraphStore::new();
        store.merge_concepts(&["C1".to_string()]).await.unwrap();

        let err = store
            .merge_relations(&[CanonicalRelation::new("C1", RelationKind::Isa, "C9")])
            .await
            .unwrap_err();

        assert!(matches!(err, UmlsError::Sink(_)));
        assert_eq!(store.edge_count().await, 0);
    }
}

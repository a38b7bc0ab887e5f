//! SurrealDB implementation for graph storage
//!
//! Concepts are `concept:<cui>` records. Edges live in one relation table
//! per kind (`child`, `sibling`, `isa`) with a unique `(in, out)` index,
//! and are only created when missing, so reloading a relation table
//! leaves the graph unchanged.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use umls_core::{CanonicalRelation, DatabaseConfig, GraphSink, RelationKind, Result, UmlsError};

/// SurrealDB graph store implementation
pub struct SurrealDbStore {
    client: Surreal<Client>,
}

impl SurrealDbStore {
    /// Create a new SurrealDB connection
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        // The ws engine adds the scheme itself
        let url = config
            .surrealdb_url
            .strip_prefix("ws://")
            .or_else(|| config.surrealdb_url.strip_prefix("wss://"))
            .unwrap_or(&config.surrealdb_url);

        let client = Surreal::new::<Ws>(url)
            .await
            .map_err(|e| UmlsError::Database(format!("SurrealDB connection failed: {e}")))?;

        client
            .signin(Root {
                username: &config.surrealdb_user,
                password: &config.surrealdb_pass,
            })
            .await
            .map_err(|e| UmlsError::Database(format!("SurrealDB auth failed: {e}")))?;

        client
            .use_ns(&config.surrealdb_namespace)
            .use_db(&config.surrealdb_database)
            .await
            .map_err(|e| UmlsError::Database(format!("SurrealDB namespace error: {e}")))?;

        tracing::info!(
            "Connected to SurrealDB {} ({}/{})",
            config.surrealdb_url,
            config.surrealdb_namespace,
            config.surrealdb_database
        );

        Ok(Self { client })
    }

    /// Initialize schema (run once on setup)
    pub async fn init_schema(&self) -> Result<()> {
        self.client
            .query(schema_statements())
            .await
            .map_err(|e| UmlsError::Database(format!("Schema init failed: {e}")))?
            .check()
            .map_err(|e| UmlsError::Database(format!("Schema init failed: {e}")))?;

        Ok(())
    }
}

/// Table and index definitions for concepts and every relation kind
fn schema_statements() -> String {
    let mut schema = String::from(
        "DEFINE TABLE IF NOT EXISTS concept SCHEMAFULL;\n\
         DEFINE FIELD IF NOT EXISTS cui ON concept TYPE string;\n",
    );
    for kind in RelationKind::ALL {
        let table = kind.as_str();
        schema.push_str(&format!(
            "DEFINE TABLE IF NOT EXISTS {table} TYPE RELATION IN concept OUT concept;\n\
             DEFINE INDEX IF NOT EXISTS {table}_pair ON {table} FIELDS in, out UNIQUE;\n"
        ));
    }
    schema
}

/// Create-if-missing statement for one relation kind.
///
/// The table name comes from [`RelationKind`], never from input data.
fn relate_statement(kind: RelationKind) -> String {
    let table = kind.as_str();
    format!(
        "FOR $edge IN $edges {{\n\
             LET $from = type::thing('concept', $edge.source);\n\
             LET $to = type::thing('concept', $edge.target);\n\
             IF array::len(SELECT id FROM {table} WHERE in = $from AND out = $to) == 0 {{\n\
                 RELATE $from->{table}->$to;\n\
             }};\n\
         }};"
    )
}

/// Edge endpoints as bound into queries
#[derive(Debug, Clone, Serialize)]
struct EdgeRecord {
    source: String,
    target: String,
}

#[async_trait]
impl GraphSink for SurrealDbStore {
    async fn merge_concepts(&self, cuis: &[String]) -> Result<()> {
        self.client
            .query("FOR $cui IN $cuis { UPSERT type::thing('concept', $cui) SET cui = $cui; };")
            .bind(("cuis", cuis.to_vec()))
            .await
            .map_err(|e| UmlsError::Database(format!("Failed to merge concepts: {e}")))?
            .check()
            .map_err(|e| UmlsError::Database(format!("Failed to merge concepts: {e}")))?;

        Ok(())
    }

    async fn merge_relations(&self, relations: &[CanonicalRelation]) -> Result<()> {
        let mut by_kind: BTreeMap<RelationKind, Vec<EdgeRecord>> = BTreeMap::new();
        for relation in relations {
            by_kind.entry(relation.kind).or_default().push(EdgeRecord {
                source: relation.source_cui.clone(),
                target: relation.target_cui.clone(),
            });
        }

        for (kind, edges) in by_kind {
            self.client
                .query(relate_statement(kind))
                .bind(("edges", edges))
                .await
                .map_err(|e| UmlsError::Database(format!("Failed to merge {kind} edges: {e}")))?
                .check()
                .map_err(|e| UmlsError::Database(format!("Failed to merge {kind} edges: {e}")))?;
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "surrealdb"
    }
}
